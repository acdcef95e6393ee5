/// Half-open rectangle in destination pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }

    pub fn intersect(&self, other: &Rect) -> Rect {
        Rect {
            left: self.left.max(other.left),
            top: self.top.max(other.top),
            right: self.right.min(other.right).max(self.left.max(other.left)),
            bottom: self.bottom.min(other.bottom).max(self.top.max(other.top)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }
}

/// Anything a decoded frame can be written into.
pub trait SpriteTarget {
    fn set_pixel(&mut self, x: i32, y: i32, color: u8);
}

/// 256-colour palette with 8-bit channels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    pub colors: [[u8; 3]; 256],
}

impl Palette {
    /// Grey ramp, used when an asset's palette is unavailable.
    pub fn grayscale() -> Self {
        let mut colors = [[0u8; 3]; 256];
        for (idx, color) in colors.iter_mut().enumerate() {
            *color = [idx as u8; 3];
        }
        Self { colors }
    }

    /// Reads a 768-byte palette of 6-bit VGA channel values.
    pub fn from_vga(bytes: &[u8]) -> Option<Self> {
        let bytes = bytes.get(..768)?;
        let mut colors = [[0u8; 3]; 256];
        for (color, rgb) in colors.iter_mut().zip(bytes.chunks_exact(3)) {
            for (dst, &src) in color.iter_mut().zip(rgb) {
                let six = u16::from(src & 0x3F);
                *dst = ((six * 255 + 31) / 63) as u8;
            }
        }
        Some(Self { colors })
    }
}

/// Indexed 8-bit pixel buffer with a clip rectangle.
#[derive(Clone, Debug)]
pub struct Surface {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
    clip: Rect,
}

impl Surface {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u8; width * height],
            clip: Rect::new(0, 0, width as i32, height as i32),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }

    pub fn clip(&self) -> Rect {
        self.clip
    }

    /// Restricts drawing to `rect`, never beyond the buffer.
    pub fn set_clip(&mut self, rect: Rect) {
        self.clip = rect.intersect(&self.bounds());
    }

    pub fn reset_clip(&mut self) {
        self.clip = self.bounds();
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<u8> {
        if !self.bounds().contains(x, y) {
            return None;
        }
        self.pixels
            .get(y as usize * self.width + x as usize)
            .copied()
    }

    pub fn fill(&mut self, color: u8) {
        self.pixels.fill(color);
    }

    pub fn to_rgba(&self, palette: &Palette) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 4);
        for &index in &self.pixels {
            let [r, g, b] = palette.colors[usize::from(index)];
            out.extend_from_slice(&[r, g, b, 255]);
        }
        out
    }
}

impl SpriteTarget for Surface {
    fn set_pixel(&mut self, x: i32, y: i32, color: u8) {
        if !self.clip.contains(x, y) {
            return;
        }
        let idx = y as usize * self.width + x as usize;
        if let Some(px) = self.pixels.get_mut(idx) {
            *px = color;
        }
    }
}
