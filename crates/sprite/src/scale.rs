/// Column/line selection patterns for the sixteen down-scale steps, from 16/16 to 1/16.
pub const SCALE_MASKS: [u16; 16] = [
    0xFFFF, 0xFFEF, 0xEFEF, 0xEFEE, 0xEEEE, 0xEEAE, 0xAEAE, 0xAEAA, 0xAAAA, 0xAA8A, 0x8A8A,
    0x8A88, 0x8888, 0x8880, 0x8080, 0x8000,
];

/// Draw scale code. The low nibble picks a row of [`SCALE_MASKS`]; [`Scale::ENLARGE`]
/// doubles every pixel instead.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Scale(pub u16);

impl Scale {
    pub const ENLARGE: u16 = 0x8000;
    pub const FULL: Scale = Scale(0);
    pub const DOUBLE: Scale = Scale(Self::ENLARGE);

    pub fn mask(self) -> u16 {
        SCALE_MASKS[usize::from(self.0 & 0x0F)]
    }

    pub fn is_enlarged(self) -> bool {
        self.0 & Self::ENLARGE != 0
    }

    /// Destination pixels per emitted source pixel.
    pub fn repeat(self) -> usize {
        if self.is_enlarged() {
            2
        } else {
            1
        }
    }

    /// Whether the source pixel at running `offset` is drawn.
    pub fn emits(self, offset: usize) -> bool {
        if self.is_enlarged() {
            return true;
        }
        self.mask().rotate_left((offset % 16) as u32) & 0x8000 != 0
    }

    /// Destination length covered by the first `len` source pixels.
    pub fn scaled(self, len: usize) -> usize {
        if self.is_enlarged() {
            return len * 2;
        }
        let mask = self.mask();
        let whole = (len / 16) * mask.count_ones() as usize;
        let rest = len % 16;
        let partial = if rest == 0 {
            0
        } else {
            (mask >> (16 - rest)).count_ones() as usize
        };
        whole + partial
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_scale_emits_everything() {
        assert!((0..64).all(|i| Scale::FULL.emits(i)));
        assert_eq!(Scale::FULL.scaled(37), 37);
    }

    #[test]
    fn half_scale_drops_every_other_pixel() {
        let half = Scale(8);
        let pattern: Vec<bool> = (0..8).map(|i| half.emits(i)).collect();
        assert_eq!(pattern, vec![true, false, true, false, true, false, true, false]);
        assert_eq!(half.scaled(16), 8);
        assert_eq!(half.scaled(3), 2);
    }

    #[test]
    fn pattern_is_periodic_in_sixteen() {
        for code in 0..16u16 {
            let scale = Scale(code);
            for i in 0..16 {
                assert_eq!(scale.emits(i), scale.emits(i + 16), "code {code} offset {i}");
            }
        }
    }

    #[test]
    fn scaled_agrees_with_emitted_count() {
        for code in 0..16u16 {
            let scale = Scale(code);
            for len in 0..70 {
                let counted = (0..len).filter(|&i| scale.emits(i)).count();
                assert_eq!(scale.scaled(len), counted, "code {code} len {len}");
            }
        }
    }

    #[test]
    fn enlarge_doubles() {
        assert!(Scale::DOUBLE.is_enlarged());
        assert_eq!(Scale::DOUBLE.repeat(), 2);
        assert_eq!(Scale::DOUBLE.scaled(5), 10);
        assert!(Scale(0x800F).emits(1));
    }
}
