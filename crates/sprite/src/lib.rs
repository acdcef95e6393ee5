mod decode;
pub mod error;
pub mod scale;
pub mod surface;

use crate::error::Error;
use byteorder::{ByteOrder, LittleEndian};
use ccfile::{Archive, File, Source};
use log::warn;
use std::collections::HashMap;
use std::sync::Arc;

pub use crate::scale::Scale;
pub use crate::surface::{Palette, Rect, SpriteTarget, Surface};

pub type Result<T> = core::result::Result<T, Error>;

/// Draw flag: mirror horizontally.
pub const FLAG_FLIP: u16 = 0x8000;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    pub pen_x: u16,
    pub width: u16,
    pub pen_y: u16,
    pub height: u16,
}

/// One addressable frame: up to two independently encoded images drawn at the same origin.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    pub offsets: [u16; 2],
}

impl Cell {
    pub fn parts(&self) -> impl Iterator<Item = usize> + '_ {
        self.offsets
            .iter()
            .filter(|&&offset| offset != 0)
            .map(|&offset| usize::from(offset))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DrawOptions {
    pub flip: bool,
    pub scale: Scale,
    /// Literal pixels of this value are left untouched.
    pub transparent: Option<u8>,
}

impl Default for DrawOptions {
    fn default() -> Self {
        Self {
            flip: false,
            scale: Scale::FULL,
            transparent: Some(0),
        }
    }
}

impl DrawOptions {
    pub fn from_flags(flags: u16, scale: Scale) -> Self {
        Self {
            flip: flags & FLAG_FLIP != 0,
            scale,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug)]
pub struct Sprite {
    data: Arc<[u8]>,
    cells: Vec<Cell>,
}

impl Sprite {
    pub fn parse(data: Arc<[u8]>) -> Result<Self> {
        let cells = parse_cells(&data)?;
        Ok(Self { data, cells })
    }

    pub fn from_file(file: &File) -> Result<Self> {
        Self::parse(file.shared())
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn cell(&self, frame: usize) -> Option<&Cell> {
        self.cells.get(frame)
    }

    /// Headers of every image making up `frame`.
    pub fn frame_headers(&self, frame: usize) -> Result<Vec<FrameHeader>> {
        let cell = self.cell_or_err(frame)?;
        cell.parts()
            .map(|offset| decode::read_header(&self.data, offset))
            .collect()
    }

    /// Decodes `frame` into `target` with its origin at `(x, y)`.
    pub fn draw(
        &self,
        target: &mut dyn SpriteTarget,
        frame: usize,
        x: i32,
        y: i32,
        opts: &DrawOptions,
    ) -> Result<()> {
        let cell = *self.cell_or_err(frame)?;
        for offset in cell.parts() {
            decode::decode_frame(&self.data, offset, target, x, y, opts)?;
        }
        Ok(())
    }

    /// Decodes every frame without drawing it anywhere.
    pub fn validate(&self) -> Result<()> {
        let mut sink = NullTarget;
        for frame in 0..self.cells.len() {
            self.draw(&mut sink, frame, 0, 0, &DrawOptions::default())?;
        }
        Ok(())
    }

    fn cell_or_err(&self, frame: usize) -> Result<&Cell> {
        self.cells.get(frame).ok_or(Error::FrameOutOfRange {
            frame,
            cells: self.cells.len(),
        })
    }
}

struct NullTarget;

impl SpriteTarget for NullTarget {
    fn set_pixel(&mut self, _x: i32, _y: i32, _color: u8) {}
}

fn parse_cells(data: &[u8]) -> Result<Vec<Cell>> {
    let count_bytes = data.get(0..2).ok_or(Error::CellTableOutOfBounds {
        cells: 0,
        size: data.len(),
    })?;
    let count = LittleEndian::read_u16(count_bytes);
    let table_end = 2 + usize::from(count) * 4;
    let table = data.get(2..table_end).ok_or(Error::CellTableOutOfBounds {
        cells: count,
        size: data.len(),
    })?;

    let mut cells = Vec::with_capacity(usize::from(count));
    for (cell, raw) in table.chunks_exact(4).enumerate() {
        let offsets = [
            LittleEndian::read_u16(&raw[0..2]),
            LittleEndian::read_u16(&raw[2..4]),
        ];
        for &offset in &offsets {
            if offset != 0 && usize::from(offset) + 8 > data.len() {
                return Err(Error::CellOffsetOutOfBounds {
                    cell,
                    offset,
                    size: data.len(),
                });
            }
        }
        cells.push(Cell { offsets });
    }
    Ok(cells)
}

/// Parsed sprites keyed by archive id, shared between all drawers. Malformed sheets are
/// remembered as `None` so they are parsed and reported once.
#[derive(Debug, Default)]
pub struct SpriteCache {
    sprites: HashMap<u16, Option<Arc<Sprite>>>,
}

impl SpriteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the sprite for `id`, loading it on first use. Missing or malformed assets
    /// yield `None` so the caller can skip the draw.
    pub fn get(&mut self, archive: &Archive, id: u16) -> Option<Arc<Sprite>> {
        if let Some(cached) = self.sprites.get(&id) {
            return cached.clone();
        }
        let file = archive.file(id, Source::Main)?;
        let sprite = match Sprite::from_file(&file) {
            Ok(sprite) => Some(Arc::new(sprite)),
            Err(err) => {
                warn!("sprite {id:#06x} unusable: {err}");
                None
            }
        };
        self.sprites.insert(id, sprite.clone());
        sprite
    }

    pub fn insert(&mut self, id: u16, sprite: Sprite) {
        self.sprites.insert(id, Some(Arc::new(sprite)));
    }

    /// Whether `id` was loaded before and found malformed.
    pub fn is_rejected(&self, id: u16) -> bool {
        matches!(self.sprites.get(&id), Some(None))
    }

    /// Number of usable sprites held.
    pub fn len(&self) -> usize {
        self.sprites.values().filter(|sprite| sprite.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
