use crate::error::Error;
use crate::scale::Scale;
use crate::surface::SpriteTarget;
use crate::{DrawOptions, FrameHeader, Result};
use byteorder::{ByteOrder, LittleEndian};

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    fn u8(&mut self) -> Result<u8> {
        let value = *self
            .data
            .get(self.pos)
            .ok_or(Error::UnexpectedEof { pos: self.pos })?;
        self.pos += 1;
        Ok(value)
    }

    fn u16(&mut self) -> Result<u16> {
        let bytes = self
            .data
            .get(self.pos..self.pos + 2)
            .ok_or(Error::UnexpectedEof { pos: self.pos })?;
        self.pos += 2;
        Ok(LittleEndian::read_u16(bytes))
    }
}

pub(crate) fn read_header(data: &[u8], offset: usize) -> Result<FrameHeader> {
    let bytes = data
        .get(offset..offset + 8)
        .ok_or(Error::UnexpectedEof { pos: offset })?;
    Ok(FrameHeader {
        pen_x: LittleEndian::read_u16(&bytes[0..2]),
        width: LittleEndian::read_u16(&bytes[2..4]),
        pen_y: LittleEndian::read_u16(&bytes[4..6]),
        height: LittleEndian::read_u16(&bytes[6..8]),
    })
}

/// Maps source columns and lines to destination pixels for one frame.
struct Placement {
    x: i32,
    y: i32,
    span: i32,
    scale: Scale,
    flip: bool,
}

impl Placement {
    fn column(&self, col: i32) -> Option<i32> {
        if col < 0 || !self.scale.emits(col as usize) {
            return None;
        }
        let scaled = self.scale.scaled(col as usize) as i32;
        if self.flip {
            let repeat = self.scale.repeat() as i32;
            Some(self.x + self.span - repeat - scaled)
        } else {
            Some(self.x + scaled)
        }
    }

    fn line(&self, row: usize) -> Option<i32> {
        if !self.scale.emits(row) {
            return None;
        }
        Some(self.y + self.scale.scaled(row) as i32)
    }
}

/// One scanline's pen, writing through the placement.
struct Pen<'t> {
    target: &'t mut dyn SpriteTarget,
    placement: &'t Placement,
    dest_y: Option<i32>,
    col: i32,
    transparent: Option<u8>,
}

impl Pen<'_> {
    fn put(&mut self, color: u8) {
        if let (Some(dy), Some(dx)) = (self.dest_y, self.placement.column(self.col)) {
            let repeat = self.placement.scale.repeat() as i32;
            for ry in 0..repeat {
                for rx in 0..repeat {
                    self.target.set_pixel(dx + rx, dy + ry, color);
                }
            }
        }
        self.col += 1;
    }

    fn literal(&mut self, color: u8) {
        if Some(color) == self.transparent {
            self.col += 1;
        } else {
            self.put(color);
        }
    }

    fn skip(&mut self, count: usize) {
        self.col += count as i32;
    }
}

/// Decodes the frame at `offset` into `target` with its origin at `(x, y)`.
///
/// Every line's declared byte count must be consumed exactly, and the lines emitted
/// (vertical skips included) must add up to the header height.
pub(crate) fn decode_frame(
    data: &[u8],
    offset: usize,
    target: &mut dyn SpriteTarget,
    x: i32,
    y: i32,
    opts: &DrawOptions,
) -> Result<FrameHeader> {
    let header = read_header(data, offset)?;
    let placement = Placement {
        x,
        y,
        span: opts
            .scale
            .scaled(usize::from(header.pen_x) + usize::from(header.width)) as i32,
        scale: opts.scale,
        flip: opts.flip,
    };

    let mut reader = Reader::new(data, offset + 8);
    let height = u32::from(header.height);
    let mut line = 0u32;
    while line < height {
        let declared = reader.u8()?;
        if declared == 0 {
            let skip = reader.u8()?;
            if skip == 0 {
                return Err(Error::EmptyLinePass { line: line as u16 });
            }
            line += u32::from(skip);
            continue;
        }

        let start = reader.pos;
        let row = usize::from(header.pen_y) + line as usize;
        let start_offset = reader.u8()? as i8;
        let mut pen = Pen {
            target: &mut *target,
            placement: &placement,
            dest_y: placement.line(row),
            col: i32::from(header.pen_x) + i32::from(start_offset),
            transparent: opts.transparent,
        };

        while reader.pos - start < usize::from(declared) {
            let control = reader.u8()?;
            let len = usize::from(control & 0x1F);
            match control >> 5 {
                0 | 1 => {
                    for _ in 0..usize::from(control & 0x3F) + 1 {
                        let color = reader.u8()?;
                        pen.literal(color);
                    }
                }
                2 => {
                    let color = reader.u8()?;
                    for _ in 0..len + 3 {
                        pen.put(color);
                    }
                }
                3 => {
                    let distance = reader.u16()?;
                    let resume = reader.pos;
                    let from = resume.checked_sub(usize::from(distance)).ok_or(
                        Error::BackReferenceOutOfRange {
                            pos: resume,
                            distance,
                        },
                    )?;
                    let mut window = Reader::new(data, from);
                    for _ in 0..len + 4 {
                        let color = window.u8()?;
                        pen.literal(color);
                    }
                }
                4 => {
                    let first = reader.u8()?;
                    let second = reader.u8()?;
                    for _ in 0..len + 2 {
                        pen.put(first);
                        pen.put(second);
                    }
                }
                5 => pen.skip(len + 1),
                _ => {
                    let color = reader.u8()?;
                    for _ in 0..usize::from(control & 0x07) + 3 {
                        pen.put(color);
                    }
                }
            }
        }

        let consumed = reader.pos - start;
        if consumed != usize::from(declared) {
            return Err(Error::LineOverrun {
                declared,
                consumed,
                line: line as u16,
            });
        }
        line += 1;
    }

    if line != height {
        return Err(Error::HeightMismatch {
            declared: header.height,
            produced: line,
        });
    }
    Ok(header)
}
