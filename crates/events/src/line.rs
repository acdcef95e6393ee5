use crate::error::Error;
use crate::Result;
use std::fmt;

/// Facing byte that matches any viewer facing.
pub const ANY_FACING: u8 = 4;

/// Bytes following the length byte before the arguments start: x, y, facing, opcode.
pub const LINE_HEADER_LEN: u8 = 4;

pub const OP_EXIT: u8 = 0x00;
pub const OP_MESSAGE: u8 = 0x01;
pub const OP_YES_NO: u8 = 0x02;
pub const OP_NPC: u8 = 0x03;
pub const OP_TELEPORT: u8 = 0x04;
pub const OP_GOTO: u8 = 0x05;
pub const OP_SOUND: u8 = 0x06;

/// Maze cell an event is attached to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellPos {
    pub x: u8,
    pub y: u8,
}

impl CellPos {
    pub const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for CellPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Decoded opcode with its arguments. Jump targets are line numbers relative to the
/// first line of the event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventOp {
    Exit,
    Message {
        text: u8,
    },
    YesNo {
        text: u8,
        no_line: u8,
    },
    Npc {
        text: u8,
        portrait: u8,
        deny_line: u8,
    },
    Teleport {
        x: u8,
        y: u8,
        facing: u8,
        /// 0 keeps the party on the current map.
        map: u16,
    },
    Goto {
        line: u8,
    },
    Sound {
        id: u8,
    },
    Unknown {
        opcode: u8,
        args: Vec<u8>,
    },
}

impl EventOp {
    fn decode(offset: usize, opcode: u8, args: &[u8]) -> Result<Self> {
        let need = |expected: usize| -> Result<()> {
            if args.len() < expected {
                return Err(Error::MissingArguments {
                    offset,
                    opcode,
                    expected,
                    found: args.len(),
                });
            }
            Ok(())
        };

        let op = match opcode {
            OP_EXIT => Self::Exit,
            OP_MESSAGE => {
                need(1)?;
                Self::Message { text: args[0] }
            }
            OP_YES_NO => {
                need(2)?;
                Self::YesNo {
                    text: args[0],
                    no_line: args[1],
                }
            }
            OP_NPC => {
                need(3)?;
                Self::Npc {
                    text: args[0],
                    portrait: args[1],
                    deny_line: args[2],
                }
            }
            OP_TELEPORT => {
                need(5)?;
                Self::Teleport {
                    x: args[0],
                    y: args[1],
                    facing: args[2],
                    map: u16::from_be_bytes([args[3], args[4]]),
                }
            }
            OP_GOTO => {
                need(1)?;
                Self::Goto { line: args[0] }
            }
            OP_SOUND => {
                need(1)?;
                Self::Sound { id: args[0] }
            }
            _ => Self::Unknown {
                opcode,
                args: args.to_vec(),
            },
        };
        Ok(op)
    }
}

impl fmt::Display for EventOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exit => write!(f, "exit"),
            Self::Message { text } => write!(f, "message text={text}"),
            Self::YesNo { text, no_line } => write!(f, "yesno text={text} no=>{no_line}"),
            Self::Npc {
                text,
                portrait,
                deny_line,
            } => write!(f, "npc text={text} portrait={portrait} deny=>{deny_line}"),
            Self::Teleport { x, y, facing, map } => {
                write!(f, "teleport ({x}, {y}) facing={facing} map={map}")
            }
            Self::Goto { line } => write!(f, "goto {line}"),
            Self::Sound { id } => write!(f, "sound {id}"),
            Self::Unknown { opcode, args } => write!(f, "op{opcode:02x} {args:02x?}"),
        }
    }
}

/// One fully decoded script line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventLine {
    /// Byte offset of the length byte inside the blob.
    pub offset: usize,
    pub cell: CellPos,
    pub facing: u8,
    pub op: EventOp,
}

impl EventLine {
    /// Decodes the line starting at `offset`. `bytes` must cover the whole line.
    pub fn decode(bytes: &[u8], offset: usize) -> Result<Self> {
        let (header, end) = frame_line(bytes, offset)?;
        let op = EventOp::decode(offset, header[3], &bytes[offset + 5..end])?;
        Ok(Self {
            offset,
            cell: CellPos::new(header[0], header[1]),
            facing: header[2],
            op,
        })
    }

    pub fn matches_facing(&self, facing: u8) -> bool {
        facing_matches(self.facing, facing)
    }
}

impl fmt::Display for EventLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let facing = match self.facing {
            0 => "N",
            1 => "E",
            2 => "S",
            3 => "W",
            ANY_FACING => "*",
            _ => "?",
        };
        write!(f, "{:05x} {} {facing} {}", self.offset, self.cell, self.op)
    }
}

pub(crate) fn facing_matches(stored: u8, facing: u8) -> bool {
    stored == ANY_FACING || stored == facing
}

/// Validates the framing of the line at `offset`, returning its four header bytes and the
/// offset one past its last byte.
pub(crate) fn frame_line(bytes: &[u8], offset: usize) -> Result<([u8; 4], usize)> {
    let declared = *bytes.get(offset).ok_or(Error::LineTruncated {
        offset,
        declared: 0,
        available: 0,
    })?;
    if declared < LINE_HEADER_LEN {
        return Err(Error::LineTooShort { offset, declared });
    }
    let available = bytes.len() - offset - 1;
    if usize::from(declared) > available {
        return Err(Error::LineTruncated {
            offset,
            declared,
            available,
        });
    }
    let header = [
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
        bytes[offset + 4],
    ];
    Ok((header, offset + 1 + usize::from(declared)))
}
