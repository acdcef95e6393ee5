use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("sprite too small for its cell table: cells={cells}, size={size}")]
    CellTableOutOfBounds { cells: u16, size: usize },

    #[error("cell {cell} points outside the sprite: offset={offset}, size={size}")]
    CellOffsetOutOfBounds { cell: usize, offset: u16, size: usize },

    #[error("frame {frame} out of range (cells={cells})")]
    FrameOutOfRange { frame: usize, cells: usize },

    #[error("unexpected end of sprite data at {pos}")]
    UnexpectedEof { pos: usize },

    #[error("scanline overran its byte count: declared={declared}, consumed={consumed}, line={line}")]
    LineOverrun {
        declared: u8,
        consumed: usize,
        line: u16,
    },

    #[error("vertical skip of zero lines at line {line}")]
    EmptyLinePass { line: u16 },

    #[error("frame produced {produced} lines, header declares {declared}")]
    HeightMismatch { declared: u16, produced: u32 },

    #[error("back-reference before start of sprite: pos={pos}, distance={distance}")]
    BackReferenceOutOfRange { pos: usize, distance: u16 },
}
