use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("segment too small: size={size}, expected at least {expected}")]
    SegmentTooSmall { size: usize, expected: usize },

    #[error("map {map} has no segment file")]
    MissingSegment { map: u16 },

    #[error("no segment beyond map {map} at ({x}, {y})")]
    NoNeighbour { map: u16, x: i32, y: i32 },
}
