pub mod direction;
pub mod draw;
pub mod error;
pub mod map;
pub mod objects;
pub mod segment;
pub mod store;
pub mod text;
mod view;

use crate::error::Error;

pub use crate::direction::{Direction, Pos};
pub use crate::draw::{DrawItem, DrawList, SlotDef, SlotId, SlotKind, ALT_FRAME, FLIP};
pub use crate::map::{Map, INDOOR_SENTINEL, OUTDOOR_SENTINEL};
pub use crate::objects::{MapObject, MapObjects};
pub use crate::segment::{CellFlags, MapAttributes, Segment, SEGMENT_SIZE};
pub use crate::store::{segment_file_name, Location, SegmentStore};
pub use crate::text::MapText;

pub type Result<T> = core::result::Result<T, Error>;
