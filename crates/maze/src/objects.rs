use crate::direction::{Direction, Pos};
use byteorder::{ByteOrder, LittleEndian};
use log::warn;

pub const OBJECT_RECORD_SIZE: usize = 4;

/// An occupant placed on the map: monster, item pile or decoration.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MapObject {
    pub pos: Pos,
    pub facing: Direction,
    /// Number of the `NNN.MON` sprite sheet.
    pub sprite: u8,
}

impl MapObject {
    pub fn sprite_name(&self) -> String {
        format!("{:03}.MON", self.sprite)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MapObjects {
    objects: Vec<MapObject>,
}

impl MapObjects {
    /// Reads a `u16` count followed by `{i8 x, i8 y, u8 facing, u8 sprite}` records.
    /// A short table keeps the records that are complete.
    pub fn parse(bytes: &[u8]) -> Self {
        let Some(count) = bytes.get(0..2).map(LittleEndian::read_u16) else {
            return Self::default();
        };
        let records = bytes[2..].chunks_exact(OBJECT_RECORD_SIZE);
        if records.len() < usize::from(count) {
            warn!(
                "object table declares {count} records, only {} present",
                records.len()
            );
        }

        let objects = records
            .take(usize::from(count))
            .map(|raw| {
                let facing = Direction::from_index(raw[2]).unwrap_or_else(|| {
                    warn!("object facing {} out of range", raw[2]);
                    Direction::North
                });
                MapObject {
                    pos: Pos::new(i32::from(raw[0] as i8), i32::from(raw[1] as i8)),
                    facing,
                    sprite: raw[3],
                }
            })
            .collect();
        Self { objects }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(2 + self.objects.len() * OBJECT_RECORD_SIZE);
        out.extend_from_slice(&(self.objects.len() as u16).to_le_bytes());
        for object in &self.objects {
            out.extend_from_slice(&[
                object.pos.x as i8 as u8,
                object.pos.y as i8 as u8,
                object.facing.index(),
                object.sprite,
            ]);
        }
        out
    }

    pub fn push(&mut self, object: MapObject) {
        self.objects.push(object);
    }

    pub fn iter(&self) -> impl Iterator<Item = &MapObject> {
        self.objects.iter()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// First occupant standing on `pos`.
    pub fn at(&self, pos: Pos) -> Option<&MapObject> {
        self.objects.iter().find(|object| object.pos == pos)
    }
}
