use crate::direction::Direction;
use crate::error::Error;
use crate::Result;
use byteorder::{ByteOrder, LittleEndian};
use log::warn;

pub const SEGMENT_SIZE: usize = 0x37C;
pub const CELLS: usize = 256;

const WALLS_OFFSET: usize = 0x000;
const FLAGS_OFFSET: usize = 0x200;
const MAP_ID_OFFSET: usize = 0x300;
const NEIGHBOURS_OFFSET: usize = 0x302;
const MAP_FLAGS_OFFSET: usize = 0x30A;
const WALL_TYPES_OFFSET: usize = 0x30E;
const SURFACE_TYPES_OFFSET: usize = 0x31E;
const ATTRIBUTES_OFFSET: usize = 0x32E;
const SEEN_OFFSET: usize = 0x33C;
const VISITED_OFFSET: usize = 0x35C;

pub const MAP_OUTDOORS: u32 = 0x8000_0000;
pub const MAP_DARK: u32 = 0x4000_0000;

/// Wall kinds selecting the indoor wall, ground and side-wall sheets.
pub const WALL_KINDS: [&str; 6] = ["TOWN", "CAVE", "TOWR", "CSTL", "DUNG", "SCFI"];

/// Per-cell flag byte.
pub struct CellFlags;

impl CellFlags {
    pub const SURFACE_MASK: u8 = 0x07;
    pub const OBJECT: u8 = 0x08;
    pub const EVENT: u8 = 0x10;
    pub const MONSTER_BLOCKED: u8 = 0x20;
    pub const VISITED: u8 = 0x40;
    pub const WATER: u8 = 0x80;
}

/// Numeric map attributes stored after the lookup tables.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MapAttributes {
    pub floor_type: u8,
    pub run_x: u8,
    pub run_y: u8,
    /// Wall codes at or above this block movement.
    pub wall_no_pass: u8,
    pub surface_no_pass: u8,
    pub unlock_door: u8,
    pub unlock_box: u8,
    pub bash_door: u8,
    pub bash_grate: u8,
    pub bash_wall: u8,
    pub chance_to_run: u8,
    pub trap_damage: u8,
    pub wall_kind: u8,
    pub tavern_tips: u8,
}

impl MapAttributes {
    pub const SIZE: usize = 14;

    fn from_bytes(b: &[u8]) -> Self {
        Self {
            floor_type: b[0],
            run_x: b[1],
            run_y: b[2],
            wall_no_pass: b[3],
            surface_no_pass: b[4],
            unlock_door: b[5],
            unlock_box: b[6],
            bash_door: b[7],
            bash_grate: b[8],
            bash_wall: b[9],
            chance_to_run: b[10],
            trap_damage: b[11],
            wall_kind: b[12],
            tavern_tips: b[13],
        }
    }

    fn to_bytes(self) -> [u8; Self::SIZE] {
        [
            self.floor_type,
            self.run_x,
            self.run_y,
            self.wall_no_pass,
            self.surface_no_pass,
            self.unlock_door,
            self.unlock_box,
            self.bash_door,
            self.bash_grate,
            self.bash_wall,
            self.chance_to_run,
            self.trap_damage,
            self.wall_kind,
            self.tavern_tips,
        ]
    }
}

/// One 16×16 maze segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    id: u16,
    walls: [u16; CELLS],
    flags: [u8; CELLS],
    neighbours: [u16; 4],
    map_flags: u32,
    wall_types: [u8; 16],
    surface_types: [u8; 16],
    attributes: MapAttributes,
    seen: [u8; 32],
    visited: [u8; 32],
}

fn cell_index(x: u8, y: u8) -> usize {
    (usize::from(y & 0x0F) << 4) | usize::from(x & 0x0F)
}

fn nibble_shift(dir: Direction) -> u32 {
    12 - 4 * u32::from(dir.index())
}

impl Segment {
    /// Segment with open cells, no neighbours and identity lookup tables.
    pub fn blank(id: u16) -> Self {
        let identity: [u8; 16] = std::array::from_fn(|idx| idx as u8);
        Self {
            id,
            walls: [0; CELLS],
            flags: [0; CELLS],
            neighbours: [0; 4],
            map_flags: 0,
            wall_types: identity,
            surface_types: identity,
            attributes: MapAttributes::default(),
            seen: [0; 32],
            visited: [0; 32],
        }
    }

    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < SEGMENT_SIZE {
            return Err(Error::SegmentTooSmall {
                size: bytes.len(),
                expected: SEGMENT_SIZE,
            });
        }

        let mut walls = [0u16; CELLS];
        LittleEndian::read_u16_into(&bytes[WALLS_OFFSET..FLAGS_OFFSET], &mut walls);
        let mut flags = [0u8; CELLS];
        flags.copy_from_slice(&bytes[FLAGS_OFFSET..FLAGS_OFFSET + CELLS]);
        let mut neighbours = [0u16; 4];
        LittleEndian::read_u16_into(
            &bytes[NEIGHBOURS_OFFSET..MAP_FLAGS_OFFSET],
            &mut neighbours,
        );
        let mut wall_types = [0u8; 16];
        wall_types.copy_from_slice(&bytes[WALL_TYPES_OFFSET..SURFACE_TYPES_OFFSET]);
        let mut surface_types = [0u8; 16];
        surface_types.copy_from_slice(&bytes[SURFACE_TYPES_OFFSET..ATTRIBUTES_OFFSET]);
        let mut seen = [0u8; 32];
        seen.copy_from_slice(&bytes[SEEN_OFFSET..VISITED_OFFSET]);
        let mut visited = [0u8; 32];
        visited.copy_from_slice(&bytes[VISITED_OFFSET..SEGMENT_SIZE]);

        Ok(Self {
            id: LittleEndian::read_u16(&bytes[MAP_ID_OFFSET..NEIGHBOURS_OFFSET]),
            walls,
            flags,
            neighbours,
            map_flags: LittleEndian::read_u32(&bytes[MAP_FLAGS_OFFSET..WALL_TYPES_OFFSET]),
            wall_types,
            surface_types,
            attributes: MapAttributes::from_bytes(&bytes[ATTRIBUTES_OFFSET..SEEN_OFFSET]),
            seen,
            visited,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = vec![0u8; SEGMENT_SIZE];
        LittleEndian::write_u16_into(&self.walls, &mut out[WALLS_OFFSET..FLAGS_OFFSET]);
        out[FLAGS_OFFSET..FLAGS_OFFSET + CELLS].copy_from_slice(&self.flags);
        LittleEndian::write_u16(&mut out[MAP_ID_OFFSET..NEIGHBOURS_OFFSET], self.id);
        LittleEndian::write_u16_into(
            &self.neighbours,
            &mut out[NEIGHBOURS_OFFSET..MAP_FLAGS_OFFSET],
        );
        LittleEndian::write_u32(
            &mut out[MAP_FLAGS_OFFSET..WALL_TYPES_OFFSET],
            self.map_flags,
        );
        out[WALL_TYPES_OFFSET..SURFACE_TYPES_OFFSET].copy_from_slice(&self.wall_types);
        out[SURFACE_TYPES_OFFSET..ATTRIBUTES_OFFSET].copy_from_slice(&self.surface_types);
        out[ATTRIBUTES_OFFSET..SEEN_OFFSET].copy_from_slice(&self.attributes.to_bytes());
        out[SEEN_OFFSET..VISITED_OFFSET].copy_from_slice(&self.seen);
        out[VISITED_OFFSET..SEGMENT_SIZE].copy_from_slice(&self.visited);
        out
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn set_id(&mut self, id: u16) {
        self.id = id;
    }

    /// Raw wall word as stored: north in the top nibble, then east, south, west.
    pub fn wall(&self, x: u8, y: u8) -> u16 {
        self.walls[cell_index(x, y)]
    }

    pub fn set_wall(&mut self, x: u8, y: u8, word: u16) {
        self.walls[cell_index(x, y)] = word;
    }

    pub fn wall_nibble(&self, x: u8, y: u8, dir: Direction) -> u8 {
        ((self.wall(x, y) >> nibble_shift(dir)) & 0x0F) as u8
    }

    pub fn set_wall_nibble(&mut self, x: u8, y: u8, dir: Direction, code: u8) {
        let shift = nibble_shift(dir);
        let word = self.wall(x, y) & !(0x0F << shift) | (u16::from(code & 0x0F) << shift);
        self.set_wall(x, y, word);
    }

    pub fn cell_flags(&self, x: u8, y: u8) -> u8 {
        self.flags[cell_index(x, y)]
    }

    pub fn set_cell_flags(&mut self, x: u8, y: u8, flags: u8) {
        self.flags[cell_index(x, y)] = flags;
    }

    /// Segment id linked in `dir`, if any.
    pub fn neighbour(&self, dir: Direction) -> Option<u16> {
        match self.neighbours[usize::from(dir.index())] {
            0 => None,
            id => Some(id),
        }
    }

    pub fn set_neighbour(&mut self, dir: Direction, id: Option<u16>) {
        self.neighbours[usize::from(dir.index())] = id.unwrap_or(0);
    }

    pub fn map_flags(&self) -> u32 {
        self.map_flags
    }

    pub fn set_map_flags(&mut self, flags: u32) {
        self.map_flags = flags;
    }

    pub fn is_outdoors(&self) -> bool {
        self.map_flags & MAP_OUTDOORS != 0
    }

    pub fn is_dark(&self) -> bool {
        self.map_flags & MAP_DARK != 0
    }

    /// Art code for a wall nibble. Table values outside `0..16` fall back to 0.
    pub fn wall_type(&self, code: u8) -> u8 {
        lookup(&self.wall_types, code, "wall", self.id)
    }

    /// Surface type of the cell, through the surface lookup table.
    pub fn surface_type(&self, x: u8, y: u8) -> u8 {
        let index = self.cell_flags(x, y) & CellFlags::SURFACE_MASK;
        lookup(&self.surface_types, index, "surface", self.id)
    }

    pub fn wall_types_mut(&mut self) -> &mut [u8; 16] {
        &mut self.wall_types
    }

    pub fn surface_types_mut(&mut self) -> &mut [u8; 16] {
        &mut self.surface_types
    }

    pub fn attributes(&self) -> &MapAttributes {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut MapAttributes {
        &mut self.attributes
    }

    pub fn wall_kind(&self) -> &'static str {
        match WALL_KINDS.get(usize::from(self.attributes.wall_kind)) {
            Some(kind) => kind,
            None => {
                warn!(
                    "segment {}: wall kind {} out of range",
                    self.id, self.attributes.wall_kind
                );
                WALL_KINDS[0]
            }
        }
    }

    pub fn is_seen(&self, x: u8, y: u8) -> bool {
        bit(&self.seen, cell_index(x, y))
    }

    pub fn mark_seen(&mut self, x: u8, y: u8) {
        set_bit(&mut self.seen, cell_index(x, y));
    }

    pub fn is_visited(&self, x: u8, y: u8) -> bool {
        bit(&self.visited, cell_index(x, y))
    }

    pub fn mark_visited(&mut self, x: u8, y: u8) {
        set_bit(&mut self.visited, cell_index(x, y));
    }
}

fn lookup(table: &[u8; 16], index: u8, what: &str, segment: u16) -> u8 {
    let value = table[usize::from(index & 0x0F)];
    if value > 0x0F {
        warn!("segment {segment}: {what} type {value} at slot {index} out of range");
        return 0;
    }
    value
}

fn bit(bits: &[u8; 32], index: usize) -> bool {
    bits[index / 8] & (1 << (index % 8)) != 0
}

fn set_bit(bits: &mut [u8; 32], index: usize) {
    bits[index / 8] |= 1 << (index % 8);
}
