use crate::direction::{Direction, Pos};
use crate::error::Error;
use crate::objects::MapObjects;
use crate::segment::{MapAttributes, Segment};
use crate::store::{read_map_file, Location, SegmentStore};
use crate::text::MapText;
use crate::Result;
use ccfile::Archive;
use events::{CellPos, EventList};
use log::{debug, warn};

/// Tile returned for unresolvable outdoor positions: open on every side.
pub const OUTDOOR_SENTINEL: u16 = 0xFFFF;
/// Tile returned for unresolvable indoor positions: code 8 on every side.
pub const INDOOR_SENTINEL: u16 = 0x8888;

/// Wall code of a bashable grate.
pub const WALL_GRATE: u8 = 9;
/// Wall code a grate becomes once bashed through.
pub const WALL_BASHED: u8 = 3;

/// One map: its home segment with the linked segments around it, plus the map's
/// occupants, strings and scripted events.
#[derive(Clone, Debug)]
pub struct Map {
    home: u16,
    store: SegmentStore,
    objects: MapObjects,
    text: MapText,
    events: EventList,
    mirror: bool,
}

pub fn objects_file_name(id: u16) -> String {
    format!("MAZE{id:04}.MOB")
}

pub fn text_file_name(id: u16) -> String {
    format!("MAZE{id:04}.TXT")
}

pub fn events_file_name(id: u16) -> String {
    format!("MAZE{id:04}.EVT")
}

impl Map {
    /// Loads segment `id` with every segment reachable from it through neighbour links,
    /// plus the map's objects, text and events.
    pub fn load(archive: &Archive, id: u16) -> Result<Self> {
        let mut store = SegmentStore::new();
        if !store.load(archive, id)? {
            return Err(Error::MissingSegment { map: id });
        }
        store.load_reachable(archive, id)?;

        let mut map = Self::from_store(store, id)?;
        map.load_map_files(archive);
        debug!(
            "map {id}: {} segments, {} objects, {} strings, {} event lines",
            map.store.len(),
            map.objects.len(),
            map.text.len(),
            map.events.line_count()
        );
        Ok(map)
    }

    /// Builds a map over segments already in memory, without objects, text or events.
    pub fn from_store(store: SegmentStore, home: u16) -> Result<Self> {
        if !store.contains(home) {
            return Err(Error::MissingSegment { map: home });
        }
        Ok(Self {
            home,
            store,
            objects: MapObjects::default(),
            text: MapText::default(),
            events: EventList::empty(),
            mirror: false,
        })
    }

    fn load_map_files(&mut self, archive: &Archive) {
        let id = self.home;
        self.objects = read_map_file(archive, &objects_file_name(id))
            .map(|file| MapObjects::parse(file.as_slice()))
            .unwrap_or_default();
        self.text = read_map_file(archive, &text_file_name(id))
            .map(|file| MapText::parse(file.as_slice()))
            .unwrap_or_default();
        self.events = match read_map_file(archive, &events_file_name(id)) {
            Some(file) => EventList::parse(file.as_slice()).unwrap_or_else(|err| {
                warn!("map {id}: events unusable: {err}");
                EventList::empty()
            }),
            None => EventList::empty(),
        };
    }

    pub fn id(&self) -> u16 {
        self.home
    }

    /// The home segment. Its presence in the store is checked on construction and on
    /// every [`Map::enter`].
    pub fn home(&self) -> &Segment {
        &self.store[self.home]
    }

    pub fn segments(&self) -> &SegmentStore {
        &self.store
    }

    pub fn objects(&self) -> &MapObjects {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> &mut MapObjects {
        &mut self.objects
    }

    pub fn text(&self) -> &MapText {
        &self.text
    }

    pub fn events(&self) -> &EventList {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventList {
        &mut self.events
    }

    pub fn is_outdoors(&self) -> bool {
        self.home().is_outdoors()
    }

    pub fn is_dark(&self) -> bool {
        self.home().is_dark()
    }

    pub fn attributes(&self) -> &MapAttributes {
        self.home().attributes()
    }

    /// Current ground/sky mirroring state, flipped on every step.
    pub fn is_mirrored(&self) -> bool {
        self.mirror
    }

    pub fn resolve(&self, pos: Pos) -> Option<Location> {
        self.store.resolve(self.home, pos)
    }

    pub(crate) fn segment_at(&self, pos: Pos) -> Option<(&Segment, Location)> {
        let loc = self.resolve(pos)?;
        Some((self.store.get(loc.segment)?, loc))
    }

    fn sentinel(&self) -> u16 {
        if self.is_outdoors() {
            OUTDOOR_SENTINEL
        } else {
            INDOOR_SENTINEL
        }
    }

    /// Wall word rotated so the top nibble faces `dir`, then right, back and left.
    pub fn get_tile(&self, pos: Pos, dir: Direction) -> u16 {
        let raw = match self.segment_at(pos) {
            Some((segment, loc)) => segment.wall(loc.x, loc.y),
            None => self.sentinel(),
        };
        raw.rotate_left(4 * u32::from(dir.index()))
    }

    /// Wall code on the `dir` side of `pos`.
    pub fn wall(&self, pos: Pos, dir: Direction) -> u8 {
        (self.get_tile(pos, dir) >> 12) as u8
    }

    pub fn get_flags(&self, pos: Pos) -> u8 {
        self.segment_at(pos)
            .map_or(0, |(segment, loc)| segment.cell_flags(loc.x, loc.y))
    }

    pub fn get_surface(&self, pos: Pos) -> u8 {
        self.segment_at(pos)
            .map_or(0, |(segment, loc)| segment.surface_type(loc.x, loc.y))
    }

    fn segment_mut_at(&mut self, pos: Pos) -> Option<(&mut Segment, Location)> {
        let loc = self.resolve(pos)?;
        Some((self.store.get_mut(loc.segment)?, loc))
    }

    /// Stores `tile`, given in the frame of `dir`, back into the cell. Returns false
    /// when `pos` does not resolve.
    pub fn set_tile(&mut self, pos: Pos, dir: Direction, tile: u16) -> bool {
        let Some((segment, loc)) = self.segment_mut_at(pos) else {
            return false;
        };
        segment.set_wall(loc.x, loc.y, tile.rotate_right(4 * u32::from(dir.index())));
        true
    }

    /// Sets the wall code on the `dir` side of `pos` only.
    pub fn set_wall(&mut self, pos: Pos, dir: Direction, code: u8) -> bool {
        let Some((segment, loc)) = self.segment_mut_at(pos) else {
            return false;
        };
        segment.set_wall_nibble(loc.x, loc.y, dir, code);
        true
    }

    /// Wall-no-pass threshold of the segment holding `pos`.
    fn wall_no_pass(&self, pos: Pos) -> u8 {
        match self.segment_at(pos) {
            Some((segment, _)) => segment.attributes().wall_no_pass,
            None => self.attributes().wall_no_pass,
        }
    }

    pub fn can_move(&self, pos: Pos, dir: Direction) -> bool {
        if self.is_outdoors() {
            return true;
        }
        self.wall(pos, dir) < self.wall_no_pass(pos)
    }

    /// Whether the `dir` wall of `pos` is solid enough to hide what lies behind it.
    pub(crate) fn blocks_view(&self, pos: Pos, dir: Direction) -> bool {
        !self.is_outdoors() && self.wall(pos, dir) != 0 && !self.can_move(pos, dir)
    }

    /// Breaks through a grate on the `dir` side of `pos`, rewriting both faces of the
    /// shared wall. Passable walls succeed without change; anything else fails, as does a
    /// grate whose far side lies in no loaded segment.
    pub fn try_bash(&mut self, pos: Pos, dir: Direction) -> bool {
        if self.can_move(pos, dir) {
            return true;
        }
        if self.wall(pos, dir) != WALL_GRATE {
            return false;
        }
        let beyond = dir.advance(pos);
        if self.resolve(beyond).is_none() {
            debug!("grate at {pos} facing {dir} opens onto nothing");
            return false;
        }
        self.set_wall(pos, dir, WALL_BASHED);
        self.set_wall(beyond, dir.reverse(), WALL_BASHED);
        debug!("bashed grate at {pos} facing {dir}");
        true
    }

    /// Moves one cell in `dir` and flips the ground/sky mirroring. The result may lie
    /// outside the home segment; [`Map::enter`] rebases it.
    pub fn step(&mut self, pos: Pos, dir: Direction) -> Pos {
        let next = dir.advance(pos);
        self.mirror = !self.mirror;
        self.mark_visited(next);
        next
    }

    /// Makes the segment holding `pos` the home segment, loading its objects, text and
    /// events, and returns `pos` in its local coordinates.
    pub fn enter(&mut self, archive: &Archive, pos: Pos) -> Result<Pos> {
        if pos.is_local() {
            return Ok(pos);
        }
        let loc = self.resolve(pos).ok_or(Error::NoNeighbour {
            map: self.home,
            x: pos.x,
            y: pos.y,
        })?;
        debug!("leaving map {} for map {}", self.home, loc.segment);
        self.events.abort();
        self.home = loc.segment;
        self.store.load_reachable(archive, loc.segment)?;
        self.load_map_files(archive);
        Ok(Pos::new(i32::from(loc.x), i32::from(loc.y)))
    }

    pub fn mark_seen(&mut self, pos: Pos) {
        if let Some((segment, loc)) = self.segment_mut_at(pos) {
            segment.mark_seen(loc.x, loc.y);
        }
    }

    pub fn is_seen(&self, pos: Pos) -> bool {
        self.segment_at(pos)
            .is_some_and(|(segment, loc)| segment.is_seen(loc.x, loc.y))
    }

    pub fn mark_visited(&mut self, pos: Pos) {
        if let Some((segment, loc)) = self.segment_mut_at(pos) {
            segment.mark_visited(loc.x, loc.y);
        }
    }

    pub fn is_visited(&self, pos: Pos) -> bool {
        self.segment_at(pos)
            .is_some_and(|(segment, loc)| segment.is_visited(loc.x, loc.y))
    }

    /// Starts the event attached to `pos` (home segment coordinates).
    pub fn run_event_at(&mut self, pos: Pos, facing: Direction, line: usize) -> bool {
        if !pos.is_local() {
            return false;
        }
        let cell = CellPos::new(pos.x as u8, pos.y as u8);
        self.events.start(cell, facing.index(), line)
    }
}
