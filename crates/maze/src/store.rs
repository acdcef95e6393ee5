use crate::direction::{Direction, Pos};
use crate::segment::Segment;
use crate::Result;
use ccfile::{Archive, File, Source};
use log::{debug, warn};
use std::collections::{HashMap, HashSet, VecDeque};
use std::ops::Index;

/// A resolved position: the segment holding it and the cell inside that segment.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Location {
    pub segment: u16,
    pub x: u8,
    pub y: u8,
}

pub fn segment_file_name(id: u16) -> String {
    format!("MAZE{id:04}.DAT")
}

/// Reads a per-map file, preferring the copy stored in the save archive.
pub(crate) fn read_map_file(archive: &Archive, name: &str) -> Option<File> {
    archive
        .file_by_name(name, Source::Save)
        .or_else(|| archive.file_by_name(name, Source::Main))
}

/// Segments keyed by id. Neighbour links are plain ids resolved through this table.
#[derive(Clone, Debug, Default)]
pub struct SegmentStore {
    segments: HashMap<u16, Segment>,
}

impl SegmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, segment: Segment) {
        self.segments.insert(segment.id(), segment);
    }

    pub fn get(&self, id: u16) -> Option<&Segment> {
        self.segments.get(&id)
    }

    pub fn get_mut(&mut self, id: u16) -> Option<&mut Segment> {
        self.segments.get_mut(&id)
    }

    pub fn contains(&self, id: u16) -> bool {
        self.segments.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = u16> + '_ {
        self.segments.keys().copied()
    }

    /// Loads segment `id` from `archive` unless already present. Returns false when the
    /// archive has no such segment.
    pub fn load(&mut self, archive: &Archive, id: u16) -> Result<bool> {
        if self.contains(id) {
            return Ok(true);
        }
        let Some(file) = read_map_file(archive, &segment_file_name(id)) else {
            return Ok(false);
        };
        let mut segment = Segment::parse(file.as_slice())?;
        if segment.id() != id {
            debug!("segment file {id} records map number {}", segment.id());
            segment.set_id(id);
        }
        debug!(
            "loaded segment {id} ({}, {})",
            segment.wall_kind(),
            if segment.is_outdoors() { "outdoors" } else { "indoors" }
        );
        self.insert(segment);
        Ok(true)
    }

    /// Loads every segment reachable from `home` through neighbour links, so resolution
    /// only fails where a link is absent. Unreadable neighbours are skipped and act as
    /// missing links.
    pub fn load_reachable(&mut self, archive: &Archive, home: u16) -> Result<()> {
        if !self.load(archive, home)? {
            return Ok(());
        }
        let mut queue = VecDeque::from([home]);
        let mut queued = HashSet::from([home]);
        while let Some(id) = queue.pop_front() {
            let links: Vec<u16> = match self.get(id) {
                Some(segment) => Direction::ALL
                    .iter()
                    .filter_map(|&dir| segment.neighbour(dir))
                    .collect(),
                None => continue,
            };
            for next in links {
                if !queued.insert(next) {
                    continue;
                }
                match self.load(archive, next) {
                    Ok(true) => queue.push_back(next),
                    Ok(false) => debug!("segment {id} links to missing segment {next}"),
                    Err(err) => warn!("segment {next} unusable: {err}"),
                }
            }
        }
        Ok(())
    }

    /// Walks neighbour links from `home` until `pos` falls inside a segment.
    pub fn resolve(&self, home: u16, pos: Pos) -> Option<Location> {
        let mut id = home;
        self.get(id)?;
        for (offset, forward, backward) in [
            (pos.x, Direction::East, Direction::West),
            (pos.y, Direction::North, Direction::South),
        ] {
            let hops = offset.div_euclid(16);
            let dir = if hops > 0 { forward } else { backward };
            for _ in 0..hops.unsigned_abs() {
                id = self.get(id)?.neighbour(dir)?;
                self.get(id)?;
            }
        }
        Some(Location {
            segment: id,
            x: pos.x.rem_euclid(16) as u8,
            y: pos.y.rem_euclid(16) as u8,
        })
    }
}

impl Index<u16> for SegmentStore {
    type Output = Segment;

    fn index(&self, id: u16) -> &Segment {
        &self.segments[&id]
    }
}
