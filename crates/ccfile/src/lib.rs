pub mod builder;
pub mod cipher;
pub mod error;
pub mod hash;
pub mod toc;

use crate::cipher::xor_payload;
use crate::error::Error;
use common::OutputBuffer;
use log::{debug, warn};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

pub use crate::builder::ArchiveBuilder;
pub use crate::hash::name_id;
pub use crate::toc::{decode_toc, encode_toc, Entry};

pub type Result<T> = core::result::Result<T, Error>;

/// Entries whose concatenated payloads form the embedded save archive, in read order.
pub const SAVE_SLOT_IDS: [u16; 6] = [
    name_id("MAZE.CHR"),
    name_id("MAZE.PTY"),
    name_id("MAZE.OBJ"),
    name_id("MAZE.EVT"),
    name_id("MAZE.MAP"),
    name_id("MAZE.TXT"),
];

#[derive(Clone, Debug)]
pub struct OpenOptions {
    /// Undo the payload XOR when reading main-archive entries.
    pub xor_payloads: bool,
    /// Assemble the save sub-archive from the save-slot entries.
    pub build_save_archive: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            xor_payloads: true,
            build_save_archive: true,
        }
    }
}

/// Which table a lookup goes through.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Source {
    Main,
    Save,
}

/// A decoded asset. Clones share one buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct File {
    id: u16,
    data: Arc<[u8]>,
}

impl File {
    pub fn new(id: u16, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            id,
            data: data.into(),
        }
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn shared(&self) -> Arc<[u8]> {
        Arc::clone(&self.data)
    }
}

impl AsRef<[u8]> for File {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

#[derive(Debug)]
struct SaveArchive {
    bytes: Arc<[u8]>,
    entries: Vec<Entry>,
}

#[derive(Debug)]
pub struct Archive {
    bytes: Arc<[u8]>,
    entries: Vec<Entry>,
    save: Option<SaveArchive>,
    xor_payloads: bool,
}

impl Archive {
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_path_with(path, OpenOptions::default())
    }

    pub fn open_path_with(path: impl AsRef<Path>, opts: OpenOptions) -> Result<Self> {
        let bytes = fs::read(path.as_ref())?;
        let arc: Arc<[u8]> = Arc::from(bytes.into_boxed_slice());
        let archive = Self::open_bytes(arc, opts)?;
        debug!(
            "opened {}: {} entries",
            path.as_ref().display(),
            archive.entry_count()
        );
        Ok(archive)
    }

    /// Opens `path`, degrading to an archive with no entries when it cannot be read or
    /// parsed. Every lookup on the result reports "not found".
    pub fn open_or_empty(path: impl AsRef<Path>) -> Self {
        match Self::open_path(path.as_ref()) {
            Ok(archive) => archive,
            Err(err) => {
                warn!("archive {} unusable: {err}", path.as_ref().display());
                Self::empty()
            }
        }
    }

    pub fn empty() -> Self {
        Self {
            bytes: Arc::from(Vec::new().into_boxed_slice()),
            entries: Vec::new(),
            save: None,
            xor_payloads: true,
        }
    }

    pub fn open_bytes(bytes: Arc<[u8]>, opts: OpenOptions) -> Result<Self> {
        let entries = decode_toc(&bytes)?;
        for entry in &entries {
            check_range(entry, bytes.len())?;
        }

        let mut archive = Self {
            bytes,
            entries,
            save: None,
            xor_payloads: opts.xor_payloads,
        };
        if opts.build_save_archive {
            archive.save = archive.assemble_save_archive()?;
        }
        Ok(archive)
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    pub fn save_entries(&self) -> impl Iterator<Item = &Entry> {
        self.save.iter().flat_map(|save| save.entries.iter())
    }

    pub fn has_save_archive(&self) -> bool {
        self.save.is_some()
    }

    /// Size of the assembled save buffer, zero when there is none.
    pub fn save_archive_len(&self) -> usize {
        self.save.as_ref().map_or(0, |save| save.bytes.len())
    }

    /// First main-table entry with `id`.
    pub fn entry(&self, id: u16) -> Option<Entry> {
        self.entries.iter().find(|entry| entry.id == id).copied()
    }

    pub fn save_entry(&self, id: u16) -> Option<Entry> {
        self.save
            .as_ref()?
            .entries
            .iter()
            .find(|entry| entry.id == id)
            .copied()
    }

    /// Stored bytes of a main-table entry, before the payload XOR.
    pub fn raw(&self, id: u16) -> Option<&[u8]> {
        let entry = self.entry(id)?;
        slice_of(&self.bytes, &entry)
    }

    pub fn file(&self, id: u16, source: Source) -> Option<File> {
        match source {
            Source::Main => {
                let mut data = self.raw(id)?.to_vec();
                if self.xor_payloads {
                    xor_payload(&mut data);
                }
                Some(File::new(id, data))
            }
            Source::Save => {
                let save = self.save.as_ref()?;
                let entry = save.entries.iter().find(|entry| entry.id == id)?;
                slice_of(&save.bytes, entry).map(|data| File::new(id, data))
            }
        }
    }

    pub fn file_by_name(&self, name: &str, source: Source) -> Option<File> {
        self.file(name_id(name), source)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entry(name_id(name)).is_some()
    }

    /// Writes the decoded payload of `id` into `out`. Returns the byte count, or `None`
    /// when the entry does not exist.
    pub fn file_into(
        &self,
        id: u16,
        source: Source,
        out: &mut dyn OutputBuffer,
    ) -> Result<Option<usize>> {
        let Some(file) = self.file(id, source) else {
            return Ok(None);
        };
        out.write_exact(file.as_slice())?;
        Ok(Some(file.len()))
    }

    fn assemble_save_archive(&self) -> Result<Option<SaveArchive>> {
        let expected: usize = SAVE_SLOT_IDS
            .iter()
            .map(|&id| self.entry(id).map_or(0, |entry| entry.size as usize))
            .sum();
        if expected == 0 {
            return Ok(None);
        }

        let mut assembled = Vec::with_capacity(expected);
        for &id in &SAVE_SLOT_IDS {
            if let Some(file) = self.file(id, Source::Main) {
                assembled.extend_from_slice(file.as_slice());
            }
        }
        if assembled.len() != expected {
            return Err(Error::SaveArchiveSizeMismatch {
                expected,
                assembled: assembled.len(),
            });
        }

        let entries = decode_toc(&assembled)?;
        for entry in &entries {
            check_range(entry, assembled.len())?;
        }
        debug!(
            "save archive: {} bytes, {} entries",
            assembled.len(),
            entries.len()
        );
        Ok(Some(SaveArchive {
            bytes: Arc::from(assembled.into_boxed_slice()),
            entries,
        }))
    }
}

/// Memoises decoded files so repeated readers share one buffer.
#[derive(Debug, Default)]
pub struct FileCache {
    files: HashMap<(Source, u16), File>,
}

impl FileCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, archive: &Archive, id: u16, source: Source) -> Option<File> {
        if let Some(file) = self.files.get(&(source, id)) {
            return Some(file.clone());
        }
        let file = archive.file(id, source)?;
        self.files.insert((source, id), file.clone());
        Some(file)
    }

    pub fn get_by_name(&mut self, archive: &Archive, name: &str, source: Source) -> Option<File> {
        self.get(archive, name_id(name), source)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }
}

fn check_range(entry: &Entry, len: usize) -> Result<()> {
    if entry.end() > len as u64 {
        return Err(Error::EntryOutOfBounds {
            id: entry.id,
            offset: entry.offset,
            size: entry.size,
            file_len: len,
        });
    }
    Ok(())
}

fn slice_of<'a>(bytes: &'a [u8], entry: &Entry) -> Option<&'a [u8]> {
    let start = usize::try_from(entry.offset).ok()?;
    let end = start.checked_add(usize::try_from(entry.size).ok()?)?;
    bytes.get(start..end)
}

#[cfg(test)]
mod tests;
