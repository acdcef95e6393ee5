use crate::cipher::xor_payload;
use crate::error::Error;
use crate::hash::name_id;
use crate::toc::{encode_toc, toc_len, Entry, MAX_OFFSET};
use crate::Result;

/// Assembles a container the reader accepts: stored table first, payloads packed
/// directly after it in insertion order.
#[derive(Clone, Debug)]
pub struct ArchiveBuilder {
    items: Vec<(u16, Vec<u8>)>,
    xor_payloads: bool,
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            xor_payloads: true,
        }
    }

    /// Builder for a save bundle: payloads are stored in the clear.
    pub fn save_bundle() -> Self {
        Self {
            items: Vec::new(),
            xor_payloads: false,
        }
    }

    pub fn add(&mut self, id: u16, data: impl Into<Vec<u8>>) -> &mut Self {
        self.items.push((id, data.into()));
        self
    }

    pub fn add_named(&mut self, name: &str, data: impl Into<Vec<u8>>) -> &mut Self {
        self.add(name_id(name), data)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn build(&self) -> Result<Vec<u8>> {
        let mut offset = toc_len(self.items.len());
        let mut entries = Vec::with_capacity(self.items.len());
        for (id, data) in &self.items {
            let offset_u32 = u32::try_from(offset).map_err(|_| Error::IntegerOverflow)?;
            if offset_u32 > MAX_OFFSET {
                return Err(Error::FieldOverflow {
                    field: "offset",
                    value: u64::from(offset_u32),
                });
            }
            let size = u32::try_from(data.len()).map_err(|_| Error::IntegerOverflow)?;
            entries.push(Entry {
                id: *id,
                offset: offset_u32,
                size,
                padding: 0,
            });
            offset = offset.checked_add(data.len()).ok_or(Error::IntegerOverflow)?;
        }

        let mut out = encode_toc(&entries)?;
        out.reserve(offset.saturating_sub(out.len()));
        for (_, data) in &self.items {
            let start = out.len();
            out.extend_from_slice(data);
            if self.xor_payloads {
                xor_payload(&mut out[start..]);
            }
        }
        Ok(out)
    }
}
