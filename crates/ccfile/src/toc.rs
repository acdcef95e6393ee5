use crate::cipher::{TocKey, TOC_SEED};
use crate::error::Error;
use crate::Result;

/// Stored size of one table row: id (2), offset (3), size (2), padding (1).
pub const TOC_ENTRY_SIZE: usize = 8;
/// Largest offset representable in the three-byte field.
pub const MAX_OFFSET: u32 = 0x00FF_FFFF;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Entry {
    pub id: u16,
    pub offset: u32,
    pub size: u32,
    pub padding: u8,
}

impl Entry {
    pub fn end(&self) -> u64 {
        u64::from(self.offset) + u64::from(self.size)
    }

    fn from_plain(row: &[u8; TOC_ENTRY_SIZE]) -> Self {
        Self {
            id: u16::from_le_bytes([row[0], row[1]]),
            offset: u32::from_le_bytes([row[2], row[3], row[4], 0]),
            size: u32::from(u16::from_le_bytes([row[5], row[6]])),
            padding: row[7],
        }
    }

    fn to_plain(self) -> Result<[u8; TOC_ENTRY_SIZE]> {
        if self.offset > MAX_OFFSET {
            return Err(Error::FieldOverflow {
                field: "offset",
                value: u64::from(self.offset),
            });
        }
        let size = u16::try_from(self.size).map_err(|_| Error::FieldOverflow {
            field: "size",
            value: u64::from(self.size),
        })?;
        let id = self.id.to_le_bytes();
        let offset = self.offset.to_le_bytes();
        let size = size.to_le_bytes();
        Ok([
            id[0],
            id[1],
            offset[0],
            offset[1],
            offset[2],
            size[0],
            size[1],
            self.padding,
        ])
    }
}

/// Number of bytes a table with `count` entries occupies, including the count prefix.
pub fn toc_len(count: usize) -> usize {
    2 + count * TOC_ENTRY_SIZE
}

/// Decodes a table of contents from the start of `bytes`.
///
/// The entry count is stored in the clear; every following table byte goes through one
/// continuous [`TocKey`] stream starting at [`TOC_SEED`].
pub fn decode_toc(bytes: &[u8]) -> Result<Vec<Entry>> {
    let Some(count_raw) = bytes.get(0..2) else {
        return Err(Error::TableOutOfBounds {
            entry_count: 0,
            needed: 2,
            file_len: bytes.len(),
        });
    };
    let entry_count = u16::from_le_bytes([count_raw[0], count_raw[1]]);
    if entry_count == 0 {
        return Err(Error::EmptyTable);
    }

    let count = usize::from(entry_count);
    let needed = toc_len(count);
    let Some(table) = bytes.get(2..needed) else {
        return Err(Error::TableOutOfBounds {
            entry_count,
            needed,
            file_len: bytes.len(),
        });
    };

    let mut key = TocKey::new(TOC_SEED);
    let mut entries = Vec::with_capacity(count);
    for stored in table.chunks_exact(TOC_ENTRY_SIZE) {
        let mut row = [0u8; TOC_ENTRY_SIZE];
        for (dst, &src) in row.iter_mut().zip(stored) {
            *dst = key.decode_byte(src);
        }
        entries.push(Entry::from_plain(&row));
    }
    Ok(entries)
}

/// Encodes `entries` into the stored table form, count prefix included.
pub fn encode_toc(entries: &[Entry]) -> Result<Vec<u8>> {
    let count = u16::try_from(entries.len()).map_err(|_| Error::TooManyEntries {
        got: entries.len(),
    })?;
    let mut out = Vec::with_capacity(toc_len(entries.len()));
    out.extend_from_slice(&count.to_le_bytes());

    let mut key = TocKey::new(TOC_SEED);
    for entry in entries {
        for byte in entry.to_plain()? {
            out.push(key.encode_byte(byte));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_known_fixture_row() {
        let mut bytes = vec![1u8, 0];
        bytes.extend_from_slice(&[0u8; 8]);
        let entries = decode_toc(&bytes).expect("fixture table must decode");
        assert_eq!(
            entries,
            vec![Entry {
                id: 0x13AC,
                offset: 0x48_E17A,
                size: 0x16AF,
                padding: 0x7D,
            }]
        );
    }

    #[test]
    fn key_threads_across_rows() {
        let entries = [
            Entry { id: 1, offset: 18, size: 4, padding: 0 },
            Entry { id: 2, offset: 22, size: 4, padding: 0 },
        ];
        let encoded = encode_toc(&entries).expect("encode");
        // The second row must not be encoded as if the key restarted.
        let restarted = encode_toc(&entries[1..]).expect("encode");
        assert_ne!(&encoded[10..18], &restarted[2..10]);
        assert_eq!(decode_toc(&encoded).expect("decode"), entries);
    }

    #[test]
    fn zero_count_is_rejected() {
        assert!(matches!(decode_toc(&[0, 0, 1, 2, 3]), Err(Error::EmptyTable)));
    }

    #[test]
    fn truncated_table_is_rejected() {
        let bytes = [2u8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        assert!(matches!(
            decode_toc(&bytes),
            Err(Error::TableOutOfBounds { entry_count: 2, needed: 18, .. })
        ));
        assert!(matches!(decode_toc(&[1]), Err(Error::TableOutOfBounds { .. })));
    }

    #[test]
    fn oversized_fields_are_rejected_on_encode() {
        let wide = Entry { id: 1, offset: 0x0100_0000, size: 1, padding: 0 };
        assert!(matches!(
            encode_toc(&[wide]),
            Err(Error::FieldOverflow { field: "offset", .. })
        ));
        let big = Entry { id: 1, offset: 0, size: 0x1_0000, padding: 0 };
        assert!(matches!(
            encode_toc(&[big]),
            Err(Error::FieldOverflow { field: "size", .. })
        ));
    }
}
