use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("table of contents declares zero entries")]
    EmptyTable,

    #[error("table of contents out of bounds: entries={entry_count}, needs={needed}, file={file_len}")]
    TableOutOfBounds {
        entry_count: u16,
        needed: usize,
        file_len: usize,
    },

    #[error("entry data out of bounds: id={id:#06x}, off={offset}, size={size}, file={file_len}")]
    EntryOutOfBounds {
        id: u16,
        offset: u32,
        size: u32,
        file_len: usize,
    },

    #[error("save archive size mismatch: expected={expected}, assembled={assembled}")]
    SaveArchiveSizeMismatch { expected: usize, assembled: usize },

    #[error("too many entries for a table of contents: {got}")]
    TooManyEntries { got: usize },

    #[error("value does not fit its table field: {field}={value}")]
    FieldOverflow { field: &'static str, value: u64 },

    #[error("integer overflow")]
    IntegerOverflow,
}
