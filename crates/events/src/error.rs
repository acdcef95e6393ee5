use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("event line at {offset} declares {declared} bytes, only {available} remain")]
    LineTruncated {
        offset: usize,
        declared: u8,
        available: usize,
    },

    #[error("event line at {offset} too short for its header: len={declared}")]
    LineTooShort { offset: usize, declared: u8 },

    #[error("opcode {opcode:#04x} at {offset} needs {expected} argument bytes, got {found}")]
    MissingArguments {
        offset: usize,
        opcode: u8,
        expected: usize,
        found: usize,
    },
}
