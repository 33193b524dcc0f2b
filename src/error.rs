//! Error type shared by every fallible operation of the crate.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by pcon.
#[derive(Debug, Error)]
pub enum Error {
    /// A character outside `{A, C, G, T}` was encoded.
    #[error("invalid base {base:?} (0x{byte:02x}), expected one of A, C, G, T")]
    InvalidBase {
        /// Offending byte as a char, for display.
        base: char,
        /// Offending byte.
        byte: u8,
    },
    /// `k`, `bit_width` or the resulting buffer size is not supported.
    #[error("invalid k-mer geometry: {0}")]
    InvalidK(String),
    /// Input path does not exist.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Header or payload does not match what the reader expects.
    #[error("invalid pcon file: {0}")]
    Format(String),
    /// Sequence input could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),
}

impl Error {
    pub(crate) fn invalid_base(byte: u8) -> Self {
        Error::InvalidBase {
            base: byte as char,
            byte,
        }
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Error::Io(e.into())
    }
}

/// Crate result alias.
pub type Result<T> = std::result::Result<T, Error>;
