//! The shared error type for the index.
//!
//! Kept deliberately small: an I/O failure is fatal (the caller should not
//! proceed with a possibly-corrupted in-memory view of the tree), and a
//! corrupt-on-disk record is reported rather than silently misread.

use std::fmt;

/// Errors that can surface from the node store, row store, or tree engine.
#[derive(Debug)]
pub enum IndexError {
    /// A read, write, or seek on the index or table file failed.
    Io(std::io::Error),
    /// An on-disk record failed a basic structural sanity check.
    Corrupt(String),
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexError::Io(err) => write!(f, "I/O error: {}", err),
            IndexError::Corrupt(msg) => write!(f, "corrupt on-disk record: {}", msg),
        }
    }
}

impl std::error::Error for IndexError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IndexError::Io(err) => Some(err),
            IndexError::Corrupt(_) => None,
        }
    }
}

impl From<std::io::Error> for IndexError {
    fn from(err: std::io::Error) -> Self {
        IndexError::Io(err)
    }
}

/// A specialized `Result` for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;
