//! Fundamental types shared by the storage engine and the database façade:
//! key/id vocabulary, the shared error type, and diagnostic counters.

mod counters;
mod error;
mod types;

pub use counters::Counters;
pub use error::{IndexError, Result};
pub use types::{Key, NodeId, RowIndex, NULL_NODE};
