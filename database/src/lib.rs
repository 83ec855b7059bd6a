//! The database façade crate: a disk-backed key/value index over
//! fixed-width records, built on `storage_engine`'s B+ tree and row
//! heap.

mod database;
mod encoder;

pub use database::Database;
pub use encoder::RecordEncoder;

pub use storage_engine::PutOutcome;
