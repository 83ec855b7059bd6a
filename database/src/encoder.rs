//! The record encoder contract (spec.md §6): a fixed-width row goes in,
//! a `Key` the B+ tree can order comes out.
//!
//! This crate never interprets record bytes itself — it is an external
//! collaborator supplied by whoever owns the row format, the same way
//! the teacher's catalog hands a `Schema` to the storage engine without
//! the engine knowing what any column means.

use common::Key;

/// Derives an ordering key from a fixed-width record.
///
/// Implementations should be injective on the distinct logical values
/// the caller wants to index; `Database::put` does not detect or guard
/// against an encoder that collides two different records onto the same
/// key; a collision degrades to the duplicate-key semantics in §4.4.2.
pub trait RecordEncoder<const W: usize> {
    fn encode(record: &[u8; W]) -> Key;
}
