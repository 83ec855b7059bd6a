//! The storage engine: fixed-order B+ tree nodes backed by a flat index
//! file, plus the append-only row heap the tree's leaves point into.
//!
//! This crate has no knowledge of what a "record" looks like or how a
//! key is derived from one — that lives in the `database` façade. It
//! only knows how to place fixed-size node records on disk and navigate
//! them.

mod bsearch;
mod constants;
mod node;
mod node_store;
mod row_store;
mod tree;

pub use constants::ORDER;
pub use node::{Node, RECORD_SIZE};
pub use node_store::{Header, NodeHandle, NodeStore};
pub use row_store::RowStore;
pub use tree::{PutOutcome, Tree};
