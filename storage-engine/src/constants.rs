//! Compile-time tree shape constants.
//!
//! `ORDER` is fixed rather than derived from a page size the way the
//! teacher's `IndexMetadata::compute_fanout` derives leaf/internal fanout
//! from `PAGE_SIZE` and key width: this index has exactly one key type
//! (`u64`) and the specification defines the split arithmetic only for
//! even `ORDER >= 4` (open question Q2), so `ORDER` is a single checked
//! constant instead of a runtime-computed value.

/// Maximum `num_keys + 1` a node may transiently reach inside insert
/// before a split runs.
pub const ORDER: usize = 4;

/// Index of the key that rises into the parent on a leaf split.
pub const SPLIT_KEY_INDEX: usize = (ORDER - 1) / 2;

/// First child index that migrates to the new sibling on an internal split.
pub const SPLIT_NODE_INDEX: usize = ORDER / 2;

const _: () = assert!(ORDER >= 4, "ORDER must be at least 4");
const _: () = assert!(ORDER % 2 == 0, "ORDER must be even (see spec open question Q2)");
