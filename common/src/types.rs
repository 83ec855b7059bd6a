//! Fundamental identifiers shared across the index, the row heap, and the
//! database façade.

/// A 64-bit key derived from a record by an external encoder. Totally
/// ordered by native integer order.
pub type Key = u64;

/// A 1-based identifier for a node slot in the index file. `0` is reserved
/// and means "no node / null parent".
pub type NodeId = u64;

/// `NodeId` value meaning "no node / null parent".
pub const NULL_NODE: NodeId = 0;

/// A 0-based identifier for a row slot in the table file.
pub type RowIndex = u64;
