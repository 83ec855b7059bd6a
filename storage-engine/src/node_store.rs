//! The paged persistence layer for index nodes (spec.md §4.2).
//!
//! Grounded in `common::disk_manager::DiskManager` from the teacher crate:
//! positioned I/O (`read_exact_at`/`write_all_at`) against one open file
//! handle, with an allocation counter for new slot ids. Generalized from the
//! teacher's page-oriented, pinned/evictable model (a `BufferPoolManager`
//! sitting in front of `DiskManager`) down to this spec's simpler
//! unbuffered one: every `load` is a real read, every `store` a real
//! write, and node handles are explicitly released rather than pinned and
//! auto-unpinned by a guard's `Drop` — matching spec.md §4.2's literal
//! `allocate`/`store`/`load`/`release` contract and the load/create/free
//! counters in spec.md §5.

use common::{Counters, IndexError, Key, NodeId, Result, NULL_NODE};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::os::unix::fs::FileExt;
use std::path::Path;

use crate::node::{Node, RECORD_SIZE};

/// Fixed-size record at offset 0 of the index file (spec.md §3 "Header").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub node_count: u64,
    pub table_row_count: u64,
    pub root_node_id: NodeId,
}

const HEADER_SIZE: usize = 24;

impl Header {
    fn empty() -> Self {
        Self { node_count: 0, table_row_count: 0, root_node_id: NULL_NODE }
    }

    fn serialize(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..8].copy_from_slice(&self.node_count.to_le_bytes());
        buf[8..16].copy_from_slice(&self.table_row_count.to_le_bytes());
        buf[16..24].copy_from_slice(&self.root_node_id.to_le_bytes());
        buf
    }

    fn deserialize(bytes: &[u8; HEADER_SIZE]) -> Self {
        Self {
            node_count: u64::from_le_bytes(bytes[0..8].try_into().unwrap()),
            table_row_count: u64::from_le_bytes(bytes[8..16].try_into().unwrap()),
            root_node_id: u64::from_le_bytes(bytes[16..24].try_into().unwrap()),
        }
    }
}

/// A uniquely-owned, in-memory view of one loaded or newly-created node.
///
/// Per spec.md §9's design note, ownership itself expresses the "held
/// exactly once" contract; the explicit `release` call is kept (rather
/// than relying solely on `Drop`) so the load/create/free counters stay a
/// faithful, checkable record of every acquisition, and `Drop` only
/// debug-asserts that a handle was not silently discarded.
pub struct NodeHandle {
    node: Node,
    released: bool,
}

impl NodeHandle {
    fn new(node: Node) -> Self {
        Self { node, released: false }
    }
}

impl std::ops::Deref for NodeHandle {
    type Target = Node;
    fn deref(&self) -> &Node {
        &self.node
    }
}

impl std::ops::DerefMut for NodeHandle {
    fn deref_mut(&mut self) -> &mut Node {
        &mut self.node
    }
}

impl Drop for NodeHandle {
    fn drop(&mut self) {
        debug_assert!(self.released, "NodeHandle for node {} dropped without release()", self.node.id);
    }
}

/// Owns the index file: header, node allocation, and node slot I/O.
pub struct NodeStore {
    file: File,
    header: Header,
    counters: Counters,
}

impl NodeStore {
    /// Creates a fresh index file at `path`, truncating any existing
    /// contents, and writes an empty header.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        let mut store = Self { file, header: Header::empty(), counters: Counters::default() };
        store.header_write()?;
        Ok(store)
    }

    /// Opens an existing index file at `path` and reads its header.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let mut store = Self { file, header: Header::empty(), counters: Counters::default() };
        store.header_read()?;
        Ok(store)
    }

    pub fn header(&self) -> Header {
        self.header
    }

    pub fn set_table_row_count(&mut self, count: u64) {
        self.header.table_row_count = count;
    }

    pub fn set_root_node_id(&mut self, id: NodeId) {
        self.header.root_node_id = id;
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    /// Reads the header from offset 0 of the index file.
    pub fn header_read(&mut self) -> Result<()> {
        self.file.seek(SeekFrom::Start(0))?;
        let mut buf = [0u8; HEADER_SIZE];
        self.file.read_exact(&mut buf)?;
        self.header = Header::deserialize(&buf);
        Ok(())
    }

    /// Writes the header to offset 0 of the index file.
    pub fn header_write(&mut self) -> Result<()> {
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&self.header.serialize())?;
        Ok(())
    }

    fn slot_offset(id: NodeId) -> u64 {
        debug_assert_ne!(id, NULL_NODE);
        HEADER_SIZE as u64 + (id - 1) * RECORD_SIZE as u64
    }

    /// Allocates a new node id by incrementing `node_count`, returning an
    /// owned handle to a blank node at that id. The caller overwrites the
    /// handle's contents (`Node::new_leaf`/`new_internal`), stores it,
    /// and releases it through the same `release` path `load` uses — a
    /// create is tracked exactly like a load for the purposes of the
    /// `loads + creates == frees` invariant. Id `0` is never allocated.
    pub fn allocate(&mut self) -> NodeHandle {
        self.header.node_count += 1;
        let id = self.header.node_count;
        self.counters.record_create();
        NodeHandle::new(Node {
            id,
            parent_id: NULL_NODE,
            is_leaf: true,
            num_keys: 0,
            keys: [0; crate::constants::ORDER],
            children: [0; crate::constants::ORDER + 1],
        })
    }

    /// Writes a node's record to its slot. `node.id` must be non-zero.
    pub fn store(&mut self, node: &Node) -> Result<()> {
        if node.id == NULL_NODE {
            return Err(IndexError::Corrupt("store() called with node id 0".into()));
        }
        let offset = Self::slot_offset(node.id);
        self.file.write_all_at(&node.serialize(), offset)?;
        Ok(())
    }

    /// Reads the node at `id` into an owned handle.
    pub fn load(&mut self, id: NodeId) -> Result<NodeHandle> {
        if id == NULL_NODE {
            return Err(IndexError::Corrupt("load() called with node id 0".into()));
        }
        let offset = Self::slot_offset(id);
        let mut buf = vec![0u8; RECORD_SIZE];
        self.file.read_exact_at(&mut buf, offset)?;
        let node = Node::deserialize(&buf)?;
        self.counters.record_load();
        Ok(NodeHandle::new(node))
    }

    /// Releases a previously loaded or created handle. Releasing a handle
    /// whose id is `0` is a programming error (it cannot be constructed by
    /// `load`/`allocate`, so this only guards against manual misuse).
    pub fn release(&mut self, mut handle: NodeHandle) {
        debug_assert_ne!(handle.node.id, NULL_NODE, "released a node handle with id 0");
        handle.released = true;
        self.counters.record_free();
    }

    pub fn add_compares(&mut self, n: u64) {
        for _ in 0..n {
            self.counters.record_compare();
        }
    }

    pub fn record_insert(&mut self) {
        self.counters.record_insert();
    }

    pub fn record_split(&mut self) {
        self.counters.record_split();
    }
}

/// Searches `keys` for `target`, routed through the store's compare
/// counter. Kept here so both `tree` and tests can reuse it without
/// threading a raw counter reference through every call site.
pub(crate) fn bsearch_counted(store: &mut NodeStore, keys: &[Key], target: Key) -> crate::bsearch::Outcome {
    let mut compares = 0u64;
    let outcome = crate::bsearch::bsearch(keys, target, &mut compares);
    store.add_compares(compares);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn create_then_reopen_preserves_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.idx");

        {
            let mut store = NodeStore::create(&path).unwrap();
            store.set_table_row_count(3);
            store.set_root_node_id(1);
            store.header_write().unwrap();
        }

        let store = NodeStore::open(&path).unwrap();
        let header = store.header();
        assert_eq!(header.table_row_count, 3);
        assert_eq!(header.root_node_id, 1);
    }

    #[test]
    fn allocate_store_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.idx");
        let mut store = NodeStore::create(&path).unwrap();

        let allocated = store.allocate();
        let id = allocated.id;
        assert_eq!(id, 1);
        let mut node = Node::new_leaf(id, NULL_NODE);
        node.insert_leaf_entry(0, 42, 7);
        store.store(&node).unwrap();
        store.release(allocated);

        let handle = store.load(id).unwrap();
        assert_eq!(handle.keys(), &[42]);
        assert_eq!(handle.row_index(0), 7);
        store.release(handle);

        assert!(store.counters().balanced());
    }

    #[test]
    #[should_panic]
    fn dropping_handle_without_release_panics_in_debug() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.idx");
        let mut store = NodeStore::create(&path).unwrap();
        let allocated = store.allocate();
        let id = allocated.id;
        let node = Node::new_leaf(id, NULL_NODE);
        store.store(&node).unwrap();
        store.release(allocated);
        let _handle = store.load(id).unwrap();
        // handle dropped here without release(); debug_assert fires.
    }
}
