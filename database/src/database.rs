//! The database façade (spec.md §4.5): composes the node store, row
//! store, and B+ tree engine into `create`/`open`/`close`/`put`/`get`.
//!
//! Grounded in `query-engine/src/database.rs`'s `Database`, which
//! likewise holds no storage logic of its own and only wires together
//! the pieces underneath it — here a `NodeStore` and a `RowStore`
//! instead of a `Catalog` over a shared buffer pool, since this index
//! has no concurrent readers to arbitrate.

use crate::encoder::RecordEncoder;
use common::{Counters, IndexError, Key, Result, NULL_NODE};
use std::marker::PhantomData;
use std::path::Path;
use storage_engine::{NodeStore, PutOutcome, RowStore, Tree};

const INDEX_EXTENSION: &str = "c4_index";
const TABLE_EXTENSION: &str = "c4_table";

/// A disk-backed key/value index over fixed-width records of width `W`,
/// keyed by whatever `E` derives from each record.
pub struct Database<E, const W: usize> {
    nodes: NodeStore,
    rows: RowStore<W>,
    _encoder: PhantomData<E>,
}

impl<E: RecordEncoder<W>, const W: usize> Database<E, W> {
    /// Creates a fresh `<name>.c4_index` / `<name>.c4_table` pair: a
    /// single empty leaf (node id 1) as the root.
    pub fn create(name: &str) -> Result<Self> {
        let mut nodes = NodeStore::create(index_path(name))?;
        let rows = RowStore::<W>::create(table_path(name))?;

        let mut root = nodes.allocate();
        let root_id = root.id;
        debug_assert_eq!(root_id, 1);
        *root = storage_engine::Node::new_leaf(root_id, NULL_NODE);
        nodes.store(&root)?;
        nodes.release(root);
        nodes.set_root_node_id(root_id);
        nodes.set_table_row_count(0);
        nodes.header_write()?;

        Ok(Self { nodes, rows, _encoder: PhantomData })
    }

    /// Opens an existing `<name>.c4_index` / `<name>.c4_table` pair.
    pub fn open(name: &str) -> Result<Self> {
        let nodes = NodeStore::open(index_path(name))?;
        let rows = RowStore::<W>::open(table_path(name))?;
        Ok(Self { nodes, rows, _encoder: PhantomData })
    }

    /// Inserts or updates `record`, keyed by `E::encode(record)`.
    pub fn put(&mut self, record: &[u8; W]) -> Result<PutOutcome> {
        let key = E::encode(record);
        let root = self.nodes.header().root_node_id;
        let row_index = self.nodes.header().table_row_count;

        let outcome = {
            let mut tree = Tree::new(&mut self.nodes);
            let outcome = tree.put(root, key, row_index)?;
            let true_root = tree.find_root(root)?;
            self.nodes.set_root_node_id(true_root);
            outcome
        };

        if outcome == PutOutcome::Inserted {
            self.rows.append(row_index, record)?;
            self.nodes.set_table_row_count(row_index + 1);
        }

        #[cfg(debug_assertions)]
        {
            let root = self.nodes.header().root_node_id;
            Tree::new(&mut self.nodes).check_invariants(root)?;
        }

        Ok(outcome)
    }

    /// Looks up `key`, fetching the matching record if present.
    pub fn get(&mut self, key: Key) -> Result<Option<[u8; W]>> {
        let root = self.nodes.header().root_node_id;
        let row_index = Tree::new(&mut self.nodes).get(root, key)?;
        match row_index {
            Some(row_index) => Ok(Some(self.rows.fetch(row_index)?)),
            None => Ok(None),
        }
    }

    /// Diagnostic counters (`creates`, `loads`, `frees`, `key_inserts`,
    /// `splits`, `key_compares`), for a caller to print or assert on.
    pub fn counters(&self) -> Counters {
        self.nodes.counters()
    }

    /// The number of rows appended so far (`header.table_row_count`).
    pub fn row_count(&self) -> u64 {
        self.nodes.header().table_row_count
    }

    /// Writes the header and asserts the load/create/free counters are
    /// balanced. Consumes `self`; both file handles close when the
    /// `NodeStore`/`RowStore` are dropped.
    pub fn close(mut self) -> Result<()> {
        self.nodes.header_write()?;
        if !self.nodes.counters().balanced() {
            return Err(IndexError::Corrupt(format!(
                "unbalanced node handle counters at close: {:?}",
                self.nodes.counters()
            )));
        }
        Ok(())
    }
}

fn index_path(name: &str) -> std::path::PathBuf {
    Path::new(name).with_extension(INDEX_EXTENSION)
}

fn table_path(name: &str) -> std::path::PathBuf {
    Path::new(name).with_extension(TABLE_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    struct IdentityEncoder;
    impl RecordEncoder<8> for IdentityEncoder {
        fn encode(record: &[u8; 8]) -> Key {
            u64::from_le_bytes(*record)
        }
    }

    fn record(n: u64) -> [u8; 8] {
        n.to_le_bytes()
    }

    #[test]
    fn insert_then_get_round_trips() {
        let dir = tempdir().unwrap();
        let name = dir.path().join("db").to_string_lossy().into_owned();

        let mut db = Database::<IdentityEncoder, 8>::create(&name).unwrap();
        assert_eq!(db.put(&record(10)).unwrap(), PutOutcome::Inserted);
        assert_eq!(db.put(&record(20)).unwrap(), PutOutcome::Inserted);
        assert_eq!(db.put(&record(30)).unwrap(), PutOutcome::Inserted);

        assert_eq!(db.get(20).unwrap(), Some(record(20)));
        assert_eq!(db.get(25).unwrap(), None);

        db.close().unwrap();
    }

    #[test]
    fn duplicate_insert_reports_updated_and_does_not_grow_table() {
        let dir = tempdir().unwrap();
        let name = dir.path().join("db").to_string_lossy().into_owned();

        let mut db = Database::<IdentityEncoder, 8>::create(&name).unwrap();
        assert_eq!(db.put(&record(5)).unwrap(), PutOutcome::Inserted);
        assert_eq!(db.put(&record(5)).unwrap(), PutOutcome::Updated);
        assert_eq!(db.nodes.header().table_row_count, 1);
        db.close().unwrap();
    }

    #[test]
    fn fourth_insert_splits_and_tree_is_still_fully_readable() {
        let dir = tempdir().unwrap();
        let name = dir.path().join("db").to_string_lossy().into_owned();

        let mut db = Database::<IdentityEncoder, 8>::create(&name).unwrap();
        for n in [10, 20, 30, 40] {
            db.put(&record(n)).unwrap();
        }
        assert_eq!(db.nodes.header().node_count, 3);
        for n in [10, 20, 30, 40] {
            assert_eq!(db.get(n).unwrap(), Some(record(n)));
        }
        db.close().unwrap();
    }

    #[test]
    fn reopen_after_close_preserves_data() {
        let dir = tempdir().unwrap();
        let name = dir.path().join("db").to_string_lossy().into_owned();

        {
            let mut db = Database::<IdentityEncoder, 8>::create(&name).unwrap();
            for n in [10, 20, 30, 40] {
                db.put(&record(n)).unwrap();
            }
            db.close().unwrap();
        }

        let mut db = Database::<IdentityEncoder, 8>::open(&name).unwrap();
        assert_eq!(db.get(40).unwrap(), Some(record(40)));
        assert_eq!(db.get(999).unwrap(), None);
        db.close().unwrap();
    }

    #[test]
    fn ascending_run_keeps_every_key_reachable() {
        let dir = tempdir().unwrap();
        let name = dir.path().join("db").to_string_lossy().into_owned();

        let mut db = Database::<IdentityEncoder, 8>::create(&name).unwrap();
        for n in 1..=16u64 {
            db.put(&record(n)).unwrap();
        }
        for n in 1..=16u64 {
            assert_eq!(db.get(n).unwrap(), Some(record(n)));
        }
        assert_eq!(db.get(17).unwrap(), None);
        db.close().unwrap();
    }
}
