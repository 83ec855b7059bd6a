//! The B+ tree engine (spec.md §4.4): point lookup, insert-or-update,
//! split propagation, root promotion, and the whole-tree correctness
//! check.
//!
//! Grounded in `storage-engine/src/index/bptree.rs`'s `search`/`insert`/
//! `split_leaf`/`split_internal`/`insert_into_parent` shape, rewritten as
//! an explicit loop instead of recursion for the top-down descent (an
//! `&mut NodeStore` borrowed across recursive calls fights the borrow
//! checker far more than a `loop` does, and the teacher itself already
//! mixes both styles — `bptree.rs`'s descent loops, while its split
//! propagation recurses through `insert_into_parent`). Unlike the teacher,
//! there is no latch crabbing (Non-goal: concurrent writers) and no
//! right-biased 60/40 split heuristic (spec.md §4.4.3 fixes the split
//! point at `SPLIT_KEY_INDEX`/`SPLIT_NODE_INDEX`, independent of insert
//! order).

use crate::bsearch::Outcome;
use crate::constants::{ORDER, SPLIT_KEY_INDEX, SPLIT_NODE_INDEX};
use crate::node::Node;
use crate::node_store::{bsearch_counted, NodeHandle, NodeStore};
use common::{Key, NodeId, Result, RowIndex, NULL_NODE};

/// The outcome of a `put`: whether the key was newly inserted or an
/// existing key's value was (leaf-level) overwritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Inserted,
    Updated,
}

/// A thin, stateless wrapper around `&mut NodeStore` exposing the tree
/// algorithms. Holds no tree state of its own — root id and header live
/// in the database façade (spec.md §4.5).
pub struct Tree<'a> {
    store: &'a mut NodeStore,
}

impl<'a> Tree<'a> {
    pub fn new(store: &'a mut NodeStore) -> Self {
        Self { store }
    }

    /// Point lookup (spec.md §4.4.1).
    pub fn get(&mut self, root_id: NodeId, key: Key) -> Result<Option<RowIndex>> {
        let mut current_id = root_id;
        loop {
            let node = self.store.load(current_id)?;
            if node.is_leaf {
                let outcome = bsearch_counted(self.store, node.keys(), key);
                let result = match outcome {
                    Outcome::Found(i) => Some(node.row_index(i)),
                    Outcome::Insert(_) => None,
                };
                self.store.release(node);
                return Ok(result);
            }
            let outcome = bsearch_counted(self.store, node.keys(), key);
            let next_id = match outcome {
                Outcome::Found(i) => node.child_id(i + 1),
                Outcome::Insert(i) => node.child_id(i),
            };
            self.store.release(node);
            current_id = next_id;
        }
    }

    /// Insert-or-update (spec.md §4.4.2). `row` is discarded without
    /// reaching the leaf if a duplicate key is observed while descending
    /// through an internal node — this is the specification's open
    /// question Q1, implemented as the literal observed behavior of the
    /// append-only index it was distilled from, not "fixed".
    pub fn put(&mut self, root_id: NodeId, key: Key, row: RowIndex) -> Result<PutOutcome> {
        let mut current_id = root_id;
        loop {
            let mut node = self.store.load(current_id)?;

            if node.is_leaf {
                let outcome = bsearch_counted(self.store, node.keys(), key);
                return match outcome {
                    Outcome::Found(_) => {
                        // The façade has not necessarily committed `row`
                        // to the row store yet (it only appends once it
                        // sees Inserted) — overwriting the leaf's pointer
                        // here would point it at a row that may never be
                        // written. Leave the existing pointer untouched,
                        // the same way the internal-node Q1 shortcut does.
                        self.store.release(node);
                        Ok(PutOutcome::Updated)
                    }
                    Outcome::Insert(i) => {
                        node.insert_leaf_entry(i, key, row);
                        self.store.record_insert();
                        if node.is_full() {
                            self.split_leaf_and_propagate(node)?;
                        } else {
                            self.store.store(&node)?;
                            self.store.release(node);
                        }
                        Ok(PutOutcome::Inserted)
                    }
                };
            }

            let outcome = bsearch_counted(self.store, node.keys(), key);
            match outcome {
                Outcome::Found(_) => {
                    // Q1: key already lives in the subtree at children[i+1].
                    // Report Updated without descending; the leaf's value
                    // is left untouched.
                    self.store.release(node);
                    return Ok(PutOutcome::Updated);
                }
                Outcome::Insert(i) => {
                    let next_id = node.child_id(i);
                    self.store.release(node);
                    current_id = next_id;
                }
            }
        }
    }

    /// Walks `parent_id` upward from `hint` until it finds the true root
    /// (spec.md §4.4.5). The caller is expected to pass the header's
    /// `root_node_id` and write the result back into the header.
    pub fn find_root(&mut self, hint: NodeId) -> Result<NodeId> {
        let mut current = hint;
        loop {
            let node = self.store.load(current)?;
            let parent = node.parent_id;
            self.store.release(node);
            if parent == NULL_NODE {
                return Ok(current);
            }
            current = parent;
        }
    }

    /// Splits a full leaf (spec.md §4.4.3, leaf case) and propagates the
    /// resulting separator key into the parent, or promotes a new root if
    /// the leaf being split had none.
    fn split_leaf_and_propagate(&mut self, mut node: NodeHandle) -> Result<()> {
        debug_assert!(node.is_leaf);
        debug_assert!(node.is_full());

        let up_key = node.keys[SPLIT_KEY_INDEX];

        let mut sibling = self.store.allocate();
        let sibling_id = sibling.id;
        *sibling = Node::new_leaf(sibling_id, node.parent_id);
        let mut count = 0usize;
        for i in SPLIT_KEY_INDEX..ORDER {
            sibling.keys[count] = node.keys[i];
            sibling.children[count] = node.children[i];
            count += 1;
        }
        sibling.num_keys = count as u16;
        node.num_keys = SPLIT_KEY_INDEX as u16;

        self.store.store(&node)?;
        self.store.store(&sibling)?;
        self.store.record_split();

        let parent_id = node.parent_id;
        let node_id = node.id;
        self.store.release(node);
        self.store.release(sibling);

        if parent_id == NULL_NODE {
            self.promote_new_root(node_id, up_key, sibling_id)
        } else {
            self.insert_into_parent(parent_id, up_key, sibling_id)
        }
    }

    /// Splits a full internal node (spec.md §4.4.3, internal case),
    /// reparenting every migrated child, then propagates as above.
    fn split_internal_and_propagate(&mut self, mut node: NodeHandle) -> Result<()> {
        debug_assert!(!node.is_leaf);
        debug_assert!(node.is_full());

        let new_num_keys = ORDER - SPLIT_NODE_INDEX - 1;
        let up_key = node.keys[new_num_keys];

        let mut sibling = self.store.allocate();
        let sibling_id = sibling.id;
        *sibling = Node::new_internal(sibling_id, node.parent_id);

        let mut count = 0usize;
        for i in SPLIT_NODE_INDEX..ORDER {
            sibling.keys[count] = node.keys[i];
            count += 1;
        }
        sibling.num_keys = count as u16;

        let mut ccount = 0usize;
        for i in SPLIT_NODE_INDEX..=ORDER {
            sibling.children[ccount] = node.children[i];
            ccount += 1;
        }

        node.num_keys = new_num_keys as u16;

        self.store.store(&node)?;
        self.store.store(&sibling)?;
        self.store.record_split();

        for i in 0..=sibling.num_keys as usize {
            let child_id = sibling.child_id(i);
            let mut child = self.store.load(child_id)?;
            child.parent_id = sibling.id;
            self.store.store(&child)?;
            self.store.release(child);
        }

        let parent_id = node.parent_id;
        let node_id = node.id;
        self.store.release(node);
        self.store.release(sibling);

        if parent_id == NULL_NODE {
            self.promote_new_root(node_id, up_key, sibling_id)
        } else {
            self.insert_into_parent(parent_id, up_key, sibling_id)
        }
    }

    /// Inserts a separator key and the right child produced by a split
    /// into `parent_id` (spec.md §4.4.4), splitting the parent in turn if
    /// it is now full.
    fn insert_into_parent(&mut self, parent_id: NodeId, up_key: Key, right_child: NodeId) -> Result<()> {
        let mut parent = self.store.load(parent_id)?;
        let outcome = bsearch_counted(self.store, parent.keys(), up_key);
        let k = outcome.index();
        parent.insert_internal_entry(k, up_key, right_child);

        if parent.is_full() {
            self.split_internal_and_propagate(parent)
        } else {
            self.store.store(&parent)?;
            self.store.release(parent);
            Ok(())
        }
    }

    /// Allocates a new root above `left_id`/`right_id`, reparenting both
    /// (spec.md §4.4.3, root-split propagation), and records the new root
    /// id in the header.
    fn promote_new_root(&mut self, left_id: NodeId, up_key: Key, right_id: NodeId) -> Result<()> {
        let mut new_root = self.store.allocate();
        let new_root_id = new_root.id;
        *new_root = Node::new_internal(new_root_id, NULL_NODE);
        new_root.set_child_id(0, left_id);
        new_root.insert_internal_entry(0, up_key, right_id);
        self.store.store(&new_root)?;
        self.store.release(new_root);

        let mut left = self.store.load(left_id)?;
        left.parent_id = new_root_id;
        self.store.store(&left)?;
        self.store.release(left);

        let mut right = self.store.load(right_id)?;
        right.parent_id = new_root_id;
        self.store.store(&right)?;
        self.store.release(right);

        self.store.set_root_node_id(new_root_id);
        Ok(())
    }

    /// The whole-tree correctness audit (spec.md §4.4.6): every internal
    /// separator key correctly partitions its two neighboring subtrees,
    /// and every leaf's keys are strictly ascending. Panics via
    /// `debug_assert!` on violation; compiled out in release builds.
    pub fn check_invariants(&mut self, root_id: NodeId) -> Result<()> {
        self.check_node(root_id)
    }

    fn check_node(&mut self, node_id: NodeId) -> Result<()> {
        let node = self.store.load(node_id)?;
        let is_leaf = node.is_leaf;
        let num_keys = node.num_keys as usize;
        let keys: Vec<Key> = node.keys().to_vec();
        let children: Vec<NodeId> =
            if is_leaf { Vec::new() } else { (0..=num_keys).map(|i| node.child_id(i)).collect() };
        self.store.release(node);

        for pair in keys.windows(2) {
            debug_assert!(pair[0] < pair[1], "keys not strictly ascending in node {}", node_id);
        }

        if !is_leaf {
            for i in 0..num_keys {
                let max_left = self.max_key(children[i])?;
                debug_assert!(
                    max_left < keys[i],
                    "node {}: max key under children[{}] ({}) is not < keys[{}] ({})",
                    node_id, i, max_left, i, keys[i]
                );
            }
            if num_keys > 0 {
                let max_right = self.max_key(children[num_keys])?;
                debug_assert!(
                    max_right >= keys[num_keys - 1],
                    "node {}: max key under children[{}] ({}) is not >= keys[{}] ({})",
                    node_id, num_keys, max_right, num_keys - 1, keys[num_keys - 1]
                );
            }
            for &child in &children {
                self.check_node(child)?;
            }
        }
        Ok(())
    }

    /// The largest key in `subtree`'s rightmost descendant leaf.
    fn max_key(&mut self, subtree: NodeId) -> Result<Key> {
        let node = self.store.load(subtree)?;
        if node.is_leaf {
            let key = node.keys()[node.num_keys as usize - 1];
            self.store.release(node);
            Ok(key)
        } else {
            let last_child = node.child_id(node.num_keys as usize);
            self.store.release(node);
            self.max_key(last_child)
        }
    }
}
