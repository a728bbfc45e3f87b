//! Whole-tree snapshots for the persistence layer.
//!
//! The index never touches storage. A [`TreeSnapshot`] captures exactly the state needed to
//! rebuild an identical tree: the order, the node graph in breadth-first order, and which nodes
//! are the root and the first leaf. Pick any serde format to turn it into bytes.
//!
//! ```
//! use btree_index::BPlusTree;
//!
//! let mut tree = BPlusTree::try_with_order(3).unwrap();
//! for k in 0..20 {
//!     tree.insert(k, k * 10);
//! }
//!
//! let snapshot = tree.snapshot();
//! let restored = BPlusTree::from_snapshot(snapshot).unwrap();
//! assert_eq!(restored.find(&7), &[70]);
//! assert_eq!(restored.height(), tree.height());
//! ```

use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

/// The node graph of a tree, numbered breadth-first from the root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeSnapshot<K, V> {
    pub order: usize,
    /// Index of the root in `nodes`; `None` for an empty tree.
    pub root: Option<usize>,
    /// Index of the leftmost leaf in `nodes`.
    pub first_leaf: Option<usize>,
    pub nodes: Vec<SnapshotNode<K, V>>,
}

/// One node of a [`TreeSnapshot`]. Children are indices into [`TreeSnapshot::nodes`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotNode<K, V> {
    Inner { keys: Vec<K>, children: Vec<usize> },
    Leaf { entries: Vec<(K, Vec<V>)> },
}
