use alloc::collections::VecDeque;
use alloc::format;
use alloc::vec;
use alloc::vec::Vec;

use log::debug;

use super::handle::Handle;
use super::node::{Body, InnerNode, LeafNode, Node};
use super::raw_tree::RawBPlusTree;
use crate::compare::KeyComparator;
use crate::error::IndexError;
use crate::order::Order;
use crate::snapshot::{SnapshotNode, TreeSnapshot};
use crate::value_list::ValueList;

fn malformed(reason: impl Into<alloc::string::String>) -> IndexError {
    IndexError::MalformedSnapshot { reason: reason.into() }
}

/// Where a snapshot node sits in the tree being rebuilt.
#[derive(Clone, Copy)]
struct Placement {
    parent: Option<usize>,
    depth: usize,
}

impl<K: Clone, V: Clone, C> RawBPlusTree<K, V, C> {
    /// Numbers nodes breadth-first from the root and copies them out.
    pub(crate) fn snapshot(&self) -> TreeSnapshot<K, V> {
        let mut nodes = Vec::with_capacity(self.nodes.len());
        let mut first_leaf = None;
        let mut queue: VecDeque<Handle> = self.root.into_iter().collect();
        let mut next_index = 1;

        while let Some(handle) = queue.pop_front() {
            match self.nodes.get(handle).body() {
                Body::Inner(inner) => {
                    let children = (next_index..next_index + inner.child_count()).collect();
                    next_index += inner.child_count();
                    queue.extend(inner.children().iter().copied());
                    nodes.push(SnapshotNode::Inner {
                        keys: inner.keys().to_vec(),
                        children,
                    });
                }
                Body::Leaf(leaf) => {
                    if first_leaf.is_none() {
                        first_leaf = Some(nodes.len());
                    }
                    let entries = leaf
                        .keys()
                        .iter()
                        .cloned()
                        .zip(leaf.values().iter().map(|list| list.to_vec()))
                        .collect();
                    nodes.push(SnapshotNode::Leaf { entries });
                }
            }
        }

        TreeSnapshot {
            order: self.order.get(),
            root: self.root.map(|_| 0),
            first_leaf,
            nodes,
        }
    }
}

impl<K: Clone, V, C: KeyComparator<K>> RawBPlusTree<K, V, C> {
    /// Rebuilds a tree from a snapshot, restoring parent and sibling links, then validates it.
    pub(crate) fn restore(snapshot: TreeSnapshot<K, V>, cmp: C) -> Result<Self, IndexError> {
        let order = Order::new(snapshot.order)?;
        let mut tree = Self::new(order, cmp);
        let count = snapshot.nodes.len();

        let Some(root) = snapshot.root else {
            if count != 0 || snapshot.first_leaf.is_some() {
                return Err(malformed("snapshot without a root lists nodes"));
            }
            return Ok(tree);
        };
        if root >= count {
            return Err(malformed(format!("root {root} is out of range for {count} nodes")));
        }
        if let Some(first_leaf) = snapshot.first_leaf.filter(|&leaf| leaf >= count) {
            return Err(malformed(format!("first leaf {first_leaf} is out of range for {count} nodes")));
        }

        // Breadth-first from the root: every node must be reached exactly once.
        let mut placements: Vec<Option<Placement>> = vec![None; count];
        let mut levels: Vec<Vec<usize>> = Vec::new();
        let start = Placement { parent: None, depth: 0 };
        let mut queue = VecDeque::from([(root, start)]);
        placements[root] = Some(start);

        while let Some((index, placement)) = queue.pop_front() {
            if levels.len() == placement.depth {
                levels.push(Vec::new());
            }
            levels[placement.depth].push(index);

            if let SnapshotNode::Inner { children, .. } = &snapshot.nodes[index] {
                for &child in children {
                    if child >= count {
                        return Err(malformed(format!("node {index} names child {child} of {count} nodes")));
                    }
                    if placements[child].is_some() {
                        return Err(malformed(format!("node {child} is reachable more than once")));
                    }
                    let below = Placement {
                        parent: Some(index),
                        depth: placement.depth + 1,
                    };
                    placements[child] = Some(below);
                    queue.push_back((child, below));
                }
            }
        }
        if let Some(orphan) = placements.iter().position(Option::is_none) {
            return Err(malformed(format!("node {orphan} is unreachable from the root")));
        }

        // A fresh arena hands out slots in order, so snapshot index `i` lands in slot `i`.
        for (index, node) in snapshot.nodes.into_iter().enumerate() {
            let node = match node {
                SnapshotNode::Inner { keys, children } => Node::from_inner(InnerNode::from_parts(
                    keys,
                    children.into_iter().map(Handle::from_index).collect(),
                )),
                SnapshotNode::Leaf { entries } => {
                    let mut keys = Vec::with_capacity(entries.len());
                    let mut values = Vec::with_capacity(entries.len());
                    for (key, stored) in entries {
                        tree.value_count += stored.len();
                        let list = ValueList::from_vec(stored)
                            .ok_or_else(|| malformed(format!("leaf {index} has a key without values")))?;
                        keys.push(key);
                        values.push(list);
                    }
                    tree.len += keys.len();
                    Node::from_leaf(LeafNode::from_parts(keys, values))
                }
            };
            let handle = tree.nodes.alloc(node);
            debug_assert_eq!(handle.to_index(), index);
        }

        for (index, placement) in placements.iter().enumerate() {
            if let Some(Placement { parent, .. }) = placement {
                tree.nodes.get_mut(Handle::from_index(index)).set_parent(parent.map(Handle::from_index));
            }
        }
        for level in &levels {
            for pair in level.windows(2) {
                let (left, right) = (Handle::from_index(pair[0]), Handle::from_index(pair[1]));
                tree.nodes.get_mut(left).set_right(Some(right));
                tree.nodes.get_mut(right).set_left(Some(left));
            }
        }

        tree.root = Some(Handle::from_index(root));
        tree.first_leaf = snapshot.first_leaf.map(Handle::from_index);
        tree.check_invariants()?;
        debug!(
            "restored tree of order {order} with {} keys over {} levels",
            tree.len,
            levels.len()
        );
        Ok(tree)
    }
}
