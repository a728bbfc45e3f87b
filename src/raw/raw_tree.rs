use log::{debug, trace};

use super::arena::Arena;
use super::handle::Handle;
use super::node::{Body, InnerNode, LeafNode, Node, SearchResult};
use crate::compare::KeyComparator;
use crate::order::Order;
use crate::value_list::ValueList;

/// The core B+Tree implementation backing `BPlusTree`.
pub(crate) struct RawBPlusTree<K, V, C> {
    /// Arena storing all tree nodes.
    pub(super) nodes: Arena<Node<K, V>>,
    /// Topmost node: the sole leaf of a one-node tree, otherwise an inner node.
    pub(super) root: Option<Handle>,
    /// Leftmost leaf, for ascending scans.
    pub(super) first_leaf: Option<Handle>,
    /// Number of distinct keys.
    pub(super) len: usize,
    /// Number of stored values, duplicates included.
    pub(super) value_count: usize,
    pub(super) order: Order,
    pub(super) cmp: C,
}

impl<K, V, C> RawBPlusTree<K, V, C> {
    /// Creates a new, empty tree.
    pub(crate) const fn new(order: Order, cmp: C) -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
            first_leaf: None,
            len: 0,
            value_count: 0,
            order,
            cmp,
        }
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) const fn value_count(&self) -> usize {
        self.value_count
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub(crate) const fn order(&self) -> Order {
        self.order
    }

    pub(crate) const fn comparator(&self) -> &C {
        &self.cmp
    }

    pub(crate) fn first_leaf(&self) -> Option<Handle> {
        self.first_leaf
    }

    pub(crate) fn node(&self, handle: Handle) -> &Node<K, V> {
        self.nodes.get(handle)
    }

    /// Rightmost leaf, found by descending along last children.
    pub(crate) fn last_leaf(&self) -> Option<Handle> {
        let mut current = self.root?;
        loop {
            match self.nodes.get(current).body() {
                Body::Inner(inner) => current = inner.child(inner.child_count() - 1),
                Body::Leaf(_) => return Some(current),
            }
        }
    }

    /// Number of levels, leaves included. Zero for an empty tree.
    pub(crate) fn height(&self) -> usize {
        let Some(mut current) = self.root else {
            return 0;
        };
        let mut height = 1;
        while let Body::Inner(inner) = self.nodes.get(current).body() {
            current = inner.first_child();
            height += 1;
        }
        height
    }

    /// Drops every node.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.first_leaf = None;
        self.len = 0;
        self.value_count = 0;
    }

    /// Smallest key stored below `handle`: leftmost descent to a leaf, then its first key.
    pub(crate) fn min_key(&self, handle: Handle) -> &K {
        let mut current = handle;
        loop {
            match self.nodes.get(current).body() {
                Body::Inner(inner) => current = inner.first_child(),
                Body::Leaf(leaf) => match leaf.first_key() {
                    Some(key) => return key,
                    None => panic!("leaf {current} below an inner node is empty"),
                },
            }
        }
    }

    fn parent_of(&self, handle: Handle) -> Handle {
        match self.nodes.get(handle).parent() {
            Some(parent) => parent,
            None => panic!("non-root node {handle} has no parent"),
        }
    }

    /// Position of `handle` in its parent, with the neighbours sharing that parent.
    fn siblings_in_parent(&self, parent: Handle, handle: Handle) -> (usize, Option<Handle>, Option<Handle>) {
        let inner = self.nodes.get(parent).as_inner();
        let Some(idx) = inner.index_of(handle) else {
            panic!("node {handle} is missing from the child array of its parent {parent}");
        };
        let left = idx.checked_sub(1).map(|i| inner.child(i));
        let right = (idx + 1 < inner.child_count()).then(|| inner.child(idx + 1));
        debug_assert!(left.is_none() || left == self.nodes.get(handle).left());
        debug_assert!(right.is_none() || right == self.nodes.get(handle).right());
        (idx, left, right)
    }

    /// Points every child of the inner node `parent` back at it.
    fn adopt_children(&mut self, parent: Handle) {
        for idx in 0..self.nodes.get(parent).as_inner().child_count() {
            let child = self.nodes.get(parent).as_inner().child(idx);
            self.nodes.get_mut(child).set_parent(Some(parent));
        }
    }

    /// Links the freshly allocated `right` into the same-depth chain directly after `left`.
    fn link_right_of(&mut self, left: Handle, right: Handle) {
        let old_right = self.nodes.get(left).right();
        let node = self.nodes.get_mut(right);
        node.set_left(Some(left));
        node.set_right(old_right);
        self.nodes.get_mut(left).set_right(Some(right));
        if let Some(old_right) = old_right {
            self.nodes.get_mut(old_right).set_left(Some(right));
        }
    }

    /// Unlinks `removed` from its same-depth chain; `left` was its left neighbour.
    fn unlink_after(&mut self, left: Handle, removed: &Node<K, V>) {
        debug_assert_eq!(removed.left(), Some(left));
        let next = removed.right();
        self.nodes.get_mut(left).set_right(next);
        if let Some(next) = next {
            self.nodes.get_mut(next).set_left(Some(left));
        }
    }
}

impl<K: Clone, V, C: KeyComparator<K>> RawBPlusTree<K, V, C> {
    /// Routes from `start` down to the leaf that owns (or would own) `key`.
    pub(crate) fn descend(&self, start: Handle, key: &K) -> Handle {
        let mut current = start;
        loop {
            match self.nodes.get(current).body() {
                Body::Inner(inner) => current = inner.child(inner.route(key, &self.cmp)),
                Body::Leaf(_) => return current,
            }
        }
    }

    /// Leaf that owns `key`, if the tree has any nodes.
    pub(crate) fn find_leaf(&self, key: &K) -> Option<Handle> {
        self.root.map(|root| self.descend(root, key))
    }

    pub(crate) fn get(&self, key: &K) -> Option<&ValueList<V>> {
        let leaf = self.find_leaf(key)?;
        self.nodes.get(leaf).as_leaf().find(key, &self.cmp)
    }

    /// Inner node holding `key` as a separator, with the separator's position.
    pub(crate) fn find_inner_node(&self, key: &K) -> Option<(Handle, usize)> {
        let mut current = self.root?;
        loop {
            match self.nodes.get(current).body() {
                Body::Leaf(_) => return None,
                Body::Inner(inner) => {
                    if let Some(idx) = inner.find_key(key, &self.cmp) {
                        return Some((current, idx));
                    }
                    current = inner.child(inner.route(key, &self.cmp));
                }
            }
        }
    }

    /// Stores `value` under `key`. Equal keys accumulate their values in insertion order.
    pub(crate) fn insert(&mut self, key: K, value: V) {
        let order = self.order;
        self.value_count += 1;

        let Some(root) = self.root else {
            let mut leaf = LeafNode::new();
            leaf.upsert(key, value, order, &self.cmp);
            let handle = self.nodes.alloc(Node::from_leaf(leaf));
            self.root = Some(handle);
            self.first_leaf = Some(handle);
            self.len = 1;
            debug!("created first leaf {handle}");
            return;
        };

        let leaf_handle = self.descend(root, &key);
        let leaf = self.nodes.get_mut(leaf_handle).as_leaf_mut();
        let split = match leaf.search(&key, &self.cmp) {
            SearchResult::NotFound(idx) if leaf.is_full(order) => {
                self.len += 1;
                Some(leaf.insert_and_split(idx, key, value, order))
            }
            _ => {
                if leaf.upsert(key, value, order, &self.cmp) {
                    self.len += 1;
                }
                None
            }
        };

        if let Some(right) = split {
            self.split_leaf(leaf_handle, right);
        }
    }

    /// Installs `right_half` as the new right sibling of `leaf` and promotes its first key.
    fn split_leaf(&mut self, leaf: Handle, right_half: LeafNode<K, V>) {
        let separator = match right_half.first_key() {
            Some(key) => key.clone(),
            None => panic!("split of leaf {leaf} produced an empty right half"),
        };
        let right = self.nodes.alloc(Node::from_leaf(right_half));
        self.link_right_of(leaf, right);
        trace!(
            "split leaf {leaf} into {leaf} ({} entries) and {right} ({} entries)",
            self.nodes.get(leaf).as_leaf().len(),
            self.nodes.get(right).as_leaf().len()
        );
        self.insert_into_parent(leaf, separator, right);
    }

    /// Adds `separator`/`right` next to `left` in its parent, splitting over-full ancestors on the
    /// way up and growing a new root when the split reaches the top.
    fn insert_into_parent(&mut self, mut left: Handle, mut separator: K, mut right: Handle) {
        let order = self.order;
        loop {
            let Some(parent) = self.nodes.get(left).parent() else {
                let mut root = InnerNode::new(left);
                let pos = root.add_key(separator, order, &self.cmp);
                root.insert_child_at(pos + 1, right);
                let handle = self.nodes.alloc(Node::from_inner(root));
                self.nodes.get_mut(left).set_parent(Some(handle));
                self.nodes.get_mut(right).set_parent(Some(handle));
                self.root = Some(handle);
                debug!("root grew to inner node {handle}, height is now {}", self.height());
                return;
            };

            self.nodes.get_mut(right).set_parent(Some(parent));
            let inner = self.nodes.get_mut(parent).as_inner_mut();
            let pos = inner.add_key(separator, order, &self.cmp);
            inner.insert_child_at(pos + 1, right);
            debug_assert_eq!(inner.child(pos), left);

            if !inner.is_over_full(order) {
                return;
            }

            let (promoted, right_half) = inner.split_at(order.inner_split_point());
            let new_right = self.nodes.alloc(Node::from_inner(right_half));
            self.adopt_children(new_right);
            self.link_right_of(parent, new_right);
            trace!(
                "split inner node {parent} into {parent} ({} children) and {new_right} ({} children)",
                self.nodes.get(parent).as_inner().child_count(),
                self.nodes.get(new_right).as_inner().child_count()
            );

            left = parent;
            separator = promoted;
            right = new_right;
        }
    }

    /// Removes `key` and every value stored under it, then restores the occupancy and separator
    /// invariants.
    pub(crate) fn remove(&mut self, key: &K) -> Option<ValueList<V>> {
        let root = self.root?;
        let leaf = self.descend(root, key);
        let removed = self.nodes.get_mut(leaf).as_leaf_mut().delete_by_key(key, &self.cmp)?;
        self.len -= 1;
        self.value_count -= removed.len();

        if self.root == Some(leaf) {
            if self.nodes.get(leaf).as_leaf().is_empty() {
                self.clear();
                debug!("removed the last key, tree is empty");
            }
            return Some(removed);
        }

        if self.nodes.get(leaf).is_underfull(self.order) {
            self.rebalance_leaf(leaf);
        }
        self.refresh_separator(key);
        Some(removed)
    }

    /// A separator equal to a deleted key no longer names the smallest key on its right.
    /// Replaces it with the successor: the smallest key of the subtree it leads to.
    fn refresh_separator(&mut self, deleted: &K) {
        let Some((inner, idx)) = self.find_inner_node(deleted) else {
            return;
        };
        let right_subtree = self.nodes.get(inner).as_inner().child(idx + 1);
        let successor = self.min_key(right_subtree).clone();
        trace!("replaced stale separator {idx} of inner node {inner} with its successor");
        self.nodes.get_mut(inner).as_inner_mut().set_key(idx, successor);
    }

    /// Repairs an underfull non-root leaf: borrow from the left, borrow from the right, merge
    /// into the left, or absorb the right, in that order.
    fn rebalance_leaf(&mut self, leaf: Handle) {
        let order = self.order;
        let parent = self.parent_of(leaf);
        let (idx, left, right) = self.siblings_in_parent(parent, leaf);

        if let Some(left) = left.filter(|&h| self.nodes.get(h).can_give_to_sibling(order)) {
            let (key, values) = self.nodes.get_mut(left).as_leaf_mut().pop_back();
            self.nodes.get_mut(parent).as_inner_mut().set_key(idx - 1, key.clone());
            self.nodes.get_mut(leaf).as_leaf_mut().push_front(key, values);
            trace!("leaf {leaf} borrowed an entry from its left sibling {left}");
            return;
        }

        if let Some(right) = right.filter(|&h| self.nodes.get(h).can_give_to_sibling(order)) {
            let right_leaf = self.nodes.get_mut(right).as_leaf_mut();
            let (key, values) = right_leaf.pop_front();
            let new_first = match right_leaf.first_key() {
                Some(first) => first.clone(),
                None => panic!("leaf {right} gave away its only entry"),
            };
            self.nodes.get_mut(parent).as_inner_mut().set_key(idx, new_first);
            self.nodes.get_mut(leaf).as_leaf_mut().push_back(key, values);
            trace!("leaf {leaf} borrowed an entry from its right sibling {right}");
            return;
        }

        if let Some(left) = left.filter(|&h| self.nodes.get(h).can_be_merged(order)) {
            self.merge_leaves(left, leaf, parent, idx - 1);
        } else if let Some(right) = right.filter(|&h| self.nodes.get(h).can_be_merged(order)) {
            self.merge_leaves(leaf, right, parent, idx);
        } else {
            panic!("underfull leaf {leaf} has no sibling to borrow from or merge with");
        }
        self.after_delete_fix(parent);
    }

    /// Moves every entry of `right` into `left` and drops `right` with its separator.
    fn merge_leaves(&mut self, left: Handle, right: Handle, parent: Handle, separator_idx: usize) {
        let (_, removed) = self.nodes.get_mut(parent).as_inner_mut().remove_separator(separator_idx);
        assert_eq!(removed, right, "separator {separator_idx} of {parent} does not lead to leaf {right}");

        let right_node = self.nodes.take(right);
        self.unlink_after(left, &right_node);
        let entries = right_node.into_leaf();
        self.nodes.get_mut(left).as_leaf_mut().merge_from(entries, &self.cmp);
        trace!("merged leaf {right} into {left}");
    }

    /// Bottom-up repair of an inner node that lost a child to a merge. Walks towards the root
    /// while merges keep leaving parents underfull, and demotes a root left with one child.
    fn after_delete_fix(&mut self, node: Handle) {
        let order = self.order;
        let mut current = node;
        loop {
            if self.root == Some(current) {
                if self.nodes.get(current).as_inner().key_count() == 0 {
                    self.demote_root(current);
                }
                return;
            }
            if !self.nodes.get(current).is_underfull(order) {
                return;
            }

            let parent = self.parent_of(current);
            let (idx, left, right) = self.siblings_in_parent(parent, current);

            if let Some(left) = left.filter(|&h| self.nodes.get(h).can_give_to_sibling(order)) {
                let (moved_key, moved_child) = self.nodes.get_mut(left).as_inner_mut().pop_back();
                let separator = self.nodes.get_mut(parent).as_inner_mut().replace_key(idx - 1, moved_key);
                self.nodes.get_mut(current).as_inner_mut().push_front(separator, moved_child);
                self.nodes.get_mut(moved_child).set_parent(Some(current));
                trace!("inner node {current} rotated child {moved_child} in from its left sibling {left}");
                return;
            }

            if let Some(right) = right.filter(|&h| self.nodes.get(h).can_give_to_sibling(order)) {
                let (moved_key, moved_child) = self.nodes.get_mut(right).as_inner_mut().pop_front();
                let separator = self.nodes.get_mut(parent).as_inner_mut().replace_key(idx, moved_key);
                self.nodes.get_mut(current).as_inner_mut().push_back(separator, moved_child);
                self.nodes.get_mut(moved_child).set_parent(Some(current));
                trace!("inner node {current} rotated child {moved_child} in from its right sibling {right}");
                return;
            }

            if let Some(left) = left.filter(|&h| self.nodes.get(h).can_be_merged(order)) {
                self.merge_inner_nodes(left, current, parent, idx - 1);
            } else if let Some(right) = right.filter(|&h| self.nodes.get(h).can_be_merged(order)) {
                self.merge_inner_nodes(current, right, parent, idx);
            } else {
                panic!("underfull inner node {current} has no sibling to borrow from or merge with");
            }
            current = parent;
        }
    }

    /// Folds `right` into `left`, pulling their separator down from `parent`.
    fn merge_inner_nodes(&mut self, left: Handle, right: Handle, parent: Handle, separator_idx: usize) {
        let (separator, removed) = self.nodes.get_mut(parent).as_inner_mut().remove_separator(separator_idx);
        assert_eq!(removed, right, "separator {separator_idx} of {parent} does not lead to node {right}");

        let right_node = self.nodes.take(right);
        self.unlink_after(left, &right_node);
        let content = right_node.into_inner();
        self.nodes.get_mut(left).as_inner_mut().merge_from(separator, content);
        self.adopt_children(left);
        trace!("merged inner node {right} into {left}");
    }

    /// Replaces a root that routes to a single child with that child.
    fn demote_root(&mut self, root: Handle) {
        let child = self.nodes.take(root).into_inner().into_only_child();
        let node = self.nodes.get_mut(child);
        debug_assert!(node.left().is_none() && node.right().is_none());
        node.detach();
        self.root = Some(child);

        if node.is_leaf() && node.as_leaf().is_empty() {
            self.clear();
            debug!("root demotion left an empty leaf, tree is empty");
        } else {
            debug!("root demoted to {child}, height is now {}", self.height());
        }
    }
}
