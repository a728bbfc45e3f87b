use alloc::vec::Vec;
use core::cmp::Ordering;

use super::handle::Handle;
use crate::compare::KeyComparator;
use crate::order::Order;
use crate::value_list::ValueList;

/// A tree node: navigation links shared by both kinds, plus the kind-specific payload.
///
/// `parent`, `left` and `right` never own anything. A node is owned by the slot its parent's
/// child array names (or by the tree, for the root); the links are cleared whenever a node is
/// detached.
pub(crate) struct Node<K, V> {
    parent: Option<Handle>,
    left: Option<Handle>,
    right: Option<Handle>,
    body: Body<K, V>,
}

pub(crate) enum Body<K, V> {
    Inner(InnerNode<K>),
    Leaf(LeafNode<K, V>),
}

// B+Tree: inner nodes route by separator keys. keys[i] is the smallest key below children[i + 1],
// and every key below children[i] is smaller than keys[i].
pub(crate) struct InnerNode<K> {
    keys: Vec<K>,
    children: Vec<Handle>,
}

// B+Tree: leaves hold one entry per distinct key; duplicates accumulate in the `ValueList`.
pub(crate) struct LeafNode<K, V> {
    keys: Vec<K>,
    values: Vec<ValueList<V>>,
}

/// Result of searching for a key in a leaf.
pub(crate) enum SearchResult {
    /// Key was found at the given index.
    Found(usize),
    /// Key was not found; index is where it would be inserted.
    NotFound(usize),
}

#[inline]
fn search_keys<K, C: KeyComparator<K>>(keys: &[K], key: &K, cmp: &C) -> SearchResult {
    match keys.binary_search_by(|probe| cmp.compare(probe, key)) {
        Ok(idx) => SearchResult::Found(idx),
        Err(idx) => SearchResult::NotFound(idx),
    }
}

impl<K, V> Node<K, V> {
    pub(crate) fn from_leaf(leaf: LeafNode<K, V>) -> Self {
        Self {
            parent: None,
            left: None,
            right: None,
            body: Body::Leaf(leaf),
        }
    }

    pub(crate) fn from_inner(inner: InnerNode<K>) -> Self {
        Self {
            parent: None,
            left: None,
            right: None,
            body: Body::Inner(inner),
        }
    }

    pub(crate) fn body(&self) -> &Body<K, V> {
        &self.body
    }

    pub(crate) fn parent(&self) -> Option<Handle> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<Handle>) {
        self.parent = parent;
    }

    pub(crate) fn left(&self) -> Option<Handle> {
        self.left
    }

    pub(crate) fn set_left(&mut self, left: Option<Handle>) {
        self.left = left;
    }

    pub(crate) fn right(&self) -> Option<Handle> {
        self.right
    }

    pub(crate) fn set_right(&mut self, right: Option<Handle>) {
        self.right = right;
    }

    /// Drops every navigation link. Called on nodes leaving their position in the structure.
    pub(crate) fn detach(&mut self) {
        self.parent = None;
        self.left = None;
        self.right = None;
    }

    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self.body, Body::Leaf(_))
    }

    /// Returns the leaf node, panicking if this is not a leaf.
    pub(crate) fn as_leaf(&self) -> &LeafNode<K, V> {
        match &self.body {
            Body::Leaf(leaf) => leaf,
            Body::Inner(_) => panic!("expected leaf node"),
        }
    }

    /// Returns the leaf node mutably, panicking if this is not a leaf.
    pub(crate) fn as_leaf_mut(&mut self) -> &mut LeafNode<K, V> {
        match &mut self.body {
            Body::Leaf(leaf) => leaf,
            Body::Inner(_) => panic!("expected leaf node"),
        }
    }

    /// Returns the inner node, panicking if this is a leaf.
    pub(crate) fn as_inner(&self) -> &InnerNode<K> {
        match &self.body {
            Body::Inner(inner) => inner,
            Body::Leaf(_) => panic!("expected inner node"),
        }
    }

    /// Returns the inner node mutably, panicking if this is a leaf.
    pub(crate) fn as_inner_mut(&mut self) -> &mut InnerNode<K> {
        match &mut self.body {
            Body::Inner(inner) => inner,
            Body::Leaf(_) => panic!("expected inner node"),
        }
    }

    pub(crate) fn into_leaf(self) -> LeafNode<K, V> {
        match self.body {
            Body::Leaf(leaf) => leaf,
            Body::Inner(_) => panic!("expected leaf node"),
        }
    }

    pub(crate) fn into_inner(self) -> InnerNode<K> {
        match self.body {
            Body::Inner(inner) => inner,
            Body::Leaf(_) => panic!("expected inner node"),
        }
    }

    pub(crate) fn is_underfull(&self, order: Order) -> bool {
        match &self.body {
            Body::Inner(inner) => inner.is_underfull(order),
            Body::Leaf(leaf) => leaf.is_underfull(order),
        }
    }

    pub(crate) fn can_give_to_sibling(&self, order: Order) -> bool {
        match &self.body {
            Body::Inner(inner) => inner.can_give_to_sibling(order),
            Body::Leaf(leaf) => leaf.can_give_to_sibling(order),
        }
    }

    pub(crate) fn can_be_merged(&self, order: Order) -> bool {
        match &self.body {
            Body::Inner(inner) => inner.can_be_merged(order),
            Body::Leaf(leaf) => leaf.can_be_merged(order),
        }
    }
}

impl<K> InnerNode<K> {
    /// Creates an inner node routing everything to `first_child`. Callers add at least one
    /// separator before the node becomes reachable.
    pub(crate) fn new(first_child: Handle) -> Self {
        let mut children = Vec::new();
        children.push(first_child);
        Self {
            keys: Vec::new(),
            children,
        }
    }

    pub(crate) fn from_parts(keys: Vec<K>, children: Vec<Handle>) -> Self {
        Self { keys, children }
    }

    pub(crate) fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn child_count(&self) -> usize {
        self.children.len()
    }

    pub(crate) fn keys(&self) -> &[K] {
        &self.keys
    }

    pub(crate) fn children(&self) -> &[Handle] {
        &self.children
    }

    #[inline]
    pub(crate) fn key(&self, index: usize) -> &K {
        &self.keys[index]
    }

    #[inline]
    pub(crate) fn child(&self, index: usize) -> Handle {
        self.children[index]
    }

    pub(crate) fn first_child(&self) -> Handle {
        self.children[0]
    }

    pub(crate) fn set_key(&mut self, index: usize, key: K) {
        self.keys[index] = key;
    }

    /// Overwrites the separator at `index`, returning the old one.
    pub(crate) fn replace_key(&mut self, index: usize, key: K) -> K {
        core::mem::replace(&mut self.keys[index], key)
    }

    pub(crate) fn is_over_full(&self, order: Order) -> bool {
        self.children.len() == order.max_children() + 1
    }

    pub(crate) fn is_underfull(&self, order: Order) -> bool {
        self.children.len() < order.min_children()
    }

    pub(crate) fn can_give_to_sibling(&self, order: Order) -> bool {
        self.children.len() > order.min_children()
    }

    pub(crate) fn can_be_merged(&self, order: Order) -> bool {
        self.children.len() == order.min_children()
    }

    /// Index of the child whose subtree may hold `key`: the first child `i` with
    /// `key < keys[i]`, or the last child.
    #[inline]
    pub(crate) fn route<C: KeyComparator<K>>(&self, key: &K, cmp: &C) -> usize {
        self.keys.partition_point(|probe| cmp.compare(probe, key) != Ordering::Greater)
    }

    /// Position of `key` among this node's separators.
    pub(crate) fn find_key<C: KeyComparator<K>>(&self, key: &K, cmp: &C) -> Option<usize> {
        match search_keys(&self.keys, key, cmp) {
            SearchResult::Found(idx) => Some(idx),
            SearchResult::NotFound(_) => None,
        }
    }

    /// Position of `child` in the child array.
    pub(crate) fn index_of(&self, child: Handle) -> Option<usize> {
        self.children.iter().position(|&c| c == child)
    }

    /// Inserts a separator in sorted position and returns that position.
    ///
    /// The node may become over-full by one child once the matching child is inserted; the caller
    /// must split it before the operation completes.
    pub(crate) fn add_key<C: KeyComparator<K>>(&mut self, key: K, order: Order, cmp: &C) -> usize {
        assert!(
            self.children.len() <= order.max_children(),
            "`InnerNode::add_key()` - node is already over-full"
        );
        let idx = match search_keys(&self.keys, &key, cmp) {
            SearchResult::NotFound(idx) => idx,
            SearchResult::Found(_) => panic!("`InnerNode::add_key()` - separator already present"),
        };
        self.keys.insert(idx, key);
        idx
    }

    /// Shifts children right from `index` and places `child` there.
    pub(crate) fn insert_child_at(&mut self, index: usize, child: Handle) {
        assert!(
            self.children.len() == self.keys.len(),
            "`InnerNode::insert_child_at()` - a separator must be added before its child"
        );
        self.children.insert(index, child);
    }

    /// Splits an over-full node. Keeps `keys[..mid]` and `children[..=mid]`, returns
    /// the promoted `keys[mid]` plus the right half as the content of a new sibling.
    pub(crate) fn split_at(&mut self, mid: usize) -> (K, InnerNode<K>) {
        let right = InnerNode {
            keys: self.keys.split_off(mid + 1),
            children: self.children.split_off(mid + 1),
        };
        let promoted = match self.keys.pop() {
            Some(key) => key,
            None => unreachable!("`InnerNode::split_at()` - `mid` is a valid key index"),
        };
        (promoted, right)
    }

    /// Removes the separator at `key_index` and the child to its right.
    pub(crate) fn remove_separator(&mut self, key_index: usize) -> (K, Handle) {
        let key = self.keys.remove(key_index);
        let child = self.children.remove(key_index + 1);
        (key, child)
    }

    /// Removes the last separator and the last child.
    pub(crate) fn pop_back(&mut self) -> (K, Handle) {
        match (self.keys.pop(), self.children.pop()) {
            (Some(key), Some(child)) => (key, child),
            _ => panic!("`InnerNode::pop_back()` - node has no separator to give"),
        }
    }

    /// Removes the first separator and the first child.
    pub(crate) fn pop_front(&mut self) -> (K, Handle) {
        assert!(!self.keys.is_empty(), "`InnerNode::pop_front()` - node has no separator to give");
        (self.keys.remove(0), self.children.remove(0))
    }

    /// Places `child` first; `key` becomes the separator between it and the old first child.
    pub(crate) fn push_front(&mut self, key: K, child: Handle) {
        self.keys.insert(0, key);
        self.children.insert(0, child);
    }

    /// Places `child` last, after separator `key`.
    pub(crate) fn push_back(&mut self, key: K, child: Handle) {
        self.keys.push(key);
        self.children.push(child);
    }

    /// Absorbs the right sibling `other`; `separator` is the parent key that sat between them.
    pub(crate) fn merge_from(&mut self, separator: K, mut other: InnerNode<K>) {
        self.keys.push(separator);
        self.keys.append(&mut other.keys);
        self.children.append(&mut other.children);
    }

    /// Consumes a node left with a single child and returns that child.
    pub(crate) fn into_only_child(self) -> Handle {
        assert!(
            self.keys.is_empty() && self.children.len() == 1,
            "`InnerNode::into_only_child()` - node still routes between children"
        );
        self.children[0]
    }
}

impl<K, V> LeafNode<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            keys: Vec::new(),
            values: Vec::new(),
        }
    }

    pub(crate) fn from_parts(keys: Vec<K>, values: Vec<ValueList<V>>) -> Self {
        debug_assert_eq!(keys.len(), values.len());
        Self { keys, values }
    }

    pub(crate) fn len(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub(crate) fn keys(&self) -> &[K] {
        &self.keys
    }

    pub(crate) fn values(&self) -> &[ValueList<V>] {
        &self.values
    }

    #[inline]
    pub(crate) fn key(&self, index: usize) -> &K {
        &self.keys[index]
    }

    #[inline]
    pub(crate) fn value(&self, index: usize) -> &ValueList<V> {
        &self.values[index]
    }

    pub(crate) fn first_key(&self) -> Option<&K> {
        self.keys.first()
    }

    pub(crate) fn last_key(&self) -> Option<&K> {
        self.keys.last()
    }

    pub(crate) fn is_full(&self, order: Order) -> bool {
        self.keys.len() == order.max_entries()
    }

    pub(crate) fn is_underfull(&self, order: Order) -> bool {
        self.keys.len() < order.min_entries()
    }

    pub(crate) fn can_give_to_sibling(&self, order: Order) -> bool {
        self.keys.len() > order.min_entries()
    }

    pub(crate) fn can_be_merged(&self, order: Order) -> bool {
        self.keys.len() == order.min_entries()
    }

    #[inline]
    pub(crate) fn search<C: KeyComparator<K>>(&self, key: &K, cmp: &C) -> SearchResult {
        search_keys(&self.keys, key, cmp)
    }

    pub(crate) fn find<C: KeyComparator<K>>(&self, key: &K, cmp: &C) -> Option<&ValueList<V>> {
        match self.search(key, cmp) {
            SearchResult::Found(idx) => Some(&self.values[idx]),
            SearchResult::NotFound(_) => None,
        }
    }

    /// Appends `value` to the list of an existing `key`, or inserts a new sorted entry.
    /// Returns true if a new entry was created.
    ///
    /// A new entry requires spare capacity: a full leaf must go through
    /// [`insert_and_split`](Self::insert_and_split).
    pub(crate) fn upsert<C: KeyComparator<K>>(&mut self, key: K, value: V, order: Order, cmp: &C) -> bool {
        match self.search(&key, cmp) {
            SearchResult::Found(idx) => {
                self.values[idx].insert_duplicate(value);
                false
            }
            SearchResult::NotFound(idx) => {
                assert!(!self.is_full(order), "`LeafNode::upsert()` - leaf is full, split it first");
                self.keys.insert(idx, key);
                self.values.insert(idx, ValueList::new(value));
                true
            }
        }
    }

    /// Inserts a new entry at `index` into a full leaf and splits the temporarily oversized
    /// leaf at the split point. Returns the right half.
    pub(crate) fn insert_and_split(&mut self, index: usize, key: K, value: V, order: Order) -> LeafNode<K, V> {
        assert!(self.is_full(order), "`LeafNode::insert_and_split()` - leaf still has room");
        self.keys.insert(index, key);
        self.values.insert(index, ValueList::new(value));
        self.split_at(order.leaf_split_point())
    }

    /// Keeps `[0, mid)` and returns `[mid, len)` as the content of a new right sibling.
    pub(crate) fn split_at(&mut self, mid: usize) -> LeafNode<K, V> {
        LeafNode {
            keys: self.keys.split_off(mid),
            values: self.values.split_off(mid),
        }
    }

    /// Removes the entry for `key` together with every duplicate stored under it.
    pub(crate) fn delete_by_key<C: KeyComparator<K>>(&mut self, key: &K, cmp: &C) -> Option<ValueList<V>> {
        match self.search(key, cmp) {
            SearchResult::Found(idx) => {
                self.keys.remove(idx);
                Some(self.values.remove(idx))
            }
            SearchResult::NotFound(_) => None,
        }
    }

    pub(crate) fn pop_back(&mut self) -> (K, ValueList<V>) {
        match (self.keys.pop(), self.values.pop()) {
            (Some(key), Some(values)) => (key, values),
            _ => panic!("`LeafNode::pop_back()` - leaf is empty"),
        }
    }

    pub(crate) fn pop_front(&mut self) -> (K, ValueList<V>) {
        assert!(!self.keys.is_empty(), "`LeafNode::pop_front()` - leaf is empty");
        (self.keys.remove(0), self.values.remove(0))
    }

    pub(crate) fn push_front(&mut self, key: K, values: ValueList<V>) {
        self.keys.insert(0, key);
        self.values.insert(0, values);
    }

    pub(crate) fn push_back(&mut self, key: K, values: ValueList<V>) {
        self.keys.push(key);
        self.values.push(values);
    }

    /// Absorbs the entries of an adjacent leaf, keeping the entries sorted. `other` must lie
    /// entirely before or entirely after this leaf.
    pub(crate) fn merge_from<C: KeyComparator<K>>(&mut self, mut other: LeafNode<K, V>, cmp: &C) {
        let other_first = match other.keys.first() {
            Some(key) => key,
            None => return,
        };
        let goes_before = match self.keys.first() {
            Some(first) => cmp.compare(other_first, first) == Ordering::Less,
            None => false,
        };

        if goes_before {
            debug_assert!(other.keys.last().zip(self.keys.first()).is_none_or(|(l, f)| cmp.compare(l, f).is_lt()));
            other.keys.append(&mut self.keys);
            other.values.append(&mut self.values);
            self.keys = other.keys;
            self.values = other.values;
        } else {
            debug_assert!(self.keys.last().is_none_or(|l| cmp.compare(l, other_first).is_lt()));
            self.keys.append(&mut other.keys);
            self.values.append(&mut other.values);
        }
    }
}
