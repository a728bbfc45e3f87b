use alloc::vec::Vec;
use core::cmp::Ordering;
use core::iter::FusedIterator;

use super::arena::Arena;
use super::handle::Handle;
use super::node::Node;
use super::raw_tree::RawBPlusTree;
use crate::compare::KeyComparator;
use crate::value_list::ValueList;

/// Walks leaf entries left to right along the sibling chain, starting at a given position.
pub(crate) struct Cursor<'a, K, V> {
    nodes: &'a Arena<Node<K, V>>,
    leaf: Option<Handle>,
    index: usize,
}

impl<K, V> Clone for Cursor<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes,
            leaf: self.leaf,
            index: self.index,
        }
    }
}

impl<'a, K, V> Iterator for Cursor<'a, K, V> {
    type Item = (&'a K, &'a ValueList<V>);

    fn next(&mut self) -> Option<Self::Item> {
        let nodes: &'a Arena<Node<K, V>> = self.nodes;
        loop {
            let handle = self.leaf?;
            let node = nodes.get(handle);
            let leaf = node.as_leaf();
            if self.index < leaf.len() {
                let idx = self.index;
                self.index += 1;
                return Some((leaf.key(idx), leaf.value(idx)));
            }
            self.leaf = node.right();
            self.index = 0;
        }
    }
}

impl<K, V> FusedIterator for Cursor<'_, K, V> {}

impl<K, V, C> RawBPlusTree<K, V, C> {
    pub(crate) fn cursor_from(&self, leaf: Option<Handle>, index: usize) -> Cursor<'_, K, V> {
        Cursor {
            nodes: &self.nodes,
            leaf,
            index,
        }
    }

    /// Every entry in ascending key order.
    pub(crate) fn cursor(&self) -> Cursor<'_, K, V> {
        self.cursor_from(self.first_leaf, 0)
    }
}

impl<K: Clone, V, C: KeyComparator<K>> RawBPlusTree<K, V, C> {
    /// Values of all keys strictly below `key`, scanning from the first leaf.
    pub(crate) fn less_than(&self, key: &K) -> Vec<&V> {
        self.cursor()
            .take_while(|(k, _)| self.cmp.compare(k, key) == Ordering::Less)
            .flat_map(|(_, values)| values.iter())
            .collect()
    }

    /// Values of all keys strictly above `key`, starting at the leaf that would own `key`.
    pub(crate) fn greater_than(&self, key: &K) -> Vec<&V> {
        let Some(leaf) = self.find_leaf(key) else {
            return Vec::new();
        };
        let start = self
            .node(leaf)
            .as_leaf()
            .keys()
            .partition_point(|probe| self.cmp.compare(probe, key) != Ordering::Greater);
        self.cursor_from(Some(leaf), start)
            .flat_map(|(_, values)| values.iter())
            .collect()
    }

    pub(crate) fn less_equal(&self, key: &K) -> Vec<&V> {
        let mut found = self.less_than(key);
        if let Some(exact) = self.get(key) {
            found.extend(exact.iter());
        }
        found
    }

    pub(crate) fn greater_equal(&self, key: &K) -> Vec<&V> {
        let mut found: Vec<&V> = self.get(key).map(|exact| exact.iter().collect()).unwrap_or_default();
        found.extend(self.greater_than(key));
        found
    }

    /// Values of every key except `key`, from a full left-to-right scan.
    pub(crate) fn not_equal(&self, key: &K) -> Vec<&V> {
        self.cursor()
            .filter(|(k, _)| self.cmp.compare(k, key) != Ordering::Equal)
            .flat_map(|(_, values)| values.iter())
            .collect()
    }
}
