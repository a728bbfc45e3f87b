//! The values stored under one key.

use alloc::vec::Vec;
use core::ops::Deref;
use core::slice;

use smallvec::SmallVec;

/// Every value stored under one key, in insertion order.
///
/// Indexes on non-unique attributes map one key to many rows. A leaf keeps one entry per distinct
/// key and accumulates the duplicates here. Most keys carry a single value, which lives inline.
///
/// ```
/// use btree_index::BPlusTree;
///
/// let mut tree = BPlusTree::new();
/// tree.insert("blue", 4);
/// tree.insert("blue", 9);
///
/// let list = tree.get(&"blue").unwrap();
/// assert_eq!(list.len(), 2);
/// assert_eq!(list.first(), Some(&4));
/// assert_eq!(&list[..], &[4, 9]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ValueList<V> {
    values: SmallVec<[V; 1]>,
}

impl<V> ValueList<V> {
    /// Creates a list holding `value`.
    pub fn new(value: V) -> Self {
        let mut values = SmallVec::new();
        values.push(value);
        Self { values }
    }

    /// Appends `value` after every value already stored. Equal values are kept.
    pub fn insert_duplicate(&mut self, value: V) {
        self.values.push(value);
    }

    #[must_use]
    pub fn as_slice(&self) -> &[V] {
        &self.values
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<V> {
        self.values.into_vec()
    }

    /// Rebuilds a list from stored values. Restores never produce an empty list.
    pub(crate) fn from_vec(values: Vec<V>) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        Some(Self {
            values: SmallVec::from_vec(values),
        })
    }
}

impl<V> Deref for ValueList<V> {
    type Target = [V];

    fn deref(&self) -> &[V] {
        &self.values
    }
}

impl<'a, V> IntoIterator for &'a ValueList<V> {
    type Item = &'a V;
    type IntoIter = slice::Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl<V> IntoIterator for ValueList<V> {
    type Item = V;
    type IntoIter = smallvec::IntoIter<[V; 1]>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}
