use alloc::vec::Vec;
use core::fmt;

use crate::compare::{KeyComparator, NaturalOrder};
use crate::error::{IndexError, InvariantViolation};
use crate::order::Order;
use crate::raw::RawBPlusTree;
use crate::snapshot::TreeSnapshot;
use crate::value_list::ValueList;

mod iter;
mod range;

pub use iter::InOrder;
pub use range::{ParseRangeOpError, RangeOp};

/// A B+Tree index mapping ordered keys to one or more values.
///
/// Every key maps to a [`ValueList`]: inserting under a key that is already present appends to
/// its list instead of adding a second entry. All entries live in leaves, which are chained left
/// to right, so ordered scans and the relational range operators never revisit inner nodes.
///
/// Keys are ordered by the tree's [`KeyComparator`], chosen at construction. Values are opaque:
/// they are stored and handed back verbatim and never compared.
///
/// It is a logic error for a key to be modified in such a way that its ordering relative to any
/// other key changes while it is in the tree. The behavior resulting from such a logic error is
/// not specified, but is confined to the tree that observed it.
///
/// # Examples
///
/// ```
/// use btree_index::{BPlusTree, RangeOp};
///
/// // Secondary index: age -> row id.
/// let mut by_age = BPlusTree::new();
/// by_age.insert(31, "row-1");
/// by_age.insert(27, "row-2");
/// by_age.insert(31, "row-3");
/// by_age.insert(45, "row-4");
///
/// assert_eq!(by_age.find(&31), &["row-1", "row-3"]);
/// assert!(by_age.find(&50).is_empty());
///
/// let op: RangeOp = ">=".parse().unwrap();
/// assert_eq!(by_age.find_range(op, &31), [&"row-1", &"row-3", &"row-4"]);
///
/// assert!(by_age.delete(&31));
/// assert!(!by_age.delete(&31));
/// assert_eq!(by_age.len(), 2);
/// ```
pub struct BPlusTree<K, V, C = NaturalOrder> {
    raw: RawBPlusTree<K, V, C>,
}

impl<K, V> BPlusTree<K, V> {
    /// Makes a new, empty tree of [`Order::DEFAULT`] ordered by [`Ord`].
    ///
    /// Does not allocate anything on its own.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_order(Order::DEFAULT)
    }

    /// Makes a new, empty tree of the given order.
    #[must_use]
    pub const fn with_order(order: Order) -> Self {
        Self::with_order_and_comparator(order, NaturalOrder)
    }

    /// Makes a new, empty tree after validating `order`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidOrder`] if `order` is below [`Order::MIN`].
    ///
    /// ```
    /// use btree_index::{BPlusTree, IndexError};
    ///
    /// assert!(BPlusTree::<u32, u32>::try_with_order(5).is_ok());
    /// assert_eq!(
    ///     BPlusTree::<u32, u32>::try_with_order(2).err(),
    ///     Some(IndexError::InvalidOrder { order: 2, min: 3 }),
    /// );
    /// ```
    pub fn try_with_order(order: usize) -> Result<Self, IndexError> {
        Ok(Self::with_order(Order::new(order)?))
    }
}

impl<K: Clone + Ord, V> BPlusTree<K, V> {
    /// Rebuilds a tree from a [`TreeSnapshot`].
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidOrder`] for a bad order, [`IndexError::MalformedSnapshot`] if
    /// the node graph is not a tree, and [`IndexError::Invariant`] if it is a tree that breaks a
    /// structural invariant.
    pub fn from_snapshot(snapshot: TreeSnapshot<K, V>) -> Result<Self, IndexError> {
        Self::from_snapshot_with_comparator(snapshot, NaturalOrder)
    }
}

impl<K, V, C> BPlusTree<K, V, C> {
    /// Makes a new, empty tree of [`Order::DEFAULT`] ordered by `cmp`.
    #[must_use]
    pub const fn with_comparator(cmp: C) -> Self {
        Self::with_order_and_comparator(Order::DEFAULT, cmp)
    }

    #[must_use]
    pub const fn with_order_and_comparator(order: Order, cmp: C) -> Self {
        Self {
            raw: RawBPlusTree::new(order, cmp),
        }
    }

    /// Number of distinct keys.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    /// Number of stored values, counting every duplicate.
    #[must_use]
    pub const fn value_count(&self) -> usize {
        self.raw.value_count()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    #[must_use]
    pub const fn order(&self) -> Order {
        self.raw.order()
    }

    #[must_use]
    pub const fn comparator(&self) -> &C {
        self.raw.comparator()
    }

    /// Number of levels from the root down to the leaves. An empty tree has height 0 and a
    /// single-leaf tree height 1.
    #[must_use]
    pub fn height(&self) -> usize {
        self.raw.height()
    }

    /// Removes every entry. The order and comparator are kept.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Visits every entry in ascending key order.
    ///
    /// Each call starts a fresh traversal from the first leaf.
    ///
    /// ```
    /// use btree_index::BPlusTree;
    ///
    /// let tree: BPlusTree<_, _> = [(3, 'c'), (1, 'a'), (2, 'b'), (1, 'A')].into_iter().collect();
    /// let mut entries = tree.in_order();
    /// assert_eq!(entries.len(), 3);
    ///
    /// let (key, values) = entries.next().unwrap();
    /// assert_eq!((*key, values.as_slice()), (1, &['a', 'A'][..]));
    /// assert_eq!(entries.map(|(k, _)| *k).collect::<Vec<_>>(), [2, 3]);
    /// ```
    #[must_use]
    pub fn in_order(&self) -> InOrder<'_, K, V> {
        InOrder::new(self.raw.cursor(), self.raw.len())
    }

    /// Smallest key in the tree.
    #[must_use]
    pub fn first_key(&self) -> Option<&K> {
        let leaf = self.raw.first_leaf()?;
        self.raw.node(leaf).as_leaf().first_key()
    }

    /// Largest key in the tree.
    #[must_use]
    pub fn last_key(&self) -> Option<&K> {
        let leaf = self.raw.last_leaf()?;
        self.raw.node(leaf).as_leaf().last_key()
    }
}

impl<K: Clone, V, C: KeyComparator<K>> BPlusTree<K, V, C> {
    /// Stores `value` under `key`.
    ///
    /// Never fails. Inserting under a key already present appends `value` after the values stored
    /// before it.
    pub fn insert(&mut self, key: K, value: V) {
        self.raw.insert(key, value);
    }

    /// Every value stored under `key`, in insertion order. Empty if `key` is absent.
    #[must_use]
    pub fn find(&self, key: &K) -> &[V] {
        self.raw.get(key).map(ValueList::as_slice).unwrap_or_default()
    }

    #[must_use]
    pub fn get(&self, key: &K) -> Option<&ValueList<V>> {
        self.raw.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.raw.get(key).is_some()
    }

    /// Removes `key` with all of its duplicates and returns them.
    ///
    /// A missing key leaves the tree untouched.
    ///
    /// ```
    /// use btree_index::BPlusTree;
    ///
    /// let mut tree = BPlusTree::new();
    /// tree.insert("k", 1);
    /// tree.insert("k", 2);
    /// assert_eq!(tree.remove(&"k").map(|list| list.into_vec()), Some(vec![1, 2]));
    /// assert!(tree.remove(&"k").is_none());
    /// ```
    pub fn remove(&mut self, key: &K) -> Option<ValueList<V>> {
        self.raw.remove(key)
    }

    /// Removes `key` with all of its duplicates. Returns whether it was present.
    pub fn delete(&mut self, key: &K) -> bool {
        self.remove(key).is_some()
    }

    /// Values of every key in the relation `op` to `key`, in ascending key order.
    #[must_use]
    pub fn find_range(&self, op: RangeOp, key: &K) -> Vec<&V> {
        match op {
            RangeOp::Eq => self.find(key).iter().collect(),
            RangeOp::Ne => self.find_not_equal(key),
            RangeOp::Lt => self.find_less_than(key),
            RangeOp::Le => self.find_less_equal(key),
            RangeOp::Gt => self.find_greater_than(key),
            RangeOp::Ge => self.find_greater_equal(key),
        }
    }

    #[must_use]
    pub fn find_less_than(&self, key: &K) -> Vec<&V> {
        self.raw.less_than(key)
    }

    #[must_use]
    pub fn find_less_equal(&self, key: &K) -> Vec<&V> {
        self.raw.less_equal(key)
    }

    #[must_use]
    pub fn find_greater_than(&self, key: &K) -> Vec<&V> {
        self.raw.greater_than(key)
    }

    #[must_use]
    pub fn find_greater_equal(&self, key: &K) -> Vec<&V> {
        self.raw.greater_equal(key)
    }

    #[must_use]
    pub fn find_not_equal(&self, key: &K) -> Vec<&V> {
        self.raw.not_equal(key)
    }

    /// Walks the whole structure and reports the first broken invariant.
    ///
    /// Every public operation leaves the tree valid, so this only fails for trees assembled
    /// by hand or after a bug.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvariantViolation`] found.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        self.raw.check_invariants()
    }

    /// Rebuilds a tree ordered by `cmp` from a [`TreeSnapshot`].
    ///
    /// `cmp` must order keys the same way as the comparator of the tree the snapshot came from.
    ///
    /// # Errors
    ///
    /// See [`BPlusTree::from_snapshot`].
    pub fn from_snapshot_with_comparator(snapshot: TreeSnapshot<K, V>, cmp: C) -> Result<Self, IndexError> {
        Ok(Self {
            raw: RawBPlusTree::restore(snapshot, cmp)?,
        })
    }
}

impl<K: Clone, V: Clone, C> BPlusTree<K, V, C> {
    /// Captures the order and the full node graph for the persistence layer.
    #[must_use]
    pub fn snapshot(&self) -> TreeSnapshot<K, V> {
        self.raw.snapshot()
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for BPlusTree<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.in_order().map(|(k, values)| (k, values.as_slice())))
            .finish()
    }
}

impl<K, V> Default for BPlusTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + Ord, V> FromIterator<(K, V)> for BPlusTree<K, V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut tree = BPlusTree::new();
        tree.extend(iter);
        tree
    }
}

impl<K: Clone, V, C: KeyComparator<K>> Extend<(K, V)> for BPlusTree<K, V, C> {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a, K, V, C> IntoIterator for &'a BPlusTree<K, V, C> {
    type Item = (&'a K, &'a ValueList<V>);
    type IntoIter = InOrder<'a, K, V>;

    fn into_iter(self) -> InOrder<'a, K, V> {
        self.in_order()
    }
}
