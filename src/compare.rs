//! Key orderings.
//!
//! A tree fixes its ordering when it is built. Every placement, routing and range decision goes
//! through the tree's [`KeyComparator`], so keys never need to implement [`Ord`] themselves.

use core::cmp::Ordering;
use core::fmt;

/// A total order over keys of type `K`.
///
/// It is a logic error for `compare` to be inconsistent between calls for the same pair of keys.
/// The resulting behavior is not specified, but is confined to the tree using the comparator.
pub trait KeyComparator<K: ?Sized> {
    fn compare(&self, a: &K, b: &K) -> Ordering;
}

/// Orders keys by their [`Ord`] implementation.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct NaturalOrder;

impl<K: Ord + ?Sized> KeyComparator<K> for NaturalOrder {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}

/// Orders keys with a closure.
///
/// ```
/// use btree_index::{BPlusTree, FnComparator};
///
/// let mut tree = BPlusTree::with_comparator(FnComparator::new(|a: &i32, b: &i32| b.cmp(a)));
/// tree.insert(1, "one");
/// tree.insert(2, "two");
/// let keys: Vec<_> = tree.in_order().map(|(k, _)| *k).collect();
/// assert_eq!(keys, [2, 1]);
/// ```
#[derive(Clone, Copy)]
pub struct FnComparator<F>(F);

impl<F> FnComparator<F> {
    pub fn new<K: ?Sized>(compare: F) -> Self
    where
        F: Fn(&K, &K) -> Ordering,
    {
        Self(compare)
    }
}

impl<K: ?Sized, F> KeyComparator<K> for FnComparator<F>
where
    F: Fn(&K, &K) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        (self.0)(a, b)
    }
}

impl<F> fmt::Debug for FnComparator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnComparator")
    }
}
