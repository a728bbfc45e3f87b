use core::fmt;
use core::iter::FusedIterator;

use crate::raw::Cursor;
use crate::value_list::ValueList;

/// An iterator over the entries of a [`BPlusTree`](crate::BPlusTree) in ascending key order.
///
/// This `struct` is created by [`BPlusTree::in_order`](crate::BPlusTree::in_order). Each key is
/// yielded once, together with every value stored under it.
pub struct InOrder<'a, K, V> {
    cursor: Cursor<'a, K, V>,
    remaining: usize,
}

impl<'a, K, V> InOrder<'a, K, V> {
    pub(super) fn new(cursor: Cursor<'a, K, V>, len: usize) -> Self {
        Self { cursor, remaining: len }
    }
}

impl<'a, K, V> Iterator for InOrder<'a, K, V> {
    type Item = (&'a K, &'a ValueList<V>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let entry = self.cursor.next()?;
        self.remaining -= 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for InOrder<'_, K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K, V> FusedIterator for InOrder<'_, K, V> {}

impl<K, V> Clone for InOrder<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            cursor: self.cursor.clone(),
            remaining: self.remaining,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for InOrder<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::BPlusTree;
    use crate::order::Order;

    #[test]
    fn size_hint_counts_down() {
        let mut tree = BPlusTree::with_order(Order::new(3).unwrap());
        for k in 0..10 {
            tree.insert(k, k);
            tree.insert(k, k + 100);
        }
        let mut entries = tree.in_order();
        assert_eq!(entries.size_hint(), (10, Some(10)));
        entries.nth(6);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries.count(), 3);
    }

    #[test]
    fn traversals_are_independent() {
        let tree: BPlusTree<i32, i32> = (0..25).map(|k| (k, k)).collect();
        let mut first = tree.in_order();
        first.next();
        let second: Vec<i32> = (&tree).into_iter().map(|(k, _)| *k).collect();
        assert_eq!(second, (0..25).collect::<Vec<_>>());
        assert_eq!(first.next().map(|(k, _)| *k), Some(1));
    }

    #[test]
    fn empty_tree_yields_nothing() {
        let tree: BPlusTree<i32, i32> = BPlusTree::new();
        let mut entries = tree.in_order();
        assert_eq!(entries.len(), 0);
        assert!(entries.next().is_none());
        assert!(entries.next().is_none());
    }
}
