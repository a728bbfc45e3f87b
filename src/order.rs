use core::fmt;

use crate::error::IndexError;

/// The branching factor of a [`BPlusTree`](crate::BPlusTree).
///
/// An order of `m` lets an inner node hold up to `m` children and a leaf hold up to `m - 1`
/// entries. Every node other than the root keeps at least half of that, rounded up.
///
/// # Examples
///
/// ```
/// use btree_index::Order;
///
/// let order = Order::new(5).unwrap();
/// assert_eq!(order.max_entries(), 4);
/// assert_eq!(order.min_entries(), 2);
/// assert!(Order::new(2).is_err());
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Order(usize);

impl Order {
    /// The smallest order a tree can be built with.
    pub const MIN: usize = 3;

    #[cfg(test)]
    pub const DEFAULT: Self = Self(4);
    #[cfg(not(test))]
    pub const DEFAULT: Self = Self(64);

    /// Validates `order`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidOrder`] if `order` is smaller than [`Order::MIN`].
    pub fn new(order: usize) -> Result<Self, IndexError> {
        if order < Self::MIN {
            return Err(IndexError::InvalidOrder { order, min: Self::MIN });
        }
        Ok(Self(order))
    }

    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }

    #[must_use]
    pub const fn max_children(self) -> usize {
        self.0
    }

    #[must_use]
    pub const fn min_children(self) -> usize {
        self.0.div_ceil(2)
    }

    #[must_use]
    pub const fn max_entries(self) -> usize {
        self.0 - 1
    }

    #[must_use]
    pub const fn min_entries(self) -> usize {
        self.0.div_ceil(2) - 1
    }

    /// Number of entries an overflowing leaf keeps on the left when it splits.
    pub(crate) const fn leaf_split_point(self) -> usize {
        (self.0 + 1).div_ceil(2) - 1
    }

    /// Index of the key an overflowing inner node promotes when it splits.
    pub(crate) const fn inner_split_point(self) -> usize {
        (self.0 + 1).div_ceil(2) - 1
    }
}

impl Default for Order {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<usize> for Order {
    type Error = IndexError;

    fn try_from(order: usize) -> Result<Self, Self::Error> {
        Self::new(order)
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
