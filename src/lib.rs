//! A duplicate-aware B+Tree index for an embedded relational store.
//!
//! [`BPlusTree`] maps ordered keys to one or more opaque values. It backs both primary key
//! indexes and secondary attribute indexes: a key inserted twice keeps both values, in insertion
//! order, in one [`ValueList`].
//!
//! - Point lookup with [`find`](BPlusTree::find)
//! - The relational operators `=`, `!=`, `<`, `<=`, `>` and `>=` through
//!   [`find_range`](BPlusTree::find_range) and [`RangeOp`]
//! - Ascending traversal with [`in_order`](BPlusTree::in_order)
//! - Insertion and deletion with full rebalancing
//!
//! # Example
//!
//! ```
//! use btree_index::{BPlusTree, RangeOp};
//!
//! let mut index = BPlusTree::try_with_order(4).unwrap();
//! for (row, city) in ["Oslo", "Lima", "Oslo", "Kyiv"].into_iter().enumerate() {
//!     index.insert(city, row);
//! }
//!
//! assert_eq!(index.find(&"Oslo"), &[0, 2]);
//! assert_eq!(index.find_range(RangeOp::Lt, &"Oslo"), [&3, &1]);
//! assert_eq!(index.len(), 3);
//! assert_eq!(index.value_count(), 4);
//! ```
//!
//! # Implementation
//!
//! Nodes live in an arena and refer to each other by index. Every node knows its parent and its
//! left and right neighbour on the same level; leaves additionally hold all entries, so scans
//! walk the leaf chain without touching inner nodes. Inner-node separators are always the exact
//! smallest key of the subtree to their right.
//!
//! The tree is a plain single-threaded data structure. Callers serialize access themselves.
//! Persistence works through [`TreeSnapshot`]; the crate performs no I/O.

#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod raw;

pub mod bplus_tree;
pub mod compare;
pub mod error;
pub mod order;
pub mod snapshot;
pub mod value_list;

pub use bplus_tree::{BPlusTree, InOrder, ParseRangeOpError, RangeOp};
pub use compare::{FnComparator, KeyComparator, NaturalOrder};
pub use error::{IndexError, InvariantViolation};
pub use order::Order;
pub use snapshot::{SnapshotNode, TreeSnapshot};
pub use value_list::ValueList;
