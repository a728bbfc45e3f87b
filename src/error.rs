//! Error types for the index.
//!
//! Looking up or deleting a key that is not there is not an error: those calls return `None`,
//! `false` or an empty slice. The types here cover construction and snapshot restore, plus the
//! report produced by [`BPlusTree::check_invariants`](crate::BPlusTree::check_invariants).

use alloc::string::String;

use thiserror::Error;

/// Errors returned by fallible index constructors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("order must be at least {min}, got {order}")]
    InvalidOrder { order: usize, min: usize },

    #[error("malformed snapshot: {reason}")]
    MalformedSnapshot { reason: String },

    #[error("snapshot violates tree invariants: {0}")]
    Invariant(#[from] InvariantViolation),
}

/// A broken structural invariant, located by the arena slot of the offending node.
///
/// Every public operation leaves the tree free of these; the running tree treats one as a bug and
/// panics. They surface as values only from
/// [`check_invariants`](crate::BPlusTree::check_invariants) and snapshot restore.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("empty tree still references nodes (root: {root:?}, first leaf: {first_leaf:?})")]
    DanglingEmptyTree { root: Option<usize>, first_leaf: Option<usize> },

    #[error("node {node} holds {count} {unit}, allowed range is {min}..={max}")]
    Occupancy { node: usize, count: usize, unit: &'static str, min: usize, max: usize },

    #[error("entry {index} of leaf {node} stores no values")]
    EmptyValueList { node: usize, index: usize },

    #[error("inner node {node} has {children} children for {keys} keys")]
    Degree { node: usize, keys: usize, children: usize },

    #[error("keys of node {node} are not strictly ascending at position {index}")]
    Unsorted { node: usize, index: usize },

    #[error("separator {index} of inner node {node} is not the smallest key of the subtree to its right")]
    StaleSeparator { node: usize, index: usize },

    #[error("node {node} holds a key outside the range routed to it by its parent")]
    OutOfRange { node: usize },

    #[error("leaf {node} sits at depth {depth}, expected {expected}")]
    UnevenDepth { node: usize, depth: usize, expected: usize },

    #[error("node {node} does not point back to its parent")]
    ParentLink { node: usize },

    #[error("sibling links of node {node} are inconsistent")]
    SiblingLink { node: usize },

    #[error("first leaf is {found:?}, expected {expected}")]
    FirstLeaf { found: Option<usize>, expected: usize },

    #[error("tree records {recorded} keys but its leaves hold {found}")]
    Length { recorded: usize, found: usize },

    #[error("tree records {recorded} values but its leaves hold {found}")]
    ValueCount { recorded: usize, found: usize },
}
