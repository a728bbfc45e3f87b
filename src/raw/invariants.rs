use alloc::vec::Vec;
use core::cmp::Ordering;

use super::handle::Handle;
use super::node::Body;
use super::raw_tree::RawBPlusTree;
use crate::compare::KeyComparator;
use crate::error::InvariantViolation;

/// Key range a parent routes to one of its children: `lower <= key < upper`.
struct Bounds<'a, K> {
    lower: Option<&'a K>,
    upper: Option<&'a K>,
}

/// State gathered while walking the tree.
struct Walk {
    /// Nodes of every depth in left-to-right order.
    levels: Vec<Vec<Handle>>,
    leaf_depth: Option<usize>,
    keys: usize,
    values: usize,
}

impl<K: Clone, V, C: KeyComparator<K>> RawBPlusTree<K, V, C> {
    /// Checks every structural invariant and reports the first one found broken.
    pub(crate) fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let Some(root) = self.root else {
            if self.first_leaf.is_some() || self.nodes.len() != 0 {
                return Err(InvariantViolation::DanglingEmptyTree {
                    root: None,
                    first_leaf: self.first_leaf.map(Handle::to_index),
                });
            }
            return self.check_counts(0, 0);
        };

        let root_node = self.nodes.get(root);
        if root_node.parent().is_some() {
            return Err(InvariantViolation::ParentLink { node: root.to_index() });
        }

        let mut walk = Walk {
            levels: Vec::new(),
            leaf_depth: None,
            keys: 0,
            values: 0,
        };
        self.check_node(root, 0, &Bounds { lower: None, upper: None }, &mut walk)?;
        self.check_levels(&walk.levels)?;

        let leftmost = walk.levels.last().and_then(|level| level.first()).copied();
        if let Some(expected) = leftmost.filter(|&leaf| self.first_leaf != Some(leaf)) {
            return Err(InvariantViolation::FirstLeaf {
                found: self.first_leaf.map(Handle::to_index),
                expected: expected.to_index(),
            });
        }

        self.check_counts(walk.keys, walk.values)
    }

    fn check_counts(&self, keys: usize, values: usize) -> Result<(), InvariantViolation> {
        if self.len != keys {
            return Err(InvariantViolation::Length { recorded: self.len, found: keys });
        }
        if self.value_count != values {
            return Err(InvariantViolation::ValueCount {
                recorded: self.value_count,
                found: values,
            });
        }
        Ok(())
    }

    fn check_sorted(&self, handle: Handle, keys: &[K], bounds: &Bounds<'_, K>) -> Result<(), InvariantViolation> {
        let node = handle.to_index();
        for (index, pair) in keys.windows(2).enumerate() {
            if self.cmp.compare(&pair[0], &pair[1]) != Ordering::Less {
                return Err(InvariantViolation::Unsorted { node, index: index + 1 });
            }
        }
        let below_lower = bounds
            .lower
            .zip(keys.first())
            .is_some_and(|(lower, first)| self.cmp.compare(first, lower) == Ordering::Less);
        let above_upper = bounds
            .upper
            .zip(keys.last())
            .is_some_and(|(upper, last)| self.cmp.compare(last, upper) != Ordering::Less);
        if below_lower || above_upper {
            return Err(InvariantViolation::OutOfRange { node });
        }
        Ok(())
    }

    fn check_node(
        &self,
        handle: Handle,
        depth: usize,
        bounds: &Bounds<'_, K>,
        walk: &mut Walk,
    ) -> Result<(), InvariantViolation> {
        if walk.levels.len() == depth {
            walk.levels.push(Vec::new());
        }
        walk.levels[depth].push(handle);

        let is_root = self.root == Some(handle);
        let node = handle.to_index();

        match self.nodes.get(handle).body() {
            Body::Leaf(leaf) => {
                match walk.leaf_depth {
                    None => walk.leaf_depth = Some(depth),
                    Some(expected) if expected != depth => {
                        return Err(InvariantViolation::UnevenDepth { node, depth, expected });
                    }
                    Some(_) => {}
                }

                // The sole leaf may hold as little as one entry.
                let min = if is_root { 1 } else { self.order.min_entries() };
                let max = self.order.max_entries();
                if leaf.len() < min || leaf.len() > max {
                    return Err(InvariantViolation::Occupancy {
                        node,
                        count: leaf.len(),
                        unit: "entries",
                        min,
                        max,
                    });
                }
                if let Some(index) = leaf.values().iter().position(|list| list.is_empty()) {
                    return Err(InvariantViolation::EmptyValueList { node, index });
                }
                self.check_sorted(handle, leaf.keys(), bounds)?;

                walk.keys += leaf.len();
                walk.values += leaf.values().iter().map(|list| list.len()).sum::<usize>();
                Ok(())
            }
            Body::Inner(inner) => {
                if inner.child_count() != inner.key_count() + 1 {
                    return Err(InvariantViolation::Degree {
                        node,
                        keys: inner.key_count(),
                        children: inner.child_count(),
                    });
                }
                let min = if is_root { 2 } else { self.order.min_children() };
                let max = self.order.max_children();
                if inner.child_count() < min || inner.child_count() > max {
                    return Err(InvariantViolation::Occupancy {
                        node,
                        count: inner.child_count(),
                        unit: "children",
                        min,
                        max,
                    });
                }
                self.check_sorted(handle, inner.keys(), bounds)?;

                for (idx, &child) in inner.children().iter().enumerate() {
                    if self.nodes.get(child).parent() != Some(handle) {
                        return Err(InvariantViolation::ParentLink { node: child.to_index() });
                    }
                    let child_bounds = Bounds {
                        lower: if idx == 0 { bounds.lower } else { Some(inner.key(idx - 1)) },
                        upper: if idx < inner.key_count() { Some(inner.key(idx)) } else { bounds.upper },
                    };
                    self.check_node(child, depth + 1, &child_bounds, walk)?;
                }

                for (index, separator) in inner.keys().iter().enumerate() {
                    let smallest = self.min_key(inner.child(index + 1));
                    if self.cmp.compare(separator, smallest) != Ordering::Equal {
                        return Err(InvariantViolation::StaleSeparator { node, index });
                    }
                }
                Ok(())
            }
        }
    }

    /// Same-depth nodes must form a doubly linked chain in left-to-right order.
    fn check_levels(&self, levels: &[Vec<Handle>]) -> Result<(), InvariantViolation> {
        for level in levels {
            for (idx, &handle) in level.iter().enumerate() {
                let node = self.nodes.get(handle);
                let expected_left = idx.checked_sub(1).map(|i| level[i]);
                let expected_right = level.get(idx + 1).copied();
                if node.left() != expected_left || node.right() != expected_right {
                    return Err(InvariantViolation::SiblingLink { node: handle.to_index() });
                }
            }
        }
        Ok(())
    }
}
