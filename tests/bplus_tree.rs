use std::collections::BTreeMap;

use btree_index::{BPlusTree, FnComparator, IndexError, InvariantViolation, Order, RangeOp, SnapshotNode, TreeSnapshot};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn tree_of_order<V>(order: usize) -> BPlusTree<i64, V> {
    BPlusTree::with_order(Order::new(order).unwrap())
}

fn keys<V, C>(tree: &BPlusTree<i64, V, C>) -> Vec<i64> {
    tree.in_order().map(|(k, _)| *k).collect()
}

fn assert_valid<K: Clone, V, C: btree_index::KeyComparator<K>>(tree: &BPlusTree<K, V, C>, context: &str) {
    if let Err(violation) = tree.check_invariants() {
        panic!("{context}: {violation}");
    }
}

// ─── Scenarios ──────────────────────────────────────────────────────────────

#[test]
fn small_tree_drains_to_empty() {
    init_logging();
    let mut tree = tree_of_order(5);
    tree.insert(1, 1);
    tree.insert(2, 2);
    assert_eq!(tree.height(), 1);
    assert_eq!(tree.len(), 2);

    assert!(tree.delete(&1));
    assert_eq!(tree.len(), 1);
    assert!(tree.find(&1).is_empty());
    assert_eq!(tree.find(&2), &[2]);

    assert!(tree.delete(&2));
    assert!(tree.is_empty());
    assert!(!tree.delete(&3));
    assert_valid(&tree, "after draining");
}

fn alphabet_deletions(mut tree: BPlusTree<i64, char>) {
    for (k, letter) in (1..=26).zip('a'..='z') {
        tree.insert(k, letter);
    }
    assert_valid(&tree, "after 26 inserts");

    let mut remaining: Vec<i64> = (1..=26).collect();
    for letter in ['t', 'c', 'j', 'd', 'u', 'r', 'k', 'm', 'n'] {
        let key = i64::from(u8::try_from(letter).unwrap() - b'a' + 1);
        assert!(tree.delete(&key), "delete({letter})");
        remaining.retain(|&k| k != key);

        assert!(tree.find(&key).is_empty(), "{letter} still present");
        for &k in &remaining {
            let expected = char::from(b'a' + u8::try_from(k - 1).unwrap());
            assert_eq!(tree.find(&k), &[expected], "lost {k} after deleting {letter}");
        }
        assert_eq!(keys(&tree), remaining);
        assert_valid(&tree, &format!("after deleting {letter}"));
    }
}

#[test]
fn alphabet_deletions_with_default_order() {
    init_logging();
    alphabet_deletions(BPlusTree::new());
}

#[test]
fn alphabet_deletions_with_small_orders() {
    init_logging();
    for order in 3..=6 {
        alphabet_deletions(tree_of_order(order));
    }
}

#[test]
fn ascending_drain_empties_the_tree() {
    init_logging();
    for order in [3, 4, 5, 64] {
        let mut tree = tree_of_order(order);
        for k in 1..=26 {
            tree.insert(k, k * 10);
        }
        for k in 1..=26 {
            assert!(tree.delete(&k));
            assert_valid(&tree, &format!("order {order}, after deleting {k}"));
        }
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 0);
        for k in 1..=26 {
            assert!(tree.find(&k).is_empty());
        }
    }
}

#[test]
fn duplicates_come_back_in_insertion_order() {
    let mut tree = tree_of_order(3);
    for round in 0..5 {
        for k in 0..20 {
            tree.insert(k, round * 100 + k);
        }
    }
    assert_eq!(tree.len(), 20);
    assert_eq!(tree.value_count(), 100);
    assert_eq!(tree.find(&7), &[7, 107, 207, 307, 407]);

    let removed = tree.remove(&7).unwrap();
    assert_eq!(removed.as_slice(), &[7, 107, 207, 307, 407]);
    assert!(tree.find(&7).is_empty());
    assert_eq!(tree.value_count(), 95);
    assert_valid(&tree, "after removing duplicates");
}

#[test]
fn deleting_an_absent_key_leaves_the_structure_alone() {
    let mut tree = tree_of_order(4);
    for k in (0..60).step_by(3) {
        tree.insert(k, k);
    }
    let before = tree.snapshot();
    assert!(!tree.delete(&31));
    assert!(!tree.delete(&-1));
    assert!(!tree.delete(&1000));
    assert_eq!(tree.snapshot(), before);
}

#[test]
fn empty_tree_answers_every_query() {
    let mut tree: BPlusTree<i64, i64> = BPlusTree::new();
    assert!(tree.find(&1).is_empty());
    assert!(!tree.delete(&1));
    for op in RangeOp::ALL {
        assert!(tree.find_range(op, &1).is_empty(), "{op}");
    }
    assert!(tree.in_order().next().is_none());
    assert!(tree.first_key().is_none());
    assert!(tree.last_key().is_none());
    assert_eq!(tree.check_invariants(), Ok(()));
}

#[test]
fn custom_comparator_orders_everything() {
    let by_length = FnComparator::new(|a: &String, b: &String| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    let mut tree = BPlusTree::with_order_and_comparator(Order::new(3).unwrap(), by_length);
    for word in ["pear", "fig", "banana", "kiwi", "apple", "date", "plum", "cherry"] {
        tree.insert(word.to_owned(), word.len());
    }
    let words: Vec<&str> = tree.in_order().map(|(k, _)| k.as_str()).collect();
    assert_eq!(words, ["fig", "date", "kiwi", "pear", "plum", "apple", "banana", "cherry"]);

    let shorter: Vec<usize> = tree.find_less_than(&"kiwi".to_owned()).into_iter().copied().collect();
    assert_eq!(shorter, [3, 4]);
    assert!(tree.delete(&"kiwi".to_owned()));
    assert_valid(&tree, "after deleting kiwi");
}

#[test]
fn range_operators_parse_from_sql() {
    let tree: BPlusTree<i64, i64> = (0..10).map(|k| (k, k)).collect();
    let run = |op: &str| -> Vec<i64> {
        let op: RangeOp = op.parse().unwrap();
        tree.find_range(op, &5).into_iter().copied().collect()
    };
    assert_eq!(run("="), [5]);
    assert_eq!(run("<>"), [0, 1, 2, 3, 4, 6, 7, 8, 9]);
    assert_eq!(run("<"), [0, 1, 2, 3, 4]);
    assert_eq!(run("<="), [0, 1, 2, 3, 4, 5]);
    assert_eq!(run(">"), [6, 7, 8, 9]);
    assert_eq!(run(">="), [5, 6, 7, 8, 9]);
    assert!("~".parse::<RangeOp>().is_err());
}

// ─── Snapshots ──────────────────────────────────────────────────────────────

#[test]
fn snapshot_survives_json() {
    init_logging();
    let mut tree = tree_of_order(4);
    for k in 0..200 {
        tree.insert(k % 70, k);
    }
    for k in (0..70).step_by(4) {
        tree.delete(&k);
    }

    let json = serde_json::to_string(&tree.snapshot()).unwrap();
    let snapshot: TreeSnapshot<i64, i64> = serde_json::from_str(&json).unwrap();
    let restored = BPlusTree::from_snapshot(snapshot).unwrap();

    assert_eq!(restored.height(), tree.height());
    assert_eq!(restored.len(), tree.len());
    assert_eq!(restored.value_count(), tree.value_count());
    assert_eq!(keys(&restored), keys(&tree));
    assert_eq!(restored.find(&5), &[5, 75, 145]);
    assert_eq!(restored.snapshot(), tree.snapshot());
}

#[test]
fn restored_tree_keeps_working() {
    let tree: BPlusTree<i64, i64> = (0..100).map(|k| (k, k)).collect();
    let mut restored = BPlusTree::from_snapshot(tree.snapshot()).unwrap();
    for k in 0..100 {
        if k % 3 == 0 {
            assert!(restored.delete(&k));
        } else {
            restored.insert(k, -k);
        }
    }
    assert_valid(&restored, "after edits");
    assert_eq!(restored.len(), 66);
    assert_eq!(restored.find(&4), &[4, -4]);
}

#[test]
fn malformed_snapshots_are_rejected() {
    let orphan = TreeSnapshot::<i64, i64> {
        order: 4,
        root: Some(0),
        first_leaf: Some(0),
        nodes: vec![
            SnapshotNode::Leaf { entries: vec![(1, vec![1])] },
            SnapshotNode::Leaf { entries: vec![(2, vec![2])] },
        ],
    };
    assert!(matches!(BPlusTree::from_snapshot(orphan), Err(IndexError::MalformedSnapshot { .. })));

    let out_of_range = TreeSnapshot::<i64, i64> {
        order: 4,
        root: Some(0),
        first_leaf: Some(1),
        nodes: vec![SnapshotNode::Inner { keys: vec![5], children: vec![1, 9] }],
    };
    assert!(matches!(BPlusTree::from_snapshot(out_of_range), Err(IndexError::MalformedSnapshot { .. })));

    let unsorted = TreeSnapshot::<i64, i64> {
        order: 4,
        root: Some(0),
        first_leaf: Some(0),
        nodes: vec![SnapshotNode::Leaf { entries: vec![(2, vec![2]), (1, vec![1])] }],
    };
    assert_eq!(
        BPlusTree::from_snapshot(unsorted).err(),
        Some(IndexError::Invariant(InvariantViolation::Unsorted { node: 0, index: 1 }))
    );

    let too_small = TreeSnapshot::<i64, i64> {
        order: 1,
        root: None,
        first_leaf: None,
        nodes: Vec::new(),
    };
    assert_eq!(
        BPlusTree::from_snapshot(too_small).err(),
        Some(IndexError::InvalidOrder { order: 1, min: Order::MIN })
    );
}

// ─── Randomized ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum IndexOp {
    Insert(i64, i64),
    Delete(i64),
}

fn index_op_strategy() -> impl Strategy<Value = IndexOp> {
    prop_oneof![
        5 => (-200i64..200, any::<i64>()).prop_map(|(k, v)| IndexOp::Insert(k, v)),
        3 => (-200i64..200).prop_map(IndexOp::Delete),
    ]
}

fn model_range(model: &BTreeMap<i64, Vec<i64>>, op: RangeOp, probe: i64) -> Vec<i64> {
    model
        .iter()
        .filter(|(k, _)| op.matches(k.cmp(&&probe)))
        .flat_map(|(_, values)| values.iter().copied())
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Replays random inserts and deletes on the index and on a `BTreeMap` of value lists.
    #[test]
    fn operations_match_a_model(
        order in 3usize..10,
        ops in prop::collection::vec(index_op_strategy(), 0..1_500),
    ) {
        let mut tree = tree_of_order(order);
        let mut model: BTreeMap<i64, Vec<i64>> = BTreeMap::new();

        for op in ops {
            match op {
                IndexOp::Insert(k, v) => {
                    tree.insert(k, v);
                    model.entry(k).or_default().push(v);
                }
                IndexOp::Delete(k) => {
                    prop_assert_eq!(tree.delete(&k), model.remove(&k).is_some());
                    prop_assert!(tree.find(&k).is_empty());
                }
            }
            if let Err(violation) = tree.check_invariants() {
                return Err(TestCaseError::fail(format!("{violation}")));
            }
        }

        prop_assert_eq!(tree.len(), model.len());
        prop_assert_eq!(tree.value_count(), model.values().map(Vec::len).sum::<usize>());
        prop_assert_eq!(keys(&tree), model.keys().copied().collect::<Vec<_>>());
        prop_assert_eq!(tree.first_key(), model.keys().next());
        prop_assert_eq!(tree.last_key(), model.keys().next_back());
        for (k, values) in &model {
            prop_assert_eq!(tree.find(k), values.as_slice());
        }
    }

    /// Every range operator returns what a filtered scan of the model returns, and the strict
    /// operators plus the exact match give the inclusive ones.
    #[test]
    fn range_operators_match_a_model(
        order in 3usize..8,
        entries in prop::collection::vec((-50i64..50, any::<i64>()), 0..300),
        probe in -60i64..60,
    ) {
        let mut tree = tree_of_order(order);
        let mut model: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
        for (k, v) in entries {
            tree.insert(k, v);
            model.entry(k).or_default().push(v);
        }

        for op in RangeOp::ALL {
            let found: Vec<i64> = tree.find_range(op, &probe).into_iter().copied().collect();
            prop_assert_eq!(found, model_range(&model, op, probe), "{}", op);
        }

        let exact = tree.find(&probe);
        let mut greater_or_equal: Vec<&i64> = exact.iter().collect();
        greater_or_equal.extend(tree.find_greater_than(&probe));
        prop_assert_eq!(greater_or_equal, tree.find_greater_equal(&probe));

        let mut less_or_equal = tree.find_less_than(&probe);
        less_or_equal.extend(exact.iter());
        prop_assert_eq!(less_or_equal, tree.find_less_equal(&probe));
    }

    #[test]
    fn snapshot_restores_an_identical_tree(
        order in 3usize..8,
        entries in prop::collection::vec((0i64..500, any::<i64>()), 0..400),
    ) {
        let mut tree = tree_of_order(order);
        for (k, v) in entries {
            tree.insert(k, v);
        }
        let snapshot = tree.snapshot();
        let restored = BPlusTree::from_snapshot(snapshot.clone());
        prop_assert!(restored.is_ok(), "{:?}", restored.err());
        if let Ok(restored) = restored {
            prop_assert_eq!(restored.snapshot(), snapshot);
        }
    }
}
