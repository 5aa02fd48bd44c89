// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property-based invariant tests for drag-and-drop reordering.
//!
//! Random trees receive random sequences of multi-node drags, spanning
//! several parents and landing at arbitrary gaps. After every drag:
//!
//! 1. The move plan replayed on a [`MirrorHost`] reproduces the tree.
//! 2. Every attached node is listed exactly once, under its own parent.
//! 3. The number of attached nodes is unchanged.
//! 4. The dragged nodes form one block in visual order.
//! 5. The ledger lists equal the tree's child lists, in memory and in the store.
//! 6. Rejected drops leave the tree untouched.
//! 7. Drops onto a dragged node or its descendants are always rejected.
//!
//! Random `append`, `remove`, and `insert_or_move_children` calls on a bare
//! [`ItemTree`] keep the root as the only attached node without a parent, and
//! every parent link matches exactly one child list entry.

use std::collections::{BTreeMap, HashSet};

use proptest::prelude::*;
use proptest::sample::Index;
use understory_outline::{
    DragOperation, DropIndex, Item, ItemTree, MirrorHost, NodeId, NodeKind, Outline,
};
use understory_outline_order::{MemoryStore, OrderLedger};

// ── Helpers ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
struct Drag {
    picks: Vec<Index>,
    target: Option<Index>,
    index: usize,
}

fn shape() -> impl Strategy<Value = Vec<(u8, Index)>> {
    proptest::collection::vec((0_u8..6, any::<Index>()), 1..24)
}

fn drag() -> impl Strategy<Value = Drag> {
    (
        proptest::collection::vec(any::<Index>(), 1..5),
        proptest::option::weighted(0.8, any::<Index>()),
        0_usize..12,
    )
        .prop_map(|(picks, target, index)| Drag {
            picks,
            target,
            index,
        })
}

fn build(shape: &[(u8, Index)]) -> ItemTree {
    let mut tree = ItemTree::new();
    let mut containers = vec![tree.root()];
    for (i, (kind, parent)) in shape.iter().enumerate() {
        let parent = *parent.get(&containers);
        let key = format!("n{i}");
        let item = match kind {
            0..=2 => Item::leaf(key),
            3 | 4 => Item::folder(key),
            _ => Item::separator(key),
        };
        let id = tree.insert(parent, item);
        if tree.kind(id) == Some(NodeKind::Folder) {
            containers.push(id);
        }
    }
    tree
}

/// Attached nodes below the root, depth first.
fn attached(tree: &ItemTree) -> Vec<NodeId> {
    let mut nodes = Vec::new();
    let mut next = tree.next_depth_first(tree.root());
    while let Some(node) = next {
        nodes.push(node);
        next = tree.next_depth_first(node);
    }
    nodes
}

fn structure(tree: &ItemTree) -> Vec<(NodeId, Vec<NodeId>)> {
    std::iter::once(tree.root())
        .chain(attached(tree))
        .map(|node| (node, tree.children_of(node).to_vec()))
        .collect()
}

fn keys(tree: &ItemTree, nodes: &[NodeId]) -> Vec<String> {
    nodes
        .iter()
        .map(|&n| tree.order_key(n).unwrap().to_owned())
        .collect()
}

/// Child keys of every parent, by parent key.
fn orders(tree: &ItemTree) -> BTreeMap<String, Vec<String>> {
    structure(tree)
        .into_iter()
        .map(|(parent, children)| {
            (
                tree.order_key(parent).unwrap().to_owned(),
                keys(tree, &children),
            )
        })
        .collect()
}

fn check_tree(tree: &ItemTree) -> Result<(), TestCaseError> {
    prop_assert_eq!(tree.parent_of(tree.root()), None);
    let mut seen = HashSet::new();
    for (parent, children) in structure(tree) {
        for child in children {
            prop_assert_eq!(tree.parent_of(child), Some(parent), "child lists its parent");
            prop_assert!(seen.insert(child), "{:?} listed twice", child);
            prop_assert!(!tree.is_root(child));
        }
    }
    Ok(())
}

fn check_ledger(tree: &ItemTree, ledger: &OrderLedger) -> Result<(), TestCaseError> {
    for (parent, children) in structure(tree) {
        if children.is_empty() {
            continue;
        }
        let parent_key = tree.order_key(parent).unwrap();
        let expected = keys(tree, &children);
        prop_assert_eq!(
            ledger.ordered_list(parent_key),
            Some(&expected[..]),
            "list of {}",
            parent_key
        );
    }
    for parent_key in ledger.parents() {
        let parent = tree.find_by_order_key(parent_key);
        prop_assert!(parent.is_some(), "ledger names unknown parent {}", parent_key);
        let expected = keys(tree, tree.children_of(parent.unwrap()));
        prop_assert_eq!(ledger.ordered_list(parent_key), Some(&expected[..]));
    }
    Ok(())
}

/// Run one drag end to end. Returns whether the drop was accepted.
fn run(
    outline: &mut Outline<MemoryStore>,
    host: &mut MirrorHost,
    drag: &Drag,
) -> Result<bool, TestCaseError> {
    let nodes = attached(outline.tree());
    let picks: Vec<NodeId> = drag.picks.iter().map(|i| *i.get(&nodes)).collect();
    let target = drag.target.as_ref().map(|i| *i.get(&nodes));
    let before = structure(outline.tree());

    host.expand_all();
    outline.drag_start(&picks, &*host);
    let dragged: Vec<NodeId> = outline
        .session()
        .snapshot()
        .map(|snapshot| snapshot.nodes().collect())
        .unwrap_or_default();

    let op = outline.validate_drop(target, DropIndex::At(drag.index));
    if let Some(target) = target {
        let tree = outline.tree();
        if dragged
            .iter()
            .any(|&node| node == target || tree.contains(node, target))
        {
            prop_assert_eq!(op, DragOperation::Denied, "drop into a dragged subtree");
        }
    }
    if op == DragOperation::Denied {
        outline.drag_ended(DragOperation::Denied);
        prop_assert_eq!(structure(outline.tree()), before);
        return Ok(false);
    }

    prop_assert!(outline.accept_drop(target, DropIndex::At(drag.index), host));
    outline.drag_ended(DragOperation::Move);

    let tree = outline.tree();
    prop_assert!(host.matches(tree), "replayed plan diverged from the tree");
    check_tree(tree)?;
    prop_assert_eq!(attached(tree).len(), nodes.len());

    let parent = target.unwrap_or(tree.root());
    let children = tree.children_of(parent);
    let start = children.iter().position(|&c| c == dragged[0]).unwrap();
    prop_assert_eq!(&children[start..start + dragged.len()], &dragged[..]);

    check_ledger(tree, outline.ledger())?;
    let stored = OrderLedger::load(outline.store());
    prop_assert_eq!(stored.as_ref(), Some(outline.ledger()));

    host.sync(tree);
    Ok(true)
}

// ═════════════════════════════════════════════════════════════════════════
// 1-7. Sequences of multi-node drags across parents
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn drag_sequences_keep_tree_host_and_ledger_in_sync(
        shape in shape(),
        drags in proptest::collection::vec(drag(), 1..6),
    ) {
        let tree = build(&shape);
        let mut outline = Outline::new(tree, MemoryStore::new());
        let mut host = MirrorHost::new(outline.tree());
        check_ledger(outline.tree(), outline.ledger())?;

        for drag in &drags {
            run(&mut outline, &mut host, drag)?;
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// Structural edits on a bare tree
// ═════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
enum Edit {
    Append(Index, Vec<Index>),
    Remove(Index),
    InsertOrMove(Vec<Index>, Option<usize>, Index),
}

fn edit() -> impl Strategy<Value = Edit> {
    let picks = || proptest::collection::vec(any::<Index>(), 0..4);
    prop_oneof![
        (any::<Index>(), picks()).prop_map(|(parent, nodes)| Edit::Append(parent, nodes)),
        any::<Index>().prop_map(Edit::Remove),
        (picks(), proptest::option::of(0_usize..8), any::<Index>())
            .prop_map(|(nodes, to, parent)| Edit::InsertOrMove(nodes, to, parent)),
    ]
}

/// Every parent link is matched by exactly one entry in that parent's list.
fn check_links(tree: &ItemTree, pool: &[NodeId]) -> Result<(), TestCaseError> {
    for &node in pool {
        prop_assert!(tree.is_alive(node));
        if tree.is_attached(node) {
            prop_assert_eq!(tree.is_root(node), tree.parent_of(node).is_none());
        }
        if let Some(parent) = tree.parent_of(node) {
            let listed = tree.children_of(parent).iter().filter(|&&c| c == node).count();
            prop_assert_eq!(listed, 1, "{:?} under {:?}", node, parent);
        }
        for &child in tree.children_of(node) {
            prop_assert_eq!(tree.parent_of(child), Some(node));
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn structural_edits_keep_parent_links_consistent(
        shape in shape(),
        detached in 0_usize..4,
        edits in proptest::collection::vec(edit(), 1..24),
    ) {
        let mut tree = build(&shape);
        let mut pool = vec![tree.root()];
        pool.extend(attached(&tree));
        for i in 0..detached {
            pool.push(tree.create(Item::folder(format!("loose{i}"))));
        }
        let alive = tree.len();

        for edit in &edits {
            let pick = |picks: &[Index]| -> Vec<NodeId> {
                picks.iter().map(|i| *i.get(&pool)).collect()
            };
            match edit {
                Edit::Append(parent, nodes) => {
                    tree.append(*parent.get(&pool), &pick(nodes));
                }
                Edit::Remove(node) => tree.remove(*node.get(&pool)),
                Edit::InsertOrMove(nodes, to, parent) => {
                    tree.insert_or_move_children(&pick(nodes), *to, *parent.get(&pool));
                }
            }
            prop_assert_eq!(tree.parent_of(tree.root()), None);
            check_tree(&tree)?;
            check_links(&tree, &pool)?;
            prop_assert_eq!(tree.len(), alive, "placeholders leaked or nodes freed");
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// Contiguous runs
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn contiguous_run_rejects_inner_gaps_only(
        len in 2_usize..10,
        run_start in 0_usize..10,
        run_len in 2_usize..5,
        gap in 0_usize..12,
    ) {
        let run_start = run_start % len;
        let run_len = run_len.min(len - run_start);
        prop_assume!(run_len >= 2);
        let gap = gap % (len + 1);

        let mut tree = ItemTree::new();
        let root = tree.root();
        let ids: Vec<NodeId> = (0..len)
            .map(|i| tree.insert(root, Item::leaf(format!("n{i}"))))
            .collect();
        let run = &ids[run_start..run_start + run_len];

        let mut outline = Outline::new(tree, MemoryStore::new());
        let mut host = MirrorHost::new(outline.tree());
        outline.drag_start(run, &host);
        let op = outline.validate_drop(None, DropIndex::At(gap));

        let inside = gap > run_start && gap < run_start + run_len;
        if inside {
            prop_assert_eq!(op, DragOperation::Denied);
        } else {
            prop_assert_eq!(op, DragOperation::Move);
            prop_assert!(outline.accept_drop(None, DropIndex::At(gap), &mut host));
            let children = outline.tree().children_of(root);
            let start = children.iter().position(|&c| c == run[0]).unwrap();
            prop_assert_eq!(&children[start..start + run_len], run);
            prop_assert!(host.matches(outline.tree()));
        }
        outline.drag_ended(op);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// Ledger reflection
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn persisted_order_restores_after_restart(
        shape in shape(),
        drags in proptest::collection::vec(drag(), 1..4),
    ) {
        // Sibling reorders only, so a rebuilt tree has the same shape.
        let mut outline = Outline::new(build(&shape), MemoryStore::new());
        let mut host = MirrorHost::new(outline.tree());
        host.expand_all();
        for drag in &drags {
            let nodes = attached(outline.tree());
            let first = *drag.picks[0].get(&nodes);
            let parent = outline.tree().parent_of(first).unwrap();
            let siblings: Vec<NodeId> = drag
                .picks
                .iter()
                .map(|i| *i.get(&nodes))
                .filter(|&n| outline.tree().parent_of(n) == Some(parent))
                .collect();
            let target = (!outline.tree().is_root(parent)).then_some(parent);
            let index = DropIndex::At(drag.index);

            outline.drag_start(&siblings, &host);
            let op = outline.validate_drop(target, index);
            if op == DragOperation::Move {
                prop_assert!(outline.accept_drop(target, index, &mut host));
            }
            outline.drag_ended(op);
        }

        let expected = orders(outline.tree());
        let (_, _, store) = outline.into_parts();
        let restored = Outline::new(build(&shape), store);
        prop_assert_eq!(orders(restored.tree()), expected);
    }
}

proptest! {
    #[test]
    fn ledger_json_round_trips_after_drags(
        shape in shape(),
        drags in proptest::collection::vec(drag(), 1..4),
    ) {
        let mut outline = Outline::new(build(&shape), MemoryStore::new());
        let mut host = MirrorHost::new(outline.tree());
        for drag in &drags {
            run(&mut outline, &mut host, drag)?;
        }
        let json = outline.ledger().to_json().unwrap();
        let parsed = OrderLedger::from_json(&json).unwrap();
        prop_assert_eq!(&parsed, outline.ledger());
    }
}
