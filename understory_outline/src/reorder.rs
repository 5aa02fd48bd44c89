// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Applying a finalized drop to the tree and the order ledger.
//!
//! [`commit`] performs the drop in three layers:
//!
//! - the [`ItemTree`] is rearranged with
//!   [`ItemTree::insert_or_move_children`];
//! - a plan of single-row [`MoveStep`]s is produced for the host widget, which
//!   moves one row at a time and needs every index to be valid at the moment
//!   it is applied;
//! - the [`OrderLedger`] is updated so the new order survives a restart.
//!
//! The plan is computed against a copy of the affected child lists as the
//! host still shows them. The dragged nodes are placed from last to first:
//! the last one goes right after the node that ends up in front of the dragged
//! block, every earlier one right before its successor. Each step records the
//! index the row has when it is picked up and the index it has once set down.

use alloc::string::String;
use alloc::vec::Vec;

use understory_outline_order::OrderLedger;

use crate::drag::DragSnapshot;
use crate::tree::ItemTree;
use crate::types::NodeId;

/// One row move for the host widget.
///
/// Parents are `None` for the root.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MoveStep {
    /// Index of the row among its old siblings when the step is applied.
    pub from_index: usize,
    /// Parent the row is taken from.
    pub from_parent: Option<NodeId>,
    /// Index of the row among its new siblings after the step.
    pub to_index: usize,
    /// Parent the row is placed in.
    pub to_parent: Option<NodeId>,
}

/// Where a drop landed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InsertionAnchor {
    /// New parent of the dragged nodes, `None` for the root.
    pub parent: Option<NodeId>,
    /// Final index of the first dragged node.
    pub index: usize,
}

/// Result of a committed drop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReorderOutcome {
    /// Moves to replay on the host widget, in order.
    pub steps: Vec<MoveStep>,
    /// Where the dragged block now starts.
    pub anchor: InsertionAnchor,
    /// Old parents, other than the new one, that were left without children.
    pub vacated: Vec<NodeId>,
}

/// Apply the drop described by `snapshot`.
///
/// Returns `None` without touching anything when the snapshot has no
/// destination, no attached dragged nodes, a stale destination parent, or a
/// destination inside one of the dragged nodes. The destination index is
/// clamped to the parent's child count.
///
/// When `ledger` is given, the dragged keys are removed from their old
/// parents' lists and moved, in snapshot order, to the matching position in
/// the new parent's list. The caller is responsible for saving it.
pub fn commit(
    tree: &mut ItemTree,
    ledger: Option<&mut OrderLedger>,
    snapshot: &DragSnapshot,
) -> Option<ReorderOutcome> {
    let destination = snapshot.destination()?;
    let parent = destination.parent;
    if !tree.is_alive(parent) {
        return None;
    }
    let dragged: Vec<(NodeId, NodeId)> = snapshot
        .nodes()
        .filter_map(|node| Some((node, tree.parent_of(node)?)))
        .collect();
    if dragged.is_empty() {
        return None;
    }
    let nodes: Vec<NodeId> = dragged.iter().map(|&(node, _)| node).collect();
    if nodes
        .iter()
        .any(|&node| node == parent || tree.contains(node, parent))
    {
        return None;
    }

    // Child lists as the host shows them before the drop.
    let mut shown = ShownLists::default();
    shown.capture(tree, parent);
    for &(_, old_parent) in &dragged {
        shown.capture(tree, old_parent);
    }

    let index = destination.index.min(tree.children_of(parent).len());
    for &(node, old_parent) in &dragged {
        if old_parent != parent {
            tree.remove(node);
        }
    }
    tree.insert_or_move_children(&nodes, Some(index), parent);

    let children = tree.children_of(parent);
    let start = children.iter().position(|&c| c == nodes[0])?;
    let before = start.checked_sub(1).map(|i| children[i]);
    let after = children.get(start + nodes.len()).copied();

    let root = tree.root();
    let normalize = |node: NodeId| (node != root).then_some(node);
    let mut steps = Vec::with_capacity(dragged.len());
    let mut next: Option<NodeId> = None;
    for &(node, old_parent) in dragged.iter().rev() {
        let from_index = shown.take(old_parent, node);
        let list = shown.list_mut(parent);
        let to_index = match (next, before) {
            (Some(next), _) => list.iter().position(|&c| c == next),
            (None, Some(before)) => list.iter().position(|&c| c == before).map(|i| i + 1),
            (None, None) => Some(0),
        }
        .unwrap_or(list.len());
        list.insert(to_index, node);
        if let Some(from_index) = from_index {
            steps.push(MoveStep {
                from_index,
                from_parent: normalize(old_parent),
                to_index,
                to_parent: normalize(parent),
            });
        }
        next = Some(node);
    }

    if let Some(ledger) = ledger {
        record_drop(tree, ledger, parent, &dragged, after);
    }

    let mut vacated: Vec<NodeId> = Vec::new();
    for &(_, old_parent) in &dragged {
        if old_parent != parent
            && tree.children_of(old_parent).is_empty()
            && !vacated.contains(&old_parent)
        {
            vacated.push(old_parent);
        }
    }

    let anchor = InsertionAnchor {
        parent: normalize(parent),
        index: start,
    };
    tracing::debug!(
        moved = nodes.len(),
        ?anchor,
        vacated = vacated.len(),
        "drop committed"
    );
    Some(ReorderOutcome {
        steps,
        anchor,
        vacated,
    })
}

fn record_drop(
    tree: &ItemTree,
    ledger: &mut OrderLedger,
    parent: NodeId,
    dragged: &[(NodeId, NodeId)],
    after: Option<NodeId>,
) {
    let Some(parent_key) = tree.order_key(parent).map(String::from) else {
        return;
    };
    let mut keys: Vec<String> = Vec::with_capacity(dragged.len());
    for &(node, old_parent) in dragged {
        let Some(key) = tree.order_key(node) else {
            continue;
        };
        if old_parent != parent
            && let Some(old_key) = tree.order_key(old_parent)
        {
            ledger.remove(key, old_key);
        }
        keys.push(key.into());
    }

    ledger.register_empty(&parent_key);
    for &child in tree.children_of(parent) {
        if let Some(key) = tree.order_key(child) {
            ledger.add(key, &parent_key);
        }
    }
    match after.and_then(|node| tree.order_key(node)) {
        Some(anchor) => ledger.move_before(&keys, anchor, &parent_key),
        None => {
            let end = ledger.ordered_list(&parent_key).map_or(0, <[String]>::len);
            ledger.move_to(&keys, end, &parent_key);
        }
    }
}

/// Child lists as the host widget currently shows them.
#[derive(Default)]
struct ShownLists {
    lists: Vec<(NodeId, Vec<NodeId>)>,
}

impl ShownLists {
    fn capture(&mut self, tree: &ItemTree, parent: NodeId) {
        if !self.lists.iter().any(|(p, _)| *p == parent) {
            self.lists.push((parent, tree.children_of(parent).to_vec()));
        }
    }

    fn list_mut(&mut self, parent: NodeId) -> &mut Vec<NodeId> {
        let slot = match self.lists.iter().position(|(p, _)| *p == parent) {
            Some(slot) => slot,
            None => {
                self.lists.push((parent, Vec::new()));
                self.lists.len() - 1
            }
        };
        &mut self.lists[slot].1
    }

    /// Remove `node` from `parent`'s list, returning the index it had.
    fn take(&mut self, parent: NodeId, node: NodeId) -> Option<usize> {
        let list = self.list_mut(parent);
        let index = list.iter().position(|&c| c == node)?;
        list.remove(index);
        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use understory_outline_order::ROOT_ORDER_KEY;

    use super::*;
    use crate::drag::{DragEntry, DragSnapshot};
    use crate::types::Item;

    fn snapshot(tree: &ItemTree, nodes: &[NodeId], parent: NodeId, index: usize) -> DragSnapshot {
        let mut snapshot = DragSnapshot::default();
        for &node in nodes {
            snapshot.push_entry(DragEntry {
                node,
                parent: tree.parent_of(node).unwrap(),
                index: tree.index_in_parent(node).unwrap(),
                continuous: false,
            });
        }
        snapshot.set_destination(parent, index);
        snapshot
    }

    /// Replays `steps` on per-parent row lists, the way a widget would.
    fn replay(lists: &mut Vec<(Option<NodeId>, Vec<NodeId>)>, steps: &[MoveStep]) {
        fn list(
            lists: &mut Vec<(Option<NodeId>, Vec<NodeId>)>,
            parent: Option<NodeId>,
        ) -> &mut Vec<NodeId> {
            let slot = lists.iter().position(|(p, _)| *p == parent).unwrap();
            &mut lists[slot].1
        }
        for step in steps {
            let node = list(lists, step.from_parent).remove(step.from_index);
            let target = list(lists, step.to_parent);
            assert!(step.to_index <= target.len(), "{step:?} out of range");
            target.insert(step.to_index, node);
        }
    }

    fn flat(keys: &[&str]) -> (ItemTree, OrderLedger, Vec<NodeId>) {
        let mut tree = ItemTree::new();
        let root = tree.root();
        let ids = keys
            .iter()
            .map(|&key| tree.insert(root, Item::leaf(key)))
            .collect();
        let ledger = tree.build_order();
        (tree, ledger, ids)
    }

    #[test]
    fn single_node_forward() {
        let (mut tree, mut ledger, ids) = flat(&["a", "b", "c"]);
        let [a, b, c] = [ids[0], ids[1], ids[2]];
        let root = tree.root();

        let dropped = snapshot(&tree, &[a], root, 2);
        let outcome = commit(&mut tree, Some(&mut ledger), &dropped).unwrap();
        assert_eq!(tree.children_of(root), &[b, a, c]);
        assert_eq!(
            outcome.steps,
            [MoveStep {
                from_index: 0,
                from_parent: None,
                to_index: 1,
                to_parent: None,
            }]
        );
        assert_eq!(
            outcome.anchor,
            InsertionAnchor {
                parent: None,
                index: 1
            }
        );
        assert_eq!(ledger.ordered_list(ROOT_ORDER_KEY).unwrap(), ["b", "a", "c"]);
    }

    #[test]
    fn scattered_nodes_to_end() {
        let (mut tree, mut ledger, ids) = flat(&["a", "b", "c", "d"]);
        let [a, b, c, d] = [ids[0], ids[1], ids[2], ids[3]];
        let root = tree.root();
        let mut shown = vec![(None, tree.children_of(root).to_vec())];

        let dropped = snapshot(&tree, &[a, c], root, 4);
        let outcome = commit(&mut tree, Some(&mut ledger), &dropped).unwrap();
        assert_eq!(tree.children_of(root), &[b, d, a, c]);
        replay(&mut shown, &outcome.steps);
        assert_eq!(shown[0].1, tree.children_of(root));
        assert_eq!(outcome.anchor.index, 2);
        assert_eq!(
            ledger.ordered_list(ROOT_ORDER_KEY).unwrap(),
            ["b", "d", "a", "c"]
        );
    }

    #[test]
    fn reparent_into_folder() {
        let mut tree = ItemTree::new();
        let root = tree.root();
        let a = tree.insert(root, Item::leaf("a"));
        let folder = tree.insert(root, Item::folder("folder1"));
        let x = tree.insert(folder, Item::leaf("x"));
        let mut ledger = tree.build_order();
        let mut shown = vec![
            (None, tree.children_of(root).to_vec()),
            (Some(folder), tree.children_of(folder).to_vec()),
        ];

        let dropped = snapshot(&tree, &[a], folder, 0);
        let outcome = commit(&mut tree, Some(&mut ledger), &dropped).unwrap();
        assert_eq!(tree.children_of(root), &[folder]);
        assert_eq!(tree.children_of(folder), &[a, x]);
        assert_eq!(tree.parent_of(a), Some(folder));

        replay(&mut shown, &outcome.steps);
        assert_eq!(shown[0].1, [folder]);
        assert_eq!(shown[1].1, [a, x]);

        assert_eq!(
            outcome.anchor,
            InsertionAnchor {
                parent: Some(folder),
                index: 0
            }
        );
        assert!(outcome.vacated.is_empty());
        assert_eq!(ledger.ordered_list(ROOT_ORDER_KEY).unwrap(), ["folder1"]);
        assert_eq!(ledger.ordered_list("folder1").unwrap(), ["a", "x"]);
    }

    #[test]
    fn reparent_reports_vacated_parents() {
        let mut tree = ItemTree::new();
        let root = tree.root();
        let src = tree.insert(root, Item::folder("src"));
        let dst = tree.insert(root, Item::folder("dst"));
        let a = tree.insert(src, Item::leaf("a"));
        let b = tree.insert(root, Item::leaf("b"));
        let mut ledger = tree.build_order();

        let dropped = snapshot(&tree, &[a, b], dst, 0);
        let outcome = commit(&mut tree, Some(&mut ledger), &dropped).unwrap();
        assert_eq!(tree.children_of(dst), &[a, b]);
        assert_eq!(outcome.vacated, [src]);
        assert_eq!(outcome.steps.len(), 2);
        // Empty lists stay registered.
        assert!(ledger.ordered_list("src").unwrap().is_empty());
        assert_eq!(ledger.ordered_list("dst").unwrap(), ["a", "b"]);
        assert_eq!(ledger.ordered_list(ROOT_ORDER_KEY).unwrap(), ["src", "dst"]);
    }

    #[test]
    fn stale_ledger_entries_do_not_shift_the_drop() {
        let (mut tree, mut ledger, ids) = flat(&["a", "b", "c"]);
        let [a, b, c] = [ids[0], ids[1], ids[2]];
        let root = tree.root();
        ledger.insert_at(&["ghost"], 1, ROOT_ORDER_KEY);

        let dropped = snapshot(&tree, &[c], root, 1);
        commit(&mut tree, Some(&mut ledger), &dropped).unwrap();
        assert_eq!(tree.children_of(root), &[a, c, b]);
        assert_eq!(
            ledger.ordered_list(ROOT_ORDER_KEY).unwrap(),
            ["a", "ghost", "c", "b"]
        );
    }

    #[test]
    fn empty_or_unfinalized_snapshot_is_a_no_op() {
        let (mut tree, mut ledger, ids) = flat(&["a", "b"]);
        let root = tree.root();
        let before = ledger.clone();

        let mut unfinalized = snapshot(&tree, &[ids[0]], root, 0);
        unfinalized.clear_destination();
        assert!(commit(&mut tree, Some(&mut ledger), &unfinalized).is_none());

        let empty = snapshot(&tree, &[], root, 0);
        assert!(commit(&mut tree, Some(&mut ledger), &empty).is_none());

        assert_eq!(tree.children_of(root), &ids[..]);
        assert_eq!(ledger, before);
    }

    #[test]
    fn clamps_out_of_range_index() {
        let (mut tree, _, ids) = flat(&["a", "b", "c"]);
        let root = tree.root();
        let dropped = snapshot(&tree, &[ids[0]], root, 99);
        let outcome = commit(&mut tree, None, &dropped).unwrap();
        assert_eq!(tree.children_of(root), &[ids[1], ids[2], ids[0]]);
        assert_eq!(outcome.steps[0].to_index, 2);
    }

    #[test]
    fn nested_parent_and_child_dragged_together() {
        let mut tree = ItemTree::new();
        let root = tree.root();
        let f = tree.insert(root, Item::folder("f"));
        let g = tree.insert(f, Item::folder("g"));
        let x = tree.insert(g, Item::leaf("x"));
        let y = tree.insert(root, Item::leaf("y"));
        let mut shown = vec![
            (None, tree.children_of(root).to_vec()),
            (Some(f), tree.children_of(f).to_vec()),
            (Some(g), tree.children_of(g).to_vec()),
        ];

        // Drop `g` and `x` at the end of the root.
        let dropped = snapshot(&tree, &[g, x], root, 2);
        let outcome = commit(&mut tree, None, &dropped).unwrap();
        assert_eq!(tree.children_of(root), &[f, y, g, x]);
        assert!(tree.children_of(g).is_empty());
        replay(&mut shown, &outcome.steps);
        assert_eq!(shown[0].1, [f, y, g, x]);
        assert!(shown[1].1.is_empty());
        assert!(shown[2].1.is_empty());
        assert_eq!(outcome.vacated, [f, g]);
    }
}
