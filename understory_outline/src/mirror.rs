// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A headless [`OutlineHost`] that keeps its own copy of the rows.

use alloc::vec::Vec;

use hashbrown::{HashMap, HashSet};

use crate::host::OutlineHost;
use crate::reorder::MoveStep;
use crate::tree::ItemTree;
use crate::types::NodeId;

/// A call received by a [`MirrorHost`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostCall {
    /// [`OutlineHost::reload`].
    Reload {
        /// Reloaded item, `None` for everything.
        item: Option<NodeId>,
        /// Whether children were reloaded too.
        reload_children: bool,
    },
    /// [`OutlineHost::move_item`].
    Move(MoveStep),
    /// [`OutlineHost::expand`].
    Expand {
        /// Expanded item.
        item: NodeId,
        /// Whether descendants were expanded too.
        recursive: bool,
    },
    /// [`OutlineHost::collapse`].
    Collapse(NodeId),
    /// [`OutlineHost::select`].
    Select {
        /// Selected items.
        items: Vec<NodeId>,
        /// Whether the previous selection was kept.
        extend: bool,
    },
    /// [`OutlineHost::deselect`].
    Deselect(NodeId),
}

/// Stand-in for an outline widget.
///
/// It holds the child lists it was last synced with, applies every
/// [`MoveStep`] to them literally (one row at a time, like a widget
/// animating a reorder), tracks expansion and selection, and records every
/// call. Reloads are only recorded; call [`MirrorHost::sync`] to re-read the
/// tree the way a widget would after a full reload.
#[derive(Clone, Debug, Default)]
pub struct MirrorHost {
    lists: HashMap<Option<NodeId>, Vec<NodeId>>,
    expanded: HashSet<NodeId>,
    selected: HashSet<NodeId>,
    calls: Vec<HostCall>,
}

impl MirrorHost {
    /// A host showing `tree`, fully collapsed.
    pub fn new(tree: &ItemTree) -> Self {
        let mut host = Self::default();
        host.sync(tree);
        host
    }

    /// Re-read every child list from `tree`.
    pub fn sync(&mut self, tree: &ItemTree) {
        self.lists = lists_of(tree);
    }

    /// Children of `parent` as currently shown.
    pub fn children(&self, parent: Option<NodeId>) -> &[NodeId] {
        self.lists.get(&parent).map_or(&[], Vec::as_slice)
    }

    /// Returns `true` if every shown child list equals the tree's.
    pub fn matches(&self, tree: &ItemTree) -> bool {
        let expected = lists_of(tree);
        let mut shown = self.lists.iter().filter(|(_, list)| !list.is_empty());
        shown.clone().count() == expected.len()
            && shown.all(|(parent, list)| expected.get(parent) == Some(list))
    }

    /// Visible rows, top to bottom.
    pub fn rows(&self) -> Vec<NodeId> {
        let mut rows = Vec::new();
        let mut stack: Vec<NodeId> = self.children(None).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            rows.push(node);
            if self.expanded.contains(&node) {
                stack.extend(self.children(Some(node)).iter().rev());
            }
        }
        rows
    }

    /// Expand every node that has children.
    pub fn expand_all(&mut self) {
        self.expanded
            .extend(self.lists.iter().filter_map(|(parent, list)| {
                if list.is_empty() { None } else { *parent }
            }));
    }

    /// Calls received so far.
    pub fn calls(&self) -> &[HostCall] {
        &self.calls
    }

    /// Take the calls received so far.
    pub fn take_calls(&mut self) -> Vec<HostCall> {
        core::mem::take(&mut self.calls)
    }
}

fn lists_of(tree: &ItemTree) -> HashMap<Option<NodeId>, Vec<NodeId>> {
    let mut lists = HashMap::new();
    let root = tree.root();
    let mut stack = alloc::vec![root];
    while let Some(node) = stack.pop() {
        let children = tree.children_of(node);
        if children.is_empty() {
            continue;
        }
        lists.insert((node != root).then_some(node), children.to_vec());
        stack.extend_from_slice(children);
    }
    lists
}

impl OutlineHost for MirrorHost {
    fn reload(&mut self, item: Option<NodeId>, reload_children: bool) {
        self.calls.push(HostCall::Reload {
            item,
            reload_children,
        });
    }

    fn move_item(&mut self, step: MoveStep) {
        self.calls.push(HostCall::Move(step));
        let from = self.lists.entry(step.from_parent).or_default();
        if step.from_index >= from.len() {
            tracing::warn!(?step, "move from a row that does not exist");
            return;
        }
        let node = from.remove(step.from_index);
        let to = self.lists.entry(step.to_parent).or_default();
        let index = step.to_index.min(to.len());
        to.insert(index, node);
    }

    fn expand(&mut self, item: NodeId, recursive: bool) {
        self.calls.push(HostCall::Expand { item, recursive });
        self.expanded.insert(item);
        if recursive {
            let mut stack: Vec<NodeId> = self.children(Some(item)).to_vec();
            while let Some(node) = stack.pop() {
                let children = self.children(Some(node));
                if !children.is_empty() {
                    stack.extend_from_slice(children);
                    self.expanded.insert(node);
                }
            }
        }
    }

    fn collapse(&mut self, item: NodeId) {
        self.calls.push(HostCall::Collapse(item));
        self.expanded.remove(&item);
    }

    fn select(&mut self, items: &[NodeId], extend: bool) {
        self.calls.push(HostCall::Select {
            items: items.to_vec(),
            extend,
        });
        if !extend {
            self.selected.clear();
        }
        self.selected.extend(items.iter().copied());
    }

    fn deselect(&mut self, item: NodeId) {
        self.calls.push(HostCall::Deselect(item));
        self.selected.remove(&item);
    }

    fn row_for_item(&self, item: NodeId) -> Option<usize> {
        self.rows().iter().position(|&node| node == item)
    }

    fn item_at_row(&self, row: usize) -> Option<NodeId> {
        self.rows().get(row).copied()
    }

    fn is_expanded(&self, item: NodeId) -> bool {
        self.expanded.contains(&item)
    }

    fn is_selected(&self, item: NodeId) -> bool {
        self.selected.contains(&item)
    }
}
