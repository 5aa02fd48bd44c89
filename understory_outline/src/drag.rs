// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drag session tracking for a single reorder gesture.
//!
//! A [`DragSession`] records what the user grabbed when a drag starts, answers
//! "may these items be dropped here?" while the pointer moves, and hands the
//! finalized [`DragSnapshot`] to [`reorder::commit`](crate::reorder::commit)
//! when the drop is accepted.
//!
//! ## Phases
//!
//! ```text
//! Idle --begin--> Capturing --validate--> Validating --finalize--> Committing
//!   ^                                                                  |
//!   +------------------------------- end ------------------------------+
//! ```
//!
//! `end` returns to `Idle` from any phase. Nothing in the tree changes before
//! the commit, so ending a gesture early (a cancelled drag) needs no undo.
//!
//! ## Drop rules
//!
//! [`DragSession::validate`] rejects a proposed drop when:
//!
//! 1. no gesture is active, or nothing draggable was grabbed;
//! 2. the index is [`DropIndex::OnItem`] (the position is ambiguous);
//! 3. the target is a separator, or a non-root node that is not expandable;
//! 4. the target is a dragged node or lies inside one;
//! 5. the gap sits inside a contiguous dragged run, which would be a no-op.
//!
//! ## Usage
//!
//! ```rust
//! use understory_outline::{
//!     DragOperation, DragSession, DropIndex, DropRejection, Item, ItemState, ItemTree,
//! };
//!
//! let mut tree = ItemTree::new();
//! let root = tree.root();
//! let a = tree.insert(root, Item::leaf("a"));
//! let b = tree.insert(root, Item::leaf("b"));
//! let c = tree.insert(root, Item::leaf("c"));
//!
//! let mut session = DragSession::new();
//! session.begin(&tree, &[c, b], |n| tree.index_in_parent(n), ItemState::unchanged);
//!
//! // Snapshot follows the visual order, not the order items were passed in.
//! let grabbed: Vec<_> = session.snapshot().unwrap().nodes().collect();
//! assert_eq!(grabbed, [b, c]);
//!
//! // Gap 2 lies between `b` and `c`.
//! assert_eq!(
//!     session.validate(&tree, root, DropIndex::At(2)),
//!     Err(DropRejection::InsideContiguousRun)
//! );
//! assert!(session.validate(&tree, root, DropIndex::At(0)).is_ok());
//!
//! session.end(DragOperation::Denied);
//! assert!(session.snapshot().is_none());
//! # let _ = a;
//! ```

use alloc::vec::Vec;

use smallvec::SmallVec;

use crate::tree::ItemTree;
use crate::types::{NodeId, NodeKind};

/// Proposed position for a drop, as reported by the host widget.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DropIndex {
    /// Drop onto the target row itself, with no position among its children.
    OnItem,
    /// Drop into the gap at this index among the target's children.
    At(usize),
}

/// Operation of a drag, as negotiated with the host widget.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DragOperation {
    /// The drop is refused, or the gesture ended without moving anything.
    Denied,
    /// The dragged items are moved.
    Move,
}

/// Why a proposed drop was refused.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DropRejection {
    /// No drag gesture is in progress.
    NoSession,
    /// Nothing draggable was grabbed.
    EmptySnapshot,
    /// The drop has no index among the target's children.
    OnItem,
    /// The target is not a live node.
    StaleTarget,
    /// Separators never hold children.
    Separator,
    /// The target does not accept children.
    NotExpandable,
    /// The target is a dragged node or one of its descendants.
    IntoDraggedSubtree,
    /// The gap lies between members of a contiguous dragged run.
    InsideContiguousRun,
}

/// Where a dragged node sat when the gesture started.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DragEntry {
    /// The dragged node.
    pub node: NodeId,
    /// Its parent before the drag.
    pub parent: NodeId,
    /// Its index among the parent's children before the drag.
    pub index: usize,
    /// Whether it directly follows the previous entry among the same siblings.
    pub continuous: bool,
}

/// Final placement chosen for a drop.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Destination {
    /// New parent of the dragged nodes.
    pub parent: NodeId,
    /// Gap among the new parent's children, as they were before the drop.
    pub index: usize,
}

/// Expansion and selection of a node, captured so it can be restored after
/// the host reloads rows.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ItemState {
    /// The node.
    pub node: NodeId,
    /// Whether the node was expanded.
    pub expanded: bool,
    /// Whether the node was selected.
    pub selected: bool,
}

impl ItemState {
    /// A collapsed, unselected state for `node`.
    pub fn unchanged(node: NodeId) -> Self {
        Self {
            node,
            expanded: false,
            selected: false,
        }
    }
}

/// The dragged nodes of one gesture, in visual order.
#[derive(Clone, Debug, Default)]
pub struct DragSnapshot {
    entries: SmallVec<[DragEntry; 4]>,
    destination: Option<Destination>,
}

impl DragSnapshot {
    /// Entries in visual (top-to-bottom) order.
    pub fn entries(&self) -> &[DragEntry] {
        &self.entries
    }

    /// Dragged nodes in visual order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries.iter().map(|entry| entry.node)
    }

    /// Number of dragged nodes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing was grabbed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry recorded for `node`.
    pub fn entry(&self, node: NodeId) -> Option<&DragEntry> {
        self.entries.iter().find(|entry| entry.node == node)
    }

    /// Returns `true` if `node` is dragged and continues a run.
    pub fn is_continuous(&self, node: NodeId) -> bool {
        self.entry(node).is_some_and(|entry| entry.continuous)
    }

    /// Where the drop lands, once finalized.
    pub fn destination(&self) -> Option<Destination> {
        self.destination
    }

    /// Set the drop destination.
    pub fn set_destination(&mut self, parent: NodeId, index: usize) {
        self.destination = Some(Destination { parent, index });
    }

    #[cfg(test)]
    pub(crate) fn push_entry(&mut self, entry: DragEntry) {
        self.entries.push(entry);
    }

    #[cfg(test)]
    pub(crate) fn clear_destination(&mut self) {
        self.destination = None;
    }

    /// Flag entries that sit right after the previous entry among the same siblings.
    pub fn mark_continuity(&mut self) {
        let mut previous: Option<(NodeId, usize)> = None;
        for entry in &mut self.entries {
            entry.continuous = previous.is_some_and(|(parent, index)| {
                parent == entry.parent && index.abs_diff(entry.index) == 1
            });
            previous = Some((entry.parent, entry.index));
        }
    }
}

/// Phase of the current gesture.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum DragPhase {
    /// No gesture.
    #[default]
    Idle,
    /// Items were grabbed.
    Capturing,
    /// The host is proposing drop targets.
    Validating,
    /// A drop was accepted and is being applied.
    Committing,
}

/// State machine for a single drag gesture.
#[derive(Clone, Debug, Default)]
pub struct DragSession {
    phase: DragPhase,
    snapshot: Option<DragSnapshot>,
    item_states: Vec<ItemState>,
}

impl DragSession {
    /// Create an idle session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    /// The active snapshot, if a gesture is in progress.
    pub fn snapshot(&self) -> Option<&DragSnapshot> {
        self.snapshot.as_ref()
    }

    /// Item states captured so far.
    pub fn item_states(&self) -> &[ItemState] {
        &self.item_states
    }

    /// Start a gesture over `dragged`.
    ///
    /// The root, group sections, stale nodes, and nodes not reachable from
    /// the root are not draggable and are dropped. The rest are sorted by
    /// `row_of` (nodes without a row go last, keeping their given order).
    /// For each dragged node that is expandable and has children, `state_of`
    /// captures its [`ItemState`]. Any previous gesture is discarded.
    pub fn begin<R, S>(&mut self, tree: &ItemTree, dragged: &[NodeId], mut row_of: R, mut state_of: S)
    where
        R: FnMut(NodeId) -> Option<usize>,
        S: FnMut(NodeId) -> ItemState,
    {
        self.item_states.clear();

        let mut grabbed: Vec<(Option<usize>, DragEntry)> = Vec::with_capacity(dragged.len());
        for &node in dragged {
            if !tree.is_attached(node)
                || tree.is_root(node)
                || tree.kind(node) == Some(NodeKind::GroupSection)
                || grabbed.iter().any(|(_, entry)| entry.node == node)
            {
                continue;
            }
            let (Some(parent), Some(index)) = (tree.parent_of(node), tree.index_in_parent(node))
            else {
                continue;
            };
            let entry = DragEntry {
                node,
                parent,
                index,
                continuous: false,
            };
            grabbed.push((row_of(node), entry));
        }
        grabbed.sort_by_key(|&(row, _)| (row.is_none(), row));

        let mut snapshot = DragSnapshot {
            entries: grabbed.into_iter().map(|(_, entry)| entry).collect(),
            destination: None,
        };
        snapshot.mark_continuity();

        for node in snapshot.nodes() {
            if tree.is_expandable(node) && !tree.children_of(node).is_empty() {
                self.item_states.push(state_of(node));
            }
        }

        tracing::debug!(
            requested = dragged.len(),
            dragged = snapshot.len(),
            states = self.item_states.len(),
            "drag started"
        );
        self.snapshot = Some(snapshot);
        self.phase = DragPhase::Capturing;
    }

    /// Check whether the grabbed nodes may be dropped at `index` of `parent`.
    pub fn validate(
        &mut self,
        tree: &ItemTree,
        parent: NodeId,
        index: DropIndex,
    ) -> Result<(), DropRejection> {
        let result = self.check(tree, parent, index);
        if let Err(reason) = result {
            tracing::trace!(?reason, ?parent, ?index, "drop rejected");
        }
        result
    }

    fn check(&mut self, tree: &ItemTree, parent: NodeId, index: DropIndex) -> Result<(), DropRejection> {
        let Some(snapshot) = self.snapshot.as_mut() else {
            return Err(DropRejection::NoSession);
        };
        self.phase = DragPhase::Validating;
        if snapshot.is_empty() {
            return Err(DropRejection::EmptySnapshot);
        }
        let DropIndex::At(index) = index else {
            return Err(DropRejection::OnItem);
        };
        let Some(kind) = tree.kind(parent) else {
            return Err(DropRejection::StaleTarget);
        };
        if kind == NodeKind::Separator {
            return Err(DropRejection::Separator);
        }
        if !tree.is_root(parent) && !tree.is_expandable(parent) {
            return Err(DropRejection::NotExpandable);
        }
        if snapshot
            .nodes()
            .any(|node| node == parent || tree.contains(node, parent))
        {
            return Err(DropRejection::IntoDraggedSubtree);
        }
        snapshot.mark_continuity();
        if let Some(child) = tree.child_at(parent, index)
            && snapshot.is_continuous(child)
        {
            return Err(DropRejection::InsideContiguousRun);
        }
        Ok(())
    }

    /// Record a state to restore once the drop has been applied.
    pub fn push_item_state(&mut self, state: ItemState) {
        self.item_states.push(state);
    }

    /// Take the captured item states, leaving none behind.
    pub fn take_item_states(&mut self) -> Vec<ItemState> {
        core::mem::take(&mut self.item_states)
    }

    /// Fix the drop destination and enter [`DragPhase::Committing`].
    pub fn finalize(&mut self, parent: NodeId, index: usize) -> Option<&DragSnapshot> {
        let snapshot = self.snapshot.as_mut()?;
        snapshot.set_destination(parent, index);
        self.phase = DragPhase::Committing;
        Some(snapshot)
    }

    /// Hand the snapshot over for committing. The gesture stays open until [`DragSession::end`].
    pub fn take_snapshot(&mut self) -> Option<DragSnapshot> {
        self.snapshot.take()
    }

    /// End the gesture and return to [`DragPhase::Idle`].
    ///
    /// Unless `operation` is [`DragOperation::Move`], captured item states are
    /// discarded without being applied.
    pub fn end(&mut self, operation: DragOperation) {
        if operation != DragOperation::Move && !self.item_states.is_empty() {
            tracing::trace!(discarded = self.item_states.len(), "item states dropped");
            self.item_states.clear();
        }
        self.snapshot = None;
        self.phase = DragPhase::Idle;
    }
}
