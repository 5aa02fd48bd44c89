// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The host widget seam.

use crate::reorder::MoveStep;
use crate::types::NodeId;

/// Calls an [`Outline`](crate::Outline) makes on the widget that renders it.
///
/// Items are `None` for the root. Rows are indices into the widget's
/// currently visible rows, top to bottom.
pub trait OutlineHost {
    /// Refresh `item` (the whole outline for `None`), optionally with its children.
    fn reload(&mut self, item: Option<NodeId>, reload_children: bool);

    /// Move one row, as described by `step`.
    fn move_item(&mut self, step: MoveStep);

    /// Expand `item`, and its descendants when `recursive`.
    fn expand(&mut self, item: NodeId, recursive: bool);

    /// Collapse `item`.
    fn collapse(&mut self, item: NodeId);

    /// Select `items`, keeping the current selection when `extend`.
    fn select(&mut self, items: &[NodeId], extend: bool);

    /// Deselect `item`.
    fn deselect(&mut self, item: NodeId);

    /// Visible row of `item`, if it is shown.
    fn row_for_item(&self, item: NodeId) -> Option<usize>;

    /// Item shown at `row`.
    fn item_at_row(&self, row: usize) -> Option<NodeId>;

    /// Whether `item` is expanded.
    fn is_expanded(&self, item: NodeId) -> bool;

    /// Whether `item` is selected.
    fn is_selected(&self, item: NodeId) -> bool;
}
