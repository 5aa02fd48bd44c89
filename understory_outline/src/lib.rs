// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_outline --heading-base-level=0

//! Understory Outline: a headless outline tree with drag-and-drop reordering.
//!
//! Understory Outline is the model behind a sidebar, source list, or file
//! tree: it owns the hierarchy, decides which drops are legal, applies them,
//! and remembers the order the user chose across restarts.
//!
//! - [`ItemTree`] is an arena of nodes addressed by generational [`NodeId`]s.
//!   Each node has a [`NodeKind`] that fixes some of its [`Capabilities`].
//! - [`DragSession`] tracks one drag gesture: what was grabbed, in visual
//!   order, and whether a proposed drop is allowed.
//! - [`reorder::commit`] applies a drop to the tree and to the
//!   [`OrderLedger`], and returns a plan of single-row moves a widget can
//!   replay one at a time.
//! - [`Outline`] ties these together behind the callbacks a widget makes, and
//!   talks back to the widget through the [`OutlineHost`] trait.
//!
//! ## Not a widget
//!
//! This crate does not render, lay out, or animate anything, and it does not
//! receive platform events. A host widget reports what it sees (rows,
//! expansion, selection, proposed drop positions) and applies what it is told
//! (row moves, reloads, expansion and selection changes).
//! [`MirrorHost`] is a headless stand-in for such a widget, used in tests and
//! demos.
//!
//! ## Persisted order
//!
//! Child order is recorded by *order key*, a stable string chosen by the
//! application, in an [`OrderLedger`] from `understory_outline_order`. The
//! ledger is loaded when an [`Outline`] is created, applied to the tree, and
//! saved after every accepted drop.
//!
//! ## Example
//!
//! ```rust
//! use understory_outline::{DragOperation, DropIndex, Item, ItemTree, MirrorHost, Outline};
//! use understory_outline_order::MemoryStore;
//!
//! let mut tree = ItemTree::new();
//! let root = tree.root();
//! let item = tree.insert(root, Item::leaf("item").title("Item"));
//! let folder = tree.insert(root, Item::folder("folder").title("Folder"));
//!
//! let mut outline = Outline::new(tree, MemoryStore::new());
//! let mut host = MirrorHost::new(outline.tree());
//!
//! // Drag the item into the folder.
//! outline.drag_start(&[item], &host);
//! assert_eq!(outline.validate_drop(Some(folder), DropIndex::At(0)), DragOperation::Move);
//! assert!(outline.accept_drop(Some(folder), DropIndex::At(0), &mut host));
//! outline.drag_ended(DragOperation::Move);
//!
//! assert_eq!(outline.tree().parent_of(item), Some(folder));
//! assert_eq!(outline.ledger().ordered_list("folder").unwrap(), ["item"]);
//! ```
//!
//! ## Features
//!
//! - `std` (default): enables `std` support in dependencies, including the
//!   file-backed store of `understory_outline_order`.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod drag;
mod host;
mod mirror;
mod order;
mod outline;
pub mod reorder;
mod tree;
mod types;

pub use drag::{
    Destination, DragEntry, DragOperation, DragPhase, DragSession, DragSnapshot, DropIndex,
    DropRejection, ItemState,
};
pub use host::OutlineHost;
pub use mirror::{HostCall, MirrorHost};
pub use outline::{Outline, OutlineConfig};
pub use reorder::{InsertionAnchor, MoveStep, ReorderOutcome};
pub use tree::ItemTree;
pub use types::{Capabilities, ColumnItem, Item, NodeId, NodeKind, Row};

pub use understory_outline_order::{OrderLedger, ROOT_ORDER_KEY};
