// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The outline controller: data source and drag delegate for a host widget.

use alloc::string::String;
use alloc::vec::Vec;

use understory_outline_order::{KeyValueStore, LEDGER_STORE_KEY, OrderError, OrderLedger};

use crate::drag::{DragOperation, DragSession, DropIndex, ItemState};
use crate::host::OutlineHost;
use crate::reorder::{self, ReorderOutcome};
use crate::tree::ItemTree;
use crate::types::{Item, NodeId, NodeKind};

/// Settings for an [`Outline`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutlineConfig {
    /// Store key the order ledger is read from and written to.
    pub store_key: String,
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            store_key: String::from(LEDGER_STORE_KEY),
        }
    }
}

/// Owns an [`ItemTree`], its [`OrderLedger`], the store the ledger lives in,
/// and the current [`DragSession`].
///
/// The methods mirror the callbacks an outline widget makes on its data
/// source and drag delegate. Items are `None` for the root, as hosts never
/// show the root row.
///
/// On construction the persisted order is loaded and applied to the tree.
/// After every accepted drop the ledger is saved right away; a failed save is
/// logged and otherwise ignored.
///
/// ## Example
///
/// ```rust
/// use understory_outline::{DragOperation, DropIndex, Item, ItemTree, MirrorHost, Outline};
/// use understory_outline_order::MemoryStore;
///
/// let mut tree = ItemTree::new();
/// let root = tree.root();
/// let a = tree.insert(root, Item::leaf("a"));
/// let b = tree.insert(root, Item::leaf("b"));
/// let c = tree.insert(root, Item::leaf("c"));
///
/// let mut outline = Outline::new(tree, MemoryStore::new());
/// let mut host = MirrorHost::new(outline.tree());
///
/// outline.drag_start(&[a], &host);
/// assert_eq!(outline.validate_drop(None, DropIndex::At(2)), DragOperation::Move);
/// assert!(outline.accept_drop(None, DropIndex::At(2), &mut host));
/// outline.drag_ended(DragOperation::Move);
///
/// assert_eq!(outline.tree().children_of(root), &[b, a, c]);
/// assert_eq!(host.children(None), &[b, a, c]);
/// ```
#[derive(Debug)]
pub struct Outline<S> {
    tree: ItemTree,
    ledger: OrderLedger,
    store: S,
    config: OutlineConfig,
    session: DragSession,
}

impl<S: KeyValueStore> Outline<S> {
    /// Create an outline with the default [`OutlineConfig`].
    pub fn new(tree: ItemTree, store: S) -> Self {
        Self::with_config(tree, store, OutlineConfig::default())
    }

    /// Create an outline, restoring the order persisted in `store`.
    ///
    /// A stored ledger is applied to `tree`, then extended with any node it
    /// does not know yet. Without one, the ledger is built from the tree's
    /// current order. Nothing is written until the first accepted drop.
    pub fn with_config(mut tree: ItemTree, store: S, config: OutlineConfig) -> Self {
        let ledger = match OrderLedger::load_from(&store, &config.store_key) {
            Some(mut ledger) => {
                tree.apply_order(&ledger);
                tree.record_order(&mut ledger);
                ledger
            }
            None => tree.build_order(),
        };
        Self {
            tree,
            ledger,
            store,
            config,
            session: DragSession::new(),
        }
    }

    /// The tree.
    pub fn tree(&self) -> &ItemTree {
        &self.tree
    }

    /// The order ledger.
    pub fn ledger(&self) -> &OrderLedger {
        &self.ledger
    }

    /// The store the ledger is saved to.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The configuration.
    pub fn config(&self) -> &OutlineConfig {
        &self.config
    }

    /// The current drag session.
    pub fn session(&self) -> &DragSession {
        &self.session
    }

    /// Take the outline apart.
    pub fn into_parts(self) -> (ItemTree, OrderLedger, S) {
        (self.tree, self.ledger, self.store)
    }

    /// Add `item` under `parent` (the root for `None`) and record its key.
    pub fn insert(&mut self, parent: Option<NodeId>, item: Item) -> NodeId {
        let parent = self.resolve(parent);
        let id = self.tree.insert(parent, item);
        self.tree.record_order(&mut self.ledger);
        id
    }

    /// Write the ledger to the store.
    pub fn save(&mut self) -> Result<(), OrderError> {
        self.ledger.save_to(&mut self.store, &self.config.store_key)
    }

    fn resolve(&self, item: Option<NodeId>) -> NodeId {
        item.unwrap_or(self.tree.root())
    }
}

impl<S: KeyValueStore> Outline<S> {
    // --- data source ---

    /// Number of children of `parent`.
    pub fn child_count(&self, parent: Option<NodeId>) -> usize {
        self.tree.children_of(self.resolve(parent)).len()
    }

    /// Child of `parent` at `index`.
    pub fn child(&self, parent: Option<NodeId>, index: usize) -> Option<NodeId> {
        self.tree.child_at(self.resolve(parent), index)
    }

    /// Whether the widget should offer to expand `item`.
    pub fn is_item_expandable(&self, item: NodeId) -> bool {
        if self.tree.children_of(item).is_empty() {
            self.tree.is_expandable_when_empty(item)
        } else {
            self.tree.is_expandable(item)
        }
    }

    /// Whether `item` is drawn as a group row.
    pub fn is_group_item(&self, item: NodeId) -> bool {
        self.tree.is_group(item)
    }

    /// The subset of proposed selection `rows` whose items are selectable.
    pub fn filter_selection<H: OutlineHost + ?Sized>(&self, rows: &[usize], host: &H) -> Vec<usize> {
        rows.iter()
            .copied()
            .filter(|&row| {
                host.item_at_row(row)
                    .is_some_and(|item| self.tree.is_selectable(item))
            })
            .collect()
    }
}

impl<S: KeyValueStore> Outline<S> {
    // --- drag delegate ---

    /// A drag of `items` started.
    pub fn drag_start<H: OutlineHost + ?Sized>(&mut self, items: &[NodeId], host: &H) {
        self.session.begin(
            &self.tree,
            items,
            |node| host.row_for_item(node),
            |node| ItemState {
                node,
                expanded: host.is_expanded(node),
                selected: host.is_selected(node),
            },
        );
    }

    /// Whether the dragged items may be dropped at `index` of `parent`.
    pub fn validate_drop(&mut self, parent: Option<NodeId>, index: DropIndex) -> DragOperation {
        let target = self.resolve(parent);
        match self.session.validate(&self.tree, target, index) {
            Ok(()) => DragOperation::Move,
            Err(_) => DragOperation::Denied,
        }
    }

    /// Apply a drop at `index` of `parent` and mirror it on `host`.
    ///
    /// [`DropIndex::OnItem`] appends to `parent`. Returns `false` and changes
    /// nothing if the drop is not allowed or no drag is in progress.
    pub fn accept_drop<H: OutlineHost + ?Sized>(
        &mut self,
        parent: Option<NodeId>,
        index: DropIndex,
        host: &mut H,
    ) -> bool {
        let target = self.resolve(parent);
        if self.tree.kind(target) == Some(NodeKind::Separator) {
            return false;
        }
        let index = match index {
            DropIndex::OnItem => self.tree.children_of(target).len(),
            DropIndex::At(index) => index,
        };
        if self
            .session
            .validate(&self.tree, target, DropIndex::At(index))
            .is_err()
        {
            return false;
        }
        self.session.push_item_state(ItemState {
            node: target,
            expanded: true,
            selected: host.is_selected(target),
        });
        if self.session.finalize(target, index).is_none() {
            return false;
        }
        let Some(snapshot) = self.session.take_snapshot() else {
            return false;
        };
        let Some(outcome) = reorder::commit(&mut self.tree, Some(&mut self.ledger), &snapshot)
        else {
            return false;
        };

        self.present(&outcome, host);
        if let Err(error) = self.save() {
            tracing::warn!(%error, key = %self.config.store_key, "failed to save outline order");
        }
        true
    }

    /// The drag gesture ended with `operation`.
    pub fn drag_ended(&mut self, operation: DragOperation) {
        self.session.end(operation);
    }

    fn present<H: OutlineHost + ?Sized>(&mut self, outcome: &ReorderOutcome, host: &mut H) {
        for &step in &outcome.steps {
            host.move_item(step);
        }
        host.reload(outcome.anchor.parent, false);
        for &parent in &outcome.vacated {
            host.reload((!self.tree.is_root(parent)).then_some(parent), false);
        }
        host.reload(None, true);

        let states: Vec<ItemState> = self
            .session
            .take_item_states()
            .into_iter()
            .rev()
            .filter(|state| !self.tree.is_root(state.node) && self.tree.is_alive(state.node))
            .collect();
        for state in &states {
            if state.expanded {
                host.expand(state.node, true);
            } else {
                host.collapse(state.node);
            }
        }
        for state in &states {
            if state.selected {
                host.select(&[state.node], true);
            } else {
                host.deselect(state.node);
            }
        }
    }
}
