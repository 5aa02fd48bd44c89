// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core tree implementation: structure, updates, queries.

use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;

use understory_outline_order::ROOT_ORDER_KEY;

use crate::types::{Capabilities, ColumnItem, Item, NodeId, NodeKind, Row};

/// Arena-backed outline tree.
///
/// The tree always has exactly one root, created by [`ItemTree::new`]. The
/// root is never rendered by a host; its children are the top-level rows.
/// Parents are stored as plain [`NodeId`]s, children as ordered lists owned by
/// the arena.
///
/// Nodes can be *detached*: [`ItemTree::create`] and [`ItemTree::remove`]
/// leave a live node with no parent. A detached node is not reachable from
/// the root and is ignored by traversal, but can be attached again with
/// [`ItemTree::append`] or [`ItemTree::insert_or_move_children`].
///
/// ## Example
///
/// ```rust
/// use understory_outline::{Item, ItemTree};
///
/// let mut tree = ItemTree::new();
/// let root = tree.root();
/// let a = tree.insert(root, Item::leaf("a"));
/// let b = tree.insert(root, Item::leaf("b"));
/// let c = tree.insert(root, Item::leaf("c"));
///
/// tree.move_child(a, 2);
/// assert_eq!(tree.children_of(root), &[b, a, c]);
/// ```
pub struct ItemTree {
    /// slots
    nodes: Vec<Option<Node>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    root: NodeId,
}

impl core::fmt::Debug for ItemTree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        let free = self.free_list.len();
        f.debug_struct("ItemTree")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &free)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl Default for ItemTree {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Node {
    generation: u32,
    kind: NodeKind,
    order_key: String,
    columns: Vec<ColumnItem>,
    capabilities: Capabilities,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl ItemTree {
    /// Create a tree holding only the root.
    pub fn new() -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            root: NodeId::new(0, 0),
        };
        tree.root = tree.allocate(
            NodeKind::Folder,
            String::from(ROOT_ORDER_KEY),
            Vec::new(),
            Capabilities::empty(),
        );
        tree
    }

    /// The root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns `true` if `id` is the root.
    pub fn is_root(&self, id: NodeId) -> bool {
        id == self.root
    }

    /// Number of live nodes, including the root and detached nodes.
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free_list.len()
    }

    /// Returns `true` if the root has no children.
    pub fn is_empty(&self) -> bool {
        self.node(self.root).children.is_empty()
    }

    fn allocate(
        &mut self,
        kind: NodeKind,
        order_key: String,
        columns: Vec<ColumnItem>,
        capabilities: Capabilities,
    ) -> NodeId {
        let mut node = Node {
            generation: 1,
            kind,
            order_key,
            columns,
            capabilities,
            parent: None,
            children: Vec::new(),
        };
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            node.generation = generation;
            self.nodes[idx] = Some(node);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId stores 32-bit slots and generations."
            )]
            (idx as u32, generation)
        } else {
            self.nodes.push(Some(node));
            self.generations.push(1);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId stores 32-bit slots and generations."
            )]
            ((self.nodes.len() - 1) as u32, 1)
        };
        NodeId::new(idx, generation)
    }

    fn free(&mut self, id: NodeId) {
        let children = core::mem::take(&mut self.node_mut(id).children);
        for child in children {
            if self.is_alive(child) {
                self.free(child);
            }
        }
        self.nodes[id.idx()] = None;
        self.free_list.push(id.idx());
    }

    /// Build a detached node (and its subtree) from `item`.
    pub fn create(&mut self, item: Item) -> NodeId {
        let Item {
            kind,
            order_key,
            columns,
            capabilities,
            children,
        } = item;
        let capabilities = kind.resolve(capabilities.unwrap_or(kind.default_capabilities()));
        let id = self.allocate(kind, order_key, columns, capabilities);
        if kind.holds_children() {
            for child in children {
                let child = self.create(child);
                self.link_parent(child, id);
            }
        } else if !children.is_empty() {
            tracing::debug!(?kind, dropped = children.len(), "kind cannot hold children");
        }
        id
    }

    /// Build a node from `item` and append it to `parent`.
    ///
    /// If `parent` is stale or cannot hold children, or `item` is a
    /// [`NodeKind::Placeholder`], the node stays detached.
    pub fn insert(&mut self, parent: NodeId, item: Item) -> NodeId {
        let id = self.create(item);
        self.append(parent, &[id]);
        id
    }

    /// Append `nodes` to the end of `parent`'s children.
    ///
    /// Nodes attached elsewhere are unlinked from their old parent first.
    /// Stale nodes, the root, `parent` itself, and ancestors of `parent` are
    /// skipped.
    pub fn append(&mut self, parent: NodeId, nodes: &[NodeId]) {
        self.insert_or_move_children(nodes, None, parent);
    }

    /// Unlink `id` from its parent. The node stays alive and detached.
    pub fn remove(&mut self, id: NodeId) {
        if let Some(parent) = self.parent_of(id) {
            self.unlink_parent(id, parent);
        }
    }

    /// Unlink `id` and free it together with its subtree.
    ///
    /// Identifiers of freed nodes become stale. The root cannot be deleted.
    pub fn delete(&mut self, id: NodeId) {
        if !self.is_alive(id) || self.is_root(id) {
            return;
        }
        self.remove(id);
        self.free(id);
    }

    /// Move `id` to gap `to` among its current siblings.
    ///
    /// `to` is a gap in the sibling list before the move and is clamped to
    /// `0..=len`. Moving forward past the node's own slot lands one position
    /// earlier, since the slot is vacated first.
    pub fn move_child(&mut self, id: NodeId, to: usize) {
        let Some(parent) = self.parent_of(id) else {
            return;
        };
        let children = &mut self.node_mut(parent).children;
        let Some(from) = children.iter().position(|&c| c == id) else {
            return;
        };
        let to = to.min(children.len());
        let target = if from < to { to - 1 } else { to };
        if target == from {
            return;
        }
        children.remove(from);
        children.insert(target, id);
    }

    /// Place `nodes`, in order, at gap `to` of `parent`'s children.
    ///
    /// Nodes may already be children of `parent` (a reorder) or come from
    /// elsewhere (a re-parent). `to` is a gap in the children as they are
    /// before the call; `None` or an out-of-range index appends.
    ///
    /// Incoming nodes that are already children have their slots frozen with
    /// placeholder nodes while the list is spliced, so `to` keeps pointing at
    /// the same neighbor. The placeholders are stripped and freed afterwards.
    pub fn insert_or_move_children(&mut self, nodes: &[NodeId], to: Option<usize>, parent: NodeId) {
        if !self.is_alive(parent) || !self.node(parent).kind.holds_children() {
            return;
        }
        let mut incoming: Vec<NodeId> = Vec::with_capacity(nodes.len());
        for &node in nodes {
            if self.can_adopt(parent, node) && !incoming.contains(&node) {
                incoming.push(node);
            }
        }
        if incoming.is_empty() {
            return;
        }

        for &node in &incoming {
            if let Some(old) = self.parent_of(node)
                && old != parent
            {
                self.unlink_parent(node, old);
            }
        }

        // Freeze.
        let mut placeholders = Vec::new();
        for &node in &incoming {
            let slot = self.node(parent).children.iter().position(|&c| c == node);
            if let Some(slot) = slot {
                let placeholder = self.allocate(
                    NodeKind::Placeholder,
                    String::new(),
                    Vec::new(),
                    Capabilities::empty(),
                );
                self.node_mut(placeholder).parent = Some(parent);
                self.node_mut(parent).children[slot] = placeholder;
                placeholders.push(placeholder);
            }
        }

        // Splice.
        let children = &mut self.node_mut(parent).children;
        match to {
            Some(index) if index < children.len() => {
                children.splice(index..index, incoming.iter().copied());
            }
            _ => children.extend_from_slice(&incoming),
        }
        for &node in &incoming {
            self.node_mut(node).parent = Some(parent);
        }

        // Strip.
        if !placeholders.is_empty() {
            self.node_mut(parent)
                .children
                .retain(|c| !placeholders.contains(c));
            for placeholder in placeholders {
                self.free(placeholder);
            }
        }
    }

    fn can_adopt(&self, parent: NodeId, node: NodeId) -> bool {
        self.is_alive(node)
            && node != self.root
            && node != parent
            && self.node(node).kind != NodeKind::Placeholder
            && !self.has_ancestor(parent, node)
    }

    /// Stable sort of `parent`'s children with a caller-supplied order.
    ///
    /// The comparator sees the tree, but `parent`'s child list reads as empty
    /// while the sort runs.
    pub fn sort_children<F>(&mut self, parent: NodeId, mut cmp: F)
    where
        F: FnMut(&Self, NodeId, NodeId) -> Ordering,
    {
        if !self.is_alive(parent) {
            return;
        }
        let mut children = core::mem::take(&mut self.node_mut(parent).children);
        children.sort_by(|&a, &b| cmp(self, a, b));
        self.node_mut(parent).children = children;
    }

    /// Replace `parent`'s child list with a permutation of itself.
    pub(crate) fn reorder_children(&mut self, parent: NodeId, children: Vec<NodeId>) {
        debug_assert_eq!(children.len(), self.node(parent).children.len());
        self.node_mut(parent).children = children;
    }

    /// Access a node; panics if `id` is stale.
    pub(crate) fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.idx()].as_ref().expect("dangling NodeId")
    }

    /// Access a node mutably; panics if `id` is stale.
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.idx()].as_mut().expect("dangling NodeId")
    }

    fn node_opt(&self, id: NodeId) -> Option<&Node> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        (n.generation == id.1).then_some(n)
    }

    fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }

    fn link_parent(&mut self, id: NodeId, parent: NodeId) {
        self.node_mut(parent).children.push(id);
        self.node_mut(id).parent = Some(parent);
    }

    fn unlink_parent(&mut self, id: NodeId, parent: NodeId) {
        self.node_mut(parent).children.retain(|c| *c != id);
        self.node_mut(id).parent = None;
    }
}

impl ItemTree {
    // --- queries ---

    /// Returns true if `id` refers to a live node.
    ///
    /// A `NodeId` is considered live if its slot exists and its generation matches
    /// the current generation stored in that slot.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node_opt(id).is_some()
    }

    /// Returns `true` if `id` is live and reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.is_alive(id) && (self.is_root(id) || self.has_ancestor(id, self.root))
    }

    /// Returns the parent of a node, or `None` for the root, detached nodes, and stale ids.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id).and_then(|node| node.parent)
    }

    /// Get the children of a node, or empty slice if node is stale.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.node_opt(id).map_or(&[], |node| &node.children)
    }

    /// The child of `parent` at `index`.
    pub fn child_at(&self, parent: NodeId, index: usize) -> Option<NodeId> {
        self.children_of(parent).get(index).copied()
    }

    /// Position of `id` among its siblings.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent_of(id)?;
        self.children_of(parent).iter().position(|&c| c == id)
    }

    /// Number of ancestors of `id`: `0` for the root and detached nodes.
    pub fn depth(&self, id: NodeId) -> Option<usize> {
        if !self.is_alive(id) {
            return None;
        }
        let mut depth = 0;
        let mut node = id;
        while let Some(parent) = self.parent_of(node) {
            depth += 1;
            node = parent;
        }
        Some(depth)
    }

    /// Returns `true` if `candidate` is a strict ancestor of `node`.
    pub fn has_ancestor(&self, node: NodeId, candidate: NodeId) -> bool {
        let mut current = self.parent_of(node);
        while let Some(parent) = current {
            if parent == candidate {
                return true;
            }
            current = self.parent_of(parent);
        }
        false
    }

    /// Returns `true` if `node` lies anywhere in the subtree below `ancestor`.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.is_alive(ancestor) && self.has_ancestor(node, ancestor)
    }

    /// Depth-first lookup of `id` in the subtree rooted at `within` (inclusive).
    pub fn search(&self, within: NodeId, id: NodeId) -> Option<NodeId> {
        self.find_in(within, |_, node| node == id)
    }

    /// First node in depth-first order (from the root) whose order key is `key`.
    pub fn find_by_order_key(&self, key: &str) -> Option<NodeId> {
        self.find_in(self.root, |tree, node| tree.node(node).order_key == key)
    }

    fn find_in(&self, within: NodeId, mut pred: impl FnMut(&Self, NodeId) -> bool) -> Option<NodeId> {
        if !self.is_alive(within) {
            return None;
        }
        let mut stack = alloc::vec![within];
        while let Some(node) = stack.pop() {
            if pred(self, node) {
                return Some(node);
            }
            stack.extend(self.node(node).children.iter().rev().copied());
        }
        None
    }

    /// The kind of a live node.
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.node_opt(id).map(|node| node.kind)
    }

    /// Column contents of a live node.
    pub fn columns(&self, id: NodeId) -> &[ColumnItem] {
        self.node_opt(id).map_or(&[], |node| &node.columns)
    }

    /// Title of the first column.
    pub fn title(&self, id: NodeId) -> Option<&str> {
        self.columns(id).first()?.title.as_deref()
    }

    /// Replace the columns of a live node.
    pub fn set_columns(&mut self, id: NodeId, columns: Vec<ColumnItem>) {
        if let Some(node) = self.node_opt_mut(id) {
            node.columns = columns;
        }
    }

    /// Order key of a live node. The root reports [`ROOT_ORDER_KEY`].
    pub fn order_key(&self, id: NodeId) -> Option<&str> {
        self.node_opt(id).map(|node| node.order_key.as_str())
    }

    /// Change the order key of a live, non-root node.
    pub fn set_order_key(&mut self, id: NodeId, key: impl Into<String>) {
        if self.is_root(id) {
            return;
        }
        if let Some(node) = self.node_opt_mut(id) {
            node.order_key = key.into();
        }
    }

    /// Effective capabilities of a node. The root and stale ids report none.
    pub fn capabilities(&self, id: NodeId) -> Capabilities {
        if self.is_root(id) {
            return Capabilities::empty();
        }
        self.node_opt(id)
            .map_or(Capabilities::empty(), |node| node.capabilities)
    }

    /// Request new capabilities for a non-root node.
    ///
    /// Bits fixed by the node's kind keep their default value.
    pub fn set_capabilities(&mut self, id: NodeId, capabilities: Capabilities) {
        if self.is_root(id) {
            return;
        }
        if let Some(node) = self.node_opt_mut(id) {
            node.capabilities = node.kind.resolve(capabilities);
        }
    }

    /// Returns `true` if the node is a group row.
    pub fn is_group(&self, id: NodeId) -> bool {
        self.capabilities(id).contains(Capabilities::GROUP)
    }

    /// Returns `true` if the node is expandable (and accepts drops).
    pub fn is_expandable(&self, id: NodeId) -> bool {
        self.capabilities(id).contains(Capabilities::EXPANDABLE)
    }

    /// Returns `true` if the node is expandable while it has no children.
    pub fn is_expandable_when_empty(&self, id: NodeId) -> bool {
        self.capabilities(id)
            .contains(Capabilities::EXPANDABLE_WHEN_EMPTY)
    }

    /// Returns `true` if the node's row may be selected.
    pub fn is_selectable(&self, id: NodeId) -> bool {
        self.capabilities(id).contains(Capabilities::SELECTABLE)
    }

    /// Get the next node in depth-first traversal order.
    ///
    /// Returns `None` if no next node exists or if the current node is stale.
    /// Traversal stays inside the subtree of the topmost ancestor of `current`.
    pub fn next_depth_first(&self, current: NodeId) -> Option<NodeId> {
        if !self.is_alive(current) {
            return None;
        }
        if let Some(&first_child) = self.node(current).children.first() {
            return Some(first_child);
        }
        let mut node = current;
        while let Some(parent) = self.parent_of(node) {
            if let Some(next_sibling) = self.next_sibling(node) {
                return Some(next_sibling);
            }
            node = parent;
        }
        None
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let siblings = self.children_of(self.parent_of(node)?);
        let pos = siblings.iter().position(|&id| id == node)?;
        siblings.get(pos + 1).copied()
    }

    /// Rows a host would show, given which nodes are expanded.
    ///
    /// The root itself is not a row; its children have depth `0`. Children of
    /// a node are listed only when `is_expanded` returns `true` for it.
    pub fn visible_rows(&self, mut is_expanded: impl FnMut(NodeId) -> bool) -> Vec<Row> {
        let mut rows = Vec::new();
        let mut stack: Vec<(NodeId, usize)> = self
            .children_of(self.root)
            .iter()
            .rev()
            .map(|&node| (node, 0))
            .collect();
        while let Some((node, depth)) = stack.pop() {
            rows.push(Row { node, depth });
            if is_expanded(node) {
                stack.extend(
                    self.children_of(node)
                        .iter()
                        .rev()
                        .map(|&child| (child, depth + 1)),
                );
            }
        }
        rows
    }
}
