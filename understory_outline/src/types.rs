// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the item tree: node identifiers, kinds, capabilities, and builders.

use alloc::string::String;
use alloc::vec::Vec;

/// Identifier for a node in an [`ItemTree`](crate::ItemTree) (generational).
///
/// Slots are recycled, but each reuse bumps the slot's generation, so an
/// identifier never refers to a different node later in the process.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// The kind of an outline node.
///
/// A kind determines the node's default [`Capabilities`] and which of them
/// are fixed; see [`NodeKind::default_capabilities`] and
/// [`NodeKind::fixed_capabilities`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A plain item. All capabilities can be changed per instance.
    Leaf,
    /// A container that is always expandable, even when empty.
    Folder,
    /// A non-selectable section header that groups its children.
    GroupSection,
    /// Internal index-freezing sentinel. Never expandable, selectable, or a parent.
    ///
    /// Nodes of this kind are never attached to a parent.
    Placeholder,
    /// A visual divider row. Never expandable, selectable, or a parent.
    Separator,
}

bitflags::bitflags! {
    /// Per-node behavior flags reported to the host widget.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// Rendered as a group row (section header).
        const GROUP                 = 0b0000_0001;
        /// Can be expanded when it has children; also accepts drops.
        const EXPANDABLE            = 0b0000_0010;
        /// Can be expanded while it has no children.
        const EXPANDABLE_WHEN_EMPTY = 0b0000_0100;
        /// Rows of this node may be selected.
        const SELECTABLE            = 0b0000_1000;
    }
}

impl NodeKind {
    /// Capabilities a freshly built node of this kind starts with.
    pub const fn default_capabilities(self) -> Capabilities {
        match self {
            Self::Leaf => Capabilities::SELECTABLE,
            Self::Folder => Capabilities::EXPANDABLE
                .union(Capabilities::EXPANDABLE_WHEN_EMPTY)
                .union(Capabilities::SELECTABLE),
            Self::GroupSection => Capabilities::GROUP
                .union(Capabilities::EXPANDABLE)
                .union(Capabilities::EXPANDABLE_WHEN_EMPTY),
            Self::Placeholder | Self::Separator => Capabilities::empty(),
        }
    }

    /// Capabilities this kind pins to their default value.
    ///
    /// Requests to change a fixed bit through
    /// [`ItemTree::set_capabilities`](crate::ItemTree::set_capabilities) are ignored.
    pub const fn fixed_capabilities(self) -> Capabilities {
        match self {
            Self::Leaf => Capabilities::empty(),
            Self::Folder => Capabilities::GROUP
                .union(Capabilities::EXPANDABLE)
                .union(Capabilities::EXPANDABLE_WHEN_EMPTY),
            Self::GroupSection | Self::Placeholder | Self::Separator => Capabilities::all(),
        }
    }

    /// Returns `true` if nodes of this kind may have children.
    pub const fn holds_children(self) -> bool {
        !matches!(self, Self::Placeholder | Self::Separator)
    }

    /// Combine a requested capability set with this kind's fixed bits.
    pub const fn resolve(self, requested: Capabilities) -> Capabilities {
        let fixed = self.fixed_capabilities();
        self.default_capabilities()
            .intersection(fixed)
            .union(requested.difference(fixed))
    }
}

/// One column's content for a node: a title and a symbolic icon name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnItem {
    /// Text shown in the column.
    pub title: Option<String>,
    /// Icon name understood by the host (for example a symbol name).
    pub icon: Option<String>,
}

impl ColumnItem {
    /// A column with a title and no icon.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            icon: None,
        }
    }

    /// Set the icon name.
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// Declarative description of a node and its subtree.
///
/// Build one with [`Item::leaf`], [`Item::folder`], [`Item::group_section`],
/// or [`Item::separator`], then hand it to
/// [`ItemTree::insert`](crate::ItemTree::insert) or
/// [`ItemTree::create`](crate::ItemTree::create). Children of kinds that
/// cannot hold children are dropped.
///
/// ```rust
/// use understory_outline::{Item, ItemTree};
///
/// let mut tree = ItemTree::new();
/// let section = tree.insert(
///     tree.root(),
///     Item::group_section("favorites")
///         .title("Favorites")
///         .child(Item::folder("docs").title("Documents").icon("folder"))
///         .child(Item::leaf("notes").title("Notes").icon("doc")),
/// );
/// assert_eq!(tree.children_of(section).len(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct Item {
    pub(crate) kind: NodeKind,
    pub(crate) order_key: String,
    pub(crate) columns: Vec<ColumnItem>,
    pub(crate) capabilities: Option<Capabilities>,
    pub(crate) children: Vec<Item>,
}

impl Item {
    /// Describe a node of `kind` with the given order key.
    ///
    /// A [`NodeKind::Placeholder`] item can be created but is never attached
    /// by [`ItemTree::insert`](crate::ItemTree::insert).
    pub fn new(kind: NodeKind, order_key: impl Into<String>) -> Self {
        Self {
            kind,
            order_key: order_key.into(),
            columns: Vec::new(),
            capabilities: None,
            children: Vec::new(),
        }
    }

    /// A [`NodeKind::Leaf`] item.
    pub fn leaf(order_key: impl Into<String>) -> Self {
        Self::new(NodeKind::Leaf, order_key)
    }

    /// A [`NodeKind::Folder`] item.
    pub fn folder(order_key: impl Into<String>) -> Self {
        Self::new(NodeKind::Folder, order_key)
    }

    /// A [`NodeKind::GroupSection`] item.
    pub fn group_section(order_key: impl Into<String>) -> Self {
        Self::new(NodeKind::GroupSection, order_key)
    }

    /// A [`NodeKind::Separator`] item.
    pub fn separator(order_key: impl Into<String>) -> Self {
        Self::new(NodeKind::Separator, order_key)
    }

    /// Set the title of the first column.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.first_column().title = Some(title.into());
        self
    }

    /// Set the icon of the first column.
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.first_column().icon = Some(icon.into());
        self
    }

    /// Append a column.
    pub fn column(mut self, column: ColumnItem) -> Self {
        self.columns.push(column);
        self
    }

    /// Request capabilities; bits fixed by the kind keep their default.
    pub fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = Some(capabilities);
        self
    }

    /// Append a child.
    pub fn child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Append children.
    pub fn children(mut self, children: impl IntoIterator<Item = Self>) -> Self {
        self.children.extend(children);
        self
    }

    fn first_column(&mut self) -> &mut ColumnItem {
        if self.columns.is_empty() {
            self.columns.push(ColumnItem::default());
        }
        &mut self.columns[0]
    }
}

/// A visible row produced by [`ItemTree::visible_rows`](crate::ItemTree::visible_rows).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Row {
    /// Node shown in the row.
    pub node: NodeId,
    /// Zero-based depth (`0` for children of the root).
    pub depth: usize,
}
