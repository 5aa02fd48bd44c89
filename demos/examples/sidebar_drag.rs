// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drag-and-drop reordering of a sidebar, persisted to disk.
//!
//! This example shows how to:
//! - build an `ItemTree` of group sections, folders, leaves, and a separator,
//! - drive an `Outline` through the drag callbacks a widget would make,
//! - replay the resulting move plan on a headless `MirrorHost`,
//! - persist the chosen order with a `FileStore` and restore it on the next run.
//!
//! The order is stored under the directory given as the first argument, or
//! `OUTLINE_DEMO_DIR`, or a directory in the system temp dir. Run it twice to
//! see the stored order applied at startup.
//!
//! Run:
//! - `cargo run -p understory_outline_demos --example sidebar_drag`
//! - `RUST_LOG=understory_outline=trace cargo run -p understory_outline_demos --example sidebar_drag`

use std::path::PathBuf;

use tracing_subscriber::EnvFilter;
use understory_outline::{
    DragOperation, DropIndex, Item, ItemTree, MirrorHost, NodeId, Outline, OutlineHost,
};
use understory_outline_order::{FileStore, KeyValueStore, LEDGER_STORE_KEY};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("OUTLINE_DEMO_DIR").map(PathBuf::from))
        .unwrap_or_else(|| std::env::temp_dir().join("understory_outline_demo"));
    let store = FileStore::new(&dir);
    if store.get(LEDGER_STORE_KEY).is_some() {
        tracing::info!(dir = %dir.display(), "restoring stored order");
    }

    let (tree, sidebar) = build_sidebar();
    let mut outline = Outline::new(tree, store);
    let mut host = MirrorHost::new(outline.tree());
    host.expand_all();
    print_rows("Initial", &outline, &host);

    // Two leaves from different parents, dropped at the top of a folder.
    drag(
        &mut outline,
        &mut host,
        &[sidebar.notes, sidebar.drafts],
        Some(sidebar.projects),
        DropIndex::At(0),
    );
    print_rows("Notes and Drafts into Projects", &outline, &host);

    // A whole folder, dropped onto another group section.
    drag(
        &mut outline,
        &mut host,
        &[sidebar.projects],
        Some(sidebar.shared),
        DropIndex::OnItem,
    );
    print_rows("Projects onto Shared", &outline, &host);

    // Refused: a folder cannot be dropped into one of its own subfolders.
    drag(
        &mut outline,
        &mut host,
        &[sidebar.projects],
        Some(sidebar.ideas),
        DropIndex::At(0),
    );

    match outline.ledger().to_json() {
        Ok(json) => println!("\nStored in {}:\n{json}", dir.display()),
        Err(error) => eprintln!("could not encode the order: {error}"),
    }
}

struct Sidebar {
    shared: NodeId,
    projects: NodeId,
    ideas: NodeId,
    notes: NodeId,
    drafts: NodeId,
}

fn build_sidebar() -> (ItemTree, Sidebar) {
    let mut tree = ItemTree::new();
    let root = tree.root();

    let library = tree.insert(root, Item::group_section("library").title("Library"));
    let notes = tree.insert(library, Item::leaf("notes").title("Notes").icon("note"));
    tree.insert(library, Item::leaf("archive").title("Archive").icon("box"));
    let projects = tree.insert(
        library,
        Item::folder("projects")
            .title("Projects")
            .icon("folder")
            .children([
                Item::leaf("roadmap").title("Roadmap"),
                Item::leaf("budget").title("Budget"),
            ]),
    );
    let ideas = tree.insert(projects, Item::folder("ideas").title("Ideas").icon("folder"));

    tree.insert(root, Item::separator("separator"));

    let shared = tree.insert(root, Item::group_section("shared").title("Shared"));
    let drafts = tree.insert(shared, Item::leaf("drafts").title("Drafts").icon("pencil"));
    tree.insert(shared, Item::leaf("inbox").title("Inbox").icon("tray"));

    (
        tree,
        Sidebar {
            shared,
            projects,
            ideas,
            notes,
            drafts,
        },
    )
}

/// Run one gesture the way a widget would report it.
fn drag(
    outline: &mut Outline<FileStore>,
    host: &mut MirrorHost,
    items: &[NodeId],
    parent: Option<NodeId>,
    index: DropIndex,
) {
    outline.drag_start(items, &*host);
    let operation = match index {
        DropIndex::OnItem => DragOperation::Move,
        DropIndex::At(_) => outline.validate_drop(parent, index),
    };
    let accepted = operation == DragOperation::Move && outline.accept_drop(parent, index, host);
    if accepted {
        for call in host.take_calls() {
            tracing::debug!(?call, "host call");
        }
        outline.drag_ended(DragOperation::Move);
    } else {
        println!("\nDrop refused");
        outline.drag_ended(DragOperation::Denied);
    }
}

fn print_rows(label: &str, outline: &Outline<FileStore>, host: &MirrorHost) {
    println!("\n{label}:");
    let tree = outline.tree();
    for row in tree.visible_rows(|node| host.is_expanded(node)) {
        let title = tree
            .title(row.node)
            .or_else(|| tree.order_key(row.node))
            .unwrap_or_default();
        println!("{:indent$}{title}", "", indent = row.depth * 2);
    }
}
