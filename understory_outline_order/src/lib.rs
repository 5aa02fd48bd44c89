// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_outline_order --heading-base-level=0

//! Understory Outline Order: a persistable record of child order for outline trees.
//!
//! An outline (sidebar, source list, file tree) usually wants to remember the
//! order the user dragged its items into. This crate keeps that record apart
//! from the tree itself:
//!
//! - [`OrderLedger`] maps a parent's *order key* to the ordered order keys of
//!   its children. Order keys are stable strings chosen by the application,
//!   distinct from any runtime node handle.
//! - The ledger tolerates stale keys: entries that no longer match a live node
//!   are kept and ignored, so a record written by an older build still applies
//!   to whatever nodes remain.
//! - [`KeyValueStore`] is the persistence seam. [`MemoryStore`] is always
//!   available; [`FileStore`] (feature `std`) keeps one JSON file per key.
//!
//! ## Persisted format
//!
//! A ledger is stored as a single flat JSON object under
//! [`LEDGER_STORE_KEY`]:
//!
//! ```json
//! { "root": ["section-a", "section-b"], "section-a": ["item-0", "item-1"] }
//! ```
//!
//! There is no versioning. An absent or malformed record loads as `None`,
//! which callers treat as "no prior order".
//!
//! ## Example
//!
//! ```rust
//! use understory_outline_order::{MemoryStore, OrderLedger, ROOT_ORDER_KEY};
//!
//! let mut store = MemoryStore::new();
//! let mut ledger = OrderLedger::load(&store).unwrap_or_default();
//! ledger.register(ROOT_ORDER_KEY, vec!["a".into(), "b".into(), "c".into()]);
//! ledger.move_to(&["c"], 0, ROOT_ORDER_KEY);
//! ledger.save(&mut store).unwrap();
//!
//! let restored = OrderLedger::load(&store).unwrap();
//! assert_eq!(restored.ordered_list(ROOT_ORDER_KEY).unwrap(), ["c", "a", "b"]);
//! ```
//!
//! ## Features
//!
//! - `std` (default): enables [`FileStore`] and `std` support in dependencies.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

mod error;
mod ledger;
mod store;

pub use error::{OrderError, StoreError};
pub use ledger::{LEDGER_STORE_KEY, OrderLedger, ROOT_ORDER_KEY};
#[cfg(feature = "std")]
pub use store::FileStore;
pub use store::{KeyValueStore, MemoryStore};
