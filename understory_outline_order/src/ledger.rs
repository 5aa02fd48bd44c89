// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The ledger itself: parent key to ordered child keys.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::error::OrderError;
use crate::store::KeyValueStore;

/// Order key reserved for the root of an outline.
pub const ROOT_ORDER_KEY: &str = "root";

/// Store key under which [`OrderLedger::save`] writes the ledger.
pub const LEDGER_STORE_KEY: &str = "outline_order";

/// Mapping from a parent's order key to the ordered keys of its children.
///
/// Every list holds each key at most once. The ledger does not know which
/// keys still exist in the live tree; stale keys are kept and simply never
/// match anything.
///
/// All mutating operations address a list by its parent key and are silent
/// no-ops when the parent is unregistered, an index is out of range, or an
/// anchor key is missing.
///
/// ```rust
/// use understory_outline_order::OrderLedger;
///
/// let mut ledger = OrderLedger::new();
/// ledger.register("root", vec!["a".into(), "b".into(), "c".into()]);
/// ledger.move_to(&["a"], 2, "root");
/// assert_eq!(ledger.ordered_list("root").unwrap(), ["b", "a", "c"]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderLedger {
    lists: HashMap<String, Vec<String>>,
}

impl OrderLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered parents.
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    /// Returns `true` if no parent is registered.
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Iterate registered parent keys in unspecified order.
    pub fn parents(&self) -> impl Iterator<Item = &str> + '_ {
        self.lists.keys().map(String::as_str)
    }

    /// Returns `true` if `parent` has a list.
    pub fn contains_parent(&self, parent: &str) -> bool {
        self.lists.contains_key(parent)
    }

    /// The ordered child keys of `parent`, or `None` if it is unregistered.
    pub fn ordered_list(&self, parent: &str) -> Option<&[String]> {
        self.lists.get(parent).map(Vec::as_slice)
    }

    /// Position of `key` within the list of `parent`.
    pub fn position(&self, key: &str, parent: &str) -> Option<usize> {
        self.lists.get(parent)?.iter().position(|k| k == key)
    }

    /// Register `list` for `parent`, replacing any existing list.
    ///
    /// Duplicate keys in `list` are dropped, keeping the first occurrence.
    pub fn register(&mut self, parent: impl Into<String>, list: Vec<String>) {
        self.lists.insert(parent.into(), unique_keys(list));
    }

    /// Ensure `parent` has a list, leaving an existing one untouched.
    pub fn register_empty(&mut self, parent: &str) {
        if !self.lists.contains_key(parent) {
            self.lists.insert(parent.into(), Vec::new());
        }
    }

    /// Drop the list of `parent` entirely.
    pub fn unregister(&mut self, parent: &str) -> Option<Vec<String>> {
        self.lists.remove(parent)
    }

    /// Append `key` to the list of `parent` unless it is already present.
    pub fn add(&mut self, key: &str, parent: &str) {
        if let Some(list) = self.lists.get_mut(parent)
            && !list.iter().any(|k| k == key)
        {
            list.push(key.into());
        }
    }

    /// Insert `keys` at `index` in the list of `parent`.
    ///
    /// Keys already in the list (and repeats within `keys`) are skipped.
    /// `index` must be in `0..=len`.
    pub fn insert_at<K: AsRef<str>>(&mut self, keys: &[K], index: usize, parent: &str) {
        if let Some(list) = self.lists.get_mut(parent)
            && index <= list.len()
        {
            let fresh = fresh_keys(list, keys);
            list.splice(index..index, fresh);
        }
    }

    /// Insert `keys` immediately before `anchor` in the list of `parent`.
    pub fn insert_before<K: AsRef<str>>(&mut self, keys: &[K], anchor: &str, parent: &str) {
        if let Some(index) = self.position(anchor, parent) {
            self.insert_at(keys, index, parent);
        }
    }

    /// Insert `keys` immediately after `anchor` in the list of `parent`.
    pub fn insert_after<K: AsRef<str>>(&mut self, keys: &[K], anchor: &str, parent: &str) {
        if let Some(index) = self.position(anchor, parent) {
            self.insert_at(keys, index + 1, parent);
        }
    }

    /// Move `keys` as a batch to `index` in the list of `parent`.
    ///
    /// `index` is a gap position in the list as it is *before* the move
    /// (`0..=len`). The keys that are present are removed, then reinserted
    /// contiguously in the order given, at `index` minus the number of moved
    /// keys that sat before it. Keys missing from the list are ignored.
    pub fn move_to<K: AsRef<str>>(&mut self, keys: &[K], index: usize, parent: &str) {
        if let Some(list) = self.lists.get_mut(parent)
            && index <= list.len()
        {
            move_batch(list, keys, index);
        }
    }

    /// Move `keys` as a batch to the gap before `anchor`.
    pub fn move_before<K: AsRef<str>>(&mut self, keys: &[K], anchor: &str, parent: &str) {
        if let Some(index) = self.position(anchor, parent)
            && let Some(list) = self.lists.get_mut(parent)
        {
            move_batch(list, keys, index);
        }
    }

    /// Move `keys` as a batch to the gap after `anchor`.
    pub fn move_after<K: AsRef<str>>(&mut self, keys: &[K], anchor: &str, parent: &str) {
        if let Some(index) = self.position(anchor, parent)
            && let Some(list) = self.lists.get_mut(parent)
        {
            move_batch(list, keys, index + 1);
        }
    }

    /// Remove `key` from the list of `parent`.
    pub fn remove(&mut self, key: &str, parent: &str) {
        if let Some(list) = self.lists.get_mut(parent) {
            list.retain(|k| k != key);
        }
    }

    /// Remove the entry at `index` from the list of `parent`.
    pub fn remove_at(&mut self, index: usize, parent: &str) -> Option<String> {
        let list = self.lists.get_mut(parent)?;
        (index < list.len()).then(|| list.remove(index))
    }
}

// --- persistence ---

impl OrderLedger {
    /// Encode the ledger as a flat JSON object `{ parent: [child, ...] }`.
    ///
    /// Parents are written in sorted order so the output is stable.
    pub fn to_json(&self) -> Result<String, OrderError> {
        let sorted: BTreeMap<&str, &[String]> = self
            .lists
            .iter()
            .map(|(parent, list)| (parent.as_str(), list.as_slice()))
            .collect();
        serde_json::to_string(&sorted).map_err(OrderError::Encode)
    }

    /// Decode a ledger written by [`OrderLedger::to_json`].
    ///
    /// Repeated keys within a stored list are dropped, keeping the first.
    pub fn from_json(json: &str) -> Result<Self, OrderError> {
        let decoded: HashMap<String, Vec<String>> =
            serde_json::from_str(json).map_err(OrderError::Decode)?;
        let lists = decoded
            .into_iter()
            .map(|(parent, list)| (parent, unique_keys(list)))
            .collect();
        Ok(Self { lists })
    }

    /// Load the ledger stored under [`LEDGER_STORE_KEY`].
    ///
    /// Returns `None` when nothing is stored or the record is malformed; both
    /// mean "no persisted order".
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Option<Self> {
        Self::load_from(store, LEDGER_STORE_KEY)
    }

    /// Load the ledger stored under `key`. See [`OrderLedger::load`].
    pub fn load_from<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> Option<Self> {
        let json = store.get(key)?;
        match Self::from_json(&json) {
            Ok(ledger) => {
                tracing::debug!(key, parents = ledger.len(), "loaded order ledger");
                Some(ledger)
            }
            Err(err) => {
                tracing::warn!(key, error = %err, "ignoring malformed order ledger");
                None
            }
        }
    }

    /// Write the ledger under [`LEDGER_STORE_KEY`].
    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<(), OrderError> {
        self.save_to(store, LEDGER_STORE_KEY)
    }

    /// Write the ledger under `key`.
    pub fn save_to<S: KeyValueStore + ?Sized>(
        &self,
        store: &mut S,
        key: &str,
    ) -> Result<(), OrderError> {
        let json = self.to_json()?;
        store.set(key, &json)?;
        Ok(())
    }
}

fn unique_keys(list: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(list.len());
    for key in list {
        if !unique.contains(&key) {
            unique.push(key);
        }
    }
    unique
}

fn fresh_keys<K: AsRef<str>>(list: &[String], keys: &[K]) -> Vec<String> {
    let mut fresh: Vec<String> = Vec::with_capacity(keys.len());
    for key in keys {
        let key = key.as_ref();
        if !list.iter().any(|k| k == key) && !fresh.iter().any(|k| k == key) {
            fresh.push(key.into());
        }
    }
    fresh
}

fn move_batch<K: AsRef<str>>(list: &mut Vec<String>, keys: &[K], gap: usize) {
    let mut batch: Vec<String> = Vec::with_capacity(keys.len());
    for key in keys {
        let key = key.as_ref();
        if list.iter().any(|k| k == key) && !batch.iter().any(|k| k == key) {
            batch.push(key.into());
        }
    }
    if batch.is_empty() {
        return;
    }
    let shift = list[..gap].iter().filter(|k| batch.contains(k)).count();
    list.retain(|k| !batch.contains(k));
    let at = gap - shift;
    list.splice(at..at, batch);
}
