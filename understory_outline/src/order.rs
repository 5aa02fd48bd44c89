// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reflecting child order between an [`ItemTree`] and an [`OrderLedger`].

use alloc::string::String;
use alloc::vec::Vec;

use understory_outline_order::OrderLedger;

use crate::tree::ItemTree;
use crate::types::NodeId;

impl ItemTree {
    /// A fresh ledger holding the tree's current order.
    pub fn build_order(&self) -> OrderLedger {
        let mut ledger = OrderLedger::new();
        self.record_order(&mut ledger);
        ledger
    }

    /// Register every attached parent that has children and append the keys
    /// of children the ledger does not list yet.
    ///
    /// Existing lists keep their order; new keys go to the end.
    pub fn record_order(&self, ledger: &mut OrderLedger) {
        let mut stack = alloc::vec![self.root()];
        while let Some(parent) = stack.pop() {
            let children = self.children_of(parent);
            if children.is_empty() {
                continue;
            }
            let Some(parent_key) = self.order_key(parent) else {
                continue;
            };
            ledger.register_empty(parent_key);
            for &child in children {
                if let Some(key) = self.order_key(child) {
                    ledger.add(key, parent_key);
                }
            }
            stack.extend(children.iter().rev().copied());
        }
    }

    /// Sort every parent's children into the order recorded in `ledger`.
    ///
    /// Children whose key the parent's list does not mention sort after the
    /// listed ones and keep their relative order. Parents without a list are
    /// left as they are.
    pub fn apply_order(&mut self, ledger: &OrderLedger) {
        let mut stack = alloc::vec![self.root()];
        while let Some(parent) = stack.pop() {
            let Some(parent_key) = self.order_key(parent).map(String::from) else {
                continue;
            };
            if let Some(list) = ledger.ordered_list(&parent_key) {
                let mut ranked: Vec<(usize, NodeId)> = self
                    .children_of(parent)
                    .iter()
                    .map(|&child| {
                        let rank = self
                            .order_key(child)
                            .and_then(|key| list.iter().position(|k| k == key))
                            .unwrap_or(usize::MAX);
                        (rank, child)
                    })
                    .collect();
                ranked.sort_by_key(|&(rank, _)| rank);
                self.reorder_children(parent, ranked.into_iter().map(|(_, child)| child).collect());
            }
            stack.extend(self.children_of(parent).iter().copied());
        }
    }
}
