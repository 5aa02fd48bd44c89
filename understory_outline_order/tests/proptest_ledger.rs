// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property-based tests for `OrderLedger` batch edits.
//!
//! # Invariants
//!
//! 1. **Permutation**: batch moves never add, drop, or duplicate keys.
//! 2. **Block**: moved keys end up contiguous, in the order given.
//! 3. **Gap**: the block lands at the requested gap, measured before the move.
//! 4. **Stability**: keys that were not moved keep their relative order.
//! 5. **Anchor**: `move_before` places the block right before its anchor.
//! 6. **Fresh inserts**: `insert_at` adds only keys the list lacks.
//! 7. **Round trip**: JSON encoding preserves every list.

use proptest::prelude::*;
use proptest::sample::Index;
use understory_outline_order::{MemoryStore, OrderLedger};

const PARENT: &str = "parent";

// ── Helpers ─────────────────────────────────────────────────────────────

fn keys(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("k{i}")).collect()
}

fn pick(list: &[String], picks: &[Index]) -> Vec<String> {
    let mut moved: Vec<String> = Vec::new();
    for index in picks {
        let key = index.get(list);
        if !moved.contains(key) {
            moved.push(key.clone());
        }
    }
    moved
}

fn ledger_with(list: &[String]) -> OrderLedger {
    let mut ledger = OrderLedger::new();
    ledger.register(PARENT, list.to_vec());
    ledger
}

/// Expected list after moving `moved` to `gap`.
fn reference_move(list: &[String], moved: &[String], gap: usize) -> Vec<String> {
    let before = list[..gap].iter().filter(|k| moved.contains(k)).count();
    let mut rest: Vec<String> = list.iter().filter(|k| !moved.contains(k)).cloned().collect();
    let at = gap - before;
    rest.splice(at..at, moved.iter().cloned());
    rest
}

fn list_and_picks() -> impl Strategy<Value = (usize, Vec<Index>, usize)> {
    (1_usize..12, proptest::collection::vec(any::<Index>(), 1..6), 0_usize..13)
}

// ═════════════════════════════════════════════════════════════════════════
// 1-4. move_to
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn move_to_matches_reference((n, picks, gap) in list_and_picks()) {
        let list = keys(n);
        let moved = pick(&list, &picks);
        let gap = gap % (n + 1);
        let mut ledger = ledger_with(&list);

        ledger.move_to(&moved, gap, PARENT);
        let result = ledger.ordered_list(PARENT).unwrap();

        let mut sorted = result.to_vec();
        sorted.sort();
        let mut expected_keys = list.clone();
        expected_keys.sort();
        prop_assert_eq!(sorted, expected_keys, "not a permutation");

        let start = result.iter().position(|k| *k == moved[0]).unwrap();
        prop_assert_eq!(&result[start..start + moved.len()], &moved[..], "moved keys not a block");

        prop_assert_eq!(result, &reference_move(&list, &moved, gap)[..]);
    }
}

proptest! {
    #[test]
    fn move_to_out_of_range_is_ignored((n, picks, extra) in list_and_picks()) {
        let list = keys(n);
        let moved = pick(&list, &picks);
        let mut ledger = ledger_with(&list);

        ledger.move_to(&moved, n + 1 + extra, PARENT);
        prop_assert_eq!(ledger.ordered_list(PARENT).unwrap(), &list[..]);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. move_before
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn move_before_lands_right_before_anchor(
        (n, picks, _) in list_and_picks(),
        anchor in any::<Index>(),
    ) {
        let list = keys(n);
        let moved = pick(&list, &picks);
        let rest: Vec<&String> = list.iter().filter(|k| !moved.contains(k)).collect();
        prop_assume!(!rest.is_empty());
        let anchor = anchor.get(&rest).as_str();
        let mut ledger = ledger_with(&list);

        ledger.move_before(&moved, anchor, PARENT);
        let result = ledger.ordered_list(PARENT).unwrap();
        let at = result.iter().position(|k| k == anchor).unwrap();
        prop_assert!(at >= moved.len());
        prop_assert_eq!(&result[at - moved.len()..at], &moved[..]);
        prop_assert_eq!(result.len(), n);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. insert_at
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn insert_at_skips_known_keys(
        (n, picks, gap) in list_and_picks(),
        fresh in 0_usize..4,
    ) {
        let list = keys(n);
        let mut incoming = pick(&list, &picks);
        incoming.extend((0..fresh).map(|i| format!("new{i}")));
        incoming.push(String::from("new0"));
        let gap = gap % (n + 1);
        let mut ledger = ledger_with(&list);

        ledger.insert_at(&incoming, gap, PARENT);
        let result = ledger.ordered_list(PARENT).unwrap();

        let added = fresh.max(1);
        prop_assert_eq!(result.len(), n + added);
        let kept: Vec<&String> = result.iter().filter(|k| list.contains(k)).collect();
        let original: Vec<&String> = list.iter().collect();
        prop_assert_eq!(kept, original);
        prop_assert_eq!(&result[gap], "new0");
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 7. Round trip
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn json_and_store_round_trip(
        lists in proptest::collection::vec(0_usize..8, 0..6),
    ) {
        let mut ledger = OrderLedger::new();
        for (i, n) in lists.iter().enumerate() {
            ledger.register(format!("p{i}"), keys(*n));
        }

        let json = ledger.to_json().unwrap();
        prop_assert_eq!(&OrderLedger::from_json(&json).unwrap(), &ledger);

        let mut store = MemoryStore::new();
        ledger.save(&mut store).unwrap();
        prop_assert_eq!(OrderLedger::load(&store), Some(ledger));
    }
}
