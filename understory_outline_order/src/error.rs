// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for ledger persistence.

/// Failure reported by a [`KeyValueStore`](crate::KeyValueStore) write.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store does not accept writes.
    #[error("store is read-only")]
    ReadOnly,
    /// The backing file could not be written or removed.
    #[cfg(feature = "std")]
    #[error("store i/o failed")]
    Io(#[from] std::io::Error),
}

/// Failure while encoding, decoding, or writing an [`OrderLedger`](crate::OrderLedger).
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    /// The ledger could not be serialized.
    #[error("failed to encode order ledger: {0}")]
    Encode(serde_json::Error),
    /// The stored record is not a valid ledger.
    #[error("failed to decode order ledger: {0}")]
    Decode(serde_json::Error),
    /// The store rejected the write.
    #[error("failed to write order ledger")]
    Store(#[from] StoreError),
}
