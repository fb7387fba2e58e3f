// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! [`RoverStore`] is everything the handlers need from a document store.
//! [`FirestoreDb`] backs production; [`MemoryDb`] backs local development
//! and tests.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{Fields, RoverUpdate, StoredDocument};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    /// Latest state per rover (keyed by rover ID)
    pub const ROVER: &str = "rover";
    /// One entry per rover update (append-only)
    pub const ROVER_LOGS: &str = "rover_logs";
    /// GNSS fixes written by an external producer (append-only)
    pub const GNSS_LOGS: &str = "gnss_logs";
}

/// Document store operations used by the rover service.
#[async_trait]
pub trait RoverStore: Send + Sync {
    /// Create or fully replace the state document keyed by `update.id`.
    async fn upsert_rover(&self, update: &RoverUpdate) -> Result<(), AppError>;

    /// Append a new log entry. Returns the generated log ID.
    async fn append_rover_log(&self, update: &RoverUpdate) -> Result<String, AppError>;

    /// Upsert the state document and append the log entry atomically.
    async fn commit_rover_update(&self, update: &RoverUpdate) -> Result<String, AppError>;

    /// Get the state document for a rover.
    async fn get_rover(&self, rover_id: &str) -> Result<Option<Fields>, AppError>;

    /// All log entries whose `id` equals `rover_id`, newest first.
    async fn rover_logs(&self, rover_id: &str) -> Result<Vec<StoredDocument>, AppError>;

    /// The GNSS fix with the greatest `timestamp`.
    async fn latest_gnss(&self) -> Result<Option<StoredDocument>, AppError>;
}

/// Generate a document ID for a new append-only entry.
fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
