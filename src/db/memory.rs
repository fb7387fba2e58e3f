// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store for local development and tests.
//!
//! Mirrors the Firestore layout: rover state keyed by rover ID, plus two
//! append-only logs ordered by write time.

use super::{new_document_id, RoverStore};
use crate::error::AppError;
use crate::models::rover::{ID_FIELD, TIMESTAMP_FIELD};
use crate::models::{Fields, RoverUpdate, StoredDocument};
use crate::time_utils::format_utc_rfc3339;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;
use std::sync::{Mutex, MutexGuard};

/// One entry of an append-only log.
#[derive(Debug, Clone)]
struct LogEntry {
    doc_id: String,
    timestamp: DateTime<Utc>,
    fields: Fields,
}

/// In-memory document store.
#[derive(Debug, Default)]
pub struct MemoryDb {
    rovers: DashMap<String, Fields>,
    rover_logs: Mutex<Vec<LogEntry>>,
    gnss_logs: Mutex<Vec<LogEntry>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a GNSS fix with the given write time. Returns its document ID.
    pub fn append_gnss_fix(&self, fields: &Fields, timestamp: DateTime<Utc>) -> String {
        let mut fields = fields.clone();
        fields.insert(
            TIMESTAMP_FIELD.to_string(),
            Value::String(format_utc_rfc3339(timestamp)),
        );
        let doc_id = new_document_id();

        lock(&self.gnss_logs).push(LogEntry {
            doc_id: doc_id.clone(),
            timestamp,
            fields,
        });
        doc_id
    }

    /// Number of rover log entries, across all rovers.
    pub fn rover_log_count(&self) -> usize {
        lock(&self.rover_logs).len()
    }

    /// Number of rover state documents.
    pub fn rover_count(&self) -> usize {
        self.rovers.len()
    }

    fn push_rover_log(logs: &mut Vec<LogEntry>, update: &RoverUpdate) -> String {
        let doc_id = new_document_id();
        logs.push(LogEntry {
            doc_id: doc_id.clone(),
            timestamp: update.timestamp,
            fields: update.to_document(),
        });
        doc_id
    }
}

/// Lock a log, recovering from poisoning; entries are only ever pushed.
fn lock(log: &Mutex<Vec<LogEntry>>) -> MutexGuard<'_, Vec<LogEntry>> {
    log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Newest first. Entries with equal timestamps keep reverse insertion order.
fn newest_first<'a>(entries: impl DoubleEndedIterator<Item = &'a LogEntry>) -> Vec<&'a LogEntry> {
    let mut sorted: Vec<&LogEntry> = entries.rev().collect();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    sorted
}

fn to_stored(entry: &LogEntry) -> StoredDocument {
    StoredDocument::new(entry.doc_id.clone(), entry.fields.clone())
}

#[async_trait]
impl RoverStore for MemoryDb {
    async fn upsert_rover(&self, update: &RoverUpdate) -> Result<(), AppError> {
        self.rovers.insert(update.id.clone(), update.to_document());
        Ok(())
    }

    async fn append_rover_log(&self, update: &RoverUpdate) -> Result<String, AppError> {
        Ok(Self::push_rover_log(&mut lock(&self.rover_logs), update))
    }

    async fn commit_rover_update(&self, update: &RoverUpdate) -> Result<String, AppError> {
        // Holding the log lock across both writes keeps readers of the log
        // from seeing one without the other.
        let mut logs = lock(&self.rover_logs);
        self.rovers.insert(update.id.clone(), update.to_document());
        Ok(Self::push_rover_log(&mut logs, update))
    }

    async fn get_rover(&self, rover_id: &str) -> Result<Option<Fields>, AppError> {
        Ok(self.rovers.get(rover_id).map(|doc| doc.value().clone()))
    }

    async fn rover_logs(&self, rover_id: &str) -> Result<Vec<StoredDocument>, AppError> {
        let logs = lock(&self.rover_logs);
        let matching = logs
            .iter()
            .filter(|entry| entry.fields.get(ID_FIELD).and_then(Value::as_str) == Some(rover_id));

        let docs = newest_first(matching).into_iter().map(to_stored).collect();
        Ok(docs)
    }

    async fn latest_gnss(&self) -> Result<Option<StoredDocument>, AppError> {
        let logs = lock(&self.gnss_logs);
        let latest = newest_first(logs.iter()).first().map(|entry| to_stored(entry));
        Ok(latest)
    }
}
