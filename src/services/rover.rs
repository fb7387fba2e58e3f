// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rover telemetry service.
//!
//! Every update is written twice:
//! 1. Upsert the rover's state document (full replace)
//! 2. Append an immutable entry to the rover log
//!
//! Under [`WriteMode::Sequential`] the writes are independent, so a failure
//! between them leaves the state and the log out of step. Under
//! [`WriteMode::Transactional`] they commit together.

use crate::config::WriteMode;
use crate::db::RoverStore;
use crate::error::{AppError, Result};
use crate::models::rover::{ID_FIELD, LOG_ID_FIELD};
use crate::models::{Fields, RoverUpdate};
use std::sync::Arc;

/// Reads and writes rover state, rover logs and GNSS fixes.
#[derive(Clone)]
pub struct RoverService {
    store: Arc<dyn RoverStore>,
    write_mode: WriteMode,
}

impl RoverService {
    pub fn new(store: Arc<dyn RoverStore>, write_mode: WriteMode) -> Self {
        Self { store, write_mode }
    }

    /// Persist a validated update. Returns the new log entry's ID.
    pub async fn record_update(&self, update: &RoverUpdate) -> Result<String> {
        let log_id = match self.write_mode {
            WriteMode::Transactional => self.store.commit_rover_update(update).await?,
            WriteMode::Sequential => {
                self.store.upsert_rover(update).await?;
                self.store.append_rover_log(update).await.inspect_err(|e| {
                    tracing::error!(
                        rover_id = %update.id,
                        error = %e,
                        "Rover state written but log append failed"
                    );
                })?
            }
        };

        tracing::info!(
            rover_id = %update.id,
            log_id = %log_id,
            fields = update.fields.len(),
            "Rover updated and logged"
        );

        Ok(log_id)
    }

    /// Current state of a rover. The ID is trimmed before lookup.
    pub async fn get_rover(&self, raw_id: &str) -> Result<Fields> {
        let rover_id = raw_id.trim();
        let not_found = || AppError::NotFound("Rover data not found".to_string());

        if rover_id.is_empty() {
            return Err(not_found());
        }

        self.store.get_rover(rover_id).await?.ok_or_else(not_found)
    }

    /// Log entries for a rover, newest first, each tagged with `log_id`.
    ///
    /// `rover_id` is matched exactly, without trimming.
    pub async fn rover_logs(&self, rover_id: &str) -> Result<Vec<Fields>> {
        let logs = self.store.rover_logs(rover_id).await?;
        tracing::debug!(rover_id, count = logs.len(), "Fetched rover logs");

        Ok(logs.into_iter().map(|doc| doc.tagged(LOG_ID_FIELD)).collect())
    }

    /// Most recent GNSS fix, tagged with its document ID under `id`.
    pub async fn latest_gnss(&self) -> Result<Fields> {
        self.store
            .latest_gnss()
            .await?
            .map(|doc| doc.tagged(ID_FIELD))
            .ok_or_else(|| AppError::NotFound("No GNSS data found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{FirestoreDb, MemoryDb};
    use chrono::{DateTime, Utc};
    use serde_json::json;

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_704_103_200 + seconds, 0).unwrap()
    }

    fn update(body: serde_json::Value, seconds: i64) -> RoverUpdate {
        RoverUpdate::from_value(body, at(seconds)).unwrap()
    }

    fn service(mode: WriteMode) -> (RoverService, Arc<MemoryDb>) {
        let db = Arc::new(MemoryDb::new());
        (RoverService::new(db.clone(), mode), db)
    }

    #[tokio::test]
    async fn test_record_update_writes_state_and_one_log() {
        for mode in [WriteMode::Sequential, WriteMode::Transactional] {
            let (service, db) = service(mode);
            let log_id = service
                .record_update(&update(json!({"id": "r1", "battery": 42}), 0))
                .await
                .unwrap();

            assert_eq!(db.rover_count(), 1);
            assert_eq!(db.rover_log_count(), 1);

            let state = service.get_rover("r1").await.unwrap();
            let logs = service.rover_logs("r1").await.unwrap();
            assert_eq!(logs[0]["log_id"], log_id.as_str());
            assert_eq!(logs[0]["timestamp"], state["timestamp"]);
        }
    }

    #[tokio::test]
    async fn test_get_rover_trims_and_reports_missing() {
        let (service, _) = service(WriteMode::Sequential);
        service
            .record_update(&update(json!({"id": "r1"}), 0))
            .await
            .unwrap();

        assert!(service.get_rover("  r1 ").await.is_ok());
        assert!(matches!(
            service.get_rover("   ").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.get_rover("r9").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_latest_gnss_tags_document_id() {
        let (service, db) = service(WriteMode::Sequential);
        assert!(matches!(
            service.latest_gnss().await,
            Err(AppError::NotFound(_))
        ));

        let fix = json!({"id": "receiver", "lat": 37.4}).as_object().cloned().unwrap();
        let doc_id = db.append_gnss_fix(&fix, at(0));

        let latest = service.latest_gnss().await.unwrap();
        assert_eq!(latest["id"], doc_id.as_str());
        assert_eq!(latest["lat"], 37.4);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let service = RoverService::new(Arc::new(FirestoreDb::new_mock()), WriteMode::Sequential);

        let err = service
            .record_update(&update(json!({"id": "r1"}), 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}
