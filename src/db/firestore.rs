// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Rover state (one document per rover, keyed by rover ID)
//! - Rover logs (append-only, one document per update)
//! - GNSS logs (append-only, written by an external producer)

use super::{collections, new_document_id, RoverStore};
use crate::error::AppError;
use crate::models::rover::{ID_FIELD, TIMESTAMP_FIELD};
use crate::models::{Fields, RoverUpdate, StoredDocument};
use crate::time_utils::format_utc_rfc3339;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Keys the client library injects when deserializing a document.
const CLIENT_METADATA_PREFIX: &str = "_firestore_";

/// Document body as written to Firestore.
///
/// The timestamp is stored as a native Firestore timestamp so it orders
/// correctly alongside documents from other writers.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TimestampedDocument {
    #[serde(flatten)]
    fields: Fields,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(with = "firestore::serialize_as_timestamp")]
    timestamp: DateTime<Utc>,
}

impl From<&RoverUpdate> for TimestampedDocument {
    fn from(update: &RoverUpdate) -> Self {
        Self {
            fields: update.fields.clone(),
            id: Some(update.id.clone()),
            timestamp: update.timestamp,
        }
    }
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client using application default credentials.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client authenticated with a raw service-account key.
    pub async fn with_service_account_key(
        project_id: &str,
        key_json: &str,
    ) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::Json(key_json.to_string()),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (service account key)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── GNSS Operations ─────────────────────────────────────────

    /// Append a GNSS fix with the given write time.
    ///
    /// Fixes normally come from an external producer; this exists for
    /// seeding and tests. Returns the generated document ID.
    pub async fn append_gnss_fix(
        &self,
        fields: &Fields,
        timestamp: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let fields: Fields = fields
            .iter()
            .filter(|(key, _)| key.as_str() != TIMESTAMP_FIELD)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let doc = TimestampedDocument {
            fields,
            id: None,
            timestamp,
        };
        let doc_id = new_document_id();

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::GNSS_LOGS)
            .document_id(&doc_id)
            .object(&doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(doc_id)
    }
}

/// Drop keys injected by the client library during deserialization.
fn strip_client_metadata(mut fields: Fields) -> Fields {
    fields.retain(|key, _| !key.starts_with(CLIENT_METADATA_PREFIX));
    fields
}

/// Rewrite the write time in the same format the API uses everywhere.
///
/// The client library renders native timestamps with `+00:00` and a
/// variable number of fractional digits. Values that are not RFC3339
/// strings (GNSS fixes come from other writers) are left alone.
fn normalize_timestamp(mut fields: Fields) -> Fields {
    if let Some(Value::String(raw)) = fields.get_mut(TIMESTAMP_FIELD) {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw.as_str()) {
            *raw = format_utc_rfc3339(parsed.with_timezone(&Utc));
        }
    }
    fields
}

/// Decoded document fields as returned by the API.
fn to_api_fields(fields: Fields) -> Fields {
    normalize_timestamp(strip_client_metadata(fields))
}

/// Convert a raw query result into a [`StoredDocument`].
fn to_stored_document(doc: &firestore::FirestoreDocument) -> Result<StoredDocument, AppError> {
    // `name` is the full resource path; the document ID is its last segment.
    let doc_id = doc.name.rsplit('/').next().unwrap_or_default().to_string();
    let fields: Fields = firestore::FirestoreDb::deserialize_doc_to(doc).map_err(|e| {
        AppError::Internal(anyhow::anyhow!("Failed to decode {}: {}", doc.name, e))
    })?;

    Ok(StoredDocument::new(doc_id, to_api_fields(fields)))
}

#[async_trait]
impl RoverStore for FirestoreDb {
    // ─── Rover State Operations ──────────────────────────────────

    async fn upsert_rover(&self, update: &RoverUpdate) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::ROVER)
            .document_id(&update.id)
            .object(&TimestampedDocument::from(update))
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn get_rover(&self, rover_id: &str) -> Result<Option<Fields>, AppError> {
        let doc: Option<Fields> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::ROVER)
            .obj()
            .one(rover_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(doc.map(to_api_fields))
    }

    // ─── Rover Log Operations ────────────────────────────────────

    async fn append_rover_log(&self, update: &RoverUpdate) -> Result<String, AppError> {
        let log_id = new_document_id();

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::ROVER_LOGS)
            .document_id(&log_id)
            .object(&TimestampedDocument::from(update))
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(log_id)
    }

    async fn rover_logs(&self, rover_id: &str) -> Result<Vec<StoredDocument>, AppError> {
        let docs: Vec<firestore::FirestoreDocument> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::ROVER_LOGS)
            .filter(|q| q.for_all([q.field(ID_FIELD).eq(rover_id)]))
            // Sort by write time descending
            .order_by([(
                TIMESTAMP_FIELD,
                firestore::FirestoreQueryDirection::Descending,
            )])
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        docs.iter().map(to_stored_document).collect()
    }

    // ─── Atomic Update ───────────────────────────────────────────

    /// Write the state document and the log entry in one transaction.
    ///
    /// Both writes are blind, so there is nothing to read first; the
    /// transaction only makes them commit or fail together.
    async fn commit_rover_update(&self, update: &RoverUpdate) -> Result<String, AppError> {
        let client = self.get_client()?;
        let doc = TimestampedDocument::from(update);
        let log_id = new_document_id();

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::ROVER)
            .document_id(&update.id)
            .object(&doc)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add rover state to transaction: {}", e))
            })?;

        client
            .fluent()
            .update()
            .in_col(collections::ROVER_LOGS)
            .document_id(&log_id)
            .object(&doc)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add rover log to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        Ok(log_id)
    }

    // ─── GNSS Operations ─────────────────────────────────────────

    async fn latest_gnss(&self) -> Result<Option<StoredDocument>, AppError> {
        let docs: Vec<firestore::FirestoreDocument> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::GNSS_LOGS)
            .order_by([(
                TIMESTAMP_FIELD,
                firestore::FirestoreQueryDirection::Descending,
            )])
            .limit(1)
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        docs.first().map(to_stored_document).transpose()
    }
}
