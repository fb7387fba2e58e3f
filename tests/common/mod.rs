// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use rover_telemetry::config::{Config, WriteMode};
use rover_telemetry::db::{FirestoreDb, MemoryDb, RoverStore};
use rover_telemetry::routes::create_router;
use rover_telemetry::services::RoverService;
use rover_telemetry::AppState;
use std::sync::Arc;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

fn app_with_store(store: Arc<dyn RoverStore>, write_mode: WriteMode) -> axum::Router {
    let config = Config {
        write_mode,
        ..Config::test_default()
    };
    let rovers = RoverService::new(store, write_mode);

    create_router(Arc::new(AppState { config, rovers }))
}

/// Create a test app backed by an in-memory store.
/// Returns the router and the store, for seeding GNSS fixes and counting writes.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<MemoryDb>) {
    create_test_app_with_mode(WriteMode::Sequential)
}

#[allow(dead_code)]
pub fn create_test_app_with_mode(write_mode: WriteMode) -> (axum::Router, Arc<MemoryDb>) {
    let db = Arc::new(MemoryDb::new());
    (app_with_store(db.clone(), write_mode), db)
}

/// Create a test app whose store fails every call (offline Firestore).
#[allow(dead_code)]
pub fn create_offline_test_app() -> axum::Router {
    app_with_store(Arc::new(FirestoreDb::new_mock()), WriteMode::Sequential)
}

#[allow(dead_code)]
pub async fn get(app: &axum::Router, uri: &str) -> Response<Body> {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

#[allow(dead_code)]
pub async fn post_rover(app: &axum::Router, body: impl Into<Body>) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/rover")
                .header("content-type", "application/json")
                .body(body.into())
                .unwrap(),
        )
        .await
        .unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Post an update and assert it was accepted.
#[allow(dead_code)]
pub async fn post_ok(app: &axum::Router, body: serde_json::Value) {
    let response = post_rover(app, body.to_string()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
}
