// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rover state and rover log routes.

use crate::error::Result;
use crate::models::{Fields, RoverUpdate};
use crate::routes::response::ApiResponse;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

/// Rover routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/rover", post(create_or_update_rover))
        .route("/rover/{doc_id}", get(get_rover))
        .route("/rover-logs/{rover_id}", get(get_logs_for_rover))
}

/// Create or update a rover (POST).
///
/// The body is read raw so that a missing or malformed body is reported as
/// 400 with the usual envelope, whatever the content type.
async fn create_or_update_rover(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<ApiResponse<()>>)> {
    let update = RoverUpdate::from_slice(&body, chrono::Utc::now()).inspect_err(|e| {
        tracing::debug!(error = %e, "Rejected rover update");
    })?;

    state.rovers.record_update(&update).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::message("Rover updated and logged")),
    ))
}

/// Get the current state of a rover.
async fn get_rover(
    State(state): State<Arc<AppState>>,
    Path(doc_id): Path<String>,
) -> Result<Json<ApiResponse<Fields>>> {
    let rover = state.rovers.get_rover(&doc_id).await?;
    Ok(Json(ApiResponse::data(rover)))
}

/// Get all log entries for a rover, most recent first.
async fn get_logs_for_rover(
    State(state): State<Arc<AppState>>,
    Path(rover_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Fields>>>> {
    let logs = state.rovers.rover_logs(&rover_id).await?;
    Ok(Json(ApiResponse::data(logs)))
}
