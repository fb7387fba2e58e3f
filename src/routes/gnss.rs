// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GNSS routes (read-only).

use crate::error::Result;
use crate::models::Fields;
use crate::routes::response::ApiResponse;
use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;

/// GNSS routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/gnss/latest", get(get_latest_gnss))
}

/// Get the most recent GNSS fix.
async fn get_latest_gnss(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse<Fields>>> {
    let latest = state.rovers.latest_gnss().await?;
    Ok(Json(ApiResponse::data(latest)))
}
