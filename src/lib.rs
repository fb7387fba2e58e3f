// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rover telemetry backend.
//!
//! Records rover state updates in a document store, keeps an append-only
//! log of every update, and serves the latest GNSS fix.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::RoverService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub rovers: RoverService,
}
