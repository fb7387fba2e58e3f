// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rover Telemetry API Server
//!
//! Records rover state updates and serves rover logs and the latest GNSS fix.

use rover_telemetry::{
    config::{Config, StoreBackend},
    db::{FirestoreDb, MemoryDb, RoverStore},
    services::RoverService,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        backend = ?config.store_backend,
        write_mode = ?config.write_mode,
        "Starting Rover Telemetry API"
    );

    // Initialize the document store
    let store: Arc<dyn RoverStore> = match config.store_backend {
        StoreBackend::Firestore => {
            let db = match config.firebase_key.as_deref() {
                Some(key) => {
                    FirestoreDb::with_service_account_key(&config.gcp_project_id, key).await?
                }
                None => FirestoreDb::new(&config.gcp_project_id).await?,
            };
            Arc::new(db)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data will not survive a restart");
            Arc::new(MemoryDb::new())
        }
    };

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        rovers: RoverService::new(store, config.write_mode),
    });

    // Build router
    let app = rover_telemetry::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutdown signal received");
        })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rover_telemetry=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
