// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Read once at startup. A `.env` file is honored for local development.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Which document store backs the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Google Cloud Firestore (or its emulator)
    Firestore,
    /// In-process store; data is lost on restart
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "memory" => Ok(Self::Memory),
            _ => Err(()),
        }
    }
}

/// How a rover update's two writes are committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// State upsert, then log append. A failure in between leaves them out of step.
    #[default]
    Sequential,
    /// Both writes in one transaction.
    Transactional,
}

impl FromStr for WriteMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "transactional" => Ok(Self::Transactional),
            _ => Err(()),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Document store backend
    pub store_backend: StoreBackend,
    /// GCP project ID (required for Firestore)
    pub gcp_project_id: String,
    /// Raw service-account JSON; application default credentials when unset
    pub firebase_key: Option<String>,
    /// Commit policy for rover updates
    pub write_mode: WriteMode,
    /// Directory holding `index.html` and other static assets
    pub static_dir: PathBuf,
    /// Extra origin allowed by CORS (localhost is always allowed)
    pub frontend_url: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("store_backend", &self.store_backend)
            .field("gcp_project_id", &self.gcp_project_id)
            .field("firebase_key", &self.firebase_key.as_ref().map(|_| "<redacted>"))
            .field("write_mode", &self.write_mode)
            .field("static_dir", &self.static_dir)
            .field("frontend_url", &self.frontend_url)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let store_backend = parse_var("STORE_BACKEND", StoreBackend::Firestore)?;
        let firebase_key = env::var("FIREBASE_KEY")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let gcp_project_id = match env::var("GCP_PROJECT_ID") {
            Ok(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => match firebase_key.as_deref().map(project_id_from_key).transpose()? {
                Some(id) => id,
                None if store_backend == StoreBackend::Memory => "local-dev".to_string(),
                None => return Err(ConfigError::Missing("GCP_PROJECT_ID")),
            },
        };

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            store_backend,
            gcp_project_id,
            firebase_key,
            write_mode: parse_var("ROVER_WRITE_MODE", WriteMode::default())?,
            static_dir: env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("static")),
            frontend_url: env::var("FRONTEND_URL").ok().filter(|v| !v.is_empty()),
        })
    }

    /// Memory-backed config for tests.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            store_backend: StoreBackend::Memory,
            gcp_project_id: "test-project".to_string(),
            firebase_key: None,
            write_mode: WriteMode::Sequential,
            static_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("static"),
            frontend_url: Some("http://localhost:5173".to_string()),
        }
    }
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value.parse().map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

/// Pull `project_id` out of a service-account key.
fn project_id_from_key(key_json: &str) -> Result<String, ConfigError> {
    let key: serde_json::Value = serde_json::from_str(key_json)
        .map_err(|e| ConfigError::InvalidKey(e.to_string()))?;

    key.get("project_id")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ConfigError::InvalidKey("missing project_id".to_string()))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("Invalid FIREBASE_KEY: {0}")]
    InvalidKey(String),
}
