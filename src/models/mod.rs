// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod document;
pub mod rover;

pub use document::StoredDocument;
pub use rover::RoverUpdate;

/// Schema-less document body as stored and returned.
pub type Fields = serde_json::Map<String, serde_json::Value>;
