// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Documents read back from an append-only collection.

use super::Fields;

/// A document together with the identifier the store assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    /// Storage-assigned document ID
    pub doc_id: String,
    /// Stored fields, without any client metadata
    pub fields: Fields,
}

impl StoredDocument {
    pub fn new(doc_id: impl Into<String>, fields: Fields) -> Self {
        Self {
            doc_id: doc_id.into(),
            fields,
        }
    }

    /// Flatten into a single object with the document ID under `key`.
    ///
    /// The storage ID wins over a stored field of the same name and is
    /// emitted first.
    pub fn tagged(self, key: &str) -> Fields {
        let mut out = Fields::new();
        out.insert(key.to_string(), self.doc_id.into());
        out.extend(self.fields.into_iter().filter(|(k, _)| k != key));
        out
    }
}
