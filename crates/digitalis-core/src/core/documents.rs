// crates/digitalis-core/src/core/documents.rs
// ============================================================================
// Module: Digitalis Documents
// Description: Document identifiers and index term extraction.
// Purpose: Share document addressing and indexing rules across store backends.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Documents are JSON objects grouped into collections. Identifiers take the
//! form `{collection}/{sequence}` where the sequence is allocated by the store
//! per collection, starting at 1. Every backend indexes the same terms,
//! produced by [`index_terms`]: each top-level string field, and each string
//! element of a top-level array field.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Document Identifier
// ============================================================================

/// Store-assigned document identifier (`{collection}/{sequence}`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Builds the identifier for a collection sequence number.
    #[must_use]
    pub fn from_sequence(collection: &str, sequence: u64) -> Self {
        Self(format!("{collection}/{sequence}"))
    }

    /// Wraps a raw identifier string without validation.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the collection prefix, when the identifier is well formed.
    #[must_use]
    pub fn collection(&self) -> Option<&str> {
        let (collection, sequence) = self.0.rsplit_once('/')?;
        if collection.is_empty() || sequence.parse::<u64>().is_err() {
            return None;
        }
        Some(collection)
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Index Terms
// ============================================================================

/// Extracts `(field, term)` pairs indexed for a document body.
///
/// Non-object bodies produce no terms. Nested objects and non-string scalars
/// are not indexed.
#[must_use]
pub fn index_terms(body: &Value) -> Vec<(String, String)> {
    let Some(object) = body.as_object() else {
        return Vec::new();
    };
    let mut terms = Vec::new();
    for (field, value) in object {
        match value {
            Value::String(term) => terms.push((field.clone(), term.clone())),
            Value::Array(items) => {
                for item in items {
                    if let Value::String(term) = item {
                        terms.push((field.clone(), term.clone()));
                    }
                }
            }
            _ => {}
        }
    }
    terms
}

// ============================================================================
// SECTION: Tests
// ============================================================================
