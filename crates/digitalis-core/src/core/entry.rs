// crates/digitalis-core/src/core/entry.rs
// ============================================================================
// Module: Digitalis Entries
// Description: Entry documents and the create-entry command.
// Purpose: Define the business payloads exchanged over the entry routes.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Entries are tagged documents stored in the [`ENTRY_COLLECTION`]
//! collection. Tag order is preserved exactly as submitted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::documents::DocumentId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Collection holding entry documents.
pub const ENTRY_COLLECTION: &str = "entries";
/// Maximum number of tags on one entry.
pub const MAX_TAGS: usize = 64;
/// Maximum length of one tag in bytes.
pub const MAX_TAG_LENGTH: usize = 128;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Entry identifier as returned by `POST /entry`.
pub type EntryId = DocumentId;

/// Command accepted by `POST /entry`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEntryCommand {
    /// Tags attached to the new entry.
    pub tags: Vec<String>,
}

impl CreateEntryCommand {
    /// Builds a command from tags.
    #[must_use]
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    /// Validates tag count and content.
    ///
    /// # Errors
    ///
    /// Returns [`EntryError::Invalid`] when limits are exceeded or a tag is blank.
    pub fn validate(&self) -> Result<(), EntryError> {
        if self.tags.len() > MAX_TAGS {
            return Err(EntryError::Invalid(format!(
                "too many tags: {} (max {MAX_TAGS})",
                self.tags.len()
            )));
        }
        for tag in &self.tags {
            if tag.trim().is_empty() {
                return Err(EntryError::Invalid("tags must not be blank".to_string()));
            }
            if tag.len() > MAX_TAG_LENGTH {
                return Err(EntryError::Invalid(format!(
                    "tag exceeds {MAX_TAG_LENGTH} bytes"
                )));
            }
        }
        Ok(())
    }

    /// Returns the stored document body for this command.
    ///
    /// # Errors
    ///
    /// Returns [`EntryError::Invalid`] when the body cannot be serialized.
    pub fn to_document(&self) -> Result<Value, EntryError> {
        serde_json::to_value(EntryDocument {
            tags: self.tags.clone(),
        })
        .map_err(|err| EntryError::Invalid(err.to_string()))
    }
}

/// Entry returned by `GET /entry`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Entry identifier.
    pub id: EntryId,
    /// Tags in submission order.
    pub tags: Vec<String>,
}

impl Entry {
    /// Rebuilds an entry from its identifier and stored document body.
    ///
    /// # Errors
    ///
    /// Returns [`EntryError::Corrupt`] when the body does not match the entry shape.
    pub fn from_document(id: EntryId, body: Value) -> Result<Self, EntryError> {
        let document: EntryDocument =
            serde_json::from_value(body).map_err(|err| EntryError::Corrupt(err.to_string()))?;
        Ok(Self {
            id,
            tags: document.tags,
        })
    }
}

/// Stored body of an entry document.
#[derive(Debug, Serialize, Deserialize)]
struct EntryDocument {
    /// Tags in submission order.
    tags: Vec<String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Entry validation and decoding errors.
#[derive(Debug, Error)]
pub enum EntryError {
    /// Command failed validation.
    #[error("invalid entry: {0}")]
    Invalid(String),
    /// Stored document does not decode as an entry.
    #[error("corrupt entry document: {0}")]
    Corrupt(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================
