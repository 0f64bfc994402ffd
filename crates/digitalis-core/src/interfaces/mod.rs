// crates/digitalis-core/src/interfaces/mod.rs
// ============================================================================
// Module: Digitalis Interfaces
// Description: Backend-agnostic interfaces for document storage and mail.
// Purpose: Define the seams the server composes and the harness overrides.
// Dependencies: crate::core, async-trait, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The server never talks to a concrete backend. It holds a
//! [`DocumentStore`] and a [`Mailer`], both installed at composition time, so
//! tests can substitute controllable doubles for either one.
//!
//! Document stores are eventually consistent: [`DocumentStore::store`] makes a
//! document loadable by id immediately, while [`DocumentStore::query`] only
//! sees documents once the store's secondary index has processed them.
//! [`DocumentStore::index_stats`] reports the outstanding index work.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::DocumentId;

// ============================================================================
// SECTION: Document Store
// ============================================================================

/// Document store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("document store io error: {0}")]
    Io(String),
    /// Store data is corrupted.
    #[error("document store corruption: {0}")]
    Corrupt(String),
    /// Caller supplied invalid input.
    #[error("document store invalid data: {0}")]
    Invalid(String),
    /// Store reported an error.
    #[error("document store error: {0}")]
    Store(String),
}

/// Query served by the secondary index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexQuery {
    /// Match one document by identifier.
    ById {
        /// Collection to search.
        collection: String,
        /// Document identifier.
        id: DocumentId,
    },
    /// Match documents whose indexed field contains the term.
    Term {
        /// Collection to search.
        collection: String,
        /// Indexed field name.
        field: String,
        /// Exact term to match.
        term: String,
    },
}

impl IndexQuery {
    /// Builds an identifier query.
    #[must_use]
    pub fn by_id(collection: impl Into<String>, id: DocumentId) -> Self {
        Self::ById {
            collection: collection.into(),
            id,
        }
    }

    /// Builds a term query.
    #[must_use]
    pub fn by_term(
        collection: impl Into<String>,
        field: impl Into<String>,
        term: impl Into<String>,
    ) -> Self {
        Self::Term {
            collection: collection.into(),
            field: field.into(),
            term: term.into(),
        }
    }

    /// Returns the collection the query targets.
    #[must_use]
    pub fn collection(&self) -> &str {
        match self {
            Self::ById {
                collection, ..
            }
            | Self::Term {
                collection, ..
            } => collection,
        }
    }
}

/// Document returned by a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    /// Document identifier.
    pub id: DocumentId,
    /// JSON body as written.
    pub body: Value,
}

/// Snapshot of secondary index progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Documents written but not yet visible to queries.
    pub pending: u64,
    /// Documents visible to queries.
    pub indexed_documents: u64,
    /// True when indexing is paused.
    pub paused: bool,
}

impl IndexStats {
    /// Returns true when no index work is outstanding.
    #[must_use]
    pub const fn is_converged(&self) -> bool {
        self.pending == 0
    }
}

/// Eventually consistent document store.
///
/// # Invariants
/// - Identifiers are allocated per collection, starting at 1, never reused.
/// - A stored document is loadable immediately and queryable once indexed.
/// - Query results are ordered by write order.
pub trait DocumentStore: Send + Sync {
    /// Persists a new document and returns its allocated identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn store(&self, collection: &str, body: Value) -> Result<DocumentId, StoreError>;

    /// Loads a document by identifier, bypassing the secondary index.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn load(&self, id: &DocumentId) -> Result<Option<StoredDocument>, StoreError>;

    /// Runs a query against the secondary index.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn query(&self, query: &IndexQuery) -> Result<Vec<StoredDocument>, StoreError>;

    /// Reports secondary index progress.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when stats cannot be read.
    fn index_stats(&self) -> Result<IndexStats, StoreError>;

    /// Reports store readiness for health probes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store is unavailable.
    fn readiness(&self) -> Result<(), StoreError> {
        self.index_stats().map(|_| ())
    }
}

// ============================================================================
// SECTION: Mailer
// ============================================================================

/// Outbound mail errors.
#[derive(Debug, Error)]
pub enum MailError {
    /// Message was rejected before delivery.
    #[error("mail rejected: {0}")]
    Rejected(String),
    /// Delivery failed.
    #[error("mail delivery failed: {0}")]
    Delivery(String),
}

/// Outbound notification message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailMessage {
    /// Sender address.
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

/// Outbound mail transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends one message.
    ///
    /// # Errors
    ///
    /// Returns [`MailError`] when the message cannot be delivered.
    async fn send(&self, message: MailMessage) -> Result<(), MailError>;
}
