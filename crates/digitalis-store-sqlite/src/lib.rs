// crates/digitalis-store-sqlite/src/lib.rs
// ============================================================================
// Module: Digitalis SQLite Document Store
// Description: Durable DocumentStore backend using SQLite.
// Purpose: Persist entries across restarts with an eventually consistent index.
// Dependencies: digitalis-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`digitalis_core::DocumentStore`].
//! Writes land in the `documents` table together with an `index_queue` row in
//! one transaction; a background indexer thread drains the queue into the
//! secondary index tables. Queries only read the index tables, so they lag
//! writes until the queue is empty.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::MAX_DOCUMENT_BYTES;
pub use store::SqliteDocumentStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
