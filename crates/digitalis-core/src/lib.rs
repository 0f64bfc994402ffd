// crates/digitalis-core/src/lib.rs
// ============================================================================
// Module: Digitalis Core Library
// Description: Public API surface for the Digitalis core.
// Purpose: Expose claim, entry, and document types plus backend interfaces.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Digitalis core defines the vocabulary shared by the HTTP service and its
//! verification harness: claims and principals, the entry model, and the
//! document store and mailer interfaces. It also ships an in-memory document
//! store whose secondary index is maintained asynchronously, mirroring the
//! eventual consistency of a production document database.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::DocumentStore;
pub use interfaces::IndexQuery;
pub use interfaces::IndexStats;
pub use interfaces::MailError;
pub use interfaces::MailMessage;
pub use interfaces::Mailer;
pub use interfaces::StoreError;
pub use interfaces::StoredDocument;
pub use runtime::InMemoryDocumentStore;
pub use runtime::NoopMailer;
pub use runtime::SharedDocumentStore;
pub use runtime::SharedMailer;
