// crates/digitalis-core/src/core/mod.rs
// ============================================================================
// Module: Digitalis Core Types
// Description: Canonical claim, principal, entry, and document types.
// Purpose: Provide stable, serializable types shared by server and harness.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Core types are plain values with no I/O. Claims describe what a caller may
//! do, principals bind a claim set to an authentication state, and entries are
//! the business documents persisted through [`crate::DocumentStore`].

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod claims;
pub mod documents;
pub mod entry;
pub mod principal;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use claims::Claim;
pub use claims::ClaimSet;
pub use claims::DigitalisClaims;
pub use documents::DocumentId;
pub use documents::index_terms;
pub use entry::CreateEntryCommand;
pub use entry::ENTRY_COLLECTION;
pub use entry::Entry;
pub use entry::EntryError;
pub use entry::EntryId;
pub use entry::MAX_TAG_LENGTH;
pub use entry::MAX_TAGS;
pub use principal::Authentication;
pub use principal::Principal;
