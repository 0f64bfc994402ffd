// crates/digitalis-server/src/lib.rs
// ============================================================================
// Module: Digitalis Server Library
// Description: HTTP entry service with claims-based authorization.
// Purpose: Compose storage, mail, identity, and audit into an axum router.
// Dependencies: digitalis-core, digitalis-config, axum, tokio
// ============================================================================

//! ## Overview
//! The server exposes `POST /entry`, `GET /entry`, `GET /entries`, and
//! `GET /health`. Every dependency is installed through
//! [`ServerComponents`]: the document store, the mailer, the identity policy
//! that turns request headers into a [`digitalis_core::Principal`], and the
//! audit sink. Production composition happens in [`DigitalisServer`]; tests
//! build [`ServerComponents`] directly with their own doubles.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod access;
pub mod audit;
pub mod entries;
pub mod identity;
pub mod mail;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use access::AccessDenied;
pub use access::require_claim;
pub use audit::AccessAuditEvent;
pub use audit::AuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use entries::ApiError;
pub use identity::BEARER_SCHEME;
pub use identity::BearerTokenIdentity;
pub use identity::IdentityError;
pub use identity::IdentityPolicy;
pub use identity::SharedIdentityPolicy;
pub use mail::StderrMailer;
pub use mail::entry_created_message;
pub use server::DigitalisServer;
pub use server::ServerComponents;
pub use server::ServerError;
pub use server::build_document_store;
pub use server::serve_router;
