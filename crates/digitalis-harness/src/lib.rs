// crates/digitalis-harness/src/lib.rs
// ============================================================================
// Module: Digitalis Harness Library
// Description: Authorization and consistency harness for the entry service.
// Purpose: Run the real router in-process with injected identities and doubles.
// Dependencies: digitalis-core, digitalis-server, reqwest, tokio
// ============================================================================

//! ## Overview
//! A test composes [`DependencyOverrides`] for storage and notification,
//! picks an identity policy (usually [`ClaimsInjector::per_client`]), and
//! starts a [`ServerSession`]. The session hands out [`ClientHandle`]s, each
//! bound to one [`digitalis_core::ClaimSet`] or to no identity at all.
//! Reads that go through the secondary index must be preceded by
//! [`ServerSession::await_convergence`].
//!
//! The injector only exists in this crate. Production composition in
//! `digitalis-server` never constructs it.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod client;
pub mod codec;
pub mod config;
pub mod convergence;
pub mod doubles;
pub mod injector;
pub mod overrides;
pub mod pause;
pub mod session;

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use client::ClientHandle;
pub use client::HarnessResponse;
pub use codec::CodecError;
pub use codec::decode;
pub use codec::decode_text;
pub use codec::encode;
pub use config::HarnessConfig;
pub use config::HarnessEnv;
pub use convergence::ConvergenceError;
pub use convergence::DEFAULT_CONVERGENCE_TIMEOUT;
pub use convergence::await_convergence;
pub use doubles::RecordingAuditSink;
pub use doubles::RecordingMailer;
pub use injector::CLAIMS_HEADER;
pub use injector::ClaimsInjector;
pub use overrides::CompositionError;
pub use overrides::DependencyOverride;
pub use overrides::DependencyOverrides;
pub use overrides::DependencyRole;
pub use pause::wait_for_user_to_continue;
pub use session::SHUTDOWN_TIMEOUT;
pub use session::ServerSession;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Harness failures surfaced to tests.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Session composition is incomplete.
    #[error(transparent)]
    Composition(#[from] CompositionError),
    /// The server did not come up.
    #[error("server startup failed: {0}")]
    Startup(String),
    /// An HTTP exchange failed below the status-code level.
    #[error("transport error: {0}")]
    Transport(String),
    /// The secondary index did not converge.
    #[error(transparent)]
    Convergence(#[from] ConvergenceError),
    /// Payload encoding or decoding failed.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// Harness environment is invalid.
    #[error("harness config error: {0}")]
    Config(String),
}
