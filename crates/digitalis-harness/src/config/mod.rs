// crates/digitalis-harness/src/config/mod.rs
// ============================================================================
// Module: Harness Configuration
// Description: Environment-backed settings for harness sessions.
// Purpose: Provide typed access to timeout floors and the interactive pause.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Harness configuration is read from environment variables and mapped into a
//! small typed structure shared by sessions and convergence waits.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod env;

// ============================================================================
// SECTION: Tests
// ============================================================================


// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use env::HarnessConfig;
pub use env::HarnessEnv;
pub use env::read_env_strict;
