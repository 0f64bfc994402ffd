// crates/digitalis-config/src/lib.rs
// ============================================================================
// Module: Digitalis Config Library
// Description: Canonical config model, loading, and validation.
// Purpose: Single source of truth for digitalis.toml semantics.
// Dependencies: digitalis-core, digitalis-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `digitalis-config` defines the configuration model for the Digitalis
//! server: listener settings, static bearer-token grants, the document store
//! backend, and notification addresses. Loading is size-limited, requires
//! UTF-8, and fails closed on any validation error.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
