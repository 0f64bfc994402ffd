// system-tests/src/lib.rs
// ============================================================================
// Module: Digitalis System Tests Library
// Description: Claim presets and tag fixtures shared by system-test binaries.
// Purpose: Keep scenario inputs identical across suites.
// Dependencies: digitalis-core
// ============================================================================

//! ## Overview
//! This crate hosts the claim sets and payloads used by the scenarios in
//! `system-tests/tests`. Sessions and doubles come from `digitalis-harness`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod claims;
