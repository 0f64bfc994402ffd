// system-tests/tests/helpers/mod.rs
// ============================================================================
// Module: System Test Helpers
// Description: Shared session fixtures for Digitalis system-tests.
// Purpose: Start sessions with recording doubles in one call.
// Dependencies: digitalis-harness, digitalis-core
// ============================================================================

#![allow(dead_code, reason = "Shared helpers are reused across multiple test suites.")]

pub mod fixture;
