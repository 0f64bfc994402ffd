// crates/digitalis-server/src/audit.rs
// ============================================================================
// Module: Digitalis Access Audit
// Description: Structured audit events for protected route decisions.
// Purpose: Emit one JSON line per access decision.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every request reaching a protected route produces one
//! [`AccessAuditEvent`]: an allow, a deny from the claim check, or a reject
//! from identity resolution. Sinks are trait objects so tests can record
//! events in memory.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;

use digitalis_core::Principal;
use serde::Serialize;

use crate::access::AccessDenied;
use crate::identity::IdentityError;

// ============================================================================
// SECTION: Events
// ============================================================================

/// Access audit event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Decision outcome (`allow`, `deny`, or `reject`).
    pub decision: &'static str,
    /// Route label (`METHOD /path`).
    pub route: String,
    /// Caller subject, when known.
    pub subject: Option<String>,
    /// Number of claims the caller presented.
    pub claim_count: usize,
    /// Failure reason for deny and reject events.
    pub reason: Option<String>,
}

impl AccessAuditEvent {
    /// Builds an allow event.
    #[must_use]
    pub fn allowed(route: &str, principal: &Principal) -> Self {
        Self {
            event: "entry_access",
            decision: "allow",
            route: route.to_string(),
            subject: principal.subject().map(str::to_string),
            claim_count: principal.claims().len(),
            reason: None,
        }
    }

    /// Builds a deny event for a failed claim check.
    #[must_use]
    pub fn denied(route: &str, principal: &Principal, denied: &AccessDenied) -> Self {
        Self {
            event: "entry_access",
            decision: "deny",
            route: route.to_string(),
            subject: principal.subject().map(str::to_string),
            claim_count: principal.claims().len(),
            reason: Some(denied.to_string()),
        }
    }

    /// Builds a reject event for unusable credentials.
    #[must_use]
    pub fn rejected(route: &str, error: &IdentityError) -> Self {
        Self {
            event: "entry_access",
            decision: "reject",
            route: route.to_string(),
            subject: None,
            claim_count: 0,
            reason: Some(error.to_string()),
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for access decisions.
pub trait AuditSink: Send + Sync {
    /// Records one event.
    fn record(&self, event: &AccessAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: &AccessAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// No-op audit sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &AccessAuditEvent) {}
}
