// crates/digitalis-harness/src/doubles.rs
// ============================================================================
// Module: Harness Test Doubles
// Description: Recording mailer and audit sink.
// Purpose: Let tests assert on side effects the server produced.
// Dependencies: async-trait, digitalis-core, digitalis-server
// ============================================================================

//! ## Overview
//! [`RecordingMailer`] and [`RecordingAuditSink`] stand in for the production
//! notification and audit dependencies. Both keep what they receive behind a
//! mutex so tests can inspect it after the request returns.
//!
//! ## Invariants
//! - A failing mailer records nothing and returns its configured reason.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use async_trait::async_trait;
use digitalis_core::MailError;
use digitalis_core::MailMessage;
use digitalis_core::Mailer;
use digitalis_server::AccessAuditEvent;
use digitalis_server::AuditSink;

// ============================================================================
// SECTION: Mailer
// ============================================================================

/// Mailer that records messages instead of sending them.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    /// Messages accepted so far.
    messages: Mutex<Vec<MailMessage>>,
    /// Delivery failure to report instead of recording.
    failure: Option<String>,
}

impl RecordingMailer {
    /// Creates a mailer that accepts every message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mailer that rejects every message with `reason`.
    #[must_use]
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            failure: Some(reason.into()),
        }
    }

    /// Returns recorded messages in send order.
    #[must_use]
    pub fn messages(&self) -> Vec<MailMessage> {
        lock(&self.messages).clone()
    }

    /// Returns the number of recorded messages.
    #[must_use]
    pub fn count(&self) -> usize {
        lock(&self.messages).len()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        if let Some(reason) = &self.failure {
            return Err(MailError::Delivery(reason.clone()));
        }
        lock(&self.messages).push(message);
        Ok(())
    }
}

// ============================================================================
// SECTION: Audit
// ============================================================================

/// Audit sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingAuditSink {
    /// Recorded events.
    events: Mutex<Vec<AccessAuditEvent>>,
}

impl RecordingAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns recorded events in order.
    #[must_use]
    pub fn events(&self) -> Vec<AccessAuditEvent> {
        lock(&self.events).clone()
    }

    /// Returns the recorded decisions in order.
    #[must_use]
    pub fn decisions(&self) -> Vec<&'static str> {
        lock(&self.events).iter().map(|event| event.decision).collect()
    }
}

impl AuditSink for RecordingAuditSink {
    fn record(&self, event: &AccessAuditEvent) {
        lock(&self.events).push(event.clone());
    }
}

/// Locks a mutex, recovering the data if a holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
