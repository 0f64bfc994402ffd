// crates/digitalis-core/src/runtime/mail.rs
// ============================================================================
// Module: Digitalis Mailers
// Description: No-op and shared mailer implementations.
// Purpose: Let compositions pass one mailer instance to every request.
// Dependencies: crate::interfaces, async-trait
// ============================================================================

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;

use crate::interfaces::MailError;
use crate::interfaces::MailMessage;
use crate::interfaces::Mailer;

// ============================================================================
// SECTION: Mailers
// ============================================================================

/// Mailer that accepts and discards every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send(&self, _message: MailMessage) -> Result<(), MailError> {
        Ok(())
    }
}

/// Shared mailer backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedMailer {
    /// Inner mailer implementation.
    inner: Arc<dyn Mailer>,
}

impl SharedMailer {
    /// Wraps a mailer in a shared, clonable wrapper.
    #[must_use]
    pub fn from_mailer(mailer: impl Mailer + 'static) -> Self {
        Self {
            inner: Arc::new(mailer),
        }
    }

    /// Wraps an existing shared mailer.
    #[must_use]
    pub const fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self {
            inner: mailer,
        }
    }
}

impl std::fmt::Debug for SharedMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedMailer").finish_non_exhaustive()
    }
}

#[async_trait]
impl Mailer for SharedMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        self.inner.send(message).await
    }
}
