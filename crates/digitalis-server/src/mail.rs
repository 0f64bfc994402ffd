// crates/digitalis-server/src/mail.rs
// ============================================================================
// Module: Digitalis Notifications
// Description: Entry-created notification content and the stderr transport.
// Purpose: Build the one message sent per created entry.
// Dependencies: digitalis-core, digitalis-config, async-trait, serde_json
// ============================================================================

//! ## Overview
//! Entry creation sends exactly one notification. [`entry_created_message`]
//! builds it from the configured sender and recipient, and [`StderrMailer`]
//! writes it to stderr as a JSON line.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;

use async_trait::async_trait;
use digitalis_config::NotificationConfig;
use digitalis_core::EntryId;
use digitalis_core::MailError;
use digitalis_core::MailMessage;
use digitalis_core::Mailer;

// ============================================================================
// SECTION: Messages
// ============================================================================

/// Builds the notification sent after an entry is created.
#[must_use]
pub fn entry_created_message(
    notifications: &NotificationConfig,
    id: &EntryId,
    tags: &[String],
) -> MailMessage {
    let tag_line = if tags.is_empty() { "(none)".to_string() } else { tags.join(", ") };
    MailMessage {
        from: notifications.sender.clone(),
        to: notifications.recipient.clone(),
        subject: format!("Entry created: {id}"),
        body: format!("A new entry was created.\n\nId: {id}\nTags: {tag_line}\n"),
    }
}

// ============================================================================
// SECTION: Transports
// ============================================================================

/// Mailer that writes each message as a JSON line to stderr.
///
/// Used by the CLI when no outbound transport is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrMailer;

#[async_trait]
impl Mailer for StderrMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        let event = serde_json::json!({
            "event": "mail_outbound",
            "message": message,
        });
        writeln!(std::io::stderr(), "{event}").map_err(|err| MailError::Delivery(err.to_string()))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
