// crates/digitalis-config/src/examples.rs
// ============================================================================
// Module: Digitalis Config Examples
// Description: Canonical example configuration.
// Purpose: Provide a documented starting point for digitalis.toml.
// Dependencies: none
// ============================================================================

/// Returns an example `digitalis.toml` covering every section.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[server]
bind = "127.0.0.1:8080"
max_body_bytes = 1048576

[[server.auth.tokens]]
token = "replace-with-a-long-random-token"
subject = "entry-writer"
claims = [
  { type = "digitalis:entry:create" },
  { type = "digitalis:entry:fetch" },
]

[[server.auth.tokens]]
token = "replace-with-another-random-token"
subject = "entry-reader"
claims = [{ type = "digitalis:entry:fetch" }]

[store]
type = "sqlite"
path = "digitalis.db"
journal_mode = "wal"
sync_mode = "full"
busy_timeout_ms = 5000
index_poll_interval_ms = 10
index_batch_size = 64

[notifications]
sender = "digitalis@localhost"
recipient = "entries@localhost"
"#,
    )
}
