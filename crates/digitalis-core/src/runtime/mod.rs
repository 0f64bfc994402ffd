// crates/digitalis-core/src/runtime/mod.rs
// ============================================================================
// Module: Digitalis Runtime
// Description: In-process implementations of the core interfaces.
// Purpose: Provide the in-memory store, no-op mailer, and shared wrappers.
// Dependencies: crate::interfaces
// ============================================================================

pub mod mail;
pub mod store;

pub use mail::NoopMailer;
pub use mail::SharedMailer;
pub use store::InMemoryDocumentStore;
pub use store::SharedDocumentStore;
