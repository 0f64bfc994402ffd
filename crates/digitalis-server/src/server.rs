// crates/digitalis-server/src/server.rs
// ============================================================================
// Module: Digitalis Server Composition
// Description: Router assembly and the production server entry point.
// Purpose: Install dependencies once, then serve the entry routes over HTTP.
// Dependencies: axum, digitalis-core, digitalis-config, digitalis-store-sqlite, tokio
// ============================================================================

//! ## Overview
//! [`ServerComponents`] is the composition root. It owns every dependency the
//! routes use and turns them into an axum [`Router`]. Because the components
//! are moved into the router, nothing can be swapped once serving starts.
//! [`DigitalisServer`] is the production composition built from
//! [`DigitalisConfig`].
//!
//! ## Invariants
//! - Identity resolution runs before every entry handler.
//! - `GET /health` bypasses identity resolution.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::routing::post;
use digitalis_config::DigitalisConfig;
use digitalis_config::NotificationConfig;
use digitalis_config::StoreConfig;
use digitalis_config::StoreType;
use digitalis_core::InMemoryDocumentStore;
use digitalis_core::SharedDocumentStore;
use digitalis_core::SharedMailer;
use digitalis_store_sqlite::SqliteDocumentStore;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::audit::AuditSink;
use crate::audit::NoopAuditSink;
use crate::audit::StderrAuditSink;
use crate::entries::create_entry;
use crate::entries::fetch_entry;
use crate::entries::health;
use crate::entries::list_entries;
use crate::identity::BearerTokenIdentity;
use crate::identity::SharedIdentityPolicy;
use crate::identity::resolve_identity;
use crate::mail::StderrMailer;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Server composition and transport errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration is invalid.
    #[error("config error: {0}")]
    Config(String),
    /// A dependency failed to initialize.
    #[error("init error: {0}")]
    Init(String),
    /// Listener or connection failure.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Application State
// ============================================================================

/// State shared by every request handler.
#[derive(Clone)]
pub(crate) struct AppState {
    /// Document store for entries.
    pub(crate) store: SharedDocumentStore,
    /// Outbound notification mailer.
    pub(crate) mailer: SharedMailer,
    /// Identity policy run ahead of protected handlers.
    pub(crate) identity: SharedIdentityPolicy,
    /// Audit sink for access decisions.
    pub(crate) audit: Arc<dyn AuditSink>,
    /// Notification addressing.
    pub(crate) notifications: NotificationConfig,
}

// ============================================================================
// SECTION: Components
// ============================================================================

/// Dependencies installed into one server instance.
pub struct ServerComponents {
    /// Document store for entries.
    store: SharedDocumentStore,
    /// Outbound notification mailer.
    mailer: SharedMailer,
    /// Identity policy.
    identity: SharedIdentityPolicy,
    /// Audit sink.
    audit: Arc<dyn AuditSink>,
    /// Notification addressing.
    notifications: NotificationConfig,
    /// Request body limit.
    max_body_bytes: usize,
}

impl ServerComponents {
    /// Builds components with the required dependencies and default settings.
    #[must_use]
    pub fn new(
        store: SharedDocumentStore,
        mailer: SharedMailer,
        identity: SharedIdentityPolicy,
    ) -> Self {
        let defaults = DigitalisConfig::default();
        Self {
            store,
            mailer,
            identity,
            audit: Arc::new(NoopAuditSink),
            notifications: defaults.notifications,
            max_body_bytes: defaults.server.max_body_bytes,
        }
    }

    /// Replaces the audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Replaces notification addressing.
    #[must_use]
    pub fn with_notifications(mut self, notifications: NotificationConfig) -> Self {
        self.notifications = notifications;
        self
    }

    /// Replaces the request body limit.
    #[must_use]
    pub const fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Returns the installed document store.
    #[must_use]
    pub const fn store(&self) -> &SharedDocumentStore {
        &self.store
    }

    /// Builds the HTTP router.
    #[must_use]
    pub fn into_router(self) -> Router {
        let max_body_bytes = self.max_body_bytes;
        let state = AppState {
            store: self.store,
            mailer: self.mailer,
            identity: self.identity,
            audit: self.audit,
            notifications: self.notifications,
        };
        Router::new()
            .route("/entry", post(create_entry).get(fetch_entry))
            .route("/entries", get(list_entries))
            .route_layer(from_fn_with_state(state.clone(), resolve_identity))
            .route("/health", get(health))
            .layer(DefaultBodyLimit::max(max_body_bytes))
            .with_state(state)
    }
}

impl std::fmt::Debug for ServerComponents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerComponents")
            .field("store", &self.store)
            .field("mailer", &self.mailer)
            .field("notifications", &self.notifications)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SECTION: Store Selection
// ============================================================================

/// Builds the configured document store.
///
/// # Errors
///
/// Returns [`ServerError`] when the store cannot be opened.
pub fn build_document_store(config: &StoreConfig) -> Result<SharedDocumentStore, ServerError> {
    match config.store_type {
        StoreType::Memory => {
            let store =
                InMemoryDocumentStore::new().map_err(|err| ServerError::Init(err.to_string()))?;
            Ok(SharedDocumentStore::from_store(store))
        }
        StoreType::Sqlite => {
            let sqlite = config
                .sqlite_config()
                .ok_or_else(|| ServerError::Config("sqlite store requires path".to_string()))?;
            let store =
                SqliteDocumentStore::new(sqlite).map_err(|err| ServerError::Init(err.to_string()))?;
            Ok(SharedDocumentStore::from_store(store))
        }
    }
}

// ============================================================================
// SECTION: Serving
// ============================================================================

/// Serves `router` on `listener` until `shutdown` resolves.
///
/// In-flight requests drain before this returns.
///
/// # Errors
///
/// Returns [`ServerError::Transport`] when serving fails.
pub async fn serve_router<F>(
    listener: TcpListener,
    router: Router,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|err| ServerError::Transport(err.to_string()))
}

/// Production server built from configuration.
pub struct DigitalisServer {
    /// Listen address.
    bind: SocketAddr,
    /// Composed router.
    router: Router,
}

impl DigitalisServer {
    /// Validates configuration and composes production dependencies.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when configuration is invalid or the store
    /// cannot be opened.
    pub fn from_config(config: DigitalisConfig) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let bind = config.server.bind_addr().map_err(|err| ServerError::Config(err.to_string()))?;
        let store = build_document_store(&config.store)?;
        let identity = BearerTokenIdentity::from_config(&config.server.auth);
        if identity.is_empty() {
            emit_event(&serde_json::json!({
                "event": "server_warning",
                "message": "no bearer tokens configured; every entry route will answer 401",
            }));
        }
        let router = ServerComponents::new(
            store,
            SharedMailer::from_mailer(StderrMailer),
            Arc::new(identity),
        )
        .with_audit(Arc::new(StderrAuditSink))
        .with_notifications(config.notifications)
        .with_max_body_bytes(config.server.max_body_bytes)
        .into_router();
        Ok(Self {
            bind,
            router,
        })
    }

    /// Returns the configured listen address.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        self.bind
    }

    /// Binds the listener and serves until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.bind)
            .await
            .map_err(|err| ServerError::Transport(format!("bind {}: {err}", self.bind)))?;
        let local = listener.local_addr().map_err(|err| ServerError::Transport(err.to_string()))?;
        emit_event(&serde_json::json!({
            "event": "server_listening",
            "addr": local.to_string(),
        }));
        serve_router(listener, self.router, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
    }
}

/// Writes one JSON event line to stderr.
fn emit_event(event: &serde_json::Value) {
    let _ = writeln!(std::io::stderr(), "{event}");
}
