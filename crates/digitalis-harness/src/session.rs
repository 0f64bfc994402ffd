// crates/digitalis-harness/src/session.rs
// ============================================================================
// Module: Server Session
// Description: One in-process server bound to an identity policy and overrides.
// Purpose: Run the real router on loopback for the lifetime of a test.
// Dependencies: digitalis-server, reqwest, tokio, url
// ============================================================================

//! ## Overview
//! [`ServerSession::start`] composes the router from the override registry,
//! binds an ephemeral loopback port, and runs the server on a dedicated
//! thread with its own runtime. It returns only after `GET /health` answers,
//! so the first test request never races startup.
//!
//! ## Invariants
//! - Every client handle of a session talks to the same dependency instances.
//! - Teardown signals graceful shutdown, bounds the drain, and joins the
//!   server thread, so the port is free once teardown returns.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::Ipv4Addr;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use std::time::Instant;

use axum::Router;
use digitalis_core::ClaimSet;
use digitalis_core::IndexStats;
use digitalis_core::SharedDocumentStore;
use digitalis_server::SharedIdentityPolicy;
use digitalis_server::serve_router;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::sync::oneshot;
use url::Url;

use crate::HarnessError;
use crate::client::ClientHandle;
use crate::config::HarnessConfig;
use crate::convergence::DEFAULT_CONVERGENCE_TIMEOUT;
use crate::convergence::await_convergence;
use crate::overrides::DependencyOverrides;
use crate::pause::wait_for_user_to_continue;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Time allowed for the server to answer its first health probe.
const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(10);
/// Per-request timeout for client handles.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Upper bound on draining in-flight requests at teardown.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);
/// Delay between health probes during startup.
const HEALTH_POLL_INTERVAL: Duration = Duration::from_millis(10);
/// Timeout for a single health probe.
const PROBE_TIMEOUT: Duration = Duration::from_millis(500);
/// Worker threads for the session runtime.
const SERVER_WORKER_THREADS: usize = 2;

// ============================================================================
// SECTION: Session
// ============================================================================

/// Live in-process server for one test.
pub struct ServerSession {
    /// Bound loopback address.
    addr: SocketAddr,
    /// Base URL for client handles.
    base_url: Url,
    /// Storage shared with the running server.
    store: SharedDocumentStore,
    /// Harness environment settings.
    config: HarnessConfig,
    /// Connection pool shared by client handles.
    http: reqwest::Client,
    /// Shutdown trigger; `None` once signalled.
    shutdown: Option<oneshot::Sender<()>>,
    /// Server thread; `None` once joined.
    thread: Option<JoinHandle<Result<(), String>>>,
}

impl ServerSession {
    /// Starts a session using harness settings from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Composition`] when a required override is
    /// missing, [`HarnessError::Config`] when the environment is invalid, and
    /// [`HarnessError::Startup`] when the server does not come up.
    pub async fn start(
        overrides: DependencyOverrides,
        identity: SharedIdentityPolicy,
    ) -> Result<Self, HarnessError> {
        let config = HarnessConfig::load().map_err(HarnessError::Config)?;
        Self::start_with_config(overrides, identity, config).await
    }

    /// Starts a session with explicit harness settings.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Composition`] when a required override is
    /// missing and [`HarnessError::Startup`] when the server does not come up.
    pub async fn start_with_config(
        overrides: DependencyOverrides,
        identity: SharedIdentityPolicy,
        config: HarnessConfig,
    ) -> Result<Self, HarnessError> {
        let store = overrides.storage()?;
        let router = overrides.into_components(identity)?.into_router();

        let listener = std::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .map_err(|err| HarnessError::Startup(format!("bind loopback: {err}")))?;
        listener.set_nonblocking(true).map_err(|err| HarnessError::Startup(err.to_string()))?;
        let addr = listener.local_addr().map_err(|err| HarnessError::Startup(err.to_string()))?;
        let base_url = Url::parse(&format!("http://{addr}/"))
            .map_err(|err| HarnessError::Startup(err.to_string()))?;
        let http = reqwest::Client::builder()
            .no_proxy()
            .build()
            .map_err(|err| HarnessError::Startup(format!("http client: {err}")))?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let thread = std::thread::Builder::new()
            .name("digitalis-harness-server".to_string())
            .spawn(move || run_server(listener, router, shutdown_rx))
            .map_err(|err| HarnessError::Startup(format!("spawn server thread: {err}")))?;

        let mut session = Self {
            addr,
            base_url,
            store,
            http,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
            config,
        };
        let startup_timeout = session.config.timeout_or(DEFAULT_STARTUP_TIMEOUT);
        session.wait_until_ready(startup_timeout).await?;
        Ok(session)
    }

    /// Polls `GET /health` until it answers 200.
    async fn wait_until_ready(&mut self, timeout: Duration) -> Result<(), HarnessError> {
        let deadline = Instant::now() + timeout;
        let health = self
            .base_url
            .join("health")
            .map_err(|err| HarnessError::Startup(err.to_string()))?;
        loop {
            if self.thread.as_ref().is_some_and(JoinHandle::is_finished) {
                let reason = self.join_server().err().map_or_else(
                    || "server exited before becoming ready".to_string(),
                    |err| err.to_string(),
                );
                return Err(HarnessError::Startup(reason));
            }
            let probe = self.http.get(health.clone()).timeout(PROBE_TIMEOUT).send().await;
            if probe.is_ok_and(|response| response.status().is_success()) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(HarnessError::Startup(format!(
                    "health check did not pass within {}ms",
                    timeout.as_millis()
                )));
            }
            tokio::time::sleep(HEALTH_POLL_INTERVAL).await;
        }
    }

    /// Returns the bound address.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the session base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the storage instance the server uses.
    #[must_use]
    pub const fn store(&self) -> &SharedDocumentStore {
        &self.store
    }

    /// Returns the harness settings.
    #[must_use]
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Builds a client bound to `claims`, or an anonymous client for `None`.
    #[must_use]
    pub fn client(&self, claims: Option<ClaimSet>) -> ClientHandle {
        ClientHandle::new(
            self.http.clone(),
            self.base_url.clone(),
            claims,
            self.config.timeout_or(DEFAULT_REQUEST_TIMEOUT),
        )
    }

    /// Builds a client carrying `claims`.
    #[must_use]
    pub fn authenticated_client(&self, claims: ClaimSet) -> ClientHandle {
        self.client(Some(claims))
    }

    /// Builds a client with no identity.
    #[must_use]
    pub fn anonymous_client(&self) -> ClientHandle {
        self.client(None)
    }

    /// Waits for the secondary index using the default timeout.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Convergence`] on timeout or store failure.
    pub async fn await_convergence(&self) -> Result<IndexStats, HarnessError> {
        self.await_convergence_within(DEFAULT_CONVERGENCE_TIMEOUT).await
    }

    /// Waits for the secondary index for at most `timeout`, raised to the
    /// environment floor.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Convergence`] on timeout or store failure.
    pub async fn await_convergence_within(
        &self,
        timeout: Duration,
    ) -> Result<IndexStats, HarnessError> {
        let timeout = self.config.convergence_timeout_or(timeout);
        Ok(await_convergence(&self.store, timeout).await?)
    }

    /// Runs the interactive pause with this session's store and address.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError`] when the pause is enabled and fails.
    pub async fn pause_for_inspection(&self, label: &str) -> Result<bool, HarnessError> {
        let context = format!("{label} @ {}", self.base_url);
        wait_for_user_to_continue(&self.store, &self.config, &context).await
    }

    /// Stops the server and waits for its thread to exit.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Transport`] when the server ended with an error
    /// or did not drain in time.
    pub async fn shutdown(mut self) -> Result<(), HarnessError> {
        self.signal_shutdown();
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };
        tokio::task::spawn_blocking(move || join_thread(thread))
            .await
            .map_err(|err| HarnessError::Transport(format!("join server thread: {err}")))?
    }

    /// Sends the shutdown signal once.
    fn signal_shutdown(&mut self) {
        if let Some(sender) = self.shutdown.take() {
            let _ = sender.send(());
        }
    }

    /// Joins the server thread if it is still attached.
    fn join_server(&mut self) -> Result<(), HarnessError> {
        self.thread.take().map_or(Ok(()), join_thread)
    }
}

impl Drop for ServerSession {
    fn drop(&mut self) {
        self.signal_shutdown();
        let _ = self.join_server();
    }
}

impl std::fmt::Debug for ServerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerSession")
            .field("addr", &self.addr)
            .field("running", &self.thread.is_some())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SECTION: Server Thread
// ============================================================================

/// Runs the router until shutdown on a runtime owned by this thread.
fn run_server(
    listener: std::net::TcpListener,
    router: Router,
    shutdown: oneshot::Receiver<()>,
) -> Result<(), String> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(SERVER_WORKER_THREADS)
        .thread_name("digitalis-harness-worker")
        .enable_all()
        .build()
        .map_err(|err| format!("server runtime: {err}"))?;
    let result = runtime.block_on(async move {
        let listener = TcpListener::from_std(listener).map_err(|err| err.to_string())?;
        let signal = Arc::new(Notify::new());
        let trigger = Arc::clone(&signal);
        let serve = serve_router(listener, router, async move {
            let _ = shutdown.await;
            trigger.notify_one();
        });
        tokio::select! {
            result = serve => result.map_err(|err| err.to_string()),
            () = drain_deadline(&signal) => Err(format!(
                "graceful shutdown exceeded {}ms",
                SHUTDOWN_TIMEOUT.as_millis()
            )),
        }
    });
    runtime.shutdown_timeout(SHUTDOWN_TIMEOUT);
    result
}

/// Resolves [`SHUTDOWN_TIMEOUT`] after shutdown is signalled.
async fn drain_deadline(signal: &Notify) {
    signal.notified().await;
    tokio::time::sleep(SHUTDOWN_TIMEOUT).await;
}

/// Joins a server thread and flattens its result.
fn join_thread(thread: JoinHandle<Result<(), String>>) -> Result<(), HarnessError> {
    thread
        .join()
        .map_err(|_| HarnessError::Transport("server thread panicked".to_string()))?
        .map_err(HarnessError::Transport)
}
