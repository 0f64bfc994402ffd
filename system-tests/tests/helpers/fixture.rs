// system-tests/tests/helpers/fixture.rs
// ============================================================================
// Module: Session Fixture
// Description: In-memory session with recording mailer and audit sink.
// Purpose: Give each test a fresh store and observable side effects.
// Dependencies: digitalis-harness, digitalis-core
// ============================================================================

use std::sync::Arc;

use digitalis_core::CreateEntryCommand;
use digitalis_core::InMemoryDocumentStore;
use digitalis_harness::ClaimsInjector;
use digitalis_harness::DependencyOverride;
use digitalis_harness::DependencyOverrides;
use digitalis_harness::HarnessError;
use digitalis_harness::RecordingAuditSink;
use digitalis_harness::RecordingMailer;
use digitalis_harness::ServerSession;
use digitalis_harness::decode_text;
use digitalis_server::SharedIdentityPolicy;
use digitalis_system_tests::claims;

/// Running session plus handles on its doubles.
pub struct Fixture {
    /// Live server session.
    pub session: ServerSession,
    /// Store installed into the session.
    pub store: InMemoryDocumentStore,
    /// Mailer installed into the session.
    pub mailer: Arc<RecordingMailer>,
    /// Audit sink installed into the session.
    pub audit: Arc<RecordingAuditSink>,
}

impl Fixture {
    /// Starts a per-client injector session with a fresh in-memory store.
    pub async fn start() -> Result<Self, HarnessError> {
        Self::start_with(RecordingMailer::new(), Arc::new(ClaimsInjector::per_client())).await
    }

    /// Starts a session with a specific mailer and identity policy.
    pub async fn start_with(
        mailer: RecordingMailer,
        identity: SharedIdentityPolicy,
    ) -> Result<Self, HarnessError> {
        let store = InMemoryDocumentStore::new()
            .map_err(|err| HarnessError::Startup(err.to_string()))?;
        let mailer = Arc::new(mailer);
        let audit = Arc::new(RecordingAuditSink::new());
        let overrides = DependencyOverrides::new()
            .with(DependencyOverride::storage(store.clone()))
            .with(DependencyOverride::notification(mailer.clone()))
            .with(DependencyOverride::audit(audit.clone()));
        let session = ServerSession::start(overrides, identity).await?;
        Ok(Self {
            session,
            store,
            mailer,
            audit,
        })
    }

    /// Creates an entry with create-only claims and returns its id.
    pub async fn create(&self, tags: &[&str]) -> Result<String, Box<dyn std::error::Error>> {
        let client = self.session.authenticated_client(claims::create_only());
        let response = client.create_entry(&CreateEntryCommand::new(tags.iter().copied())).await?;
        let id = decode_text(&response)?
            .ok_or_else(|| format!("create returned {}", response.status()))?;
        Ok(id)
    }
}
