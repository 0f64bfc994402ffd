// system-tests/tests/suites/session_lifecycle.rs
// ============================================================================
// Module: Session Lifecycle Tests
// Description: Composition, isolation, and teardown of harness sessions.
// Purpose: Ensure sessions fail fast, share dependencies, and free their port.
// Dependencies: digitalis-harness, system-tests helpers
// ============================================================================

//! Session lifecycle scenarios.

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use digitalis_core::Entry;
use digitalis_core::InMemoryDocumentStore;
use digitalis_core::MailError;
use digitalis_core::MailMessage;
use digitalis_core::Mailer;
use digitalis_harness::ClaimsInjector;
use digitalis_harness::CompositionError;
use digitalis_harness::DependencyOverride;
use digitalis_harness::DependencyOverrides;
use digitalis_harness::DependencyRole;
use digitalis_harness::HarnessError;
use digitalis_harness::RecordingMailer;
use digitalis_harness::SHUTDOWN_TIMEOUT;
use digitalis_harness::ServerSession;
use digitalis_harness::decode;
use digitalis_system_tests::claims;
use reqwest::StatusCode;
use tokio::sync::Notify;

use crate::helpers::fixture::Fixture;

/// Mailer that parks each send far beyond the shutdown drain.
struct StalledMailer {
    /// Signalled once a send has started.
    entered: Notify,
}

#[async_trait]
impl Mailer for StalledMailer {
    async fn send(&self, _message: MailMessage) -> Result<(), MailError> {
        self.entered.notify_one();
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_overrides_fail_before_serving() -> Result<(), Box<dyn std::error::Error>> {
    let storage_only = DependencyOverrides::new()
        .with(DependencyOverride::storage(InMemoryDocumentStore::new()?));
    let result = ServerSession::start(storage_only, Arc::new(ClaimsInjector::per_client())).await;
    assert!(matches!(
        result,
        Err(HarnessError::Composition(CompositionError::MissingOverride(
            DependencyRole::Notification
        )))
    ));

    let mail_only = DependencyOverrides::new()
        .with(DependencyOverride::notification(Arc::new(RecordingMailer::new())));
    let result = ServerSession::start(mail_only, Arc::new(ClaimsInjector::per_client())).await;
    assert!(matches!(
        result,
        Err(HarnessError::Composition(CompositionError::MissingOverride(DependencyRole::Storage)))
    ));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_releases_the_port() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::start().await?;
    let addr = fixture.session.addr();
    fixture.session.shutdown().await?;
    let rebound = TcpListener::bind(addr)?;
    drop(rebound);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn dropping_a_session_releases_the_port() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::start().await?;
    let addr = fixture.session.addr();
    drop(fixture);
    let rebound = TcpListener::bind(addr)?;
    drop(rebound);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn clients_share_session_dependencies() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::start().await?;
    let writer = fixture.session.authenticated_client(claims::create_only());
    let other_writer = fixture.session.authenticated_client(claims::create_and_fetch());
    let reader = fixture.session.authenticated_client(claims::fetch_only());
    assert_eq!(writer.claims(), Some(&claims::create_only()));
    assert!(fixture.session.anonymous_client().claims().is_none());

    writer.create_entry(&claims::sample_command()).await?;
    other_writer.create_entry(&claims::sample_command()).await?;
    fixture.session.await_convergence().await?;

    let listed: Vec<Entry> = decode(&reader.list_entries("tag2").await?)?.expect("list");
    assert_eq!(listed.len(), 2);
    assert_eq!(fixture.mailer.count(), 2);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn sessions_do_not_share_stores() -> Result<(), Box<dyn std::error::Error>> {
    let first = Fixture::start().await?;
    let second = Fixture::start().await?;
    assert_ne!(first.session.addr(), second.session.addr());
    assert_eq!(first.create(&["x"]).await?, "entries/1");
    assert_eq!(second.create(&["y"]).await?, "entries/1");

    second.session.await_convergence().await?;
    let reader = second.session.authenticated_client(claims::fetch_only());
    let response = reader.list_entries("x").await?;
    assert_eq!(response.status(), StatusCode::OK);
    let listed: Vec<Entry> = decode(&response)?.expect("list");
    assert!(listed.is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_with_request_in_flight_is_bounded() -> Result<(), Box<dyn std::error::Error>> {
    let mailer = Arc::new(StalledMailer {
        entered: Notify::new(),
    });
    let overrides = DependencyOverrides::new()
        .with(DependencyOverride::storage(InMemoryDocumentStore::new()?))
        .with(DependencyOverride::notification(mailer.clone()));
    let session = ServerSession::start(overrides, Arc::new(ClaimsInjector::per_client())).await?;
    let addr = session.addr();

    let writer = session.authenticated_client(claims::create_only());
    let in_flight =
        tokio::spawn(async move { writer.create_entry(&claims::sample_command()).await });
    tokio::time::timeout(SHUTDOWN_TIMEOUT, mailer.entered.notified()).await?;

    let started = Instant::now();
    let outcome = session.shutdown().await;
    assert!(started.elapsed() < SHUTDOWN_TIMEOUT * 3);
    assert!(matches!(outcome, Ok(()) | Err(HarnessError::Transport(_))));

    let request = tokio::time::timeout(SHUTDOWN_TIMEOUT * 3, in_flight).await??;
    match request {
        Ok(response) => assert_ne!(response.status(), StatusCode::OK),
        Err(err) => assert!(matches!(err, HarnessError::Transport(_))),
    }

    let rebound = TcpListener::bind(addr)?;
    drop(rebound);
    Ok(())
}
