// system-tests/tests/suites/sqlite_backend.rs
// ============================================================================
// Module: SQLite Backend Tests
// Description: Entry scenarios against the durable SQLite store.
// Purpose: Confirm the harness contract holds for the background indexer.
// Dependencies: digitalis-harness, digitalis-store-sqlite, tempfile
// ============================================================================

//! SQLite-backed entry scenarios.

use std::sync::Arc;

use digitalis_core::Entry;
use digitalis_harness::ClaimsInjector;
use digitalis_harness::DependencyOverride;
use digitalis_harness::DependencyOverrides;
use digitalis_harness::RecordingMailer;
use digitalis_harness::ServerSession;
use digitalis_harness::decode;
use digitalis_harness::decode_text;
use digitalis_store_sqlite::SqliteDocumentStore;
use digitalis_store_sqlite::SqliteStoreConfig;
use digitalis_system_tests::claims;
use digitalis_system_tests::claims::SAMPLE_TAGS;
use reqwest::StatusCode;

/// Starts a session over a SQLite store at `path`.
async fn sqlite_session(
    path: &std::path::Path,
) -> Result<(ServerSession, SqliteDocumentStore), Box<dyn std::error::Error>> {
    let store = SqliteDocumentStore::new(SqliteStoreConfig::for_path(path))?;
    let overrides = DependencyOverrides::new()
        .with(DependencyOverride::storage(store.clone()))
        .with(DependencyOverride::notification(Arc::new(RecordingMailer::new())));
    let session = ServerSession::start(overrides, Arc::new(ClaimsInjector::per_client())).await?;
    Ok((session, store))
}

#[tokio::test(flavor = "multi_thread")]
async fn create_then_fetch_round_trips_through_sqlite() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let (session, _store) = sqlite_session(&dir.path().join("entries.db")).await?;

    let writer = session.authenticated_client(claims::create_only());
    let created = writer.create_entry(&claims::sample_command()).await?;
    let id = decode_text(&created)?.expect("created id");
    session.await_convergence().await?;

    let reader = session.authenticated_client(claims::fetch_only());
    let entry: Entry = decode(&reader.fetch_entry(&id).await?)?.expect("entry");
    assert_eq!(entry.id.as_str(), id);
    assert_eq!(entry.tags, SAMPLE_TAGS.map(str::to_string).to_vec());
    session.shutdown().await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn paused_sqlite_indexer_hides_entries_until_resumed()
-> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let (session, store) = sqlite_session(&dir.path().join("entries.db")).await?;
    store.pause_indexing();

    let writer = session.authenticated_client(claims::create_only());
    let id = decode_text(&writer.create_entry(&claims::sample_command()).await?)?.expect("id");
    let reader = session.authenticated_client(claims::fetch_only());
    assert_eq!(reader.fetch_entry(&id).await?.status(), StatusCode::NOT_FOUND);

    store.resume_indexing();
    session.await_convergence().await?;
    assert_eq!(reader.fetch_entry(&id).await?.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn ids_continue_across_sessions_on_one_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("entries.db");

    let (session, store) = sqlite_session(&path).await?;
    let writer = session.authenticated_client(claims::create_only());
    let first = decode_text(&writer.create_entry(&claims::sample_command()).await?)?;
    assert_eq!(first.as_deref(), Some("entries/1"));
    session.await_convergence().await?;
    session.shutdown().await?;
    drop(store);

    let (session, _store) = sqlite_session(&path).await?;
    let writer = session.authenticated_client(claims::create_only());
    let second = decode_text(&writer.create_entry(&claims::sample_command()).await?)?;
    assert_eq!(second.as_deref(), Some("entries/2"));
    session.await_convergence().await?;

    let reader = session.authenticated_client(claims::fetch_only());
    let listed: Vec<Entry> = decode(&reader.list_entries("tag1").await?)?.expect("list");
    assert_eq!(listed.len(), 2);
    Ok(())
}
