// system-tests/tests/suites/convergence.rs
// ============================================================================
// Module: Convergence Tests
// Description: Index convergence waits against a live session.
// Purpose: Show query-backed reads depend on the index and the wait is bounded.
// Dependencies: digitalis-harness, system-tests helpers
// ============================================================================

//! Convergence scenarios for the harness waiter.

use std::time::Duration;
use std::time::Instant;

use digitalis_core::Entry;
use digitalis_harness::ConvergenceError;
use digitalis_harness::HarnessError;
use digitalis_harness::decode;
use digitalis_system_tests::claims;
use reqwest::StatusCode;

use crate::helpers::fixture::Fixture;

#[tokio::test(flavor = "multi_thread")]
async fn nothing_outstanding_returns_immediately() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::start().await?;
    let started = Instant::now();
    let stats = fixture.session.await_convergence().await?;
    assert_eq!(stats.pending, 0);
    assert_eq!(stats.indexed_documents, 0);
    assert!(started.elapsed() < Duration::from_secs(1));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn paused_indexer_times_out_then_recovers() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::start().await?;
    fixture.store.pause_indexing()?;
    let id = fixture.create(&["late"]).await?;

    let reader = fixture.session.authenticated_client(claims::fetch_only());
    let early = reader.fetch_entry(&id).await?;
    assert_eq!(early.status(), StatusCode::NOT_FOUND);
    assert!(decode::<Entry>(&early)?.is_none());

    let result = fixture.session.await_convergence_within(Duration::from_millis(100)).await;
    match result {
        Err(HarnessError::Convergence(ConvergenceError::Timeout {
            pending, ..
        })) => assert_eq!(pending, 1),
        other => panic!("expected convergence timeout, got {other:?}"),
    }

    fixture.store.resume_indexing()?;
    let stats = fixture.session.await_convergence().await?;
    assert_eq!(stats.indexed_documents, 1);
    let late = reader.fetch_entry(&id).await?;
    assert_eq!(late.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn convergence_covers_every_write_in_a_burst() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::start().await?;
    let mut ids = Vec::new();
    for i in 0 .. 20 {
        ids.push(fixture.create(&[&format!("burst-{i}"), "burst"]).await?);
    }
    fixture.session.await_convergence().await?;

    let reader = fixture.session.authenticated_client(claims::fetch_only());
    for id in &ids {
        assert_eq!(reader.fetch_entry(id).await?.status(), StatusCode::OK);
    }
    let listed: Vec<Entry> = decode(&reader.list_entries("burst").await?)?.expect("list");
    assert_eq!(listed.len(), ids.len());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn interactive_pause_is_off_by_default() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::start().await?;
    if fixture.session.config().interactive_pause {
        return Ok(());
    }
    assert!(!fixture.session.pause_for_inspection("default run").await?);
    Ok(())
}
