// system-tests/tests/suites/fetch_entry.rs
// ============================================================================
// Module: Fetch Entry Tests
// Description: Read-back scenarios for GET /entry and GET /entries.
// Purpose: Verify claims gate reads and converged reads return what was written.
// Dependencies: digitalis-harness, system-tests helpers
// ============================================================================

//! Fetch scenarios for the entry routes.

use digitalis_core::Entry;
use digitalis_harness::decode;
use digitalis_harness::decode_text;
use digitalis_system_tests::claims;
use digitalis_system_tests::claims::SAMPLE_TAGS;
use reqwest::StatusCode;

use crate::helpers::fixture::Fixture;

#[tokio::test(flavor = "multi_thread")]
async fn fetch_after_create_returns_submitted_tags() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::start().await?;
    let creator = fixture.session.authenticated_client(claims::create_only());
    let created = creator.create_entry(&claims::sample_command()).await?;
    assert_eq!(created.status(), StatusCode::OK);
    let id = decode_text(&created)?.expect("created id");

    fixture.session.await_convergence().await?;
    fixture.session.pause_for_inspection("after create").await?;

    let reader = fixture.session.authenticated_client(claims::fetch_only());
    let fetched = reader.fetch_entry(&id).await?;
    assert_eq!(fetched.status(), StatusCode::OK);
    let entry: Entry = decode(&fetched)?.expect("entry body");
    assert_eq!(entry.id.as_str(), id);
    assert_eq!(entry.tags, SAMPLE_TAGS.map(str::to_string).to_vec());

    fixture.session.shutdown().await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn fetch_with_create_claim_only_is_absent() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::start().await?;
    let id = fixture.create(&SAMPLE_TAGS).await?;
    fixture.session.await_convergence().await?;

    let client = fixture.session.authenticated_client(claims::create_only());
    let response = client.fetch_entry(&id).await?;
    assert!(!response.is_success());
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(decode::<Entry>(&response)?.is_none());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn claim_sets_without_fetch_never_read() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::start().await?;
    let id = fixture.create(&["secret"]).await?;
    fixture.session.await_convergence().await?;

    for claim_set in claims::without_fetch() {
        let client = fixture.session.authenticated_client(claim_set.clone());
        let single = client.fetch_entry(&id).await?;
        assert!(!single.is_success(), "fetch allowed for {claim_set:?}");
        assert!(decode::<Entry>(&single)?.is_none());
        let listed = client.list_entries("secret").await?;
        assert!(!listed.is_success(), "list allowed for {claim_set:?}");
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_and_missing_ids_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::start().await?;
    let reader = fixture.session.authenticated_client(claims::fetch_only());

    let unknown = reader.fetch_entry("entries/42").await?;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    assert!(decode::<Entry>(&unknown)?.is_none());

    let wrong_collection = reader.fetch_entry("notes/1").await?;
    assert_eq!(wrong_collection.status(), StatusCode::NOT_FOUND);

    let missing = reader.get("/entry", &[]).await?;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn tag_listing_returns_converged_matches() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::start().await?;
    let first = fixture.create(&["red", "round"]).await?;
    fixture.create(&["blue"]).await?;
    let third = fixture.create(&["round"]).await?;
    fixture.session.await_convergence().await?;

    let reader = fixture.session.authenticated_client(claims::fetch_only());
    let response = reader.list_entries("round").await?;
    let entries: Vec<Entry> = decode(&response)?.expect("entry list");
    let ids: Vec<&str> = entries.iter().map(|entry| entry.id.as_str()).collect();
    assert_eq!(ids, vec![first.as_str(), third.as_str()]);

    let none: Vec<Entry> = decode(&reader.list_entries("green").await?)?.expect("empty list");
    assert!(none.is_empty());
    Ok(())
}
