// system-tests/tests/suites/authorization.rs
// ============================================================================
// Module: Authorization Tests
// Description: Status mapping for anonymous, privilege-less, and forged callers.
// Purpose: Keep 401, 403, and 400 distinct across every entry route.
// Dependencies: digitalis-harness, reqwest, system-tests helpers
// ============================================================================

//! Authorization scenarios for the entry routes.

use std::sync::Arc;

use digitalis_core::ClaimSet;
use digitalis_harness::CLAIMS_HEADER;
use digitalis_harness::ClaimsInjector;
use digitalis_harness::ClientHandle;
use digitalis_harness::HarnessResponse;
use digitalis_harness::RecordingMailer;
use digitalis_system_tests::claims;
use reqwest::StatusCode;

use crate::helpers::fixture::Fixture;

/// Sends one request to each protected route.
async fn hit_all_routes(
    client: &ClientHandle,
) -> Result<Vec<HarnessResponse>, Box<dyn std::error::Error>> {
    Ok(vec![
        client.create_entry(&claims::sample_command()).await?,
        client.fetch_entry("entries/1").await?,
        client.list_entries("tag1").await?,
    ])
}

#[tokio::test(flavor = "multi_thread")]
async fn anonymous_callers_are_unauthorized() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::start().await?;
    for response in hit_all_routes(&fixture.session.anonymous_client()).await? {
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_claim_set_is_forbidden_not_unauthorized() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::start().await?;
    let client = fixture.session.authenticated_client(ClaimSet::empty());
    for response in hit_all_routes(&client).await? {
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
    assert_eq!(fixture.audit.decisions(), vec!["deny", "deny", "deny"]);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn full_claims_reach_every_route() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::start().await?;
    let client = fixture.session.authenticated_client(claims::create_and_fetch());
    let responses = hit_all_routes(&client).await?;
    assert_eq!(responses[0].status(), StatusCode::OK);
    assert_ne!(responses[1].status(), StatusCode::UNAUTHORIZED);
    assert_ne!(responses[1].status(), StatusCode::FORBIDDEN);
    assert_eq!(responses[2].status(), StatusCode::OK);
    assert_eq!(fixture.audit.decisions(), vec!["allow", "allow", "allow"]);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_claims_header_fails_closed() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::start().await?;
    let url = fixture.session.base_url().join("entry?id=entries%2F1")?;
    let response = reqwest::Client::builder()
        .no_proxy()
        .build()?
        .get(url)
        .header(CLAIMS_HEADER, "not-a-claim-array")
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(fixture.audit.decisions(), vec!["reject"]);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn bearer_tokens_are_ignored_by_the_injector() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::start().await?;
    let url = fixture.session.base_url().join("entry?id=entries%2F1")?;
    let response = reqwest::Client::builder()
        .no_proxy()
        .build()?
        .get(url)
        .bearer_auth("any-token-at-all-0123456789")
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn fixed_injector_applies_one_claim_set_to_all_clients()
-> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::start_with(
        RecordingMailer::new(),
        Arc::new(ClaimsInjector::fixed(claims::create_only())),
    )
    .await?;
    let anonymous = fixture.session.anonymous_client();
    assert_eq!(anonymous.create_entry(&claims::sample_command()).await?.status(), StatusCode::OK);
    let reader = fixture.session.authenticated_client(claims::fetch_only());
    assert_eq!(reader.fetch_entry("entries/1").await?.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn health_is_open_to_anonymous_callers() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::start().await?;
    let response = fixture.session.anonymous_client().get("/health", &[]).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(fixture.audit.events().is_empty());
    Ok(())
}
