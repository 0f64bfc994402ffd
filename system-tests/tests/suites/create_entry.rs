// system-tests/tests/suites/create_entry.rs
// ============================================================================
// Module: Create Entry Tests
// Description: Write scenarios for POST /entry.
// Purpose: Verify id allocation, validation, and notification side effects.
// Dependencies: digitalis-harness, system-tests helpers
// ============================================================================

//! Create scenarios for the entry routes.

use std::collections::BTreeMap;
use std::sync::Arc;

use digitalis_core::ClaimSet;
use digitalis_core::CreateEntryCommand;
use digitalis_core::DocumentStore;
use digitalis_core::MAX_TAGS;
use digitalis_harness::ClaimsInjector;
use digitalis_harness::CodecError;
use digitalis_harness::HarnessError;
use digitalis_harness::RecordingMailer;
use digitalis_harness::decode_text;
use digitalis_system_tests::claims;
use reqwest::StatusCode;

use crate::helpers::fixture::Fixture;

#[tokio::test(flavor = "multi_thread")]
async fn sequential_creates_yield_distinct_ids() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::start().await?;
    let first = fixture.create(&["a"]).await?;
    let second = fixture.create(&["a"]).await?;
    assert_ne!(first, second);
    assert_eq!(first, "entries/1");
    assert_eq!(second, "entries/2");
    assert_eq!(fixture.store.document_count()?, 2);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn each_successful_create_sends_one_notification() -> Result<(), Box<dyn std::error::Error>>
{
    let fixture = Fixture::start().await?;
    let id = fixture.create(&["mail"]).await?;
    let messages = fixture.mailer.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].subject.contains(&id));
    assert!(messages[0].body.contains("Tags: mail"));

    fixture.create(&[]).await?;
    assert_eq!(fixture.mailer.count(), 2);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_creates_store_nothing_and_send_nothing() -> Result<(), Box<dyn std::error::Error>>
{
    let fixture = Fixture::start().await?;
    let command = claims::sample_command();

    let anonymous = fixture.session.anonymous_client().create_entry(&command).await?;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
    assert!(decode_text(&anonymous)?.is_none());

    let empty = fixture.session.authenticated_client(ClaimSet::empty());
    assert_eq!(empty.create_entry(&command).await?.status(), StatusCode::FORBIDDEN);

    let reader = fixture.session.authenticated_client(claims::fetch_only());
    assert_eq!(reader.create_entry(&command).await?.status(), StatusCode::FORBIDDEN);

    let writer = fixture.session.authenticated_client(claims::create_only());
    let blank = writer.create_entry(&CreateEntryCommand::new(["ok", " "])).await?;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
    let too_many: Vec<String> = (0 ..= MAX_TAGS).map(|i| format!("t{i}")).collect();
    let crowded = writer.create_entry(&CreateEntryCommand::new(too_many)).await?;
    assert_eq!(crowded.status(), StatusCode::BAD_REQUEST);
    let wrong_shape = writer.post_json("/entry", &serde_json::json!({ "labels": [] })).await?;
    assert_eq!(wrong_shape.status(), StatusCode::BAD_REQUEST);

    assert_eq!(fixture.mailer.count(), 0);
    assert_eq!(fixture.store.document_count()?, 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn notification_failure_is_reported_after_store() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::start_with(
        RecordingMailer::failing("relay offline"),
        Arc::new(ClaimsInjector::per_client()),
    )
    .await?;
    let writer = fixture.session.authenticated_client(claims::create_only());
    let response = writer.create_entry(&claims::sample_command()).await?;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(decode_text(&response)?.is_none());
    assert_eq!(fixture.store.document_count()?, 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn unencodable_payload_fails_before_sending() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::start().await?;
    let writer = fixture.session.authenticated_client(claims::create_only());
    let mut payload = BTreeMap::new();
    payload.insert((1_u8, 2_u8), "tags");
    let result = writer.post_json("/entry", &payload).await;
    assert!(matches!(result, Err(HarnessError::Codec(CodecError::Encode(_)))));
    assert_eq!(fixture.store.index_stats()?.indexed_documents, 0);
    assert_eq!(fixture.store.document_count()?, 0);
    Ok(())
}
