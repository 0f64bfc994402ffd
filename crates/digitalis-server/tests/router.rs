// crates/digitalis-server/tests/router.rs
// ============================================================================
// Module: Router Integration Tests
// Description: Exercises the composed router through tower without a socket.
// Purpose: Pin route authorization, status mapping, and notification rules.
// Dependencies: digitalis-server, digitalis-core, tower, http-body-util
// ============================================================================

//! Router-level tests covering auth precedence, entry round trips, and mail.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::header::CONTENT_TYPE;
use digitalis_config::ClaimConfig;
use digitalis_config::ServerAuthConfig;
use digitalis_config::TokenGrantConfig;
use digitalis_core::DigitalisClaims;
use digitalis_core::DocumentStore;
use digitalis_core::InMemoryDocumentStore;
use digitalis_core::MailError;
use digitalis_core::MailMessage;
use digitalis_core::Mailer;
use digitalis_core::SharedDocumentStore;
use digitalis_core::SharedMailer;
use digitalis_server::AccessAuditEvent;
use digitalis_server::AuditSink;
use digitalis_server::BearerTokenIdentity;
use digitalis_server::ServerComponents;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

const WRITER: &str = "writer-token-0123456789";
const READER: &str = "reader-token-0123456789";
const NOBODY: &str = "nobody-token-0123456789";

#[derive(Default)]
struct CapturingMailer {
    sent: Mutex<Vec<MailMessage>>,
    fail: bool,
}

#[async_trait]
impl Mailer for CapturingMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::Delivery("relay offline".to_string()));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

#[derive(Default)]
struct CapturingAudit {
    events: Mutex<Vec<AccessAuditEvent>>,
}

impl AuditSink for CapturingAudit {
    fn record(&self, event: &AccessAuditEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

struct Fixture {
    router: Router,
    store: InMemoryDocumentStore,
    mailer: Arc<CapturingMailer>,
    audit: Arc<CapturingAudit>,
}

fn grant(token: &str, claims: &[&str]) -> TokenGrantConfig {
    TokenGrantConfig {
        token: token.to_string(),
        subject: Some(token.split('-').next().unwrap().to_string()),
        claims: claims
            .iter()
            .map(|claim| ClaimConfig {
                claim_type: (*claim).to_string(),
                value: String::new(),
            })
            .collect(),
    }
}

fn fixture_with_mailer(mailer: CapturingMailer) -> Fixture {
    let store = InMemoryDocumentStore::new().unwrap();
    let mailer = Arc::new(mailer);
    let audit = Arc::new(CapturingAudit::default());
    let identity = BearerTokenIdentity::from_config(&ServerAuthConfig {
        tokens: vec![
            grant(WRITER, &[DigitalisClaims::CREATE_ENTRY]),
            grant(READER, &[DigitalisClaims::FETCH_ENTRY]),
            grant(NOBODY, &[]),
        ],
    });
    let router = ServerComponents::new(
        SharedDocumentStore::from_store(store.clone()),
        SharedMailer::new(mailer.clone()),
        Arc::new(identity),
    )
    .with_audit(audit.clone())
    .with_max_body_bytes(4096)
    .into_router();
    Fixture {
        router,
        store,
        mailer,
        audit,
    }
}

fn fixture() -> Fixture {
    fixture_with_mailer(CapturingMailer::default())
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

fn post_entry(token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::post("/entry").header(CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn wait_indexed(store: &InMemoryDocumentStore) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while store.index_stats().unwrap().pending > 0 {
        assert!(Instant::now() < deadline, "index did not converge");
        std::thread::sleep(Duration::from_millis(5));
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[tokio::test]
async fn health_needs_no_credentials() {
    let fixture = fixture();
    let (status, body) = send(&fixture.router, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn create_then_fetch_round_trips_tags() {
    let fixture = fixture();
    let (status, body) =
        send(&fixture.router, post_entry(Some(WRITER), r#"{"tags":["tag1","tag2","tag3"]}"#))
            .await;
    assert_eq!(status, StatusCode::OK);
    let id = String::from_utf8(body).unwrap();
    assert_eq!(id, "entries/1");

    wait_indexed(&fixture.store);
    let uri = format!("/entry?id={}", id.replace('/', "%2F"));
    let (status, body) = send(&fixture.router, get(&uri, Some(READER))).await;
    assert_eq!(status, StatusCode::OK);
    let entry: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(entry["id"], "entries/1");
    assert_eq!(entry["tags"], serde_json::json!(["tag1", "tag2", "tag3"]));
}

#[tokio::test]
async fn anonymous_and_unprivileged_callers_are_refused() {
    let fixture = fixture();
    let (status, _) = send(&fixture.router, post_entry(None, r#"{"tags":[]}"#)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&fixture.router, post_entry(Some(NOBODY), r#"{"tags":[]}"#)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&fixture.router, post_entry(Some(READER), r#"{"tags":[]}"#)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&fixture.router, get("/entry?id=entries%2F1", Some(WRITER))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&fixture.router, get("/entries?tag=a", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(fixture.mailer.sent.lock().unwrap().is_empty());
    assert_eq!(fixture.store.document_count().unwrap(), 0);
}

#[tokio::test]
async fn unknown_token_is_unauthorized_and_malformed_header_is_bad_request() {
    let fixture = fixture();
    let (status, _) = send(&fixture.router, get("/entry?id=entries%2F1", Some("unknown"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let request = Request::get("/entry?id=entries%2F1")
        .header(AUTHORIZATION, "Basic abc")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&fixture.router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let events = fixture.audit.events.lock().unwrap();
    assert!(events.iter().all(|event| event.decision == "reject"));
    assert_eq!(events.len(), 2);
}

#[tokio::test]
async fn authorization_precedes_body_validation() {
    let fixture = fixture();
    let (status, _) = send(&fixture.router, post_entry(None, "not json")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, body) = send(&fixture.router, post_entry(Some(WRITER), "not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert!(body["error"].as_str().unwrap().contains("invalid entry body"));
    let (status, _) = send(&fixture.router, post_entry(Some(WRITER), r#"{"tags":["  "]}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(fixture.mailer.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn fetch_requires_id_and_reports_missing_entries() {
    let fixture = fixture();
    let (status, _) = send(&fixture.router, get("/entry", Some(READER))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&fixture.router, get("/entry?id=entries%2F99", Some(READER))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unindexed_entry_is_not_found_until_indexing_resumes() {
    let fixture = fixture();
    fixture.store.pause_indexing().unwrap();
    let (status, body) =
        send(&fixture.router, post_entry(Some(WRITER), r#"{"tags":["late"]}"#)).await;
    assert_eq!(status, StatusCode::OK);
    let id = String::from_utf8(body).unwrap();
    let uri = format!("/entry?id={id}");
    let (status, _) = send(&fixture.router, get(&uri, Some(READER))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    fixture.store.resume_indexing().unwrap();
    wait_indexed(&fixture.store);
    let (status, _) = send(&fixture.router, get(&uri, Some(READER))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn each_create_sends_one_notification_with_distinct_ids() {
    let fixture = fixture();
    let (_, first) = send(&fixture.router, post_entry(Some(WRITER), r#"{"tags":["a"]}"#)).await;
    let (_, second) = send(&fixture.router, post_entry(Some(WRITER), r#"{"tags":["b"]}"#)).await;
    assert_ne!(first, second);
    let sent = fixture.mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].subject, "Entry created: entries/1");
    assert_eq!(sent[1].subject, "Entry created: entries/2");
}

#[tokio::test]
async fn mail_failure_surfaces_as_server_error() {
    let fixture = fixture_with_mailer(CapturingMailer {
        sent: Mutex::new(Vec::new()),
        fail: true,
    });
    let (status, _) = send(&fixture.router, post_entry(Some(WRITER), r#"{"tags":["a"]}"#)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(fixture.store.document_count().unwrap(), 1);
}

#[tokio::test]
async fn tag_listing_returns_matches_in_write_order() {
    let fixture = fixture();
    for body in [r#"{"tags":["x","shared"]}"#, r#"{"tags":["y"]}"#, r#"{"tags":["shared"]}"#] {
        let (status, _) = send(&fixture.router, post_entry(Some(WRITER), body)).await;
        assert_eq!(status, StatusCode::OK);
    }
    wait_indexed(&fixture.store);
    let (status, body) = send(&fixture.router, get("/entries?tag=shared", Some(READER))).await;
    assert_eq!(status, StatusCode::OK);
    let entries: Vec<Value> = serde_json::from_slice(&body).unwrap();
    let ids: Vec<&str> = entries.iter().map(|entry| entry["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["entries/1", "entries/3"]);
    let (status, _) = send(&fixture.router, get("/entries", Some(READER))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let fixture = fixture();
    let tags: Vec<String> = (0 .. 60).map(|i| format!("{i:0>100}")).collect();
    let body = serde_json::json!({ "tags": tags }).to_string();
    let (status, _) = send(&fixture.router, post_entry(Some(WRITER), &body)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn audit_records_allow_and_deny_decisions() {
    let fixture = fixture();
    send(&fixture.router, post_entry(Some(WRITER), r#"{"tags":[]}"#)).await;
    send(&fixture.router, get("/entry?id=entries%2F1", Some(WRITER))).await;
    let events = fixture.audit.events.lock().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].decision, "allow");
    assert_eq!(events[0].route, "POST /entry");
    assert_eq!(events[0].subject.as_deref(), Some("writer"));
    assert_eq!(events[1].decision, "deny");
    assert_eq!(events[1].route, "GET /entry");
}
