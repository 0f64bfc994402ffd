// crates/digitalis-server/src/entries.rs
// ============================================================================
// Module: Digitalis Entry Routes
// Description: HTTP handlers for entry creation, lookup, and health.
// Purpose: Enforce route claims, then bridge requests onto the document store.
// Dependencies: axum, digitalis-core, serde_json, tokio, url
// ============================================================================

//! ## Overview
//! Handlers authorize before they parse. A caller without the route claim
//! gets 401 or 403 even when the body or query would also be rejected.
//! Store calls are synchronous and run on the blocking pool.
//!
//! Reads of `GET /entry` and `GET /entries` go through the secondary index,
//! so an entry becomes visible only once the store has indexed it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Extension;
use axum::Json;
use axum::body::Bytes;
use axum::extract::RawQuery;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::response::Response;
use digitalis_core::CreateEntryCommand;
use digitalis_core::DigitalisClaims;
use digitalis_core::DocumentId;
use digitalis_core::DocumentStore;
use digitalis_core::ENTRY_COLLECTION;
use digitalis_core::Entry;
use digitalis_core::EntryError;
use digitalis_core::IndexQuery;
use digitalis_core::Mailer;
use digitalis_core::Principal;
use digitalis_core::StoreError;
use serde_json::json;
use thiserror::Error;

use crate::access::AccessDenied;
use crate::access::require_claim;
use crate::audit::AccessAuditEvent;
use crate::identity::IdentityError;
use crate::mail::entry_created_message;
use crate::server::AppState;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Audit label for entry creation.
const CREATE_ROUTE: &str = "POST /entry";
/// Audit label for entry lookup.
const FETCH_ROUTE: &str = "GET /entry";
/// Audit label for tag listing.
const LIST_ROUTE: &str = "GET /entries";
/// Indexed field holding entry tags.
const TAGS_FIELD: &str = "tags";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// HTTP-facing request errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request body or query is invalid.
    #[error("{0}")]
    BadRequest(String),
    /// Caller is not authenticated.
    #[error("{0}")]
    Unauthenticated(String),
    /// Caller lacks the route claim.
    #[error("{0}")]
    Forbidden(String),
    /// Requested entry is not visible.
    #[error("{0}")]
    NotFound(String),
    /// Store or notification failure.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Returns the HTTP status for the error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<IdentityError> for ApiError {
    fn from(error: IdentityError) -> Self {
        match error {
            IdentityError::Malformed(_) => Self::BadRequest(error.to_string()),
            IdentityError::Rejected(_) => Self::Unauthenticated(error.to_string()),
        }
    }
}

impl From<AccessDenied> for ApiError {
    fn from(denied: AccessDenied) -> Self {
        match denied {
            AccessDenied::Unauthenticated => Self::Unauthenticated(denied.to_string()),
            AccessDenied::Forbidden {
                ..
            } => Self::Forbidden(denied.to_string()),
        }
    }
}

impl From<EntryError> for ApiError {
    fn from(error: EntryError) -> Self {
        match error {
            EntryError::Invalid(_) => Self::BadRequest(error.to_string()),
            EntryError::Corrupt(_) => Self::Internal(error.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        Self::Internal(error.to_string())
    }
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// `POST /entry`: stores a new entry and sends the created notification.
pub(crate) async fn create_entry(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    body: Bytes,
) -> Result<Response, ApiError> {
    authorize(&state, CREATE_ROUTE, &principal, DigitalisClaims::CREATE_ENTRY)?;
    let command: CreateEntryCommand = serde_json::from_slice(&body)
        .map_err(|err| ApiError::BadRequest(format!("invalid entry body: {err}")))?;
    command.validate()?;
    let document = command.to_document()?;
    let store = state.store.clone();
    let id = run_blocking(move || store.store(ENTRY_COLLECTION, document)).await?;
    let message = entry_created_message(&state.notifications, &id, &command.tags);
    state
        .mailer
        .send(message)
        .await
        .map_err(|err| ApiError::Internal(format!("entry {id} stored; {err}")))?;
    Ok(([(CONTENT_TYPE, "text/plain; charset=utf-8")], id.to_string()).into_response())
}

/// `GET /entry?id=`: returns one indexed entry.
pub(crate) async fn fetch_entry(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    RawQuery(query): RawQuery,
) -> Result<Json<Entry>, ApiError> {
    authorize(&state, FETCH_ROUTE, &principal, DigitalisClaims::FETCH_ENTRY)?;
    let id = DocumentId::new(required_param(query.as_deref(), "id")?);
    let store = state.store.clone();
    let lookup = IndexQuery::by_id(ENTRY_COLLECTION, id.clone());
    let documents = run_blocking(move || store.query(&lookup)).await?;
    let document = documents
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::NotFound(format!("entry not found: {id}")))?;
    Ok(Json(Entry::from_document(document.id, document.body)?))
}

/// `GET /entries?tag=`: returns indexed entries carrying a tag, in write order.
pub(crate) async fn list_entries(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    RawQuery(query): RawQuery,
) -> Result<Json<Vec<Entry>>, ApiError> {
    authorize(&state, LIST_ROUTE, &principal, DigitalisClaims::FETCH_ENTRY)?;
    let tag = required_param(query.as_deref(), "tag")?;
    let store = state.store.clone();
    let lookup = IndexQuery::by_term(ENTRY_COLLECTION, TAGS_FIELD, tag);
    let documents = run_blocking(move || store.query(&lookup)).await?;
    let entries = documents
        .into_iter()
        .map(|document| Entry::from_document(document.id, document.body))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(entries))
}

/// `GET /health`: reports store readiness.
pub(crate) async fn health(State(state): State<AppState>) -> Response {
    let store = state.store.clone();
    match run_blocking(move || store.readiness()).await {
        Ok(()) => Json(json!({ "status": "ok" })).into_response(),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unavailable", "error": err.to_string() })),
        )
            .into_response(),
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Checks the route claim and records the decision.
fn authorize(
    state: &AppState,
    route: &str,
    principal: &Principal,
    claim: &str,
) -> Result<(), ApiError> {
    match require_claim(principal, claim) {
        Ok(()) => {
            state.audit.record(&AccessAuditEvent::allowed(route, principal));
            Ok(())
        }
        Err(denied) => {
            state.audit.record(&AccessAuditEvent::denied(route, principal, &denied));
            Err(denied.into())
        }
    }
}

/// Returns a non-empty query parameter.
fn required_param(query: Option<&str>, name: &str) -> Result<String, ApiError> {
    query
        .and_then(|raw| {
            url::form_urlencoded::parse(raw.as_bytes())
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
        })
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("missing {name} query parameter")))
}

/// Runs a store call on the blocking pool.
async fn run_blocking<T, F>(operation: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(operation)
        .await
        .map_err(|err| ApiError::Internal(format!("store task failed: {err}")))?
        .map_err(ApiError::from)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
