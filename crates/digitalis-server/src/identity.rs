// crates/digitalis-server/src/identity.rs
// ============================================================================
// Module: Digitalis Identity
// Description: Identity policies that resolve request headers to principals.
// Purpose: Keep authentication behind one seam that compositions can replace.
// Dependencies: digitalis-core, digitalis-config, axum
// ============================================================================

//! ## Overview
//! An [`IdentityPolicy`] runs ahead of every protected handler and attaches a
//! [`Principal`] to the request. A request carrying no credentials resolves
//! to [`Principal::anonymous`]; credentials that are present but unusable
//! fail the request outright. Production uses [`BearerTokenIdentity`], which
//! maps static tokens from configuration to claim grants.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::Request;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use digitalis_config::ServerAuthConfig;
use digitalis_core::ClaimSet;
use digitalis_core::Principal;
use thiserror::Error;

use crate::audit::AccessAuditEvent;
use crate::entries::ApiError;
use crate::server::AppState;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Authentication scheme label for bearer-token principals.
pub const BEARER_SCHEME: &str = "bearer";
/// Maximum accepted `Authorization` header size.
const MAX_AUTH_HEADER_BYTES: usize = 8 * 1024;

// ============================================================================
// SECTION: Policy Interface
// ============================================================================

/// Identity resolution errors.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Credentials were present but could not be parsed.
    #[error("malformed credentials: {0}")]
    Malformed(String),
    /// Credentials were well formed but not accepted.
    #[error("unauthenticated: {0}")]
    Rejected(String),
}

/// Resolves the caller identity for a request.
pub trait IdentityPolicy: Send + Sync {
    /// Builds the principal for a request from its headers.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError`] when credentials are present but unusable.
    fn resolve(&self, headers: &HeaderMap) -> Result<Principal, IdentityError>;
}

/// Shared identity policy handle.
pub type SharedIdentityPolicy = Arc<dyn IdentityPolicy>;

// ============================================================================
// SECTION: Bearer Tokens
// ============================================================================

/// Claims and subject bound to one static token.
#[derive(Debug, Clone)]
struct TokenGrant {
    /// Subject reported for the token.
    subject: Option<String>,
    /// Claims granted by the token.
    claims: ClaimSet,
}

/// Identity policy backed by static bearer tokens from configuration.
#[derive(Debug, Clone, Default)]
pub struct BearerTokenIdentity {
    /// Grants keyed by token.
    grants: BTreeMap<String, TokenGrant>,
}

impl BearerTokenIdentity {
    /// Builds the policy from server auth configuration.
    #[must_use]
    pub fn from_config(config: &ServerAuthConfig) -> Self {
        let grants = config
            .tokens
            .iter()
            .map(|grant| {
                (
                    grant.token.clone(),
                    TokenGrant {
                        subject: grant.subject.clone(),
                        claims: grant.claim_set(),
                    },
                )
            })
            .collect();
        Self {
            grants,
        }
    }

    /// Returns true when no tokens are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}

impl IdentityPolicy for BearerTokenIdentity {
    fn resolve(&self, headers: &HeaderMap) -> Result<Principal, IdentityError> {
        let Some(value) = headers.get(AUTHORIZATION) else {
            return Ok(Principal::anonymous());
        };
        let header = value.to_str().map_err(|_| {
            IdentityError::Malformed("authorization header is not ascii".to_string())
        })?;
        let token = parse_bearer_token(header)?;
        let grant = self
            .grants
            .get(token)
            .ok_or_else(|| IdentityError::Rejected("invalid bearer token".to_string()))?;
        Ok(Principal::authenticated(BEARER_SCHEME, grant.subject.clone(), grant.claims.clone()))
    }
}

/// Extracts the token from a `Bearer` authorization header.
fn parse_bearer_token(header: &str) -> Result<&str, IdentityError> {
    if header.len() > MAX_AUTH_HEADER_BYTES {
        return Err(IdentityError::Malformed("authorization header too large".to_string()));
    }
    let (scheme, token) = header.trim().split_once(' ').unwrap_or((header.trim(), ""));
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) || token.is_empty() {
        return Err(IdentityError::Malformed("invalid authorization header".to_string()));
    }
    Ok(token)
}

// ============================================================================
// SECTION: Middleware
// ============================================================================

/// Resolves the principal and stores it in request extensions.
pub(crate) async fn resolve_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match state.identity.resolve(request.headers()) {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(error) => {
            let route = format!("{} {}", request.method(), request.uri().path());
            state.audit.record(&AccessAuditEvent::rejected(&route, &error));
            ApiError::from(error).into_response()
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
