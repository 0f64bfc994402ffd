// crates/digitalis-harness/src/client.rs
// ============================================================================
// Module: Harness Client Handles
// Description: HTTP clients bound to one claim set or to no identity.
// Purpose: Issue entry requests against a running session.
// Dependencies: bytes, reqwest, url, digitalis-core
// ============================================================================

//! ## Overview
//! A [`ClientHandle`] is fixed at construction: it either carries one
//! [`ClaimSet`] in every request or carries nothing and is anonymous.
//! Handles share the session's connection pool and never fail to build;
//! header encoding problems surface on the first request.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use bytes::Bytes;
use digitalis_core::ClaimSet;
use digitalis_core::CreateEntryCommand;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::HarnessError;
use crate::codec::encode;
use crate::injector::CLAIMS_HEADER;
use crate::injector::encode_claims_header;

// ============================================================================
// SECTION: Responses
// ============================================================================

/// Fully buffered HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessResponse {
    /// Response status.
    status: StatusCode,
    /// Response body.
    body: Bytes,
}

impl HarnessResponse {
    /// Builds a response from parts.
    #[must_use]
    pub const fn new(status: StatusCode, body: Bytes) -> Self {
        Self {
            status,
            body,
        }
    }

    /// Returns the status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns the raw body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

// ============================================================================
// SECTION: Client Handle
// ============================================================================

/// Claims carried by a handle.
#[derive(Debug, Clone)]
enum ClientIdentity {
    /// No identity header.
    Anonymous,
    /// Encoded claims header, or the encoding failure.
    Claims(Result<String, String>),
}

/// HTTP client bound to a session and an identity.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    /// Shared HTTP client.
    http: reqwest::Client,
    /// Session base URL.
    base_url: Url,
    /// Identity attached to every request.
    identity: ClientIdentity,
    /// Claims used to build the identity.
    claims: Option<ClaimSet>,
    /// Per-request timeout.
    timeout: Duration,
}

impl ClientHandle {
    /// Builds a handle. Performs no I/O.
    pub(crate) fn new(
        http: reqwest::Client,
        base_url: Url,
        claims: Option<ClaimSet>,
        timeout: Duration,
    ) -> Self {
        let identity = claims.as_ref().map_or(ClientIdentity::Anonymous, |claims| {
            ClientIdentity::Claims(encode_claims_header(claims).map_err(|err| err.to_string()))
        });
        Self {
            http,
            base_url,
            identity,
            claims,
            timeout,
        }
    }

    /// Returns the bound claims, or `None` for anonymous handles.
    #[must_use]
    pub const fn claims(&self) -> Option<&ClaimSet> {
        self.claims.as_ref()
    }

    /// Sends `POST /entry`.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError`] when encoding or transport fails.
    pub async fn create_entry(
        &self,
        command: &CreateEntryCommand,
    ) -> Result<HarnessResponse, HarnessError> {
        self.post_json("/entry", command).await
    }

    /// Sends `GET /entry?id=`.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError`] when transport fails.
    pub async fn fetch_entry(&self, id: &str) -> Result<HarnessResponse, HarnessError> {
        self.get("/entry", &[("id", id)]).await
    }

    /// Sends `GET /entries?tag=`.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError`] when transport fails.
    pub async fn list_entries(&self, tag: &str) -> Result<HarnessResponse, HarnessError> {
        self.get("/entries", &[("tag", tag)]).await
    }

    /// Sends a JSON `POST`.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError`] when encoding or transport fails.
    pub async fn post_json<T>(&self, path: &str, body: &T) -> Result<HarnessResponse, HarnessError>
    where
        T: serde::Serialize + ?Sized,
    {
        let url = self.url(path, &[])?;
        let request = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(encode(body)?);
        self.execute(request).await
    }

    /// Sends a `GET` with query parameters.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError`] when transport fails.
    pub async fn get(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<HarnessResponse, HarnessError> {
        let url = self.url(path, query)?;
        self.execute(self.http.get(url)).await
    }

    /// Resolves a path and query against the base URL.
    fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, HarnessError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|err| HarnessError::Transport(format!("invalid path {path}: {err}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Attaches identity, sends, and buffers the response.
    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<HarnessResponse, HarnessError> {
        let request = match &self.identity {
            ClientIdentity::Anonymous => request,
            ClientIdentity::Claims(Ok(header)) => request.header(CLAIMS_HEADER, header),
            ClientIdentity::Claims(Err(reason)) => {
                return Err(HarnessError::Transport(format!("claims header: {reason}")));
            }
        };
        let response = request
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| HarnessError::Transport(err.to_string()))?;
        let status = response.status();
        let body = response.bytes().await.map_err(|err| HarnessError::Transport(err.to_string()))?;
        Ok(HarnessResponse::new(status, body))
    }
}
