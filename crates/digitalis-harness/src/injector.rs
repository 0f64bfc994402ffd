// crates/digitalis-harness/src/injector.rs
// ============================================================================
// Module: Claims Injector
// Description: Identity policy that forges principals from test claim sets.
// Purpose: Exercise route authorization without an identity provider.
// Dependencies: axum, digitalis-core, digitalis-server, serde_json
// ============================================================================

//! ## Overview
//! [`ClaimsInjector`] replaces the caller identity before any authorization
//! check runs. It never looks at bearer tokens.
//!
//! - [`ClaimsInjector::per_client`] reads the claim set each
//!   [`crate::ClientHandle`] attaches in [`CLAIMS_HEADER`]. Requests without
//!   the header are anonymous.
//! - [`ClaimsInjector::fixed`] authenticates every request with one claim set.
//!
//! An empty claim set yields an authenticated principal with no privileges,
//! which routes answer with 403 rather than 401.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::http::HeaderMap;
use digitalis_core::ClaimSet;
use digitalis_core::Principal;
use digitalis_server::IdentityError;
use digitalis_server::IdentityPolicy;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header carrying the JSON claim set of a harness client.
pub const CLAIMS_HEADER: &str = "x-digitalis-test-claims";
/// Authentication scheme reported for injected principals.
pub const INJECTED_SCHEME: &str = "test-injected";
/// Subject reported for injected principals.
const INJECTED_SUBJECT: &str = "harness-client";

// ============================================================================
// SECTION: Injector
// ============================================================================

/// Source of the injected claim set.
#[derive(Debug, Clone)]
enum InjectionMode {
    /// Claims come from [`CLAIMS_HEADER`] on each request.
    PerClient,
    /// Every request receives the same claims.
    Fixed(ClaimSet),
}

/// Identity policy that builds principals from test-supplied claims.
#[derive(Debug, Clone)]
pub struct ClaimsInjector {
    /// Where claims come from.
    mode: InjectionMode,
}

impl ClaimsInjector {
    /// Builds an injector that honours each client's claims header.
    #[must_use]
    pub const fn per_client() -> Self {
        Self {
            mode: InjectionMode::PerClient,
        }
    }

    /// Builds an injector that authenticates every request with `claims`.
    #[must_use]
    pub const fn fixed(claims: ClaimSet) -> Self {
        Self {
            mode: InjectionMode::Fixed(claims),
        }
    }
}

impl Default for ClaimsInjector {
    fn default() -> Self {
        Self::per_client()
    }
}

impl IdentityPolicy for ClaimsInjector {
    fn resolve(&self, headers: &HeaderMap) -> Result<Principal, IdentityError> {
        match &self.mode {
            InjectionMode::Fixed(claims) => Ok(injected(claims.clone())),
            InjectionMode::PerClient => {
                let Some(value) = headers.get(CLAIMS_HEADER) else {
                    return Ok(Principal::anonymous());
                };
                let raw = value.to_str().map_err(|_| {
                    IdentityError::Malformed(format!("{CLAIMS_HEADER} is not ascii"))
                })?;
                let claims: ClaimSet = serde_json::from_str(raw).map_err(|err| {
                    IdentityError::Malformed(format!("{CLAIMS_HEADER} is not a claim array: {err}"))
                })?;
                Ok(injected(claims))
            }
        }
    }
}

/// Builds an injected principal.
fn injected(claims: ClaimSet) -> Principal {
    Principal::authenticated(INJECTED_SCHEME, Some(INJECTED_SUBJECT.to_string()), claims)
}

/// Encodes a claim set as an ASCII-only JSON header value.
pub(crate) fn encode_claims_header(claims: &ClaimSet) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(claims)?;
    let mut encoded = String::with_capacity(json.len());
    for ch in json.chars() {
        if ch.is_ascii() {
            encoded.push(ch);
        } else {
            let mut units = [0_u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                encoded.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
    Ok(encoded)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
