// crates/digitalis-core/src/core/principal.rs
// ============================================================================
// Module: Digitalis Principal
// Description: Caller identity resolved for a single request.
// Purpose: Bind a claim set to an authentication state.
// Dependencies: crate::core::claims
// ============================================================================

//! ## Overview
//! A [`Principal`] is what authorization checks consume. An anonymous
//! principal never satisfies a claim requirement. An authenticated principal
//! with an empty claim set is distinct from an anonymous one: it is known but
//! privilege-less, which routes report as forbidden rather than
//! unauthenticated.

// ============================================================================
// SECTION: Imports
// ============================================================================

use super::claims::ClaimSet;

// ============================================================================
// SECTION: Principal
// ============================================================================

/// Authentication state of a principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication {
    /// No identity was presented.
    Anonymous,
    /// Identity established by the named scheme.
    Authenticated {
        /// Authentication scheme label (for example `bearer`).
        scheme: String,
    },
}

/// Resolved caller identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Optional subject identifier.
    subject: Option<String>,
    /// Claims granted to the caller.
    claims: ClaimSet,
    /// Authentication state.
    authentication: Authentication,
}

impl Principal {
    /// Returns an anonymous principal with no claims.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            subject: None,
            claims: ClaimSet::empty(),
            authentication: Authentication::Anonymous,
        }
    }

    /// Returns an authenticated principal.
    #[must_use]
    pub fn authenticated(
        scheme: impl Into<String>,
        subject: Option<String>,
        claims: ClaimSet,
    ) -> Self {
        Self {
            subject,
            claims,
            authentication: Authentication::Authenticated {
                scheme: scheme.into(),
            },
        }
    }

    /// Returns true when the principal is authenticated.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self.authentication, Authentication::Authenticated { .. })
    }

    /// Returns true when the principal is authenticated and holds the claim type.
    #[must_use]
    pub fn has_claim(&self, claim_type: &str) -> bool {
        self.is_authenticated() && self.claims.contains_type(claim_type)
    }

    /// Returns the subject, if any.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Returns the claim set.
    #[must_use]
    pub const fn claims(&self) -> &ClaimSet {
        &self.claims
    }

    /// Returns the authentication state.
    #[must_use]
    pub const fn authentication(&self) -> &Authentication {
        &self.authentication
    }
}

impl Default for Principal {
    fn default() -> Self {
        Self::anonymous()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
