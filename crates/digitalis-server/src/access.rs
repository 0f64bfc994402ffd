// crates/digitalis-server/src/access.rs
// ============================================================================
// Module: Digitalis Route Access
// Description: Claim requirements enforced by protected routes.
// Purpose: Map a principal and a required claim to allow, 401, or 403.
// Dependencies: digitalis-core, thiserror
// ============================================================================

//! ## Overview
//! Access decisions are fail-closed. An anonymous principal is always
//! unauthenticated, whatever the route needs. An authenticated principal is
//! forbidden unless its claim set contains the required claim type.

// ============================================================================
// SECTION: Imports
// ============================================================================

use digitalis_core::Principal;
use thiserror::Error;

// ============================================================================
// SECTION: Decisions
// ============================================================================

/// Reason a principal was denied access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessDenied {
    /// No identity was presented.
    #[error("authentication required")]
    Unauthenticated,
    /// The principal lacks the required claim.
    #[error("missing required claim: {claim}")]
    Forbidden {
        /// Required claim type.
        claim: String,
    },
}

/// Checks that `principal` holds `claim`.
///
/// # Errors
///
/// Returns [`AccessDenied::Unauthenticated`] for anonymous principals and
/// [`AccessDenied::Forbidden`] when the claim is missing.
pub fn require_claim(principal: &Principal, claim: &str) -> Result<(), AccessDenied> {
    if !principal.is_authenticated() {
        return Err(AccessDenied::Unauthenticated);
    }
    if !principal.has_claim(claim) {
        return Err(AccessDenied::Forbidden {
            claim: claim.to_string(),
        });
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
