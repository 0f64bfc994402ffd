// crates/digitalis-core/src/core/claims.rs
// ============================================================================
// Module: Digitalis Claims
// Description: Typed claim pairs and ordered, write-once claim sets.
// Purpose: Describe what a caller is allowed to do.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`Claim`] is a `(type, value)` pair. A [`ClaimSet`] is an ordered
//! sequence of claims; claim types are not required to be unique, so several
//! grants of the same type may coexist. Claim sets are immutable once built.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Claim Types
// ============================================================================

/// Claim types consumed by the Digitalis entry routes.
///
/// # Invariants
/// - Values are stable wire constants; renaming them breaks issued grants.
pub struct DigitalisClaims;

impl DigitalisClaims {
    /// Grants creation of new entries (`POST /entry`).
    pub const CREATE_ENTRY: &'static str = "digitalis:entry:create";
    /// Grants reading entries (`GET /entry`, `GET /entries`).
    pub const FETCH_ENTRY: &'static str = "digitalis:entry:fetch";
}

// ============================================================================
// SECTION: Claim
// ============================================================================

/// Single `(type, value)` claim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Claim {
    /// Claim type (for example [`DigitalisClaims::CREATE_ENTRY`]).
    #[serde(rename = "type")]
    claim_type: String,
    /// Claim value; permission grants use the empty string.
    #[serde(default)]
    value: String,
}

impl Claim {
    /// Creates a claim with an explicit value.
    #[must_use]
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }

    /// Creates a permission grant with an empty value.
    #[must_use]
    pub fn permission(claim_type: impl Into<String>) -> Self {
        Self::new(claim_type, String::new())
    }

    /// Returns the claim type.
    #[must_use]
    pub fn claim_type(&self) -> &str {
        &self.claim_type
    }

    /// Returns the claim value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Claim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_empty() {
            f.write_str(&self.claim_type)
        } else {
            write!(f, "{}={}", self.claim_type, self.value)
        }
    }
}

// ============================================================================
// SECTION: Claim Set
// ============================================================================

/// Ordered, immutable collection of claims attached to one caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimSet {
    /// Claims in insertion order.
    claims: Vec<Claim>,
}

impl ClaimSet {
    /// Builds a claim set from claims, preserving order.
    #[must_use]
    pub fn new(claims: impl IntoIterator<Item = Claim>) -> Self {
        Self {
            claims: claims.into_iter().collect(),
        }
    }

    /// Returns a claim set with no claims.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            claims: Vec::new(),
        }
    }

    /// Builds a claim set of permission grants with empty values.
    #[must_use]
    pub fn permissions<I, S>(claim_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        claim_types.into_iter().map(Claim::permission).collect()
    }

    /// Returns true when any claim has the given type.
    #[must_use]
    pub fn contains_type(&self, claim_type: &str) -> bool {
        self.claims.iter().any(|claim| claim.claim_type == claim_type)
    }

    /// Returns all values recorded for a claim type, in order.
    pub fn values_of<'a>(&'a self, claim_type: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.claims
            .iter()
            .filter(move |claim| claim.claim_type == claim_type)
            .map(|claim| claim.value.as_str())
    }

    /// Iterates over claims in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Claim> {
        self.claims.iter()
    }

    /// Returns the number of claims.
    #[must_use]
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    /// Returns true when the set holds no claims.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

impl FromIterator<Claim> for ClaimSet {
    fn from_iter<T: IntoIterator<Item = Claim>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl<'a> IntoIterator for &'a ClaimSet {
    type Item = &'a Claim;
    type IntoIter = std::slice::Iter<'a, Claim>;

    fn into_iter(self) -> Self::IntoIter {
        self.claims.iter()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
