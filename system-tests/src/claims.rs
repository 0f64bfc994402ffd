// system-tests/src/claims.rs
// ============================================================================
// Module: Scenario Claims
// Description: Claim set presets for entry scenarios.
// Purpose: Name the privilege levels scenarios run under.
// Dependencies: digitalis-core
// ============================================================================

use digitalis_core::Claim;
use digitalis_core::ClaimSet;
use digitalis_core::CreateEntryCommand;
use digitalis_core::DigitalisClaims;

/// Tags submitted by the canonical create-then-fetch scenario.
pub const SAMPLE_TAGS: [&str; 3] = ["tag1", "tag2", "tag3"];

/// Claims allowing `POST /entry` only.
#[must_use]
pub fn create_only() -> ClaimSet {
    ClaimSet::permissions([DigitalisClaims::CREATE_ENTRY])
}

/// Claims allowing `GET /entry` and `GET /entries` only.
#[must_use]
pub fn fetch_only() -> ClaimSet {
    ClaimSet::permissions([DigitalisClaims::FETCH_ENTRY])
}

/// Claims allowing every entry route.
#[must_use]
pub fn create_and_fetch() -> ClaimSet {
    ClaimSet::permissions([DigitalisClaims::CREATE_ENTRY, DigitalisClaims::FETCH_ENTRY])
}

/// Claim sets that must never read entries.
#[must_use]
pub fn without_fetch() -> Vec<ClaimSet> {
    vec![
        ClaimSet::empty(),
        create_only(),
        ClaimSet::new([Claim::new("team", "readers")]),
        ClaimSet::new([Claim::new(DigitalisClaims::CREATE_ENTRY, DigitalisClaims::FETCH_ENTRY)]),
        ClaimSet::permissions(["digitalis:entry:fetch:all", "DIGITALIS:ENTRY:FETCH"]),
    ]
}

/// The canonical create command.
#[must_use]
pub fn sample_command() -> CreateEntryCommand {
    CreateEntryCommand::new(SAMPLE_TAGS)
}
