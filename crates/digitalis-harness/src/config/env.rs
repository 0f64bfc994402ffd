// crates/digitalis-harness/src/config/env.rs
// ============================================================================
// Module: Harness Environment
// Description: Environment-backed configuration for harness sessions.
// Purpose: Centralize env parsing with strict UTF-8 validation.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Environment values are parsed with strict UTF-8 enforcement. Invalid
//! values fail closed instead of falling back to defaults. Timeout variables
//! act as floors: they can lengthen a wait a test asks for, never shorten it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// SECTION: Environment Constants
// ============================================================================

/// Environment keys for harness configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessEnv {
    /// Enables the interactive pause (`true`/`false` or `1`/`0`).
    InteractivePause,
    /// Minimum convergence timeout in seconds.
    ConvergenceTimeoutSeconds,
    /// Minimum request and startup timeout in seconds.
    TimeoutSeconds,
}

impl HarnessEnv {
    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InteractivePause => "DIGITALIS_TEST_INTERACTIVE_PAUSE",
            Self::ConvergenceTimeoutSeconds => "DIGITALIS_TEST_CONVERGENCE_TIMEOUT_SEC",
            Self::TimeoutSeconds => "DIGITALIS_TEST_TIMEOUT_SEC",
        }
    }
}

// ============================================================================
// SECTION: Config Types
// ============================================================================

/// Typed harness configuration derived from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HarnessConfig {
    /// Whether [`crate::wait_for_user_to_continue`] blocks for input.
    pub interactive_pause: bool,
    /// Optional convergence timeout floor.
    pub convergence_timeout: Option<Duration>,
    /// Optional request and startup timeout floor.
    pub timeout: Option<Duration>,
}

impl HarnessConfig {
    /// Loads configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error when a value is not valid UTF-8, is empty, or fails
    /// validation.
    pub fn load() -> Result<Self, String> {
        Self::from_lookup(read_env_strict)
    }

    /// Loads configuration through a variable lookup function.
    ///
    /// # Errors
    ///
    /// Returns an error when the lookup fails or a value fails validation.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Result<Option<String>, String>,
    {
        let read = |key: HarnessEnv| read_nonempty(&lookup, key.as_str());
        let interactive_pause = parse_bool_env(
            HarnessEnv::InteractivePause.as_str(),
            read(HarnessEnv::InteractivePause)?,
        )?;
        let convergence_timeout = read(HarnessEnv::ConvergenceTimeoutSeconds)?
            .map(|value| {
                parse_timeout_seconds(HarnessEnv::ConvergenceTimeoutSeconds.as_str(), &value)
            })
            .transpose()?;
        let timeout = read(HarnessEnv::TimeoutSeconds)?
            .map(|value| parse_timeout_seconds(HarnessEnv::TimeoutSeconds.as_str(), &value))
            .transpose()?;
        Ok(Self {
            interactive_pause,
            convergence_timeout,
            timeout,
        })
    }

    /// Returns `requested` raised to the convergence timeout floor.
    #[must_use]
    pub fn convergence_timeout_or(&self, requested: Duration) -> Duration {
        self.convergence_timeout.map_or(requested, |floor| requested.max(floor))
    }

    /// Returns `requested` raised to the request timeout floor.
    #[must_use]
    pub fn timeout_or(&self, requested: Duration) -> Duration {
        self.timeout.map_or(requested, |floor| requested.max(floor))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads an environment variable and enforces UTF-8 validity.
///
/// # Errors
///
/// Returns an error when the environment variable contains invalid UTF-8.
pub fn read_env_strict(name: &str) -> Result<Option<String>, String> {
    std::env::var_os(name).map_or(Ok(None), |raw| {
        raw.into_string().map(Some).map_err(|_| format!("{name} must be valid UTF-8"))
    })
}

/// Reads a variable through `lookup` and rejects empty values.
fn read_nonempty<F>(lookup: &F, name: &str) -> Result<Option<String>, String>
where
    F: Fn(&str) -> Result<Option<String>, String>,
{
    match lookup(name)? {
        Some(value) if value.trim().is_empty() => Err(format!("{name} must not be empty")),
        Some(value) => Ok(Some(value)),
        None => Ok(None),
    }
}

/// Parses a positive whole number of seconds.
fn parse_timeout_seconds(name: &str, raw: &str) -> Result<Duration, String> {
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("{name} must be a positive integer number of seconds"))?;
    if secs == 0 {
        return Err(format!("{name} must be greater than zero"));
    }
    Ok(Duration::from_secs(secs))
}

/// Parses a boolean flag; unset means false.
fn parse_bool_env(name: &str, raw: Option<String>) -> Result<bool, String> {
    let Some(value) = raw else {
        return Ok(false);
    };
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("true") || trimmed == "1" {
        return Ok(true);
    }
    if trimmed.eq_ignore_ascii_case("false") || trimmed == "0" {
        return Ok(false);
    }
    Err(format!("{name} must be 1, 0, true, or false"))
}
