// crates/digitalis-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared fixtures for digitalis-config tests.
// Purpose: Build minimal valid configurations for targeted mutation.
// =============================================================================

#![allow(dead_code, reason = "Helpers are shared across test binaries.")]

use digitalis_config::ConfigError;
use digitalis_config::DigitalisConfig;
use digitalis_config::TokenGrantConfig;

/// Returns the smallest valid configuration.
pub fn minimal_config() -> Result<DigitalisConfig, ConfigError> {
    DigitalisConfig::from_toml_str("")
}

/// Returns a token grant with the given claim types.
pub fn grant(token: &str, claim_types: &[&str]) -> TokenGrantConfig {
    TokenGrantConfig {
        token: token.to_string(),
        subject: None,
        claims: claim_types
            .iter()
            .map(|claim_type| digitalis_config::ClaimConfig {
                claim_type: (*claim_type).to_string(),
                value: String::new(),
            })
            .collect(),
    }
}

/// Asserts that `result` failed with a message containing `needle`.
pub fn assert_invalid(result: Result<(), ConfigError>, needle: &str) -> Result<(), String> {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(()) => Err("expected invalid config".to_string()),
    }
}
