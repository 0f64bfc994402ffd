// crates/digitalis-config/src/config.rs
// ============================================================================
// Module: Digitalis Configuration
// Description: Configuration model, loading, and validation.
// Purpose: Parse digitalis.toml into a validated, fail-closed configuration.
// Dependencies: digitalis-core, digitalis-store-sqlite, serde, toml, thiserror
// ============================================================================

//! ## Overview
//! Configuration is resolved from an explicit path, then the
//! [`CONFIG_ENV_VAR`] environment variable, then [`DEFAULT_CONFIG_NAME`] in
//! the working directory. Every section has defaults, so an empty file is a
//! valid in-memory development configuration with no bearer tokens (every
//! protected route then answers 401).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use digitalis_core::Claim;
use digitalis_core::ClaimSet;
use digitalis_store_sqlite::SqliteStoreConfig;
use digitalis_store_sqlite::SqliteStoreMode;
use digitalis_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable naming the config file path.
pub const CONFIG_ENV_VAR: &str = "DIGITALIS_CONFIG";
/// Default config file name.
pub const DEFAULT_CONFIG_NAME: &str = "digitalis.toml";
/// Maximum config file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Default bind address.
const DEFAULT_BIND: &str = "127.0.0.1:8080";
/// Default maximum request body size.
const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
/// Hard upper bound for `server.max_body_bytes`.
pub const MAX_BODY_BYTES_LIMIT: usize = 16 * 1024 * 1024;
/// Minimum bearer token length.
const MIN_TOKEN_LENGTH: usize = 16;
/// Default store busy timeout (ms).
const DEFAULT_STORE_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Default indexer poll interval (ms).
const DEFAULT_INDEX_POLL_INTERVAL_MS: u64 = 10;
/// Default indexer batch size.
const DEFAULT_INDEX_BATCH_SIZE: usize = 64;

// ============================================================================
// SECTION: Root Config
// ============================================================================

/// Root configuration for the Digitalis server.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DigitalisConfig {
    /// HTTP listener and authentication settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Document store backend.
    #[serde(default)]
    pub store: StoreConfig,
    /// Entry notification addresses.
    #[serde(default)]
    pub notifications: NotificationConfig,
}

impl DigitalisConfig {
    /// Loads configuration from disk using the standard resolution order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, parsed, or
    /// validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path, env::var(CONFIG_ENV_VAR).ok())?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", resolved.display())))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        if content.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.store.validate()?;
        self.notifications.validate()?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Bearer token grants.
    #[serde(default)]
    pub auth: ServerAuthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
            auth: ServerAuthConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Returns the parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `bind` is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("server.bind is invalid: {}", self.bind)))
    }

    /// Validates server configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "server.max_body_bytes must be greater than zero".to_string(),
            ));
        }
        if self.max_body_bytes > MAX_BODY_BYTES_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "server.max_body_bytes exceeds limit of {MAX_BODY_BYTES_LIMIT}"
            )));
        }
        self.auth.validate()
    }
}

/// Static bearer token grants.
///
/// # Invariants
/// - Tokens are unique and at least [`MIN_TOKEN_LENGTH`] bytes long.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerAuthConfig {
    /// Accepted tokens and the claims each one grants.
    #[serde(default)]
    pub tokens: Vec<TokenGrantConfig>,
}

impl ServerAuthConfig {
    /// Validates token grants.
    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = BTreeSet::new();
        for grant in &self.tokens {
            grant.validate()?;
            if !seen.insert(grant.token.as_str()) {
                return Err(ConfigError::Invalid(
                    "duplicate server.auth.tokens.token".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// One bearer token and its claim grants.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrantConfig {
    /// Opaque bearer token.
    pub token: String,
    /// Optional subject label reported in audit events.
    #[serde(default)]
    pub subject: Option<String>,
    /// Claims granted to callers presenting the token.
    #[serde(default)]
    pub claims: Vec<ClaimConfig>,
}

impl TokenGrantConfig {
    /// Returns the granted claims as a claim set, in declaration order.
    #[must_use]
    pub fn claim_set(&self) -> ClaimSet {
        self.claims.iter().map(ClaimConfig::to_claim).collect()
    }

    /// Validates one grant.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.token.trim() != self.token {
            return Err(ConfigError::Invalid(
                "server.auth.tokens.token must not contain surrounding whitespace".to_string(),
            ));
        }
        if self.token.len() < MIN_TOKEN_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "server.auth.tokens.token must be at least {MIN_TOKEN_LENGTH} bytes"
            )));
        }
        if self.token.chars().any(char::is_control) {
            return Err(ConfigError::Invalid(
                "server.auth.tokens.token must not contain control characters".to_string(),
            ));
        }
        if let Some(subject) = &self.subject
            && subject.trim().is_empty()
        {
            return Err(ConfigError::Invalid(
                "server.auth.tokens.subject must be non-empty when set".to_string(),
            ));
        }
        for claim in &self.claims {
            if claim.claim_type.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "server.auth.tokens.claims.type must be non-empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Claim declared in configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ClaimConfig {
    /// Claim type.
    #[serde(rename = "type")]
    pub claim_type: String,
    /// Claim value (defaults to empty).
    #[serde(default)]
    pub value: String,
}

impl ClaimConfig {
    /// Converts to a core claim.
    #[must_use]
    pub fn to_claim(&self) -> Claim {
        Claim::new(self.claim_type.clone(), self.value.clone())
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Document store backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    /// Use the in-memory store.
    #[default]
    Memory,
    /// Use the `SQLite`-backed durable store.
    Sqlite,
}

/// Document store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Store backend type.
    #[serde(rename = "type", default)]
    pub store_type: StoreType,
    /// `SQLite` database path when using the sqlite backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_store_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
    /// Indexer poll interval in milliseconds.
    #[serde(default = "default_index_poll_interval_ms")]
    pub index_poll_interval_ms: u64,
    /// Maximum documents indexed per batch.
    #[serde(default = "default_index_batch_size")]
    pub index_batch_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_type: StoreType::default(),
            path: None,
            busy_timeout_ms: default_store_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
            index_poll_interval_ms: default_index_poll_interval_ms(),
            index_batch_size: default_index_batch_size(),
        }
    }
}

impl StoreConfig {
    /// Returns the `SQLite` store config when the sqlite backend is selected.
    #[must_use]
    pub fn sqlite_config(&self) -> Option<SqliteStoreConfig> {
        match self.store_type {
            StoreType::Memory => None,
            StoreType::Sqlite => self.path.as_ref().map(|path| SqliteStoreConfig {
                path: path.clone(),
                busy_timeout_ms: self.busy_timeout_ms,
                journal_mode: self.journal_mode,
                sync_mode: self.sync_mode,
                index_poll_interval_ms: self.index_poll_interval_ms,
                index_batch_size: self.index_batch_size,
            }),
        }
    }

    /// Validates store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.store_type {
            StoreType::Memory => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid("memory store must not set path".to_string()));
                }
            }
            StoreType::Sqlite => {
                let path = self.path.as_ref().ok_or_else(|| {
                    ConfigError::Invalid("sqlite store requires path".to_string())
                })?;
                validate_path(path)?;
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::Invalid("store.path must be non-empty".to_string()));
                }
            }
        }
        if self.index_poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "store.index_poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.index_batch_size == 0 {
            return Err(ConfigError::Invalid(
                "store.index_batch_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Notifications
// ============================================================================

/// Addresses used for entry-created notifications.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    /// Sender address.
    #[serde(default = "default_sender")]
    pub sender: String,
    /// Recipient address.
    #[serde(default = "default_recipient")]
    pub recipient: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            sender: default_sender(),
            recipient: default_recipient(),
        }
    }
}

impl NotificationConfig {
    /// Validates notification addresses.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_address("notifications.sender", &self.sender)?;
        validate_address("notifications.recipient", &self.recipient)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the default bind address.
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

/// Returns the default body limit.
const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Returns the default store busy timeout.
const fn default_store_busy_timeout_ms() -> u64 {
    DEFAULT_STORE_BUSY_TIMEOUT_MS
}

/// Returns the default indexer poll interval.
const fn default_index_poll_interval_ms() -> u64 {
    DEFAULT_INDEX_POLL_INTERVAL_MS
}

/// Returns the default indexer batch size.
const fn default_index_batch_size() -> usize {
    DEFAULT_INDEX_BATCH_SIZE
}

/// Returns the default notification sender.
fn default_sender() -> String {
    "digitalis@localhost".to_string()
}

/// Returns the default notification recipient.
fn default_recipient() -> String {
    "entries@localhost".to_string()
}

/// Resolves the config path from the CLI value or the environment value.
pub(crate) fn resolve_path(
    path: Option<&Path>,
    env_value: Option<String>,
) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Some(env_path) = env_value {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates a path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("path exceeds max length".to_string()));
    }
    for component in path.components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a mail address with a minimal `local@domain` shape check.
fn validate_address(field: &str, value: &str) -> Result<(), ConfigError> {
    let Some((local, domain)) = value.split_once('@') else {
        return Err(ConfigError::Invalid(format!("{field} must be an email address")));
    };
    if local.is_empty() || domain.is_empty() || value.chars().any(char::is_whitespace) {
        return Err(ConfigError::Invalid(format!("{field} must be an email address")));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
