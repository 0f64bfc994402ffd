// crates/digitalis-harness/src/overrides.rs
// ============================================================================
// Module: Dependency Overrides
// Description: Per-session registry of replacement dependencies.
// Purpose: Swap storage, notification, and audit for doubles before start.
// Dependencies: digitalis-core, digitalis-server, thiserror
// ============================================================================

//! ## Overview
//! [`DependencyOverrides`] collects one instance per [`DependencyRole`].
//! Installing the same role twice keeps the later instance. The registry is
//! consumed when a session starts, so nothing can be installed afterwards.
//!
//! ## Invariants
//! - Storage and notification are required. A missing one is a
//!   [`CompositionError`], never a silent fallback to a real dependency.
//! - Audit is optional and defaults to a no-op sink.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use digitalis_core::DocumentStore;
use digitalis_core::Mailer;
use digitalis_core::SharedDocumentStore;
use digitalis_core::SharedMailer;
use digitalis_server::AuditSink;
use digitalis_server::ServerComponents;
use digitalis_server::SharedIdentityPolicy;
use thiserror::Error;

// ============================================================================
// SECTION: Roles
// ============================================================================

/// Replaceable dependency slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DependencyRole {
    /// Document store backing entries.
    Storage,
    /// Outbound notification mailer.
    Notification,
    /// Access audit sink.
    Audit,
}

impl fmt::Display for DependencyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Storage => "storage",
            Self::Notification => "notification",
            Self::Audit => "audit",
        };
        f.write_str(label)
    }
}

/// One replacement dependency tagged with its role.
#[derive(Clone)]
pub enum DependencyOverride {
    /// Storage replacement.
    Storage(SharedDocumentStore),
    /// Notification replacement.
    Notification(SharedMailer),
    /// Audit replacement.
    Audit(Arc<dyn AuditSink>),
}

impl DependencyOverride {
    /// Wraps a document store.
    #[must_use]
    pub fn storage(store: impl DocumentStore + 'static) -> Self {
        Self::Storage(SharedDocumentStore::from_store(store))
    }

    /// Wraps a shared mailer.
    #[must_use]
    pub fn notification(mailer: Arc<dyn Mailer>) -> Self {
        Self::Notification(SharedMailer::new(mailer))
    }

    /// Wraps a shared audit sink.
    #[must_use]
    pub fn audit(audit: Arc<dyn AuditSink>) -> Self {
        Self::Audit(audit)
    }

    /// Returns the role this override fills.
    #[must_use]
    pub const fn role(&self) -> DependencyRole {
        match self {
            Self::Storage(_) => DependencyRole::Storage,
            Self::Notification(_) => DependencyRole::Notification,
            Self::Audit(_) => DependencyRole::Audit,
        }
    }
}

impl fmt::Debug for DependencyOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DependencyOverride").field(&self.role()).finish()
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Session composition errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositionError {
    /// A required role has no override.
    #[error("missing {0} override; install a test double before starting the session")]
    MissingOverride(DependencyRole),
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Overrides collected before a session starts.
#[derive(Debug, Clone, Default)]
pub struct DependencyOverrides {
    /// Installed overrides keyed by role.
    installed: BTreeMap<DependencyRole, DependencyOverride>,
}

impl DependencyOverrides {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs an override, returning the one it replaced.
    pub fn install(&mut self, dependency: DependencyOverride) -> Option<DependencyOverride> {
        self.installed.insert(dependency.role(), dependency)
    }

    /// Installs an override and returns the registry.
    #[must_use]
    pub fn with(mut self, dependency: DependencyOverride) -> Self {
        self.install(dependency);
        self
    }

    /// Returns true when `role` has an override.
    #[must_use]
    pub fn contains(&self, role: DependencyRole) -> bool {
        self.installed.contains_key(&role)
    }

    /// Returns the installed storage override.
    ///
    /// # Errors
    ///
    /// Returns [`CompositionError::MissingOverride`] when storage is missing.
    pub fn storage(&self) -> Result<SharedDocumentStore, CompositionError> {
        match self.installed.get(&DependencyRole::Storage) {
            Some(DependencyOverride::Storage(store)) => Ok(store.clone()),
            _ => Err(CompositionError::MissingOverride(DependencyRole::Storage)),
        }
    }

    /// Consumes the registry into server components.
    ///
    /// # Errors
    ///
    /// Returns [`CompositionError::MissingOverride`] when a required role is
    /// missing.
    pub fn into_components(
        mut self,
        identity: SharedIdentityPolicy,
    ) -> Result<ServerComponents, CompositionError> {
        let Some(DependencyOverride::Storage(store)) =
            self.installed.remove(&DependencyRole::Storage)
        else {
            return Err(CompositionError::MissingOverride(DependencyRole::Storage));
        };
        let Some(DependencyOverride::Notification(mailer)) =
            self.installed.remove(&DependencyRole::Notification)
        else {
            return Err(CompositionError::MissingOverride(DependencyRole::Notification));
        };
        let components = ServerComponents::new(store, mailer, identity);
        Ok(match self.installed.remove(&DependencyRole::Audit) {
            Some(DependencyOverride::Audit(audit)) => components.with_audit(audit),
            _ => components,
        })
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
