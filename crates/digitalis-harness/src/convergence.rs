// crates/digitalis-harness/src/convergence.rs
// ============================================================================
// Module: Index Convergence
// Description: Bounded wait for the secondary index to catch up.
// Purpose: Gate read-by-query assertions on "no outstanding index work".
// Dependencies: digitalis-core, thiserror, tokio
// ============================================================================

//! ## Overview
//! [`await_convergence`] polls [`IndexStats`] until `pending` reaches zero.
//! It keeps no state between calls and returns on the first poll when
//! nothing is outstanding. A timeout is a hard failure carrying the pending
//! count it last observed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;
use std::time::Instant;

use digitalis_core::DocumentStore;
use digitalis_core::IndexStats;
use digitalis_core::SharedDocumentStore;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Convergence timeout used by sessions unless a test asks otherwise.
pub const DEFAULT_CONVERGENCE_TIMEOUT: Duration = Duration::from_secs(10);
/// Delay between index polls.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Convergence failures.
#[derive(Debug, Error)]
pub enum ConvergenceError {
    /// Index work was still outstanding at the deadline.
    #[error("index did not converge: {pending} pending after {}ms", .elapsed.as_millis())]
    Timeout {
        /// Outstanding documents at the last poll.
        pending: u64,
        /// Time spent waiting.
        elapsed: Duration,
    },
    /// Index statistics could not be read.
    #[error("index stats unavailable: {0}")]
    Store(String),
}

// ============================================================================
// SECTION: Waiter
// ============================================================================

/// Waits until `store` reports no pending index work.
///
/// # Errors
///
/// Returns [`ConvergenceError::Timeout`] when work is still pending after
/// `timeout`, or [`ConvergenceError::Store`] when stats cannot be read.
pub async fn await_convergence(
    store: &SharedDocumentStore,
    timeout: Duration,
) -> Result<IndexStats, ConvergenceError> {
    let started = Instant::now();
    loop {
        let stats = read_stats(store).await?;
        if stats.is_converged() {
            return Ok(stats);
        }
        let elapsed = started.elapsed();
        if elapsed >= timeout {
            return Err(ConvergenceError::Timeout {
                pending: stats.pending,
                elapsed,
            });
        }
        tokio::time::sleep(POLL_INTERVAL.min(timeout - elapsed)).await;
    }
}

/// Reads index stats on the blocking pool.
async fn read_stats(store: &SharedDocumentStore) -> Result<IndexStats, ConvergenceError> {
    let store = store.clone();
    tokio::task::spawn_blocking(move || store.index_stats())
        .await
        .map_err(|err| ConvergenceError::Store(err.to_string()))?
        .map_err(|err| ConvergenceError::Store(err.to_string()))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
