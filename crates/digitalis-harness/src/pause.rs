// crates/digitalis-harness/src/pause.rs
// ============================================================================
// Module: Interactive Pause
// Description: Manual debugging hook that holds a test until Enter is pressed.
// Purpose: Let a developer inspect a live session mid-test.
// Dependencies: digitalis-core, tokio
// ============================================================================

//! ## Overview
//! The pause is off unless `DIGITALIS_TEST_INTERACTIVE_PAUSE` is `1` or
//! `true`. When disabled it returns at once and touches neither stdin nor the
//! store, so automated runs never block.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::BufRead;
use std::io::Write;

use digitalis_core::DocumentStore;
use digitalis_core::IndexStats;
use digitalis_core::SharedDocumentStore;

use crate::HarnessError;
use crate::config::HarnessConfig;

// ============================================================================
// SECTION: Pause
// ============================================================================

/// Blocks until the user presses Enter, when the pause is enabled.
///
/// Returns `true` when the test was actually paused.
///
/// # Errors
///
/// Returns [`HarnessError`] when stats cannot be read or the terminal fails.
pub async fn wait_for_user_to_continue(
    store: &SharedDocumentStore,
    config: &HarnessConfig,
    context: &str,
) -> Result<bool, HarnessError> {
    if !config.interactive_pause {
        return Ok(false);
    }
    let store = store.clone();
    let context = context.to_string();
    tokio::task::spawn_blocking(move || {
        let stats = store.index_stats().map_err(|err| HarnessError::Transport(err.to_string()))?;
        let summary = pause_summary(&context, stats);
        prompt_and_wait(&summary, std::io::stdin().lock(), std::io::stderr())
            .map_err(|err| HarnessError::Transport(format!("interactive pause: {err}")))
    })
    .await
    .map_err(|err| HarnessError::Transport(format!("interactive pause: {err}")))??;
    Ok(true)
}

/// Formats the store summary shown while paused.
fn pause_summary(context: &str, stats: IndexStats) -> String {
    format!(
        "digitalis harness paused ({context}): indexed_documents={} pending={} indexer_paused={}",
        stats.indexed_documents, stats.pending, stats.paused
    )
}

/// Writes the summary and waits for one input line.
fn prompt_and_wait<R, W>(summary: &str, mut input: R, mut output: W) -> std::io::Result<()>
where
    R: BufRead,
    W: Write,
{
    writeln!(output, "{summary}")?;
    writeln!(output, "press Enter to continue")?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
