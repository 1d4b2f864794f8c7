//! Structured observability hooks for reset runs.
//!
//! This module provides:
//! - A run-scoped tracing span (`run_span`)
//! - Emission functions for run and stage lifecycle events
//!
//! Events are emitted at `info!` level, failures at `warn!`.

use tracing::{info, warn, Span};

use crate::stage::Stage;

/// Span tagging everything logged during one run with its `run_id`.
///
/// Attach it to async code with `tracing::Instrument::instrument`.
pub fn run_span(run_id: &str) -> Span {
    tracing::info_span!("branch_reset.run", run_id = %run_id)
}

/// Emit event: run started for an app branch.
pub fn emit_run_started(run_id: &str, owner: &str, app: &str, branch: &str, reference: &str) {
    info!(
        event = "run.started",
        run_id = %run_id,
        owner = %owner,
        app = %app,
        branch = %branch,
        reference_branch = %reference,
    );
}

/// Emit event: a stage began.
pub fn emit_stage_started(run_id: &str, stage: Stage) {
    info!(event = "stage.started", run_id = %run_id, stage = %stage);
}

/// Emit event: a stage completed successfully.
pub fn emit_stage_finished(run_id: &str, stage: Stage, duration_ms: u64) {
    info!(
        event = "stage.finished",
        run_id = %run_id,
        stage = %stage,
        duration_ms = duration_ms,
    );
}

/// Emit event: run aborted (warning level).
pub fn emit_run_failed(run_id: &str, stage: Stage, kind: &str, error: &dyn std::fmt::Display) {
    warn!(
        event = "run.failed",
        run_id = %run_id,
        stage = %stage,
        kind = %kind,
        error = %error,
    );
}

/// Emit event: run finished with duration and success status.
pub fn emit_run_finished(run_id: &str, duration_ms: u64, success: bool) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        success = success,
    );
}
