//! Structured observability hooks for loop lifecycle events.
//!
//! Events are emitted at `info!` level through `tracing`; binaries choose
//! the subscriber via [`crate::telemetry::init_tracing`].

use tracing::info;
use uuid::Uuid;

use crate::domain::{Diagnostic, OpsmithError};
use crate::repair::LoopReport;

/// RAII guard that enters a run-scoped tracing span.
///
/// While held, every tracing call carries the run id.
pub struct RunSpan {
    _span: tracing::span::EnteredSpan,
}

impl RunSpan {
    pub fn enter(run_id: Uuid) -> Self {
        let span = tracing::info_span!("opsmith.run", run_id = %run_id);
        Self {
            _span: span.entered(),
        }
    }
}

pub fn emit_loop_started(run_id: Uuid, max_repair_attempts: u32) {
    info!(
        event = "loop.started",
        run_id = %run_id,
        max_repair_attempts = max_repair_attempts,
    );
}

pub fn emit_repair_requested(run_id: Uuid, attempt: u32, stage: &str) {
    info!(event = "loop.repair_requested", run_id = %run_id, attempt = attempt, stage = %stage);
}

pub fn emit_validation_failed(run_id: Uuid, attempt: u32, diagnostic: &Diagnostic) {
    info!(
        event = "loop.validation_failed",
        run_id = %run_id,
        attempt = attempt,
        stage = %diagnostic.stage,
        exit_code = diagnostic.exit_code,
    );
}

pub fn emit_generation_failed(run_id: Uuid, attempt: u32, error: &OpsmithError) {
    tracing::warn!(event = "loop.generation_failed", run_id = %run_id, attempt = attempt, error = %error);
}

pub fn emit_loop_finished(run_id: Uuid, report: &LoopReport) {
    info!(
        event = "loop.finished",
        run_id = %run_id,
        outcome = ?report.outcome,
        attempts_used = report.attempts_used,
        validations = report.validations,
        duration_ms = report.duration_ms,
    );
}
