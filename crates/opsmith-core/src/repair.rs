//! Bounded generate-validate-repair loop.
//!
//! The loop drafts an artifact, validates it against real tooling, and on
//! rejection asks the source to repair it, feeding the validator's
//! diagnostic back in. A hard attempt ceiling keeps the cycle finite.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Artifact, Diagnostic, Result};
use crate::generate::ArtifactSource;
use crate::obs;
use crate::validate::{ArtifactValidator, Verdict};

/// Cooperative cancellation flag, shared with e.g. a ctrl-c handler.
pub type CancelToken = Arc<AtomicBool>;

/// Attempt budget for one loop run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopPolicy {
    /// Failed attempts tolerated before the run is abandoned. Each failed
    /// validation or failed regeneration consumes one.
    pub max_repair_attempts: u32,
}

impl Default for LoopPolicy {
    fn default() -> Self {
        Self {
            max_repair_attempts: 10,
        }
    }
}

/// How a loop run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopOutcome {
    /// An artifact passed validation.
    Validated,
    /// The attempt ceiling was crossed; the last artifact is carried for
    /// inspection but must not be trusted.
    Exhausted,
    /// The cancel token was raised between attempts.
    Cancelled,
}

/// One entry in the loop's audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transition {
    /// 1-based attempt this step belongs to (0 for the initial draft).
    pub attempt: u32,
    /// What happened: `drafted`, `repaired`, `validation_passed`,
    /// `validation_failed`, `generation_failed`, `cancelled`.
    pub step: String,
    /// Diagnostic or error text, when the step carries one.
    pub detail: Option<String>,
    pub at: DateTime<Utc>,
}

impl Transition {
    fn new(attempt: u32, step: &str, detail: Option<String>) -> Self {
        Self {
            attempt,
            step: step.to_string(),
            detail,
            at: Utc::now(),
        }
    }
}

/// Full record of one loop run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopReport {
    pub run_id: Uuid,
    pub policy: LoopPolicy,
    pub outcome: LoopOutcome,
    /// Failed attempts consumed.
    pub attempts_used: u32,
    /// Validator invocations, successful or not.
    pub validations: u32,
    /// Last artifact produced. Trustworthy only when `outcome` is
    /// [`LoopOutcome::Validated`].
    pub artifact: Option<Artifact>,
    pub last_diagnostic: Option<Diagnostic>,
    /// Every artifact that failed validation, in rejection order.
    pub history: Vec<Artifact>,
    pub transitions: Vec<Transition>,
    pub duration_ms: u64,
    pub finished_at: DateTime<Utc>,
}

impl LoopReport {
    pub fn succeeded(&self) -> bool {
        self.outcome == LoopOutcome::Validated
    }
}

/// Drives an [`ArtifactSource`] against an [`ArtifactValidator`] until an
/// artifact passes, the budget runs out, or the run is cancelled.
pub struct RepairLoop {
    validator: Arc<dyn ArtifactValidator>,
    policy: LoopPolicy,
    cancel: Option<CancelToken>,
}

impl RepairLoop {
    pub fn new(validator: Arc<dyn ArtifactValidator>) -> Self {
        Self {
            validator,
            policy: LoopPolicy::default(),
            cancel: None,
        }
    }

    pub fn with_policy(mut self, policy: LoopPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|t| t.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    /// Run the loop to completion.
    ///
    /// Fatal errors (bad preconditions, unusable tooling) abort with `Err`;
    /// everything else is absorbed into the report. `attempts_used` counts
    /// failed attempts only, so a first-try pass reports zero.
    pub async fn run(&self, source: &dyn ArtifactSource) -> Result<LoopReport> {
        let run_id = Uuid::new_v4();
        let _span = obs::RunSpan::enter(run_id);
        let start = Instant::now();

        let ceiling = self.policy.max_repair_attempts;
        let mut attempts: u32 = 0;
        let mut validations: u32 = 0;
        let mut transitions: Vec<Transition> = Vec::new();
        let mut artifact: Option<Artifact> = None;
        let mut diagnostic: Option<Diagnostic> = None;
        let mut history: Vec<Artifact> = Vec::new();

        obs::emit_loop_started(run_id, ceiling);

        let outcome = loop {
            if self.cancelled() {
                transitions.push(Transition::new(attempts, "cancelled", None));
                break LoopOutcome::Cancelled;
            }

            // Draft on the first pass, repair on every later one.
            let produced = match (&artifact, &diagnostic) {
                (Some(prior), Some(diag)) => {
                    obs::emit_repair_requested(run_id, attempts, &diag.stage);
                    source.repair(prior, diag).await.map(|a| (a, "repaired"))
                }
                _ => source.draft().await.map(|a| (a, "drafted")),
            };

            match produced {
                Ok((candidate, step)) => {
                    transitions.push(Transition::new(attempts, step, None));
                    validations += 1;
                    let verdict = match self.validator.validate(&candidate).await {
                        Ok(v) => v,
                        Err(e) if e.is_fatal() => return Err(e),
                        // A hung validator usually means a hung artifact, so
                        // the timeout text becomes the repair diagnostic.
                        Err(e) => Verdict::Failed(Diagnostic::new("validator", e.to_string())),
                    };
                    match verdict {
                        Verdict::Passed => {
                            transitions.push(Transition::new(attempts, "validation_passed", None));
                            artifact = Some(candidate);
                            diagnostic = None;
                            break LoopOutcome::Validated;
                        }
                        Verdict::Failed(diag) => {
                            attempts += 1;
                            obs::emit_validation_failed(run_id, attempts, &diag);
                            transitions.push(Transition::new(
                                attempts,
                                "validation_failed",
                                Some(diag.message.clone()),
                            ));
                            history.push(candidate.clone());
                            artifact = Some(candidate);
                            diagnostic = Some(diag);
                        }
                    }
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    // A failed regeneration burns an attempt like a failed
                    // validation does; the loop retries with the same inputs.
                    attempts += 1;
                    obs::emit_generation_failed(run_id, attempts, &e);
                    transitions.push(Transition::new(
                        attempts,
                        "generation_failed",
                        Some(e.to_string()),
                    ));
                }
            }

            if attempts > ceiling {
                break LoopOutcome::Exhausted;
            }
        };

        let report = LoopReport {
            run_id,
            policy: self.policy.clone(),
            outcome,
            attempts_used: attempts,
            validations,
            artifact,
            last_diagnostic: diagnostic,
            history,
            transitions,
            duration_ms: start.elapsed().as_millis() as u64,
            finished_at: Utc::now(),
        };
        obs::emit_loop_finished(run_id, &report);
        Ok(report)
    }
}
