//! Artifact validation against real infrastructure tooling.

pub mod docker;
pub mod exec;
pub mod terraform;

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{Artifact, Diagnostic, Result};

pub use docker::DockerValidator;
pub use exec::{run_command, CommandResult};
pub use terraform::TerraformValidator;

/// Outcome of checking one artifact.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Passed,
    Failed(Diagnostic),
}

impl Verdict {
    pub fn passed(&self) -> bool {
        matches!(self, Verdict::Passed)
    }
}

/// Checks an artifact and either accepts it or explains the rejection.
///
/// A `Failed` verdict means the artifact is wrong and worth repairing; an
/// `Err` means the validator itself could not run.
#[async_trait]
pub trait ArtifactValidator: Send + Sync {
    async fn validate(&self, artifact: &Artifact) -> Result<Verdict>;
}

/// In-memory validator serving a fixed queue of verdicts, for tests.
///
/// Once the queue drains, every further artifact passes.
pub struct ScriptedValidator {
    verdicts: Mutex<VecDeque<Verdict>>,
    seen: Mutex<Vec<Artifact>>,
}

impl ScriptedValidator {
    pub fn new() -> Self {
        Self {
            verdicts: Mutex::new(VecDeque::new()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Validator that rejects the first `n` artifacts, then accepts.
    pub fn failing_first(n: usize, stage: &str, message: &str) -> Self {
        let validator = Self::new();
        for _ in 0..n {
            validator.push_failure(stage, message);
        }
        validator
    }

    pub fn push_pass(&self) {
        self.verdicts.lock().unwrap().push_back(Verdict::Passed);
    }

    pub fn push_failure(&self, stage: &str, message: &str) {
        self.verdicts
            .lock()
            .unwrap()
            .push_back(Verdict::Failed(Diagnostic::new(stage, message)));
    }

    /// Artifacts validated so far, in order.
    pub fn seen(&self) -> Vec<Artifact> {
        self.seen.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

impl Default for ScriptedValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArtifactValidator for ScriptedValidator {
    async fn validate(&self, artifact: &Artifact) -> Result<Verdict> {
        self.seen.lock().unwrap().push(artifact.clone());
        let next = self.verdicts.lock().unwrap().pop_front();
        Ok(next.unwrap_or(Verdict::Passed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ArtifactFormat;

    #[tokio::test]
    async fn test_scripted_validator_serves_queue_then_passes() {
        let validator = ScriptedValidator::failing_first(2, "docker_build", "missing base image");
        let artifact = Artifact::new(ArtifactFormat::Dockerfile, "FROM scratch");

        let v1 = validator.validate(&artifact).await.unwrap();
        let v2 = validator.validate(&artifact).await.unwrap();
        let v3 = validator.validate(&artifact).await.unwrap();

        assert!(!v1.passed());
        assert!(!v2.passed());
        assert!(v3.passed());
        assert_eq!(validator.call_count(), 3);
    }

    #[tokio::test]
    async fn test_failed_verdict_carries_diagnostic() {
        let validator = ScriptedValidator::new();
        validator.push_failure("terraform_plan", "reference to undeclared resource");
        let artifact = Artifact::new(ArtifactFormat::TerraformHcl, "resource {}");

        match validator.validate(&artifact).await.unwrap() {
            Verdict::Failed(diag) => {
                assert_eq!(diag.stage, "terraform_plan");
                assert!(diag.message.contains("undeclared"));
            }
            Verdict::Passed => panic!("expected failure"),
        }
    }
}
