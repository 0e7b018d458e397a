//! Terraform validation via `init` and `plan` in a throwaway workspace.

use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use super::exec::run_command;
use super::{ArtifactValidator, Verdict};
use crate::domain::{Artifact, Diagnostic, Result};

const INIT_TIMEOUT: Duration = Duration::from_secs(300);
const PLAN_TIMEOUT: Duration = Duration::from_secs(300);

/// Validates HCL by writing it to a fresh temporary directory and running
/// `terraform init` then `terraform plan` there.
///
/// The workspace is a [`TempDir`], so provider caches and state files are
/// dropped with it; nothing is ever applied.
pub struct TerraformValidator;

impl TerraformValidator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TerraformValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArtifactValidator for TerraformValidator {
    async fn validate(&self, artifact: &Artifact) -> Result<Verdict> {
        let workspace = TempDir::new()?;
        tokio::fs::write(workspace.path().join("main.tf"), &artifact.body).await?;

        let init = run_command(
            "terraform_init",
            "terraform",
            &["init", "-input=false", "-no-color"],
            workspace.path(),
            INIT_TIMEOUT,
        )
        .await?;

        if !init.passed() {
            return Ok(Verdict::Failed(
                Diagnostic::new("terraform_init", init.combined_output())
                    .with_exit_code(init.exit_code),
            ));
        }

        let plan = run_command(
            "terraform_plan",
            "terraform",
            &["plan", "-input=false", "-no-color"],
            workspace.path(),
            PLAN_TIMEOUT,
        )
        .await?;

        if !plan.passed() {
            return Ok(Verdict::Failed(
                Diagnostic::new("terraform_plan", plan.combined_output())
                    .with_exit_code(plan.exit_code),
            ));
        }

        tracing::info!(
            init_ms = init.duration_ms,
            plan_ms = plan.duration_ms,
            "terraform plan clean"
        );
        Ok(Verdict::Passed)
    }
}
