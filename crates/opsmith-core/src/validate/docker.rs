//! Dockerfile validation through a real image build and smoke run.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use super::exec::run_command;
use super::{ArtifactValidator, Verdict};
use crate::domain::{Artifact, Diagnostic, Result};

const BUILD_TIMEOUT: Duration = Duration::from_secs(600);
const RUN_TIMEOUT: Duration = Duration::from_secs(60);

/// How long the smoke container must stay up before it counts as healthy.
const SMOKE_GRACE: Duration = Duration::from_secs(5);

/// Validates a Dockerfile by building it in the project context and
/// briefly running the resulting image.
///
/// The smoke container is hardened (`--cap-drop ALL`, no new privileges,
/// read-only rootfs) since the image content is model-generated. Teardown
/// of the container and image runs on every path, pass or fail.
pub struct DockerValidator {
    context_dir: PathBuf,
    smoke_run: bool,
}

impl DockerValidator {
    pub fn new(context_dir: impl Into<PathBuf>) -> Self {
        Self {
            context_dir: context_dir.into(),
            smoke_run: true,
        }
    }

    /// Build-only validation, for images with no meaningful idle process.
    pub fn without_smoke_run(mut self) -> Self {
        self.smoke_run = false;
        self
    }

    async fn smoke_test(&self, tag: &str) -> Result<Verdict> {
        let container = format!("{tag}-smoke");
        // Even an errored `docker run` may have created the named container,
        // so it is removed before any error propagates.
        let run = match run_command(
            "docker_run",
            "docker",
            &[
                "run",
                "-d",
                "--name",
                &container,
                "--security-opt",
                "no-new-privileges",
                "--cap-drop",
                "ALL",
                "--read-only",
                tag,
            ],
            &self.context_dir,
            RUN_TIMEOUT,
        )
        .await
        {
            Ok(result) => result,
            Err(e) => {
                self.remove_container(&container).await;
                return Err(e);
            }
        };

        if !run.passed() {
            self.remove_container(&container).await;
            return Ok(Verdict::Failed(
                Diagnostic::new("docker_run", run.combined_output()).with_exit_code(run.exit_code),
            ));
        }

        tokio::time::sleep(SMOKE_GRACE).await;

        let inspect = run_command(
            "docker_inspect",
            "docker",
            &["inspect", "--format", "{{.State.Running}}", &container],
            &self.context_dir,
            RUN_TIMEOUT,
        )
        .await;

        let verdict = match inspect {
            Ok(result) if result.passed() && result.stdout.trim() == "true" => Verdict::Passed,
            Ok(_) => {
                // Container exited; its logs are the most useful diagnostic.
                let logs = run_command(
                    "docker_logs",
                    "docker",
                    &["logs", &container],
                    &self.context_dir,
                    RUN_TIMEOUT,
                )
                .await
                .map(|r| r.combined_output())
                .unwrap_or_default();
                Verdict::Failed(Diagnostic::new(
                    "docker_run",
                    format!("container exited during smoke run\n{logs}"),
                ))
            }
            Err(e) => {
                self.remove_container(&container).await;
                return Err(e);
            }
        };

        self.remove_container(&container).await;
        Ok(verdict)
    }

    /// Best-effort container removal; failures here must never mask the verdict.
    async fn remove_container(&self, container: &str) {
        if let Err(e) = run_command(
            "docker_rm",
            "docker",
            &["rm", "-f", container],
            &self.context_dir,
            RUN_TIMEOUT,
        )
        .await
        {
            tracing::warn!(container, error = %e, "container teardown failed");
        }
    }

    /// Best-effort image removal.
    async fn remove_image(&self, tag: &str) {
        if let Err(e) = run_command(
            "docker_rmi",
            "docker",
            &["rmi", "-f", tag],
            &self.context_dir,
            RUN_TIMEOUT,
        )
        .await
        {
            tracing::warn!(tag, error = %e, "image teardown failed");
        }
    }
}

#[async_trait]
impl ArtifactValidator for DockerValidator {
    async fn validate(&self, artifact: &Artifact) -> Result<Verdict> {
        let dockerfile_path = self.context_dir.join("Dockerfile");
        tokio::fs::write(&dockerfile_path, &artifact.body).await?;

        let tag = format!("opsmith-check-{}", uuid::Uuid::new_v4().simple());

        let build = run_command(
            "docker_build",
            "docker",
            &["build", "-t", &tag, "."],
            &self.context_dir,
            BUILD_TIMEOUT,
        )
        .await?;

        if !build.passed() {
            return Ok(Verdict::Failed(
                Diagnostic::new("docker_build", build.combined_output())
                    .with_exit_code(build.exit_code),
            ));
        }

        tracing::info!(tag, duration_ms = build.duration_ms, "image built");

        let verdict = if self.smoke_run {
            let v = self.smoke_test(&tag).await;
            self.remove_image(&tag).await;
            v?
        } else {
            self.remove_image(&tag).await;
            Verdict::Passed
        };

        Ok(verdict)
    }
}
