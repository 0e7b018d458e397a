//! Three-stage Terraform pipeline: cluster shape, workload descriptor,
//! final HCL.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::{prose_stage, regenerate, ArtifactSource};
use crate::domain::{
    Artifact, ArtifactFormat, ClusterSpec, Diagnostic, Requirement, Result, Strategy,
    WorkloadDescriptor,
};
use crate::extract::{extract_artifact, extract_fenced};
use crate::gateway::TextGateway;
use crate::prompts;

pub struct TerraformGenerator {
    gateway: Arc<dyn TextGateway>,
    strategy: Strategy,
    requirement: Requirement,

    /// Body of the Dockerfile the workload descriptor is derived from.
    dockerfile_body: String,
}

impl TerraformGenerator {
    pub fn new(
        gateway: Arc<dyn TextGateway>,
        strategy: Strategy,
        requirement: Requirement,
        dockerfile_body: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            strategy,
            requirement,
            dockerfile_body: dockerfile_body.into(),
        }
    }

    /// Stage 2: task definition JSON parsed into a typed descriptor.
    pub(crate) async fn workload_descriptor(&self) -> Result<WorkloadDescriptor> {
        let response = prose_stage(
            self.gateway.as_ref(),
            "task_definition",
            &prompts::task_definition(&self.dockerfile_body),
        )
        .await?;
        let json = extract_fenced(&response, "json")?;
        WorkloadDescriptor::parse(&json)
    }
}

#[async_trait]
impl ArtifactSource for TerraformGenerator {
    async fn draft(&self) -> Result<Artifact> {
        let details = prose_stage(
            self.gateway.as_ref(),
            "cluster_spec",
            &prompts::cluster_spec("Terraform", self.strategy, self.requirement.as_str()),
        )
        .await?;
        let cluster = ClusterSpec::from_stage_output(self.strategy, details)?;
        info!(event = "generate.stage_done", stage = "cluster_spec", strategy = %self.strategy);

        let workload = self.workload_descriptor().await?;
        info!(event = "generate.stage_done", stage = "task_definition", family = %workload.family);

        let response = prose_stage(
            self.gateway.as_ref(),
            "terraform",
            &prompts::terraform(&cluster, &workload),
        )
        .await?;

        extract_artifact(&response, ArtifactFormat::TerraformHcl)
    }

    async fn repair(&self, prior: &Artifact, diagnostic: &Diagnostic) -> Result<Artifact> {
        regenerate(self.gateway.as_ref(), prior, diagnostic).await
    }
}
