//! CloudFormation pipeline: Fargate only, with a single review pass over
//! the drafted template before it reaches the validator.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::{prose_stage, regenerate, ArtifactSource};
use crate::domain::{
    Artifact, ArtifactFormat, ClusterSpec, Diagnostic, OpsmithError, Requirement, Result, Strategy,
    WorkloadDescriptor,
};
use crate::extract::{extract_artifact, extract_fenced};
use crate::gateway::TextGateway;
use crate::prompts;

pub struct CloudFormationGenerator {
    gateway: Arc<dyn TextGateway>,
    strategy: Strategy,
    requirement: Requirement,
    dockerfile_body: String,
}

impl CloudFormationGenerator {
    pub fn new(
        gateway: Arc<dyn TextGateway>,
        strategy: Strategy,
        requirement: Requirement,
        dockerfile_body: impl Into<String>,
    ) -> Result<Self> {
        // Only the Fargate pipeline exists for CloudFormation.
        if strategy != Strategy::Fargate {
            return Err(OpsmithError::UnsupportedStrategy {
                strategy,
                format: ArtifactFormat::CloudFormationYaml.to_string(),
            });
        }
        Ok(Self {
            gateway,
            strategy,
            requirement,
            dockerfile_body: dockerfile_body.into(),
        })
    }

    /// Review pass: the model re-reads the template and may return a
    /// corrected version. A review that drops the fence falls back to the
    /// unreviewed draft rather than failing the attempt.
    async fn review(&self, draft: Artifact) -> Result<Artifact> {
        let response = self
            .gateway
            .invoke(&prompts::cloudformation_review(&draft.body))
            .await?;
        match extract_fenced(&response, draft.format.marker()) {
            Ok(body) => {
                info!(event = "generate.stage_done", stage = "cfn_review");
                Ok(Artifact::new(draft.format, body))
            }
            Err(_) => Ok(draft),
        }
    }
}

#[async_trait]
impl ArtifactSource for CloudFormationGenerator {
    async fn draft(&self) -> Result<Artifact> {
        let details = prose_stage(
            self.gateway.as_ref(),
            "cluster_spec",
            &prompts::cluster_spec("CloudFormation", self.strategy, self.requirement.as_str()),
        )
        .await?;
        let cluster = ClusterSpec::from_stage_output(self.strategy, details)?;

        let task_response = prose_stage(
            self.gateway.as_ref(),
            "task_definition",
            &prompts::task_definition(&self.dockerfile_body),
        )
        .await?;
        let workload = WorkloadDescriptor::parse(&extract_fenced(&task_response, "json")?)?;
        info!(event = "generate.stage_done", stage = "task_definition", family = %workload.family);

        let response = prose_stage(
            self.gateway.as_ref(),
            "cloudformation",
            &prompts::cloudformation(&cluster, &workload),
        )
        .await?;
        let draft = extract_artifact(&response, ArtifactFormat::CloudFormationYaml)?;

        self.review(draft).await
    }

    async fn repair(&self, prior: &Artifact, diagnostic: &Diagnostic) -> Result<Artifact> {
        regenerate(self.gateway.as_ref(), prior, diagnostic).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::ScriptedGateway;

    const TASK_DEF: &str =
        "```json\n{\"family\": \"web\", \"containerDefinitions\": []}\n```";

    fn requirement() -> Requirement {
        Requirement::new("a fargate service for the web app").unwrap()
    }

    #[test]
    fn test_ec2_autoscaling_is_unsupported() {
        let gw = Arc::new(ScriptedGateway::new());
        let err = CloudFormationGenerator::new(
            gw,
            Strategy::Ec2Autoscaling,
            requirement(),
            "FROM python:latest",
        )
        .err()
        .expect("ec2-autoscaling must be rejected");
        assert!(matches!(err, OpsmithError::UnsupportedStrategy { .. }));
    }

    #[tokio::test]
    async fn test_draft_applies_review_correction() {
        let gw = Arc::new(ScriptedGateway::with_responses([
            "cluster details",
            TASK_DEF,
            "```yaml\nResources: {}\n```",
            "```yaml\nAWSTemplateFormatVersion: '2010-09-09'\nResources: {}\n```",
        ]));
        let generator = CloudFormationGenerator::new(
            gw.clone(),
            Strategy::Fargate,
            requirement(),
            "FROM python:latest",
        )
        .unwrap();

        let artifact = generator.draft().await.unwrap();
        assert!(artifact.body.starts_with("AWSTemplateFormatVersion"));
        // Review prompt carried the unreviewed draft.
        assert!(gw.prompts()[3].contains("Resources: {}"));
    }

    #[tokio::test]
    async fn test_unfenced_review_falls_back_to_draft() {
        let gw = Arc::new(ScriptedGateway::with_responses([
            "cluster details",
            TASK_DEF,
            "```yaml\nResources: {}\n```",
            "The template looks fine to me.",
        ]));
        let generator = CloudFormationGenerator::new(
            gw,
            Strategy::Fargate,
            requirement(),
            "FROM python:latest",
        )
        .unwrap();

        let artifact = generator.draft().await.unwrap();
        assert_eq!(artifact.body, "Resources: {}");
    }
}
