//! Two-stage Dockerfile pipeline: build facts, then the Dockerfile itself.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::{prose_stage, regenerate, ArtifactSource};
use crate::domain::{Artifact, ArtifactFormat, Diagnostic, ProjectProfile, Result};
use crate::extract::extract_artifact;
use crate::gateway::TextGateway;
use crate::prompts;

pub struct DockerfileGenerator {
    gateway: Arc<dyn TextGateway>,
    profile: ProjectProfile,
}

impl DockerfileGenerator {
    pub fn new(gateway: Arc<dyn TextGateway>, profile: ProjectProfile) -> Self {
        Self { gateway, profile }
    }
}

#[async_trait]
impl ArtifactSource for DockerfileGenerator {
    async fn draft(&self) -> Result<Artifact> {
        let facts = prose_stage(
            self.gateway.as_ref(),
            "dockerfile_facts",
            &prompts::dockerfile_facts(
                &self.profile.facts.project_type,
                &self.profile.manifest.content,
                &self.profile.file_listing,
            ),
        )
        .await?;
        info!(event = "generate.stage_done", stage = "dockerfile_facts");

        let response = prose_stage(
            self.gateway.as_ref(),
            "dockerfile",
            &prompts::dockerfile(&self.profile.facts.project_type, &facts),
        )
        .await?;

        extract_artifact(&response, ArtifactFormat::Dockerfile)
    }

    async fn repair(&self, prior: &Artifact, diagnostic: &Diagnostic) -> Result<Artifact> {
        regenerate(self.gateway.as_ref(), prior, diagnostic).await
    }
}
