//! Per-strategy artifact generation pipelines.
//!
//! Each generator is a small fixed pipeline of gateway calls; later stages
//! consume typed intermediates from earlier ones. Generators implement
//! [`ArtifactSource`], the seam the repair loop drives.

pub mod buildspec;
pub mod cloudformation;
pub mod docker;
pub mod terraform;

use async_trait::async_trait;

use crate::domain::{Artifact, Diagnostic, OpsmithError, Result};
use crate::extract::extract_artifact;
use crate::gateway::TextGateway;
use crate::prompts;

pub use buildspec::BuildspecGenerator;
pub use cloudformation::CloudFormationGenerator;
pub use docker::DockerfileGenerator;
pub use terraform::TerraformGenerator;

/// Produces draft artifacts and repairs rejected ones.
///
/// `draft` runs the full generation pipeline once; `repair` takes the prior
/// artifact plus the diagnostic that rejected it and produces a replacement.
/// Both may fail with stage errors, which cost the caller one repair attempt.
#[async_trait]
pub trait ArtifactSource: Send + Sync {
    async fn draft(&self) -> Result<Artifact>;

    async fn repair(&self, prior: &Artifact, diagnostic: &Diagnostic) -> Result<Artifact>;
}

/// One prose stage: invoke the gateway and reject empty output.
pub(crate) async fn prose_stage(
    gateway: &dyn TextGateway,
    stage: &str,
    prompt: &str,
) -> Result<String> {
    let response = gateway.invoke(prompt).await?;
    if response.trim().is_empty() {
        return Err(OpsmithError::GenerationStage {
            stage: stage.to_string(),
            reason: "stage returned empty output".to_string(),
        });
    }
    Ok(response)
}

/// Shared repair step: build the repair prompt and re-extract.
pub(crate) async fn regenerate(
    gateway: &dyn TextGateway,
    prior: &Artifact,
    diagnostic: &Diagnostic,
) -> Result<Artifact> {
    let response = gateway.invoke(&prompts::repair(prior, diagnostic)).await?;
    extract_artifact(&response, prior.format)
}
