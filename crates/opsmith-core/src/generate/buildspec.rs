//! Single-stage CodeBuild buildspec pipeline.

use std::sync::Arc;

use async_trait::async_trait;

use super::{prose_stage, regenerate, ArtifactSource};
use crate::domain::{Artifact, ArtifactFormat, Diagnostic, Result};
use crate::extract::extract_artifact;
use crate::gateway::TextGateway;
use crate::prompts;

pub struct BuildspecGenerator {
    gateway: Arc<dyn TextGateway>,
    dockerfile_body: String,
    ecr_repository_name: String,
    ecr_repository_uri: String,
}

impl BuildspecGenerator {
    pub fn new(
        gateway: Arc<dyn TextGateway>,
        dockerfile_body: impl Into<String>,
        ecr_repository_name: impl Into<String>,
        ecr_repository_uri: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            dockerfile_body: dockerfile_body.into(),
            ecr_repository_name: ecr_repository_name.into(),
            ecr_repository_uri: ecr_repository_uri.into(),
        }
    }
}

/// Map a Dockerfile FROM line to the CodeBuild runtime declaration.
///
/// Unknown base images fall back to docker-in-docker with no language
/// runtime pinned.
pub fn runtime_from_dockerfile(dockerfile_body: &str) -> String {
    let image = dockerfile_body
        .lines()
        .map(str::trim)
        .find(|l| l.to_ascii_uppercase().starts_with("FROM "))
        .map(|l| l[5..].trim())
        .unwrap_or_default();

    // Strip registry path and tag: "public.ecr.aws/docker/library/python:3.12" -> "python"
    let name = image
        .split(':')
        .next()
        .unwrap_or_default()
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();

    let runtime = match name.as_str() {
        n if n.starts_with("python") => "python: latest",
        n if n.starts_with("node") => "nodejs: latest",
        n if n.starts_with("golang") || n.starts_with("go") => "golang: latest",
        n if n.starts_with("openjdk") || n.starts_with("maven") || n.starts_with("amazoncorretto") => {
            "java: latest"
        }
        n if n.starts_with("ruby") => "ruby: latest",
        n if n.starts_with("php") => "php: latest",
        n if n.starts_with("dotnet") => "dotnet: latest",
        _ => "docker: latest",
    };
    runtime.to_string()
}

#[async_trait]
impl ArtifactSource for BuildspecGenerator {
    async fn draft(&self) -> Result<Artifact> {
        let runtime = runtime_from_dockerfile(&self.dockerfile_body);
        let response = prose_stage(
            self.gateway.as_ref(),
            "buildspec",
            &prompts::buildspec(
                &self.dockerfile_body,
                &runtime,
                &self.ecr_repository_name,
                &self.ecr_repository_uri,
            ),
        )
        .await?;
        extract_artifact(&response, ArtifactFormat::BuildspecYaml)
    }

    async fn repair(&self, prior: &Artifact, diagnostic: &Diagnostic) -> Result<Artifact> {
        regenerate(self.gateway.as_ref(), prior, diagnostic).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::ScriptedGateway;

    #[test]
    fn test_runtime_mapping() {
        assert_eq!(runtime_from_dockerfile("FROM python:latest"), "python: latest");
        assert_eq!(runtime_from_dockerfile("from node:20-alpine"), "nodejs: latest");
        assert_eq!(runtime_from_dockerfile("FROM golang:1.22 AS build"), "golang: latest");
        assert_eq!(
            runtime_from_dockerfile("FROM public.ecr.aws/docker/library/python:3.12"),
            "python: latest"
        );
        assert_eq!(runtime_from_dockerfile("FROM scratch"), "docker: latest");
        assert_eq!(runtime_from_dockerfile("no from line at all"), "docker: latest");
    }

    #[tokio::test]
    async fn test_draft_extracts_yaml() {
        let gw = Arc::new(ScriptedGateway::with_responses([
            "```yaml\nversion: 0.2\nphases:\n  build:\n    commands:\n      - docker build .\n```",
        ]));
        let generator = BuildspecGenerator::new(
            gw.clone(),
            "FROM python:latest",
            "web-app",
            "123456789012.dkr.ecr.us-west-2.amazonaws.com/web-app",
        );

        let artifact = generator.draft().await.unwrap();
        assert_eq!(artifact.format, ArtifactFormat::BuildspecYaml);
        assert!(artifact.body.starts_with("version: 0.2"));

        let prompt = &gw.prompts()[0];
        assert!(prompt.contains("python: latest"));
        assert!(prompt.contains("dkr.ecr.us-west-2"));
    }
}
