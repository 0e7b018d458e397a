//! Artifacts, formats, and validator diagnostics.

use serde::{Deserialize, Serialize};

/// Target format of a generated artifact.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactFormat {
    Dockerfile,
    TerraformHcl,
    CloudFormationYaml,
    BuildspecYaml,
}

impl ArtifactFormat {
    /// Fence marker the generator prompts request and the extractor matches.
    pub fn marker(&self) -> &'static str {
        match self {
            ArtifactFormat::Dockerfile => "dockerfile",
            ArtifactFormat::TerraformHcl => "hcl",
            ArtifactFormat::CloudFormationYaml => "yaml",
            ArtifactFormat::BuildspecYaml => "yaml",
        }
    }

    /// Conventional output filename for this format.
    pub fn default_filename(&self) -> &'static str {
        match self {
            ArtifactFormat::Dockerfile => "Dockerfile",
            ArtifactFormat::TerraformHcl => "main.tf",
            ArtifactFormat::CloudFormationYaml => "template.yaml",
            ArtifactFormat::BuildspecYaml => "buildspec.yaml",
        }
    }
}

impl std::fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ArtifactFormat::Dockerfile => "dockerfile",
            ArtifactFormat::TerraformHcl => "terraform",
            ArtifactFormat::CloudFormationYaml => "cloudformation",
            ArtifactFormat::BuildspecYaml => "buildspec",
        };
        f.write_str(name)
    }
}

/// A generated infrastructure artifact.
///
/// Immutable by convention: a repair attempt never edits the body in place,
/// it produces a new `Artifact` value and the prior one is retained only as
/// history in the run report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Artifact {
    pub format: ArtifactFormat,
    pub body: String,
}

impl Artifact {
    pub fn new(format: ArtifactFormat, body: impl Into<String>) -> Self {
        Self {
            format,
            body: body.into(),
        }
    }
}

/// Failure text returned by a validator, consumed by exactly one repair
/// prompt and never persisted beyond that iteration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Diagnostic {
    /// Stage that produced the failure (e.g. "docker_build", "terraform_plan").
    pub stage: String,

    /// Combined diagnostic text from the tool or stage.
    pub message: String,

    /// Tool exit code where one exists.
    pub exit_code: Option<i32>,
}

impl Diagnostic {
    pub fn new(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            message: message.into(),
            exit_code: None,
        }
    }

    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = Some(code);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers() {
        assert_eq!(ArtifactFormat::Dockerfile.marker(), "dockerfile");
        assert_eq!(ArtifactFormat::TerraformHcl.marker(), "hcl");
        assert_eq!(ArtifactFormat::CloudFormationYaml.marker(), "yaml");
        assert_eq!(ArtifactFormat::BuildspecYaml.marker(), "yaml");
    }

    #[test]
    fn test_default_filenames() {
        assert_eq!(ArtifactFormat::TerraformHcl.default_filename(), "main.tf");
        assert_eq!(
            ArtifactFormat::BuildspecYaml.default_filename(),
            "buildspec.yaml"
        );
    }

    #[test]
    fn test_diagnostic_builder() {
        let d = Diagnostic::new("docker_build", "unknown instruction: FRM").with_exit_code(1);
        assert_eq!(d.stage, "docker_build");
        assert_eq!(d.exit_code, Some(1));
    }

    #[test]
    fn test_artifact_serde_roundtrip() {
        let a = Artifact::new(ArtifactFormat::TerraformHcl, "resource \"aws_ecs_cluster\" \"main\" {}");
        let json = serde_json::to_string(&a).expect("serialize");
        let back: Artifact = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(a, back);
    }
}
