//! Typed intermediates passed between pipeline stages.
//!
//! Earlier designs threaded raw model prose from stage to stage; shape
//! mismatches then surfaced deep inside the final generation call. These
//! types pull the parse to the stage boundary so a malformed intermediate
//! fails the attempt immediately.

use serde::{Deserialize, Serialize};

use crate::domain::error::{OpsmithError, Result};
use crate::domain::strategy::Strategy;

/// Cluster shape produced by the first Terraform/CloudFormation stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClusterSpec {
    pub strategy: Strategy,

    /// Model-expanded cluster details (name, sizing, networking, tags).
    pub details: String,
}

impl ClusterSpec {
    /// Wrap stage output, failing fast when the stage produced nothing.
    pub fn from_stage_output(strategy: Strategy, details: impl Into<String>) -> Result<Self> {
        let details = details.into();
        if details.trim().is_empty() {
            return Err(OpsmithError::GenerationStage {
                stage: "cluster_spec".to_string(),
                reason: "stage returned empty output".to_string(),
            });
        }
        Ok(Self { strategy, details })
    }
}

/// ECS task definition derived from a Dockerfile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkloadDescriptor {
    /// Task definition family name.
    pub family: String,

    /// Pretty-printed `containerDefinitions` JSON array.
    pub container_definitions: String,

    /// The full task definition JSON as extracted.
    pub raw: String,
}

impl WorkloadDescriptor {
    /// Parse the extracted ```json fence body into a typed descriptor.
    ///
    /// Requires a JSON object with a string `family` and an array
    /// `containerDefinitions`; anything else fails the stage.
    pub fn parse(raw: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| OpsmithError::GenerationStage {
                stage: "task_definition".to_string(),
                reason: format!("not valid JSON: {e}"),
            })?;

        let family = value
            .get("family")
            .and_then(|v| v.as_str())
            .ok_or_else(|| OpsmithError::GenerationStage {
                stage: "task_definition".to_string(),
                reason: "missing string field `family`".to_string(),
            })?
            .to_string();

        let containers = value
            .get("containerDefinitions")
            .filter(|v| v.is_array())
            .ok_or_else(|| OpsmithError::GenerationStage {
                stage: "task_definition".to_string(),
                reason: "missing array field `containerDefinitions`".to_string(),
            })?;

        Ok(Self {
            family,
            container_definitions: serde_json::to_string_pretty(containers)?,
            raw: raw.to_string(),
        })
    }
}
