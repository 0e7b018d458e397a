//! Deployment strategy vocabulary.

use serde::{Deserialize, Serialize};

use crate::domain::error::OpsmithError;

/// Generation strategy chosen once per run by the classifier.
///
/// The vocabulary is closed: classifier output that is not exactly one of
/// these tags is an [`OpsmithError::UnrecognizedStrategy`], never a guess.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// ECS on Fargate (serverless tasks).
    Fargate,
    /// ECS on EC2 with an autoscaling group.
    Ec2Autoscaling,
}

impl Strategy {
    /// The wire tag the classifier prompt constrains the model to.
    pub fn tag(&self) -> &'static str {
        match self {
            Strategy::Fargate => "fargate",
            Strategy::Ec2Autoscaling => "ec2-autoscaling",
        }
    }

    /// All known tags, for prompt construction and error messages.
    pub fn known_tags() -> &'static [&'static str] {
        &["fargate", "ec2-autoscaling"]
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

impl std::str::FromStr for Strategy {
    type Err = OpsmithError;

    /// Parse a classifier answer. Only the exact tag (case-insensitive,
    /// surrounding whitespace and quotes tolerated) is accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().trim_matches(|c| c == '"' || c == '\'' || c == '.');
        match token.to_ascii_lowercase().as_str() {
            "fargate" => Ok(Strategy::Fargate),
            "ec2-autoscaling" => Ok(Strategy::Ec2Autoscaling),
            _ => Err(OpsmithError::UnrecognizedStrategy {
                raw: s.to_string(),
            }),
        }
    }
}
