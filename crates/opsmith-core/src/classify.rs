//! Requirement classification.

use std::sync::Arc;

use tracing::info;

use crate::domain::{OpsmithError, Requirement, Result, Strategy};
use crate::gateway::TextGateway;
use crate::prompts;

/// Routes a requirement to one of the known generation strategies with a
/// single gateway call.
///
/// Classification gets no repair loop: an answer outside the closed
/// vocabulary is surfaced as [`OpsmithError::UnrecognizedStrategy`] and the
/// run stops there.
pub struct Classifier {
    gateway: Arc<dyn TextGateway>,
}

impl Classifier {
    pub fn new(gateway: Arc<dyn TextGateway>) -> Self {
        Self { gateway }
    }

    /// Classify a requirement into a [`Strategy`].
    pub async fn classify(&self, requirement: &Requirement) -> Result<Strategy> {
        let response = self
            .gateway
            .invoke(&prompts::classify(requirement.as_str()))
            .await?;

        // Models occasionally pad the tag with a trailing explanation line;
        // only the first non-empty line is the answer.
        let answer = response
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .ok_or(OpsmithError::UnrecognizedStrategy {
                raw: response.clone(),
            })?;

        let strategy: Strategy = answer.parse()?;
        info!(event = "classify.resolved", strategy = %strategy);
        Ok(strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::ScriptedGateway;

    fn requirement() -> Requirement {
        Requirement::new("run two web tasks behind a load balancer").unwrap()
    }

    #[tokio::test]
    async fn test_classify_fargate() {
        let gw = Arc::new(ScriptedGateway::with_responses(["fargate"]));
        let classifier = Classifier::new(gw);
        let strategy = classifier.classify(&requirement()).await.unwrap();
        assert_eq!(strategy, Strategy::Fargate);
    }

    #[tokio::test]
    async fn test_classify_first_line_wins() {
        let gw = Arc::new(ScriptedGateway::with_responses([
            "\nec2-autoscaling\nbecause the requirement mentions instance types",
        ]));
        let classifier = Classifier::new(gw);
        let strategy = classifier.classify(&requirement()).await.unwrap();
        assert_eq!(strategy, Strategy::Ec2Autoscaling);
    }

    #[tokio::test]
    async fn test_classify_rejects_open_ended_answer() {
        let gw = Arc::new(ScriptedGateway::with_responses([
            "I would suggest fargate here",
        ]));
        let classifier = Classifier::new(gw);
        let err = classifier.classify(&requirement()).await.unwrap_err();
        assert!(matches!(err, OpsmithError::UnrecognizedStrategy { .. }));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_classify_gateway_failure_propagates() {
        let gw = ScriptedGateway::new();
        gw.push_failure("backend unavailable");
        let classifier = Classifier::new(Arc::new(gw));
        let err = classifier.classify(&requirement()).await.unwrap_err();
        assert!(matches!(err, OpsmithError::Gateway(_)));
    }
}
