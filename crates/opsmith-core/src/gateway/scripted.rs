//! In-memory scripted gateway for tests and offline runs.

use std::sync::Mutex;

use async_trait::async_trait;

use super::TextGateway;
use crate::domain::GatewayError;

/// One scripted reply: a canned response or an injected failure.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Text(String),
    Fail(String),
}

/// [`TextGateway`] fake that serves replies from a fixed queue and records
/// every prompt it receives.
///
/// The transcript lets tests assert on prompt content, e.g. that a repair
/// prompt embeds the prior diagnostic verbatim.
#[derive(Debug, Default)]
pub struct ScriptedGateway {
    replies: Mutex<std::collections::VecDeque<ScriptedReply>>,
    transcript: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a gateway from a list of text responses.
    pub fn with_responses<S: Into<String>>(responses: impl IntoIterator<Item = S>) -> Self {
        let gw = Self::new();
        for r in responses {
            gw.push_text(r);
        }
        gw
    }

    /// Queue a text response.
    pub fn push_text(&self, text: impl Into<String>) {
        self.replies
            .lock()
            .unwrap()
            .push_back(ScriptedReply::Text(text.into()));
    }

    /// Queue an injected gateway failure.
    pub fn push_failure(&self, message: impl Into<String>) {
        self.replies
            .lock()
            .unwrap()
            .push_back(ScriptedReply::Fail(message.into()));
    }

    /// All prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.transcript.lock().unwrap().clone()
    }

    /// Number of invocations served (including failures).
    pub fn call_count(&self) -> usize {
        self.transcript.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGateway for ScriptedGateway {
    async fn invoke(&self, prompt: &str) -> Result<String, GatewayError> {
        let mut transcript = self.transcript.lock().unwrap();
        transcript.push(prompt.to_string());
        let served = transcript.len();
        drop(transcript);

        match self.replies.lock().unwrap().pop_front() {
            Some(ScriptedReply::Text(text)) => Ok(text),
            Some(ScriptedReply::Fail(message)) => Err(GatewayError::Api {
                status: 500,
                message,
            }),
            None => Err(GatewayError::ScriptExhausted { served }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_serves_in_order() {
        let gw = ScriptedGateway::with_responses(["first", "second"]);
        assert_eq!(gw.invoke("a").await.unwrap(), "first");
        assert_eq!(gw.invoke("b").await.unwrap(), "second");
        assert_eq!(gw.prompts(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_exhausted_queue_errors() {
        let gw = ScriptedGateway::with_responses(["only"]);
        gw.invoke("a").await.unwrap();
        let err = gw.invoke("b").await.unwrap_err();
        assert!(matches!(err, GatewayError::ScriptExhausted { served: 2 }));
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let gw = ScriptedGateway::new();
        gw.push_failure("quota exceeded");
        let err = gw.invoke("a").await.unwrap_err();
        match err {
            GatewayError::Api { status, message } => {
                assert_eq!(status, 500);
                assert!(message.contains("quota"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        assert_eq!(gw.call_count(), 1);
    }
}
