//! Domain-level error taxonomy for Opsmith.

use crate::domain::strategy::Strategy;

/// Errors produced by the text-generation gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("gateway returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("gateway rate limited (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },

    #[error("gateway response had no text content")]
    EmptyResponse,

    #[error("missing API key: {0}")]
    MissingApiKey(String),

    #[error("scripted gateway exhausted after {served} responses")]
    ScriptExhausted { served: usize },
}

/// Opsmith domain errors.
#[derive(Debug, thiserror::Error)]
pub enum OpsmithError {
    /// A required input was missing or empty. Fatal, never retried.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// The classifier returned text outside the closed strategy vocabulary.
    #[error("unrecognized strategy tag: {raw:?}")]
    UnrecognizedStrategy { raw: String },

    /// The chosen strategy has no pipeline for the requested format.
    #[error("strategy {strategy} is not supported for {format}")]
    UnsupportedStrategy { strategy: Strategy, format: String },

    /// A pipeline stage produced empty or malformed output.
    #[error("generation stage {stage} failed: {reason}")]
    GenerationStage { stage: String, reason: String },

    /// No fenced code block tagged with the expected marker was found.
    #[error("no ```{marker} fenced block in response")]
    MissingFence { marker: String },

    /// A fenced block existed but its body was empty.
    #[error("```{marker} fenced block had an empty body")]
    EmptyArtifact { marker: String },

    /// A validation tool binary could not be spawned. Fatal, since every
    /// further attempt would hit the same wall.
    #[error("tool {tool} unavailable: {reason}")]
    ToolUnavailable { tool: String, reason: String },

    /// A validation tool ran past its deadline.
    #[error("{label} timed out after {seconds}s")]
    ToolTimeout { label: String, seconds: u64 },

    /// Run report digest does not match the stored sidecar.
    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl OpsmithError {
    /// Whether this error terminates a run immediately instead of
    /// consuming a repair attempt.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            OpsmithError::Precondition(_)
                | OpsmithError::UnrecognizedStrategy { .. }
                | OpsmithError::UnsupportedStrategy { .. }
                | OpsmithError::ToolUnavailable { .. }
        )
    }
}

/// Result type for Opsmith domain operations.
pub type Result<T> = std::result::Result<T, OpsmithError>;
