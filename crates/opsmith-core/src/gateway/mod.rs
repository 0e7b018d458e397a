//! Text-generation gateway boundary.
//!
//! The core treats text generation as an opaque prompt-in/text-out
//! capability. Everything that parses free model text lives behind the
//! extractor; everything that talks HTTP lives behind this trait.

pub mod anthropic;
pub mod scripted;

use async_trait::async_trait;

use crate::domain::GatewayError;

pub use anthropic::AnthropicGateway;
pub use scripted::ScriptedGateway;

/// Opaque request/response text-generation capability.
#[async_trait]
pub trait TextGateway: Send + Sync {
    /// Send a prompt, receive the response text.
    async fn invoke(&self, prompt: &str) -> Result<String, GatewayError>;
}
