//! Generative model client
//!
//! Wraps the text-completion service used for spoilage predictions. The
//! orchestrator treats anything returned from here as untrusted text that
//! still has to survive parsing; failures trip the rule-based fallback and
//! are never retried (the generative call is cost-sensitive).

pub mod client;

pub use client::ChatCompletionClient;

use async_trait::async_trait;

use crate::errors::Result;

/// Client for the generative/completion collaborator.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Run a completion with fixed system instructions and a user prompt.
    ///
    /// # Errors
    /// - `FloraRagError::ModelCall` on network/auth/timeout failure or an
    ///   empty response
    async fn complete(
        &self,
        system_instructions: &str,
        user_prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String>;
}
