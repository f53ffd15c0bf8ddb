//! Embedding generation module
//!
//! Maps arbitrary text to a fixed-length vector via an external embedding
//! service. Failures here are always recoverable: the retriever treats any
//! embedding error as a signal to fall back to text search.
//!
//! # Examples
//!
//! ```rust,no_run
//! use florarag::config::AppConfig;
//! use florarag::embeddings::{EmbeddingClient, HttpEmbeddingClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let client = HttpEmbeddingClient::from_config(&config)?;
//!
//!     let embedding = client.embed("Rose Red Naomi care requirements").await?;
//!     println!("Generated embedding with {} dimensions", embedding.len());
//!
//!     Ok(())
//! }
//! ```

pub mod client;

pub use client::EmbeddingProvider;
pub use client::HttpEmbeddingClient;

use async_trait::async_trait;

use crate::errors::Result;

/// Default embedding dimension for OpenAI text-embedding-3-small
pub const DEFAULT_EMBEDDING_DIM: usize = 1536;

/// Client capable of turning text into a fixed-length vector.
///
/// Injected into the retriever and knowledge manager so tests can substitute
/// a deterministic fake.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Generate an embedding for the given text.
    ///
    /// # Errors
    /// - `FloraRagError::EmbeddingService` on empty input, network/auth
    ///   failure, or a malformed provider response
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}
