//! RAG (Retrieval-Augmented Generation) core
//!
//! Given a batch query (flower type/variety/conditions), returns ranked,
//! deduplicated, source-attributed knowledge snippets and an assembled
//! context block for the generation prompt:
//! - Semantic retrieval using vector embeddings, with layered text-search
//!   fallback when embeddings are unavailable
//! - Relevance filtering and source deduplication
//! - Prompt-block assembly from retained contexts
//!
//! Retrieval is always best-effort: any failure degrades to an empty
//! `Retrieval` rather than propagating, so prediction is never blocked.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use florarag::config::AppConfig;
//! use florarag::database::Database;
//! use florarag::embeddings::HttpEmbeddingClient;
//! use florarag::models::BatchQuery;
//! use florarag::rag::ContextRetriever;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let database = Arc::new(Database::from_config(&config).await?);
//!     let embeddings = Arc::new(HttpEmbeddingClient::from_config(&config)?);
//!     let retriever = ContextRetriever::new(database, embeddings, &config);
//!
//!     let mut query = BatchQuery::new("Rose", 7.0);
//!     query.variety = Some("Red Naomi".to_string());
//!
//!     let retrieval = retriever.retrieve(&query).await;
//!     println!("Found {} contexts", retrieval.contexts.len());
//!
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod retriever;

pub use context::ContextAssembler;
pub use retriever::ContextRetriever;

use crate::models::RetrievedContext;
use crate::models::SourceRef;

/// Outcome of a retrieval pass. Empty when nothing relevant was found or
/// every search tier failed; the orchestrator then operates without
/// augmentation.
#[derive(Debug, Clone, Default)]
pub struct Retrieval {
    /// Retained contexts in the order produced by the search strategy that
    /// yielded them (vector hits by descending similarity, text hits in
    /// strategy union order)
    pub contexts: Vec<RetrievedContext>,
    /// Sources across all retained contexts, deduplicated by (name, url)
    pub sources: Vec<SourceRef>,
    /// Evidence block injected into the generation prompt; empty string when
    /// no contexts survived
    pub prompt_block: String,
}

impl Retrieval {
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}
