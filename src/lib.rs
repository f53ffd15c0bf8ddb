//! FloraRAG: retrieval-augmented spoilage prediction for cut-flower batches
//!
//! Combines a PostgreSQL/pgvector knowledge base of flower care facts with
//! an OpenAI-compatible generative model to predict how long a flower batch
//! will last and what to do about it. The pipeline degrades gracefully at
//! every stage:
//! - vector search falls back to layered text search,
//! - strict response parsing falls back to regex salvage,
//! - the model itself falls back to a deterministic rule-based estimate.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use florarag::config::AppConfig;
//! use florarag::models::BatchQuery;
//! use florarag::prediction::PredictionService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let service = PredictionService::new(&config).await?;
//!
//!     let mut query = BatchQuery::new("Rose", 7.0);
//!     query.variety = Some("Red Naomi".to_string());
//!
//!     let result = service.predictor().predict(&query).await?;
//!     println!(
//!         "{:.1} days remaining (confidence {:.0}%)",
//!         result.prediction,
//!         result.confidence * 100.0
//!     );
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod database;
pub mod embeddings;
pub mod errors;
pub mod knowledge;
pub mod llm;
pub mod logging;
pub mod models;
pub mod prediction;
pub mod rag;

pub use config::AppConfig;
pub use database::Database;
pub use errors::FloraRagError;
pub use errors::Result;
pub use knowledge::KnowledgeManager;
pub use prediction::PredictionService;
pub use rag::ContextRetriever;
