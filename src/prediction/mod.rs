//! Prediction orchestration: Retrieve -> Prompt -> Generate -> Parse
//!
//! Drives the full spoilage-prediction pipeline with a three-tier
//! degradation chain:
//! 1. strict JSON parse of the model response,
//! 2. regex salvage of a malformed response,
//! 3. deterministic rule-based estimate (no external calls).
//!
//! The chain guarantees a caller always receives a well-formed
//! `PredictionResult`; the only error `predict` can return is a validation
//! failure on clearly invalid input, raised before any external call.
//!
//! # Examples
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
//!     println!("{:.1} days remaining ({:?})", result.prediction, result.tier);
//!
//!     Ok(())
//! }
//! ```

pub mod fallback;
pub mod parser;
pub mod prompt;
pub mod service;

pub use fallback::rule_based_prediction;
pub use service::PredictionService;
pub use service::SpoilagePredictor;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::errors::Result;
use crate::models::FlowerBatch;
use crate::models::PredictionResult;

/// Batch-record collaborator: read a batch and persist its cached
/// prediction.
#[async_trait]
pub trait BatchStore: Send + Sync {
    async fn get_batch(&self, id: Uuid) -> Result<Option<FlowerBatch>>;

    /// Persist the prediction fields plus a JSON blob carrying the rag
    /// context and sources for later display.
    async fn save_prediction(
        &self,
        id: Uuid,
        result: &PredictionResult,
        updated_at: DateTime<Utc>,
    ) -> Result<()>;
}
