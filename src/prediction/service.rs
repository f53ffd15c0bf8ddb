//! Prediction orchestrator and batch-level service

use std::sync::Arc;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;
use tracing::info;
use tracing::warn;
use uuid::Uuid;

use super::fallback::rule_based_prediction;
use super::parser;
use super::prompt;
use super::BatchStore;
use crate::config::AppConfig;
use crate::database::Database;
use crate::embeddings::EmbeddingClient;
use crate::embeddings::HttpEmbeddingClient;
use crate::errors::FloraRagError;
use crate::errors::Result;
use crate::knowledge::store::KnowledgeStore;
use crate::llm::client::ChatCompletionClient;
use crate::llm::CompletionClient;
use crate::models::BatchQuery;
use crate::models::DetailedPrediction;
use crate::models::FlowerBatch;
use crate::models::PredictionResult;
use crate::models::PredictionTier;
use crate::rag::ContextRetriever;

const MODEL_TEMPERATURE: f32 = 0.7;
const MODEL_MAX_TOKENS: u32 = 800;

/// Runs the full Retrieve -> Prompt -> Generate -> Parse pipeline for one
/// query, degrading tier by tier until a well-formed result exists.
pub struct SpoilagePredictor {
    retriever: ContextRetriever,
    completions: Arc<dyn CompletionClient>,
}

impl SpoilagePredictor {
    pub fn new(retriever: ContextRetriever, completions: Arc<dyn CompletionClient>) -> Self {
        Self {
            retriever,
            completions,
        }
    }

    /// Predict remaining lifespan for a batch query.
    ///
    /// Total for any valid input: retrieval, model, and parse failures all
    /// degrade to the rule-based estimate. The only error path is input
    /// validation, raised before any external call.
    ///
    /// # Errors
    /// - `KnowledgeValidation` when the flower type is blank or the expected
    ///   shelf life is not a usable number
    pub async fn predict(&self, query: &BatchQuery) -> Result<PredictionResult> {
        validate_query(query)?;

        let retrieval = self.retriever.retrieve(query).await;
        info!(
            "Predicting for {} with {} retrieved contexts",
            query.flower_type,
            retrieval.contexts.len()
        );

        let user_prompt = prompt::build_prompt(query, &retrieval.prompt_block);

        let raw = match self
            .completions
            .complete(
                prompt::SYSTEM_INSTRUCTIONS,
                &user_prompt,
                MODEL_TEMPERATURE,
                MODEL_MAX_TOKENS,
            )
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Model call failed, using rule-based estimate: {}", e);
                return Ok(rule_based_prediction(query));
            }
        };

        match parser::parse_response(&raw) {
            Some(outcome) => {
                debug!("Model response handled by {:?} tier", outcome.tier);

                // The highest-relevance context is surfaced alongside the
                // result; contexts arrive ranked, so take the best-scoring
                // one rather than assuming order.
                let rag_context = retrieval
                    .contexts
                    .iter()
                    .max_by(|a, b| {
                        a.relevance_score
                            .partial_cmp(&b.relevance_score)
                            .unwrap_or(std::cmp::Ordering::Equal)
                    })
                    .cloned();

                Ok(PredictionResult {
                    prediction: outcome.detailed.as_days(),
                    confidence: outcome.confidence,
                    reasoning: outcome.reasoning,
                    recommendations: outcome.recommendations,
                    financial_recommendations: outcome.financial_recommendations,
                    detailed: outcome.detailed,
                    sources: retrieval.sources,
                    rag_context,
                    tier: outcome.tier,
                })
            }
            None => {
                warn!("Model response unusable, using rule-based estimate");
                Ok(rule_based_prediction(query))
            }
        }
    }
}

fn validate_query(query: &BatchQuery) -> Result<()> {
    if query.flower_type.trim().is_empty() {
        return Err(FloraRagError::KnowledgeValidation(
            "flower type must not be empty".to_string(),
        ));
    }
    if !query.expected_shelf_life.is_finite() || query.expected_shelf_life < 0.0 {
        return Err(FloraRagError::KnowledgeValidation(format!(
            "expected shelf life must be a non-negative number, got {}",
            query.expected_shelf_life
        )));
    }
    Ok(())
}

/// Batch-level prediction service: looks up the batch record, serves a fresh
/// cached prediction when one exists, and persists newly computed results.
pub struct PredictionService {
    batches: Arc<dyn BatchStore>,
    predictor: SpoilagePredictor,
    cache_max_age: std::time::Duration,
}

impl PredictionService {
    /// Wire the full service from application configuration.
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let database = Arc::new(Database::from_config(config).await?);
        let embeddings: Arc<dyn EmbeddingClient> =
            Arc::new(HttpEmbeddingClient::from_config(config)?);
        let completions: Arc<dyn CompletionClient> =
            Arc::new(ChatCompletionClient::from_config(config)?);

        let store: Arc<dyn KnowledgeStore> = database.clone();
        let retriever = ContextRetriever::new(store, embeddings, config);

        Ok(Self {
            batches: database,
            predictor: SpoilagePredictor::new(retriever, completions),
            cache_max_age: config.cache_max_age(),
        })
    }

    /// Assemble a service from pre-built collaborators (used by tests).
    pub fn with_parts(
        batches: Arc<dyn BatchStore>,
        predictor: SpoilagePredictor,
        cache_max_age: std::time::Duration,
    ) -> Self {
        Self {
            batches,
            predictor,
            cache_max_age,
        }
    }

    pub fn predictor(&self) -> &SpoilagePredictor {
        &self.predictor
    }

    /// Predict for a stored batch, using the cached prediction when it is
    /// fresh. `force_refresh` bypasses the cache entirely.
    ///
    /// # Errors
    /// - `BatchNotFound` when no batch with the given id exists
    /// - database errors when persisting the new prediction fails
    pub async fn predict_for_batch(
        &self,
        batch_id: Uuid,
        force_refresh: bool,
    ) -> Result<PredictionResult> {
        let batch = self
            .batches
            .get_batch(batch_id)
            .await?
            .ok_or(FloraRagError::BatchNotFound(batch_id))?;

        if !force_refresh {
            if let Some(cached) = self.fresh_cached_result(&batch, Utc::now()) {
                debug!("Serving cached prediction for batch {}", batch_id);
                return Ok(cached);
            }
        }

        let result = self.predictor.predict(&batch.to_query()).await?;
        self.batches
            .save_prediction(batch_id, &result, Utc::now())
            .await?;

        Ok(result)
    }

    /// Reconstruct the cached prediction if it exists and is younger than
    /// the configured max age.
    fn fresh_cached_result(
        &self,
        batch: &FlowerBatch,
        now: DateTime<Utc>,
    ) -> Option<PredictionResult> {
        let last_updated = batch.ai_last_updated?;
        let max_age = chrono::Duration::seconds(self.cache_max_age.as_secs() as i64);
        if now.signed_duration_since(last_updated) >= max_age {
            return None;
        }
        reconstruct_cached(batch)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ContextBlob {
    #[serde(rename = "ragContext", default)]
    rag_context: Option<crate::models::RetrievedContext>,
    #[serde(default)]
    sources: Vec<crate::models::SourceRef>,
    #[serde(default)]
    tier: Option<PredictionTier>,
}

/// Rebuild a `PredictionResult` from the batch's cached columns. Returns
/// `None` when the cache is incomplete; the caller then recomputes.
fn reconstruct_cached(batch: &FlowerBatch) -> Option<PredictionResult> {
    let prediction = batch.ai_prediction?;
    let confidence = batch.ai_confidence?;
    let reasoning = batch.ai_reasoning.clone()?;

    let recommendations: Vec<String> = batch
        .ai_recommendations
        .clone()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();

    let financial_recommendations = batch
        .ai_financial_recommendations
        .clone()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();

    let blob: ContextBlob = batch
        .ai_context
        .clone()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();

    Some(PredictionResult {
        prediction,
        confidence,
        reasoning,
        recommendations,
        financial_recommendations,
        detailed: DetailedPrediction::from_total_hours(prediction * 24.0),
        sources: blob.sources,
        rag_context: blob.rag_context,
        tier: blob.tier.unwrap_or(PredictionTier::Parsed),
    })
}
