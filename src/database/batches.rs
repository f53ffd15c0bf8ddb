//! Batch-record store: cached prediction read/write

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use super::Database;
use crate::models::FlowerBatch;
use crate::models::PredictionResult;
use crate::prediction::BatchStore;
use crate::Result;

#[async_trait]
impl BatchStore for Database {
    async fn get_batch(&self, id: Uuid) -> Result<Option<FlowerBatch>> {
        let batch = sqlx::query_as::<_, FlowerBatch>(
            "SELECT * FROM flower_batches WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(batch)
    }

    async fn save_prediction(
        &self,
        id: Uuid,
        result: &PredictionResult,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        // rag context, sources, and the producing tier go into one JSON blob
        // so a cached prediction can be reconstructed in full
        let context_blob = serde_json::json!({
            "ragContext": result.rag_context,
            "sources": result.sources,
            "tier": result.tier,
        });

        sqlx::query(
            r"
            UPDATE flower_batches SET
                ai_prediction = $2,
                ai_confidence = $3,
                ai_reasoning = $4,
                ai_recommendations = $5,
                ai_financial_recommendations = $6,
                ai_context = $7,
                ai_last_updated = $8
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(result.prediction)
        .bind(result.confidence)
        .bind(&result.reasoning)
        .bind(serde_json::to_value(&result.recommendations)?)
        .bind(serde_json::to_value(&result.financial_recommendations)?)
        .bind(context_blob)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
