use super::Database;
use crate::Result;

impl Database {
    /// Check if database schema is initialized.
    /// Returns true if all required tables exist.
    pub async fn is_schema_initialized(&self) -> Result<bool> {
        let required_tables = vec!["flower_knowledge", "flower_batches"];

        for table_name in required_tables {
            let result = sqlx::query_scalar::<_, bool>(
                r"
                SELECT EXISTS (
                    SELECT FROM information_schema.tables
                    WHERE table_schema = 'public'
                    AND table_name = $1
                )
                ",
            )
            .bind(table_name)
            .fetch_one(&self.pool)
            .await?;

            if !result {
                tracing::debug!("Missing required table: {}", table_name);
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Create the schema if it does not exist.
    ///
    /// The embedding column dimension must match the configured embedding
    /// model; mixing dimensions silently breaks similarity search.
    pub async fn initialize_schema(&self, embedding_dimension: usize) -> Result<()> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await?;

        sqlx::query(&format!(
            r"
            CREATE TABLE IF NOT EXISTS flower_knowledge (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                flower_type TEXT NOT NULL,
                variety TEXT,
                care_requirements TEXT NOT NULL,
                optimal_temperature TEXT NOT NULL DEFAULT '',
                optimal_humidity TEXT NOT NULL DEFAULT '',
                water_requirements TEXT NOT NULL DEFAULT '',
                ethylene_sensitivity TEXT NOT NULL DEFAULT '',
                common_issues TEXT NOT NULL DEFAULT '',
                vase_life_tips TEXT NOT NULL DEFAULT '',
                source_name TEXT NOT NULL,
                source_url TEXT NOT NULL,
                embedding vector({embedding_dimension}),
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_flower_knowledge_flower_type
            ON flower_knowledge (lower(flower_type))
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS flower_batches (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                flower_type TEXT NOT NULL,
                variety TEXT,
                quantity INTEGER NOT NULL DEFAULT 0,
                unit_of_measure TEXT NOT NULL DEFAULT 'stems',
                supplier TEXT,
                initial_condition TEXT NOT NULL DEFAULT 'Good',
                storage_environment TEXT NOT NULL DEFAULT 'Refrigerated',
                water_type TEXT,
                humidity_level TEXT,
                floral_food_used BOOLEAN NOT NULL DEFAULT FALSE,
                vase_cleanliness TEXT,
                expected_shelf_life DOUBLE PRECISION NOT NULL DEFAULT 7,
                ai_prediction DOUBLE PRECISION,
                ai_confidence DOUBLE PRECISION,
                ai_reasoning TEXT,
                ai_recommendations JSONB,
                ai_financial_recommendations JSONB,
                ai_context JSONB,
                ai_last_updated TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        tracing::info!("Database schema initialized");
        Ok(())
    }
}
