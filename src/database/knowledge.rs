//! Postgres/pgvector implementation of the knowledge store

use async_trait::async_trait;
use pgvector::Vector;
use uuid::Uuid;

use super::Database;
use crate::errors::FloraRagError;
use crate::knowledge::store::KnowledgeStore;
use crate::knowledge::store::ScoredEntry;
use crate::models::KnowledgeEntry;
use crate::models::KnowledgeEntryData;
use crate::models::KnowledgeEntryPatch;
use crate::Result;

#[async_trait]
impl KnowledgeStore for Database {
    async fn insert(
        &self,
        data: &KnowledgeEntryData,
        embedding: Option<Vec<f32>>,
    ) -> Result<KnowledgeEntry> {
        let entry = sqlx::query_as::<_, KnowledgeEntry>(
            r"
            INSERT INTO flower_knowledge (
                flower_type, variety, care_requirements, optimal_temperature,
                optimal_humidity, water_requirements, ethylene_sensitivity,
                common_issues, vase_life_tips, source_name, source_url, embedding
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            ",
        )
        .bind(&data.flower_type)
        .bind(&data.variety)
        .bind(&data.care_requirements)
        .bind(&data.optimal_temperature)
        .bind(&data.optimal_humidity)
        .bind(&data.water_requirements)
        .bind(&data.ethylene_sensitivity)
        .bind(&data.common_issues)
        .bind(&data.vase_life_tips)
        .bind(&data.source_name)
        .bind(&data.source_url)
        .bind(embedding.map(Vector::from))
        .fetch_one(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn update(
        &self,
        id: Uuid,
        patch: &KnowledgeEntryPatch,
        embedding: Option<Vec<f32>>,
    ) -> Result<()> {
        // COALESCE keeps unset fields at their current value; the embedding
        // is only overwritten when the caller supplies a regenerated one.
        let result = sqlx::query(
            r"
            UPDATE flower_knowledge SET
                flower_type = COALESCE($2, flower_type),
                variety = COALESCE($3, variety),
                care_requirements = COALESCE($4, care_requirements),
                optimal_temperature = COALESCE($5, optimal_temperature),
                optimal_humidity = COALESCE($6, optimal_humidity),
                water_requirements = COALESCE($7, water_requirements),
                ethylene_sensitivity = COALESCE($8, ethylene_sensitivity),
                common_issues = COALESCE($9, common_issues),
                vase_life_tips = COALESCE($10, vase_life_tips),
                source_name = COALESCE($11, source_name),
                source_url = COALESCE($12, source_url),
                embedding = COALESCE($13, embedding)
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&patch.flower_type)
        .bind(&patch.variety)
        .bind(&patch.care_requirements)
        .bind(&patch.optimal_temperature)
        .bind(&patch.optimal_humidity)
        .bind(&patch.water_requirements)
        .bind(&patch.ethylene_sensitivity)
        .bind(&patch.common_issues)
        .bind(&patch.vase_life_tips)
        .bind(&patch.source_name)
        .bind(&patch.source_url)
        .bind(embedding.map(Vector::from))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(FloraRagError::KnowledgeValidation(format!(
                "No knowledge entry with id {id}"
            )));
        }

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM flower_knowledge WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<KnowledgeEntry>> {
        let entry = sqlx::query_as::<_, KnowledgeEntry>(
            "SELECT * FROM flower_knowledge WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn list_all(&self) -> Result<Vec<KnowledgeEntry>> {
        let entries = sqlx::query_as::<_, KnowledgeEntry>(
            "SELECT * FROM flower_knowledge ORDER BY flower_type ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn find_by_flower_type(&self, substring: &str) -> Result<Vec<KnowledgeEntry>> {
        let entries = sqlx::query_as::<_, KnowledgeEntry>(
            r"
            SELECT * FROM flower_knowledge
            WHERE flower_type ILIKE $1
            ORDER BY flower_type ASC
            ",
        )
        .bind(format!("%{substring}%"))
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn vector_search(
        &self,
        query: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<ScoredEntry>> {
        let query_vector = Vector::from(query.to_vec());

        // pgvector's <=> operator is cosine distance; similarity = 1 - distance.
        let entries = sqlx::query_as::<_, ScoredKnowledgeRow>(
            r"
            SELECT *, 1 - (embedding <=> $1::vector) AS similarity
            FROM flower_knowledge
            WHERE embedding IS NOT NULL
                AND 1 - (embedding <=> $1::vector) > $2
            ORDER BY embedding <=> $1::vector
            LIMIT $3
            ",
        )
        .bind(&query_vector)
        .bind(f64::from(threshold))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| FloraRagError::from_store_error(&e))?;

        Ok(entries
            .into_iter()
            .map(|row| ScoredEntry {
                score: row.similarity as f32,
                entry: row.entry,
            })
            .collect())
    }

    async fn text_search(
        &self,
        flower_type: &str,
        variety: Option<&str>,
        limit: usize,
    ) -> Result<Vec<KnowledgeEntry>> {
        let limit = limit as i64;
        let mut results: Vec<KnowledgeEntry> = Vec::new();

        // Strategy 1: exact flower type match
        let exact = sqlx::query_as::<_, KnowledgeEntry>(
            "SELECT * FROM flower_knowledge WHERE lower(flower_type) = lower($1) LIMIT $2",
        )
        .bind(flower_type)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        results.extend(exact);

        // Strategy 2: partial flower type match
        let partial = sqlx::query_as::<_, KnowledgeEntry>(
            "SELECT * FROM flower_knowledge WHERE flower_type ILIKE $1 LIMIT $2",
        )
        .bind(format!("%{flower_type}%"))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        results.extend(partial);

        if let Some(variety) = variety {
            // Strategy 3: variety match
            let by_variety = sqlx::query_as::<_, KnowledgeEntry>(
                "SELECT * FROM flower_knowledge WHERE variety ILIKE $1 LIMIT $2",
            )
            .bind(format!("%{variety}%"))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
            results.extend(by_variety);

            // Strategy 4: combined flower type + variety across both fields
            let combined = format!("%{flower_type} {variety}%");
            let by_combined = sqlx::query_as::<_, KnowledgeEntry>(
                r"
                SELECT * FROM flower_knowledge
                WHERE flower_type ILIKE $1 OR variety ILIKE $1
                LIMIT $2
                ",
            )
            .bind(combined)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
            results.extend(by_combined);
        }

        // Union order preserved; duplicates removed by id
        let mut seen = std::collections::HashSet::new();
        results.retain(|entry| seen.insert(entry.id));

        Ok(results)
    }
}

/// Knowledge row joined with its similarity score
#[derive(sqlx::FromRow)]
struct ScoredKnowledgeRow {
    #[sqlx(flatten)]
    entry: KnowledgeEntry,
    similarity: f64,
}
