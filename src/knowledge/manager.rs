//! Knowledge manager: validated writes with embedding consistency

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing::warn;
use uuid::Uuid;

use super::store::KnowledgeStore;
use crate::embeddings::EmbeddingClient;
use crate::errors::FloraRagError;
use crate::errors::Result;
use crate::models::BulkLoadReport;
use crate::models::KnowledgeEntry;
use crate::models::KnowledgeEntryData;
use crate::models::KnowledgeEntryPatch;
use crate::models::KnowledgeStats;

/// Delay between sequential embedding calls during bulk operations,
/// a rate-limit courtesy to the embedding service.
const BULK_INSERT_DELAY: Duration = Duration::from_millis(100);

/// Administrative operations over the knowledge base.
pub struct KnowledgeManager {
    store: Arc<dyn KnowledgeStore>,
    embeddings: Arc<dyn EmbeddingClient>,
}

impl KnowledgeManager {
    pub fn new(store: Arc<dyn KnowledgeStore>, embeddings: Arc<dyn EmbeddingClient>) -> Self {
        Self { store, embeddings }
    }

    /// Add a single knowledge entry, computing its embedding first.
    ///
    /// # Errors
    /// - `KnowledgeValidation` when `flower_type` or `care_requirements` is
    ///   empty
    /// - embedding and store errors propagate; admin callers must see them
    pub async fn add_entry(&self, data: KnowledgeEntryData) -> Result<KnowledgeEntry> {
        validate_entry(&data)?;

        let embedding = self.embeddings.embed(&data.embedding_text()).await?;
        let entry = self.store.insert(&data, Some(embedding)).await?;

        info!(
            "Added knowledge for {}{}",
            entry.flower_type,
            entry
                .variety
                .as_deref()
                .map(|v| format!(" ({v})"))
                .unwrap_or_default()
        );
        Ok(entry)
    }

    /// Add multiple entries sequentially with an inter-call delay.
    ///
    /// A failure on one entry is logged and reported but does not abort the
    /// remaining entries; partial success is expected and acceptable.
    pub async fn add_many(&self, entries: Vec<KnowledgeEntryData>) -> BulkLoadReport {
        let mut report = BulkLoadReport::default();

        for (index, data) in entries.into_iter().enumerate() {
            match self.add_entry(data).await {
                Ok(_) => report.inserted += 1,
                Err(e) => {
                    warn!("Bulk load: entry {} failed: {}", index, e);
                    report.failures.push((index, e.to_string()));
                }
            }
            tokio::time::sleep(BULK_INSERT_DELAY).await;
        }

        info!(
            "Bulk load complete: {} inserted, {} failed",
            report.inserted,
            report.failures.len()
        );
        report
    }

    /// Update an entry. When the patch touches any free-text field, the
    /// current record is fetched, merged with the patch, and the embedding
    /// regenerated from the merged text before writing; attribution-only
    /// patches leave the stored embedding untouched.
    pub async fn update_entry(&self, id: Uuid, patch: KnowledgeEntryPatch) -> Result<()> {
        if patch.is_empty() {
            return Err(FloraRagError::KnowledgeValidation(
                "Update patch contains no fields".to_string(),
            ));
        }

        let embedding = if patch.touches_embedded_text() {
            let current = self.store.get(id).await?.ok_or_else(|| {
                FloraRagError::KnowledgeValidation(format!("No knowledge entry with id {id}"))
            })?;
            let merged = patch.apply_to(&current);
            Some(self.embeddings.embed(&merged.embedding_text()).await?)
        } else {
            None
        };

        self.store.update(id, &patch, embedding).await?;
        info!("Updated knowledge entry {}", id);
        Ok(())
    }

    /// Delete an entry by id
    pub async fn delete_entry(&self, id: Uuid) -> Result<()> {
        self.store.delete(id).await?;
        info!("Deleted knowledge entry {}", id);
        Ok(())
    }

    /// List all entries
    pub async fn list_entries(&self) -> Result<Vec<KnowledgeEntry>> {
        self.store.list_all().await
    }

    /// Search entries by flower type substring
    pub async fn find_by_flower_type(&self, substring: &str) -> Result<Vec<KnowledgeEntry>> {
        self.store.find_by_flower_type(substring).await
    }

    /// Regenerate embeddings for every entry, e.g. after changing the
    /// embedding model. Sequential with the same courtesy delay as bulk
    /// loads; per-entry failures are logged and skipped.
    pub async fn regenerate_all_embeddings(&self) -> Result<usize> {
        let entries = self.store.list_all().await?;
        let mut updated = 0;

        for entry in entries {
            match self.embeddings.embed(&entry.embedding_text()).await {
                Ok(embedding) => {
                    self.store
                        .update(entry.id, &KnowledgeEntryPatch::default(), Some(embedding))
                        .await?;
                    updated += 1;
                }
                Err(e) => warn!("Failed to re-embed entry {}: {}", entry.id, e),
            }
            tokio::time::sleep(BULK_INSERT_DELAY).await;
        }

        info!("Regenerated embeddings for {} entries", updated);
        Ok(updated)
    }

    /// Knowledge base statistics for diagnostics. Not on the prediction
    /// hot path.
    pub async fn stats(&self) -> Result<KnowledgeStats> {
        let entries = self.store.list_all().await?;

        let flower_types: BTreeSet<String> =
            entries.iter().map(|e| e.flower_type.clone()).collect();
        let varieties: BTreeSet<String> = entries
            .iter()
            .filter_map(|e| e.variety.clone())
            .collect();

        Ok(KnowledgeStats {
            total_entries: entries.len(),
            flower_types: flower_types.into_iter().collect(),
            varieties: varieties.into_iter().collect(),
        })
    }

    /// Load the built-in starter dataset unless the knowledge base already
    /// has entries. Returns the bulk-load report, or `None` when seeding was
    /// skipped.
    pub async fn seed_knowledge_base(&self) -> Result<Option<BulkLoadReport>> {
        let existing = self.store.list_all().await?;
        if !existing.is_empty() {
            info!(
                "Knowledge base already initialized ({} entries), skipping seed",
                existing.len()
            );
            return Ok(None);
        }

        let report = self.add_many(super::seed::starter_entries()).await;
        Ok(Some(report))
    }
}

fn validate_entry(data: &KnowledgeEntryData) -> Result<()> {
    if data.flower_type.trim().is_empty() {
        return Err(FloraRagError::KnowledgeValidation(
            "flower_type must not be empty".to_string(),
        ));
    }
    if data.care_requirements.trim().is_empty() {
        return Err(FloraRagError::KnowledgeValidation(
            "care_requirements must not be empty".to_string(),
        ));
    }
    Ok(())
}
