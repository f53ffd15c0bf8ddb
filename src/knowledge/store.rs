//! Knowledge store collaborator contract

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::Result;
use crate::models::KnowledgeEntry;
use crate::models::KnowledgeEntryData;
use crate::models::KnowledgeEntryPatch;

/// A knowledge entry paired with its similarity score from vector search
#[derive(Debug, Clone)]
pub struct ScoredEntry {
    pub entry: KnowledgeEntry,
    pub score: f32,
}

/// CRUD plus similarity search over the flower-care knowledge base.
///
/// Writes are individually atomic single-row operations; knowledge edits are
/// low-frequency administrative actions, so no multi-row transactions or
/// optimistic concurrency are provided. Mutation goes through the
/// `KnowledgeManager` only, which keeps embeddings consistent with text.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Insert a new entry, optionally with a precomputed embedding.
    async fn insert(
        &self,
        data: &KnowledgeEntryData,
        embedding: Option<Vec<f32>>,
    ) -> Result<KnowledgeEntry>;

    /// Apply a partial update. When `embedding` is `Some`, the stored vector
    /// is replaced; when `None`, it is left untouched.
    async fn update(
        &self,
        id: Uuid,
        patch: &KnowledgeEntryPatch,
        embedding: Option<Vec<f32>>,
    ) -> Result<()>;

    async fn delete(&self, id: Uuid) -> Result<()>;

    async fn get(&self, id: Uuid) -> Result<Option<KnowledgeEntry>>;

    async fn list_all(&self) -> Result<Vec<KnowledgeEntry>>;

    /// Case-insensitive substring match on `flower_type`.
    async fn find_by_flower_type(&self, substring: &str) -> Result<Vec<KnowledgeEntry>>;

    /// Cosine-similarity search. Returns entries whose similarity to the
    /// query vector exceeds `threshold`, best match first, truncated to
    /// `limit`.
    ///
    /// # Errors
    /// - `FloraRagError::KnowledgeStore` with transient/structural
    ///   classification; the retriever retries transient failures once and
    ///   falls back to `text_search` on anything else
    async fn vector_search(
        &self,
        query: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<ScoredEntry>>;

    /// Layered case-insensitive text search, applied in priority order:
    /// exact flower-type match, substring flower-type match, substring
    /// variety match (when a variety is supplied), then a combined substring
    /// match across both fields. Results are unioned in that order and
    /// deduplicated by id.
    ///
    /// The layering exists because naive substring search alone misses
    /// variety-specific records when the flower-type token is generic
    /// (searching "Rose" for a "Red Naomi" entry indexed by variety).
    async fn text_search(
        &self,
        flower_type: &str,
        variety: Option<&str>,
        limit: usize,
    ) -> Result<Vec<KnowledgeEntry>>;
}
