//! Context retrieval with vector search and layered text fallback

use std::sync::Arc;

use tracing::debug;
use tracing::warn;

use super::context::ContextAssembler;
use super::Retrieval;
use crate::config::AppConfig;
use crate::embeddings::EmbeddingClient;
use crate::errors::Result;
use crate::knowledge::store::KnowledgeStore;
use crate::models::BatchQuery;
use crate::models::RetrievedContext;
use crate::models::SourceRef;

/// Relevance score assigned to text-search hits, which carry no similarity
/// score of their own.
const TEXT_MATCH_SCORE: f32 = 0.8;

/// Retrieves ranked, deduplicated, source-attributed knowledge snippets for
/// a batch query.
pub struct ContextRetriever {
    store: Arc<dyn KnowledgeStore>,
    embeddings: Arc<dyn EmbeddingClient>,
    assembler: ContextAssembler,
    similarity_threshold: f32,
    limit: usize,
}

impl ContextRetriever {
    pub fn new(
        store: Arc<dyn KnowledgeStore>,
        embeddings: Arc<dyn EmbeddingClient>,
        config: &AppConfig,
    ) -> Self {
        Self {
            store,
            embeddings,
            assembler: ContextAssembler::default(),
            similarity_threshold: config.similarity_threshold(),
            limit: config.retrieval_limit(),
        }
    }

    /// Create a retriever with explicit parameters (used by tests)
    pub fn with_params(
        store: Arc<dyn KnowledgeStore>,
        embeddings: Arc<dyn EmbeddingClient>,
        similarity_threshold: f32,
        limit: usize,
    ) -> Self {
        Self {
            store,
            embeddings,
            assembler: ContextAssembler::default(),
            similarity_threshold,
            limit,
        }
    }

    /// Retrieve context for a batch query.
    ///
    /// Best-effort: every failure path degrades to an empty `Retrieval`.
    /// Retrieval must never block prediction.
    pub async fn retrieve(&self, query: &BatchQuery) -> Retrieval {
        match self.retrieve_inner(query).await {
            Ok(retrieval) => retrieval,
            Err(e) => {
                warn!("Retrieval failed, proceeding without context: {}", e);
                Retrieval::default()
            }
        }
    }

    async fn retrieve_inner(&self, query: &BatchQuery) -> Result<Retrieval> {
        debug!(
            "Retrieving context for {} {}",
            query.flower_type,
            query.variety.as_deref().unwrap_or("")
        );

        let scored = self.search_knowledge(query).await;
        debug!("Search produced {} candidate entries", scored.len());

        // Filter to contexts that textually relate to the query. Defends
        // against loosely-matched fallback results, and drops anything with
        // no attribution (unattributed snippets are never surfaced).
        let contexts: Vec<RetrievedContext> = scored
            .into_iter()
            .filter(|ctx| Self::is_relevant(ctx, query))
            .filter(|ctx| !ctx.sources.is_empty())
            .collect();

        debug!("Retained {} relevant contexts", contexts.len());

        let sources = dedup_sources(&contexts);
        let prompt_block = self.assembler.assemble(&contexts, query);

        Ok(Retrieval {
            contexts,
            sources,
            prompt_block,
        })
    }

    /// Vector search with a text-search fallback chain.
    ///
    /// Fallback transitions are explicit branches: embedding failure, a
    /// search error (transient errors retried once), or an empty result set
    /// all lead to the layered text search.
    async fn search_knowledge(&self, query: &BatchQuery) -> Vec<RetrievedContext> {
        let search_text = format!(
            "{} {} care requirements optimal conditions vase life tips",
            query.flower_type,
            query.variety.as_deref().unwrap_or(""),
        );
        let search_text = search_text.split_whitespace().collect::<Vec<_>>().join(" ");

        match self.embeddings.embed(&search_text).await {
            Ok(query_embedding) => {
                match self.vector_search_with_retry(&query_embedding).await {
                    Ok(hits) if !hits.is_empty() => {
                        debug!("Vector search found {} results", hits.len());
                        return hits
                            .into_iter()
                            .map(|s| RetrievedContext::from_entry(&s.entry, s.score))
                            .collect();
                    }
                    Ok(_) => debug!("Vector search found 0 results, using text search"),
                    Err(e) => warn!("Vector search failed, using text search: {}", e),
                }
            }
            Err(e) => warn!("Embedding failed, using text search: {}", e),
        }

        self.text_search_fallback(query).await
    }

    /// Vector search, retried once when the failure is transient. Structural
    /// failures (missing vector index, undefined function) never succeed on
    /// retry and fall through immediately.
    async fn vector_search_with_retry(
        &self,
        query_embedding: &[f32],
    ) -> Result<Vec<crate::knowledge::store::ScoredEntry>> {
        match self
            .store
            .vector_search(query_embedding, self.similarity_threshold, self.limit)
            .await
        {
            Ok(hits) => Ok(hits),
            Err(e) if e.is_transient() => {
                debug!("Transient vector search failure, retrying once: {}", e);
                self.store
                    .vector_search(query_embedding, self.similarity_threshold, self.limit)
                    .await
            }
            Err(e) => Err(e),
        }
    }

    async fn text_search_fallback(&self, query: &BatchQuery) -> Vec<RetrievedContext> {
        match self
            .store
            .text_search(&query.flower_type, query.variety.as_deref(), self.limit)
            .await
        {
            Ok(entries) => {
                debug!("Text search found {} unique results", entries.len());
                entries
                    .iter()
                    .take(self.limit)
                    .map(|entry| RetrievedContext::from_entry(entry, TEXT_MATCH_SCORE))
                    .collect()
            }
            Err(e) => {
                warn!("Text search failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Whether a context's flower type or variety textually relates to the
    /// query's.
    fn is_relevant(ctx: &RetrievedContext, query: &BatchQuery) -> bool {
        let ctx_type = ctx.flower_type.to_lowercase();
        let query_type = query.flower_type.to_lowercase();
        if ctx_type.contains(&query_type) {
            return true;
        }

        match (&ctx.variety, &query.variety) {
            (Some(ctx_variety), Some(query_variety)) => ctx_variety
                .to_lowercase()
                .contains(&query_variety.to_lowercase()),
            _ => false,
        }
    }
}

/// Deduplicate sources across contexts by (name, url) pair, preserving
/// first-seen order.
fn dedup_sources(contexts: &[RetrievedContext]) -> Vec<SourceRef> {
    let mut seen = std::collections::HashSet::new();
    let mut sources = Vec::new();

    for ctx in contexts {
        for source in &ctx.sources {
            if seen.insert((source.name.clone(), source.url.clone())) {
                sources.push(source.clone());
            }
        }
    }

    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceRef;

    fn context(flower_type: &str, variety: Option<&str>, source: (&str, &str)) -> RetrievedContext {
        RetrievedContext {
            flower_type: flower_type.to_string(),
            variety: variety.map(String::from),
            care_requirements: "care".to_string(),
            optimal_conditions: "conditions".to_string(),
            common_issues: "issues".to_string(),
            vase_life_tips: "tips".to_string(),
            sources: vec![SourceRef {
                name: source.0.to_string(),
                url: source.1.to_string(),
            }],
            relevance_score: 0.8,
        }
    }

    #[test]
    fn test_relevance_filter_matches_flower_type_substring() {
        let query = BatchQuery::new("Rose", 7.0);
        let ctx = context("Rose", None, ("a", "b"));
        assert!(ContextRetriever::is_relevant(&ctx, &query));

        let unrelated = context("Tulip", None, ("a", "b"));
        assert!(!ContextRetriever::is_relevant(&unrelated, &query));
    }

    #[test]
    fn test_relevance_filter_matches_variety() {
        let mut query = BatchQuery::new("Rose", 7.0);
        query.variety = Some("Red Naomi".to_string());

        // Variety-indexed entry whose flower type doesn't contain "rose"
        let ctx = context("Hybrid Tea", Some("Red Naomi Select"), ("a", "b"));
        assert!(ContextRetriever::is_relevant(&ctx, &query));
    }

    #[test]
    fn test_relevance_filter_is_case_insensitive() {
        let query = BatchQuery::new("rose", 7.0);
        let ctx = context("ROSE", None, ("a", "b"));
        assert!(ContextRetriever::is_relevant(&ctx, &query));
    }

    #[test]
    fn test_source_dedup_by_name_url_pair() {
        let contexts = vec![
            context("Rose", None, ("American Rose Society", "https://rose.org")),
            context("Rose", Some("Red Naomi"), ("American Rose Society", "https://rose.org")),
            context("Rose", None, ("American Rose Society", "https://rose.org/other")),
        ];

        let sources = dedup_sources(&contexts);
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].url, "https://rose.org");
        assert_eq!(sources[1].url, "https://rose.org/other");
    }
}
