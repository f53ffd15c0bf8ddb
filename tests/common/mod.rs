//! In-process fakes for the pipeline's collaborator traits

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use florarag::embeddings::EmbeddingClient;
use florarag::errors::FloraRagError;
use florarag::errors::Result;
use florarag::errors::StoreErrorKind;
use florarag::knowledge::store::ScoredEntry;
use florarag::knowledge::KnowledgeStore;
use florarag::llm::CompletionClient;
use florarag::models::FlowerBatch;
use florarag::models::KnowledgeEntry;
use florarag::models::KnowledgeEntryData;
use florarag::models::KnowledgeEntryPatch;
use florarag::models::PredictionResult;
use florarag::prediction::BatchStore;
use uuid::Uuid;

/// Build a complete knowledge entry for tests.
pub fn entry(flower_type: &str, variety: Option<&str>, source: (&str, &str)) -> KnowledgeEntry {
    KnowledgeEntry {
        id: Uuid::new_v4(),
        flower_type: flower_type.to_string(),
        variety: variety.map(String::from),
        care_requirements: "Keep water clean, use floral food".to_string(),
        optimal_temperature: "1-2C".to_string(),
        optimal_humidity: "85-90%".to_string(),
        water_requirements: "Change water every 2 days".to_string(),
        ethylene_sensitivity: "High".to_string(),
        common_issues: "Bent neck, petal drop".to_string(),
        vase_life_tips: "Recut stems at an angle".to_string(),
        source_name: source.0.to_string(),
        source_url: source.1.to_string(),
        embedding: None,
        created_at: Utc::now(),
    }
}

/// Deterministic embedding client. Fails every call when `fail` is set.
pub struct FakeEmbeddings {
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl FakeEmbeddings {
    pub fn new() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingClient for FakeEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(FloraRagError::EmbeddingService(
                "embedding service down".to_string(),
            ));
        }
        // Stable, length-derived vector so identical text embeds identically
        let seed = text.len() as f32;
        Ok(vec![seed.sin(), seed.cos(), 0.5, 0.5])
    }
}

/// How the fake store's vector search behaves.
pub enum VectorBehavior {
    Hits(Vec<ScoredEntry>),
    Empty,
    /// First call fails with a transient error, subsequent calls return hits
    TransientThenHits(Vec<ScoredEntry>),
    /// Every call fails with a transient error
    AlwaysTransient,
    /// Every call fails with a structural error (never retried)
    Structural,
}

/// In-memory knowledge store with scriptable vector-search behavior.
pub struct FakeStore {
    pub entries: Mutex<Vec<KnowledgeEntry>>,
    pub vector_behavior: VectorBehavior,
    pub vector_calls: AtomicUsize,
    pub text_calls: AtomicUsize,
}

impl FakeStore {
    pub fn new(vector_behavior: VectorBehavior) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            vector_behavior,
            vector_calls: AtomicUsize::new(0),
            text_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_entries(vector_behavior: VectorBehavior, entries: Vec<KnowledgeEntry>) -> Self {
        let store = Self::new(vector_behavior);
        *store.entries.lock().unwrap() = entries;
        store
    }

    pub fn vector_call_count(&self) -> usize {
        self.vector_calls.load(Ordering::SeqCst)
    }

    pub fn text_call_count(&self) -> usize {
        self.text_calls.load(Ordering::SeqCst)
    }

    fn transient_error() -> FloraRagError {
        FloraRagError::KnowledgeStore {
            kind: StoreErrorKind::Transient,
            message: "connection reset by peer".to_string(),
        }
    }

    fn structural_error() -> FloraRagError {
        FloraRagError::KnowledgeStore {
            kind: StoreErrorKind::Structural,
            message: "operator does not exist: vector <=> vector".to_string(),
        }
    }
}

#[async_trait]
impl KnowledgeStore for FakeStore {
    async fn insert(
        &self,
        data: &KnowledgeEntryData,
        embedding: Option<Vec<f32>>,
    ) -> Result<KnowledgeEntry> {
        let inserted = KnowledgeEntry {
            id: Uuid::new_v4(),
            flower_type: data.flower_type.clone(),
            variety: data.variety.clone(),
            care_requirements: data.care_requirements.clone(),
            optimal_temperature: data.optimal_temperature.clone(),
            optimal_humidity: data.optimal_humidity.clone(),
            water_requirements: data.water_requirements.clone(),
            ethylene_sensitivity: data.ethylene_sensitivity.clone(),
            common_issues: data.common_issues.clone(),
            vase_life_tips: data.vase_life_tips.clone(),
            source_name: data.source_name.clone(),
            source_url: data.source_url.clone(),
            embedding: embedding.map(pgvector::Vector::from),
            created_at: Utc::now(),
        };
        self.entries.lock().unwrap().push(inserted.clone());
        Ok(inserted)
    }

    async fn update(
        &self,
        id: Uuid,
        patch: &KnowledgeEntryPatch,
        embedding: Option<Vec<f32>>,
    ) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        let current = entries.iter_mut().find(|e| e.id == id).ok_or_else(|| {
            FloraRagError::KnowledgeValidation(format!("No knowledge entry with id {id}"))
        })?;

        let merged = patch.apply_to(current);
        current.flower_type = merged.flower_type;
        current.variety = merged.variety;
        current.care_requirements = merged.care_requirements;
        current.optimal_temperature = merged.optimal_temperature;
        current.optimal_humidity = merged.optimal_humidity;
        current.water_requirements = merged.water_requirements;
        current.ethylene_sensitivity = merged.ethylene_sensitivity;
        current.common_issues = merged.common_issues;
        current.vase_life_tips = merged.vase_life_tips;
        current.source_name = merged.source_name;
        current.source_url = merged.source_url;
        if let Some(embedding) = embedding {
            current.embedding = Some(pgvector::Vector::from(embedding));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.entries.lock().unwrap().retain(|e| e.id != id);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<KnowledgeEntry>> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id == id)
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<KnowledgeEntry>> {
        Ok(self.entries.lock().unwrap().clone())
    }

    async fn find_by_flower_type(&self, substring: &str) -> Result<Vec<KnowledgeEntry>> {
        let needle = substring.to_lowercase();
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.flower_type.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn vector_search(
        &self,
        _query: &[f32],
        _threshold: f32,
        limit: usize,
    ) -> Result<Vec<ScoredEntry>> {
        let call = self.vector_calls.fetch_add(1, Ordering::SeqCst);
        match &self.vector_behavior {
            VectorBehavior::Hits(hits) => Ok(hits.iter().take(limit).cloned().collect()),
            VectorBehavior::Empty => Ok(Vec::new()),
            VectorBehavior::TransientThenHits(hits) => {
                if call == 0 {
                    Err(Self::transient_error())
                } else {
                    Ok(hits.iter().take(limit).cloned().collect())
                }
            }
            VectorBehavior::AlwaysTransient => Err(Self::transient_error()),
            VectorBehavior::Structural => Err(Self::structural_error()),
        }
    }

    async fn text_search(
        &self,
        flower_type: &str,
        variety: Option<&str>,
        limit: usize,
    ) -> Result<Vec<KnowledgeEntry>> {
        self.text_calls.fetch_add(1, Ordering::SeqCst);
        let entries = self.entries.lock().unwrap();
        let type_needle = flower_type.to_lowercase();
        let variety_needle = variety.map(str::to_lowercase);

        let mut seen = std::collections::HashSet::new();
        let mut results = Vec::new();
        for e in entries.iter() {
            let type_match = e.flower_type.to_lowercase().contains(&type_needle);
            let variety_match = match (&variety_needle, &e.variety) {
                (Some(needle), Some(v)) => v.to_lowercase().contains(needle),
                _ => false,
            };
            if (type_match || variety_match) && seen.insert(e.id) {
                results.push(e.clone());
            }
            if results.len() >= limit {
                break;
            }
        }
        Ok(results)
    }
}

/// Scripted completion client recording every prompt it receives.
pub enum CompletionScript {
    Respond(String),
    Fail,
}

pub struct FakeCompletion {
    script: CompletionScript,
    pub prompts: Mutex<Vec<String>>,
    pub calls: AtomicUsize,
}

impl FakeCompletion {
    pub fn responding(response: impl Into<String>) -> Self {
        Self {
            script: CompletionScript::Respond(response.into()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            script: CompletionScript::Fail,
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CompletionClient for FakeCompletion {
    async fn complete(
        &self,
        _system_instructions: &str,
        user_prompt: &str,
        _temperature: f32,
        _max_tokens: u32,
    ) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(user_prompt.to_string());
        match &self.script {
            CompletionScript::Respond(response) => Ok(response.clone()),
            CompletionScript::Fail => Err(FloraRagError::ModelCall(
                "model endpoint unreachable".to_string(),
            )),
        }
    }
}

/// In-memory batch store recording saved predictions.
pub struct FakeBatchStore {
    pub batches: Mutex<HashMap<Uuid, FlowerBatch>>,
    pub saved: Mutex<Vec<(Uuid, PredictionResult, DateTime<Utc>)>>,
}

impl FakeBatchStore {
    pub fn with_batch(batch: FlowerBatch) -> Self {
        let mut batches = HashMap::new();
        batches.insert(batch.id, batch);
        Self {
            batches: Mutex::new(batches),
            saved: Mutex::new(Vec::new()),
        }
    }

    pub fn save_count(&self) -> usize {
        self.saved.lock().unwrap().len()
    }
}

#[async_trait]
impl BatchStore for FakeBatchStore {
    async fn get_batch(&self, id: Uuid) -> Result<Option<FlowerBatch>> {
        Ok(self.batches.lock().unwrap().get(&id).cloned())
    }

    async fn save_prediction(
        &self,
        id: Uuid,
        result: &PredictionResult,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        self.saved
            .lock()
            .unwrap()
            .push((id, result.clone(), updated_at));

        if let Some(batch) = self.batches.lock().unwrap().get_mut(&id) {
            batch.ai_prediction = Some(result.prediction);
            batch.ai_confidence = Some(result.confidence);
            batch.ai_reasoning = Some(result.reasoning.clone());
            batch.ai_last_updated = Some(updated_at);
        }
        Ok(())
    }
}

/// A stored batch with no cached prediction.
pub fn batch(flower_type: &str, expected_shelf_life: f64) -> FlowerBatch {
    FlowerBatch {
        id: Uuid::new_v4(),
        flower_type: flower_type.to_string(),
        variety: None,
        quantity: 12,
        unit_of_measure: "stems".to_string(),
        supplier: None,
        initial_condition: "Good".to_string(),
        storage_environment: "Refrigerated".to_string(),
        water_type: None,
        humidity_level: None,
        floral_food_used: false,
        vase_cleanliness: None,
        expected_shelf_life,
        ai_prediction: None,
        ai_confidence: None,
        ai_reasoning: None,
        ai_recommendations: None,
        ai_financial_recommendations: None,
        ai_context: None,
        ai_last_updated: None,
        created_at: Utc::now(),
    }
}
