use chrono::DateTime;
use chrono::Utc;
use pgvector::Vector;
use serde::Deserialize;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Initial quality of a flower batch at intake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitialCondition {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl InitialCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
        }
    }

    /// Shelf-life adjustment in days used by the rule-based fallback
    pub fn shelf_life_adjustment(&self) -> f64 {
        match self {
            Self::Excellent => 1.0,
            Self::Good => 0.5,
            Self::Fair => -0.5,
            Self::Poor => -1.0,
        }
    }
}

impl std::str::FromStr for InitialCondition {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Excellent" => Ok(Self::Excellent),
            "Good" => Ok(Self::Good),
            "Fair" => Ok(Self::Fair),
            "Poor" => Ok(Self::Poor),
            other => Err(format!("unknown initial condition: {other}")),
        }
    }
}

/// Where the batch is stored between intake and sale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageEnvironment {
    Refrigerated,
    #[serde(rename = "Room Temperature")]
    RoomTemperature,
    Other,
}

impl StorageEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Refrigerated => "Refrigerated",
            Self::RoomTemperature => "Room Temperature",
            Self::Other => "Other",
        }
    }

    /// Shelf-life adjustment in days used by the rule-based fallback
    pub fn shelf_life_adjustment(&self) -> f64 {
        match self {
            Self::Refrigerated => 1.0,
            Self::RoomTemperature => -0.5,
            Self::Other => 0.0,
        }
    }
}

impl std::str::FromStr for StorageEnvironment {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Refrigerated" => Ok(Self::Refrigerated),
            "Room Temperature" => Ok(Self::RoomTemperature),
            "Other" => Ok(Self::Other),
            other => Err(format!("unknown storage environment: {other}")),
        }
    }
}

/// Cleanliness of the vase or bucket holding the batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaseCleanliness {
    Clean,
    Rinsed,
    Dirty,
}

impl VaseCleanliness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clean => "Clean",
            Self::Rinsed => "Rinsed",
            Self::Dirty => "Dirty",
        }
    }
}

/// One stored fact record about a flower type/variety's care characteristics
#[derive(Debug, Clone, FromRow)]
pub struct KnowledgeEntry {
    pub id: Uuid,
    pub flower_type: String,
    pub variety: Option<String>,
    pub care_requirements: String,
    pub optimal_temperature: String,
    pub optimal_humidity: String,
    pub water_requirements: String,
    pub ethylene_sensitivity: String,
    pub common_issues: String,
    pub vase_life_tips: String,
    pub source_name: String,
    pub source_url: String,
    /// Null until computed; regenerated whenever any free-text field changes
    pub embedding: Option<Vector>,
    pub created_at: DateTime<Utc>,
}

impl KnowledgeEntry {
    /// Text used to generate this entry's embedding.
    ///
    /// Field order is stable; changing it would silently invalidate every
    /// stored embedding.
    pub fn embedding_text(&self) -> String {
        embedding_text_from_parts(
            &self.flower_type,
            self.variety.as_deref(),
            &self.care_requirements,
            &self.optimal_temperature,
            &self.optimal_humidity,
            &self.water_requirements,
            &self.ethylene_sensitivity,
            &self.common_issues,
            &self.vase_life_tips,
        )
    }
}

/// Payload for inserting a new knowledge entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeEntryData {
    pub flower_type: String,
    pub variety: Option<String>,
    pub care_requirements: String,
    pub optimal_temperature: String,
    pub optimal_humidity: String,
    pub water_requirements: String,
    pub ethylene_sensitivity: String,
    pub common_issues: String,
    pub vase_life_tips: String,
    pub source_name: String,
    pub source_url: String,
}

impl KnowledgeEntryData {
    /// Text used to generate the embedding for this payload (same stable
    /// field order as `KnowledgeEntry::embedding_text`).
    pub fn embedding_text(&self) -> String {
        embedding_text_from_parts(
            &self.flower_type,
            self.variety.as_deref(),
            &self.care_requirements,
            &self.optimal_temperature,
            &self.optimal_humidity,
            &self.water_requirements,
            &self.ethylene_sensitivity,
            &self.common_issues,
            &self.vase_life_tips,
        )
    }
}

fn embedding_text_from_parts(
    flower_type: &str,
    variety: Option<&str>,
    care_requirements: &str,
    optimal_temperature: &str,
    optimal_humidity: &str,
    water_requirements: &str,
    ethylene_sensitivity: &str,
    common_issues: &str,
    vase_life_tips: &str,
) -> String {
    let mut parts = vec![flower_type];
    if let Some(variety) = variety {
        parts.push(variety);
    }
    parts.extend([
        care_requirements,
        optimal_temperature,
        optimal_humidity,
        water_requirements,
        ethylene_sensitivity,
        common_issues,
        vase_life_tips,
    ]);
    parts.join(" ")
}

/// Partial update of a knowledge entry. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeEntryPatch {
    pub flower_type: Option<String>,
    pub variety: Option<String>,
    pub care_requirements: Option<String>,
    pub optimal_temperature: Option<String>,
    pub optimal_humidity: Option<String>,
    pub water_requirements: Option<String>,
    pub ethylene_sensitivity: Option<String>,
    pub common_issues: Option<String>,
    pub vase_life_tips: Option<String>,
    pub source_name: Option<String>,
    pub source_url: Option<String>,
}

impl KnowledgeEntryPatch {
    /// Whether this patch touches any field that feeds the embedding text.
    /// Attribution fields (`source_name`, `source_url`) do not.
    pub fn touches_embedded_text(&self) -> bool {
        self.flower_type.is_some()
            || self.variety.is_some()
            || self.care_requirements.is_some()
            || self.optimal_temperature.is_some()
            || self.optimal_humidity.is_some()
            || self.water_requirements.is_some()
            || self.ethylene_sensitivity.is_some()
            || self.common_issues.is_some()
            || self.vase_life_tips.is_some()
    }

    pub fn is_empty(&self) -> bool {
        !self.touches_embedded_text() && self.source_name.is_none() && self.source_url.is_none()
    }

    /// Merge this patch over an existing entry, producing the post-update
    /// field values (used to regenerate the embedding before writing).
    pub fn apply_to(&self, current: &KnowledgeEntry) -> KnowledgeEntryData {
        KnowledgeEntryData {
            flower_type: self
                .flower_type
                .clone()
                .unwrap_or_else(|| current.flower_type.clone()),
            variety: self.variety.clone().or_else(|| current.variety.clone()),
            care_requirements: self
                .care_requirements
                .clone()
                .unwrap_or_else(|| current.care_requirements.clone()),
            optimal_temperature: self
                .optimal_temperature
                .clone()
                .unwrap_or_else(|| current.optimal_temperature.clone()),
            optimal_humidity: self
                .optimal_humidity
                .clone()
                .unwrap_or_else(|| current.optimal_humidity.clone()),
            water_requirements: self
                .water_requirements
                .clone()
                .unwrap_or_else(|| current.water_requirements.clone()),
            ethylene_sensitivity: self
                .ethylene_sensitivity
                .clone()
                .unwrap_or_else(|| current.ethylene_sensitivity.clone()),
            common_issues: self
                .common_issues
                .clone()
                .unwrap_or_else(|| current.common_issues.clone()),
            vase_life_tips: self
                .vase_life_tips
                .clone()
                .unwrap_or_else(|| current.vase_life_tips.clone()),
            source_name: self
                .source_name
                .clone()
                .unwrap_or_else(|| current.source_name.clone()),
            source_url: self
                .source_url
                .clone()
                .unwrap_or_else(|| current.source_url.clone()),
        }
    }
}

/// Attribution for a retrieved snippet
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRef {
    pub name: String,
    pub url: String,
}

/// Knowledge snippet retrieved for a query, projected from a
/// `KnowledgeEntry` with the three condition fields merged at read time.
///
/// Invariant: carries at least one source; unattributed entries are never
/// surfaced to the prediction orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedContext {
    pub flower_type: String,
    pub variety: Option<String>,
    pub care_requirements: String,
    pub optimal_conditions: String,
    pub common_issues: String,
    pub vase_life_tips: String,
    pub sources: Vec<SourceRef>,
    pub relevance_score: f32,
}

impl RetrievedContext {
    /// Project a knowledge entry into a retrieval context with the given
    /// relevance score.
    pub fn from_entry(entry: &KnowledgeEntry, relevance_score: f32) -> Self {
        Self {
            flower_type: entry.flower_type.clone(),
            variety: entry.variety.clone(),
            care_requirements: entry.care_requirements.clone(),
            optimal_conditions: format!(
                "Temperature: {}, Humidity: {}, Water: {}",
                entry.optimal_temperature, entry.optimal_humidity, entry.water_requirements
            ),
            common_issues: entry.common_issues.clone(),
            vase_life_tips: entry.vase_life_tips.clone(),
            sources: vec![SourceRef {
                name: entry.source_name.clone(),
                url: entry.source_url.clone(),
            }],
            relevance_score,
        }
    }
}

/// Query input for retrieval and prediction. Ephemeral, built from a flower
/// batch record or supplied directly by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchQuery {
    pub flower_type: String,
    pub variety: Option<String>,
    pub storage_environment: Option<StorageEnvironment>,
    pub initial_condition: Option<InitialCondition>,
    pub floral_food_used: bool,
    /// Expected shelf life in days; base value for the rule-based fallback
    pub expected_shelf_life: f64,
    pub quantity: Option<i32>,
    pub unit_of_measure: Option<String>,
    pub supplier: Option<String>,
    pub water_type: Option<String>,
    pub humidity_level: Option<String>,
    pub vase_cleanliness: Option<VaseCleanliness>,
}

impl BatchQuery {
    /// Minimal query with just the required fields
    pub fn new(flower_type: impl Into<String>, expected_shelf_life: f64) -> Self {
        Self {
            flower_type: flower_type.into(),
            variety: None,
            storage_environment: None,
            initial_condition: None,
            floral_food_used: false,
            expected_shelf_life,
            quantity: None,
            unit_of_measure: None,
            supplier: None,
            water_type: None,
            humidity_level: None,
            vase_cleanliness: None,
        }
    }
}

/// Flower batch record as stored by the batch-record collaborator, carrying
/// the cached prediction columns.
#[derive(Debug, Clone, FromRow)]
pub struct FlowerBatch {
    pub id: Uuid,
    pub flower_type: String,
    pub variety: Option<String>,
    pub quantity: i32,
    pub unit_of_measure: String,
    pub supplier: Option<String>,
    pub initial_condition: String,
    pub storage_environment: String,
    pub water_type: Option<String>,
    pub humidity_level: Option<String>,
    pub floral_food_used: bool,
    pub vase_cleanliness: Option<String>,
    pub expected_shelf_life: f64,
    pub ai_prediction: Option<f64>,
    pub ai_confidence: Option<f64>,
    pub ai_reasoning: Option<String>,
    pub ai_recommendations: Option<serde_json::Value>,
    pub ai_financial_recommendations: Option<serde_json::Value>,
    /// JSON blob carrying the rag context and sources for later display
    pub ai_context: Option<serde_json::Value>,
    pub ai_last_updated: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl FlowerBatch {
    /// Build the retrieval/prediction query for this batch.
    pub fn to_query(&self) -> BatchQuery {
        BatchQuery {
            flower_type: self.flower_type.clone(),
            variety: self.variety.clone(),
            storage_environment: self.storage_environment.parse().ok(),
            initial_condition: self.initial_condition.parse().ok(),
            floral_food_used: self.floral_food_used,
            expected_shelf_life: self.expected_shelf_life,
            quantity: Some(self.quantity),
            unit_of_measure: Some(self.unit_of_measure.clone()),
            supplier: self.supplier.clone(),
            water_type: self.water_type.clone(),
            humidity_level: self.humidity_level.clone(),
            vase_cleanliness: self
                .vase_cleanliness
                .as_deref()
                .and_then(|v| match v {
                    "Clean" => Some(VaseCleanliness::Clean),
                    "Rinsed" => Some(VaseCleanliness::Rinsed),
                    "Dirty" => Some(VaseCleanliness::Dirty),
                    _ => None,
                }),
        }
    }
}

/// Sub-day prediction breakdown. `total_hours` is authoritative; the other
/// fields are derived from it for display, never accumulated independently.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetailedPrediction {
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    #[serde(rename = "totalHours")]
    pub total_hours: f64,
}

impl DetailedPrediction {
    /// Derive days/hours/minutes from a total-hours value.
    pub fn from_total_hours(total_hours: f64) -> Self {
        let total_hours = total_hours.max(0.0);
        let days = (total_hours / 24.0).floor();
        let remaining_hours = total_hours - days * 24.0;
        let hours = remaining_hours.floor();
        let minutes = ((remaining_hours - hours) * 60.0).floor();
        Self {
            days: days as u32,
            hours: hours as u32,
            minutes: minutes as u32,
            total_hours,
        }
    }

    /// Prediction expressed in fractional days.
    pub fn as_days(&self) -> f64 {
        self.total_hours / 24.0
    }
}

/// Urgency of a pricing/discount action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
}

/// Structured pricing/discount action suggested alongside care
/// recommendations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialRecommendation {
    #[serde(rename = "type")]
    pub action_type: String,
    pub title: String,
    pub urgency: Urgency,
    #[serde(rename = "timeWindow")]
    pub time_window: String,
    #[serde(rename = "discountPercentage", default)]
    pub discount_percentage: Option<f32>,
    #[serde(rename = "suggestedPrice", default)]
    pub suggested_price: Option<f32>,
    pub description: String,
    pub justification: String,
    #[serde(rename = "actionItems", default)]
    pub action_items: Vec<String>,
}

/// Which degradation tier produced a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredictionTier {
    /// Model response parsed as strict JSON
    Parsed,
    /// Model response salvaged via regex extraction
    Salvaged,
    /// Deterministic rule-based estimate, no model involved
    RuleBased,
}

impl PredictionTier {
    /// Confidence assigned when the model response carries none of its own.
    pub fn default_confidence(&self) -> f64 {
        match self {
            Self::Parsed => 0.8,
            Self::Salvaged => 0.7,
            Self::RuleBased => 0.6,
        }
    }
}

/// Final spoilage prediction returned to callers.
///
/// Always well-formed: the rule-based fallback guarantees a prediction value
/// even when retrieval, the model call, and parsing all fail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Remaining lifespan in fractional days, never negative
    pub prediction: f64,
    pub confidence: f64,
    pub reasoning: String,
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub financial_recommendations: Vec<FinancialRecommendation>,
    pub detailed: DetailedPrediction,
    /// Deduplicated attribution for every snippet that informed the answer
    pub sources: Vec<SourceRef>,
    /// The single highest-relevance context actually used, if any
    pub rag_context: Option<RetrievedContext>,
    pub tier: PredictionTier,
}

/// Knowledge base statistics for diagnostics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeStats {
    pub total_entries: usize,
    pub flower_types: Vec<String>,
    pub varieties: Vec<String>,
}

/// Outcome of a bulk knowledge load. Partial success is expected; failures
/// are reported per entry without aborting the rest.
#[derive(Debug, Clone, Default)]
pub struct BulkLoadReport {
    pub inserted: usize,
    pub failures: Vec<(usize, String)>,
}

impl BulkLoadReport {
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detailed_prediction_from_total_hours() {
        let detailed = DetailedPrediction::from_total_hours(51.0);
        assert_eq!(detailed.days, 2);
        assert_eq!(detailed.hours, 3);
        assert_eq!(detailed.minutes, 0);
        assert_eq!(detailed.as_days(), 2.125);
    }

    #[test]
    fn test_detailed_prediction_minutes_derived_from_total() {
        // 2 days, 5 hours, 30 minutes
        let detailed = DetailedPrediction::from_total_hours(53.5);
        assert_eq!(detailed.days, 2);
        assert_eq!(detailed.hours, 5);
        assert_eq!(detailed.minutes, 30);
    }

    #[test]
    fn test_detailed_prediction_clamps_negative() {
        let detailed = DetailedPrediction::from_total_hours(-3.0);
        assert_eq!(detailed.total_hours, 0.0);
        assert_eq!(detailed.days, 0);
    }

    #[test]
    fn test_embedding_text_stable_field_order() {
        let data = KnowledgeEntryData {
            flower_type: "Rose".to_string(),
            variety: Some("Red Naomi".to_string()),
            care_requirements: "clean water".to_string(),
            optimal_temperature: "1-2C".to_string(),
            optimal_humidity: "85-90%".to_string(),
            water_requirements: "change every 2 days".to_string(),
            ethylene_sensitivity: "high".to_string(),
            common_issues: "bent neck".to_string(),
            vase_life_tips: "recut stems".to_string(),
            source_name: "ARS".to_string(),
            source_url: "https://example.org".to_string(),
        };

        assert_eq!(
            data.embedding_text(),
            "Rose Red Naomi clean water 1-2C 85-90% change every 2 days high bent neck recut stems"
        );
    }

    #[test]
    fn test_patch_touching_only_attribution_does_not_reembed() {
        let patch = KnowledgeEntryPatch {
            source_url: Some("https://example.org/new".to_string()),
            ..Default::default()
        };
        assert!(!patch.touches_embedded_text());
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_patch_touching_text_requires_reembed() {
        let patch = KnowledgeEntryPatch {
            vase_life_tips: Some("use cold water".to_string()),
            ..Default::default()
        };
        assert!(patch.touches_embedded_text());
    }

    #[test]
    fn test_condition_adjustments() {
        assert_eq!(InitialCondition::Excellent.shelf_life_adjustment(), 1.0);
        assert_eq!(InitialCondition::Poor.shelf_life_adjustment(), -1.0);
        assert_eq!(StorageEnvironment::Refrigerated.shelf_life_adjustment(), 1.0);
        assert_eq!(
            StorageEnvironment::RoomTemperature.shelf_life_adjustment(),
            -0.5
        );
        assert_eq!(StorageEnvironment::Other.shelf_life_adjustment(), 0.0);
    }

    #[test]
    fn test_storage_environment_round_trip() {
        let env: StorageEnvironment = "Room Temperature".parse().unwrap();
        assert_eq!(env, StorageEnvironment::RoomTemperature);
        assert_eq!(env.as_str(), "Room Temperature");
        assert!("Freezer".parse::<StorageEnvironment>().is_err());
    }
}
