//! Deterministic rule-based prediction
//!
//! Terminal tier of the degradation chain: a pure function of batch
//! attributes with no retrieval and no model call. Always succeeds, so a
//! caller can count on getting a prediction no matter what failed upstream.

use crate::models::BatchQuery;
use crate::models::DetailedPrediction;
use crate::models::PredictionResult;
use crate::models::PredictionTier;

/// Shelf-life bonus in days when floral food is used.
const FLORAL_FOOD_BONUS: f64 = 0.5;

/// Estimate remaining lifespan from batch attributes alone.
///
/// Starts from the expected shelf life and applies fixed adjustments for
/// initial condition, storage environment, and floral food, clamping the
/// result at zero.
pub fn rule_based_prediction(query: &BatchQuery) -> PredictionResult {
    let mut days = query.expected_shelf_life;

    if let Some(condition) = query.initial_condition {
        days += condition.shelf_life_adjustment();
    }
    if let Some(storage) = query.storage_environment {
        days += storage.shelf_life_adjustment();
    }
    if query.floral_food_used {
        days += FLORAL_FOOD_BONUS;
    }

    let days = days.max(0.0);
    let detailed = DetailedPrediction::from_total_hours(days * 24.0);

    let reasoning = format!(
        "Basic prediction based on flower type ({}), storage conditions ({}), and initial \
         quality ({}). AI service was unavailable, so this estimate uses standard adjustment \
         rules applied to the expected shelf life of {} days.",
        query.flower_type,
        query
            .storage_environment
            .map_or("Not specified", |s| s.as_str()),
        query
            .initial_condition
            .map_or("Not specified", |c| c.as_str()),
        query.expected_shelf_life,
    );

    PredictionResult {
        prediction: detailed.as_days(),
        confidence: PredictionTier::RuleBased.default_confidence(),
        reasoning,
        recommendations: vec![
            "Keep flowers in a cool environment away from direct sunlight".to_string(),
            "Change water every 2 days and recut stems at an angle".to_string(),
            "Remove wilted flowers promptly to limit ethylene exposure".to_string(),
        ],
        financial_recommendations: Vec::new(),
        detailed,
        sources: Vec::new(),
        rag_context: None,
        tier: PredictionTier::RuleBased,
    }
}
