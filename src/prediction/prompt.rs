//! Prompt construction for the generative model
//!
//! Pure functions of the batch query and the retrieval prompt block, kept
//! independent of the network call so they can be tested (and snapshotted)
//! in isolation.

use crate::models::BatchQuery;

/// Fixed system instructions for every prediction call.
pub const SYSTEM_INSTRUCTIONS: &str = "You are a flower expert AI assistant with access to \
    specialized flower care knowledge. Provide accurate predictions and practical \
    recommendations for flower lifespan and sales strategies. You must return a single JSON \
    object with keys: prediction{days,hours,minutes,totalHours}, confidence, reasoning, \
    recommendations[]. Always return recommendations as an array of specific, actionable \
    items. Be precise with time predictions, considering factors like storage conditions, \
    initial quality, and care practices. When you have access to specific flower care \
    information, use it to make more accurate predictions and provide targeted \
    recommendations.";

/// Expected response shape, spelled out for the model. `totalHours` is the
/// authoritative value; days/hours/minutes are display hints.
const RESPONSE_FORMAT: &str = r#"Please provide a prediction in the following JSON format:
{
  "prediction": {
    "days": number of full days remaining,
    "hours": number of hours remaining (0-23),
    "minutes": number of minutes remaining (0-59),
    "totalHours": total hours remaining (including fractional hours)
  },
  "confidence": number between 0 and 1,
  "reasoning": "detailed explanation of the prediction",
  "recommendations": ["specific recommendation 1", "specific recommendation 2", "specific recommendation 3"],
  "financialRecommendations": [
    {
      "type": "discount, promotion or pricing",
      "title": "short title",
      "urgency": "low, medium, high or critical",
      "timeWindow": "when to act",
      "discountPercentage": optional number,
      "suggestedPrice": optional number,
      "description": "what to do",
      "justification": "why",
      "actionItems": ["step 1", "step 2"]
    }
  ]
}

Note: The prediction should be precise down to the minute, and totalHours should be used for calculations."#;

/// Build the user prompt from batch attributes and the retrieval evidence
/// block. An empty `prompt_block` yields the unaugmented base prompt.
pub fn build_prompt(query: &BatchQuery, prompt_block: &str) -> String {
    let base = base_prompt(query);

    if prompt_block.is_empty() {
        format!("{base}\n\n{RESPONSE_FORMAT}")
    } else {
        format!(
            "{prompt_block}\n\n{base}\n\n{RESPONSE_FORMAT}\n\nUse the expert care information \
             to make more accurate predictions and provide specific, actionable recommendations."
        )
    }
}

fn base_prompt(query: &BatchQuery) -> String {
    let mut lines = vec![
        "Given the following flower batch information, predict the remaining lifespan and \
         provide recommendations:"
            .to_string(),
        String::new(),
        format!("Flower Type: {}", query.flower_type),
    ];

    if let Some(variety) = &query.variety {
        lines.push(format!("Variety: {variety}"));
    }
    if let Some(quantity) = query.quantity {
        let unit = query.unit_of_measure.as_deref().unwrap_or("stems");
        lines.push(format!("Quantity: {quantity} {unit}"));
    }
    if let Some(supplier) = &query.supplier {
        lines.push(format!("Supplier: {supplier}"));
    }
    if let Some(condition) = query.initial_condition {
        lines.push(format!("Initial Condition: {}", condition.as_str()));
    }
    if let Some(storage) = query.storage_environment {
        lines.push(format!("Storage Environment: {}", storage.as_str()));
    }
    lines.push(format!(
        "Floral Food: {}",
        if query.floral_food_used { "Yes" } else { "No" }
    ));
    if let Some(cleanliness) = query.vase_cleanliness {
        lines.push(format!("Vase Cleanliness: {}", cleanliness.as_str()));
    }
    if let Some(water_type) = &query.water_type {
        lines.push(format!("Water Type: {water_type}"));
    }
    if let Some(humidity) = &query.humidity_level {
        lines.push(format!("Humidity Level: {humidity}"));
    }
    lines.push(format!(
        "Expected Shelf Life: {} days",
        query.expected_shelf_life
    ));

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InitialCondition;
    use crate::models::StorageEnvironment;

    fn sample_query() -> BatchQuery {
        let mut query = BatchQuery::new("Rose", 7.0);
        query.variety = Some("Red Naomi".to_string());
        query.storage_environment = Some(StorageEnvironment::Refrigerated);
        query.initial_condition = Some(InitialCondition::Excellent);
        query.floral_food_used = true;
        query.quantity = Some(24);
        query.supplier = Some("Test Supplier".to_string());
        query
    }

    #[test]
    fn test_base_prompt_carries_batch_attributes() {
        let prompt = build_prompt(&sample_query(), "");
        assert!(prompt.contains("Flower Type: Rose"));
        assert!(prompt.contains("Variety: Red Naomi"));
        assert!(prompt.contains("Quantity: 24 stems"));
        assert!(prompt.contains("Storage Environment: Refrigerated"));
        assert!(prompt.contains("Floral Food: Yes"));
        assert!(prompt.contains("Expected Shelf Life: 7 days"));
        assert!(prompt.contains("\"totalHours\""));
    }

    #[test]
    fn test_prompt_block_is_prepended_when_present() {
        let block = "SPECIFIC CARE INFORMATION FOR ROSE:\n- Care Requirements: clean water";
        let prompt = build_prompt(&sample_query(), block);

        assert!(prompt.starts_with("SPECIFIC CARE INFORMATION FOR ROSE:"));
        assert!(prompt.contains("Flower Type: Rose"));
        assert!(prompt.contains("expert care information"));
    }

    #[test]
    fn test_prompt_is_pure() {
        let a = build_prompt(&sample_query(), "");
        let b = build_prompt(&sample_query(), "");
        assert_eq!(a, b);
    }

    #[test]
    fn test_optional_fields_omitted_when_absent() {
        let query = BatchQuery::new("Tulip", 5.0);
        let prompt = build_prompt(&query, "");
        assert!(prompt.contains("Flower Type: Tulip"));
        assert!(!prompt.contains("Variety:"));
        assert!(!prompt.contains("Supplier:"));
        assert!(prompt.contains("Floral Food: No"));
    }
}
