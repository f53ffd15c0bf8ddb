//! Model-response parsing with graceful degradation
//!
//! Tier 1 parses the response as strict JSON (after stripping markdown
//! fences and extracting the outermost object). Tier 2 salvages a malformed
//! response with regex extraction. Both failing, the caller falls through to
//! the rule-based estimate.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;
use tracing::warn;

use crate::models::DetailedPrediction;
use crate::models::FinancialRecommendation;
use crate::models::PredictionTier;

/// Hours assumed when a salvageable response carries no numeric value at all.
const SALVAGE_DEFAULT_HOURS: f64 = 48.0;

/// Upper plausibility bound for a salvaged prediction; a year of vase life
/// means the extracted number was not a lifespan.
const MAX_PLAUSIBLE_HOURS: f64 = 365.0 * 24.0;

/// What the parser recovered from a model response. Sources and retrieval
/// context are attached by the orchestrator afterwards.
#[derive(Debug, Clone)]
pub struct ModelOutcome {
    pub detailed: DetailedPrediction,
    pub confidence: f64,
    pub reasoning: String,
    pub recommendations: Vec<String>,
    pub financial_recommendations: Vec<FinancialRecommendation>,
    pub tier: PredictionTier,
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    prediction: Option<RawPrediction>,
    confidence: Option<f64>,
    reasoning: Option<String>,
    #[serde(default)]
    recommendations: Option<serde_json::Value>,
    #[serde(rename = "financialRecommendations", default)]
    financial_recommendations: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawPrediction {
    #[serde(rename = "totalHours")]
    total_hours: Option<f64>,
}

/// Parse a model response, trying the strict tier first and falling back to
/// regex salvage. `None` means neither tier produced a usable prediction.
pub fn parse_response(raw: &str) -> Option<ModelOutcome> {
    if let Some(outcome) = parse_strict(raw) {
        return Some(outcome);
    }
    debug!("Strict parse failed, attempting salvage extraction");
    salvage(raw)
}

/// Tier 1: strict JSON parse requiring `prediction.totalHours`.
fn parse_strict(raw: &str) -> Option<ModelOutcome> {
    let body = extract_json_object(&strip_code_fences(raw))?;

    let parsed: RawResponse = match serde_json::from_str(&body) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!("Response is not valid JSON: {}", e);
            return None;
        }
    };

    let total_hours = parsed.prediction.as_ref()?.total_hours?;
    if !total_hours.is_finite() {
        return None;
    }

    let confidence = parsed
        .confidence
        .filter(|c| c.is_finite() && (0.0..=1.0).contains(c))
        .unwrap_or_else(|| PredictionTier::Parsed.default_confidence());

    Some(ModelOutcome {
        detailed: DetailedPrediction::from_total_hours(total_hours),
        confidence,
        reasoning: parsed
            .reasoning
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| "Prediction based on flower type and conditions".to_string()),
        recommendations: coerce_recommendations(parsed.recommendations),
        financial_recommendations: coerce_financial(parsed.financial_recommendations),
        tier: PredictionTier::Parsed,
    })
}

/// Remove markdown code fences the model may wrap its JSON in.
fn strip_code_fences(raw: &str) -> String {
    raw.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extract the outermost balanced `{...}` object, tolerating prose before
/// and after it. Tracks string literals so braces inside them don't count.
fn extract_json_object(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[start..=start + offset].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

/// Accept an array of strings, coerce a lone scalar into a single-element
/// list, and drop anything else.
fn coerce_recommendations(value: Option<serde_json::Value>) -> Vec<String> {
    match value {
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
                _ => None,
            })
            .collect(),
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => vec![s],
        _ => Vec::new(),
    }
}

/// Decode financial recommendations element-by-element so one malformed
/// entry doesn't discard the rest.
fn coerce_financial(value: Option<serde_json::Value>) -> Vec<FinancialRecommendation> {
    let Some(serde_json::Value::Array(items)) = value else {
        return Vec::new();
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(rec) => Some(rec),
            Err(e) => {
                debug!("Skipping malformed financial recommendation: {}", e);
                None
            }
        })
        .collect()
}

static TOTAL_HOURS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""totalHours"\s*:\s*(-?\d+(?:\.\d+)?)"#).expect("valid regex"));
static HOURS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(-?\d+(?:\.\d+)?)\s*(?:total\s+)?hours?").expect("valid regex"));
static DAYS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(-?\d+(?:\.\d+)?)\s*days?").expect("valid regex"));
static NUM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("valid regex"));
static REASONING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)reasoning["\s]*:[\s"]*([^"\n]+)"#).expect("valid regex"));
static EXPLANATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)explanation["\s]*:[\s"]*([^"\n]+)"#).expect("valid regex"));
static BECAUSE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(because[^.\n]+)").expect("valid regex"));
static BULLET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*[-*\u{2022}]\s+(.+?)\s*$").expect("valid regex"));

/// Tier 2: regex salvage of a response strict parsing rejected.
///
/// A response with no numeric lifespan at all still salvages with a default
/// of 48 hours; a numeric value outside plausible bounds rejects the salvage
/// entirely so the rule-based estimate takes over.
fn salvage(raw: &str) -> Option<ModelOutcome> {
    let total_hours = extract_hours(raw);

    let total_hours = match total_hours {
        Some(hours) => {
            if !hours.is_finite() || hours < 0.0 || hours > MAX_PLAUSIBLE_HOURS {
                warn!("Salvaged value {} hours is implausible, rejecting", hours);
                return None;
            }
            hours
        }
        None => {
            debug!(
                "No numeric lifespan in response, assuming {} hours",
                SALVAGE_DEFAULT_HOURS
            );
            SALVAGE_DEFAULT_HOURS
        }
    };

    let reasoning = extract_reasoning(raw)
        .unwrap_or_else(|| "Extracted from a partially structured model response".to_string());

    let mut recommendations: Vec<String> = BULLET_RE
        .captures_iter(raw)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .take(5)
        .collect();
    if recommendations.is_empty() {
        recommendations = vec![
            "Keep flowers in clean water".to_string(),
            "Store in a cool environment away from direct sunlight".to_string(),
            "Remove wilted blooms promptly".to_string(),
        ];
    }

    Some(ModelOutcome {
        detailed: DetailedPrediction::from_total_hours(total_hours),
        confidence: PredictionTier::Salvaged.default_confidence(),
        reasoning,
        recommendations,
        financial_recommendations: Vec::new(),
        tier: PredictionTier::Salvaged,
    })
}

/// Pull a reasoning span out of free text. A `reasoning:` label wins
/// (quoted or not), then an `explanation:` label, then the first
/// "because ..." clause.
fn extract_reasoning(raw: &str) -> Option<String> {
    for re in [&*REASONING_RE, &*EXPLANATION_RE, &*BECAUSE_RE] {
        if let Some(captures) = re.captures(raw) {
            let span = captures
                .get(1)?
                .as_str()
                .trim()
                .trim_end_matches(',')
                .trim();
            if !span.is_empty() {
                return Some(span.to_string());
            }
        }
    }
    None
}

/// Pull a total-hours figure out of free text: an explicit `totalHours`
/// field wins, then an "N hours" phrase, then "N days", then a bare numeric
/// token read as days.
fn extract_hours(raw: &str) -> Option<f64> {
    if let Some(captures) = TOTAL_HOURS_RE.captures(raw) {
        return captures.get(1)?.as_str().parse().ok();
    }
    if let Some(captures) = HOURS_RE.captures(raw) {
        return captures.get(1)?.as_str().parse().ok();
    }
    if let Some(captures) = DAYS_RE.captures(raw) {
        let days: f64 = captures.get(1)?.as_str().parse().ok()?;
        return Some(days * 24.0);
    }
    if let Some(token) = NUM_RE.find(raw) {
        let days: f64 = token.as_str().parse().ok()?;
        return Some(days * 24.0);
    }
    None
}
