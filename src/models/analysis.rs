//! Inference result model
//!
//! The shape returned by the vision service. Numeric fields are required by
//! the service contract but parsed leniently: missing, null, or non-numeric
//! values become `None` and are treated as zero downstream.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Full analysis returned by the inference service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_calories: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub total_weight: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub protein: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub carbs: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub fat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub ingredients: Vec<RawIngredient>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub explanation: String,
}

/// One ingredient as estimated by the service, before reference rates exist
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIngredient {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub weight_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub calories: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub protein: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub carbs: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub fat: Option<f64>,
}

impl RawIngredient {
    pub fn new(name: &str, weight: f64, calories: f64, protein: f64, carbs: f64, fat: f64) -> Self {
        Self {
            name: name.to_string(),
            weight_value: Some(weight),
            calories: Some(calories),
            protein: Some(protein),
            carbs: Some(carbs),
            fat: Some(fat),
        }
    }
}

/// What the service said about the meal as a whole, kept for display
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub reported_calories: f64,
    pub reported_weight: String,
    pub reported_protein: f64,
    pub reported_carbs: f64,
    pub reported_fat: f64,
    pub explanation: String,
}

impl From<&AnalysisResult> for AnalysisSummary {
    fn from(result: &AnalysisResult) -> Self {
        Self {
            reported_calories: result.total_calories.unwrap_or(0.0),
            reported_weight: result.total_weight.clone(),
            reported_protein: result.protein.unwrap_or(0.0),
            reported_carbs: result.carbs.unwrap_or(0.0),
            reported_fat: result.fat.unwrap_or(0.0),
            explanation: result.explanation.clone(),
        }
    }
}

/// Parse a number the way a form field would: trimmed, comma or dot decimal
///
/// Returns None for empty, non-numeric, or non-finite input.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64().filter(|n| n.is_finite()),
        Some(Value::String(s)) => parse_number(&s),
        _ => None,
    })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<RawIngredient>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<RawIngredient>>::deserialize(deserializer)?.unwrap_or_default())
}
