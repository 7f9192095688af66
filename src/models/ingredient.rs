//! Ingredient model
//!
//! One identified food item within an analyzed meal, carrying both its
//! current absolute nutrition and the per-gram rates fixed at ingestion.

use serde::{Deserialize, Serialize};

use super::Nutrition;

/// An ingredient whose nutrition rescales with its weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub name: String,
    /// Current weight in grams, never negative
    pub weight_value: f64,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    // Per-gram reference rates
    pub ref_calories: f64,
    pub ref_protein: f64,
    pub ref_carbs: f64,
    pub ref_fat: f64,
}

impl Ingredient {
    /// Current absolute nutrition
    pub fn nutrition(&self) -> Nutrition {
        Nutrition {
            calories: self.calories,
            protein: self.protein,
            carbs: self.carbs,
            fat: self.fat,
        }
    }

    /// Per-gram reference rates
    pub fn rates(&self) -> Nutrition {
        Nutrition {
            calories: self.ref_calories,
            protein: self.ref_protein,
            carbs: self.ref_carbs,
            fat: self.ref_fat,
        }
    }

    pub(crate) fn set_nutrition(&mut self, nutrition: Nutrition) {
        self.calories = nutrition.calories;
        self.protein = nutrition.protein;
        self.carbs = nutrition.carbs;
        self.fat = nutrition.fat;
    }
}

/// User-supplied weight before coercion to grams
#[derive(Debug, Clone, PartialEq)]
pub enum WeightInput {
    Grams(f64),
    Text(String),
    Missing,
}

impl WeightInput {
    /// Interpret an arbitrary JSON value from a client
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => n.as_f64().map(WeightInput::Grams).unwrap_or(WeightInput::Missing),
            serde_json::Value::String(s) => WeightInput::Text(s.clone()),
            _ => WeightInput::Missing,
        }
    }
}

impl From<f64> for WeightInput {
    fn from(grams: f64) -> Self {
        WeightInput::Grams(grams)
    }
}

impl From<&str> for WeightInput {
    fn from(text: &str) -> Self {
        WeightInput::Text(text.to_string())
    }
}
