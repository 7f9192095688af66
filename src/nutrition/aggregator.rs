//! Nutrition aggregation
//!
//! Sums the live ingredient collection into session totals.

use crate::models::{Ingredient, Nutrition, SessionTotals};

/// Sum calories, macros, and weight across all ingredients
///
/// Always a full recomputation over the slice; an empty slice yields zeros.
pub fn aggregate(ingredients: &[Ingredient]) -> SessionTotals {
    let nutrition: Nutrition = ingredients.iter().map(Ingredient::nutrition).sum();
    let weight: f64 = ingredients.iter().map(|i| i.weight_value).sum();

    SessionTotals {
        calories: nutrition.calories,
        protein: nutrition.protein,
        carbs: nutrition.carbs,
        fat: nutrition.fat,
        weight,
    }
}
