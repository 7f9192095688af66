//! Reference-rate derivation
//!
//! Turns the service's ingredient estimates into ingredients that can be
//! rescaled later without asking the service again.

use crate::models::{Ingredient, Nutrition, RawIngredient};

/// Weight floor used as the divisor when deriving per-gram rates
pub const MIN_REFERENCE_WEIGHT: f64 = 1.0;

/// Derive per-gram reference rates for every raw ingredient
///
/// Missing numbers count as zero. The divisor weight is floored at 1 g so a
/// missing, zero, or negative weight cannot produce infinite rates; the floored
/// weight also becomes the ingredient's starting weight. Absolute values are
/// copied as-is and only recomputed on later weight edits.
pub fn derive(raw: &[RawIngredient]) -> Vec<Ingredient> {
    raw.iter().map(derive_one).collect()
}

fn derive_one(raw: &RawIngredient) -> Ingredient {
    let weight = raw.weight_value.unwrap_or(0.0).max(MIN_REFERENCE_WEIGHT);
    let nutrition = Nutrition {
        calories: raw.calories.unwrap_or(0.0),
        protein: raw.protein.unwrap_or(0.0),
        carbs: raw.carbs.unwrap_or(0.0),
        fat: raw.fat.unwrap_or(0.0),
    };
    Ingredient {
        name: raw.name.clone(),
        weight_value: weight,
        calories: nutrition.calories,
        protein: nutrition.protein,
        carbs: nutrition.carbs,
        fat: nutrition.fat,
        ref_calories: nutrition.calories / weight,
        ref_protein: nutrition.protein / weight,
        ref_carbs: nutrition.carbs / weight,
        ref_fat: nutrition.fat / weight,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_rice_reference_rates() {
        let ingredients = derive(&[RawIngredient::new("Ориз", 150.0, 195.0, 4.0, 42.0, 0.5)]);
        let rice = &ingredients[0];
        assert_eq!(rice.name, "Ориз");
        assert_eq!(rice.weight_value, 150.0);
        assert!(close(rice.ref_calories, 1.3));
        assert!(close(rice.ref_carbs, 0.28));
        // absolute values are copied, not recomputed
        assert_eq!(rice.calories, 195.0);
        assert_eq!(rice.fat, 0.5);
    }

    #[test]
    fn test_rate_is_value_over_weight() {
        for (weight, calories) in [(1.0, 7.0), (2.5, 10.0), (400.0, 1000.0)] {
            let out = derive(&[RawIngredient::new("x", weight, calories, 0.0, 0.0, 0.0)]);
            assert!(close(out[0].ref_calories, calories / weight));
        }
    }

    #[test]
    fn test_small_or_missing_weight_floors_to_one_gram() {
        let raws = vec![
            RawIngredient::new("zero", 0.0, 30.0, 1.0, 2.0, 3.0),
            RawIngredient::new("fraction", 0.4, 30.0, 1.0, 2.0, 3.0),
            RawIngredient::new("negative", -20.0, 30.0, 1.0, 2.0, 3.0),
            RawIngredient { weight_value: None, ..RawIngredient::new("missing", 0.0, 30.0, 1.0, 2.0, 3.0) },
        ];
        for ingredient in derive(&raws) {
            assert_eq!(ingredient.weight_value, 1.0, "{}", ingredient.name);
            assert_eq!(ingredient.ref_calories, 30.0);
            assert_eq!(ingredient.ref_fat, 3.0);
        }
    }

    #[test]
    fn test_missing_nutrients_are_zero() {
        let raw = RawIngredient {
            name: "Сос".to_string(),
            weight_value: Some(20.0),
            ..Default::default()
        };
        let out = derive(&[raw]);
        assert_eq!(out[0].calories, 0.0);
        assert_eq!(out[0].ref_protein, 0.0);
        assert_eq!(out[0].weight_value, 20.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(derive(&[]).is_empty());
    }
}
