//! Weight editing
//!
//! Rescales one ingredient's absolute nutrition from its reference rates.

use crate::models::{parse_number, Ingredient, WeightInput};

/// Return a copy of `ingredients` with the weight at `index` replaced
///
/// Negative and NaN weights are clamped to 0. Calories round to whole units,
/// protein/carbs/fat to one decimal place. Reference rates and every other
/// ingredient are left untouched.
///
/// # Panics
///
/// Panics if `index` is out of range. Callers validate indices first.
pub fn set_weight(ingredients: &[Ingredient], index: usize, new_weight: f64) -> Vec<Ingredient> {
    let mut next = ingredients.to_vec();
    set_weight_in_place(&mut next, index, new_weight);
    next
}

/// In-place form of [`set_weight`], for the owner of the collection
///
/// # Panics
///
/// Panics if `index` is out of range.
pub fn set_weight_in_place(ingredients: &mut [Ingredient], index: usize, new_weight: f64) {
    let len = ingredients.len();
    let Some(item) = ingredients.get_mut(index) else {
        panic!("ingredient index {index} out of range for {len} ingredients");
    };
    let weight = clamp_weight(new_weight);
    item.weight_value = weight;
    item.set_nutrition(item.rates().scale(weight).rounded());
}

/// Coerce raw user input to grams; anything non-numeric is 0
pub fn coerce_weight(input: &WeightInput) -> f64 {
    let grams = match input {
        WeightInput::Grams(g) => *g,
        WeightInput::Text(text) => parse_number(text).unwrap_or(0.0),
        WeightInput::Missing => 0.0,
    };
    clamp_weight(grams)
}

fn clamp_weight(grams: f64) -> f64 {
    if grams.is_nan() {
        0.0
    } else {
        grams.max(0.0)
    }
}
