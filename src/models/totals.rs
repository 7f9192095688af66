//! Session totals
//!
//! Derived view over the ingredient collection. Never stored.

use serde::Serialize;

use super::nutrition::round_one_decimal;

/// Sum of the current ingredient values
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SessionTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    /// Sum of ingredient weights in grams
    pub weight: f64,
}

/// Totals rounded for presentation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DisplayTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub weight: f64,
}

impl SessionTotals {
    /// Read-time rounding; the totals themselves keep full precision
    pub fn display(&self) -> DisplayTotals {
        DisplayTotals {
            calories: self.calories.round(),
            protein: round_one_decimal(self.protein),
            carbs: round_one_decimal(self.carbs),
            fat: round_one_decimal(self.fat),
            weight: self.weight.round(),
        }
    }
}
