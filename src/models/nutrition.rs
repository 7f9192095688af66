//! Shared nutrition data structure
//!
//! Used for ingredient values, per-gram reference rates, and session totals.

use serde::{Deserialize, Serialize};

/// Macronutrient values: absolute amounts or per-gram rates, depending on use
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    pub calories: f64, // kcal
    pub protein: f64,  // grams
    pub carbs: f64,    // grams
    pub fat: f64,      // grams
}

impl Nutrition {
    /// Create a new Nutrition with all zeros
    pub fn zero() -> Self {
        Self::default()
    }

    /// Scale nutrition values by a multiplier
    pub fn scale(&self, multiplier: f64) -> Self {
        Self {
            calories: self.calories * multiplier,
            protein: self.protein * multiplier,
            carbs: self.carbs * multiplier,
            fat: self.fat * multiplier,
        }
    }

    /// Add another nutrition to this one
    pub fn add(&self, other: &Nutrition) -> Self {
        Self {
            calories: self.calories + other.calories,
            protein: self.protein + other.protein,
            carbs: self.carbs + other.carbs,
            fat: self.fat + other.fat,
        }
    }

    /// Calories to the nearest whole unit, macros to one decimal place
    pub fn rounded(&self) -> Self {
        Self {
            calories: self.calories.round(),
            protein: round_one_decimal(self.protein),
            carbs: round_one_decimal(self.carbs),
            fat: round_one_decimal(self.fat),
        }
    }
}

/// Round to one decimal place (`round(x * 10) / 10`)
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

impl std::ops::Add for Nutrition {
    type Output = Nutrition;

    fn add(self, other: Nutrition) -> Nutrition {
        Nutrition::add(&self, &other)
    }
}

impl std::ops::Mul<f64> for Nutrition {
    type Output = Nutrition;

    fn mul(self, multiplier: f64) -> Nutrition {
        self.scale(multiplier)
    }
}

impl std::iter::Sum for Nutrition {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Nutrition::zero(), |acc, n| acc + n)
    }
}
