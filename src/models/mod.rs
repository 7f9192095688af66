//! Data models
//!
//! Plain data shared by the nutrition engine, the session controller, and the
//! inference backends.

mod analysis;
mod image;
mod ingredient;
pub(crate) mod nutrition;
mod totals;

pub use analysis::{parse_number, AnalysisResult, AnalysisSummary, RawIngredient};
pub use image::{ImagePayload, JPEG_MIME};
pub use ingredient::{Ingredient, WeightInput};
pub use nutrition::{round_one_decimal, Nutrition};
pub use totals::{DisplayTotals, SessionTotals};
