//! Nutrition engine
//!
//! Reference-rate derivation, weight rescaling, and aggregation.

pub mod aggregator;
pub mod deriver;
pub mod editor;

pub use aggregator::aggregate;
pub use deriver::{derive, MIN_REFERENCE_WEIGHT};
pub use editor::{coerce_weight, set_weight, set_weight_in_place};
