//! Nutrition inference
//!
//! The vision service is an external collaborator: it receives the captured
//! images plus the user's notes and returns an [`AnalysisResult`].

pub mod gemini;
pub mod prompt;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{AnalysisResult, ImagePayload};

pub use gemini::GeminiAnalyzer;

/// Errors from the inference service
///
/// None of these reach the end user verbatim; the session maps all of them to
/// one generic message and logs the detail.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("{0} environment variable not set")]
    MissingApiKey(&'static str),

    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),

    #[error("Inference service returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Inference service error: {0}")]
    Api(String),

    #[error("Inference service returned no content")]
    EmptyResponse,

    #[error("Failed to parse analysis: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Nothing to analyze")]
    NoImages,

    #[error("Analysis was abandoned before the service answered")]
    Abandoned,
}

// The request URL carries the API key as a query parameter.
impl From<reqwest::Error> for InferenceError {
    fn from(e: reqwest::Error) -> Self {
        InferenceError::Http(e.without_url())
    }
}

/// A vision backend able to estimate a meal's nutrition
#[async_trait]
pub trait NutritionAnalyzer: Send + Sync {
    /// Short name for logs and status output
    fn name(&self) -> &str;

    /// Analyze the images (in capture order) together with free-text notes
    async fn analyze(&self, images: &[ImagePayload], notes: &str) -> Result<AnalysisResult, InferenceError>;
}
