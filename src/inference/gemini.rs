//! Google Gemini inference backend
//!
//! Sends the images as inline data together with the instruction prompt and
//! asks for a JSON response matching [`response_schema`].

use std::fmt::{Debug, Formatter, Result as FmtResult};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, instrument};

use super::prompt::{analysis_prompt, response_schema};
use super::{InferenceError, NutritionAnalyzer};
use crate::config::{Config, GEMINI_API_KEY_ENV};
use crate::models::{AnalysisResult, ImagePayload};

// ============================================================================
// API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<RequestContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

// ============================================================================
// Analyzer
// ============================================================================

pub struct GeminiAnalyzer {
    api_key: String,
    api_base: String,
    model: String,
    client: Client,
}

impl GeminiAnalyzer {
    pub fn new(api_key: impl Into<String>, api_base: impl Into<String>, model: impl Into<String>, client: Client) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: api_base.into(),
            model: model.into(),
            client,
        }
    }

    /// Build an analyzer from the loaded configuration
    pub fn from_config(config: &Config) -> Result<Self, InferenceError> {
        let api_key = config
            .gemini_api_key
            .clone()
            .ok_or(InferenceError::MissingApiKey(GEMINI_API_KEY_ENV))?;
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self::new(api_key, config.api_base.clone(), config.model.clone(), client))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_url(&self) -> String {
        format!("{}/models/{}:generateContent?key={}", self.api_base, self.model, self.api_key)
    }

    fn build_request(images: &[ImagePayload], notes: &str) -> GenerateRequest {
        let mut parts: Vec<RequestPart> = images
            .iter()
            .map(|image| RequestPart::InlineData {
                inline_data: InlineData {
                    mime_type: image.mime_type.clone(),
                    data: image.to_base64(),
                },
            })
            .collect();
        parts.push(RequestPart::Text { text: analysis_prompt(notes) });

        GenerateRequest {
            contents: vec![RequestContent { parts }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: response_schema(),
            },
        }
    }

    fn map_api_error(status: u16, response_text: &str) -> InferenceError {
        let message = serde_json::from_str::<GenerateResponse>(response_text)
            .ok()
            .and_then(|r| r.error)
            .map_or_else(|| response_text.to_owned(), |e| e.message);
        InferenceError::Status { status, message }
    }

    /// Pull the analysis JSON out of a successful response body
    fn parse_response(response_text: &str) -> Result<AnalysisResult, InferenceError> {
        let response: GenerateResponse = serde_json::from_str(response_text)?;

        if let Some(error) = response.error {
            return Err(InferenceError::Api(error.message));
        }

        let text: String = response
            .candidates
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        let text = text.trim();
        if text.is_empty() {
            return Err(InferenceError::EmptyResponse);
        }

        Ok(serde_json::from_str(strip_code_fence(text))?)
    }
}

/// Models occasionally wrap JSON in a markdown fence despite the mime type
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

impl Debug for GeminiAnalyzer {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("GeminiAnalyzer")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl NutritionAnalyzer for GeminiAnalyzer {
    fn name(&self) -> &str {
        "gemini"
    }

    #[instrument(skip(self, images, notes), fields(model = %self.model, images = images.len()))]
    async fn analyze(&self, images: &[ImagePayload], notes: &str) -> Result<AnalysisResult, InferenceError> {
        if images.is_empty() {
            return Err(InferenceError::NoImages);
        }

        let request = Self::build_request(images, notes);
        let bytes: usize = images.iter().map(ImagePayload::len).sum();
        debug!(bytes, "Sending analysis request to Gemini");

        let response = self.client.post(self.build_url()).json(&request).send().await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            error!(status = %status, "Gemini API error");
            return Err(Self::map_api_error(status.as_u16(), &response_text));
        }

        let result = Self::parse_response(&response_text)?;
        debug!(ingredients = result.ingredients.len(), "Received Gemini analysis");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap(text: &str) -> String {
        serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        })
        .to_string()
    }

    #[test]
    fn test_request_puts_images_before_prompt() {
        let images = vec![ImagePayload::jpeg(vec![1, 2, 3]), ImagePayload::jpeg(vec![4])];
        let request = GeminiAnalyzer::build_request(&images, "с кетчуп");
        let json = serde_json::to_value(&request).unwrap();

        let parts = json["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(parts[0]["inlineData"]["data"], "AQID");
        assert!(parts[2]["text"].as_str().unwrap().contains("с кетчуп"));
        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(json["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn test_parse_response() {
        let body = wrap(r#"{"totalCalories": 195, "ingredients": [{"name": "Ориз", "weightValue": 150, "calories": 195}], "explanation": "ok"}"#);
        let result = GeminiAnalyzer::parse_response(&body).unwrap();
        assert_eq!(result.ingredients[0].weight_value, Some(150.0));
        assert_eq!(result.ingredients[0].protein, None);
        assert_eq!(result.explanation, "ok");
    }

    #[test]
    fn test_parse_fenced_response() {
        let body = wrap("```json\n{\"explanation\": \"fenced\"}\n```");
        let result = GeminiAnalyzer::parse_response(&body).unwrap();
        assert_eq!(result.explanation, "fenced");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            GeminiAnalyzer::parse_response(r#"{"candidates": []}"#),
            Err(InferenceError::EmptyResponse)
        ));
        assert!(matches!(
            GeminiAnalyzer::parse_response(r#"{"error": {"message": "quota"}}"#),
            Err(InferenceError::Api(m)) if m == "quota"
        ));
        assert!(matches!(
            GeminiAnalyzer::parse_response(&wrap("this is not json")),
            Err(InferenceError::Parse(_))
        ));
    }

    #[test]
    fn test_map_api_error_prefers_service_message() {
        let err = GeminiAnalyzer::map_api_error(400, r#"{"error": {"message": "bad image"}}"#);
        assert!(matches!(err, InferenceError::Status { status: 400, ref message } if message == "bad image"));
        let err = GeminiAnalyzer::map_api_error(502, "upstream down");
        assert!(matches!(err, InferenceError::Status { ref message, .. } if message == "upstream down"));
    }

    #[test]
    fn test_debug_redacts_key() {
        let analyzer = GeminiAnalyzer::new("secret", "http://x", "m", Client::new());
        assert!(!format!("{analyzer:?}").contains("secret"));
    }

    #[tokio::test]
    async fn test_transport_error_hides_api_key() {
        let analyzer = GeminiAnalyzer::new("SUPERSECRETKEY", "http://127.0.0.1:9", "m", Client::new());
        let err = analyzer
            .analyze(&[ImagePayload::jpeg(vec![1])], "")
            .await
            .unwrap_err();
        assert!(matches!(err, InferenceError::Http(_)));
        assert!(!err.to_string().contains("SUPERSECRETKEY"));
        assert!(!format!("{err:?}").contains("SUPERSECRETKEY"));
    }

    #[tokio::test]
    async fn test_no_images_is_an_error() {
        let analyzer = GeminiAnalyzer::new("k", "http://127.0.0.1:9", "m", Client::new());
        assert!(matches!(analyzer.analyze(&[], "").await, Err(InferenceError::NoImages)));
    }
}
