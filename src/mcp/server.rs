//! Calorie Flash MCP Server Implementation
//!
//! Exposes the meal analysis session as MCP tools.

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::inference::NutritionAnalyzer;
use crate::session::{self, SessionController, SharedSession};
use crate::tools::session as session_tools;
use crate::tools::status::StatusTracker;

/// Calorie Flash MCP Service
#[derive(Clone)]
pub struct CalflashService {
    status_tracker: Arc<StatusTracker>,
    session: SharedSession,
    analyzer: Arc<dyn NutritionAnalyzer>,
    tool_router: ToolRouter<CalflashService>,
}

impl CalflashService {
    pub fn new(frame_path: PathBuf, session: SessionController, analyzer: Arc<dyn NutritionAnalyzer>) -> Self {
        Self {
            status_tracker: Arc::new(StatusTracker::new(frame_path, analyzer.name())),
            session: Arc::new(Mutex::new(session)),
            analyzer,
            tool_router: Self::tool_router(),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

// ============================================================================
// Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddImageParams {
    /// Base64 image data, optionally as a data URL
    pub data: String,
    /// MIME type, defaults to image/jpeg
    pub mime_type: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DiscardImageParams {
    /// 0-based position in the image queue
    pub index: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetNotesParams {
    pub notes: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SubmitDictationParams {
    /// Recognized text; omit when recognition produced nothing
    pub transcript: Option<String>,
    /// Set when the recognizer reported an error
    #[serde(default)]
    pub failed: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct EditIngredientWeightParams {
    /// 0-based ingredient position
    pub index: i64,
    /// New weight in grams (number or numeric text)
    pub weight: serde_json::Value,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl CalflashService {
    // --- Status ---

    #[tool(description = "Get the current status of the Calorie Flash service including build info, camera frame source, session counters, and process information")]
    async fn calflash_status(&self) -> Result<CallToolResult, McpError> {
        let (status, stats) = {
            let session = self.session.lock().await;
            (session.status(), session.stats())
        };
        to_json(&self.status_tracker.get_status(status, stats))
    }

    #[tool(description = "Get step-by-step instructions for analyzing a meal. Call this when starting a session or when unsure how to use the tools.")]
    fn usage_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::USAGE_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(USAGE_INSTRUCTIONS)]))
    }

    // --- Capture ---

    #[tool(description = "Capture the current camera frame and add it to the image queue")]
    async fn capture_image(&self) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        let result = session_tools::capture_image(&mut session).map_err(|e| McpError::invalid_request(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Add a base64-encoded meal photo to the image queue")]
    async fn add_image(&self, Parameters(p): Parameters<AddImageParams>) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        let result = session_tools::add_image(&mut session, &p.data, p.mime_type.as_deref())
            .map_err(|e| McpError::invalid_params(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Remove a queued image by its 0-based position (only before analysis)")]
    async fn discard_image(&self, Parameters(p): Parameters<DiscardImageParams>) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        let result = session_tools::discard_image(&mut session, p.index)
            .map_err(|e| McpError::invalid_params(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Set the free-text notes sent along with the photos (e.g. 'fried in butter', 'half portion')")]
    async fn set_notes(&self, Parameters(p): Parameters<SetNotesParams>) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        to_json(&session_tools::set_notes(&mut session, &p.notes))
    }

    // --- Dictation ---

    #[tool(description = "Start or stop voice dictation. Has no effect when dictation is unavailable.")]
    async fn toggle_dictation(&self) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        to_json(&session_tools::toggle_dictation(&mut session))
    }

    #[tool(description = "Deliver the speech recognizer's result for the active dictation; the text is appended to the notes")]
    async fn submit_dictation(&self, Parameters(p): Parameters<SubmitDictationParams>) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        to_json(&session_tools::submit_dictation(&mut session, p.transcript.as_deref(), p.failed))
    }

    // --- Analysis ---

    #[tool(description = "Send the queued photos and notes to the vision service and load the estimated ingredients. Captures one live frame if nothing is queued. Ignored while an analysis is already running.")]
    async fn analyze_meal(&self) -> Result<CallToolResult, McpError> {
        let outcome = session::analyze(&self.session, self.analyzer.as_ref())
            .await
            .map_err(|e| McpError::invalid_request(e.to_string(), None))?;
        let session = self.session.lock().await;
        to_json(&session_tools::analyze_response(outcome, &session))
    }

    // --- Review ---

    #[tool(description = "Change an ingredient's weight in grams. Calories and macros rescale from the per-gram rates of the original estimate.")]
    async fn edit_ingredient_weight(&self, Parameters(p): Parameters<EditIngredientWeightParams>) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        let result = session_tools::edit_ingredient_weight(&mut session, p.index, &p.weight)
            .map_err(|e| McpError::invalid_params(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Get the full session: status, queued images, notes, ingredients, totals, explanation, and any error")]
    async fn get_session(&self) -> Result<CallToolResult, McpError> {
        let session = self.session.lock().await;
        to_json(&session.snapshot())
    }

    #[tool(description = "Clear photos, notes, and results and return to the camera. A running analysis is ignored when it finishes.")]
    async fn reset_session(&self) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        to_json(&session_tools::reset_session(&mut session))
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for CalflashService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "calflash".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Calorie Flash".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Calorie Flash - estimate a meal's calories and macros from photos. \
                 Call usage_instructions first. \
                 Capture: capture_image, add_image, discard_image, set_notes, toggle_dictation, submit_dictation. \
                 Analyze: analyze_meal. \
                 Review: get_session, edit_ingredient_weight. \
                 Start over: reset_session. Status: calflash_status."
                    .into(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::inference::InferenceError;
    use crate::models::{AnalysisResult, ImagePayload, RawIngredient};
    use crate::session::{ExternalDictation, MemoryCamera, SessionStatus};

    struct StubAnalyzer;

    #[async_trait]
    impl NutritionAnalyzer for StubAnalyzer {
        fn name(&self) -> &str {
            "stub"
        }

        async fn analyze(&self, _images: &[ImagePayload], _notes: &str) -> Result<AnalysisResult, InferenceError> {
            Ok(AnalysisResult {
                ingredients: vec![RawIngredient::new("Ориз", 150.0, 195.0, 4.0, 42.0, 0.5)],
                ..Default::default()
            })
        }
    }

    fn service() -> (CalflashService, MemoryCamera) {
        let camera = MemoryCamera::new();
        let session = SessionController::new(Box::new(camera.clone()), Box::new(ExternalDictation::default()));
        let service = CalflashService::new(PathBuf::from("/tmp/none.jpg"), session, Arc::new(StubAnalyzer));
        (service, camera)
    }

    #[tokio::test]
    async fn test_capture_analyze_edit_reset() {
        let (service, camera) = service();
        camera.push_frame(ImagePayload::jpeg(vec![1, 2]));

        service.capture_image().await.unwrap();
        service.analyze_meal().await.unwrap();
        assert_eq!(service.session.lock().await.status(), SessionStatus::Reviewing);

        let params = EditIngredientWeightParams { index: 0, weight: serde_json::json!(300) };
        service.edit_ingredient_weight(Parameters(params)).await.unwrap();
        assert_eq!(service.session.lock().await.totals().calories, 390.0);

        service.reset_session().await.unwrap();
        assert_eq!(service.session.lock().await.status(), SessionStatus::Idle);
    }

    #[tokio::test]
    async fn test_edit_outside_review_is_an_error() {
        let (service, _camera) = service();
        let params = EditIngredientWeightParams { index: 0, weight: serde_json::json!(10) };
        assert!(service.edit_ingredient_weight(Parameters(params)).await.is_err());
    }

    #[test]
    fn test_server_info() {
        let (service, _camera) = service();
        let info = service.get_info();
        assert_eq!(info.server_info.name, "calflash");
    }
}
