//! Session MCP Tools
//!
//! Validation and response shaping around the session controller.

use serde::Serialize;

use crate::models::{DisplayTotals, ImagePayload, Ingredient, SessionTotals, WeightInput};
use crate::session::{AnalysisOutcome, DictationEvent, SessionController, SessionSnapshot, SessionStatus};

/// Response for capture_image and add_image
#[derive(Debug, Serialize)]
pub struct CaptureResponse {
    pub captured: bool,
    pub image_count: usize,
    pub status: SessionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response for discard_image
#[derive(Debug, Serialize)]
pub struct DiscardImageResponse {
    pub success: bool,
    pub image_count: usize,
    pub status: SessionStatus,
}

/// Response for set_notes and the dictation tools
#[derive(Debug, Serialize)]
pub struct NotesResponse {
    pub notes: String,
    pub listening: bool,
    pub dictation_available: bool,
}

/// Response for edit_ingredient_weight
#[derive(Debug, Serialize)]
pub struct EditWeightResponse {
    pub index: usize,
    pub ingredient: Ingredient,
    pub totals: SessionTotals,
    pub display_totals: DisplayTotals,
}

/// Response for analyze_meal
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub outcome: &'static str,
    pub message: String,
    pub session: SessionSnapshot,
}

/// Response for reset_session
#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub success: bool,
    pub status: SessionStatus,
    pub camera_active: bool,
}

fn to_index(index: i64, what: &str) -> Result<usize, String> {
    usize::try_from(index).map_err(|_| format!("{} index cannot be negative", what))
}

/// Capture the current camera frame
pub fn capture_image(session: &mut SessionController) -> Result<CaptureResponse, String> {
    let captured = session.capture().map_err(|e| e.to_string())?;
    Ok(CaptureResponse {
        captured: captured.is_some(),
        image_count: session.images().len(),
        status: session.status(),
        message: captured
            .is_none()
            .then(|| "No camera frame available".to_string()),
    })
}

/// Queue a base64 image sent by the client
pub fn add_image(
    session: &mut SessionController,
    data: &str,
    mime_type: Option<&str>,
) -> Result<CaptureResponse, String> {
    let image = ImagePayload::from_base64(data, mime_type)
        .map_err(|e| format!("Invalid base64 image data: {}", e))?;
    if image.is_empty() {
        return Err("Image data cannot be empty".to_string());
    }

    let count = session.queue_image(image).map_err(|e| e.to_string())?;
    Ok(CaptureResponse {
        captured: true,
        image_count: count,
        status: session.status(),
        message: None,
    })
}

/// Remove a queued image
pub fn discard_image(session: &mut SessionController, index: i64) -> Result<DiscardImageResponse, String> {
    let index = to_index(index, "Image")?;
    session.discard_image(index).map_err(|e| e.to_string())?;
    Ok(DiscardImageResponse {
        success: true,
        image_count: session.images().len(),
        status: session.status(),
    })
}

fn notes_response(session: &SessionController) -> NotesResponse {
    NotesResponse {
        notes: session.notes().to_string(),
        listening: session.is_listening(),
        dictation_available: session.dictation_available(),
    }
}

/// Replace the free-text notes
pub fn set_notes(session: &mut SessionController, notes: &str) -> NotesResponse {
    session.set_notes(notes);
    notes_response(session)
}

/// Start or stop dictation
pub fn toggle_dictation(session: &mut SessionController) -> NotesResponse {
    session.toggle_dictation();
    notes_response(session)
}

/// Deliver the recognizer's result for the current activation
///
/// A missing transcript ends the activation without changing the notes.
pub fn submit_dictation(session: &mut SessionController, transcript: Option<&str>, failed: bool) -> NotesResponse {
    let event = match (transcript, failed) {
        (_, true) => DictationEvent::Error,
        (Some(text), false) => DictationEvent::Result(text.to_string()),
        (None, false) => DictationEvent::End,
    };
    session.handle_dictation_event(event);
    notes_response(session)
}

/// Change an ingredient's weight
pub fn edit_ingredient_weight(
    session: &mut SessionController,
    index: i64,
    weight: &serde_json::Value,
) -> Result<EditWeightResponse, String> {
    let index = to_index(index, "Ingredient")?;
    let ingredient = session
        .edit_weight(index, WeightInput::from_json(weight))
        .map_err(|e| e.to_string())?
        .clone();
    let totals = session.totals();
    Ok(EditWeightResponse {
        index,
        ingredient,
        totals,
        display_totals: totals.display(),
    })
}

/// Describe an analysis outcome together with the resulting session
pub fn analyze_response(outcome: AnalysisOutcome, session: &SessionController) -> AnalyzeResponse {
    let (label, message) = match outcome {
        AnalysisOutcome::Reviewing { ingredients } => ("reviewing", format!("Analysis complete: {} ingredients", ingredients)),
        AnalysisOutcome::Failed => (
            "failed",
            session.error().unwrap_or_default().to_string(),
        ),
        AnalysisOutcome::Discarded => ("discarded", "Session was reset while the analysis was running".to_string()),
        AnalysisOutcome::NoImages => ("no_images", "No images queued and no camera frame available".to_string()),
        AnalysisOutcome::InFlight => ("in_flight", "An analysis is already running".to_string()),
    };
    AnalyzeResponse {
        outcome: label,
        message,
        session: session.snapshot(),
    }
}

/// Reset the session
pub fn reset_session(session: &mut SessionController) -> ResetResponse {
    session.reset();
    ResetResponse {
        success: true,
        status: session.status(),
        camera_active: session.camera_active(),
    }
}
