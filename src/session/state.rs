//! Session status and the serializable view of a session

use serde::Serialize;

use crate::models::{AnalysisSummary, DisplayTotals, Ingredient, SessionTotals};

/// Lifecycle of one capture-through-review cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Camera live, nothing queued
    #[default]
    Idle,
    /// Camera live, one or more images queued
    Capturing,
    /// A request is with the inference service
    Analyzing,
    /// A result is loaded and editable
    Reviewing,
    /// The last analysis attempt failed
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Capturing => "capturing",
            SessionStatus::Analyzing => "analyzing",
            SessionStatus::Reviewing => "reviewing",
            SessionStatus::Failed => "failed",
        }
    }

    /// Whether images may still be added, removed, or sent for analysis
    pub fn accepts_images(&self) -> bool {
        matches!(self, SessionStatus::Idle | SessionStatus::Capturing)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters reported by the status tool
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SessionStats {
    pub analyses_started: u64,
    pub analyses_succeeded: u64,
    pub analyses_failed: u64,
    pub responses_discarded: u64,
    pub weight_edits: u64,
}

/// Everything a client needs to render the session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub image_count: usize,
    pub image_bytes: Vec<usize>,
    pub notes: String,
    pub listening: bool,
    pub dictation_available: bool,
    pub camera_active: bool,
    pub ingredients: Vec<Ingredient>,
    pub totals: SessionTotals,
    pub display_totals: DisplayTotals,
    pub summary: Option<AnalysisSummary>,
    pub error: Option<String>,
}
