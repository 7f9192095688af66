//! Analysis session
//!
//! One capture-through-review cycle: the controller, the capabilities it is
//! handed (camera, dictation), and the async runner for the analysis call.

pub mod capture;
pub mod controller;
pub mod dictation;
pub mod runner;
pub mod state;

use thiserror::Error;

pub use capture::{CaptureDevice, CaptureError, MemoryCamera, SnapshotFileCamera};
pub use controller::{AnalysisOutcome, AnalysisTicket, BeginAnalysis, SessionController, ANALYSIS_FAILED_MESSAGE};
pub use dictation::{Dictation, DictationError, DictationEvent, ExternalDictation, UnavailableDictation};
pub use runner::{analyze, SharedSession};
pub use state::{SessionSnapshot, SessionStats, SessionStatus};

/// Session operation errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Cannot {operation} while session is {status}")]
    InvalidState {
        operation: &'static str,
        status: SessionStatus,
    },

    #[error("Image index {index} out of range ({len} queued)")]
    ImageOutOfRange { index: usize, len: usize },

    #[error("Ingredient index {index} out of range ({len} ingredients)")]
    IngredientOutOfRange { index: usize, len: usize },
}
