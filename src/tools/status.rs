//! Calorie Flash status tool
//!
//! Provides runtime status information and usage instructions.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;
use crate::session::{SessionStats, SessionStatus};

/// Workflow instructions for AI assistants driving the session tools
pub const USAGE_INSTRUCTIONS: &str = r#"
# Calorie Flash Usage

One session covers one meal: capture photos, analyze them, then correct weights.

## 1. Capture

- `capture_image` grabs the current camera frame. Call it once per angle.
- `add_image` queues an image you already have (base64, optionally a data URL).
- `discard_image` removes a queued image by position (0-based).
- `set_notes` stores free-text context ("no oil", "half portion").
- `toggle_dictation` + `submit_dictation` append a spoken note to the notes.

## 2. Analyze

- `analyze_meal` sends all queued images plus the notes to the vision service.
- With nothing queued it captures a single live frame instead.
- If a request is already running, the call does nothing and reports `in_flight`.
- On failure the session reports a generic error; call `reset_session` and retry.

## 3. Review

- `get_session` returns ingredients, totals, and the service's explanation.
- `edit_ingredient_weight` changes one ingredient's grams. Calories and macros
  rescale from the per-gram rates fixed at analysis time; the service is not
  asked again. Negative or non-numeric weights become 0.

## 4. Start over

- `reset_session` clears images, notes, and results and reactivates the camera.
  A response still in flight when you reset is ignored.
"#;

/// Runtime status of the service
#[derive(Debug, Serialize)]
pub struct CalflashStatus {
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    pub analyzer: String,
    pub frame_path: String,
    pub frame_available: bool,

    pub session_status: SessionStatus,
    pub session_stats: SessionStats,

    pub started_at: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    started_at: DateTime<Utc>,
    frame_path: PathBuf,
    analyzer: String,
}

impl StatusTracker {
    pub fn new(frame_path: PathBuf, analyzer: impl Into<String>) -> Self {
        Self {
            start_time: Instant::now(),
            started_at: Utc::now(),
            frame_path,
            analyzer: analyzer.into(),
        }
    }

    /// Get the current status
    pub fn get_status(&self, session_status: SessionStatus, session_stats: SessionStats) -> CalflashStatus {
        let build_info = BuildInfo::current();

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        CalflashStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            analyzer: self.analyzer.clone(),
            frame_path: self.frame_path.display().to_string(),
            frame_available: self.frame_path.is_file(),
            session_status,
            session_stats,
            started_at: self.started_at,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}
