//! Camera capability
//!
//! The controller is handed a [`CaptureDevice`] at construction and is the
//! only holder of it. The device is acquired while the session is idle or
//! capturing and released while a result (or an in-flight analysis) is shown.

use std::collections::VecDeque;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{ImagePayload, JPEG_MIME};

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Camera is already in use")]
    Busy,

    #[error("Camera I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Something that can produce the current camera frame
pub trait CaptureDevice: Send {
    /// Start the device; called whenever the session returns to idle
    fn acquire(&mut self) -> Result<(), CaptureError>;

    /// Stop the device
    fn release(&mut self);

    fn is_active(&self) -> bool;

    /// Grab the current frame, or None if no frame is available
    fn capture_frame(&mut self) -> Option<ImagePayload>;
}

// ============================================================================
// Snapshot file camera
// ============================================================================

/// Reads the most recent frame a camera process wrote to disk
#[derive(Debug)]
pub struct SnapshotFileCamera {
    path: PathBuf,
    active: bool,
}

impl SnapshotFileCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            active: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn mime_type(&self) -> &'static str {
        match self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref()
        {
            Some("png") => "image/png",
            Some("webp") => "image/webp",
            _ => JPEG_MIME,
        }
    }
}

impl CaptureDevice for SnapshotFileCamera {
    fn acquire(&mut self) -> Result<(), CaptureError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        self.active = true;
        debug!(path = %self.path.display(), "Camera acquired");
        Ok(())
    }

    fn release(&mut self) {
        if self.active {
            debug!(path = %self.path.display(), "Camera released");
        }
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn capture_frame(&mut self) -> Option<ImagePayload> {
        if !self.active {
            return None;
        }
        match std::fs::read(&self.path) {
            Ok(data) if data.is_empty() => None,
            Ok(data) => Some(ImagePayload {
                mime_type: self.mime_type().to_string(),
                data,
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read camera frame");
                None
            }
        }
    }
}

// ============================================================================
// In-memory camera
// ============================================================================

#[derive(Debug, Default)]
struct MemoryCameraState {
    frames: VecDeque<ImagePayload>,
    active: bool,
    acquisitions: u32,
    releases: u32,
}

/// Camera fed from memory; clones share the same device
///
/// Used by tests and by hosts that push frames themselves.
#[derive(Debug, Clone, Default)]
pub struct MemoryCamera {
    state: Arc<Mutex<MemoryCameraState>>,
}

impl MemoryCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a frame to be returned by the next capture
    pub fn push_frame(&self, frame: ImagePayload) {
        self.with_state(|s| s.frames.push_back(frame));
    }

    pub fn pending_frames(&self) -> usize {
        self.with_state(|s| s.frames.len())
    }

    pub fn acquisitions(&self) -> u32 {
        self.with_state(|s| s.acquisitions)
    }

    pub fn releases(&self) -> u32 {
        self.with_state(|s| s.releases)
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut MemoryCameraState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }
}

impl CaptureDevice for MemoryCamera {
    fn acquire(&mut self) -> Result<(), CaptureError> {
        self.with_state(|s| {
            if s.active {
                return Err(CaptureError::Busy);
            }
            s.active = true;
            s.acquisitions += 1;
            Ok(())
        })
    }

    fn release(&mut self) {
        self.with_state(|s| {
            if s.active {
                s.active = false;
                s.releases += 1;
            }
        });
    }

    fn is_active(&self) -> bool {
        self.with_state(|s| s.active)
    }

    fn capture_frame(&mut self) -> Option<ImagePayload> {
        self.with_state(|s| if s.active { s.frames.pop_front() } else { None })
    }
}
