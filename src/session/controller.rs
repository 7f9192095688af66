//! Session state controller
//!
//! Owns the queued images, notes, and the ingredient collection, and drives
//! the lifecycle `Idle -> Capturing -> Analyzing -> Reviewing | Failed`.
//! Every operation here is synchronous; the one network call lives in
//! [`super::runner`], which brackets it with [`SessionController::begin_analysis`]
//! and [`SessionController::finish_analysis`].

use tracing::{debug, error, info, warn};

use super::capture::CaptureDevice;
use super::dictation::{Dictation, DictationEvent};
use super::state::{SessionSnapshot, SessionStats, SessionStatus};
use super::SessionError;
use crate::inference::InferenceError;
use crate::models::{AnalysisResult, AnalysisSummary, ImagePayload, Ingredient, SessionTotals, WeightInput};
use crate::nutrition::{aggregate, coerce_weight, derive, set_weight_in_place};

/// Shown to the user whenever analysis fails, whatever the cause
pub const ANALYSIS_FAILED_MESSAGE: &str = "Възникна грешка при анализа. Моля, опитайте отново.";

/// Everything the runner needs to call the inference service
#[derive(Debug, Clone)]
pub struct AnalysisTicket {
    pub generation: u64,
    pub images: Vec<ImagePayload>,
    pub notes: String,
}

/// Result of asking to start an analysis
#[derive(Debug)]
pub enum BeginAnalysis {
    Started(AnalysisTicket),
    /// No queued image and the camera had no frame
    NoImages,
    /// An analysis is already running; nothing was done
    InFlight,
}

/// What happened to a finished (or never started) analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisOutcome {
    Reviewing { ingredients: usize },
    Failed,
    /// The session moved on (reset) while the request was in flight
    Discarded,
    NoImages,
    InFlight,
}

pub struct SessionController {
    camera: Box<dyn CaptureDevice>,
    dictation: Box<dyn Dictation>,
    status: SessionStatus,
    images: Vec<ImagePayload>,
    notes: String,
    ingredients: Vec<Ingredient>,
    summary: Option<AnalysisSummary>,
    error: Option<String>,
    listening: bool,
    generation: u64,
    stats: SessionStats,
}

impl SessionController {
    /// Create an idle session and acquire the camera
    pub fn new(camera: Box<dyn CaptureDevice>, dictation: Box<dyn Dictation>) -> Self {
        let mut controller = Self {
            camera,
            dictation,
            status: SessionStatus::Idle,
            images: Vec::new(),
            notes: String::new(),
            ingredients: Vec::new(),
            summary: None,
            error: None,
            listening: false,
            generation: 0,
            stats: SessionStats::default(),
        };
        controller.acquire_camera();
        controller
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn images(&self) -> &[ImagePayload] {
        &self.images
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn ingredients(&self) -> &[Ingredient] {
        &self.ingredients
    }

    pub fn summary(&self) -> Option<&AnalysisSummary> {
        self.summary.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn camera_active(&self) -> bool {
        self.camera.is_active()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Totals recomputed from the current ingredients
    pub fn totals(&self) -> SessionTotals {
        aggregate(&self.ingredients)
    }

    // --- Capturing ---

    /// Queue the current camera frame
    ///
    /// Returns the new queue length, or None when the camera had no frame.
    pub fn capture(&mut self) -> Result<Option<usize>, SessionError> {
        self.require_image_state("capture")?;
        match self.camera.capture_frame() {
            Some(frame) => Ok(Some(self.push_image(frame))),
            None => {
                debug!("Capture requested but no frame available");
                Ok(None)
            }
        }
    }

    /// Queue an image supplied directly by the host
    pub fn queue_image(&mut self, image: ImagePayload) -> Result<usize, SessionError> {
        self.require_image_state("queue_image")?;
        Ok(self.push_image(image))
    }

    /// Remove one queued image by position
    pub fn discard_image(&mut self, index: usize) -> Result<(), SessionError> {
        self.require_image_state("discard_image")?;
        if index >= self.images.len() {
            return Err(SessionError::ImageOutOfRange { index, len: self.images.len() });
        }
        self.images.remove(index);
        if self.images.is_empty() {
            self.status = SessionStatus::Idle;
        }
        Ok(())
    }

    /// Replace the notes; surrounding whitespace is dropped
    pub fn set_notes(&mut self, notes: &str) {
        self.notes = notes.trim().to_string();
    }

    fn push_image(&mut self, image: ImagePayload) -> usize {
        debug!(bytes = image.len(), "Image queued");
        self.images.push(image);
        self.status = SessionStatus::Capturing;
        self.images.len()
    }

    fn require_image_state(&self, operation: &'static str) -> Result<(), SessionError> {
        if self.status.accepts_images() {
            Ok(())
        } else {
            Err(SessionError::InvalidState { operation, status: self.status })
        }
    }

    // --- Analysis ---

    /// Move to `Analyzing` and hand out a ticket for the inference call
    ///
    /// Falls back to a single on-demand capture when nothing is queued. A
    /// second call while a request is in flight does nothing.
    pub fn begin_analysis(&mut self) -> Result<BeginAnalysis, SessionError> {
        match self.status {
            SessionStatus::Analyzing => {
                debug!(generation = self.generation, "Analysis already in flight");
                return Ok(BeginAnalysis::InFlight);
            }
            SessionStatus::Reviewing | SessionStatus::Failed => {
                return Err(SessionError::InvalidState { operation: "analyze", status: self.status });
            }
            SessionStatus::Idle | SessionStatus::Capturing => {}
        }

        let images = if self.images.is_empty() {
            match self.camera.capture_frame() {
                Some(frame) => vec![frame],
                None => return Ok(BeginAnalysis::NoImages),
            }
        } else {
            self.images.clone()
        };

        self.generation += 1;
        self.status = SessionStatus::Analyzing;
        self.error = None;
        self.camera.release();
        self.stats.analyses_started += 1;
        info!(generation = self.generation, images = images.len(), "Analysis started");

        Ok(BeginAnalysis::Started(AnalysisTicket {
            generation: self.generation,
            images,
            notes: self.notes.clone(),
        }))
    }

    /// Apply the inference outcome for the ticket with `generation`
    ///
    /// Responses for a superseded generation are dropped.
    pub fn finish_analysis(
        &mut self,
        generation: u64,
        outcome: Result<AnalysisResult, InferenceError>,
    ) -> AnalysisOutcome {
        if generation != self.generation || self.status != SessionStatus::Analyzing {
            info!(
                generation,
                current = self.generation,
                status = %self.status,
                "Discarding stale analysis response"
            );
            self.stats.responses_discarded += 1;
            return AnalysisOutcome::Discarded;
        }

        match outcome {
            Ok(result) => {
                self.ingredients = derive(&result.ingredients);
                self.summary = Some(AnalysisSummary::from(&result));
                self.status = SessionStatus::Reviewing;
                self.stats.analyses_succeeded += 1;
                info!(generation, ingredients = self.ingredients.len(), "Analysis complete");
                AnalysisOutcome::Reviewing { ingredients: self.ingredients.len() }
            }
            Err(e) => {
                error!(generation, error = %e, "Analysis failed");
                self.error = Some(ANALYSIS_FAILED_MESSAGE.to_string());
                self.status = SessionStatus::Failed;
                self.stats.analyses_failed += 1;
                AnalysisOutcome::Failed
            }
        }
    }

    // --- Reviewing ---

    /// Change one ingredient's weight and rescale its nutrition
    pub fn edit_weight(&mut self, index: usize, value: impl Into<WeightInput>) -> Result<&Ingredient, SessionError> {
        if self.status != SessionStatus::Reviewing {
            return Err(SessionError::InvalidState { operation: "edit_weight", status: self.status });
        }
        if index >= self.ingredients.len() {
            return Err(SessionError::IngredientOutOfRange { index, len: self.ingredients.len() });
        }

        let grams = coerce_weight(&value.into());
        set_weight_in_place(&mut self.ingredients, index, grams);
        self.stats.weight_edits += 1;
        debug!(index, grams, "Ingredient weight edited");
        Ok(&self.ingredients[index])
    }

    /// Clear everything and return to `Idle`
    ///
    /// Any analysis still in flight is orphaned: its response will be discarded.
    pub fn reset(&mut self) {
        self.images.clear();
        self.notes.clear();
        self.ingredients.clear();
        self.summary = None;
        self.error = None;
        self.generation += 1;
        self.status = SessionStatus::Idle;
        self.acquire_camera();
        info!(generation = self.generation, "Session reset");
    }

    fn acquire_camera(&mut self) {
        if self.camera.is_active() {
            return;
        }
        if let Err(e) = self.camera.acquire() {
            warn!(error = %e, "Failed to acquire camera");
        }
    }

    // --- Dictation ---

    /// Start or stop listening; returns whether dictation is now listening
    pub fn toggle_dictation(&mut self) -> bool {
        if !self.dictation.is_available() {
            return false;
        }
        if self.listening {
            self.dictation.stop();
            self.listening = false;
        } else {
            match self.dictation.start() {
                Ok(()) => self.listening = true,
                Err(e) => {
                    debug!(error = %e, "Dictation failed to start");
                    self.listening = false;
                }
            }
        }
        self.listening
    }

    /// Feed a recognizer event; returns true if the notes changed
    pub fn handle_dictation_event(&mut self, event: DictationEvent) -> bool {
        if !self.listening {
            return false;
        }
        self.dictation.stop();
        self.listening = false;

        match event {
            DictationEvent::Result(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return false;
                }
                if self.notes.is_empty() {
                    self.notes = text.to_string();
                } else {
                    self.notes = format!("{} {}", self.notes, text);
                }
                true
            }
            DictationEvent::Error | DictationEvent::End => false,
        }
    }

    pub fn dictation_available(&self) -> bool {
        self.dictation.is_available()
    }

    // --- Views ---

    pub fn snapshot(&self) -> SessionSnapshot {
        let totals = self.totals();
        SessionSnapshot {
            status: self.status,
            image_count: self.images.len(),
            image_bytes: self.images.iter().map(ImagePayload::len).collect(),
            notes: self.notes.clone(),
            listening: self.listening,
            dictation_available: self.dictation.is_available(),
            camera_active: self.camera.is_active(),
            ingredients: self.ingredients.clone(),
            totals,
            display_totals: totals.display(),
            summary: self.summary.clone(),
            error: self.error.clone(),
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.camera.release();
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("status", &self.status)
            .field("images", &self.images.len())
            .field("ingredients", &self.ingredients.len())
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawIngredient;
    use crate::session::capture::MemoryCamera;
    use crate::session::dictation::{ExternalDictation, UnavailableDictation};

    fn controller() -> (SessionController, MemoryCamera) {
        let camera = MemoryCamera::new();
        let controller = SessionController::new(Box::new(camera.clone()), Box::new(ExternalDictation::default()));
        (controller, camera)
    }

    fn rice_result() -> AnalysisResult {
        AnalysisResult {
            total_calories: Some(195.0),
            ingredients: vec![RawIngredient::new("Ориз", 150.0, 195.0, 4.0, 42.0, 0.5)],
            explanation: "Порция ориз".to_string(),
            ..Default::default()
        }
    }

    fn started(begin: BeginAnalysis) -> AnalysisTicket {
        match begin {
            BeginAnalysis::Started(ticket) => ticket,
            other => panic!("expected a ticket, got {other:?}"),
        }
    }

    fn reviewing() -> (SessionController, MemoryCamera) {
        let (mut session, camera) = controller();
        session.queue_image(ImagePayload::jpeg(vec![1])).unwrap();
        let ticket = started(session.begin_analysis().unwrap());
        session.finish_analysis(ticket.generation, Ok(rice_result()));
        (session, camera)
    }

    #[test]
    fn test_starts_idle_with_camera() {
        let (session, camera) = controller();
        assert_eq!(session.status(), SessionStatus::Idle);
        assert!(session.camera_active());
        assert_eq!(camera.acquisitions(), 1);
        assert_eq!(session.totals(), SessionTotals::default());
    }

    #[test]
    fn test_capture_and_discard() {
        let (mut session, camera) = controller();
        assert_eq!(session.capture().unwrap(), None);
        assert_eq!(session.status(), SessionStatus::Idle);

        camera.push_frame(ImagePayload::jpeg(vec![1]));
        camera.push_frame(ImagePayload::jpeg(vec![2]));
        assert_eq!(session.capture().unwrap(), Some(1));
        assert_eq!(session.capture().unwrap(), Some(2));
        assert_eq!(session.status(), SessionStatus::Capturing);

        assert!(matches!(
            session.discard_image(5),
            Err(SessionError::ImageOutOfRange { index: 5, len: 2 })
        ));
        session.discard_image(0).unwrap();
        assert_eq!(session.images()[0].data, vec![2]);
        session.discard_image(0).unwrap();
        assert_eq!(session.status(), SessionStatus::Idle);
    }

    #[test]
    fn test_analysis_needs_an_image() {
        let (mut session, _camera) = controller();
        assert!(matches!(session.begin_analysis().unwrap(), BeginAnalysis::NoImages));
        assert_eq!(session.status(), SessionStatus::Idle);
        assert_eq!(session.generation(), 0);
    }

    #[test]
    fn test_analysis_falls_back_to_live_frame() {
        let (mut session, camera) = controller();
        camera.push_frame(ImagePayload::jpeg(vec![7]));
        session.set_notes("без сос");
        let ticket = started(session.begin_analysis().unwrap());
        assert_eq!(ticket.images.len(), 1);
        assert_eq!(ticket.images[0].data, vec![7]);
        assert_eq!(ticket.notes, "без сос");
        assert!(session.images().is_empty());
    }

    #[test]
    fn test_analysis_uses_queued_images_in_order() {
        let (mut session, _camera) = controller();
        session.queue_image(ImagePayload::jpeg(vec![1])).unwrap();
        session.queue_image(ImagePayload::jpeg(vec![2])).unwrap();
        let ticket = started(session.begin_analysis().unwrap());
        let order: Vec<u8> = ticket.images.iter().map(|i| i.data[0]).collect();
        assert_eq!(order, vec![1, 2]);
        assert_eq!(session.status(), SessionStatus::Analyzing);
    }

    #[test]
    fn test_second_begin_is_ignored() {
        let (mut session, _camera) = controller();
        session.queue_image(ImagePayload::jpeg(vec![1])).unwrap();
        started(session.begin_analysis().unwrap());
        let generation = session.generation();
        assert!(matches!(session.begin_analysis().unwrap(), BeginAnalysis::InFlight));
        assert_eq!(session.generation(), generation);
        assert_eq!(session.status(), SessionStatus::Analyzing);
        assert_eq!(session.stats().analyses_started, 1);
    }

    #[test]
    fn test_success_moves_to_reviewing() {
        let (session, _camera) = reviewing();
        assert_eq!(session.status(), SessionStatus::Reviewing);
        assert_eq!(session.ingredients().len(), 1);
        assert!((session.ingredients()[0].ref_calories - 1.3).abs() < 1e-9);
        assert_eq!(session.summary().unwrap().explanation, "Порция ориз");
        assert_eq!(session.totals().calories, 195.0);
    }

    #[test]
    fn test_failure_uses_generic_message() {
        let (mut session, _camera) = controller();
        session.queue_image(ImagePayload::jpeg(vec![1])).unwrap();
        let ticket = started(session.begin_analysis().unwrap());
        let outcome = session.finish_analysis(
            ticket.generation,
            Err(InferenceError::Api("model overloaded".to_string())),
        );
        assert_eq!(outcome, AnalysisOutcome::Failed);
        assert_eq!(session.status(), SessionStatus::Failed);
        assert_eq!(session.error(), Some(ANALYSIS_FAILED_MESSAGE));
        assert!(session.ingredients().is_empty());
    }

    #[test]
    fn test_stale_response_is_discarded_after_reset() {
        let (mut session, _camera) = controller();
        session.queue_image(ImagePayload::jpeg(vec![1])).unwrap();
        let ticket = started(session.begin_analysis().unwrap());
        session.reset();
        let outcome = session.finish_analysis(ticket.generation, Ok(rice_result()));
        assert_eq!(outcome, AnalysisOutcome::Discarded);
        assert_eq!(session.status(), SessionStatus::Idle);
        assert!(session.ingredients().is_empty());
        assert_eq!(session.stats().responses_discarded, 1);
    }

    #[test]
    fn test_edit_weight_scenario() {
        let (mut session, _camera) = reviewing();
        let rice = session.edit_weight(0, 300.0).unwrap().clone();
        assert_eq!(rice.calories, 390.0);
        assert_eq!(rice.protein, 8.0);
        assert_eq!(rice.carbs, 84.0);
        assert_eq!(rice.fat, 1.0);
        assert_eq!(session.totals().calories, 390.0);
        assert_eq!(session.totals().weight, 300.0);

        session.edit_weight(0, "не знам").unwrap();
        assert_eq!(session.ingredients()[0].weight_value, 0.0);
        assert_eq!(session.totals().calories, 0.0);
    }

    #[test]
    fn test_edit_weight_leaves_other_ingredients() {
        let (mut session, _camera) = controller();
        session.queue_image(ImagePayload::jpeg(vec![1])).unwrap();
        let ticket = started(session.begin_analysis().unwrap());
        let mut result = rice_result();
        result.ingredients.push(RawIngredient::new("Пиле", 120.0, 198.0, 37.2, 0.0, 4.3));
        session.finish_analysis(ticket.generation, Ok(result));

        let chicken_before = session.ingredients()[1].clone();
        session.edit_weight(0, 300.0).unwrap();
        assert_eq!(session.ingredients()[1], chicken_before);
        assert_eq!(session.ingredients()[0].calories, 390.0);
        assert_eq!(session.totals().calories, 588.0);
    }

    #[test]
    fn test_set_notes_trims() {
        let (mut session, _camera) = controller();
        session.set_notes("  двойна порция \n");
        assert_eq!(session.notes(), "двойна порция");
        session.set_notes("   ");
        assert!(session.notes().is_empty());
    }

    #[test]
    fn test_edit_weight_rejects_bad_index_and_state() {
        let (mut session, _camera) = reviewing();
        assert!(matches!(
            session.edit_weight(1, 10.0),
            Err(SessionError::IngredientOutOfRange { index: 1, len: 1 })
        ));
        session.reset();
        assert!(matches!(session.edit_weight(0, 10.0), Err(SessionError::InvalidState { .. })));
    }

    #[test]
    fn test_reviewing_blocks_capture_and_analysis() {
        let (mut session, _camera) = reviewing();
        assert!(session.capture().is_err());
        assert!(session.queue_image(ImagePayload::jpeg(vec![1])).is_err());
        assert!(session.begin_analysis().is_err());
    }

    #[test]
    fn test_camera_released_until_reset() {
        let (mut session, camera) = reviewing();
        assert!(!session.camera_active());
        assert_eq!(camera.releases(), 1);
        session.reset();
        assert!(session.camera_active());
        assert_eq!(camera.acquisitions(), 2);
        assert!(session.images().is_empty());
        assert!(session.notes().is_empty());
        assert!(session.summary().is_none());
    }

    #[test]
    fn test_drop_releases_camera() {
        let (session, camera) = controller();
        drop(session);
        assert!(!camera.is_active());
    }

    #[test]
    fn test_dictation_appends_notes() {
        let (mut session, _camera) = controller();
        session.set_notes("пилешко");
        assert!(!session.handle_dictation_event(DictationEvent::Result("ignored".into())));

        assert!(session.toggle_dictation());
        assert!(session.handle_dictation_event(DictationEvent::Result(" с ориз ".into())));
        assert_eq!(session.notes(), "пилешко с ориз");
        assert!(!session.is_listening());

        assert!(session.toggle_dictation());
        assert!(!session.handle_dictation_event(DictationEvent::Error));
        assert!(!session.is_listening());
        assert_eq!(session.status(), SessionStatus::Idle);
    }

    #[test]
    fn test_dictation_toggle_off() {
        let (mut session, _camera) = controller();
        assert!(session.toggle_dictation());
        assert!(!session.toggle_dictation());
        assert!(!session.is_listening());
    }

    #[test]
    fn test_unavailable_dictation_is_noop() {
        let mut session = SessionController::new(Box::new(MemoryCamera::new()), Box::new(UnavailableDictation));
        assert!(!session.toggle_dictation());
        assert!(!session.is_listening());
        assert!(!session.dictation_available());
    }

    #[test]
    fn test_snapshot() {
        let (mut session, _camera) = reviewing();
        session.edit_weight(0, 300.0).unwrap();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.status, SessionStatus::Reviewing);
        assert_eq!(snapshot.image_count, 1);
        assert_eq!(snapshot.display_totals.calories, 390.0);
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["status"], "reviewing");
        assert_eq!(json["ingredients"][0]["weightValue"], 300.0);
    }
}
