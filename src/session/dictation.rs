//! Voice dictation capability
//!
//! Dictation only ever appends recognized text to the session notes. The
//! backend is chosen once at startup; an unsupported platform gets
//! [`UnavailableDictation`], which turns every toggle into a no-op.

use thiserror::Error;

use crate::config::DictationMode;

#[derive(Debug, Error)]
pub enum DictationError {
    #[error("Dictation is not available")]
    Unavailable,

    #[error("Dictation is already running")]
    AlreadyStarted,
}

/// What a recognizer reports back for one activation
#[derive(Debug, Clone, PartialEq)]
pub enum DictationEvent {
    Result(String),
    Error,
    End,
}

/// Start/stop controls of a speech recognizer
pub trait Dictation: Send {
    fn is_available(&self) -> bool;

    fn start(&mut self) -> Result<(), DictationError>;

    fn stop(&mut self);
}

/// Backend for platforms without speech recognition
#[derive(Debug, Default)]
pub struct UnavailableDictation;

impl Dictation for UnavailableDictation {
    fn is_available(&self) -> bool {
        false
    }

    fn start(&mut self) -> Result<(), DictationError> {
        Err(DictationError::Unavailable)
    }

    fn stop(&mut self) {}
}

/// Recognition happens on the client; transcripts arrive as events
#[derive(Debug, Default)]
pub struct ExternalDictation {
    running: bool,
}

impl Dictation for ExternalDictation {
    fn is_available(&self) -> bool {
        true
    }

    fn start(&mut self) -> Result<(), DictationError> {
        if self.running {
            return Err(DictationError::AlreadyStarted);
        }
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.running = false;
    }
}

/// Pick the backend for the configured mode
pub fn backend_for(mode: DictationMode) -> Box<dyn Dictation> {
    match mode {
        DictationMode::External => Box::new(ExternalDictation::default()),
        DictationMode::Off => Box::new(UnavailableDictation),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_backend() {
        let mut backend = backend_for(DictationMode::Off);
        assert!(!backend.is_available());
        assert!(backend.start().is_err());
        backend.stop();
    }

    #[test]
    fn test_external_backend_single_activation() {
        let mut backend = backend_for(DictationMode::External);
        assert!(backend.is_available());
        backend.start().unwrap();
        assert!(matches!(backend.start(), Err(DictationError::AlreadyStarted)));
        backend.stop();
        backend.start().unwrap();
    }
}
