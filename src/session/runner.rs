//! Analysis runner
//!
//! The only suspending session operation. The session lock is held just long
//! enough to take a ticket and later to hand back the outcome, so reset and
//! other edits stay responsive while the service is working.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::controller::{AnalysisOutcome, BeginAnalysis, SessionController};
use super::SessionError;
use crate::inference::{InferenceError, NutritionAnalyzer};

pub type SharedSession = Arc<Mutex<SessionController>>;

/// Fails the analysis if the runner is dropped before handing back an outcome
struct PendingAnalysis<'a> {
    session: &'a SharedSession,
    generation: u64,
    settled: bool,
}

impl Drop for PendingAnalysis<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let generation = self.generation;
        warn!(generation, "Analysis dropped before completion");
        match self.session.try_lock() {
            Ok(mut controller) => {
                controller.finish_analysis(generation, Err(InferenceError::Abandoned));
            }
            Err(_) => {
                let Ok(handle) = Handle::try_current() else {
                    return;
                };
                let session = Arc::clone(self.session);
                handle.spawn(async move {
                    session
                        .lock()
                        .await
                        .finish_analysis(generation, Err(InferenceError::Abandoned));
                });
            }
        }
    }
}

/// Run one analysis for the session
///
/// Dropping the returned future mid-request moves the session to `Failed`.
pub async fn analyze(
    session: &SharedSession,
    analyzer: &dyn NutritionAnalyzer,
) -> Result<AnalysisOutcome, SessionError> {
    let ticket = {
        let mut controller = session.lock().await;
        match controller.begin_analysis()? {
            BeginAnalysis::Started(ticket) => ticket,
            BeginAnalysis::NoImages => return Ok(AnalysisOutcome::NoImages),
            BeginAnalysis::InFlight => return Ok(AnalysisOutcome::InFlight),
        }
    };
    let mut pending = PendingAnalysis {
        session,
        generation: ticket.generation,
        settled: false,
    };

    debug!(analyzer = analyzer.name(), generation = ticket.generation, "Calling analyzer");
    let result = analyzer.analyze(&ticket.images, &ticket.notes).await;

    let mut controller = session.lock().await;
    pending.settled = true;
    Ok(controller.finish_analysis(ticket.generation, result))
}
