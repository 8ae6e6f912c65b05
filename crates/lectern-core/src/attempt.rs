//! Drives a [`QuizSession`] against the backend.
//!
//! The session lives behind a mutex that is only held for the synchronous
//! state transitions, never across the network call. The in-flight flag set
//! by `begin_submission` is what guarantees a single attempt call when the
//! countdown and the learner submit at the same moment.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backend::QuizApi;
use crate::error::Result;
use crate::events::{EventHub, LearnerEvent};
use crate::model::AttemptResult;
use crate::quiz::{QuizPhase, QuizSession, SubmissionRequest, SubmitTrigger, TickOutcome};

/// Shared handle to a quiz attempt.
#[derive(Clone)]
pub struct AttemptRunner {
    api: Arc<dyn QuizApi>,
    session: Arc<Mutex<QuizSession>>,
    events: Option<EventHub>,
}

impl std::fmt::Debug for AttemptRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttemptRunner")
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

impl AttemptRunner {
    /// Wraps a session.
    #[must_use]
    pub fn new(api: Arc<dyn QuizApi>, session: QuizSession) -> Self {
        Self {
            api,
            session: Arc::new(Mutex::new(session)),
            events: None,
        }
    }

    /// Loads the quiz from the backend and wraps it in a fresh session.
    pub async fn load(api: Arc<dyn QuizApi>, quiz_id: u64) -> Result<Self> {
        let quiz = api.get_quiz(quiz_id).await?;
        debug!(quiz_id, questions = quiz.questions.len(), "Loaded quiz");
        Ok(Self::new(api, QuizSession::new(quiz)))
    }

    /// Publishes `QuizSubmitted` events on the given hub.
    #[must_use]
    pub fn with_events(mut self, events: EventHub) -> Self {
        self.events = Some(events);
        self
    }

    fn lock(&self) -> MutexGuard<'_, QuizSession> {
        // Transitions never panic midway, so a poisoned session is still consistent.
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs a closure against the session.
    pub fn with_session<R>(&self, f: impl FnOnce(&mut QuizSession) -> R) -> R {
        f(&mut self.lock())
    }

    /// A copy of the current session state.
    #[must_use]
    pub fn snapshot(&self) -> QuizSession {
        self.lock().clone()
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        self.lock().phase()
    }

    /// Submits the attempt.
    ///
    /// On failure the session keeps its answers and can be submitted again.
    pub async fn submit(&self, trigger: SubmitTrigger) -> Result<AttemptResult> {
        let request = self.with_session(|s| s.begin_submission(trigger))?;
        self.dispatch(request).await
    }

    /// Advances the countdown by one minute.
    ///
    /// Returns the graded result if this tick expired the quiz.
    pub async fn tick(&self) -> Result<Option<AttemptResult>> {
        match self.with_session(QuizSession::tick) {
            TickOutcome::Expired(request) => self.dispatch(request).await.map(Some),
            TickOutcome::Running { remaining_minutes } => {
                debug!(remaining_minutes, "Quiz timer tick");
                Ok(None)
            }
            TickOutcome::Idle => Ok(None),
        }
    }

    async fn dispatch(&self, request: SubmissionRequest) -> Result<AttemptResult> {
        info!(
            quiz_id = request.quiz_id,
            answers = request.attempt.answers.len(),
            trigger = ?request.trigger,
            "Submitting quiz attempt"
        );

        match self
            .api
            .submit_attempt(request.quiz_id, &request.attempt)
            .await
        {
            Ok(result) => {
                self.with_session(|s| s.complete_submission(result.clone()))?;
                if let Some(events) = &self.events {
                    events.send(LearnerEvent::quiz_submitted(
                        request.quiz_id,
                        result.score,
                        result.passed,
                        result.remaining_attempts,
                        request.trigger.is_auto(),
                    ));
                }
                Ok(result)
            }
            Err(e) => {
                warn!(quiz_id = request.quiz_id, error = %e, "Quiz submission failed");
                self.with_session(QuizSession::fail_submission);
                Err(e)
            }
        }
    }

    /// Spawns a task that ticks the countdown every `period`.
    ///
    /// The task ends once the attempt leaves `InProgress` or the countdown
    /// reaches zero, whether or not the expiry submission succeeded. Untimed
    /// quizzes return a task that ends immediately.
    pub fn spawn_timer(&self, period: Duration) -> JoinHandle<()> {
        let runner = self.clone();
        tokio::spawn(async move {
            if runner.with_session(|s| s.remaining_minutes().is_none()) {
                return;
            }
            let mut interval = tokio::time::interval(period);
            // The first tick of an interval completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                match runner.tick().await {
                    Ok(Some(result)) => {
                        info!(score = result.score, "Quiz auto-submitted");
                        break;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(error = %e, "Auto-submission failed, waiting for a manual submit");
                        break;
                    }
                }
                let finished = runner.with_session(|s| {
                    s.phase() != QuizPhase::InProgress || s.remaining_minutes() == Some(0)
                });
                if finished {
                    break;
                }
            }
        })
    }
}
