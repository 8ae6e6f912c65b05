//! Quiz session state machine.
//!
//! A [`QuizSession`] owns everything a learner does during one quiz attempt:
//! question navigation, answer collection, the countdown and the single
//! submission. It performs no I/O. Submissions are split into
//! [`QuizSession::begin_submission`] (which sets the in-flight flag and
//! returns the payload) and [`QuizSession::complete_submission`] /
//! [`QuizSession::fail_submission`], so the caller can await the backend in
//! between without holding a lock.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{LecternError, Result};
use crate::model::{
    AnswerChoice, AnswerSubmission, AttemptRequest, AttemptResult, Question, QuestionResult, Quiz,
};

// ============================================================================
// QuizPhase
// ============================================================================

/// Phase of a quiz session.
///
/// Transitions:
/// - `NotStarted` -> `InProgress` via `start`
/// - `InProgress` -> `Submitted` via a successful submission
/// - `Submitted` -> `NotStarted` via `retake` (attempts left and not passed)
/// - `Locked` is entered at construction when no attempts remain and is terminal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizPhase {
    /// Metadata loaded; waiting for the learner to start.
    #[default]
    NotStarted,
    /// Answering questions.
    InProgress,
    /// Graded; the result is available.
    Submitted,
    /// No attempts remain; only the best score is shown.
    Locked,
}

impl QuizPhase {
    /// Returns `true` if no further transition is possible.
    ///
    /// # Examples
    ///
    /// ```
    /// use lectern_core::quiz::QuizPhase;
    ///
    /// assert!(QuizPhase::Locked.is_terminal());
    /// assert!(!QuizPhase::Submitted.is_terminal());
    /// ```
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Locked)
    }
}

impl std::fmt::Display for QuizPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Submitted => write!(f, "submitted"),
            Self::Locked => write!(f, "locked"),
        }
    }
}

// ============================================================================
// Submission types
// ============================================================================

/// What initiated a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitTrigger {
    /// The learner pressed submit; unanswered questions need confirmation.
    User,
    /// The learner confirmed submitting with unanswered questions.
    UserConfirmed,
    /// The countdown reached zero; never asks for confirmation.
    Timer,
}

impl SubmitTrigger {
    /// Returns `true` for timer-triggered submissions.
    #[must_use]
    pub const fn is_auto(self) -> bool {
        matches!(self, Self::Timer)
    }
}

/// A submission ready to be sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRequest {
    /// Quiz being attempted.
    pub quiz_id: u64,
    /// Answered questions, in question order.
    pub attempt: AttemptRequest,
    /// What initiated the submission.
    pub trigger: SubmitTrigger,
}

/// Result of one timer tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing to do: untimed quiz, not in progress, or a submission is in flight.
    Idle,
    /// The countdown moved; this many whole minutes remain.
    Running {
        /// Minutes left.
        remaining_minutes: u32,
    },
    /// The countdown hit zero and a submission was started.
    Expired(SubmissionRequest),
}

// ============================================================================
// QuizSession
// ============================================================================

/// State of one learner working through one quiz.
#[derive(Debug, Clone)]
pub struct QuizSession {
    quiz: Quiz,
    phase: QuizPhase,
    current: usize,
    answers: HashMap<u64, AnswerChoice>,
    remaining_minutes: Option<u32>,
    in_flight: bool,
    result: Option<AttemptResult>,
    attempts_remaining: u32,
    best_score: Option<f64>,
}

impl QuizSession {
    /// Creates a session for a freshly loaded quiz.
    ///
    /// A quiz with no attempts remaining starts (and stays) `Locked`.
    #[must_use]
    pub fn new(quiz: Quiz) -> Self {
        let phase = if quiz.attempts_remaining == 0 {
            QuizPhase::Locked
        } else {
            QuizPhase::NotStarted
        };
        Self {
            attempts_remaining: quiz.attempts_remaining,
            best_score: quiz.best_score,
            quiz,
            phase,
            current: 0,
            answers: HashMap::new(),
            remaining_minutes: None,
            in_flight: false,
            result: None,
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// The quiz metadata and questions.
    #[must_use]
    pub const fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> QuizPhase {
        self.phase
    }

    /// 0-based index of the question on screen.
    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current
    }

    /// The question on screen, if the quiz has any.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.quiz.questions.get(self.current)
    }

    /// Number of questions.
    #[must_use]
    pub fn question_count(&self) -> usize {
        self.quiz.questions.len()
    }

    /// The selected answer for a question.
    #[must_use]
    pub fn answer_for(&self, question_id: u64) -> Option<AnswerChoice> {
        self.answers.get(&question_id).copied()
    }

    /// Number of answered questions.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// Number of questions without an answer.
    #[must_use]
    pub fn unanswered_count(&self) -> usize {
        self.question_count() - self.answered_count()
    }

    /// Whole minutes left, for timed quizzes in progress.
    #[must_use]
    pub const fn remaining_minutes(&self) -> Option<u32> {
        self.remaining_minutes
    }

    /// Whether a submission is awaiting the backend.
    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        self.in_flight
    }

    /// The graded result, once submitted.
    #[must_use]
    pub const fn result(&self) -> Option<&AttemptResult> {
        self.result.as_ref()
    }

    /// Attempts left, updated after each graded attempt.
    #[must_use]
    pub const fn attempts_remaining(&self) -> u32 {
        self.attempts_remaining
    }

    /// Best score seen so far.
    #[must_use]
    pub const fn best_score(&self) -> Option<f64> {
        self.best_score
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    /// Starts the attempt: clears answers, moves to the first question and
    /// arms the countdown.
    pub fn start(&mut self) -> Result<()> {
        match self.phase {
            QuizPhase::NotStarted => {}
            QuizPhase::Locked => return Err(LecternError::QuizLocked { quiz_id: self.quiz.id }),
            other => return Err(LecternError::invalid_transition(other, QuizPhase::InProgress)),
        }
        if self.quiz.questions.is_empty() {
            return Err(LecternError::EmptyQuiz { quiz_id: self.quiz.id });
        }

        self.phase = QuizPhase::InProgress;
        self.current = 0;
        self.answers.clear();
        self.remaining_minutes = self.quiz.time_limit_minutes;
        tracing::debug!(
            quiz_id = self.quiz.id,
            questions = self.question_count(),
            time_limit = ?self.quiz.time_limit_minutes,
            "Quiz attempt started"
        );
        Ok(())
    }

    fn ensure_in_progress(&self) -> Result<()> {
        if self.phase == QuizPhase::InProgress {
            Ok(())
        } else {
            Err(LecternError::invalid_transition(self.phase, QuizPhase::InProgress))
        }
    }

    /// Records (or replaces) the answer to a question.
    pub fn select_answer(&mut self, question_id: u64, choice: AnswerChoice) -> Result<()> {
        self.ensure_in_progress()?;
        if self.in_flight {
            return Err(LecternError::SubmissionInFlight);
        }
        if !self.quiz.questions.iter().any(|q| q.id == question_id) {
            return Err(LecternError::UnknownQuestion { question_id });
        }
        self.answers.insert(question_id, choice);
        Ok(())
    }

    /// Answers the question on screen.
    pub fn answer_current(&mut self, choice: AnswerChoice) -> Result<()> {
        let question_id = self
            .current_question()
            .map(|q| q.id)
            .ok_or(LecternError::EmptyQuiz { quiz_id: self.quiz.id })?;
        self.select_answer(question_id, choice)
    }

    /// Moves to the next question; stays on the last one.
    pub fn next(&mut self) -> Result<usize> {
        self.ensure_in_progress()?;
        if self.current + 1 < self.question_count() {
            self.current += 1;
        }
        Ok(self.current)
    }

    /// Moves to the previous question; stays on the first one.
    pub fn previous(&mut self) -> Result<usize> {
        self.ensure_in_progress()?;
        self.current = self.current.saturating_sub(1);
        Ok(self.current)
    }

    /// Jumps to a 0-based question index.
    pub fn jump_to(&mut self, index: usize) -> Result<()> {
        self.ensure_in_progress()?;
        let total = self.question_count();
        if index >= total {
            return Err(LecternError::QuestionOutOfRange { index, total });
        }
        self.current = index;
        Ok(())
    }

    /// Advances the countdown by one minute.
    ///
    /// When it reaches zero the submission is started with whatever has been
    /// answered. A tick while a submission is in flight does nothing.
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != QuizPhase::InProgress || self.in_flight {
            return TickOutcome::Idle;
        }
        let Some(remaining) = self.remaining_minutes else {
            return TickOutcome::Idle;
        };
        if remaining == 0 {
            // Already expired; a failed auto-submission is retried by the learner.
            return TickOutcome::Idle;
        }

        let remaining = remaining - 1;
        self.remaining_minutes = Some(remaining);
        if remaining > 0 {
            return TickOutcome::Running {
                remaining_minutes: remaining,
            };
        }

        tracing::info!(quiz_id = self.quiz.id, "Time is up, submitting quiz");
        match self.begin_submission(SubmitTrigger::Timer) {
            Ok(request) => TickOutcome::Expired(request),
            Err(_) => TickOutcome::Idle,
        }
    }

    /// Starts a submission and sets the in-flight flag.
    ///
    /// # Errors
    ///
    /// - `QuizLocked` when no attempts remain
    /// - `InvalidStateTransition` outside `InProgress`
    /// - `SubmissionInFlight` when a submission is already pending
    /// - `ConfirmationRequired` for [`SubmitTrigger::User`] with unanswered questions
    pub fn begin_submission(&mut self, trigger: SubmitTrigger) -> Result<SubmissionRequest> {
        if self.phase == QuizPhase::Locked {
            return Err(LecternError::QuizLocked { quiz_id: self.quiz.id });
        }
        if self.phase != QuizPhase::InProgress {
            return Err(LecternError::invalid_transition(self.phase, QuizPhase::Submitted));
        }
        if self.in_flight {
            return Err(LecternError::SubmissionInFlight);
        }
        let unanswered = self.unanswered_count();
        if trigger == SubmitTrigger::User && unanswered > 0 {
            return Err(LecternError::ConfirmationRequired { unanswered });
        }

        self.in_flight = true;
        let answers = self
            .quiz
            .questions
            .iter()
            .filter_map(|q| {
                self.answers.get(&q.id).map(|&answer| AnswerSubmission {
                    question_id: q.id,
                    answer,
                })
            })
            .collect();

        Ok(SubmissionRequest {
            quiz_id: self.quiz.id,
            attempt: AttemptRequest { answers },
            trigger,
        })
    }

    /// Stores the graded result and moves to `Submitted`.
    pub fn complete_submission(&mut self, result: AttemptResult) -> Result<()> {
        if !self.in_flight {
            return Err(LecternError::invalid_transition(
                "no pending submission",
                QuizPhase::Submitted,
            ));
        }
        self.in_flight = false;
        self.phase = QuizPhase::Submitted;
        self.remaining_minutes = None;
        self.attempts_remaining = result.remaining_attempts;
        self.best_score = Some(
            self.best_score
                .map_or(result.score, |best| best.max(result.score)),
        );
        tracing::info!(
            quiz_id = self.quiz.id,
            score = result.score,
            passed = result.passed,
            remaining_attempts = result.remaining_attempts,
            "Quiz graded"
        );
        self.result = Some(result);
        Ok(())
    }

    /// Clears the in-flight flag after a failed submission.
    ///
    /// Phase, answers and countdown are kept so the learner can resubmit.
    pub fn fail_submission(&mut self) {
        self.in_flight = false;
    }

    /// Whether another attempt may be started from the current result.
    #[must_use]
    pub fn can_retake(&self) -> bool {
        self.phase == QuizPhase::Submitted
            && self
                .result
                .as_ref()
                .is_some_and(|r| r.remaining_attempts > 0 && !r.passed)
    }

    /// Resets to `NotStarted` for another attempt.
    pub fn retake(&mut self) -> Result<()> {
        if !self.can_retake() {
            let reason = match (&self.phase, &self.result) {
                (QuizPhase::Submitted, Some(r)) if r.passed => "the quiz has already been passed",
                (QuizPhase::Submitted, Some(_)) => "no attempts remaining",
                (QuizPhase::Locked, _) => "no attempts remaining",
                _ => "the current attempt has not been submitted",
            };
            return Err(LecternError::retake_not_allowed(reason));
        }
        self.phase = QuizPhase::NotStarted;
        self.current = 0;
        self.answers.clear();
        self.remaining_minutes = None;
        self.result = None;
        Ok(())
    }
}

// ============================================================================
// Grading
// ============================================================================

/// Grades a submission against the quiz's answer key.
///
/// Used by test doubles and offline tooling; the backend is the authority
/// for real attempts. The score is the points-weighted percentage of correct
/// answers, rounded to two decimals.
///
/// # Errors
///
/// Returns `LecternError::Validation` if a question has no answer key.
pub fn grade(
    quiz: &Quiz,
    answers: &[AnswerSubmission],
    attempt_number: u32,
) -> Result<AttemptResult> {
    let by_question: HashMap<u64, AnswerChoice> =
        answers.iter().map(|a| (a.question_id, a.answer)).collect();

    let mut earned = 0u64;
    let mut possible = 0u64;
    let mut correct_answers = 0u32;
    let mut results = Vec::with_capacity(quiz.questions.len());

    for (index, question) in quiz.questions.iter().enumerate() {
        let Some(correct) = question.correct_answer else {
            return Err(LecternError::validation(
                "correct_answer",
                format!("Question {} has no answer key", index + 1),
            ));
        };
        let user_answer = by_question.get(&question.id).copied();
        let is_correct = user_answer == Some(correct);

        possible += u64::from(question.points);
        if is_correct {
            earned += u64::from(question.points);
            correct_answers += 1;
        }
        results.push(QuestionResult {
            question_id: Some(question.id),
            question_text: question.question_text.clone(),
            user_answer,
            correct_answer: correct,
            is_correct,
            explanation: question.explanation.clone(),
        });
    }

    #[allow(clippy::cast_precision_loss)]
    let score = if possible == 0 {
        0.0
    } else {
        (earned as f64 / possible as f64 * 10_000.0).round() / 100.0
    };

    Ok(AttemptResult {
        score,
        passed: score >= quiz.passing_score,
        correct_answers,
        total_questions: u32::try_from(quiz.questions.len()).unwrap_or(u32::MAX),
        attempt_number,
        remaining_attempts: quiz.max_attempts.saturating_sub(attempt_number),
        results,
    })
}
