//! Typed learner events.
//!
//! Components that change learner state publish a [`LearnerEvent`] on a
//! shared [`EventHub`]; anything that caches progress or renders status
//! subscribes instead of polling.
//!
//! # Example
//!
//! ```
//! use lectern_core::events::{EventHub, LearnerEvent};
//!
//! # async fn example() {
//! let hub = EventHub::new(16);
//! let mut receiver = hub.subscribe();
//!
//! hub.send(LearnerEvent::lesson_completed(7));
//!
//! if let Ok(event) = receiver.recv().await {
//!     assert_eq!(event.event_name(), "lesson_completed");
//! }
//! # }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ============================================================================
// Event Payloads
// ============================================================================

/// Why the session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEndReason {
    /// The user logged out.
    Logout,
    /// A 401 could not be recovered by refreshing the token.
    Expired,
}

/// Payload for the `session_ended` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEndedPayload {
    /// Why the session ended.
    pub reason: SessionEndReason,
}

/// Payload for enrollment events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentPayload {
    /// The course.
    pub course_id: u64,
    /// `true` when the backend reported an existing enrollment.
    #[serde(default)]
    pub already_enrolled: bool,
}

/// Payload for the `lesson_completed` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonCompletedPayload {
    /// The lesson.
    pub lesson_id: u64,
    /// When the completion was confirmed.
    pub timestamp: DateTime<Utc>,
}

/// Payload for the `quiz_submitted` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSubmittedPayload {
    /// The quiz.
    pub quiz_id: u64,
    /// Score in percent.
    pub score: f64,
    /// Whether the attempt passed.
    pub passed: bool,
    /// Attempts left after this one.
    pub remaining_attempts: u32,
    /// `true` when the timer triggered the submission.
    pub auto_submitted: bool,
}

// ============================================================================
// Event Enum
// ============================================================================

/// Learner state changes.
///
/// Serialized as `{"event": ..., "payload": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum LearnerEvent {
    /// The session was cleared.
    SessionEnded(SessionEndedPayload),
    /// The learner is now enrolled.
    Enrolled(EnrollmentPayload),
    /// The learner left a course; its progress is gone.
    Unenrolled(EnrollmentPayload),
    /// A lesson was marked complete.
    LessonCompleted(LessonCompletedPayload),
    /// A quiz attempt was graded.
    QuizSubmitted(QuizSubmittedPayload),
}

impl LearnerEvent {
    /// Creates a `SessionEnded` event.
    #[must_use]
    pub const fn session_ended(reason: SessionEndReason) -> Self {
        Self::SessionEnded(SessionEndedPayload { reason })
    }

    /// Creates an `Enrolled` event.
    #[must_use]
    pub const fn enrolled(course_id: u64, already_enrolled: bool) -> Self {
        Self::Enrolled(EnrollmentPayload {
            course_id,
            already_enrolled,
        })
    }

    /// Creates an `Unenrolled` event.
    #[must_use]
    pub const fn unenrolled(course_id: u64) -> Self {
        Self::Unenrolled(EnrollmentPayload {
            course_id,
            already_enrolled: false,
        })
    }

    /// Creates a `LessonCompleted` event stamped now.
    #[must_use]
    pub fn lesson_completed(lesson_id: u64) -> Self {
        Self::LessonCompleted(LessonCompletedPayload {
            lesson_id,
            timestamp: Utc::now(),
        })
    }

    /// Creates a `QuizSubmitted` event.
    #[must_use]
    pub fn quiz_submitted(
        quiz_id: u64,
        score: f64,
        passed: bool,
        remaining_attempts: u32,
        auto_submitted: bool,
    ) -> Self {
        Self::QuizSubmitted(QuizSubmittedPayload {
            quiz_id,
            score,
            passed,
            remaining_attempts,
            auto_submitted,
        })
    }

    /// Returns the event name as a string.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::SessionEnded(_) => "session_ended",
            Self::Enrolled(_) => "enrolled",
            Self::Unenrolled(_) => "unenrolled",
            Self::LessonCompleted(_) => "lesson_completed",
            Self::QuizSubmitted(_) => "quiz_submitted",
        }
    }
}

// ============================================================================
// Event Hub
// ============================================================================

/// Fan-out of learner events to every subscriber.
///
/// Events are not retained for subscribers that join later.
#[derive(Debug, Clone)]
pub struct EventHub {
    sender: broadcast::Sender<LearnerEvent>,
}

impl EventHub {
    /// Creates a hub whose subscribers buffer up to `capacity` events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Creates a new subscriber.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LearnerEvent> {
        self.sender.subscribe()
    }

    /// Publishes an event and returns how many subscribers will see it.
    pub fn send(&self, event: LearnerEvent) -> usize {
        tracing::debug!(event = event.event_name(), "Publishing learner event");
        // No subscribers is not an error.
        self.sender.send(event).unwrap_or(0)
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_string(&LearnerEvent::enrolled(3, true)).unwrap();
        assert!(json.contains(r#""event":"enrolled""#));
        assert!(json.contains(r#""course_id":3"#));
        assert!(json.contains(r#""already_enrolled":true"#));

        let json =
            serde_json::to_string(&LearnerEvent::session_ended(SessionEndReason::Expired)).unwrap();
        assert!(json.contains(r#""reason":"expired""#));
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{"event":"quiz_submitted","payload":{"quiz_id":2,"score":100.0,"passed":true,"remaining_attempts":1,"auto_submitted":true}}"#;
        let event: LearnerEvent = serde_json::from_str(json).unwrap();
        match event {
            LearnerEvent::QuizSubmitted(p) => {
                assert_eq!(p.quiz_id, 2);
                assert!(p.auto_submitted);
            }
            other => unreachable!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_event_names() {
        assert_eq!(LearnerEvent::unenrolled(1).event_name(), "unenrolled");
        assert_eq!(LearnerEvent::lesson_completed(1).event_name(), "lesson_completed");
        assert_eq!(
            LearnerEvent::quiz_submitted(1, 50.0, false, 0, false).event_name(),
            "quiz_submitted"
        );
    }

    #[tokio::test]
    async fn test_hub_fans_out() {
        let hub = EventHub::new(8);
        let mut a = hub.subscribe();
        let mut b = hub.subscribe();

        assert_eq!(hub.send(LearnerEvent::unenrolled(5)), 2);

        assert_eq!(a.recv().await.unwrap().event_name(), "unenrolled");
        assert_eq!(b.recv().await.unwrap().event_name(), "unenrolled");
    }

    #[test]
    fn test_hub_without_subscribers() {
        let hub = EventHub::default();
        assert_eq!(hub.receiver_count(), 0);
        assert_eq!(hub.send(LearnerEvent::enrolled(1, false)), 0);
    }
}
