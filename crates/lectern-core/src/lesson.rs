//! Lesson ordering and completion gating.

use std::sync::Arc;

use tracing::info;

use crate::backend::LessonApi;
use crate::error::{LecternError, Result};
use crate::events::{EventHub, LearnerEvent};
use crate::model::{Ack, Lesson};
use crate::pending::PendingActions;

/// Checks whether a lesson may be marked complete.
///
/// A lesson with a quiz that is not yet passed and still has attempts left
/// is blocked. Once the attempts are exhausted the lesson can be completed
/// regardless of the outcome.
pub fn check_completion(lesson: &Lesson) -> Result<()> {
    match &lesson.quiz {
        Some(quiz) if !quiz.passed && quiz.attempts_remaining > 0 => Err(LecternError::LessonGated {
            lesson_id: lesson.id,
            attempts_remaining: quiz.attempts_remaining,
        }),
        _ => Ok(()),
    }
}

/// Sorts lessons by `order`, keeping insertion order for ties.
pub fn sort_lessons(lessons: &mut [Lesson]) {
    lessons.sort_by_key(|l| l.order);
}

/// The lesson after `lesson_id` in an ordered list.
#[must_use]
pub fn next_lesson(lessons: &[Lesson], lesson_id: u64) -> Option<&Lesson> {
    let pos = lessons.iter().position(|l| l.id == lesson_id)?;
    lessons.get(pos + 1)
}

/// The lesson before `lesson_id` in an ordered list.
#[must_use]
pub fn previous_lesson(lessons: &[Lesson], lesson_id: u64) -> Option<&Lesson> {
    let pos = lessons.iter().position(|l| l.id == lesson_id)?;
    pos.checked_sub(1).and_then(|p| lessons.get(p))
}

/// Marks lessons complete, enforcing the quiz gate first.
#[derive(Clone)]
pub struct LessonCompleter {
    api: Arc<dyn LessonApi>,
    pending: PendingActions,
    events: Option<EventHub>,
}

impl LessonCompleter {
    /// Creates a completer.
    #[must_use]
    pub fn new(api: Arc<dyn LessonApi>) -> Self {
        Self {
            api,
            pending: PendingActions::new(),
            events: None,
        }
    }

    /// Publishes `LessonCompleted` events on the given hub.
    #[must_use]
    pub fn with_events(mut self, events: EventHub) -> Self {
        self.events = Some(events);
        self
    }

    /// Marks the lesson complete.
    ///
    /// The quiz gate is checked before any request is made.
    pub async fn complete(&self, lesson: &Lesson) -> Result<Ack> {
        check_completion(lesson)?;
        let _guard = self.pending.begin("complete", lesson.id)?;

        let ack = self.api.mark_complete(lesson.id).await?;
        info!(lesson_id = lesson.id, "Lesson marked complete");
        if let Some(events) = &self.events {
            events.send(LearnerEvent::lesson_completed(lesson.id));
        }
        Ok(ack)
    }

    /// Fetches a lesson and marks it complete.
    pub async fn complete_by_id(&self, lesson_id: u64) -> Result<Ack> {
        let lesson = self.api.get_lesson(lesson_id).await?;
        self.complete(&lesson).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::forms::LessonDraft;
    use crate::model::LessonQuizStatus;

    fn lesson(id: u64, order: i32) -> Lesson {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "title": format!("Lesson {id}"),
            "order": order,
        }))
        .unwrap()
    }

    fn with_quiz(mut lesson: Lesson, passed: bool, attempts_remaining: u32) -> Lesson {
        lesson.quiz = Some(LessonQuizStatus {
            id: 100,
            title: "Check".to_string(),
            passed,
            attempts_remaining,
            best_score: None,
        });
        lesson
    }

    #[derive(Default)]
    struct CountingLessons {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LessonApi for CountingLessons {
        async fn get_lesson(&self, lesson_id: u64) -> Result<Lesson> {
            Ok(with_quiz(lesson(lesson_id, 0), false, 2))
        }

        async fn create_lesson(&self, _draft: &LessonDraft) -> Result<Lesson> {
            Ok(lesson(1, 0))
        }

        async fn update_lesson(&self, lesson_id: u64, _draft: &LessonDraft) -> Result<Lesson> {
            Ok(lesson(lesson_id, 0))
        }

        async fn delete_lesson(&self, _lesson_id: u64) -> Result<()> {
            Ok(())
        }

        async fn mark_complete(&self, _lesson_id: u64) -> Result<Ack> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Ack::default())
        }
    }

    #[test]
    fn test_gate_rules() {
        assert!(check_completion(&lesson(1, 0)).is_ok());
        assert!(check_completion(&with_quiz(lesson(1, 0), true, 2)).is_ok());
        assert!(check_completion(&with_quiz(lesson(1, 0), false, 0)).is_ok());
        assert!(matches!(
            check_completion(&with_quiz(lesson(1, 0), false, 1)),
            Err(LecternError::LessonGated {
                lesson_id: 1,
                attempts_remaining: 1
            })
        ));
    }

    #[test]
    fn test_sort_is_stable() {
        let mut lessons = vec![lesson(1, 2), lesson(2, 1), lesson(3, 2), lesson(4, 1)];
        sort_lessons(&mut lessons);
        let ids: Vec<u64> = lessons.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![2, 4, 1, 3]);
    }

    #[test]
    fn test_neighbours() {
        let lessons = vec![lesson(1, 0), lesson(2, 1), lesson(3, 2)];
        assert_eq!(next_lesson(&lessons, 2).unwrap().id, 3);
        assert!(next_lesson(&lessons, 3).is_none());
        assert_eq!(previous_lesson(&lessons, 2).unwrap().id, 1);
        assert!(previous_lesson(&lessons, 1).is_none());
        assert!(previous_lesson(&lessons, 9).is_none());
    }

    #[tokio::test]
    async fn test_gated_lesson_makes_no_request() {
        let api = Arc::new(CountingLessons::default());
        let completer = LessonCompleter::new(api.clone());

        let err = completer
            .complete(&with_quiz(lesson(1, 0), false, 3))
            .await
            .unwrap_err();
        assert!(matches!(err, LecternError::LessonGated { .. }));

        let err = completer.complete_by_id(5).await.unwrap_err();
        assert!(matches!(err, LecternError::LessonGated { lesson_id: 5, .. }));

        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_completion_publishes_event() {
        let api = Arc::new(CountingLessons::default());
        let hub = EventHub::new(4);
        let mut rx = hub.subscribe();
        let completer = LessonCompleter::new(api.clone()).with_events(hub);

        completer.complete(&lesson(3, 0)).await.unwrap();

        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
        assert_eq!(rx.recv().await.unwrap().event_name(), "lesson_completed");
    }
}
