//! Enrollment lifecycle.
//!
//! Tracks which courses the learner is enrolled in, together with cached
//! progress for each. `Completed` is never stored; it is derived from the
//! cached progress.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::backend::CourseApi;
use crate::error::{LecternError, Result};
use crate::events::{EventHub, LearnerEvent};
use crate::model::{Course, OverallProgress, User};
use crate::pending::PendingActions;
use crate::progress::{CourseProgress, ProgressOverview};

/// Enrollment state of one course for the current learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    /// Not enrolled (never, or after unenrolling).
    NotEnrolled,
    /// Enrolled with lessons outstanding.
    Enrolled,
    /// Enrolled and every lesson complete.
    Completed,
}

impl std::fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotEnrolled => write!(f, "not enrolled"),
            Self::Enrolled => write!(f, "enrolled"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Explicit answer to "discard all progress and unenroll?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// The learner agreed.
    Confirmed,
    /// The learner declined or was not asked.
    NotConfirmed,
}

impl From<bool> for Confirmation {
    fn from(confirmed: bool) -> Self {
        if confirmed {
            Self::Confirmed
        } else {
            Self::NotConfirmed
        }
    }
}

/// How an enroll request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollOutcome {
    /// A new enrollment was created.
    Enrolled,
    /// The backend already had one; treated as success.
    AlreadyEnrolled,
}

/// How an unenroll request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnenrollOutcome {
    /// The enrollment and its progress are gone.
    Unenrolled,
    /// Not confirmed; nothing was sent.
    Cancelled,
}

/// Checks that `user` may enroll in `course`.
pub fn check_eligibility(user: &User, course: &Course) -> Result<()> {
    if !user.is_student() {
        return Err(LecternError::not_eligible(
            course.id,
            format!("only students can enroll (you are signed in as {})", user.role),
        ));
    }
    if course.instructor_id() == Some(user.id) {
        return Err(LecternError::not_eligible(
            course.id,
            "you are the instructor of this course",
        ));
    }
    Ok(())
}

/// Enroll/unenroll coordinator with a per-course progress cache.
#[derive(Clone)]
pub struct EnrollmentManager {
    api: Arc<dyn CourseApi>,
    pending: PendingActions,
    events: Option<EventHub>,
    courses: Arc<Mutex<HashMap<u64, CourseProgress>>>,
}

impl EnrollmentManager {
    /// Creates a manager with an empty cache.
    #[must_use]
    pub fn new(api: Arc<dyn CourseApi>) -> Self {
        Self {
            api,
            pending: PendingActions::new(),
            events: None,
            courses: Arc::default(),
        }
    }

    /// Publishes enrollment events on the given hub.
    #[must_use]
    pub fn with_events(mut self, events: EventHub) -> Self {
        self.events = Some(events);
        self
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<u64, CourseProgress>> {
        self.courses.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: LearnerEvent) {
        if let Some(events) = &self.events {
            events.send(event);
        }
    }

    /// Replaces the cache with the backend's view of the learner's courses.
    pub fn sync(&self, overall: &OverallProgress) {
        let mut cache = self.cache();
        cache.clear();
        for entry in &overall.course_progress {
            cache.insert(entry.course_id, CourseProgress::from_entry(entry));
        }
    }

    /// Records fresh progress for an enrolled course.
    pub fn record_progress(&self, progress: CourseProgress) {
        self.cache().insert(progress.course_id, progress);
    }

    /// Derived status of a course.
    #[must_use]
    pub fn status(&self, course_id: u64) -> EnrollmentStatus {
        match self.cache().get(&course_id) {
            None => EnrollmentStatus::NotEnrolled,
            Some(p) if p.is_completed() => EnrollmentStatus::Completed,
            Some(_) => EnrollmentStatus::Enrolled,
        }
    }

    /// Cached progress of a course.
    #[must_use]
    pub fn progress(&self, course_id: u64) -> Option<CourseProgress> {
        self.cache().get(&course_id).cloned()
    }

    /// Aggregate over every cached course, ordered by course id.
    #[must_use]
    pub fn overview(&self) -> ProgressOverview {
        let mut courses: Vec<CourseProgress> = self.cache().values().cloned().collect();
        courses.sort_by_key(|c| c.course_id);
        ProgressOverview::aggregate(courses)
    }

    /// Enrolls the learner.
    ///
    /// An "already enrolled" rejection from the backend counts as success.
    /// A new enrollment starts from zero progress.
    pub async fn enroll(&self, user: &User, course: &Course) -> Result<EnrollOutcome> {
        check_eligibility(user, course)?;
        let _guard = self.pending.begin("enroll", course.id)?;

        let outcome = match self.api.enroll(course.id).await {
            Ok(_) => EnrollOutcome::Enrolled,
            Err(e) if e.is_duplicate_enrollment() => {
                info!(course_id = course.id, "Already enrolled, treating as success");
                EnrollOutcome::AlreadyEnrolled
            }
            Err(e) => return Err(e),
        };

        {
            let mut cache = self.cache();
            let fresh = CourseProgress::new(course.id, course.title.clone(), 0, course.total_lessons);
            match outcome {
                EnrollOutcome::Enrolled => {
                    cache.insert(course.id, fresh);
                }
                EnrollOutcome::AlreadyEnrolled => {
                    cache.entry(course.id).or_insert(fresh);
                }
            }
        }

        info!(course_id = course.id, ?outcome, "Enrolled");
        self.publish(LearnerEvent::enrolled(
            course.id,
            outcome == EnrollOutcome::AlreadyEnrolled,
        ));
        Ok(outcome)
    }

    /// Unenrolls the learner, discarding all progress for the course.
    ///
    /// Without confirmation nothing is sent.
    pub async fn unenroll(
        &self,
        course_id: u64,
        confirmation: Confirmation,
    ) -> Result<UnenrollOutcome> {
        if confirmation == Confirmation::NotConfirmed {
            return Ok(UnenrollOutcome::Cancelled);
        }
        let _guard = self.pending.begin("unenroll", course_id)?;

        if let Err(e) = self.api.unenroll(course_id).await {
            warn!(course_id, error = %e, "Unenroll failed");
            return Err(e);
        }

        self.cache().remove(&course_id);
        info!(course_id, "Unenrolled, course progress discarded");
        self.publish(LearnerEvent::unenrolled(course_id));
        Ok(UnenrollOutcome::Unenrolled)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::forms::CourseDraft;
    use crate::model::{Ack, Role, UserRef};

    /// Backend that remembers enrollments and rejects duplicates like the real one.
    #[derive(Default)]
    struct FakeCourses {
        enrolled: Mutex<Vec<u64>>,
        enroll_calls: AtomicUsize,
        unenroll_calls: AtomicUsize,
        delay: Option<Duration>,
        down: bool,
    }

    #[async_trait]
    impl CourseApi for FakeCourses {
        async fn list_courses(&self) -> Result<Vec<Course>> {
            Ok(Vec::new())
        }
        async fn get_course(&self, course_id: u64) -> Result<Course> {
            Ok(course(course_id, None))
        }
        async fn create_course(&self, _draft: &CourseDraft) -> Result<Course> {
            Ok(course(1, None))
        }
        async fn update_course(&self, course_id: u64, _draft: &CourseDraft) -> Result<Course> {
            Ok(course(course_id, None))
        }
        async fn delete_course(&self, _course_id: u64) -> Result<()> {
            Ok(())
        }

        async fn enroll(&self, course_id: u64) -> Result<Ack> {
            self.enroll_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.down {
                return Err(LecternError::server(503, "unavailable"));
            }
            let mut enrolled = self.enrolled.lock().unwrap();
            if enrolled.contains(&course_id) {
                return Err(LecternError::AlreadyEnrolled { course_id });
            }
            enrolled.push(course_id);
            Ok(Ack::default())
        }

        async fn unenroll(&self, course_id: u64) -> Result<Ack> {
            self.unenroll_calls.fetch_add(1, Ordering::SeqCst);
            self.enrolled.lock().unwrap().retain(|id| *id != course_id);
            Ok(Ack::default())
        }

        async fn enrolled_courses(&self) -> Result<Vec<Course>> {
            Ok(Vec::new())
        }
        async fn available_courses(&self) -> Result<Vec<Course>> {
            Ok(Vec::new())
        }
    }

    fn course(id: u64, instructor: Option<u64>) -> Course {
        let mut course: Course = serde_json::from_value(serde_json::json!({
            "id": id,
            "title": format!("Course {id}"),
            "total_lessons": 4,
        }))
        .unwrap();
        course.instructor = instructor.map(UserRef::Id);
        course
    }

    fn user(id: u64, role: Role) -> User {
        User {
            id,
            username: format!("user{id}"),
            email: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            role,
        }
    }

    #[tokio::test]
    async fn test_enroll_twice_is_one_enrollment() {
        let api = Arc::new(FakeCourses::default());
        let manager = EnrollmentManager::new(api.clone());
        let student = user(1, Role::Student);
        let c = course(3, Some(9));

        assert_eq!(manager.enroll(&student, &c).await.unwrap(), EnrollOutcome::Enrolled);
        manager.record_progress(CourseProgress::new(3, "Course 3", 2, 4));
        assert_eq!(
            manager.enroll(&student, &c).await.unwrap(),
            EnrollOutcome::AlreadyEnrolled
        );

        assert_eq!(manager.status(3), EnrollmentStatus::Enrolled);
        assert_eq!(manager.progress(3).unwrap().completed_lessons, 2);
        assert_eq!(api.enrolled.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_instructors_cannot_enroll() {
        let api = Arc::new(FakeCourses::default());
        let manager = EnrollmentManager::new(api.clone());

        let err = manager
            .enroll(&user(9, Role::Student), &course(3, Some(9)))
            .await
            .unwrap_err();
        assert!(matches!(err, LecternError::NotEligibleToEnroll { .. }));

        let err = manager
            .enroll(&user(2, Role::Instructor), &course(3, Some(9)))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("only students"));

        assert_eq!(api.enroll_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unenroll_requires_confirmation() {
        let api = Arc::new(FakeCourses::default());
        let manager = EnrollmentManager::new(api.clone());
        manager
            .enroll(&user(1, Role::Student), &course(3, None))
            .await
            .unwrap();

        let outcome = manager
            .unenroll(3, Confirmation::NotConfirmed)
            .await
            .unwrap();
        assert_eq!(outcome, UnenrollOutcome::Cancelled);
        assert_eq!(api.unenroll_calls.load(Ordering::SeqCst), 0);
        assert_eq!(manager.status(3), EnrollmentStatus::Enrolled);
    }

    #[tokio::test]
    async fn test_unenroll_then_reenroll_starts_from_zero() {
        let api = Arc::new(FakeCourses::default());
        let hub = EventHub::new(8);
        let mut rx = hub.subscribe();
        let manager = EnrollmentManager::new(api.clone()).with_events(hub);
        let student = user(1, Role::Student);
        let c = course(3, None);

        manager.enroll(&student, &c).await.unwrap();
        manager.record_progress(CourseProgress::new(3, "Course 3", 4, 4));
        assert_eq!(manager.status(3), EnrollmentStatus::Completed);

        manager.unenroll(3, true.into()).await.unwrap();
        assert_eq!(manager.status(3), EnrollmentStatus::NotEnrolled);
        assert!(manager.progress(3).is_none());

        manager.enroll(&student, &c).await.unwrap();
        assert_eq!(manager.progress(3).unwrap().completed_lessons, 0);
        assert_eq!(manager.status(3), EnrollmentStatus::Enrolled);

        let names: Vec<&str> = [
            rx.recv().await.unwrap(),
            rx.recv().await.unwrap(),
            rx.recv().await.unwrap(),
        ]
        .iter()
        .map(LearnerEvent::event_name)
        .collect();
        assert_eq!(names, vec!["enrolled", "unenrolled", "enrolled"]);
    }

    #[tokio::test]
    async fn test_transient_failure_leaves_state_unchanged() {
        let api = Arc::new(FakeCourses {
            down: true,
            ..FakeCourses::default()
        });
        let manager = EnrollmentManager::new(api);

        let err = manager
            .enroll(&user(1, Role::Student), &course(3, None))
            .await
            .unwrap_err();
        assert!(err.is_transient());
        assert_eq!(manager.status(3), EnrollmentStatus::NotEnrolled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_enroll_in_flight_per_course() {
        let api = Arc::new(FakeCourses {
            delay: Some(Duration::from_secs(1)),
            ..FakeCourses::default()
        });
        let manager = EnrollmentManager::new(api.clone());
        let student = user(1, Role::Student);
        let (c3, c4) = (course(3, None), course(4, None));

        let (a, b, c) = tokio::join!(
            manager.enroll(&student, &c3),
            manager.enroll(&student, &c3),
            manager.enroll(&student, &c4),
        );

        assert!(a.is_ok());
        assert!(matches!(b, Err(LecternError::ActionInFlight { .. })));
        assert!(c.is_ok());
        assert_eq!(api.enroll_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_sync_and_overview() {
        let manager = EnrollmentManager::new(Arc::new(FakeCourses::default()));
        let overall: OverallProgress = serde_json::from_value(serde_json::json!({
            "course_progress": [
                {"course_id": 2, "course_title": "B", "completed_lessons": 1, "total_lessons": 2},
                {"course_id": 1, "course_title": "A", "completed_lessons": 3, "total_lessons": 3}
            ]
        }))
        .unwrap();

        manager.sync(&overall);

        assert_eq!(manager.status(1), EnrollmentStatus::Completed);
        assert_eq!(manager.status(2), EnrollmentStatus::Enrolled);
        let overview = manager.overview();
        assert_eq!(overview.courses[0].course_id, 1);
        assert_eq!(overview.completed_courses, 1);
        assert!((overview.average_progress - 75.0).abs() < 1e-9);
    }
}
