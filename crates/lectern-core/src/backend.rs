//! The LMS backend contract.
//!
//! The REST API is split by concern so each component depends only on the
//! calls it makes. Implementations must be shareable across tasks
//! (`Send + Sync`); components hold them as `Arc<dyn ...>`.

use async_trait::async_trait;

use crate::certificate::CertificateId;
use crate::error::Result;
use crate::forms::{CourseDraft, LessonDraft, QuestionDraft, QuizDraft};
use crate::model::{
    Ack, AttemptRecord, AttemptRequest, AttemptResult, AuthResponse, Certificate,
    CertificateDownload, CertificateVerification, Course, CourseAnalytics, CourseProgressDetail,
    Credentials, Enrollment, InstructorDashboard, Lesson, OverallProgress, Question, Quiz,
    Registration, RegenerateResponse, StudentDashboard, StudentProgressReports, User,
};

/// Login, registration and logout.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /login/`; stores the session on success.
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse>;

    /// `POST /register/`; stores the session on success.
    async fn register(&self, registration: &Registration) -> Result<AuthResponse>;

    /// `POST /logout/`; the local session is cleared even if the call fails.
    async fn logout(&self) -> Result<()>;

    /// The user of the stored session, if any.
    async fn current_user(&self) -> Option<User>;
}

/// Course catalog, authoring and enrollment.
#[async_trait]
pub trait CourseApi: Send + Sync {
    /// `GET /courses/`
    async fn list_courses(&self) -> Result<Vec<Course>>;

    /// `GET /courses/{id}/`
    async fn get_course(&self, course_id: u64) -> Result<Course>;

    /// `POST /courses/`
    async fn create_course(&self, draft: &CourseDraft) -> Result<Course>;

    /// `PUT /courses/{id}/`
    async fn update_course(&self, course_id: u64, draft: &CourseDraft) -> Result<Course>;

    /// `DELETE /courses/{id}/`
    async fn delete_course(&self, course_id: u64) -> Result<()>;

    /// `POST /courses/{id}/enroll/`
    ///
    /// A duplicate enrollment surfaces as `LecternError::AlreadyEnrolled`.
    async fn enroll(&self, course_id: u64) -> Result<Ack>;

    /// `POST /courses/{id}/unenroll/`
    async fn unenroll(&self, course_id: u64) -> Result<Ack>;

    /// `GET /courses/enrolled_courses/`
    async fn enrolled_courses(&self) -> Result<Vec<Course>>;

    /// `GET /courses/available_courses/`
    async fn available_courses(&self) -> Result<Vec<Course>>;
}

/// Lesson retrieval, authoring and completion.
#[async_trait]
pub trait LessonApi: Send + Sync {
    /// `GET /lessons/{id}/`
    async fn get_lesson(&self, lesson_id: u64) -> Result<Lesson>;

    /// `POST /lessons/`
    async fn create_lesson(&self, draft: &LessonDraft) -> Result<Lesson>;

    /// `PATCH /lessons/{id}/`
    async fn update_lesson(&self, lesson_id: u64, draft: &LessonDraft) -> Result<Lesson>;

    /// `DELETE /lessons/{id}/`
    async fn delete_lesson(&self, lesson_id: u64) -> Result<()>;

    /// `POST /lessons/{id}/mark_complete/`
    async fn mark_complete(&self, lesson_id: u64) -> Result<Ack>;
}

/// Progress and enrollment listings.
#[async_trait]
pub trait ProgressApi: Send + Sync {
    /// `GET /course-progress/{courseId}/`
    async fn course_progress(&self, course_id: u64) -> Result<CourseProgressDetail>;

    /// `GET /course-progress/overall/`
    async fn overall_progress(&self) -> Result<OverallProgress>;

    /// `POST /lesson-progress/{lessonId}/reset/`
    async fn reset_lesson_progress(&self, lesson_id: u64) -> Result<Ack>;

    /// `GET /enrollments/`
    async fn enrollments(&self) -> Result<Vec<Enrollment>>;

    /// `GET /dashboard/student/`
    async fn student_dashboard(&self) -> Result<StudentDashboard>;
}

/// Quiz retrieval, authoring and attempts.
#[async_trait]
pub trait QuizApi: Send + Sync {
    /// `GET /quizzes/{id}/`
    async fn get_quiz(&self, quiz_id: u64) -> Result<Quiz>;

    /// `POST /quizzes/`
    async fn create_quiz(&self, draft: &QuizDraft) -> Result<Quiz>;

    /// `POST /questions/`
    async fn create_question(&self, draft: &QuestionDraft) -> Result<Question>;

    /// `POST /quizzes/{id}/attempt/`
    async fn submit_attempt(&self, quiz_id: u64, request: &AttemptRequest) -> Result<AttemptResult>;

    /// `GET /quiz-attempts/quiz/{id}/history/`
    async fn attempt_history(&self, quiz_id: u64) -> Result<Vec<AttemptRecord>>;
}

/// Certificate listing, verification and regeneration.
#[async_trait]
pub trait CertificateApi: Send + Sync {
    /// `GET /certificates/`
    async fn list_certificates(&self) -> Result<Vec<Certificate>>;

    /// `GET /certificates/{id}/`
    async fn get_certificate(&self, id: u64) -> Result<Certificate>;

    /// `GET /certificates/verify/{certificateId}/`
    ///
    /// Unknown ids may come back as `valid: false` or as a 404; callers that
    /// need the never-failing behaviour use [`crate::certificate::verify`].
    async fn verify_certificate(&self, certificate_id: &CertificateId)
        -> Result<CertificateVerification>;

    /// `GET /certificates/{id}/download/`
    ///
    /// Callers that want a file either way use [`crate::certificate::download`].
    async fn download_certificate(&self, id: u64) -> Result<CertificateDownload>;

    /// `POST /certificates/regenerate/`
    async fn regenerate_certificate(&self, course_id: u64) -> Result<RegenerateResponse>;
}

/// Instructor dashboards and reports.
#[async_trait]
pub trait InstructorApi: Send + Sync {
    /// `GET /dashboard/instructor/`
    async fn instructor_dashboard(&self) -> Result<InstructorDashboard>;

    /// `GET /student-progress-reports/`
    async fn student_progress_reports(&self) -> Result<StudentProgressReports>;

    /// `GET /courses/{id}/analytics/`
    async fn course_analytics(&self, course_id: u64) -> Result<CourseAnalytics>;
}

