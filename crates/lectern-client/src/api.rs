//! Backend trait implementations over [`HttpClient`].

use async_trait::async_trait;
use lectern_core::backend::{
    AuthApi, CertificateApi, CourseApi, InstructorApi, LessonApi, ProgressApi, QuizApi,
};
use lectern_core::certificate::CertificateId;
use lectern_core::events::{LearnerEvent, SessionEndReason};
use lectern_core::forms::{
    validate_credentials, validate_registration, CourseDraft, LessonDraft, QuestionDraft, QuizDraft,
};
use lectern_core::model::{
    Ack, AttemptRecord, AttemptRequest, AttemptResult, AuthResponse, Certificate,
    CertificateDownload, CertificateVerification, Course, CourseAnalytics, CourseProgressDetail,
    Credentials, Enrollment, InstructorDashboard, Lesson, OverallProgress, Question, Quiz,
    Registration, RegenerateResponse, StudentDashboard, StudentProgressReports, User,
};
use lectern_core::{LecternError, Result};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::http::{Auth, HttpClient};
use crate::session::Session;

impl HttpClient {
    async fn start_session(&self, auth: &AuthResponse) -> Result<()> {
        self.session().set(Session::from(auth.clone())).await?;
        info!(user = %auth.user.username, role = %auth.user.role, "Logged in");
        Ok(())
    }
}

// ============================================================================
// Auth
// ============================================================================

#[async_trait]
impl AuthApi for HttpClient {
    #[instrument(skip_all, fields(username = %credentials.username))]
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse> {
        validate_credentials(credentials)?;
        let auth: AuthResponse = self.post("/login/", credentials, Auth::Anonymous).await?;
        self.start_session(&auth).await?;
        Ok(auth)
    }

    #[instrument(skip_all, fields(username = %registration.username))]
    async fn register(&self, registration: &Registration) -> Result<AuthResponse> {
        validate_registration(registration)?;
        let auth: AuthResponse = self
            .post("/register/", registration, Auth::Anonymous)
            .await?;
        self.start_session(&auth).await?;
        Ok(auth)
    }

    async fn logout(&self) -> Result<()> {
        if let Some(refresh) = self.session().refresh_token().await {
            let body = json!({ "refresh": refresh });
            if let Err(e) = self.post_action("/logout/", Some(body)).await {
                warn!(error = %e, "Logout request failed; clearing local session anyway");
            }
        }
        self.session().clear().await?;
        if let Some(events) = self.events() {
            events.send(LearnerEvent::session_ended(SessionEndReason::Logout));
        }
        info!("Logged out");
        Ok(())
    }

    async fn current_user(&self) -> Option<User> {
        self.session().user().await
    }
}

// ============================================================================
// Courses
// ============================================================================

#[async_trait]
impl CourseApi for HttpClient {
    async fn list_courses(&self) -> Result<Vec<Course>> {
        self.get("/courses/").await
    }

    async fn get_course(&self, course_id: u64) -> Result<Course> {
        self.get(&format!("/courses/{course_id}/")).await
    }

    async fn create_course(&self, draft: &CourseDraft) -> Result<Course> {
        let draft = draft.validated()?;
        self.post("/courses/", &draft, Auth::Bearer).await
    }

    async fn update_course(&self, course_id: u64, draft: &CourseDraft) -> Result<Course> {
        let draft = draft.validated()?;
        self.put(&format!("/courses/{course_id}/"), &draft).await
    }

    async fn delete_course(&self, course_id: u64) -> Result<()> {
        self.delete(&format!("/courses/{course_id}/")).await
    }

    #[instrument(skip(self))]
    async fn enroll(&self, course_id: u64) -> Result<Ack> {
        self.post_action(&format!("/courses/{course_id}/enroll/"), None)
            .await
            .map_err(|e| {
                if e.is_duplicate_enrollment() {
                    LecternError::AlreadyEnrolled { course_id }
                } else {
                    e
                }
            })
    }

    #[instrument(skip(self))]
    async fn unenroll(&self, course_id: u64) -> Result<Ack> {
        self.post_action(&format!("/courses/{course_id}/unenroll/"), None)
            .await
    }

    async fn enrolled_courses(&self) -> Result<Vec<Course>> {
        self.get("/courses/enrolled_courses/").await
    }

    async fn available_courses(&self) -> Result<Vec<Course>> {
        self.get("/courses/available_courses/").await
    }
}

// ============================================================================
// Lessons
// ============================================================================

#[async_trait]
impl LessonApi for HttpClient {
    async fn get_lesson(&self, lesson_id: u64) -> Result<Lesson> {
        self.get(&format!("/lessons/{lesson_id}/")).await
    }

    async fn create_lesson(&self, draft: &LessonDraft) -> Result<Lesson> {
        draft.validate()?;
        self.post("/lessons/", draft, Auth::Bearer).await
    }

    async fn update_lesson(&self, lesson_id: u64, draft: &LessonDraft) -> Result<Lesson> {
        draft.validate()?;
        self.patch(&format!("/lessons/{lesson_id}/"), draft).await
    }

    async fn delete_lesson(&self, lesson_id: u64) -> Result<()> {
        self.delete(&format!("/lessons/{lesson_id}/")).await
    }

    #[instrument(skip(self))]
    async fn mark_complete(&self, lesson_id: u64) -> Result<Ack> {
        self.post_action(&format!("/lessons/{lesson_id}/mark_complete/"), None)
            .await
    }
}

// ============================================================================
// Progress
// ============================================================================

#[async_trait]
impl ProgressApi for HttpClient {
    async fn course_progress(&self, course_id: u64) -> Result<CourseProgressDetail> {
        self.get(&format!("/course-progress/{course_id}/")).await
    }

    async fn overall_progress(&self) -> Result<OverallProgress> {
        self.get("/course-progress/overall/").await
    }

    async fn reset_lesson_progress(&self, lesson_id: u64) -> Result<Ack> {
        self.post_action(&format!("/lesson-progress/{lesson_id}/reset/"), None)
            .await
    }

    async fn enrollments(&self) -> Result<Vec<Enrollment>> {
        self.get("/enrollments/").await
    }

    async fn student_dashboard(&self) -> Result<StudentDashboard> {
        self.get("/dashboard/student/").await
    }
}

// ============================================================================
// Quizzes
// ============================================================================

#[async_trait]
impl QuizApi for HttpClient {
    async fn get_quiz(&self, quiz_id: u64) -> Result<Quiz> {
        self.get(&format!("/quizzes/{quiz_id}/")).await
    }

    async fn create_quiz(&self, draft: &QuizDraft) -> Result<Quiz> {
        draft.validate()?;
        self.post("/quizzes/", draft, Auth::Bearer).await
    }

    async fn create_question(&self, draft: &QuestionDraft) -> Result<Question> {
        draft.validate()?;
        self.post("/questions/", draft, Auth::Bearer).await
    }

    #[instrument(skip(self, request), fields(answers = request.answers.len()))]
    async fn submit_attempt(&self, quiz_id: u64, request: &AttemptRequest) -> Result<AttemptResult> {
        self.post(&format!("/quizzes/{quiz_id}/attempt/"), request, Auth::Bearer)
            .await
    }

    async fn attempt_history(&self, quiz_id: u64) -> Result<Vec<AttemptRecord>> {
        self.get(&format!("/quiz-attempts/quiz/{quiz_id}/history/"))
            .await
    }
}

// ============================================================================
// Certificates
// ============================================================================

#[async_trait]
impl CertificateApi for HttpClient {
    async fn list_certificates(&self) -> Result<Vec<Certificate>> {
        self.get("/certificates/").await
    }

    async fn get_certificate(&self, id: u64) -> Result<Certificate> {
        self.get(&format!("/certificates/{id}/")).await
    }

    async fn verify_certificate(
        &self,
        certificate_id: &CertificateId,
    ) -> Result<CertificateVerification> {
        self.get_anonymous(&format!("/certificates/verify/{certificate_id}/"))
            .await
    }

    async fn download_certificate(&self, id: u64) -> Result<CertificateDownload> {
        self.get(&format!("/certificates/{id}/download/")).await
    }

    #[instrument(skip(self))]
    async fn regenerate_certificate(&self, course_id: u64) -> Result<RegenerateResponse> {
        self.post(
            "/certificates/regenerate/",
            &json!({ "course_id": course_id }),
            Auth::Bearer,
        )
        .await
    }
}

// ============================================================================
// Instructor
// ============================================================================

#[async_trait]
impl InstructorApi for HttpClient {
    async fn instructor_dashboard(&self) -> Result<InstructorDashboard> {
        self.get("/dashboard/instructor/").await
    }

    async fn student_progress_reports(&self) -> Result<StudentProgressReports> {
        self.get("/student-progress-reports/").await
    }

    async fn course_analytics(&self, course_id: u64) -> Result<CourseAnalytics> {
        self.get(&format!("/courses/{course_id}/analytics/")).await
    }
}
