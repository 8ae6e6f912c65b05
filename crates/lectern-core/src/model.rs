//! Wire-level data types exchanged with the LMS backend.
//!
//! Field names follow the backend's snake_case JSON. Payloads from the
//! backend are frequently partial, so most non-key fields carry
//! `#[serde(default)]`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::progress::progress_percentage;

// ============================================================================
// Users
// ============================================================================

/// Role of an authenticated user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Learner; may enroll, take quizzes, earn certificates.
    #[default]
    Student,
    /// Course author; sees analytics and student reports.
    Instructor,
    /// Site administrator.
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Student => write!(f, "student"),
            Self::Instructor => write!(f, "instructor"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

/// The logged-in user as returned by login/register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Backend id.
    pub id: u64,
    /// Login name.
    pub username: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
    /// Role.
    #[serde(default)]
    pub role: Role,
}

impl User {
    /// Display name, falling back to the username.
    #[must_use]
    pub fn display_name(&self) -> String {
        full_name(&self.first_name, &self.last_name).unwrap_or_else(|| self.username.clone())
    }

    /// Returns `true` for student accounts.
    #[must_use]
    pub fn is_student(&self) -> bool {
        self.role == Role::Student
    }
}

/// Embedded user summary (instructor or student inside another payload).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    /// Backend id.
    pub id: u64,
    /// Login name.
    #[serde(default)]
    pub username: String,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
}

impl UserSummary {
    /// Display name, falling back to the username.
    #[must_use]
    pub fn display_name(&self) -> String {
        full_name(&self.first_name, &self.last_name).unwrap_or_else(|| self.username.clone())
    }
}

/// A reference to a user: a bare id or an embedded summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserRef {
    /// Bare id.
    Id(u64),
    /// Embedded summary.
    Summary(UserSummary),
}

impl UserRef {
    /// The referenced user's id.
    #[must_use]
    pub const fn id(&self) -> u64 {
        match self {
            Self::Id(id) => *id,
            Self::Summary(s) => s.id,
        }
    }

    /// The embedded summary, if the backend sent one.
    #[must_use]
    pub const fn summary(&self) -> Option<&UserSummary> {
        match self {
            Self::Id(_) => None,
            Self::Summary(s) => Some(s),
        }
    }
}

fn full_name(first: &str, last: &str) -> Option<String> {
    let name = format!("{} {}", first.trim(), last.trim());
    let name = name.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

// ============================================================================
// Auth payloads
// ============================================================================

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Login name.
    pub username: String,
    /// Password.
    pub password: String,
}

/// Registration request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    /// Login name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Requested role.
    pub role: Role,
    /// Password.
    pub password: String,
    /// Password confirmation.
    pub password2: String,
}

/// Response to login and register.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The authenticated user.
    pub user: User,
    /// Short-lived bearer token.
    pub access: String,
    /// Long-lived refresh token.
    pub refresh: String,
}

/// Response to a token refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    /// The new access token.
    pub access: String,
}

/// Generic `{message}` acknowledgement returned by action endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ack {
    /// Human-readable message, if any.
    #[serde(default)]
    pub message: Option<String>,
}

// ============================================================================
// Courses
// ============================================================================

/// Difficulty level of a course.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseLevel {
    /// Entry level.
    #[default]
    Beginner,
    /// Some prior knowledge expected.
    Intermediate,
    /// Expert level.
    Advanced,
}

impl CourseLevel {
    /// Parses a level name, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Some(Self::Beginner),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            _ => None,
        }
    }
}

impl std::fmt::Display for CourseLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Beginner => write!(f, "beginner"),
            Self::Intermediate => write!(f, "intermediate"),
            Self::Advanced => write!(f, "advanced"),
        }
    }
}

/// A course as listed in the catalog or fetched in detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    /// Backend id.
    pub id: u64,
    /// Title.
    pub title: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Category label.
    #[serde(default)]
    pub category: String,
    /// Difficulty level.
    #[serde(default)]
    pub level: CourseLevel,
    /// Advertised duration in hours.
    #[serde(default)]
    pub duration_hours: f64,
    /// Price; 0 means free.
    #[serde(default)]
    pub price: f64,
    /// Whether students can see the course.
    #[serde(default)]
    pub is_published: bool,
    /// Course author.
    #[serde(default)]
    pub instructor: Option<UserRef>,
    /// Number of lessons.
    #[serde(default)]
    pub total_lessons: u32,
    /// Number of enrolled students.
    #[serde(default)]
    pub total_students: u32,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Whether the current user is enrolled.
    #[serde(default)]
    pub is_enrolled: bool,
    /// Bullet list of outcomes.
    #[serde(default)]
    pub learning_outcomes: Vec<String>,
    /// Lessons, present on the detail endpoint.
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

impl Course {
    /// Id of the instructor, if known.
    #[must_use]
    pub fn instructor_id(&self) -> Option<u64> {
        self.instructor.as_ref().map(UserRef::id)
    }
}

/// A reference to a course: a bare id or an embedded summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CourseRef {
    /// Bare id.
    Id(u64),
    /// Embedded summary.
    Summary(CourseSummary),
}

impl CourseRef {
    /// The referenced course's id.
    #[must_use]
    pub const fn id(&self) -> u64 {
        match self {
            Self::Id(id) => *id,
            Self::Summary(s) => s.id,
        }
    }

    /// The course title, if embedded.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        match self {
            Self::Id(_) => None,
            Self::Summary(s) => Some(s.title.as_str()),
        }
    }
}

/// Minimal embedded course.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseSummary {
    /// Backend id.
    pub id: u64,
    /// Title.
    #[serde(default)]
    pub title: String,
    /// Instructor, when embedded.
    #[serde(default)]
    pub instructor: Option<UserRef>,
}

// ============================================================================
// Lessons
// ============================================================================

/// Kind of lesson content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// Plain text.
    #[default]
    Text,
    /// Video with a URL.
    Video,
    /// Lesson that is a quiz.
    Quiz,
    /// Hand-in assignment.
    Assignment,
}

impl ContentType {
    /// Parses a content type name, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" => Some(Self::Text),
            "video" => Some(Self::Video),
            "quiz" => Some(Self::Quiz),
            "assignment" => Some(Self::Assignment),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Video => write!(f, "video"),
            Self::Quiz => write!(f, "quiz"),
            Self::Assignment => write!(f, "assignment"),
        }
    }
}

/// The learner's standing on a lesson's quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonQuizStatus {
    /// Quiz id.
    pub id: u64,
    /// Title.
    #[serde(default)]
    pub title: String,
    /// Whether the learner has passed.
    #[serde(default)]
    pub passed: bool,
    /// Attempts still available.
    #[serde(default)]
    pub attempts_remaining: u32,
    /// Best score so far.
    #[serde(default)]
    pub best_score: Option<f64>,
}

/// Per-lesson progress record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonProgress {
    /// Student id.
    #[serde(default)]
    pub student: Option<u64>,
    /// Lesson id.
    #[serde(default)]
    pub lesson: Option<u64>,
    /// Whether the lesson is complete.
    #[serde(default)]
    pub completed: bool,
    /// Last access.
    #[serde(default)]
    pub last_accessed: Option<DateTime<Utc>>,
    /// Completion time.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// A lesson inside a course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    /// Backend id.
    pub id: u64,
    /// Owning course.
    #[serde(default)]
    pub course: Option<CourseRef>,
    /// Title.
    pub title: String,
    /// Short description.
    #[serde(default)]
    pub description: String,
    /// Kind of content.
    #[serde(default)]
    pub content_type: ContentType,
    /// Body (text, markdown, or instructions).
    #[serde(default)]
    pub content: String,
    /// Position within the course.
    #[serde(default)]
    pub order: i32,
    /// Estimated duration.
    #[serde(default)]
    pub duration_minutes: u32,
    /// Attached quiz and the learner's standing on it.
    #[serde(default)]
    pub quiz: Option<LessonQuizStatus>,
    /// Video URL for video lessons.
    #[serde(default)]
    pub video_url: Option<String>,
    /// Attachment URL.
    #[serde(default)]
    pub attachment: Option<String>,
    /// Whether the lesson is visible.
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// The learner's progress on this lesson.
    #[serde(default)]
    pub progress: Option<LessonProgress>,
}

impl Lesson {
    /// Returns `true` if the learner has completed this lesson.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.progress.as_ref().is_some_and(|p| p.completed)
    }
}

const fn default_true() -> bool {
    true
}

/// A student's enrollment in a course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    /// Backend id.
    pub id: u64,
    /// Student.
    #[serde(default)]
    pub student: Option<UserRef>,
    /// Course.
    pub course: CourseRef,
    /// Enrollment time.
    #[serde(default)]
    pub enrolled_at: Option<DateTime<Utc>>,
    /// Whether every lesson is complete.
    #[serde(default)]
    pub completed: bool,
    /// Completion time.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Lessons completed.
    #[serde(default)]
    pub completed_lessons: u32,
    /// Lessons in the course.
    #[serde(default)]
    pub total_lessons: u32,
}

impl Enrollment {
    /// Progress derived from the lesson counts.
    #[must_use]
    pub fn progress_percentage(&self) -> f64 {
        progress_percentage(self.completed_lessons, self.total_lessons)
    }
}

// ============================================================================
// Quizzes
// ============================================================================

/// One of the four answer options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AnswerChoice {
    /// Option A.
    A,
    /// Option B.
    B,
    /// Option C.
    C,
    /// Option D.
    D,
}

impl AnswerChoice {
    /// All choices in display order.
    pub const ALL: [Self; 4] = [Self::A, Self::B, Self::C, Self::D];

    /// Parses a single letter, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            "C" => Some(Self::C),
            "D" => Some(Self::D),
            _ => None,
        }
    }

    /// The letter as a string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

impl std::fmt::Display for AnswerChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const fn default_points() -> u32 {
    1
}

/// A multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Backend id.
    pub id: u64,
    /// Prompt.
    pub question_text: String,
    /// Option A.
    pub option_a: String,
    /// Option B.
    pub option_b: String,
    /// Option C.
    pub option_c: String,
    /// Option D.
    pub option_d: String,
    /// Correct answer; hidden from students by the backend.
    #[serde(default)]
    pub correct_answer: Option<AnswerChoice>,
    /// Weight of the question.
    #[serde(default = "default_points")]
    pub points: u32,
    /// Shown after submission.
    #[serde(default)]
    pub explanation: Option<String>,
}

impl Question {
    /// Text of the given option.
    #[must_use]
    pub fn option(&self, choice: AnswerChoice) -> &str {
        match choice {
            AnswerChoice::A => &self.option_a,
            AnswerChoice::B => &self.option_b,
            AnswerChoice::C => &self.option_c,
            AnswerChoice::D => &self.option_d,
        }
    }
}

/// A quiz with its questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    /// Backend id.
    pub id: u64,
    /// Lesson the quiz belongs to.
    #[serde(default)]
    pub lesson: Option<u64>,
    /// Title.
    pub title: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Instructions shown before starting.
    #[serde(default)]
    pub instructions: String,
    /// Percentage needed to pass.
    pub passing_score: f64,
    /// Attempts allowed in total.
    pub max_attempts: u32,
    /// Countdown length in minutes; `None` means untimed.
    #[serde(default)]
    pub time_limit_minutes: Option<u32>,
    /// Attempts still available to the current learner.
    pub attempts_remaining: u32,
    /// Best score so far.
    #[serde(default)]
    pub best_score: Option<f64>,
    /// Questions in display order.
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// One `{question_id, answer}` pair in a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSubmission {
    /// Question id.
    pub question_id: u64,
    /// Selected option.
    pub answer: AnswerChoice,
}

/// Body of `POST /quizzes/{id}/attempt/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRequest {
    /// Answered questions in question order.
    pub answers: Vec<AnswerSubmission>,
}

/// Grading of a single question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResult {
    /// Question id.
    #[serde(default)]
    pub question_id: Option<u64>,
    /// Prompt.
    pub question_text: String,
    /// What the learner chose; `None` when unanswered.
    #[serde(default)]
    pub user_answer: Option<AnswerChoice>,
    /// The correct option.
    pub correct_answer: AnswerChoice,
    /// Whether the learner was right.
    pub is_correct: bool,
    /// Explanation, if any.
    #[serde(default)]
    pub explanation: Option<String>,
}

/// Result of a graded attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptResult {
    /// Score in percent.
    pub score: f64,
    /// `score >= passing_score`.
    pub passed: bool,
    /// Number of correct answers.
    pub correct_answers: u32,
    /// Number of questions in the quiz.
    pub total_questions: u32,
    /// 1-based attempt number.
    pub attempt_number: u32,
    /// `max_attempts - attempts_taken`.
    pub remaining_attempts: u32,
    /// Per-question grading.
    #[serde(default)]
    pub results: Vec<QuestionResult>,
}

/// A past attempt as listed in the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Backend id.
    pub id: u64,
    /// 1-based attempt number.
    pub attempt_number: u32,
    /// Score in percent.
    pub score: f64,
    /// Whether it passed.
    pub passed: bool,
    /// Start time.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    /// Submission time.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Certificates
// ============================================================================

/// A completion certificate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    /// Backend id.
    pub id: u64,
    /// Public token, `CERT-` followed by 12 hex characters.
    pub certificate_id: String,
    /// Course.
    pub course: CourseSummary,
    /// Holder.
    pub student: UserSummary,
    /// Issue time.
    #[serde(default)]
    pub issued_at: Option<DateTime<Utc>>,
    /// Download URL, if rendered.
    #[serde(default)]
    pub pdf_file: Option<String>,
}

/// Response of the public verification endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateVerification {
    /// Whether the id belongs to an issued certificate.
    pub valid: bool,
    /// The certificate, when valid.
    #[serde(default)]
    pub certificate: Option<Certificate>,
    /// Reason, when invalid.
    #[serde(default)]
    pub error: Option<String>,
}

/// Response of `GET /certificates/{id}/download/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificateDownload {
    /// Public token.
    pub certificate_id: Option<String>,
    /// URL of the rendered PDF; absent until the backend renders one.
    pub pdf_file: Option<String>,
}

/// Response of `POST /certificates/regenerate/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegenerateResponse {
    /// Human-readable message.
    #[serde(default)]
    pub message: Option<String>,
    /// The (re)issued certificate.
    #[serde(default)]
    pub certificate: Option<Certificate>,
}

impl CertificateVerification {
    /// Builds an invalid result with the given reason.
    #[must_use]
    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            certificate: None,
            error: Some(error.into()),
        }
    }
}

// ============================================================================
// Progress
// ============================================================================

/// Per-course entry of the overall progress payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseProgressEntry {
    /// Course id.
    pub course_id: u64,
    /// Course title.
    pub course_title: String,
    /// Course description.
    #[serde(default)]
    pub course_description: String,
    /// Enrollment time.
    #[serde(default)]
    pub enrolled_at: Option<DateTime<Utc>>,
    /// Lessons completed.
    pub completed_lessons: u32,
    /// Lessons in the course.
    pub total_lessons: u32,
    /// Percentage reported by the backend.
    #[serde(default)]
    pub progress_percentage: f64,
    /// Completion flag reported by the backend.
    #[serde(default)]
    pub course_completed: bool,
    /// Whether a certificate has been issued.
    #[serde(default)]
    pub has_certificate: bool,
}

/// Summary block of the overall progress payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressSummary {
    /// Enrolled courses.
    pub total_courses: u32,
    /// Completed courses.
    pub completed_courses: u32,
    /// Courses still in progress.
    pub in_progress_courses: u32,
    /// Mean progress across courses.
    pub average_progress: f64,
    /// Certificates held.
    #[serde(default)]
    pub total_certificates: u32,
}

/// Response of `GET /course-progress/overall/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallProgress {
    /// The student.
    #[serde(default)]
    pub student: Option<UserSummary>,
    /// Aggregate numbers.
    #[serde(default)]
    pub summary: ProgressSummary,
    /// Per-course rows.
    #[serde(default)]
    pub course_progress: Vec<CourseProgressEntry>,
}

/// Response of `GET /course-progress/{courseId}/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseProgressDetail {
    /// Course id.
    pub course_id: u64,
    /// Course title.
    #[serde(default)]
    pub course_title: String,
    /// Lessons completed.
    pub completed_lessons: u32,
    /// Lessons in the course.
    pub total_lessons: u32,
    /// Percentage reported by the backend.
    #[serde(default)]
    pub progress_percentage: f64,
    /// Completion flag reported by the backend.
    #[serde(default)]
    pub course_completed: bool,
    /// Per-lesson progress.
    #[serde(default)]
    pub lessons: Vec<LessonProgressRow>,
}

/// One lesson in a course progress detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonProgressRow {
    /// Lesson id.
    pub lesson_id: u64,
    /// Lesson title.
    #[serde(default)]
    pub lesson_title: String,
    /// Whether complete.
    #[serde(default)]
    pub completed: bool,
    /// Completion time.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Instructor analytics
// ============================================================================

/// Instructor dashboard counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstructorStats {
    /// All authored courses.
    pub total_courses: u32,
    /// Published courses.
    pub published_courses: u32,
    /// Draft courses.
    pub draft_courses: u32,
    /// Distinct students.
    pub total_students: u32,
    /// Students active recently.
    pub active_students: u32,
    /// Students enrolled recently.
    pub new_students: u32,
    /// Recent completions.
    pub recent_completions: u32,
    /// Lifetime revenue.
    pub total_revenue: f64,
    /// Revenue this month.
    pub monthly_revenue: f64,
}

/// Response of `GET /dashboard/instructor/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstructorDashboard {
    /// Counters.
    #[serde(default)]
    pub stats: InstructorStats,
    /// Authored courses.
    #[serde(default)]
    pub courses: Vec<Course>,
}

// ============================================================================
// Student dashboard
// ============================================================================

/// Lesson counts nested in a dashboard enrollment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LessonCounts {
    /// Lessons completed.
    pub completed_lessons: u32,
    /// Lessons in the course.
    pub total_lessons: u32,
}

/// An enrollment as listed on the student dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardEnrollment {
    /// Enrollment id.
    #[serde(default)]
    pub id: Option<u64>,
    /// Course.
    pub course: CourseRef,
    /// Percentage reported by the backend.
    #[serde(default)]
    pub progress_percentage: f64,
    /// Lesson counts, when the backend includes them.
    #[serde(default)]
    pub progress: Option<LessonCounts>,
}

impl DashboardEnrollment {
    /// Lesson counts, zero when absent.
    #[must_use]
    pub fn counts(&self) -> LessonCounts {
        self.progress.unwrap_or_default()
    }

    /// Whether the backend reports the course as finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.progress_percentage >= 100.0
    }
}

/// Counters on the student dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentStats {
    /// Enrolled courses.
    pub total_courses: u32,
    /// Completed courses.
    pub completed_courses: u32,
    /// Courses still in progress.
    pub in_progress_courses: u32,
}

/// Response of `GET /dashboard/student/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentDashboard {
    /// The student.
    #[serde(default)]
    pub student: Option<UserSummary>,
    /// Current enrollments.
    #[serde(default)]
    pub enrollments: Vec<DashboardEnrollment>,
    /// Counters.
    #[serde(default)]
    pub stats: StudentStats,
    /// Certificates held.
    #[serde(default)]
    pub certificates: Vec<Certificate>,
}

impl StudentDashboard {
    /// `round(completed / total * 100)`, or 0 with no courses.
    #[must_use]
    pub fn completion_rate(&self) -> u32 {
        crate::progress::completion_rate(self.stats.completed_courses, self.stats.total_courses)
    }
}

/// One student row in a course report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentProgressRow {
    /// Student id.
    pub student_id: u64,
    /// Display name.
    #[serde(default)]
    pub student_name: String,
    /// Login name.
    #[serde(default)]
    pub username: String,
    /// Email.
    #[serde(default)]
    pub email: String,
    /// Enrollment time.
    #[serde(default)]
    pub enrollment_date: Option<DateTime<Utc>>,
    /// Progress in percent.
    #[serde(default)]
    pub progress_percentage: f64,
    /// Whether the course is complete.
    #[serde(default)]
    pub course_completed: bool,
    /// Completion time.
    #[serde(default)]
    pub completion_date: Option<DateTime<Utc>>,
    /// Mean quiz score.
    #[serde(default)]
    pub avg_quiz_score: Option<f64>,
    /// Last activity.
    #[serde(default)]
    pub last_activity: Option<DateTime<Utc>>,
}

/// Per-course student progress report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseReport {
    /// Course id.
    pub course_id: u64,
    /// Course title.
    pub course_title: String,
    /// Enrolled students.
    #[serde(default)]
    pub total_students: u32,
    /// Students who completed.
    #[serde(default)]
    pub completed_students: u32,
    /// Completion rate in percent.
    #[serde(default)]
    pub completion_rate: f64,
    /// Mean progress.
    #[serde(default)]
    pub average_progress: f64,
    /// Mean quiz score.
    #[serde(default)]
    pub average_quiz_score: Option<f64>,
    /// Student rows.
    #[serde(default)]
    pub student_progress: Vec<StudentProgressRow>,
}

/// Totals across an instructor's courses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSummary {
    /// Courses covered.
    pub total_courses: u32,
    /// Distinct students.
    pub total_students: u32,
    /// Enrollments.
    pub total_enrollments: u32,
    /// Certificates issued.
    pub total_certificates: u32,
}

/// Response of `GET /student-progress-reports/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentProgressReports {
    /// Totals.
    #[serde(default)]
    pub summary: ReportSummary,
    /// One report per course.
    #[serde(default)]
    pub course_reports: Vec<CourseReport>,
}

/// Course block of the analytics payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsCourse {
    /// Title.
    pub title: String,
    /// Category.
    pub category: String,
    /// Lessons.
    pub total_lessons: u32,
    /// Students.
    pub total_students: u32,
    /// Completion rate in percent.
    pub completion_rate: f64,
}

/// Students bucketed by progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressDistribution {
    /// 0–25%.
    #[serde(rename = "0-25%")]
    pub quarter: u32,
    /// 26–50%.
    #[serde(rename = "26-50%")]
    pub half: u32,
    /// 51–75%.
    #[serde(rename = "51-75%")]
    pub three_quarters: u32,
    /// 76–99%.
    #[serde(rename = "76-99%")]
    pub almost: u32,
    /// 100%.
    #[serde(rename = "100%")]
    pub complete: u32,
}

impl ProgressDistribution {
    /// Buckets as `(label, count)` pairs in ascending order.
    #[must_use]
    pub fn buckets(&self) -> [(&'static str, u32); 5] {
        [
            ("0-25%", self.quarter),
            ("26-50%", self.half),
            ("51-75%", self.three_quarters),
            ("76-99%", self.almost),
            ("100%", self.complete),
        ]
    }
}

/// Engagement block of the analytics payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Engagement {
    /// Enrolled students.
    pub total_students: u32,
    /// Recently active.
    pub active_students: u32,
    /// Not recently active.
    pub inactive_students: u32,
    /// Active share in percent.
    pub activity_rate: f64,
}

/// Per-quiz performance in the analytics payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizPerformance {
    /// Quiz id.
    pub quiz_id: u64,
    /// Title.
    pub title: String,
    /// Questions.
    pub total_questions: u32,
    /// Mean score.
    pub average_score: f64,
    /// Share of passing attempts in percent.
    pub pass_rate: f64,
}

/// Response of `GET /courses/{id}/analytics/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseAnalytics {
    /// Course block.
    #[serde(default)]
    pub course: AnalyticsCourse,
    /// Progress buckets.
    #[serde(default)]
    pub progress_distribution: ProgressDistribution,
    /// Engagement numbers.
    #[serde(default)]
    pub engagement: Engagement,
    /// Quiz performance.
    #[serde(default)]
    pub quiz_performance: Vec<QuizPerformance>,
}
