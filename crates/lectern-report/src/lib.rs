//! Lectern Report Generation
//!
//! Types and generators for the two reports the Lectern client produces:
//! a learner's progress report and an instructor's course report. Both can
//! be serialized to JSON or rendered to Markdown.
//!
//! # Types
//!
//! - [`ProgressReport`] - A learner's courses, progress and certificates
//! - [`InstructorReport`] - Per-course student progress and analytics
//! - [`PerformanceBand`] - Completion-rate band used to flag courses
//!
//! # Generators
//!
//! - [`json::JsonGenerator`] - Compact or pretty JSON
//! - [`ProgressMarkdown`] and [`InstructorMarkdown`] - Markdown documents
//!
//! # Example
//!
//! ```rust
//! use lectern_report::{CourseRow, LearnerSummary, ProgressReport, ProgressMarkdown};
//!
//! let report = ProgressReport::builder()
//!     .student("Ada Lovelace")
//!     .summary(LearnerSummary {
//!         total_courses: 1,
//!         completed_courses: 0,
//!         in_progress_courses: 1,
//!         average_progress: 50.0,
//!         completion_rate: 0,
//!         total_certificates: 0,
//!     })
//!     .course(CourseRow {
//!         course_id: 7,
//!         title: "Rust Basics".to_string(),
//!         completed_lessons: 2,
//!         total_lessons: 4,
//!         progress_percentage: 50.0,
//!         completed: false,
//!         has_certificate: false,
//!     })
//!     .build()
//!     .unwrap();
//!
//! let markdown = ProgressMarkdown::new(&report).generate();
//! assert!(markdown.contains("# Learning Progress: Ada Lovelace"));
//! ```

pub mod json;
mod markdown;

pub use markdown::{InstructorMarkdown, ProgressMarkdown};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Failed to serialize the report to JSON.
    #[error("failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failed to write the report file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The report data is inconsistent.
    #[error("invalid report data: {0}")]
    InvalidData(String),
}

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

// ============================================================================
// Performance Band
// ============================================================================

/// Completion-rate band of a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceBand {
    /// 80% and above.
    High,
    /// 50% up to 80%.
    Medium,
    /// Below 50%.
    Low,
}

impl PerformanceBand {
    /// Band for a completion rate in percent.
    ///
    /// # Examples
    ///
    /// ```
    /// use lectern_report::PerformanceBand;
    ///
    /// assert_eq!(PerformanceBand::from_rate(80.0), PerformanceBand::High);
    /// assert_eq!(PerformanceBand::from_rate(79.9), PerformanceBand::Medium);
    /// assert_eq!(PerformanceBand::from_rate(12.0), PerformanceBand::Low);
    /// ```
    #[must_use]
    pub fn from_rate(rate: f64) -> Self {
        if rate >= 80.0 {
            Self::High
        } else if rate >= 50.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Label shown in reports.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl std::fmt::Display for PerformanceBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ============================================================================
// Progress Report
// ============================================================================

/// A learner's progress across enrolled courses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressReport {
    /// Learner display name.
    pub student: String,

    /// When the report was produced.
    pub generated_at: DateTime<Utc>,

    /// Aggregate numbers.
    pub summary: LearnerSummary,

    /// One row per enrolled course.
    pub courses: Vec<CourseRow>,

    /// Certificates held.
    pub certificates: Vec<CertificateRow>,
}

impl ProgressReport {
    /// Creates a new report builder.
    #[must_use]
    pub fn builder() -> ProgressReportBuilder {
        ProgressReportBuilder::default()
    }

    /// Serializes the report to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Serialization` if JSON serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(ReportError::from)
    }
}

/// Aggregate numbers of a progress report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearnerSummary {
    /// Enrolled courses.
    pub total_courses: u32,
    /// Completed courses.
    pub completed_courses: u32,
    /// Courses not yet completed.
    pub in_progress_courses: u32,
    /// Unweighted mean progress in percent.
    pub average_progress: f64,
    /// `round(completed / total * 100)`.
    pub completion_rate: u32,
    /// Certificates held.
    pub total_certificates: u32,
}

/// Progress in one course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRow {
    /// Course id.
    pub course_id: u64,
    /// Course title.
    pub title: String,
    /// Lessons completed.
    pub completed_lessons: u32,
    /// Lessons in the course.
    pub total_lessons: u32,
    /// Progress in percent.
    pub progress_percentage: f64,
    /// Whether every lesson is complete.
    pub completed: bool,
    /// Whether a certificate was issued.
    pub has_certificate: bool,
}

impl CourseRow {
    /// Short status label.
    #[must_use]
    pub const fn status(&self) -> &'static str {
        if self.completed {
            "Completed"
        } else if self.completed_lessons > 0 {
            "In progress"
        } else {
            "Not started"
        }
    }
}

/// One held certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRow {
    /// Public certificate id.
    pub certificate_id: String,
    /// Course title.
    pub course_title: String,
    /// Issue time.
    pub issued_at: Option<DateTime<Utc>>,
}

/// Builder for [`ProgressReport`].
#[derive(Debug, Clone, Default)]
pub struct ProgressReportBuilder {
    student: Option<String>,
    generated_at: Option<DateTime<Utc>>,
    summary: Option<LearnerSummary>,
    courses: Vec<CourseRow>,
    certificates: Vec<CertificateRow>,
}

impl ProgressReportBuilder {
    /// Sets the learner name.
    #[must_use]
    pub fn student(mut self, name: impl Into<String>) -> Self {
        self.student = Some(name.into());
        self
    }

    /// Sets the generation time; defaults to now.
    #[must_use]
    pub const fn generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = Some(at);
        self
    }

    /// Sets the summary.
    #[must_use]
    pub fn summary(mut self, summary: LearnerSummary) -> Self {
        self.summary = Some(summary);
        self
    }

    /// Adds a course row.
    #[must_use]
    pub fn course(mut self, row: CourseRow) -> Self {
        self.courses.push(row);
        self
    }

    /// Sets all course rows.
    #[must_use]
    pub fn courses(mut self, rows: Vec<CourseRow>) -> Self {
        self.courses = rows;
        self
    }

    /// Sets all certificates.
    #[must_use]
    pub fn certificates(mut self, rows: Vec<CertificateRow>) -> Self {
        self.certificates = rows;
        self
    }

    /// Builds the report.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidData` if the learner or summary is
    /// missing, the summary's course count disagrees with the rows, or a row
    /// claims more completed lessons than it has.
    pub fn build(self) -> Result<ProgressReport> {
        let student = self
            .student
            .ok_or_else(|| ReportError::InvalidData("student is required".to_string()))?;
        let summary = self
            .summary
            .ok_or_else(|| ReportError::InvalidData("summary is required".to_string()))?;

        if usize::try_from(summary.total_courses).ok() != Some(self.courses.len()) {
            return Err(ReportError::InvalidData(format!(
                "summary lists {} courses but {} rows were given",
                summary.total_courses,
                self.courses.len()
            )));
        }
        if let Some(row) = self
            .courses
            .iter()
            .find(|r| r.completed_lessons > r.total_lessons)
        {
            return Err(ReportError::InvalidData(format!(
                "course {} has {} of {} lessons completed",
                row.course_id, row.completed_lessons, row.total_lessons
            )));
        }

        Ok(ProgressReport {
            student,
            generated_at: self.generated_at.unwrap_or_else(Utc::now),
            summary,
            courses: self.courses,
            certificates: self.certificates,
        })
    }
}

// ============================================================================
// Instructor Report
// ============================================================================

/// Student progress across an instructor's courses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructorReport {
    /// Instructor display name.
    pub instructor: String,

    /// When the report was produced.
    pub generated_at: DateTime<Utc>,

    /// Totals across all courses.
    pub totals: InstructorTotals,

    /// One section per course.
    pub courses: Vec<CourseSection>,
}

impl InstructorReport {
    /// Creates a report stamped now.
    #[must_use]
    pub fn new(
        instructor: impl Into<String>,
        totals: InstructorTotals,
        courses: Vec<CourseSection>,
    ) -> Self {
        Self {
            instructor: instructor.into(),
            generated_at: Utc::now(),
            totals,
            courses,
        }
    }

    /// Replaces the generation time.
    #[must_use]
    pub const fn with_generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = at;
        self
    }

    /// Number of courses in each band.
    #[must_use]
    pub fn band_counts(&self) -> BandCounts {
        let mut counts = BandCounts::default();
        for course in &self.courses {
            match course.band() {
                PerformanceBand::High => counts.high += 1,
                PerformanceBand::Medium => counts.medium += 1,
                PerformanceBand::Low => counts.low += 1,
            }
        }
        counts
    }
}

/// Course counts by band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BandCounts {
    /// High band.
    pub high: usize,
    /// Medium band.
    pub medium: usize,
    /// Low band.
    pub low: usize,
}

/// Totals across an instructor's courses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructorTotals {
    /// Courses.
    pub total_courses: u32,
    /// Distinct students.
    pub total_students: u32,
    /// Enrollments.
    pub total_enrollments: u32,
    /// Certificates issued.
    pub total_certificates: u32,
}

/// Report section for one course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseSection {
    /// Course id.
    pub course_id: u64,
    /// Title.
    pub title: String,
    /// Enrolled students.
    pub total_students: u32,
    /// Students who completed.
    pub completed_students: u32,
    /// Completion rate in percent.
    pub completion_rate: f64,
    /// Mean progress in percent.
    pub average_progress: f64,
    /// Mean quiz score, if any quiz was taken.
    pub average_quiz_score: Option<f64>,
    /// Student rows.
    pub students: Vec<StudentRow>,
    /// Analytics, when fetched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analytics: Option<AnalyticsSummary>,
}

impl CourseSection {
    /// Completion-rate band.
    #[must_use]
    pub fn band(&self) -> PerformanceBand {
        PerformanceBand::from_rate(self.completion_rate)
    }
}

/// One student in a course section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRow {
    /// Display name.
    pub name: String,
    /// Login name.
    pub username: String,
    /// Progress in percent.
    pub progress_percentage: f64,
    /// Whether the course is complete.
    pub completed: bool,
    /// Mean quiz score.
    pub avg_quiz_score: Option<f64>,
    /// Last activity.
    pub last_activity: Option<DateTime<Utc>>,
}

/// Condensed course analytics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    /// Students per progress bucket, ascending.
    pub distribution: Vec<DistributionBucket>,
    /// Recently active students.
    pub active_students: u32,
    /// Inactive students.
    pub inactive_students: u32,
    /// Active share in percent.
    pub activity_rate: f64,
    /// Per-quiz performance.
    pub quizzes: Vec<QuizRow>,
}

/// One progress bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionBucket {
    /// Bucket label, e.g. `26-50%`.
    pub label: String,
    /// Students in the bucket.
    pub count: u32,
}

/// Performance of one quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizRow {
    /// Quiz title.
    pub title: String,
    /// Questions.
    pub total_questions: u32,
    /// Mean score in percent.
    pub average_score: f64,
    /// Pass rate in percent.
    pub pass_rate: f64,
}

// ============================================================================
// Tests
// ============================================================================
