//! Markdown rendering of progress and instructor reports.
//!
//! Renderers are pure functions of the report: the footer uses the report's
//! own `generated_at`, so the same report always renders the same text.
//!
//! # Example
//!
//! ```rust
//! use lectern_report::{InstructorMarkdown, InstructorReport, InstructorTotals};
//!
//! let report = InstructorReport::new("Grace Hopper", InstructorTotals::default(), vec![]);
//! let markdown = InstructorMarkdown::new(&report).generate();
//! assert!(markdown.contains("*No courses to report.*"));
//! ```

use chrono::{DateTime, Utc};
use std::fmt::Write;

use crate::{
    AnalyticsSummary, CertificateRow, CourseRow, CourseSection, InstructorReport, ProgressReport,
    StudentRow,
};

// ============================================================================
// Progress report
// ============================================================================

/// Renders a [`ProgressReport`] as Markdown.
pub struct ProgressMarkdown<'a> {
    report: &'a ProgressReport,
}

impl<'a> ProgressMarkdown<'a> {
    /// Creates a renderer for the given report.
    ///
    /// # Example
    ///
    /// ```rust
    /// use lectern_report::{LearnerSummary, ProgressMarkdown, ProgressReport};
    ///
    /// let report = ProgressReport::builder()
    ///     .student("Ada Lovelace")
    ///     .summary(LearnerSummary::default())
    ///     .build()
    ///     .unwrap();
    /// let renderer = ProgressMarkdown::new(&report);
    /// ```
    #[must_use]
    pub const fn new(report: &'a ProgressReport) -> Self {
        Self { report }
    }

    /// Renders the complete document.
    ///
    /// Sections come in a fixed order: summary table, courses, certificates,
    /// then the footer.
    ///
    /// # Example
    ///
    /// ```rust
    /// use lectern_report::{LearnerSummary, ProgressMarkdown, ProgressReport};
    ///
    /// let report = ProgressReport::builder()
    ///     .student("Ada Lovelace")
    ///     .summary(LearnerSummary::default())
    ///     .build()
    ///     .unwrap();
    /// let markdown = ProgressMarkdown::new(&report).generate();
    ///
    /// assert!(markdown.starts_with("# Learning Progress: Ada Lovelace"));
    /// assert!(markdown.contains("*Not enrolled in any course.*"));
    /// assert!(markdown.contains("*No certificates yet.*"));
    /// ```
    #[must_use]
    pub fn generate(&self) -> String {
        let mut output = String::new();

        let _ = writeln!(
            output,
            "# Learning Progress: {}\n",
            escape_markdown(&self.report.student)
        );
        self.write_summary(&mut output);
        self.write_courses(&mut output);
        self.write_certificates(&mut output);
        write_footer(&mut output, &self.report.generated_at);

        output
    }

    fn write_summary(&self, output: &mut String) {
        let s = &self.report.summary;

        let _ = writeln!(output, "## Summary\n");
        let _ = writeln!(output, "| Metric | Value |");
        let _ = writeln!(output, "|--------|-------|");
        let _ = writeln!(output, "| Enrolled Courses | {} |", s.total_courses);
        let _ = writeln!(output, "| Completed | {} |", s.completed_courses);
        let _ = writeln!(output, "| In Progress | {} |", s.in_progress_courses);
        let _ = writeln!(
            output,
            "| Average Progress | {} |",
            format_percent(s.average_progress)
        );
        let _ = writeln!(output, "| Completion Rate | {}% |", s.completion_rate);
        let _ = writeln!(output, "| Certificates | {} |", s.total_certificates);
        let _ = writeln!(output);
    }

    fn write_courses(&self, output: &mut String) {
        let _ = writeln!(output, "## Courses\n");

        if self.report.courses.is_empty() {
            let _ = writeln!(output, "*Not enrolled in any course.*\n");
            return;
        }

        let _ = writeln!(output, "| Course | Lessons | Progress | Status |");
        let _ = writeln!(output, "|--------|---------|----------|--------|");
        for row in &self.report.courses {
            write_course_row(output, row);
        }
        let _ = writeln!(output);
    }

    fn write_certificates(&self, output: &mut String) {
        let _ = writeln!(output, "## Certificates\n");

        if self.report.certificates.is_empty() {
            let _ = writeln!(output, "*No certificates yet.*\n");
            return;
        }

        let _ = writeln!(output, "| Certificate | Course | Issued |");
        let _ = writeln!(output, "|-------------|--------|--------|");
        for cert in &self.report.certificates {
            write_certificate_row(output, cert);
        }
        let _ = writeln!(output);
    }
}

fn write_course_row(output: &mut String, row: &CourseRow) {
    let title = escape_markdown(&row.title);
    let done = row.completed_lessons;
    let total = row.total_lessons;
    let progress = format_percent(row.progress_percentage);
    let mut status = row.status().to_string();
    if row.has_certificate {
        status.push_str(" (certified)");
    }
    let _ = writeln!(output, "| {title} | {done}/{total} | {progress} | {status} |");
}

fn write_certificate_row(output: &mut String, cert: &CertificateRow) {
    let id = escape_markdown_inline_code(&cert.certificate_id);
    let course = escape_markdown(&cert.course_title);
    let issued = cert
        .issued_at
        .as_ref()
        .map_or_else(|| "-".to_string(), format_date);
    let _ = writeln!(output, "| `{id}` | {course} | {issued} |");
}

// ============================================================================
// Instructor report
// ============================================================================

/// Renders an [`InstructorReport`] as Markdown.
pub struct InstructorMarkdown<'a> {
    report: &'a InstructorReport,
}

impl<'a> InstructorMarkdown<'a> {
    /// Creates a renderer for the given report.
    ///
    /// # Example
    ///
    /// ```rust
    /// use lectern_report::{InstructorMarkdown, InstructorReport, InstructorTotals};
    ///
    /// let report = InstructorReport::new("Grace Hopper", InstructorTotals::default(), vec![]);
    /// let renderer = InstructorMarkdown::new(&report);
    /// ```
    #[must_use]
    pub const fn new(report: &'a InstructorReport) -> Self {
        Self { report }
    }

    /// Renders the complete document.
    ///
    /// # Example
    ///
    /// ```rust
    /// use lectern_report::{InstructorMarkdown, InstructorReport, InstructorTotals};
    ///
    /// let totals = InstructorTotals {
    ///     total_courses: 2,
    ///     total_students: 14,
    ///     total_enrollments: 17,
    ///     total_certificates: 3,
    /// };
    /// let report = InstructorReport::new("Grace Hopper", totals, vec![]);
    /// let markdown = InstructorMarkdown::new(&report).generate();
    ///
    /// assert!(markdown.starts_with("# Course Report: Grace Hopper"));
    /// assert!(markdown.contains("| Students | 14 |"));
    /// ```
    #[must_use]
    pub fn generate(&self) -> String {
        let mut output = String::new();

        let _ = writeln!(
            output,
            "# Course Report: {}\n",
            escape_markdown(&self.report.instructor)
        );
        self.write_overview(&mut output);

        if self.report.courses.is_empty() {
            let _ = writeln!(output, "*No courses to report.*\n");
        }
        for course in &self.report.courses {
            write_course_section(&mut output, course);
        }

        write_footer(&mut output, &self.report.generated_at);
        output
    }

    fn write_overview(&self, output: &mut String) {
        let t = &self.report.totals;
        let bands = self.report.band_counts();

        let _ = writeln!(output, "## Overview\n");
        let _ = writeln!(output, "| Metric | Value |");
        let _ = writeln!(output, "|--------|-------|");
        let _ = writeln!(output, "| Courses | {} |", t.total_courses);
        let _ = writeln!(output, "| Students | {} |", t.total_students);
        let _ = writeln!(output, "| Enrollments | {} |", t.total_enrollments);
        let _ = writeln!(output, "| Certificates | {} |", t.total_certificates);
        let _ = writeln!(
            output,
            "| Completion Bands | {} high, {} medium, {} low |",
            bands.high, bands.medium, bands.low
        );
        let _ = writeln!(output);
    }
}

fn write_course_section(output: &mut String, course: &CourseSection) {
    let _ = writeln!(output, "## {}\n", escape_markdown(&course.title));
    let _ = writeln!(
        output,
        "**Completion**: {} ({}/{} students) | **Band**: {}",
        format_percent(course.completion_rate),
        course.completed_students,
        course.total_students,
        course.band()
    );
    let _ = writeln!(
        output,
        "**Average Progress**: {} | **Average Quiz Score**: {}\n",
        format_percent(course.average_progress),
        format_optional_percent(course.average_quiz_score)
    );

    if course.students.is_empty() {
        let _ = writeln!(output, "*No students enrolled.*\n");
    } else {
        let _ = writeln!(output, "| Student | Progress | Completed | Quiz Avg | Last Active |");
        let _ = writeln!(output, "|---------|----------|-----------|----------|-------------|");
        for student in &course.students {
            write_student_row(output, student);
        }
        let _ = writeln!(output);
    }

    if let Some(analytics) = &course.analytics {
        write_analytics(output, analytics);
    }
}

fn write_student_row(output: &mut String, student: &StudentRow) {
    let name = escape_markdown(&student.name);
    let username = escape_markdown(&student.username);
    let progress = format_percent(student.progress_percentage);
    let completed = if student.completed { "Yes" } else { "No" };
    let quiz = format_optional_percent(student.avg_quiz_score);
    let last = student
        .last_activity
        .as_ref()
        .map_or_else(|| "-".to_string(), format_date);
    let _ = writeln!(
        output,
        "| {name} ({username}) | {progress} | {completed} | {quiz} | {last} |"
    );
}

fn write_analytics(output: &mut String, analytics: &AnalyticsSummary) {
    let _ = writeln!(output, "### Progress Distribution\n");
    let _ = writeln!(output, "| Range | Students |");
    let _ = writeln!(output, "|-------|----------|");
    for bucket in &analytics.distribution {
        let _ = writeln!(output, "| {} | {} |", bucket.label, bucket.count);
    }
    let _ = writeln!(output);

    let _ = writeln!(
        output,
        "**Engagement**: {} active, {} inactive ({})\n",
        analytics.active_students,
        analytics.inactive_students,
        format_percent(analytics.activity_rate)
    );

    if !analytics.quizzes.is_empty() {
        let _ = writeln!(output, "### Quiz Performance\n");
        let _ = writeln!(output, "| Quiz | Questions | Average | Pass Rate |");
        let _ = writeln!(output, "|------|-----------|---------|-----------|");
        for quiz in &analytics.quizzes {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} |",
                escape_markdown(&quiz.title),
                quiz.total_questions,
                format_percent(quiz.average_score),
                format_percent(quiz.pass_rate)
            );
        }
        let _ = writeln!(output);
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn write_footer(output: &mut String, generated_at: &DateTime<Utc>) {
    let _ = writeln!(output, "---");
    let _ = writeln!(
        output,
        "*Generated by Lectern at {}*",
        format_timestamp(generated_at)
    );
}

/// One decimal place, e.g. `62.5%`.
fn format_percent(value: f64) -> String {
    format!("{value:.1}%")
}

fn format_optional_percent(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), format_percent)
}

/// Format: "YYYY-MM-DD HH:MM:SS UTC"
fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn format_date(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d").to_string()
}

/// Escapes characters Markdown would otherwise interpret.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for ch in text.chars() {
        match ch {
            '*' | '_' | '`' | '#' | '[' | ']' | '(' | ')' | '!' | '\\' | '<' | '>' | '|' => {
                result.push('\\');
                result.push(ch);
            }
            '\n' => result.push_str("<br>"),
            _ => result.push(ch),
        }
    }

    result
}

fn escape_markdown_inline_code(text: &str) -> String {
    text.replace('`', "'")
}

// ============================================================================
// Tests
// ============================================================================
