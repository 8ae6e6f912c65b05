//! Progress aggregation.
//!
//! Combines lesson completion counts into per-course percentages and an
//! overall summary. Everything here is a pure function of its input; the
//! backend remains the source of truth for the counts themselves.

use serde::{Deserialize, Serialize};

use crate::model::{CourseProgressEntry, OverallProgress};

/// Percentage of completed lessons, clamped to `[0, 100]`.
///
/// Returns `0.0` for a course without lessons.
///
/// # Examples
///
/// ```
/// use lectern_core::progress::progress_percentage;
///
/// assert_eq!(progress_percentage(3, 4), 75.0);
/// assert_eq!(progress_percentage(0, 0), 0.0);
/// assert_eq!(progress_percentage(9, 4), 100.0);
/// ```
#[must_use]
pub fn progress_percentage(completed_lessons: u32, total_lessons: u32) -> f64 {
    if total_lessons == 0 {
        return 0.0;
    }
    let pct = f64::from(completed_lessons) / f64::from(total_lessons) * 100.0;
    pct.clamp(0.0, 100.0)
}

/// Completion rate as a whole percentage, `round(completed / total * 100)`.
#[must_use]
pub fn completion_rate(completed: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let rate = (f64::from(completed) / f64::from(total) * 100.0).round();
    // Bounded to [0, 100] when completed <= total; clamp otherwise.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let rate = rate.clamp(0.0, 100.0) as u32;
    rate
}

/// Progress of one enrolled course, recomputed from lesson counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseProgress {
    /// Course id.
    pub course_id: u64,
    /// Course title.
    pub course_title: String,
    /// Lessons completed.
    pub completed_lessons: u32,
    /// Lessons in the course.
    pub total_lessons: u32,
    /// Whether a certificate has been issued for this course.
    pub has_certificate: bool,
}

impl CourseProgress {
    /// Creates a progress record.
    #[must_use]
    pub fn new(
        course_id: u64,
        course_title: impl Into<String>,
        completed_lessons: u32,
        total_lessons: u32,
    ) -> Self {
        Self {
            course_id,
            course_title: course_title.into(),
            completed_lessons,
            total_lessons,
            has_certificate: false,
        }
    }

    /// Builds a record from a backend overall-progress row.
    #[must_use]
    pub fn from_entry(entry: &CourseProgressEntry) -> Self {
        Self {
            course_id: entry.course_id,
            course_title: entry.course_title.clone(),
            completed_lessons: entry.completed_lessons,
            total_lessons: entry.total_lessons,
            has_certificate: entry.has_certificate,
        }
    }

    /// Marks whether a certificate exists.
    #[must_use]
    pub const fn with_certificate(mut self, has_certificate: bool) -> Self {
        self.has_certificate = has_certificate;
        self
    }

    /// Completion percentage in `[0, 100]`.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        progress_percentage(self.completed_lessons, self.total_lessons)
    }

    /// `true` exactly when every lesson of a non-empty course is complete.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.total_lessons > 0 && self.completed_lessons >= self.total_lessons
    }

    /// A certificate is only shown for completed courses that have one.
    #[must_use]
    pub fn certificate_displayable(&self) -> bool {
        self.is_completed() && self.has_certificate
    }
}

/// Overall progress across all enrolled courses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressOverview {
    /// Per-course records, in input order.
    pub courses: Vec<CourseProgress>,
    /// Number of enrolled courses.
    pub total_courses: u32,
    /// Courses at 100%.
    pub completed_courses: u32,
    /// `total_courses - completed_courses`.
    pub in_progress_courses: u32,
    /// Unweighted mean of the per-course percentages.
    pub average_progress: f64,
    /// Certificates held.
    pub total_certificates: u32,
}

impl ProgressOverview {
    /// Aggregates per-course progress.
    #[must_use]
    pub fn aggregate(courses: Vec<CourseProgress>) -> Self {
        let total_courses = u32::try_from(courses.len()).unwrap_or(u32::MAX);
        let completed_courses =
            u32::try_from(courses.iter().filter(|c| c.is_completed()).count()).unwrap_or(u32::MAX);
        let total_certificates = u32::try_from(
            courses
                .iter()
                .filter(|c| c.certificate_displayable())
                .count(),
        )
        .unwrap_or(u32::MAX);

        let average_progress = if courses.is_empty() {
            0.0
        } else {
            let sum: f64 = courses.iter().map(CourseProgress::percentage).sum();
            sum / f64::from(total_courses)
        };

        Self {
            courses,
            total_courses,
            completed_courses,
            in_progress_courses: total_courses - completed_courses,
            average_progress,
            total_certificates,
        }
    }

    /// Recomputes the overview from the backend's overall-progress payload.
    ///
    /// The backend's own percentages and summary are ignored in favour of
    /// the lesson counts.
    #[must_use]
    pub fn from_overall(overall: &OverallProgress) -> Self {
        Self::aggregate(
            overall
                .course_progress
                .iter()
                .map(CourseProgress::from_entry)
                .collect(),
        )
    }

    /// Whole-percent completion rate across courses.
    #[must_use]
    pub fn completion_rate(&self) -> u32 {
        completion_rate(self.completed_courses, self.total_courses)
    }

    /// Looks up one course.
    #[must_use]
    pub fn course(&self, course_id: u64) -> Option<&CourseProgress> {
        self.courses.iter().find(|c| c.course_id == course_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_percentage_is_bounded() {
        for total in 0..6 {
            for completed in 0..8 {
                let pct = progress_percentage(completed, total);
                assert!((0.0..=100.0).contains(&pct), "{completed}/{total} -> {pct}");
            }
        }
    }

    #[test]
    fn test_percentage_is_100_only_when_all_complete() {
        assert!(approx(progress_percentage(5, 5), 100.0));
        assert!(progress_percentage(4, 5) < 100.0);
        assert!(approx(progress_percentage(0, 0), 0.0));
    }

    #[test]
    fn test_course_completed_flag() {
        assert!(CourseProgress::new(1, "a", 3, 3).is_completed());
        assert!(!CourseProgress::new(1, "a", 2, 3).is_completed());
        assert!(!CourseProgress::new(1, "a", 0, 0).is_completed());
    }

    #[test]
    fn test_certificate_only_displayable_when_completed() {
        let partial = CourseProgress::new(1, "a", 1, 2).with_certificate(true);
        assert!(!partial.certificate_displayable());

        let done = CourseProgress::new(1, "a", 2, 2);
        assert!(!done.certificate_displayable());
        assert!(done.with_certificate(true).certificate_displayable());
    }

    #[test]
    fn test_aggregate_empty() {
        let overview = ProgressOverview::aggregate(Vec::new());
        assert_eq!(overview.total_courses, 0);
        assert_eq!(overview.in_progress_courses, 0);
        assert!(approx(overview.average_progress, 0.0));
        assert_eq!(overview.completion_rate(), 0);
    }

    #[test]
    fn test_aggregate_is_unweighted_mean() {
        let overview = ProgressOverview::aggregate(vec![
            CourseProgress::new(1, "short", 1, 1),
            CourseProgress::new(2, "long", 0, 40),
            CourseProgress::new(3, "half", 5, 10),
        ]);

        assert_eq!(overview.total_courses, 3);
        assert_eq!(overview.completed_courses, 1);
        assert_eq!(overview.in_progress_courses, 2);
        assert!(approx(overview.average_progress, 50.0));
        assert_eq!(overview.completion_rate(), 33);
        assert_eq!(overview.course(3).unwrap().course_title, "half");
    }

    #[test]
    fn test_from_overall_recomputes_from_counts() {
        let json = r#"{
            "summary": {"total_courses": 9, "completed_courses": 9, "in_progress_courses": 0, "average_progress": 100.0},
            "course_progress": [
                {"course_id": 1, "course_title": "A", "completed_lessons": 2, "total_lessons": 2,
                 "progress_percentage": 100.0, "course_completed": true, "has_certificate": true},
                {"course_id": 2, "course_title": "B", "completed_lessons": 1, "total_lessons": 4,
                 "progress_percentage": 99.0, "course_completed": true}
            ]
        }"#;
        let overall: OverallProgress = serde_json::from_str(json).unwrap();
        let overview = ProgressOverview::from_overall(&overall);

        assert_eq!(overview.total_courses, 2);
        assert_eq!(overview.completed_courses, 1);
        assert_eq!(overview.total_certificates, 1);
        assert!(approx(overview.average_progress, 62.5));
    }

    #[test]
    fn test_completion_rate_rounds() {
        assert_eq!(completion_rate(1, 3), 33);
        assert_eq!(completion_rate(2, 3), 67);
        assert_eq!(completion_rate(0, 0), 0);
    }
}
