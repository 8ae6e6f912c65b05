//! Builds report inputs from backend data and writes report files.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use lectern_core::model::{
    Certificate, CourseAnalytics, CourseReport, StudentProgressReports, StudentProgressRow, User,
};
use lectern_core::{CourseProgress, ProgressOverview};
use lectern_report::json::JsonGenerator;
use lectern_report::{
    AnalyticsSummary, CertificateRow, CourseRow, CourseSection, DistributionBucket,
    InstructorMarkdown, InstructorReport, InstructorTotals, LearnerSummary, ProgressMarkdown,
    ProgressReport, QuizRow, StudentRow,
};

/// Files written for one report.
pub struct WrittenReport {
    pub markdown: PathBuf,
    pub json: PathBuf,
}

/// Creates a learner progress report.
pub fn progress_report(
    user: &User,
    overview: &ProgressOverview,
    certificates: &[Certificate],
) -> lectern_report::Result<ProgressReport> {
    ProgressReport::builder()
        .student(user.display_name())
        .summary(LearnerSummary {
            total_courses: overview.total_courses,
            completed_courses: overview.completed_courses,
            in_progress_courses: overview.in_progress_courses,
            average_progress: overview.average_progress,
            completion_rate: overview.completion_rate(),
            total_certificates: u32::try_from(certificates.len()).unwrap_or(u32::MAX),
        })
        .courses(overview.courses.iter().map(convert_course).collect())
        .certificates(certificates.iter().map(convert_certificate).collect())
        .build()
}

fn convert_course(progress: &CourseProgress) -> CourseRow {
    CourseRow {
        course_id: progress.course_id,
        title: progress.course_title.clone(),
        completed_lessons: progress.completed_lessons.min(progress.total_lessons),
        total_lessons: progress.total_lessons,
        progress_percentage: progress.percentage(),
        completed: progress.is_completed(),
        has_certificate: progress.certificate_displayable(),
    }
}

fn convert_certificate(cert: &Certificate) -> CertificateRow {
    CertificateRow {
        certificate_id: cert.certificate_id.clone(),
        course_title: cert.course.title.clone(),
        issued_at: cert.issued_at,
    }
}

/// Creates an instructor report; `analytics` is keyed by course id.
pub fn instructor_report(
    user: &User,
    reports: &StudentProgressReports,
    analytics: &HashMap<u64, CourseAnalytics>,
) -> InstructorReport {
    let s = &reports.summary;
    InstructorReport::new(
        user.display_name(),
        InstructorTotals {
            total_courses: s.total_courses,
            total_students: s.total_students,
            total_enrollments: s.total_enrollments,
            total_certificates: s.total_certificates,
        },
        reports
            .course_reports
            .iter()
            .map(|r| convert_course_report(r, analytics.get(&r.course_id)))
            .collect(),
    )
}

fn convert_course_report(report: &CourseReport, analytics: Option<&CourseAnalytics>) -> CourseSection {
    CourseSection {
        course_id: report.course_id,
        title: report.course_title.clone(),
        total_students: report.total_students,
        completed_students: report.completed_students,
        completion_rate: report.completion_rate,
        average_progress: report.average_progress,
        average_quiz_score: report.average_quiz_score,
        students: report.student_progress.iter().map(convert_student).collect(),
        analytics: analytics.map(convert_analytics),
    }
}

fn convert_student(row: &StudentProgressRow) -> StudentRow {
    let name = if row.student_name.trim().is_empty() {
        row.username.clone()
    } else {
        row.student_name.clone()
    };
    StudentRow {
        name,
        username: row.username.clone(),
        progress_percentage: row.progress_percentage,
        completed: row.course_completed,
        avg_quiz_score: row.avg_quiz_score,
        last_activity: row.last_activity,
    }
}

fn convert_analytics(analytics: &CourseAnalytics) -> AnalyticsSummary {
    AnalyticsSummary {
        distribution: analytics
            .progress_distribution
            .buckets()
            .iter()
            .map(|(label, count)| DistributionBucket {
                label: (*label).to_string(),
                count: *count,
            })
            .collect(),
        active_students: analytics.engagement.active_students,
        inactive_students: analytics.engagement.inactive_students,
        activity_rate: analytics.engagement.activity_rate,
        quizzes: analytics
            .quiz_performance
            .iter()
            .map(|q| QuizRow {
                title: q.title.clone(),
                total_questions: q.total_questions,
                average_score: q.average_score,
                pass_rate: q.pass_rate,
            })
            .collect(),
    }
}

/// Writes `lectern-progress.md` and `lectern-progress.json`.
pub fn write_progress(report: &ProgressReport, output_dir: &Path) -> anyhow::Result<WrittenReport> {
    std::fs::create_dir_all(output_dir)?;

    let markdown = output_dir.join("lectern-progress.md");
    std::fs::write(&markdown, ProgressMarkdown::new(report).generate())?;

    let json = output_dir.join("lectern-progress.json");
    JsonGenerator::new(report).write_to_file(&json, true)?;

    Ok(WrittenReport { markdown, json })
}

/// Writes `lectern-course-report.md` and `lectern-course-report.json`.
pub fn write_instructor(
    report: &InstructorReport,
    output_dir: &Path,
) -> anyhow::Result<WrittenReport> {
    std::fs::create_dir_all(output_dir)?;

    let markdown = output_dir.join("lectern-course-report.md");
    std::fs::write(&markdown, InstructorMarkdown::new(report).generate())?;

    let json = output_dir.join("lectern-course-report.json");
    JsonGenerator::new(report).write_to_file(&json, true)?;

    Ok(WrittenReport { markdown, json })
}

/// Writes `bytes` to `output_dir/file_name`, creating the directory.
pub fn write_file(output_dir: &Path, file_name: &str, bytes: &[u8]) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(file_name);
    std::fs::write(&path, bytes)?;
    Ok(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lectern_core::model::{
        CourseProgressEntry, CourseSummary, OverallProgress, ProgressDistribution, ReportSummary,
        Role, UserSummary,
    };

    use super::*;

    fn user() -> User {
        User {
            id: 3,
            username: "ada".to_string(),
            email: "ada@example.org".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            role: Role::Student,
        }
    }

    fn entry(course_id: u64, done: u32, total: u32) -> CourseProgressEntry {
        CourseProgressEntry {
            course_id,
            course_title: format!("Course {course_id}"),
            course_description: String::new(),
            enrolled_at: None,
            completed_lessons: done,
            total_lessons: total,
            progress_percentage: 0.0,
            course_completed: false,
            has_certificate: done == total && total > 0,
        }
    }

    #[test]
    fn test_progress_report_from_overview() {
        let overall = OverallProgress {
            student: None,
            summary: lectern_core::model::ProgressSummary::default(),
            course_progress: vec![entry(1, 4, 4), entry(2, 1, 4)],
        };
        let overview = ProgressOverview::from_overall(&overall);
        let certs = vec![Certificate {
            id: 1,
            certificate_id: "CERT-3BE755FC96B9".to_string(),
            course: CourseSummary {
                id: 1,
                title: "Course 1".to_string(),
                instructor: None,
            },
            student: UserSummary {
                id: 3,
                username: "ada".to_string(),
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email: String::new(),
            },
            issued_at: None,
            pdf_file: None,
        }];

        let report = progress_report(&user(), &overview, &certs).unwrap();

        assert_eq!(report.student, "Ada Lovelace");
        assert_eq!(report.summary.completion_rate, 50);
        assert!((report.summary.average_progress - 62.5).abs() < f64::EPSILON);
        assert_eq!(report.summary.total_certificates, 1);
        assert!(report.courses[0].completed);
        assert_eq!(report.courses[1].status(), "In progress");
    }

    #[test]
    fn test_instructor_report_joins_analytics() {
        let reports = StudentProgressReports {
            summary: ReportSummary {
                total_courses: 1,
                total_students: 2,
                total_enrollments: 2,
                total_certificates: 0,
            },
            course_reports: vec![CourseReport {
                course_id: 7,
                course_title: "Rust Basics".to_string(),
                total_students: 2,
                completed_students: 1,
                completion_rate: 50.0,
                average_progress: 60.0,
                average_quiz_score: None,
                student_progress: vec![StudentProgressRow {
                    student_id: 3,
                    student_name: " ".to_string(),
                    username: "ada".to_string(),
                    email: String::new(),
                    enrollment_date: None,
                    progress_percentage: 60.0,
                    course_completed: false,
                    completion_date: None,
                    avg_quiz_score: Some(75.0),
                    last_activity: None,
                }],
            }],
        };
        let mut analytics = HashMap::new();
        analytics.insert(
            7,
            CourseAnalytics {
                progress_distribution: ProgressDistribution {
                    half: 1,
                    complete: 1,
                    ..ProgressDistribution::default()
                },
                ..CourseAnalytics::default()
            },
        );

        let report = instructor_report(&user(), &reports, &analytics);
        let section = &report.courses[0];

        assert_eq!(section.students[0].name, "ada");
        assert_eq!(section.band(), lectern_report::PerformanceBand::Medium);
        let buckets = &section.analytics.as_ref().unwrap().distribution;
        assert_eq!(buckets.len(), 5);
        assert_eq!(buckets[1].label, "26-50%");
        assert_eq!(buckets[1].count, 1);
        assert_eq!(buckets[4].count, 1);
    }

    #[test]
    fn test_write_file_creates_output_dir() {
        let dir = std::env::temp_dir()
            .join(format!("lectern-cli-cert-{}", std::process::id()))
            .join("nested");

        let path = write_file(&dir, "Certificate-CERT-ABC.txt", b"Certificate of Completion\n").unwrap();

        assert_eq!(path, dir.join("Certificate-CERT-ABC.txt"));
        assert_eq!(std::fs::read(&path).unwrap(), b"Certificate of Completion\n");
        let _ = std::fs::remove_dir_all(dir.parent().unwrap());
    }
}
