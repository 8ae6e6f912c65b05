//! End-to-end report generation from backend payloads.
//!
//! Starts from the JSON the LMS returns for overall progress, aggregates it
//! the way the client does, and checks the Markdown and JSON documents.

use chrono::{TimeZone, Utc};
use lectern_core::model::OverallProgress;
use lectern_core::ProgressOverview;
use lectern_report::json::JsonGenerator;
use lectern_report::{
    CourseRow, CourseSection, InstructorMarkdown, InstructorReport, InstructorTotals,
    LearnerSummary, PerformanceBand, ProgressMarkdown, ProgressReport,
};
use serde_json::json;

fn overall_payload() -> OverallProgress {
    serde_json::from_value(json!({
        "student": { "id": 3, "username": "ada", "first_name": "Ada", "last_name": "Lovelace" },
        "summary": {
            "total_courses": 3,
            "completed_courses": 1,
            "in_progress_courses": 1,
            "average_progress": 41.67,
            "total_certificates": 1
        },
        "course_progress": [
            {
                "course_id": 1,
                "course_title": "Rust Basics",
                "completed_lessons": 4,
                "total_lessons": 4,
                "progress_percentage": 100.0,
                "course_completed": true,
                "has_certificate": true
            },
            {
                "course_id": 2,
                "course_title": "Async in Depth",
                "completed_lessons": 1,
                "total_lessons": 4,
                "progress_percentage": 25.0,
                "course_completed": false,
                "has_certificate": false
            },
            {
                "course_id": 3,
                "course_title": "Empty Draft",
                "completed_lessons": 0,
                "total_lessons": 0,
                "progress_percentage": 0.0,
                "course_completed": false,
                "has_certificate": false
            }
        ]
    }))
    .expect("Failed to parse overall progress")
}

fn build_progress_report(overview: &ProgressOverview) -> ProgressReport {
    ProgressReport::builder()
        .student("Ada Lovelace")
        .generated_at(Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap())
        .summary(LearnerSummary {
            total_courses: overview.total_courses,
            completed_courses: overview.completed_courses,
            in_progress_courses: overview.in_progress_courses,
            average_progress: overview.average_progress,
            completion_rate: overview.completion_rate(),
            total_certificates: overview.total_certificates,
        })
        .courses(
            overview
                .courses
                .iter()
                .map(|c| CourseRow {
                    course_id: c.course_id,
                    title: c.course_title.clone(),
                    completed_lessons: c.completed_lessons,
                    total_lessons: c.total_lessons,
                    progress_percentage: c.percentage(),
                    completed: c.is_completed(),
                    has_certificate: c.certificate_displayable(),
                })
                .collect(),
        )
        .build()
        .expect("Failed to build report")
}

/// Tests that aggregation recomputes the summary from the course rows.
#[test]
fn test_overview_from_backend_payload() {
    let overview = ProgressOverview::from_overall(&overall_payload());

    assert_eq!(overview.total_courses, 3);
    assert_eq!(overview.completed_courses, 1);
    assert_eq!(overview.in_progress_courses, 2);
    assert!((overview.average_progress - 125.0 / 3.0).abs() < 1e-9);
    assert_eq!(overview.completion_rate(), 33);
    assert_eq!(overview.total_certificates, 1);
}

/// Tests the rendered learner document.
#[test]
fn test_progress_markdown_document() {
    let overview = ProgressOverview::from_overall(&overall_payload());
    let report = build_progress_report(&overview);

    let markdown = ProgressMarkdown::new(&report).generate();

    assert!(markdown.starts_with("# Learning Progress: Ada Lovelace\n"));
    assert!(markdown.contains("| Enrolled Courses | 3 |"));
    assert!(markdown.contains("| Completion Rate | 33% |"));
    assert!(markdown.contains("| Rust Basics | 4/4 | 100.0% | Completed (certified) |"));
    assert!(markdown.contains("| Async in Depth | 1/4 | 25.0% | In progress |"));
    assert!(markdown.contains("| Empty Draft | 0/0 | 0.0% | Not started |"));
    assert!(markdown.contains("*No certificates yet.*"));
    assert!(markdown.ends_with("*Generated by Lectern at 2026-03-14 09:30:00 UTC*\n"));
}

/// Tests that both formats are written and the JSON reads back.
#[test]
fn test_progress_report_files() {
    let overview = ProgressOverview::from_overall(&overall_payload());
    let report = build_progress_report(&overview);
    let dir = std::env::temp_dir().join(format!("lectern-it-report-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("Failed to create dir");

    let md_path = dir.join("lectern-progress.md");
    let json_path = dir.join("lectern-progress.json");
    std::fs::write(&md_path, ProgressMarkdown::new(&report).generate()).expect("write md");
    JsonGenerator::new(&report)
        .write_to_file(&json_path, true)
        .expect("write json");

    let parsed: ProgressReport =
        serde_json::from_str(&std::fs::read_to_string(&json_path).expect("read json"))
            .expect("parse json");
    let _ = std::fs::remove_dir_all(&dir);

    assert_eq!(parsed, report);
}

/// Tests the instructor document's band grouping.
#[test]
fn test_instructor_bands() {
    let section = |id: u64, title: &str, rate: f64| CourseSection {
        course_id: id,
        title: title.to_string(),
        total_students: 10,
        completed_students: 0,
        completion_rate: rate,
        average_progress: rate,
        average_quiz_score: None,
        students: vec![],
        analytics: None,
    };
    let report = InstructorReport::new(
        "Grace Hopper",
        InstructorTotals {
            total_courses: 3,
            total_students: 30,
            total_enrollments: 30,
            total_certificates: 4,
        },
        vec![
            section(1, "Rust Basics", 80.0),
            section(2, "Async in Depth", 79.9),
            section(3, "Unsafe Rust", 10.0),
        ],
    );

    assert_eq!(report.courses[0].band(), PerformanceBand::High);
    assert_eq!(report.courses[1].band(), PerformanceBand::Medium);
    assert_eq!(report.courses[2].band(), PerformanceBand::Low);

    let markdown = InstructorMarkdown::new(&report).generate();
    assert!(markdown.contains("| Completion Bands | 1 high, 1 medium, 1 low |"));
    assert!(markdown.contains("## Unsafe Rust"));
    assert!(markdown.contains("*No students enrolled.*"));
}
