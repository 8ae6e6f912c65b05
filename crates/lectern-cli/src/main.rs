//! Lectern CLI
//!
//! Terminal client for the Lectern LMS: browse courses, enroll, work through
//! lessons and quizzes, track progress and certificates, and produce reports.

mod prompt;
mod quiz;
mod report;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use lectern_client::{HttpClient, SessionStore};
use lectern_core::catalog::{categories, format_course_duration, format_price, format_time_limit};
use lectern_core::certificate::{self, CertificateFile};
use lectern_core::lesson::sort_lessons;
use lectern_core::model::{
    AnswerChoice, ContentType, Course, CourseLevel, Credentials, Registration, Role,
    StudentDashboard, User,
};
use lectern_core::{
    AttemptRunner, AuthApi, CertificateApi, Config, Confirmation, CourseApi, CourseDraft,
    CourseQuery, CourseSort, EnrollOutcome, EnrollmentManager, EventHub, InstructorApi,
    LearnerEvent, LecternError, LessonApi, LessonCompleter, LessonDraft, ProgressApi,
    ProgressOverview, QuestionDraft, QuizApi, QuizDraft, SessionEndReason, UnenrollOutcome,
};
use tracing_subscriber::EnvFilter;

use crate::prompt::Prompt;

/// Lectern - LMS command-line client
///
/// Talks to a Lectern backend as a learner or instructor.
#[derive(Parser, Debug)]
#[command(name = "lectern")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: lectern.json in current directory)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Override the API base URL
    #[arg(long, value_name = "URL", global = true)]
    api_url: Option<String>,

    /// Output directory for reports
    #[arg(short, long, value_name = "DIR", global = true)]
    output_dir: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and remember the session
    Login {
        username: String,
        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account and log in
    Register {
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
        /// student or instructor
        #[arg(long, default_value = "student", value_parser = parse_role)]
        role: Role,
        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Browse the course catalog
    Courses {
        /// Search title, description, instructor and category
        #[arg(short, long)]
        search: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, value_parser = parse_level)]
        level: Option<CourseLevel>,
        /// newest, oldest, price-low, price-high, duration-short, duration-long, popular, lessons
        #[arg(long)]
        sort: Option<CourseSort>,
        /// Only courses you are enrolled in
        #[arg(long, conflicts_with = "available")]
        enrolled: bool,
        /// Only courses you can still enroll in
        #[arg(long)]
        available: bool,
        /// List the categories instead of courses
        #[arg(long)]
        categories: bool,
    },
    /// Show a course and its lessons
    Course { course_id: u64 },
    /// Enroll in a course
    Enroll { course_id: u64 },
    /// Leave a course; all progress in it is lost
    Unenroll {
        course_id: u64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show a lesson
    Lesson { lesson_id: u64 },
    /// Mark a lesson complete
    Complete { lesson_id: u64 },
    /// Reset your progress on a lesson
    ResetLesson { lesson_id: u64 },
    /// Take a quiz interactively
    Quiz { quiz_id: u64 },
    /// List your past attempts at a quiz
    History { quiz_id: u64 },
    /// Show your progress
    Progress {
        /// Show per-lesson progress for one course
        #[arg(long)]
        course: Option<u64>,
    },
    /// List your certificates
    Certificates {
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Verify a certificate id (free text containing CERT-... is accepted)
    Verify {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Save a certificate to the output directory (PDF, or text when none is rendered)
    CertificateDownload {
        /// Number shown by `certificates`
        id: u64,
    },
    /// Ask for a certificate to be (re)issued for a completed course
    Regenerate { course_id: u64 },
    /// Show your dashboard (learner or instructor)
    Dashboard,
    /// Write a progress report, or a course report for instructors
    Report {
        /// Include per-course analytics (instructors)
        #[arg(long)]
        analytics: bool,
    },
    /// Course authoring (instructors)
    #[command(subcommand)]
    Author(AuthorCommand),
}

#[derive(Subcommand, Debug)]
enum AuthorCommand {
    /// Create a course, or update one with --update
    Course {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        category: String,
        #[arg(long, value_parser = parse_level)]
        level: Option<CourseLevel>,
        #[arg(long)]
        duration_hours: f64,
        #[arg(long, default_value_t = 0.0)]
        price: f64,
        #[arg(long)]
        publish: bool,
        /// Learning outcome (repeatable)
        #[arg(long = "outcome")]
        outcomes: Vec<String>,
        #[arg(long, value_name = "COURSE_ID")]
        update: Option<u64>,
    },
    /// Delete a course
    DeleteCourse { course_id: u64 },
    /// Create a lesson, or update one with --update
    Lesson {
        #[arg(long)]
        course: u64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long, default_value = "text", value_parser = parse_content_type)]
        content_type: ContentType,
        #[arg(long)]
        content: String,
        #[arg(long, default_value_t = 0)]
        order: i32,
        #[arg(long, default_value_t = 0)]
        duration_minutes: u32,
        #[arg(long)]
        video_url: Option<String>,
        #[arg(long, value_name = "LESSON_ID")]
        update: Option<u64>,
    },
    /// Delete a lesson
    DeleteLesson { lesson_id: u64 },
    /// Attach a quiz to a lesson
    Quiz {
        #[arg(long)]
        lesson: u64,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        instructions: String,
        #[arg(long, default_value_t = 70.0)]
        passing_score: f64,
        #[arg(long, default_value_t = 3)]
        max_attempts: u32,
        #[arg(long)]
        time_limit: Option<u32>,
    },
    /// Add a question to a quiz
    Question {
        #[arg(long)]
        quiz: u64,
        #[arg(long)]
        text: String,
        #[arg(long)]
        a: String,
        #[arg(long)]
        b: String,
        #[arg(long)]
        c: String,
        #[arg(long)]
        d: String,
        #[arg(long, value_parser = parse_answer)]
        correct: AnswerChoice,
        #[arg(long, default_value_t = 1)]
        points: u32,
        #[arg(long)]
        explanation: Option<String>,
    },
}

fn parse_level(s: &str) -> Result<CourseLevel, String> {
    CourseLevel::parse(s).ok_or_else(|| format!("unknown level '{s}' (beginner, intermediate, advanced)"))
}

fn parse_content_type(s: &str) -> Result<ContentType, String> {
    ContentType::parse(s).ok_or_else(|| format!("unknown content type '{s}' (text, video, quiz, assignment)"))
}

fn parse_answer(s: &str) -> Result<AnswerChoice, String> {
    AnswerChoice::parse(s).ok_or_else(|| format!("answer must be one of A, B, C, D (got '{s}')"))
}

fn parse_role(s: &str) -> Result<Role, String> {
    match s.trim().to_lowercase().as_str() {
        "student" => Ok(Role::Student),
        "instructor" => Ok(Role::Instructor),
        _ => Err(format!("unknown role '{s}' (student, instructor)")),
    }
}

/// Everything a command needs.
struct Context {
    config: Config,
    client: Arc<HttpClient>,
    events: EventHub,
    prompt: Prompt,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(config = ?args.config, "Config file");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;

    if let Some(ref url) = args.api_url {
        config.api_base_url.clone_from(url);
    }
    if let Some(ref output_dir) = args.output_dir {
        config.output_dir.clone_from(output_dir);
    }
    config.validate()?;

    let session = SessionStore::open(&config.session_file).await?;
    let events = EventHub::default();
    let client = Arc::new(HttpClient::new(&config, session)?.with_events(events.clone()));
    spawn_event_logger(&events);

    let mut ctx = Context {
        config,
        client,
        events,
        prompt: Prompt::stdin(),
    };

    match args.command {
        Command::Login { username, password } => login(&mut ctx, username, password).await,
        Command::Register {
            username,
            email,
            first_name,
            last_name,
            role,
            password,
        } => {
            let password = read_password(&mut ctx.prompt, password).await?;
            let registration = Registration {
                username,
                email,
                first_name,
                last_name,
                role,
                password2: password.clone(),
                password,
            };
            let auth = ctx.client.register(&registration).await?;
            println!("Welcome, {}! You are registered as {}.", auth.user.display_name(), auth.user.role);
            Ok(())
        }
        Command::Logout => {
            ctx.client.logout().await?;
            println!("Logged out.");
            Ok(())
        }
        Command::Whoami => {
            let user = require_user(&ctx).await?;
            println!("{} ({}, {})", user.display_name(), user.username, user.role);
            Ok(())
        }
        Command::Courses {
            search,
            category,
            level,
            sort,
            enrolled,
            available,
            categories: list_categories,
        } => {
            let courses = if enrolled {
                ctx.client.enrolled_courses().await?
            } else if available {
                ctx.client.available_courses().await?
            } else {
                ctx.client.list_courses().await?
            };
            if list_categories {
                for c in categories(&courses) {
                    println!("{c}");
                }
                return Ok(());
            }
            let query = CourseQuery {
                search,
                category,
                level,
                sort: sort.unwrap_or(ctx.config.catalog.default_sort),
            };
            print_courses(&query.apply(&courses));
            Ok(())
        }
        Command::Course { course_id } => show_course(&ctx, course_id).await,
        Command::Enroll { course_id } => enroll(&ctx, course_id).await,
        Command::Unenroll { course_id, yes } => unenroll(&mut ctx, course_id, yes).await,
        Command::Lesson { lesson_id } => show_lesson(&ctx, lesson_id).await,
        Command::Complete { lesson_id } => {
            let lesson = ctx.client.get_lesson(lesson_id).await?;
            let completer = LessonCompleter::new(ctx.client.clone()).with_events(ctx.events.clone());
            let ack = completer.complete(&lesson).await?;
            println!(
                "{}",
                ack.message
                    .unwrap_or_else(|| format!("Lesson '{}' marked complete.", lesson.title))
            );
            Ok(())
        }
        Command::ResetLesson { lesson_id } => {
            let ack = ctx.client.reset_lesson_progress(lesson_id).await?;
            println!("{}", ack.message.unwrap_or_else(|| "Lesson progress reset.".to_string()));
            Ok(())
        }
        Command::Quiz { quiz_id } => {
            let api: Arc<dyn QuizApi> = ctx.client.clone();
            let runner = AttemptRunner::load(api, quiz_id)
                .await?
                .with_events(ctx.events.clone());
            quiz::run(&runner, &ctx.config.quiz, &mut ctx.prompt).await
        }
        Command::History { quiz_id } => {
            let attempts = ctx.client.attempt_history(quiz_id).await?;
            if attempts.is_empty() {
                println!("No attempts yet.");
            }
            for a in attempts {
                let when = a
                    .completed_at
                    .map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d %H:%M").to_string());
                let verdict = if a.passed { "passed" } else { "not passed" };
                println!("#{:<3} {:>6.2}%  {verdict:<10}  {when}", a.attempt_number, a.score);
            }
            Ok(())
        }
        Command::Progress { course } => show_progress(&ctx, course).await,
        Command::Certificates { search } => {
            let certs = ctx.client.list_certificates().await?;
            let shown = match search.as_deref() {
                Some(term) => certificate::search(&certs, term),
                None => certs.iter().collect(),
            };
            if shown.is_empty() {
                println!("No certificates found.");
            }
            for c in shown {
                let issued = c
                    .issued_at
                    .map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string());
                println!("#{:<4} {}  {}  issued {issued}", c.id, c.certificate_id, c.course.title);
            }
            Ok(())
        }
        Command::Verify { text } => {
            let verification = certificate::verify(ctx.client.as_ref(), &text.join(" ")).await;
            match (verification.valid, verification.certificate) {
                (true, Some(cert)) => {
                    println!("Valid certificate {}", cert.certificate_id);
                    println!("  Student: {}", cert.student.display_name());
                    println!("  Course:  {}", cert.course.title);
                    if let Some(issued) = cert.issued_at {
                        println!("  Issued:  {}", issued.format("%Y-%m-%d"));
                    }
                }
                _ => println!(
                    "Invalid: {}",
                    verification
                        .error
                        .unwrap_or_else(|| "certificate not found".to_string())
                ),
            }
            Ok(())
        }
        Command::Regenerate { course_id } => {
            let response = ctx.client.regenerate_certificate(course_id).await?;
            if let Some(message) = response.message {
                println!("{message}");
            }
            if let Some(cert) = response.certificate {
                println!("Certificate: {}", cert.certificate_id);
            }
            Ok(())
        }
        Command::CertificateDownload { id } => download_certificate(&ctx, id).await,
        Command::Dashboard => {
            let user = require_user(&ctx).await?;
            if user.is_student() {
                let dashboard = ctx.client.student_dashboard().await?;
                for line in student_dashboard_lines(&dashboard) {
                    println!("{line}");
                }
                return Ok(());
            }
            let dashboard = ctx.client.instructor_dashboard().await?;
            let s = &dashboard.stats;
            println!(
                "Courses:     {} ({} published, {} draft)",
                s.total_courses, s.published_courses, s.draft_courses
            );
            println!(
                "Students:    {} ({} active, {} new)",
                s.total_students, s.active_students, s.new_students
            );
            println!("Completions: {} recently", s.recent_completions);
            println!(
                "Revenue:     ${:.2} total, ${:.2} this month",
                s.total_revenue, s.monthly_revenue
            );
            print_courses(&dashboard.courses);
            Ok(())
        }
        Command::Report { analytics } => write_report(&ctx, analytics).await,
        Command::Author(cmd) => author(&ctx, cmd).await,
    }
}

/// Loads configuration from the specified path or default location.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Ok(Config::load_from_file(path)?)
        }
        None => Ok(Config::load()?),
    }
}

/// Logs learner events and tells the user when the session ends on its own.
fn spawn_event_logger(events: &EventHub) {
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            tracing::debug!(event = event.event_name(), "Learner event");
            if let LearnerEvent::SessionEnded(payload) = &event {
                if payload.reason == SessionEndReason::Expired {
                    eprintln!("Your session has expired. Run 'lectern login' to continue.");
                }
            }
        }
    });
}

async fn require_user(ctx: &Context) -> anyhow::Result<User> {
    ctx.client
        .current_user()
        .await
        .ok_or_else(|| LecternError::NotAuthenticated.into())
}

async fn read_password(prompt: &mut Prompt, given: Option<String>) -> anyhow::Result<String> {
    if let Some(password) = given {
        return Ok(password);
    }
    prompt
        .ask("Password:")
        .await?
        .ok_or_else(|| anyhow::anyhow!("No password given"))
}

async fn login(ctx: &mut Context, username: String, password: Option<String>) -> anyhow::Result<()> {
    let password = read_password(&mut ctx.prompt, password).await?;
    let auth = ctx.client.login(&Credentials { username, password }).await?;
    println!("Logged in as {} ({}).", auth.user.display_name(), auth.user.role);
    if let Some(path) = ctx.client.session().path() {
        tracing::debug!(path = %path.display(), "Session saved");
    }
    Ok(())
}

// ============================================================================
// Courses and lessons
// ============================================================================

fn print_courses(courses: &[Course]) {
    if courses.is_empty() {
        println!("No courses match.");
        return;
    }
    for c in courses {
        let enrolled = if c.is_enrolled { "  [enrolled]" } else { "" };
        println!(
            "#{:<4} {}  ({}, {}, {}, {} lessons, {}){enrolled}",
            c.id,
            c.title,
            c.level,
            if c.category.is_empty() { "uncategorised" } else { c.category.as_str() },
            format_course_duration(c.duration_hours),
            c.total_lessons,
            format_price(c.price),
        );
    }
}

async fn show_course(ctx: &Context, course_id: u64) -> anyhow::Result<()> {
    let mut course = ctx.client.get_course(course_id).await?;

    println!("{}", course.title);
    println!(
        "{} | {} | {} | {}",
        course.level,
        course.category,
        format_course_duration(course.duration_hours),
        format_price(course.price)
    );
    if let Some(instructor) = course.instructor.as_ref().and_then(|i| i.summary()) {
        println!("Instructor: {}", instructor.display_name());
    }
    println!();
    println!("{}", course.description);

    if !course.learning_outcomes.is_empty() {
        println!();
        println!("You will learn:");
        for outcome in &course.learning_outcomes {
            println!("  - {outcome}");
        }
    }

    sort_lessons(&mut course.lessons);
    if !course.lessons.is_empty() {
        println!();
        println!("Lessons:");
        for lesson in course.lessons.iter().filter(|l| l.is_active) {
            let done = if lesson.is_completed() { 'x' } else { ' ' };
            let quiz = match &lesson.quiz {
                Some(q) if q.passed => " (quiz passed)".to_string(),
                Some(q) => format!(" (quiz #{}: {} attempt(s) left)", q.id, q.attempts_remaining),
                None => String::new(),
            };
            println!(
                "  [{done}] #{:<4} {} ({}, {} min){quiz}",
                lesson.id, lesson.title, lesson.content_type, lesson.duration_minutes
            );
        }
    }
    if !course.is_enrolled {
        println!();
        println!("Not enrolled. Run 'lectern enroll {}' to start.", course.id);
    }
    Ok(())
}

async fn enroll(ctx: &Context, course_id: u64) -> anyhow::Result<()> {
    let user = require_user(ctx).await?;
    let course = ctx.client.get_course(course_id).await?;
    let manager = EnrollmentManager::new(ctx.client.clone()).with_events(ctx.events.clone());

    match manager.enroll(&user, &course).await? {
        EnrollOutcome::Enrolled => println!("Enrolled in '{}'.", course.title),
        EnrollOutcome::AlreadyEnrolled => println!("You are already enrolled in '{}'.", course.title),
    }
    Ok(())
}

async fn unenroll(ctx: &mut Context, course_id: u64, yes: bool) -> anyhow::Result<()> {
    let course = ctx.client.get_course(course_id).await?;
    let confirmed = yes
        || ctx
            .prompt
            .confirm(&format!(
                "Unenroll from '{}'? All progress in this course will be lost.",
                course.title
            ))
            .await?;

    let manager = EnrollmentManager::new(ctx.client.clone()).with_events(ctx.events.clone());
    match manager.unenroll(course_id, Confirmation::from(confirmed)).await? {
        UnenrollOutcome::Unenrolled => println!("Unenrolled from '{}'.", course.title),
        UnenrollOutcome::Cancelled => println!("Cancelled."),
    }
    Ok(())
}

async fn show_lesson(ctx: &Context, lesson_id: u64) -> anyhow::Result<()> {
    let lesson = ctx.client.get_lesson(lesson_id).await?;

    println!("{}", lesson.title);
    println!("{} | {} min", lesson.content_type, lesson.duration_minutes);
    if !lesson.description.is_empty() {
        println!("{}", lesson.description);
    }
    println!();
    if let Some(url) = &lesson.video_url {
        println!("Video: {url}");
    }
    println!("{}", lesson.content);
    if let Some(attachment) = &lesson.attachment {
        println!();
        println!("Attachment: {attachment}");
    }

    println!();
    if let Some(quiz) = &lesson.quiz {
        let best = quiz
            .best_score
            .map_or_else(String::new, |b| format!(", best {b:.1}%"));
        if quiz.passed {
            println!("Quiz '{}' passed{best}.", quiz.title);
        } else {
            println!(
                "Quiz '{}': {} attempt(s) left{best}. Run 'lectern quiz {}'.",
                quiz.title, quiz.attempts_remaining, quiz.id
            );
        }
    }
    if lesson.is_completed() {
        println!("Completed.");
    } else if lectern_core::lesson::check_completion(&lesson).is_ok() {
        println!("Run 'lectern complete {}' when done.", lesson.id);
    }
    Ok(())
}

// ============================================================================
// Progress and reports
// ============================================================================

async fn show_progress(ctx: &Context, course: Option<u64>) -> anyhow::Result<()> {
    if let Some(course_id) = course {
        let detail = ctx.client.course_progress(course_id).await?;
        let pct = lectern_core::progress::progress_percentage(
            detail.completed_lessons,
            detail.total_lessons,
        );
        println!(
            "{}: {}/{} lessons ({pct:.1}%)",
            detail.course_title, detail.completed_lessons, detail.total_lessons
        );
        for lesson in &detail.lessons {
            let done = if lesson.completed { 'x' } else { ' ' };
            println!("  [{done}] {}", lesson.lesson_title);
        }
        return Ok(());
    }

    let overall = ctx.client.overall_progress().await?;
    let overview = ProgressOverview::from_overall(&overall);

    println!(
        "{} course(s): {} completed, {} in progress, average {:.1}%, {} certificate(s)",
        overview.total_courses,
        overview.completed_courses,
        overview.in_progress_courses,
        overview.average_progress,
        overview.total_certificates
    );
    for c in &overview.courses {
        let cert = if c.certificate_displayable() { "  [certificate]" } else { "" };
        println!(
            "  #{:<4} {:<40} {:>3}/{:<3} {:>5.1}%{cert}",
            c.course_id,
            c.course_title,
            c.completed_lessons,
            c.total_lessons,
            c.percentage()
        );
    }
    Ok(())
}

fn student_dashboard_lines(dashboard: &StudentDashboard) -> Vec<String> {
    let s = &dashboard.stats;
    let mut lines = vec![
        format!(
            "Courses:      {} ({} completed, {} in progress)",
            s.total_courses, s.completed_courses, s.in_progress_courses
        ),
        format!("Completion:   {}%", dashboard.completion_rate()),
        format!("Certificates: {}", dashboard.certificates.len()),
    ];
    if dashboard.enrollments.is_empty() {
        lines.push("No enrollments yet.".to_string());
    }
    for e in &dashboard.enrollments {
        let counts = e.counts();
        let title = e
            .course
            .title()
            .map_or_else(|| format!("Course {}", e.course.id()), str::to_string);
        let state = if e.is_finished() { "Completed" } else { "In progress" };
        lines.push(format!(
            "  [{:>3.0}%] {title}  {}/{} lessons  {state}",
            e.progress_percentage, counts.completed_lessons, counts.total_lessons
        ));
    }
    lines
}

async fn download_certificate(ctx: &Context, id: u64) -> anyhow::Result<()> {
    let cert = ctx.client.get_certificate(id).await?;
    let output_dir = PathBuf::from(&ctx.config.output_dir);

    let (file_name, bytes) = match certificate::download(ctx.client.as_ref(), &cert).await {
        CertificateFile::Pdf { url, file_name } => match ctx.client.fetch_bytes(&url).await {
            Ok(bytes) => (file_name, bytes),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "PDF fetch failed, writing text certificate");
                (
                    certificate::text_file_name(&cert),
                    certificate::render_text(&cert).into_bytes(),
                )
            }
        },
        CertificateFile::Text { file_name, contents } => {
            println!("No PDF available yet; saving a text certificate.");
            (file_name, contents.into_bytes())
        }
    };

    let path = report::write_file(&output_dir, &file_name, &bytes)?;
    println!("Saved {}", path.display());
    Ok(())
}

async fn write_report(ctx: &Context, include_analytics: bool) -> anyhow::Result<()> {
    let user = require_user(ctx).await?;
    let output_dir = PathBuf::from(&ctx.config.output_dir);

    let written = if user.is_student() {
        let overall = ctx.client.overall_progress().await?;
        let certificates = ctx.client.list_certificates().await?;
        let overview = ProgressOverview::from_overall(&overall);
        let report = report::progress_report(&user, &overview, &certificates)?;
        report::write_progress(&report, &output_dir)?
    } else {
        let reports = ctx.client.student_progress_reports().await?;
        let mut analytics = HashMap::new();
        if include_analytics {
            for course in &reports.course_reports {
                match ctx.client.course_analytics(course.course_id).await {
                    Ok(a) => {
                        analytics.insert(course.course_id, a);
                    }
                    Err(e) => tracing::warn!(course_id = course.course_id, error = %e, "Skipping analytics"),
                }
            }
        }
        let report = report::instructor_report(&user, &reports, &analytics);
        let bands = report.band_counts();
        println!(
            "Completion bands: {} high, {} medium, {} low",
            bands.high, bands.medium, bands.low
        );
        report::write_instructor(&report, &output_dir)?
    };

    println!("  Markdown report: {}", written.markdown.display());
    println!("  JSON report: {}", written.json.display());
    Ok(())
}

// ============================================================================
// Authoring
// ============================================================================

async fn author(ctx: &Context, cmd: AuthorCommand) -> anyhow::Result<()> {
    match cmd {
        AuthorCommand::Course {
            title,
            description,
            category,
            level,
            duration_hours,
            price,
            publish,
            outcomes,
            update,
        } => {
            let draft = CourseDraft {
                title,
                description,
                category,
                level,
                duration_hours,
                price,
                is_published: publish,
                learning_outcomes: outcomes,
            };
            let course = match update {
                Some(id) => ctx.client.update_course(id, &draft).await?,
                None => ctx.client.create_course(&draft).await?,
            };
            println!("Saved course #{} '{}'.", course.id, course.title);
        }
        AuthorCommand::DeleteCourse { course_id } => {
            ctx.client.delete_course(course_id).await?;
            println!("Deleted course #{course_id}.");
        }
        AuthorCommand::Lesson {
            course,
            title,
            description,
            content_type,
            content,
            order,
            duration_minutes,
            video_url,
            update,
        } => {
            let draft = LessonDraft {
                course,
                title,
                description,
                content_type,
                content,
                order,
                duration_minutes,
                video_url,
            };
            let lesson = match update {
                Some(id) => ctx.client.update_lesson(id, &draft).await?,
                None => ctx.client.create_lesson(&draft).await?,
            };
            println!("Saved lesson #{} '{}'.", lesson.id, lesson.title);
        }
        AuthorCommand::DeleteLesson { lesson_id } => {
            ctx.client.delete_lesson(lesson_id).await?;
            println!("Deleted lesson #{lesson_id}.");
        }
        AuthorCommand::Quiz {
            lesson,
            title,
            description,
            instructions,
            passing_score,
            max_attempts,
            time_limit,
        } => {
            let draft = QuizDraft {
                lesson,
                title,
                description,
                instructions,
                passing_score,
                max_attempts,
                time_limit_minutes: time_limit,
            };
            let quiz = ctx.client.create_quiz(&draft).await?;
            let limit = quiz
                .time_limit_minutes
                .map_or_else(|| "untimed".to_string(), format_time_limit);
            println!("Created quiz #{} '{}' ({limit}).", quiz.id, quiz.title);
        }
        AuthorCommand::Question {
            quiz,
            text,
            a,
            b,
            c,
            d,
            correct,
            points,
            explanation,
        } => {
            let draft = QuestionDraft {
                quiz,
                question_text: text,
                option_a: a,
                option_b: b,
                option_c: c,
                option_d: d,
                correct_answer: correct,
                points,
                explanation,
            };
            let question = ctx.client.create_question(&draft).await?;
            println!("Added question #{} to quiz #{quiz}.", question.id);
        }
    }
    Ok(())
}
