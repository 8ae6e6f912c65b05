//! Integration tests for the HTTP client against a mock LMS backend.
//!
//! The backend is a small axum app served on an ephemeral port. It keeps
//! just enough state to exercise login, token refresh, enrollment,
//! lesson completion, quiz submission, the student dashboard and
//! certificate verification and download.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use lectern_client::{HttpClient, SessionStore};
use lectern_core::backend::{AuthApi, CertificateApi, CourseApi, LessonApi, ProgressApi, QuizApi};
use lectern_core::certificate::CertificateFile;
use lectern_core::model::{AnswerChoice, AttemptRequest, Credentials, Quiz};
use lectern_core::{
    certificate, AttemptRunner, Config, EnrollOutcome, EnrollmentManager, EventHub, LearnerEvent,
    LecternError, LessonCompleter, SessionEndReason, SubmitTrigger,
};
use serde_json::{json, Value};
use tokio::time::timeout;
use tower_http::trace::TraceLayer;

const KNOWN_CERTIFICATE: &str = "CERT-3BE755FC96B9";
const UNRENDERED_CERTIFICATE: &str = "CERT-0A1B2C3D4E5F";
const PDF_BYTES: &[u8] = b"%PDF-1.4 lectern test certificate";

// ============================================================================
// Mock backend
// ============================================================================

#[derive(Default)]
struct Backend {
    access: String,
    token_version: u32,
    refresh_allowed: bool,
    refresh_calls: u32,
    enrolled: HashSet<u64>,
    completed_lessons: Vec<u64>,
    attempts: u32,
}

type Shared = Arc<Mutex<Backend>>;

fn student() -> Value {
    json!({
        "id": 3,
        "username": "ada",
        "email": "ada@example.org",
        "first_name": "Ada",
        "last_name": "Lovelace",
        "role": "student"
    })
}

/// The quiz as stored on the server, answer keys included.
fn keyed_quiz() -> Quiz {
    serde_json::from_value(json!({
        "id": 5,
        "lesson": 11,
        "title": "Ownership check",
        "passing_score": 70.0,
        "max_attempts": 3,
        "time_limit_minutes": 10,
        "attempts_remaining": 3,
        "questions": [
            {
                "id": 1,
                "question_text": "Who owns a moved value?",
                "option_a": "The caller",
                "option_b": "The new binding",
                "option_c": "Nobody",
                "option_d": "The heap",
                "correct_answer": "B",
                "points": 1
            },
            {
                "id": 2,
                "question_text": "Can a shared reference mutate?",
                "option_a": "Always",
                "option_b": "Never without interior mutability",
                "option_c": "Only in loops",
                "option_d": "Only in tests",
                "correct_answer": "B",
                "points": 1,
                "explanation": "Use Cell or RefCell"
            }
        ]
    }))
    .expect("quiz fixture")
}

fn authorized(state: &Shared, headers: &HeaderMap) -> bool {
    let expected = format!("Bearer {}", state.lock().expect("state").access);
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "detail": "Given token not valid for any token type" })),
    )
        .into_response()
}

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    if body["password"] != "secret" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "non_field_errors": ["Invalid credentials"] })),
        )
            .into_response();
    }
    let access = state.lock().expect("state").access.clone();
    Json(json!({ "user": student(), "access": access, "refresh": "refresh-1" })).into_response()
}

async fn refresh(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut backend = state.lock().expect("state");
    backend.refresh_calls += 1;
    if !backend.refresh_allowed || body["refresh"] != "refresh-1" {
        return unauthorized();
    }
    backend.token_version += 1;
    backend.access = format!("access-{}", backend.token_version);
    Json(json!({ "access": backend.access })).into_response()
}

async fn course(
    State(state): State<Shared>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    if id != 1 {
        return (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found." }))).into_response();
    }
    Json(json!({
        "id": 1,
        "title": "Rust Basics",
        "level": "beginner",
        "is_published": true,
        "total_lessons": 4,
        "instructor": { "id": 9, "username": "grace", "first_name": "Grace", "last_name": "Hopper" }
    }))
    .into_response()
}

async fn enroll(State(state): State<Shared>, Path(id): Path<u64>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    if !state.lock().expect("state").enrolled.insert(id) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Already enrolled in this course" })),
        )
            .into_response();
    }
    Json(json!({ "message": "Successfully enrolled in Rust Basics" })).into_response()
}

async fn mark_complete(
    State(state): State<Shared>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    state.lock().expect("state").completed_lessons.push(id);
    Json(json!({ "message": "Lesson marked as complete" })).into_response()
}

async fn quiz(State(state): State<Shared>, Path(_id): Path<u64>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    let mut quiz = keyed_quiz();
    for q in &mut quiz.questions {
        q.correct_answer = None;
    }
    Json(quiz).into_response()
}

async fn attempt(
    State(state): State<Shared>,
    Path(_id): Path<u64>,
    headers: HeaderMap,
    Json(request): Json<AttemptRequest>,
) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    let attempt_number = {
        let mut backend = state.lock().expect("state");
        backend.attempts += 1;
        backend.attempts
    };
    match lectern_core::quiz::grade(&keyed_quiz(), &request.answers, attempt_number) {
        Ok(result) => Json(result).into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))).into_response(),
    }
}

async fn verify(Path(certificate_id): Path<String>) -> Response {
    if certificate_id != KNOWN_CERTIFICATE {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "valid": false, "error": "Certificate not found" })),
        )
            .into_response();
    }
    Json(json!({
        "valid": true,
        "certificate": {
            "id": 1,
            "certificate_id": KNOWN_CERTIFICATE,
            "course": { "id": 1, "title": "Rust Basics" },
            "student": student(),
            "issued_at": "2026-03-01T12:00:00Z"
        }
    }))
    .into_response()
}

async fn student_dashboard(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    let backend = state.lock().expect("state");
    let finished = backend.completed_lessons.len();
    let enrollments: Vec<Value> = backend
        .enrolled
        .iter()
        .map(|id| {
            json!({
                "id": id,
                "course": { "id": id, "title": "Rust Basics" },
                "progress_percentage": finished as f64 * 25.0,
                "progress": { "completed_lessons": finished, "total_lessons": 4 }
            })
        })
        .collect();
    Json(json!({
        "student": student(),
        "stats": {
            "total_courses": enrollments.len(),
            "completed_courses": 0,
            "in_progress_courses": enrollments.len()
        },
        "enrollments": enrollments,
        "certificates": []
    }))
    .into_response()
}

fn certificate_json(id: u64) -> Option<Value> {
    let certificate_id = match id {
        1 => KNOWN_CERTIFICATE,
        2 => UNRENDERED_CERTIFICATE,
        _ => return None,
    };
    Some(json!({
        "id": id,
        "certificate_id": certificate_id,
        "course": {
            "id": 1,
            "title": "Rust Basics",
            "instructor": { "id": 9, "username": "grace", "first_name": "Grace", "last_name": "Hopper" }
        },
        "student": student(),
        "issued_at": "2026-03-01T12:00:00Z"
    }))
}

async fn get_certificate(
    State(state): State<Shared>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    match certificate_json(id) {
        Some(cert) => Json(cert).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found." }))).into_response(),
    }
}

async fn download_certificate(
    State(state): State<Shared>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    match id {
        1 => Json(json!({
            "certificate_id": KNOWN_CERTIFICATE,
            "pdf_file": format!("/media/certificates/{KNOWN_CERTIFICATE}.pdf")
        }))
        .into_response(),
        2 => Json(json!({ "certificate_id": UNRENDERED_CERTIFICATE, "pdf_file": null }))
            .into_response(),
        _ => (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found." }))).into_response(),
    }
}

async fn media(Path(name): Path<String>) -> Response {
    if name == format!("{KNOWN_CERTIFICATE}.pdf") {
        return ([("content-type", "application/pdf")], PDF_BYTES).into_response();
    }
    StatusCode::NOT_FOUND.into_response()
}

struct TestServer {
    base_url: String,
    state: Shared,
}

impl TestServer {
    async fn spawn() -> Self {
        let state: Shared = Arc::new(Mutex::new(Backend {
            access: "access-0".to_string(),
            refresh_allowed: true,
            ..Backend::default()
        }));

        let api = Router::new()
            .route("/login/", post(login))
            .route("/token/refresh/", post(refresh))
            .route("/courses/:id/", get(course))
            .route("/courses/:id/enroll/", post(enroll))
            .route("/lessons/:id/mark_complete/", post(mark_complete))
            .route("/quizzes/:id/", get(quiz))
            .route("/quizzes/:id/attempt/", post(attempt))
            .route("/dashboard/student/", get(student_dashboard))
            .route("/certificates/:id/", get(get_certificate))
            .route("/certificates/:id/download/", get(download_certificate))
            .route("/certificates/verify/:certificate_id/", get(verify))
            .with_state(state.clone());
        let router = Router::new()
            .nest("/api", api)
            .route("/media/certificates/:name", get(media))
            .layer(TraceLayer::new_for_http());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get local addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server failed");
        });

        Self {
            base_url: format!("http://{addr}/api"),
            state,
        }
    }

    fn client(&self, session: SessionStore) -> HttpClient {
        let config = Config {
            api_base_url: self.base_url.clone(),
            request_timeout_secs: 5,
            ..Config::default()
        };
        HttpClient::new(&config, session).expect("Failed to build client")
    }

    /// Invalidates the current access token as if it had expired.
    fn rotate_access(&self) {
        let mut backend = self.state.lock().expect("state");
        backend.token_version += 1;
        backend.access = format!("access-{}", backend.token_version);
    }

    fn backend(&self) -> std::sync::MutexGuard<'_, Backend> {
        self.state.lock().expect("state")
    }
}

fn credentials(password: &str) -> Credentials {
    Credentials {
        username: "ada".to_string(),
        password: password.to_string(),
    }
}

async fn logged_in(server: &TestServer) -> Arc<HttpClient> {
    let client = server.client(SessionStore::in_memory());
    client.login(&credentials("secret")).await.expect("Login failed");
    Arc::new(client)
}

// ============================================================================
// Auth and session
// ============================================================================

/// Tests that login stores the session and persists it to disk.
#[tokio::test]
async fn test_login_persists_session() {
    let server = TestServer::spawn().await;
    let path = std::env::temp_dir().join(format!("lectern-it-session-{}.json", std::process::id()));
    let _ = std::fs::remove_file(&path);

    let client = server.client(SessionStore::open(&path).await.expect("open"));
    let auth = client.login(&credentials("secret")).await.expect("Login failed");
    assert_eq!(auth.user.username, "ada");
    assert_eq!(client.current_user().await.map(|u| u.id), Some(3));

    let reopened = SessionStore::open(&path).await.expect("reopen");
    assert_eq!(reopened.access_token().await.as_deref(), Some("access-0"));
    assert_eq!(reopened.user().await.map(|u| u.display_name()), Some("Ada Lovelace".to_string()));

    client.logout().await.expect("logout");
    assert!(!path.exists());
}

/// Tests that a rejected login surfaces the backend's message.
#[tokio::test]
async fn test_login_with_wrong_password() {
    let server = TestServer::spawn().await;
    let client = server.client(SessionStore::in_memory());

    let err = client.login(&credentials("wrong")).await.unwrap_err();

    assert!(matches!(err, LecternError::Api { status: 400, .. }), "got {err:?}");
    assert!(err.to_string().contains("Invalid credentials"));
    assert!(client.current_user().await.is_none());
}

/// Tests that an expired access token is refreshed once and the request retried.
#[tokio::test]
async fn test_expired_token_is_refreshed_and_retried() {
    let server = TestServer::spawn().await;
    let client = logged_in(&server).await;
    server.rotate_access();

    let course = client.get_course(1).await.expect("Request should succeed after refresh");

    assert_eq!(course.title, "Rust Basics");
    assert_eq!(server.backend().refresh_calls, 1);
    assert_eq!(
        client.session().access_token().await,
        Some(server.backend().access.clone())
    );
}

/// Tests that concurrent 401s share a single refresh.
#[tokio::test]
async fn test_concurrent_401s_refresh_once() {
    let server = TestServer::spawn().await;
    let client = logged_in(&server).await;
    server.rotate_access();

    let (a, b) = tokio::join!(client.get_course(1), client.get_course(1));

    assert!(a.is_ok() && b.is_ok());
    assert_eq!(server.backend().refresh_calls, 1);
}

/// Tests that a failed refresh ends the session and announces it.
#[tokio::test]
async fn test_failed_refresh_expires_session() {
    let server = TestServer::spawn().await;
    let events = EventHub::default();
    let mut rx = events.subscribe();
    let client = server.client(SessionStore::in_memory()).with_events(events);
    client.login(&credentials("secret")).await.expect("Login failed");

    server.backend().refresh_allowed = false;
    server.rotate_access();

    let err = client.get_course(1).await.unwrap_err();

    assert!(matches!(err, LecternError::SessionExpired), "got {err:?}");
    assert!(client.current_user().await.is_none());
    let event = timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("Timeout waiting for event")
        .expect("Channel closed");
    assert!(
        matches!(&event, LearnerEvent::SessionEnded(p) if p.reason == SessionEndReason::Expired),
        "got {event:?}"
    );
}

/// Tests that a request without a session is rejected as unauthenticated.
#[tokio::test]
async fn test_request_without_session() {
    let server = TestServer::spawn().await;
    let client = server.client(SessionStore::in_memory());

    let err = client.get_course(1).await.unwrap_err();

    assert!(matches!(err, LecternError::NotAuthenticated), "got {err:?}");
    assert_eq!(server.backend().refresh_calls, 0);
}

// ============================================================================
// Enrollment and lessons
// ============================================================================

/// Tests that enrolling twice reports success the second time.
#[tokio::test]
async fn test_duplicate_enrollment_is_success() {
    let server = TestServer::spawn().await;
    let client = logged_in(&server).await;
    let user = client.current_user().await.expect("user");
    let course = client.get_course(1).await.expect("course");

    client.enroll(1).await.expect("first enroll");
    let err = client.enroll(1).await.unwrap_err();
    assert!(matches!(err, LecternError::AlreadyEnrolled { course_id: 1 }), "got {err:?}");

    let manager = EnrollmentManager::new(client.clone());
    let outcome = manager.enroll(&user, &course).await.expect("enroll");
    assert_eq!(outcome, EnrollOutcome::AlreadyEnrolled);
}

/// Tests that a gated lesson is refused locally.
#[tokio::test]
async fn test_gated_lesson_is_not_sent() {
    let server = TestServer::spawn().await;
    let client = logged_in(&server).await;
    let completer = LessonCompleter::new(client.clone());

    let gated = serde_json::from_value(json!({
        "id": 11,
        "title": "Ownership",
        "quiz": { "id": 5, "title": "Ownership check", "passed": false, "attempts_remaining": 2 }
    }))
    .expect("lesson");
    let err = completer.complete(&gated).await.unwrap_err();
    assert!(matches!(err, LecternError::LessonGated { lesson_id: 11, .. }), "got {err:?}");

    let open = serde_json::from_value(json!({ "id": 12, "title": "Borrowing" })).expect("lesson");
    completer.complete(&open).await.expect("complete");

    assert_eq!(server.backend().completed_lessons, vec![12]);
}

// ============================================================================
// Quizzes
// ============================================================================

/// Tests a full attempt: load, answer, submit, grade.
#[tokio::test]
async fn test_quiz_attempt_is_graded() {
    let server = TestServer::spawn().await;
    let client = logged_in(&server).await;

    let runner = AttemptRunner::load(client.clone(), 5).await.expect("load");
    runner
        .with_session(|s| {
            s.start()?;
            s.answer_current(AnswerChoice::B)?;
            s.next()?;
            s.answer_current(AnswerChoice::A)
        })
        .expect("answers");

    let result = runner.submit(SubmitTrigger::User).await.expect("submit");

    assert!((result.score - 50.0).abs() < f64::EPSILON);
    assert!(!result.passed);
    assert_eq!(result.correct_answers, 1);
    assert_eq!(result.attempt_number, 1);
    assert_eq!(result.remaining_attempts, 2);
    assert_eq!(result.results[1].explanation.as_deref(), Some("Use Cell or RefCell"));
    assert!(runner.with_session(|s| s.can_retake()));
}

/// Tests that unanswered questions need confirmation before anything is sent.
#[tokio::test]
async fn test_incomplete_attempt_needs_confirmation() {
    let server = TestServer::spawn().await;
    let client = logged_in(&server).await;

    let runner = AttemptRunner::load(client.clone(), 5).await.expect("load");
    runner
        .with_session(|s| {
            s.start()?;
            s.answer_current(AnswerChoice::B)
        })
        .expect("answer");

    let err = runner.submit(SubmitTrigger::User).await.unwrap_err();
    assert!(matches!(err, LecternError::ConfirmationRequired { unanswered: 1 }), "got {err:?}");
    assert_eq!(server.backend().attempts, 0);

    let result = runner.submit(SubmitTrigger::UserConfirmed).await.expect("submit");
    assert_eq!(result.correct_answers, 1);
    assert_eq!(server.backend().attempts, 1);
}

/// Tests that the client sends answers in the wire format the backend grades.
#[tokio::test]
async fn test_submit_attempt_directly() {
    let server = TestServer::spawn().await;
    let client = logged_in(&server).await;

    let request: AttemptRequest = serde_json::from_value(json!({
        "answers": [
            { "question_id": 1, "answer": "B" },
            { "question_id": 2, "answer": "B" }
        ]
    }))
    .expect("request");
    let result = client.submit_attempt(5, &request).await.expect("submit");

    assert!((result.score - 100.0).abs() < f64::EPSILON);
    assert!(result.passed);
}

// ============================================================================
// Certificates
// ============================================================================

/// Tests that a certificate id inside free text verifies.
#[tokio::test]
async fn test_verify_known_certificate() {
    let server = TestServer::spawn().await;
    let client = server.client(SessionStore::in_memory());

    let verification =
        certificate::verify(&client, "my certificate is cert-3be755fc96b9, thanks").await;

    assert!(verification.valid, "got {verification:?}");
    let cert = verification.certificate.expect("certificate");
    assert_eq!(cert.certificate_id, KNOWN_CERTIFICATE);
    assert_eq!(cert.student.display_name(), "Ada Lovelace");
}

/// Tests that unknown and malformed ids are reported as invalid.
#[tokio::test]
async fn test_verify_unknown_certificate() {
    let server = TestServer::spawn().await;
    let client = server.client(SessionStore::in_memory());

    let unknown = certificate::verify(&client, "CERT-000000000000").await;
    assert!(!unknown.valid);
    assert!(unknown.error.unwrap_or_default().contains("not found"));

    let malformed = certificate::verify(&client, "hello").await;
    assert!(!malformed.valid);
    assert!(malformed.error.unwrap_or_default().contains("does not contain"));
}

/// Tests that a rendered certificate resolves to its PDF and downloads.
#[tokio::test]
async fn test_certificate_download_fetches_pdf() {
    let server = TestServer::spawn().await;
    let client = logged_in(&server).await;
    let cert = client.get_certificate(1).await.expect("certificate");

    let CertificateFile::Pdf { url, file_name } = certificate::download(client.as_ref(), &cert).await
    else {
        unreachable!("expected a PDF");
    };
    assert_eq!(file_name, format!("Certificate-{KNOWN_CERTIFICATE}.pdf"));

    let bytes = client.fetch_bytes(&url).await.expect("fetch pdf");
    assert_eq!(bytes, PDF_BYTES);
}

/// Tests that an unrendered or unknown certificate falls back to text.
#[tokio::test]
async fn test_certificate_download_falls_back_to_text() {
    let server = TestServer::spawn().await;
    let client = logged_in(&server).await;

    let cert = client.get_certificate(2).await.expect("certificate");
    let CertificateFile::Text { file_name, contents } =
        certificate::download(client.as_ref(), &cert).await
    else {
        unreachable!("expected the text fallback");
    };
    assert_eq!(file_name, format!("Certificate-{UNRENDERED_CERTIFICATE}.txt"));
    assert!(contents.contains("Ada Lovelace"));
    assert!(contents.contains("Issued: 2026-03-01"));
    assert!(contents.contains("Instructor: Grace Hopper"));

    let mut missing = cert;
    missing.id = 99;
    let file = certificate::download(client.as_ref(), &missing).await;
    assert_eq!(file.file_name(), format!("Certificate-{UNRENDERED_CERTIFICATE}.txt"));
}

// ============================================================================
// Dashboard
// ============================================================================

/// Tests the learner dashboard after enrolling and finishing a lesson.
#[tokio::test]
async fn test_student_dashboard() {
    let server = TestServer::spawn().await;
    let client = logged_in(&server).await;
    client.enroll(1).await.expect("enroll");
    client.mark_complete(12).await.expect("complete");

    let dashboard = client.student_dashboard().await.expect("dashboard");

    assert_eq!(dashboard.student.clone().map(|s| s.username), Some("ada".to_string()));
    assert_eq!(dashboard.stats.total_courses, 1);
    assert_eq!(dashboard.completion_rate(), 0);
    let entry = &dashboard.enrollments[0];
    assert_eq!(entry.course.title(), Some("Rust Basics"));
    assert_eq!(entry.counts().completed_lessons, 1);
    assert!((entry.progress_percentage - 25.0).abs() < f64::EPSILON);
    assert!(!entry.is_finished());
}
