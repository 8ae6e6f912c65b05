//! Error types for the Lectern client.
//!
//! This module defines the error hierarchy for every client operation,
//! including configuration loading, local form validation, authentication,
//! backend calls, and the quiz/enrollment state machines.

use std::path::PathBuf;

/// A specialized `Result` type for Lectern operations.
pub type Result<T> = std::result::Result<T, LecternError>;

/// Errors that can occur while driving the Lectern client.
///
/// Variants are grouped by the category they belong to (see
/// [`ErrorCategory`]) and carry actionable suggestions where possible.
#[derive(Debug, thiserror::Error)]
pub enum LecternError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in the configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your lectern.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Local Validation Errors (never sent to the backend)
    // ========================================================================
    /// A form field failed local validation.
    #[error("{field}: {message}")]
    Validation {
        /// Name of the offending field.
        field: String,
        /// Human-readable reason.
        message: String,
    },

    // ========================================================================
    // Authorization Errors
    // ========================================================================
    /// No session is stored; the user must log in first.
    #[error("Not logged in\n\nSuggestion: Run 'lectern login' first")]
    NotAuthenticated,

    /// The access token was rejected and could not be refreshed.
    #[error("Session expired and could not be refreshed\n\nSuggestion: Log in again with 'lectern login'")]
    SessionExpired,

    /// The backend refused the operation for this user.
    #[error("Permission denied: {message}")]
    Forbidden {
        /// Message returned by the backend.
        message: String,
    },

    // ========================================================================
    // Conflict Errors
    // ========================================================================
    /// The student is already enrolled in the course.
    #[error("Already enrolled in course {course_id}")]
    AlreadyEnrolled {
        /// Course the duplicate enrollment targeted.
        course_id: u64,
    },

    // ========================================================================
    // Backend Errors
    // ========================================================================
    /// The requested resource does not exist.
    #[error("Not found: {resource}")]
    NotFound {
        /// Description of the missing resource.
        resource: String,
    },

    /// The backend rejected the request (4xx); the message is shown verbatim.
    #[error("{message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// The backend failed (5xx).
    #[error("Server error ({status}): {message}\n\nSuggestion: Retry later; the LMS backend may be experiencing issues")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// The request never reached the backend or the connection dropped.
    #[error("Network error: {message}\n\nSuggestion: Check your connection and the apiBaseUrl setting")]
    Network {
        /// Description of the transport failure.
        message: String,
    },

    /// The backend answered with a body that could not be decoded.
    #[error("Unexpected response from backend: {message}")]
    Decode {
        /// Description of the decode failure.
        message: String,
    },

    // ========================================================================
    // Quiz Errors
    // ========================================================================
    /// No attempts remain for this quiz.
    #[error("No attempts remaining for quiz {quiz_id}")]
    QuizLocked {
        /// The locked quiz.
        quiz_id: u64,
    },

    /// The quiz has no questions to answer.
    #[error("Quiz {quiz_id} has no questions")]
    EmptyQuiz {
        /// The empty quiz.
        quiz_id: u64,
    },

    /// A retake was requested but is not permitted.
    #[error("Retake not allowed: {reason}")]
    RetakeNotAllowed {
        /// Why the retake is refused.
        reason: String,
    },

    /// A submission for this attempt is already on its way to the backend.
    #[error("A submission for this attempt is already in progress")]
    SubmissionInFlight,

    /// An incomplete submission needs explicit confirmation.
    #[error("{unanswered} question(s) unanswered; confirm to submit anyway")]
    ConfirmationRequired {
        /// Number of unanswered questions.
        unanswered: usize,
    },

    /// A question index outside the quiz was requested.
    #[error("Question {index} is out of range (quiz has {total} questions)")]
    QuestionOutOfRange {
        /// Requested 0-based index.
        index: usize,
        /// Number of questions in the quiz.
        total: usize,
    },

    /// An answer referenced a question that is not part of the quiz.
    #[error("Question {question_id} is not part of this quiz")]
    UnknownQuestion {
        /// The unknown question id.
        question_id: u64,
    },

    // ========================================================================
    // Lesson & Enrollment Errors
    // ========================================================================
    /// The lesson's quiz must be passed before the lesson can be completed.
    #[error("You must pass the quiz before marking lesson {lesson_id} as complete ({attempts_remaining} attempt(s) remaining)")]
    LessonGated {
        /// The gated lesson.
        lesson_id: u64,
        /// Quiz attempts still available.
        attempts_remaining: u32,
    },

    /// The user may not enroll in this course.
    #[error("Cannot enroll in course {course_id}: {reason}")]
    NotEligibleToEnroll {
        /// Target course.
        course_id: u64,
        /// Why enrollment is refused.
        reason: String,
    },

    /// Another request for the same entity is still outstanding.
    #[error("A request for {entity} is already in progress")]
    ActionInFlight {
        /// Entity the pending request targets (e.g. `course 3`).
        entity: String,
    },

    // ========================================================================
    // Certificate Errors
    // ========================================================================
    /// The text is not a certificate id.
    #[error("Invalid certificate ID '{value}'\n\nSuggestion: Certificate IDs look like CERT-3BE755FC96B9")]
    InvalidCertificateId {
        /// The rejected input.
        value: String,
    },

    // ========================================================================
    // Session Persistence Errors
    // ========================================================================
    /// The stored session file is unreadable.
    #[error("Corrupted session file '{path}': {message}\n\nSuggestion: Remove the file and log in again")]
    SessionFileCorrupted {
        /// Path to the session file.
        path: PathBuf,
        /// Description of the corruption.
        message: String,
    },

    // ========================================================================
    // General Errors
    // ========================================================================
    /// General I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid state transition attempted.
    #[error("Invalid state transition: cannot go from {from} to {to}")]
    InvalidStateTransition {
        /// The current state.
        from: String,
        /// The attempted target state.
        to: String,
    },
}

/// How an error should be handled by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad local input; fix and retry, nothing was sent.
    Validation,
    /// Missing or expired credentials.
    Authorization,
    /// Duplicate operation that callers may treat as success.
    Conflict,
    /// Network or server failure; local state is untouched and a retry may succeed.
    Transient,
    /// The operation is not allowed in the current state.
    State,
    /// Configuration, persistence or decode problems.
    Other,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Authorization => write!(f, "authorization"),
            Self::Conflict => write!(f, "conflict"),
            Self::Transient => write!(f, "transient"),
            Self::State => write!(f, "state"),
            Self::Other => write!(f, "other"),
        }
    }
}

impl LecternError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `Validation` error for a form field.
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Creates a new `Api` error.
    #[must_use]
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Creates a new `Server` error.
    #[must_use]
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    /// Creates a new `Network` error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates a new `Decode` error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates a new `RetakeNotAllowed` error.
    #[must_use]
    pub fn retake_not_allowed(reason: impl Into<String>) -> Self {
        Self::RetakeNotAllowed {
            reason: reason.into(),
        }
    }

    /// Creates a new `NotEligibleToEnroll` error.
    #[must_use]
    pub fn not_eligible(course_id: u64, reason: impl Into<String>) -> Self {
        Self::NotEligibleToEnroll {
            course_id,
            reason: reason.into(),
        }
    }

    /// Creates a new `ActionInFlight` error.
    #[must_use]
    pub fn action_in_flight(entity: impl Into<String>) -> Self {
        Self::ActionInFlight {
            entity: entity.into(),
        }
    }

    /// Creates a new `InvalidCertificateId` error.
    #[must_use]
    pub fn invalid_certificate_id(value: impl Into<String>) -> Self {
        Self::InvalidCertificateId {
            value: value.into(),
        }
    }

    /// Creates a new `SessionFileCorrupted` error.
    #[must_use]
    pub fn session_corrupted(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::SessionFileCorrupted {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `InvalidStateTransition` error.
    #[must_use]
    pub fn invalid_transition(from: impl std::fmt::Display, to: impl std::fmt::Display) -> Self {
        Self::InvalidStateTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Returns the handling category for this error.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. } | Self::InvalidCertificateId { .. } => {
                ErrorCategory::Validation
            }
            Self::NotAuthenticated | Self::SessionExpired | Self::Forbidden { .. } => {
                ErrorCategory::Authorization
            }
            Self::AlreadyEnrolled { .. } => ErrorCategory::Conflict,
            Self::Network { .. } | Self::Server { .. } => ErrorCategory::Transient,
            Self::QuizLocked { .. }
            | Self::EmptyQuiz { .. }
            | Self::RetakeNotAllowed { .. }
            | Self::SubmissionInFlight
            | Self::ConfirmationRequired { .. }
            | Self::QuestionOutOfRange { .. }
            | Self::UnknownQuestion { .. }
            | Self::LessonGated { .. }
            | Self::NotEligibleToEnroll { .. }
            | Self::ActionInFlight { .. }
            | Self::InvalidStateTransition { .. } => ErrorCategory::State,
            Self::ConfigParseError { .. }
            | Self::ConfigValidationError { .. }
            | Self::NotFound { .. }
            | Self::Api { .. }
            | Self::Decode { .. }
            | Self::SessionFileCorrupted { .. }
            | Self::Io(_)
            | Self::Json(_) => ErrorCategory::Other,
        }
    }

    /// Returns `true` if this error is transient and may be retried.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self.category(), ErrorCategory::Transient)
    }

    /// Returns `true` if the user has to log in (again) to continue.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::NotAuthenticated | Self::SessionExpired)
    }

    /// Returns `true` if this is a backend "already enrolled" rejection.
    ///
    /// Only `400` and `409` responses whose message mentions an existing
    /// enrollment qualify.
    #[must_use]
    pub fn is_duplicate_enrollment(&self) -> bool {
        match self {
            Self::AlreadyEnrolled { .. } => true,
            Self::Api { status, message } => {
                matches!(status, 400 | 409) && message.to_lowercase().contains("already enrolled")
            }
            _ => false,
        }
    }
}
