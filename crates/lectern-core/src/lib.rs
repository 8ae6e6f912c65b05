//! Lectern core
//!
//! Domain model, backend contract and the client-side state machines of the
//! Lectern LMS client: quiz sessions, progress aggregation, enrollment and
//! lesson gating.

pub mod attempt;
pub mod backend;
pub mod catalog;
pub mod certificate;
pub mod config;
pub mod enrollment;
pub mod error;
pub mod events;
pub mod forms;
pub mod lesson;
pub mod model;
pub mod pending;
pub mod progress;
pub mod quiz;

pub use attempt::AttemptRunner;
pub use backend::{
    AuthApi, CertificateApi, CourseApi, InstructorApi, LessonApi, ProgressApi, QuizApi,
};
pub use catalog::{CourseQuery, CourseSort};
pub use certificate::CertificateId;
pub use config::{CatalogSettings, Config, QuizSettings};
pub use enrollment::{
    Confirmation, EnrollOutcome, EnrollmentManager, EnrollmentStatus, UnenrollOutcome,
};
pub use error::{ErrorCategory, LecternError, Result};
pub use events::{EventHub, LearnerEvent, SessionEndReason};
pub use forms::{CourseDraft, LessonDraft, QuestionDraft, QuizDraft};
pub use lesson::LessonCompleter;
pub use progress::{CourseProgress, ProgressOverview};
pub use quiz::{QuizPhase, QuizSession, SubmitTrigger, TickOutcome};
