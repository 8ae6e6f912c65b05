//! Local validation of user-entered forms.
//!
//! Every check here runs before anything is sent; a failure is a
//! `LecternError::Validation` naming the first offending field.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{LecternError, Result};
use crate::model::{AnswerChoice, ContentType, CourseLevel, Credentials, Registration};

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$").ok());

fn require(field: &str, value: &str, label: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LecternError::validation(field, format!("{label} is required")));
    }
    Ok(())
}

/// Returns `true` if the address looks like an email.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN
        .as_ref()
        .is_some_and(|re| re.is_match(email.trim()))
}

/// Validates a login form.
pub fn validate_credentials(credentials: &Credentials) -> Result<()> {
    require("username", &credentials.username, "Username")?;
    if credentials.password.is_empty() {
        return Err(LecternError::validation("password", "Password is required"));
    }
    Ok(())
}

/// Validates a registration form.
pub fn validate_registration(registration: &Registration) -> Result<()> {
    require("username", &registration.username, "Username")?;
    require("email", &registration.email, "Email")?;
    if !is_valid_email(&registration.email) {
        return Err(LecternError::validation("email", "Email address is invalid"));
    }
    if registration.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(LecternError::validation(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    if registration.password != registration.password2 {
        return Err(LecternError::validation("password2", "Passwords do not match"));
    }
    Ok(())
}

// ============================================================================
// Course authoring
// ============================================================================

/// Course create/update form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseDraft {
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Category.
    pub category: String,
    /// Level; required.
    pub level: Option<CourseLevel>,
    /// Duration in hours, at least 1.
    pub duration_hours: f64,
    /// Price, 0 for free.
    #[serde(default)]
    pub price: f64,
    /// Publish immediately.
    #[serde(default)]
    pub is_published: bool,
    /// Learning outcomes; blank entries are dropped.
    #[serde(default)]
    pub learning_outcomes: Vec<String>,
}

impl CourseDraft {
    /// Validates the form and returns the cleaned payload.
    pub fn validated(&self) -> Result<Self> {
        require("title", &self.title, "Title")?;
        require("description", &self.description, "Description")?;
        require("category", &self.category, "Category")?;
        if self.level.is_none() {
            return Err(LecternError::validation("level", "Level is required"));
        }
        if self.duration_hours.is_nan() || self.duration_hours < 1.0 {
            return Err(LecternError::validation(
                "duration_hours",
                "Duration must be at least 1 hour",
            ));
        }
        if self.price.is_nan() || self.price < 0.0 {
            return Err(LecternError::validation("price", "Price cannot be negative"));
        }

        Ok(Self {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            category: self.category.trim().to_string(),
            learning_outcomes: self
                .learning_outcomes
                .iter()
                .map(|o| o.trim())
                .filter(|o| !o.is_empty())
                .map(ToString::to_string)
                .collect(),
            ..self.clone()
        })
    }
}

/// Lesson create/update form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LessonDraft {
    /// Owning course.
    pub course: u64,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Kind of content.
    pub content_type: ContentType,
    /// Body.
    pub content: String,
    /// Position in the course.
    #[serde(default)]
    pub order: i32,
    /// Estimated duration.
    #[serde(default)]
    pub duration_minutes: u32,
    /// Video URL for video lessons.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

impl LessonDraft {
    /// Validates the form.
    pub fn validate(&self) -> Result<()> {
        require("title", &self.title, "Title")?;
        require("description", &self.description, "Description")?;
        require("content", &self.content, "Content")?;
        if self.content_type == ContentType::Video
            && self.video_url.as_deref().map_or(true, |u| u.trim().is_empty())
        {
            return Err(LecternError::validation(
                "video_url",
                "Video lessons need a video URL",
            ));
        }
        Ok(())
    }
}

/// Quiz create form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizDraft {
    /// Lesson the quiz is attached to.
    pub lesson: u64,
    /// Title.
    pub title: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Instructions.
    #[serde(default)]
    pub instructions: String,
    /// Percentage needed to pass, 0–100.
    pub passing_score: f64,
    /// Attempts allowed, at least 1.
    pub max_attempts: u32,
    /// Optional countdown in minutes, positive when set.
    #[serde(default)]
    pub time_limit_minutes: Option<u32>,
}

impl QuizDraft {
    /// Validates the form.
    pub fn validate(&self) -> Result<()> {
        require("title", &self.title, "Title")?;
        if !(0.0..=100.0).contains(&self.passing_score) {
            return Err(LecternError::validation(
                "passing_score",
                "Passing score must be between 0 and 100",
            ));
        }
        if self.max_attempts == 0 {
            return Err(LecternError::validation(
                "max_attempts",
                "At least one attempt must be allowed",
            ));
        }
        if self.time_limit_minutes == Some(0) {
            return Err(LecternError::validation(
                "time_limit_minutes",
                "Time limit must be positive",
            ));
        }
        Ok(())
    }
}

/// Question create form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionDraft {
    /// Owning quiz.
    pub quiz: u64,
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
    /// Correct option.
    pub correct_answer: AnswerChoice,
    /// Weight, at least 1.
    pub points: u32,
    /// Shown after grading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl QuestionDraft {
    /// Validates the form.
    pub fn validate(&self) -> Result<()> {
        require("question_text", &self.question_text, "Question text")?;
        for (field, value) in [
            ("option_a", &self.option_a),
            ("option_b", &self.option_b),
            ("option_c", &self.option_c),
            ("option_d", &self.option_d),
        ] {
            require(field, value, "Every option")?;
        }
        if self.points == 0 {
            return Err(LecternError::validation("points", "Points must be at least 1"));
        }
        Ok(())
    }
}
