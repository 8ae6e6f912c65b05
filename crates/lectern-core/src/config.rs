//! Configuration types for the Lectern client.
//!
//! Settings are read from `lectern.json` (camelCase keys). Every field has a
//! default, so a missing file or an empty object yields a usable config.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::CourseSort;
use crate::error::{LecternError, Result};

/// The default config file name.
pub const CONFIG_FILE_NAME: &str = "lectern.json";

/// Default base URL of the LMS REST API.
fn default_api_base_url() -> String {
    "http://127.0.0.1:8000/api".to_string()
}

/// Default path of the persisted session.
fn default_session_file() -> String {
    ".lectern/session.json".to_string()
}

/// Default per-request timeout in seconds.
const fn default_request_timeout() -> u64 {
    30
}

/// Default output directory for reports.
fn default_output_dir() -> String {
    ".".to_string()
}

/// Default quiz timer period in seconds (one countdown minute).
const fn default_tick_seconds() -> u64 {
    60
}

/// Default value for boolean options that default to true.
const fn default_true() -> bool {
    true
}

/// Main configuration for the Lectern client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Base URL every API path is appended to.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Where the logged-in session is persisted between runs.
    #[serde(default = "default_session_file")]
    pub session_file: String,

    /// Timeout applied to each HTTP request, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Output directory for generated reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Quiz-taking behaviour.
    #[serde(default)]
    pub quiz: QuizSettings,

    /// Course catalog behaviour.
    #[serde(default)]
    pub catalog: CatalogSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            session_file: default_session_file(),
            request_timeout_secs: default_request_timeout(),
            output_dir: default_output_dir(),
            quiz: QuizSettings::default(),
            catalog: CatalogSettings::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// Looks for `lectern.json` in the current directory and falls back to
    /// defaults when it is absent.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            LecternError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads configuration from `lectern.json` inside `dir`.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns `LecternError::ConfigParseError` if the file cannot be read or
    /// is not valid JSON, and `LecternError::ConfigValidationError` if a value
    /// is out of range.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(LecternError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| LecternError::config_parse(path, e.to_string()))?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `LecternError::ConfigValidationError` if any check fails.
    pub fn validate(&self) -> Result<()> {
        let base = self.api_base_url.trim();
        if base.is_empty() {
            return Err(LecternError::config_validation(
                "apiBaseUrl must not be empty",
                "Set apiBaseUrl to your LMS API root, e.g. http://127.0.0.1:8000/api",
            ));
        }

        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(LecternError::config_validation(
                format!("apiBaseUrl '{base}' must start with http:// or https://"),
                "Include the scheme in apiBaseUrl in your lectern.json",
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(LecternError::config_validation(
                "requestTimeoutSecs must be greater than 0",
                "Set requestTimeoutSecs to at least 1 in your lectern.json",
            ));
        }

        if self.session_file.trim().is_empty() {
            return Err(LecternError::config_validation(
                "sessionFile must not be empty",
                "Provide a path such as .lectern/session.json in your lectern.json",
            ));
        }

        if self.output_dir.trim().is_empty() {
            return Err(LecternError::config_validation(
                "outputDir must not be empty",
                "Provide a valid output directory path in your lectern.json (use '.' for current directory)",
            ));
        }

        if self.quiz.tick_seconds == 0 {
            return Err(LecternError::config_validation(
                "quiz.tickSeconds must be greater than 0",
                "Set quiz.tickSeconds to 60 for real-time minutes",
            ));
        }

        Ok(())
    }

    /// Returns the API base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim().trim_end_matches('/')
    }
}

/// Quiz-taking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSettings {
    /// Seconds of wall-clock time per countdown minute.
    #[serde(default = "default_tick_seconds")]
    pub tick_seconds: u64,

    /// Ask before submitting with unanswered questions.
    #[serde(default = "default_true")]
    pub confirm_incomplete: bool,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            tick_seconds: default_tick_seconds(),
            confirm_incomplete: default_true(),
        }
    }
}

/// Course catalog settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSettings {
    /// Sort order applied when none is given on the command line.
    #[serde(default)]
    pub default_sort: CourseSort,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_values() {
        let config = Config::default();

        assert_eq!(config.api_base_url, "http://127.0.0.1:8000/api");
        assert_eq!(config.session_file, ".lectern/session.json");
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.output_dir, ".");
        assert_eq!(config.quiz.tick_seconds, 60);
        assert!(config.quiz.confirm_incomplete);
        assert_eq!(config.catalog.default_sort, CourseSort::Newest);
    }

    #[test]
    fn test_config_deserialization_with_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.api_base_url, "http://127.0.0.1:8000/api");
        assert_eq!(config.quiz.tick_seconds, 60);
    }

    #[test]
    fn test_config_deserialization_with_overrides() {
        let json = r#"{
            "apiBaseUrl": "https://lms.example.org/api/",
            "requestTimeoutSecs": 5,
            "quiz": { "tickSeconds": 1 },
            "catalog": { "defaultSort": "Price-Low" }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();

        assert_eq!(config.base_url(), "https://lms.example.org/api");
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.quiz.tick_seconds, 1);
        assert!(config.quiz.confirm_incomplete);
        assert_eq!(config.catalog.default_sort, CourseSort::PriceLow);
    }

    #[test]
    fn test_invalid_sort_is_rejected() {
        let json = r#"{ "catalog": { "defaultSort": "alphabetical" } }"#;
        let err = serde_json::from_str::<Config>(json).unwrap_err();
        assert!(err.to_string().contains("alphabetical"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config {
            request_timeout_secs: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(LecternError::ConfigValidationError { .. })
        ));

        config.request_timeout_secs = 10;
        config.api_base_url = "lms.local/api".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("http://"));

        config.api_base_url = default_api_base_url();
        config.quiz.tick_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_missing_file_returns_defaults() {
        let path = std::env::temp_dir().join("lectern_test_missing_config.json");
        let _ = std::fs::remove_file(&path);
        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_load_from_file_invalid_json() {
        let path = std::env::temp_dir().join("lectern_test_invalid_config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = Config::load_from_file(&path);
        let _ = std::fs::remove_file(&path);

        assert!(matches!(
            result,
            Err(LecternError::ConfigParseError { .. })
        ));
    }

    #[test]
    fn test_load_from_dir() {
        let dir = std::env::temp_dir().join("lectern_test_config_dir");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join(CONFIG_FILE_NAME),
            r#"{ "outputDir": "reports" }"#,
        )
        .unwrap();

        let config = Config::load_from_dir(&dir).unwrap();
        let _ = std::fs::remove_dir_all(&dir);

        assert_eq!(config.output_dir, "reports");
    }
}
