//! JSON report generation.
//!
//! [`JsonGenerator`] serializes any report type to compact or pretty JSON
//! and can write the result straight to a file.
//!
//! # Example
//!
//! ```rust
//! use lectern_report::{InstructorReport, InstructorTotals};
//! use lectern_report::json::JsonGenerator;
//!
//! let report = InstructorReport::new("Grace Hopper", InstructorTotals::default(), vec![]);
//! let json = JsonGenerator::new(&report).generate().unwrap();
//! assert!(!json.contains('\n'));
//! ```

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::{ReportError, Result};

/// JSON report generator.
///
/// Works with any serializable report; both [`crate::ProgressReport`] and
/// [`crate::InstructorReport`] go through it.
///
/// # Example
///
/// ```rust
/// use lectern_report::{InstructorReport, InstructorTotals, json::JsonGenerator};
///
/// let report = InstructorReport::new("Grace Hopper", InstructorTotals::default(), vec![]);
/// let generator = JsonGenerator::new(&report);
///
/// let json = generator.generate_pretty().unwrap();
/// assert!(json.contains("\"instructor\": \"Grace Hopper\""));
/// ```
pub struct JsonGenerator<'a, T: Serialize> {
    report: &'a T,
}

impl<'a, T: Serialize> JsonGenerator<'a, T> {
    /// Creates a new JSON generator for the given report.
    ///
    /// # Example
    ///
    /// ```rust
    /// use lectern_report::{LearnerSummary, ProgressReport, json::JsonGenerator};
    ///
    /// let report = ProgressReport::builder()
    ///     .student("Ada Lovelace")
    ///     .summary(LearnerSummary::default())
    ///     .build()
    ///     .unwrap();
    /// let generator = JsonGenerator::new(&report);
    /// ```
    #[must_use]
    pub const fn new(report: &'a T) -> Self {
        Self { report }
    }

    /// Generates compact JSON (single line).
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Serialization`] if JSON serialization fails.
    ///
    /// # Example
    ///
    /// ```rust
    /// use lectern_report::{InstructorReport, InstructorTotals, json::JsonGenerator};
    ///
    /// let report = InstructorReport::new("Grace Hopper", InstructorTotals::default(), vec![]);
    /// let json = JsonGenerator::new(&report).generate().unwrap();
    ///
    /// // Compact JSON has no newlines
    /// assert!(!json.contains('\n'));
    /// ```
    pub fn generate(&self) -> Result<String> {
        serde_json::to_string(self.report).map_err(ReportError::from)
    }

    /// Generates pretty-printed JSON with 2-space indentation.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Serialization`] if JSON serialization fails.
    ///
    /// # Example
    ///
    /// ```rust
    /// use lectern_report::{LearnerSummary, ProgressReport, json::JsonGenerator};
    ///
    /// let report = ProgressReport::builder()
    ///     .student("Ada Lovelace")
    ///     .summary(LearnerSummary::default())
    ///     .build()
    ///     .unwrap();
    /// let json = JsonGenerator::new(&report).generate_pretty().unwrap();
    ///
    /// assert!(json.contains('\n'));
    /// assert!(json.contains("  \"student\": \"Ada Lovelace\""));
    /// ```
    pub fn generate_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self.report).map_err(ReportError::from)
    }

    /// Writes the report to `path`, creating or overwriting it.
    ///
    /// Parent directories must exist.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Serialization`] if serialization fails and
    /// [`ReportError::Io`] if the file cannot be written.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use lectern_report::{InstructorReport, InstructorTotals, json::JsonGenerator};
    /// use std::path::Path;
    ///
    /// let report = InstructorReport::new("Grace Hopper", InstructorTotals::default(), vec![]);
    /// let generator = JsonGenerator::new(&report);
    ///
    /// // Pretty for people, compact for scripts
    /// generator.write_to_file(Path::new("lectern-course-report.json"), true).unwrap();
    /// generator.write_to_file(Path::new("lectern-course-report.min.json"), false).unwrap();
    /// ```
    pub fn write_to_file(&self, path: &Path, pretty: bool) -> Result<()> {
        let json = if pretty {
            self.generate_pretty()?
        } else {
            self.generate()?
        };

        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;

        Ok(())
    }
}
