//! Course catalog filtering, sorting and display helpers.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LecternError;
use crate::model::{Course, CourseLevel, UserRef};

/// Sort orders offered by the catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CourseSort {
    /// Most recently created first (default).
    #[default]
    Newest,
    /// Oldest first.
    Oldest,
    /// Cheapest first.
    PriceLow,
    /// Most expensive first.
    PriceHigh,
    /// Shortest first.
    DurationShort,
    /// Longest first.
    DurationLong,
    /// Most students first.
    Popular,
    /// Most lessons first.
    Lessons,
}

impl CourseSort {
    /// Every sort order, in menu order.
    pub const ALL: [Self; 8] = [
        Self::Newest,
        Self::Oldest,
        Self::PriceLow,
        Self::PriceHigh,
        Self::DurationShort,
        Self::DurationLong,
        Self::Popular,
        Self::Lessons,
    ];

    /// Wire/CLI name of the sort order.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::PriceLow => "price-low",
            Self::PriceHigh => "price-high",
            Self::DurationShort => "duration-short",
            Self::DurationLong => "duration-long",
            Self::Popular => "popular",
            Self::Lessons => "lessons",
        }
    }

    fn from_str_case_insensitive(s: &str) -> Option<Self> {
        let lowered = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|sort| sort.as_str() == lowered)
    }

    fn compare(self, a: &Course, b: &Course) -> Ordering {
        match self {
            Self::Newest => b.created_at.cmp(&a.created_at),
            Self::Oldest => a.created_at.cmp(&b.created_at),
            Self::PriceLow => a.price.total_cmp(&b.price),
            Self::PriceHigh => b.price.total_cmp(&a.price),
            Self::DurationShort => a.duration_hours.total_cmp(&b.duration_hours),
            Self::DurationLong => b.duration_hours.total_cmp(&a.duration_hours),
            Self::Popular => b.total_students.cmp(&a.total_students),
            Self::Lessons => b.total_lessons.cmp(&a.total_lessons),
        }
    }
}

impl std::fmt::Display for CourseSort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CourseSort {
    type Err = LecternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_case_insensitive(s).ok_or_else(|| {
            LecternError::validation(
                "sort",
                format!(
                    "unknown sort order '{s}': expected one of {}",
                    Self::ALL.map(Self::as_str).join(", ")
                ),
            )
        })
    }
}

impl<'de> Deserialize<'de> for CourseSort {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str_case_insensitive(&s).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid sort order '{s}': expected one of {}",
                Self::ALL.map(Self::as_str).join(", ")
            ))
        })
    }
}

impl Serialize for CourseSort {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Search, filter and sort parameters for the catalog.
#[derive(Debug, Clone, Default)]
pub struct CourseQuery {
    /// Case-insensitive search over title, description, instructor name and category.
    pub search: Option<String>,
    /// Exact category match.
    pub category: Option<String>,
    /// Exact level match.
    pub level: Option<CourseLevel>,
    /// Sort order.
    pub sort: CourseSort,
}

impl CourseQuery {
    /// Returns `true` if the course passes the search and filters.
    #[must_use]
    pub fn matches(&self, course: &Course) -> bool {
        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty()) {
            if course.category != category {
                return false;
            }
        }

        if let Some(level) = self.level {
            if course.level != level {
                return false;
            }
        }

        let Some(term) = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
        else {
            return true;
        };
        let term = term.to_lowercase();
        let contains = |s: &str| s.to_lowercase().contains(&term);

        let instructor_match = course
            .instructor
            .as_ref()
            .and_then(UserRef::summary)
            .is_some_and(|i| contains(&i.first_name) || contains(&i.last_name));

        contains(&course.title)
            || contains(&course.description)
            || instructor_match
            || contains(&course.category)
    }

    /// Filters and sorts the courses. Sorting is stable.
    #[must_use]
    pub fn apply(&self, courses: &[Course]) -> Vec<Course> {
        let mut result: Vec<Course> = courses.iter().filter(|c| self.matches(c)).cloned().collect();
        result.sort_by(|a, b| self.sort.compare(a, b));
        result
    }
}

/// Distinct non-empty categories, sorted.
#[must_use]
pub fn categories(courses: &[Course]) -> Vec<String> {
    let mut cats: Vec<String> = courses
        .iter()
        .map(|c| c.category.trim())
        .filter(|c| !c.is_empty())
        .map(ToString::to_string)
        .collect();
    cats.sort();
    cats.dedup();
    cats
}

/// Formats a course duration given in hours.
///
/// `0.5` becomes `30 min`, `1.0` becomes `1 hour`, `2.25` becomes `2 hr 15 min`.
/// Zero or negative durations render as `N/A`.
#[must_use]
pub fn format_course_duration(hours: f64) -> String {
    if hours <= 0.0 || !hours.is_finite() {
        return "N/A".to_string();
    }
    let whole_hours = hours.floor();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (whole, minutes) = (
        whole_hours as u64,
        ((hours - whole_hours) * 60.0).round() as u64,
    );

    match (whole, minutes) {
        (0, m) => format!("{m} min"),
        (1, 0) => "1 hour".to_string(),
        (h, 0) => format!("{h} hours"),
        (h, 60) => format!("{} hours", h + 1),
        (h, m) => format!("{h} hr {m} min"),
    }
}

/// Formats a quiz time limit given in minutes: `45m`, `1h 30m`.
#[must_use]
pub fn format_time_limit(minutes: u32) -> String {
    if minutes >= 60 {
        format!("{}h {}m", minutes / 60, minutes % 60)
    } else {
        format!("{minutes}m")
    }
}

/// Formats a price; zero is shown as `Free`.
#[must_use]
pub fn format_price(price: f64) -> String {
    if price <= 0.0 {
        "Free".to_string()
    } else {
        format!("${price:.2}")
    }
}
