//! Enum types for test plan entities

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CORE ENUMS
// ============================================================================

/// Entity type discriminator used in errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    TestRun,
    TestSuite,
    TestCase,
    TestPlan,
    TestRunColumn,
    User,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            EntityType::TestRun => "TestRun",
            EntityType::TestSuite => "TestSuite",
            EntityType::TestCase => "TestCase",
            EntityType::TestPlan => "TestPlan",
            EntityType::TestRunColumn => "TestRunColumn",
            EntityType::User => "User",
        };
        write!(f, "{}", value)
    }
}

/// Sort direction for the paginated run listing.
///
/// Wire form is numeric: `1` ascending, `-1` descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// Numeric form stored by the document store.
    pub fn as_i32(&self) -> i32 {
        match self {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        }
    }

    /// Map from the numeric form. Anything other than `1`/`-1` is rejected.
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            1 => Some(SortDirection::Ascending),
            -1 => Some(SortDirection::Descending),
            _ => None,
        }
    }

    /// Apply this direction to an ascending ordering.
    pub fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Display type of a catalog property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Text,
    Number,
    Date,
    Member,
    Select,
    Status,
    Priority,
    Suite,
    Steps,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Text => "text",
            PropertyType::Number => "number",
            PropertyType::Date => "date",
            PropertyType::Member => "member",
            PropertyType::Select => "select",
            PropertyType::Status => "status",
            PropertyType::Priority => "priority",
            PropertyType::Suite => "suite",
            PropertyType::Steps => "steps",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when parsing an invalid property type string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyTypeParseError(pub String);

impl fmt::Display for PropertyTypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid property type: {}", self.0)
    }
}

impl std::error::Error for PropertyTypeParseError {}

impl FromStr for PropertyType {
    type Err = PropertyTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(PropertyType::Text),
            "number" => Ok(PropertyType::Number),
            "date" => Ok(PropertyType::Date),
            "member" => Ok(PropertyType::Member),
            "select" => Ok(PropertyType::Select),
            "status" => Ok(PropertyType::Status),
            "priority" => Ok(PropertyType::Priority),
            "suite" => Ok(PropertyType::Suite),
            "steps" => Ok(PropertyType::Steps),
            other => Err(PropertyTypeParseError(other.to_string())),
        }
    }
}
