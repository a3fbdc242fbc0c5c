//! Raw run-listing query and caller context

use crate::{UserId, ValidationError};
use serde::{Deserialize, Serialize};

/// Caller identity threaded through every collaborator call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationContext {
    pub uid: UserId,
}

impl OperationContext {
    pub fn new(uid: UserId) -> Self {
        Self { uid }
    }
}

/// Raw query object for the run listing, as received from a client.
///
/// Every facet is optional and still in string form; coercion happens when the
/// search condition is built. Empty strings count as "not supplied".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRunQuery {
    pub title: Option<String>,
    pub executor: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub important_level: Option<String>,
    #[serde(rename = "type")]
    pub case_type: Option<String>,
    pub suite_id: Option<String>,
    pub sort_by: Option<String>,
    pub sort_direction: Option<String>,
}

impl TestRunQuery {
    /// Whether any facet that is resolved against test cases is present.
    pub fn has_case_facets(&self) -> bool {
        supplied(&self.title).is_some()
            || supplied(&self.important_level).is_some()
            || supplied(&self.case_type).is_some()
    }
}

/// Treat `None`, empty and whitespace-only values alike.
pub fn supplied(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Coerce a numeric facet.
///
/// Accepts integers and integral decimals (`"2"`, `" 2 "`, `"2.0"`); anything
/// else, including non-finite and fractional values, is rejected.
pub fn coerce_number(field: &str, raw: &str) -> Result<i64, ValidationError> {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Ok(value);
    }
    let invalid = || ValidationError::InvalidNumber {
        field: field.to_string(),
        value: raw.to_string(),
    };
    let value = trimmed.parse::<f64>().map_err(|_| invalid())?;
    // `i64::MAX as f64` rounds up to 2^63, which is already out of range.
    if !value.is_finite()
        || value.fract() != 0.0
        || value < i64::MIN as f64
        || value >= i64::MAX as f64
    {
        return Err(invalid());
    }
    Ok(value as i64)
}
