//! Service Configuration
//!
//! Paging limits and the reserved "no suite" query value. Loaded from
//! environment variables with defaults suitable for development.

use thiserror::Error;

/// Default page size when the caller does not supply one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Upper bound on the page size a caller may request.
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 100;

/// Query value of `suite_id` selecting runs that have no suite.
pub const DEFAULT_NULL_SUITE_ARG: &str = "-1";

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Configuration for the test run views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Page size used when the caller omits one or passes zero.
    pub default_page_size: u32,

    /// Larger requested page sizes are clamped to this value.
    pub max_page_size: u32,

    /// Reserved `suite_id` query value meaning "runs without a suite".
    pub null_suite_arg: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            null_suite_arg: DEFAULT_NULL_SUITE_ARG.to_string(),
        }
    }
}

impl ServiceConfig {
    /// Create ServiceConfig from environment variables.
    ///
    /// Environment variables:
    /// - `TESTRUN_DEFAULT_PAGE_SIZE`: page size when none is requested (default: 20)
    /// - `TESTRUN_MAX_PAGE_SIZE`: largest page size served (default: 100)
    /// - `TESTRUN_NULL_SUITE_ARG`: reserved "no suite" query value (default: "-1")
    pub fn from_env() -> Self {
        let default_page_size = std::env::var("TESTRUN_DEFAULT_PAGE_SIZE")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_PAGE_SIZE);

        let max_page_size = std::env::var("TESTRUN_MAX_PAGE_SIZE")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_MAX_PAGE_SIZE);

        let null_suite_arg = std::env::var("TESTRUN_NULL_SUITE_ARG")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_NULL_SUITE_ARG.to_string());

        Self {
            default_page_size,
            max_page_size,
            null_suite_arg,
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_page_size".to_string(),
                value: self.max_page_size.to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(ConfigError::InvalidValue {
                field: "default_page_size".to_string(),
                value: self.default_page_size.to_string(),
                reason: format!("must be between 1 and {}", self.max_page_size),
            });
        }
        Ok(())
    }

    /// Page size to use for a request.
    pub fn resolve_page_size(&self, requested: Option<u32>) -> u32 {
        match requested {
            None | Some(0) => self.default_page_size,
            Some(size) => size.min(self.max_page_size),
        }
    }
}
