//! Testrun Service - Run Views
//!
//! Builds search conditions from raw run queries and aggregates paginated
//! run listings with their users, suites, columns and cases.

pub mod config;
pub mod error;
pub mod services;
pub mod telemetry;

pub use config::{ConfigError, ServiceConfig};
pub use error::{ErrorCode, ServiceError, ServiceResult};
pub use services::{
    describe, Collaborators, ColumnService, ColumnSettings, ConditionBuilder, PageRequest,
    SetColumnsRequest, SuiteHierarchy, SuiteSource, TestRunDetail, TestRunPage, TestRunService,
};
pub use telemetry::{init_tracing, LogFormat, TelemetryConfig};
