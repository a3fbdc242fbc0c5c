//! Testrun Core - Entity Types
//!
//! Data structures shared by every crate in the workspace: identifiers,
//! entities, the property catalog, search predicates and errors.

pub mod entities;
pub mod enums;
pub mod error;
pub mod filter;
pub mod identity;
pub mod properties;
pub mod query;

pub use entities::{
    TestCase, TestPlan, TestRun, TestRunColumn, TestRunStep, TestRunSummary, TestSuite,
    UserProfile,
};
pub use enums::{EntityType, PropertyType, PropertyTypeParseError, SortDirection};
pub use error::{StorageError, TestRunError, TestRunResult, ValidationError};
pub use filter::{CaseCondition, RunCondition, SuiteRestriction};
pub use identity::{
    EntityIdParseError, EntityIdType, TestCaseId, TestPlanId, TestRunId, TestSuiteId, Timestamp,
    UserId,
};
pub use properties::{is_known_property, property, ColumnDescriptor, PropertyDef, PROPERTIES};
pub use query::{coerce_number, supplied, OperationContext, TestRunQuery};
