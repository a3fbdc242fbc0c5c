//! Service Layer
//!
//! Suite hierarchy resolution, column preferences, condition building and the
//! aggregating run views. Every service receives its collaborators as trait
//! objects at construction time.

mod column_service;
mod condition_builder;
mod suite_hierarchy;
mod test_run_service;

pub use column_service::*;
pub use condition_builder::*;
pub use suite_hierarchy::{SuiteHierarchy, SuiteSource};
pub use test_run_service::*;
