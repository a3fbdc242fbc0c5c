//! Identity types for test plan entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Common behaviour of the strongly-typed entity identifiers.
///
/// Every id is a thin wrapper over a UUID so ids of different entity kinds
/// cannot be mixed up at call sites.
pub trait EntityIdType:
    Copy + Eq + Ord + std::hash::Hash + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// Wrap an existing UUID.
    fn new(uuid: Uuid) -> Self;

    /// Borrow the underlying UUID.
    fn as_uuid(&self) -> Uuid;

    /// Generate a new timestamp-sortable id.
    fn now_v7() -> Self {
        Self::new(Uuid::now_v7())
    }

    /// The nil id, useful as a placeholder in tests.
    fn nil() -> Self {
        Self::new(Uuid::nil())
    }
}

/// Error when a string cannot be parsed into an entity id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityIdParseError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for EntityIdParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid {} id: {}", self.kind, self.value)
    }
}

impl std::error::Error for EntityIdParseError {}

macro_rules! define_entity_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl EntityIdType for $name {
            fn new(uuid: Uuid) -> Self {
                Self(uuid)
            }

            fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0.simple())
            }
        }

        impl FromStr for $name {
            type Err = EntityIdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|_| EntityIdParseError {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

define_entity_id!(
    /// Identifier of a single test run.
    TestRunId,
    "test run"
);
define_entity_id!(
    /// Identifier of a test plan.
    TestPlanId,
    "test plan"
);
define_entity_id!(
    /// Identifier of a test suite (tree node).
    TestSuiteId,
    "test suite"
);
define_entity_id!(
    /// Identifier of a test case.
    TestCaseId,
    "test case"
);
define_entity_id!(
    /// Identifier of a user in the user directory.
    UserId,
    "user"
);
