//! Core entity structures

use crate::{TestCaseId, TestPlanId, TestRunId, TestSuiteId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// One step recorded on a test run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRunStep {
    pub description: String,
    pub expected: Option<String>,
    pub status: Option<i64>,
    pub actual: Option<String>,
}

/// TestRun - one executed-or-pending instance of a test case within a plan.
///
/// Fields not modelled here (custom plan properties) are kept in `extra` and
/// are addressable by key from the property catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRun {
    #[serde(rename = "_id")]
    pub test_run_id: TestRunId,
    pub test_plan_id: TestPlanId,
    pub suite_id: Option<TestSuiteId>,
    pub test_case_id: TestCaseId,
    pub executor_uid: Option<UserId>,
    pub priority: i64,
    pub status: i64,
    #[serde(default)]
    pub steps: Vec<TestRunStep>,
    pub updated_at: Timestamp,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The fixed projection of a run returned by the detail view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRunSummary {
    #[serde(rename = "_id")]
    pub test_run_id: TestRunId,
    pub executor_uid: Option<UserId>,
    pub priority: i64,
    pub suite_id: Option<TestSuiteId>,
    pub status: i64,
    pub test_case_id: TestCaseId,
    pub steps: Vec<TestRunStep>,
}

impl TestRunSummary {
    /// Field names kept by this projection.
    pub const FIELDS: [&'static str; 7] = [
        "_id",
        "executor_uid",
        "priority",
        "suite_id",
        "status",
        "test_case_id",
        "steps",
    ];
}

impl From<TestRun> for TestRunSummary {
    fn from(run: TestRun) -> Self {
        Self {
            test_run_id: run.test_run_id,
            executor_uid: run.executor_uid,
            priority: run.priority,
            suite_id: run.suite_id,
            status: run.status,
            test_case_id: run.test_case_id,
            steps: run.steps,
        }
    }
}

/// TestSuite - a node in the suite tree.
///
/// `parent_ids` lists the ancestors root first, ending with the immediate
/// parent. A root suite has no parents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSuite {
    #[serde(rename = "_id")]
    pub suite_id: TestSuiteId,
    pub name: String,
    #[serde(default)]
    pub parent_ids: Vec<TestSuiteId>,
}

impl TestSuite {
    /// Immediate parent, if any.
    pub fn parent_id(&self) -> Option<TestSuiteId> {
        self.parent_ids.last().copied()
    }
}

/// TestCase - referenced by runs, owned elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    #[serde(rename = "_id")]
    pub test_case_id: TestCaseId,
    pub title: String,
    pub important_level: i64,
    #[serde(rename = "type")]
    pub case_type: i64,
}

/// TestPlan - the set of test cases in scope for a plan's runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestPlan {
    #[serde(rename = "_id")]
    pub test_plan_id: TestPlanId,
    pub name: String,
    #[serde(default)]
    pub test_case_ids: Vec<TestCaseId>,
}

/// Per-user, per-plan column preferences.
///
/// Keyed uniquely by `(uid, test_plan_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRunColumn {
    pub uid: UserId,
    pub test_plan_id: TestPlanId,
    #[serde(default)]
    pub locked_fields: Vec<String>,
    #[serde(default)]
    pub normal_fields: Vec<String>,
}

impl TestRunColumn {
    /// The record a user sees before ever saving columns for a plan.
    pub fn empty(uid: UserId, test_plan_id: TestPlanId) -> Self {
        Self {
            uid,
            test_plan_id,
            locked_fields: Vec::new(),
            normal_fields: Vec::new(),
        }
    }

    /// Whether no columns have been configured.
    pub fn is_empty(&self) -> bool {
        self.locked_fields.is_empty() && self.normal_fields.is_empty()
    }
}

/// User directory profile, restricted to the fields the run views expose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EntityIdType;
    use chrono::Utc;

    fn sample_run() -> TestRun {
        let mut extra = serde_json::Map::new();
        extra.insert("remark".to_string(), serde_json::json!("flaky on ci"));
        TestRun {
            test_run_id: TestRunId::now_v7(),
            test_plan_id: TestPlanId::now_v7(),
            suite_id: None,
            test_case_id: TestCaseId::now_v7(),
            executor_uid: Some(UserId::now_v7()),
            priority: 2,
            status: 1,
            steps: vec![TestRunStep {
                description: "open login page".to_string(),
                expected: Some("form is shown".to_string()),
                status: None,
                actual: None,
            }],
            updated_at: Utc::now(),
            extra,
        }
    }

    #[test]
    fn test_run_flattens_dynamic_fields() {
        let run = sample_run();
        let value = serde_json::to_value(&run).unwrap();
        assert_eq!(value["remark"], "flaky on ci");
        assert!(value.get("_id").is_some());

        let back: TestRun = serde_json::from_value(value).unwrap();
        assert_eq!(back, run);
    }

    #[test]
    fn test_summary_drops_dynamic_fields() {
        let run = sample_run();
        let summary = TestRunSummary::from(run.clone());
        let value = serde_json::to_value(&summary).unwrap();
        assert!(value.get("remark").is_none());
        assert_eq!(value.as_object().unwrap().len(), TestRunSummary::FIELDS.len());
        assert_eq!(summary.steps, run.steps);
    }

    #[test]
    fn test_case_type_uses_wire_name() {
        let case = TestCase {
            test_case_id: TestCaseId::nil(),
            title: "login".to_string(),
            important_level: 1,
            case_type: 3,
        };
        let value = serde_json::to_value(&case).unwrap();
        assert_eq!(value["type"], 3);
    }

    #[test]
    fn test_empty_column_record() {
        let column = TestRunColumn::empty(UserId::nil(), TestPlanId::nil());
        assert!(column.is_empty());
        let parsed: TestRunColumn = serde_json::from_value(serde_json::json!({
            "uid": UserId::nil(),
            "test_plan_id": TestPlanId::nil(),
        }))
        .unwrap();
        assert_eq!(parsed, column);
    }

    #[test]
    fn test_suite_parent_is_last_ancestor() {
        let root = TestSuiteId::now_v7();
        let mid = TestSuiteId::now_v7();
        let suite = TestSuite {
            suite_id: TestSuiteId::now_v7(),
            name: "checkout".to_string(),
            parent_ids: vec![root, mid],
        };
        assert_eq!(suite.parent_id(), Some(mid));
    }
}
