//! Normalized search predicates
//!
//! `RunCondition` is the predicate handed to the run repository after the raw
//! query has been coerced and the case facets have been folded into a single
//! `test_case_id` restriction. `CaseCondition` is the per-facet predicate sent
//! to the case repository.

use crate::{TestCase, TestCaseId, TestPlanId, TestRun, TestSuiteId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Restriction on a run's suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum SuiteRestriction {
    /// Only runs with no suite assigned.
    Unassigned,
    /// Only runs in exactly this suite.
    Exact(TestSuiteId),
}

impl SuiteRestriction {
    pub fn matches(&self, suite_id: Option<TestSuiteId>) -> bool {
        match self {
            SuiteRestriction::Unassigned => suite_id.is_none(),
            SuiteRestriction::Exact(id) => suite_id == Some(*id),
        }
    }
}

/// Predicate over test runs.
///
/// Every `Some` field is an exact-match restriction; `None` means the field is
/// not constrained at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCondition {
    pub test_plan_id: TestPlanId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executor_uid: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_case_ids: Option<BTreeSet<TestCaseId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suite: Option<SuiteRestriction>,
}

impl RunCondition {
    /// Condition matching every run of a plan.
    pub fn for_plan(test_plan_id: TestPlanId) -> Self {
        Self {
            test_plan_id,
            executor_uid: None,
            priority: None,
            status: None,
            test_case_ids: None,
            suite: None,
        }
    }

    /// Evaluate the condition against one run.
    pub fn matches(&self, run: &TestRun) -> bool {
        if run.test_plan_id != self.test_plan_id {
            return false;
        }
        if let Some(uid) = self.executor_uid {
            if run.executor_uid != Some(uid) {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if run.priority != priority {
                return false;
            }
        }
        if let Some(status) = self.status {
            if run.status != status {
                return false;
            }
        }
        if let Some(ids) = &self.test_case_ids {
            if !ids.contains(&run.test_case_id) {
                return false;
            }
        }
        if let Some(suite) = &self.suite {
            if !suite.matches(run.suite_id) {
                return false;
            }
        }
        true
    }
}

/// Predicate over test cases, one per case-level facet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "facet", content = "value")]
pub enum CaseCondition {
    /// Case-insensitive substring of the title. The term is stored trimmed.
    TitleContains(String),
    ImportantLevel(i64),
    CaseType(i64),
}

impl CaseCondition {
    /// Build a title facet, trimming the term.
    pub fn title(term: &str) -> Self {
        CaseCondition::TitleContains(term.trim().to_string())
    }

    pub fn matches(&self, case: &TestCase) -> bool {
        match self {
            CaseCondition::TitleContains(term) => case
                .title
                .to_lowercase()
                .contains(&term.to_lowercase()),
            CaseCondition::ImportantLevel(level) => case.important_level == *level,
            CaseCondition::CaseType(case_type) => case.case_type == *case_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EntityIdType;
    use chrono::Utc;

    fn run(plan: TestPlanId, case: TestCaseId, suite: Option<TestSuiteId>) -> TestRun {
        TestRun {
            test_run_id: crate::TestRunId::now_v7(),
            test_plan_id: plan,
            suite_id: suite,
            test_case_id: case,
            executor_uid: None,
            priority: 1,
            status: 0,
            steps: Vec::new(),
            updated_at: Utc::now(),
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_plan_condition_matches_only_that_plan() {
        let plan = TestPlanId::now_v7();
        let condition = RunCondition::for_plan(plan);
        assert!(condition.matches(&run(plan, TestCaseId::now_v7(), None)));
        assert!(!condition.matches(&run(TestPlanId::now_v7(), TestCaseId::now_v7(), None)));
    }

    #[test]
    fn test_empty_case_restriction_matches_nothing() {
        let plan = TestPlanId::now_v7();
        let mut condition = RunCondition::for_plan(plan);
        condition.test_case_ids = Some(BTreeSet::new());
        assert!(!condition.matches(&run(plan, TestCaseId::now_v7(), None)));
    }

    #[test]
    fn test_suite_restrictions() {
        let plan = TestPlanId::now_v7();
        let suite = TestSuiteId::now_v7();
        let in_suite = run(plan, TestCaseId::now_v7(), Some(suite));
        let no_suite = run(plan, TestCaseId::now_v7(), None);

        let mut condition = RunCondition::for_plan(plan);
        condition.suite = Some(SuiteRestriction::Unassigned);
        assert!(condition.matches(&no_suite));
        assert!(!condition.matches(&in_suite));

        condition.suite = Some(SuiteRestriction::Exact(suite));
        assert!(condition.matches(&in_suite));
        assert!(!condition.matches(&no_suite));
    }

    #[test]
    fn test_unset_fields_are_not_serialized() {
        let condition = RunCondition::for_plan(TestPlanId::nil());
        let value = serde_json::to_value(&condition).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert!(object.contains_key("test_plan_id"));
    }

    #[test]
    fn test_title_condition_is_case_insensitive_and_trimmed() {
        let case = TestCase {
            test_case_id: TestCaseId::now_v7(),
            title: "Login With SSO".to_string(),
            important_level: 2,
            case_type: 1,
        };
        assert!(CaseCondition::title("  with sso ").matches(&case));
        assert!(!CaseCondition::title("logout").matches(&case));
        assert!(CaseCondition::ImportantLevel(2).matches(&case));
        assert!(!CaseCondition::CaseType(2).matches(&case));
    }
}
