//! Testrun Test Utilities
//!
//! Shared test infrastructure for the workspace:
//! - Proptest generators for ids, cases and query facets
//! - A plan fixture builder that seeds `MockStorage`
//! - Service constructors wired to a mock store
//! - Assertions on service error codes

// Re-export mock storage from its source crate
pub use testrun_storage::MockStorage;

// Re-export core types for convenience
pub use testrun_core::{
    EntityIdType, OperationContext, TestCase, TestCaseId, TestPlan, TestPlanId, TestRun,
    TestRunId, TestRunQuery, TestSuite, TestSuiteId, Timestamp, UserId, UserProfile,
};

use std::sync::Arc;
use testrun_service::{Collaborators, ServiceConfig, TestRunService};

// ============================================================================
// SERVICE CONSTRUCTION
// ============================================================================

/// A `TestRunService` over `storage` with the default configuration.
pub fn service(storage: &Arc<MockStorage>) -> TestRunService {
    service_with_config(storage, ServiceConfig::default())
}

/// A `TestRunService` over `storage` with a custom configuration.
pub fn service_with_config(storage: &Arc<MockStorage>, config: ServiceConfig) -> TestRunService {
    TestRunService::new(Collaborators::from_store(storage.clone()), config)
}

/// A context for a freshly generated caller.
pub fn caller() -> OperationContext {
    OperationContext::new(UserId::now_v7())
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating test run entities and facets.

    use super::*;
    use proptest::prelude::*;
    use uuid::Uuid;

    /// Words titles are built from, so title facets hit a useful share of cases.
    pub const TITLE_WORDS: [&str; 6] = ["login", "checkout", "search", "profile", "export", "sso"];

    /// Generate a random UUID.
    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<[u8; 16]>().prop_map(Uuid::from_bytes)
    }

    pub fn arb_test_case_id() -> impl Strategy<Value = TestCaseId> {
        arb_uuid().prop_map(TestCaseId::new)
    }

    pub fn arb_test_plan_id() -> impl Strategy<Value = TestPlanId> {
        arb_uuid().prop_map(TestPlanId::new)
    }

    pub fn arb_test_suite_id() -> impl Strategy<Value = TestSuiteId> {
        arb_uuid().prop_map(TestSuiteId::new)
    }

    pub fn arb_user_id() -> impl Strategy<Value = UserId> {
        arb_uuid().prop_map(UserId::new)
    }

    /// One title word, in random letter case.
    pub fn arb_title_word() -> impl Strategy<Value = String> {
        (prop::sample::select(TITLE_WORDS.to_vec()), any::<bool>()).prop_map(|(word, upper)| {
            if upper {
                word.to_uppercase()
            } else {
                word.to_string()
            }
        })
    }

    /// A test case with a two-word title and small numeric facets.
    pub fn arb_test_case() -> impl Strategy<Value = TestCase> {
        (
            arb_test_case_id(),
            arb_title_word(),
            arb_title_word(),
            0i64..4,
            0i64..4,
        )
            .prop_map(|(test_case_id, first, second, important_level, case_type)| TestCase {
                test_case_id,
                title: format!("{} {}", first, second),
                important_level,
                case_type,
            })
    }

    /// Case-level facets of a query: title word, important level, type.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct CaseFacets {
        pub title: Option<String>,
        pub important_level: Option<i64>,
        pub case_type: Option<i64>,
    }

    impl CaseFacets {
        pub fn is_empty(&self) -> bool {
            self.title.is_none() && self.important_level.is_none() && self.case_type.is_none()
        }

        /// The raw query a client would send for these facets.
        pub fn to_query(&self) -> TestRunQuery {
            TestRunQuery {
                title: self.title.clone(),
                important_level: self.important_level.map(|v| v.to_string()),
                case_type: self.case_type.map(|v| v.to_string()),
                ..Default::default()
            }
        }

        /// Whether `case` satisfies every present facet.
        pub fn admits(&self, case: &TestCase) -> bool {
            let title_ok = self
                .title
                .as_ref()
                .map_or(true, |t| case.title.to_lowercase().contains(&t.trim().to_lowercase()));
            let level_ok = self
                .important_level
                .map_or(true, |l| case.important_level == l);
            let type_ok = self.case_type.map_or(true, |t| case.case_type == t);
            title_ok && level_ok && type_ok
        }
    }

    pub fn arb_case_facets() -> impl Strategy<Value = CaseFacets> {
        (
            prop::option::of(arb_title_word()),
            prop::option::of(0i64..4),
            prop::option::of(0i64..4),
        )
            .prop_map(|(title, important_level, case_type)| CaseFacets {
                title,
                important_level,
                case_type,
            })
    }

    /// Facets with at least one case-level facet present.
    pub fn arb_nonempty_case_facets() -> impl Strategy<Value = CaseFacets> {
        arb_case_facets().prop_filter("at least one case facet", |f| !f.is_empty())
    }

    /// Plan cases and cases outside the plan.
    pub fn arb_case_universe() -> impl Strategy<Value = (Vec<TestCase>, Vec<TestCase>)> {
        (
            prop::collection::vec(arb_test_case(), 0..24),
            prop::collection::vec(arb_test_case(), 0..6),
        )
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built entities and a plan builder for scenario tests.

    use super::*;
    use chrono::Utc;

    /// A pending run of `case` in `plan` with no suite and no executor.
    pub fn test_run(plan: TestPlanId, case: TestCaseId) -> TestRun {
        TestRun {
            test_run_id: TestRunId::now_v7(),
            test_plan_id: plan,
            suite_id: None,
            test_case_id: case,
            executor_uid: None,
            priority: 1,
            status: 0,
            steps: Vec::new(),
            updated_at: Utc::now(),
            extra: serde_json::Map::new(),
        }
    }

    /// A user profile with every directory field filled in.
    pub fn user_profile(name: &str) -> UserProfile {
        UserProfile {
            uid: UserId::now_v7(),
            name: Some(name.to_string()),
            display_name: Some(name.to_uppercase()),
            desc: Some(format!("{} works on QA", name)),
            avatar: Some(format!("https://avatars.test/{}.png", name)),
            mobile: Some("555-0100".to_string()),
            email: Some(format!("{}@example.test", name)),
        }
    }

    /// Builds a plan with its cases, suites, runs and users, then seeds it
    /// into a `MockStorage`.
    #[derive(Debug, Clone)]
    pub struct PlanFixture {
        pub plan: TestPlan,
        pub cases: Vec<TestCase>,
        pub stray_cases: Vec<TestCase>,
        pub suites: Vec<TestSuite>,
        pub runs: Vec<TestRun>,
        pub users: Vec<UserProfile>,
    }

    impl PlanFixture {
        pub fn new(name: &str) -> Self {
            Self {
                plan: TestPlan {
                    test_plan_id: TestPlanId::now_v7(),
                    name: name.to_string(),
                    test_case_ids: Vec::new(),
                },
                cases: Vec::new(),
                stray_cases: Vec::new(),
                suites: Vec::new(),
                runs: Vec::new(),
                users: Vec::new(),
            }
        }

        pub fn plan_id(&self) -> TestPlanId {
            self.plan.test_plan_id
        }

        /// Add a case that belongs to the plan.
        pub fn case(&mut self, title: &str, important_level: i64, case_type: i64) -> TestCaseId {
            let case = new_case(title, important_level, case_type);
            let id = case.test_case_id;
            self.plan.test_case_ids.push(id);
            self.cases.push(case);
            id
        }

        /// Add an existing case to the plan.
        pub fn with_case(&mut self, case: TestCase) -> TestCaseId {
            let id = case.test_case_id;
            self.plan.test_case_ids.push(id);
            self.cases.push(case);
            id
        }

        /// Add a case that exists in the store but not in the plan.
        pub fn stray_case(&mut self, title: &str, important_level: i64, case_type: i64) -> TestCaseId {
            let case = new_case(title, important_level, case_type);
            let id = case.test_case_id;
            self.stray_cases.push(case);
            id
        }

        /// Add a suite under `parent`, inheriting the parent's ancestor chain.
        pub fn suite(&mut self, name: &str, parent: Option<TestSuiteId>) -> TestSuiteId {
            let parent_ids = parent
                .map(|parent_id| {
                    let mut chain = self
                        .suites
                        .iter()
                        .find(|s| s.suite_id == parent_id)
                        .map(|s| s.parent_ids.clone())
                        .unwrap_or_default();
                    chain.push(parent_id);
                    chain
                })
                .unwrap_or_default();
            let suite = TestSuite {
                suite_id: TestSuiteId::now_v7(),
                name: name.to_string(),
                parent_ids,
            };
            let id = suite.suite_id;
            self.suites.push(suite);
            id
        }

        pub fn user(&mut self, name: &str) -> UserId {
            let user = user_profile(name);
            let id = user.uid;
            self.users.push(user);
            id
        }

        /// Add a run of `case`, optionally in a suite and assigned to a user.
        pub fn run(
            &mut self,
            case: TestCaseId,
            suite: Option<TestSuiteId>,
            executor: Option<UserId>,
        ) -> TestRunId {
            let mut run = test_run(self.plan_id(), case);
            run.suite_id = suite;
            run.executor_uid = executor;
            self.with_run(run)
        }

        pub fn with_run(&mut self, run: TestRun) -> TestRunId {
            let id = run.test_run_id;
            self.runs.push(run);
            id
        }

        /// Write every entity into `storage`.
        pub async fn seed(&self, storage: &MockStorage) {
            storage.insert_plan(self.plan.clone()).await;
            for case in self.cases.iter().chain(&self.stray_cases) {
                storage.insert_case(case.clone()).await;
            }
            for suite in &self.suites {
                storage.insert_suite(suite.clone()).await;
            }
            for run in &self.runs {
                storage.insert_run(run.clone()).await;
            }
            for user in &self.users {
                storage.insert_user(user.clone()).await;
            }
        }

        /// A fresh store holding this fixture.
        pub async fn storage(&self) -> Arc<MockStorage> {
            let storage = Arc::new(MockStorage::new());
            self.seed(&storage).await;
            storage
        }
    }

    fn new_case(title: &str, important_level: i64, case_type: i64) -> TestCase {
        TestCase {
            test_case_id: TestCaseId::now_v7(),
            title: title.to_string(),
            important_level,
            case_type,
        }
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions on service results.

    use testrun_service::{ErrorCode, ServiceResult};

    /// Assert that a service result failed with `code`.
    #[track_caller]
    pub fn assert_error_code<T: std::fmt::Debug>(result: &ServiceResult<T>, code: ErrorCode) {
        match result {
            Err(err) => assert_eq!(err.code, code, "Wrong error code: {}", err),
            Ok(value) => panic!("Expected {} error, got Ok: {:?}", code, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::PlanFixture;
    use super::*;

    #[test]
    fn test_nested_suites_inherit_ancestor_chain() {
        let mut fixture = PlanFixture::new("release");
        let root = fixture.suite("root", None);
        let mid = fixture.suite("mid", Some(root));
        let leaf = fixture.suite("leaf", Some(mid));
        let leaf_suite = fixture.suites.iter().find(|s| s.suite_id == leaf).unwrap();
        assert_eq!(leaf_suite.parent_ids, vec![root, mid]);
    }

    #[test]
    fn test_stray_cases_stay_out_of_plan() {
        let mut fixture = PlanFixture::new("release");
        let in_plan = fixture.case("Login", 1, 1);
        let stray = fixture.stray_case("Login elsewhere", 1, 1);
        assert_eq!(fixture.plan.test_case_ids, vec![in_plan]);
        assert!(!fixture.plan.test_case_ids.contains(&stray));
    }

    #[tokio::test]
    async fn test_seeded_fixture_is_served_by_service() {
        let mut fixture = PlanFixture::new("release");
        let case = fixture.case("Login", 1, 1);
        fixture.run(case, None, None);
        let storage = fixture.storage().await;

        let page = service(&storage)
            .get_test_runs(
                &caller(),
                fixture.plan_id(),
                &TestRunQuery::default(),
                Default::default(),
            )
            .await
            .unwrap();
        assert_eq!(page.page.count, 1);
        assert_eq!(page.test_cases.len(), 1);
    }
}
