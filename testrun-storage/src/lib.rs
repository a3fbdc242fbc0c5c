//! Testrun Storage - Collaborator Traits and Mock Implementation
//!
//! Defines the repository, user directory and tree display abstractions the
//! run views depend on, plus an in-memory implementation of all of them.

pub mod options;
pub mod repository;

pub use options::{FindOptions, PageResult, Projection, SortSpec, UserField, UserProjection};
pub use repository::{
    TestCaseRepository, TestPlanRepository, TestRunColumnRepository, TestRunRepository,
    TestSuiteRepository, TreeDisplay, UserDirectory,
};

use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use testrun_core::{
    CaseCondition, EntityType, OperationContext, RunCondition, StorageError, TestCase,
    TestCaseId, TestPlan, TestPlanId, TestRun, TestRunColumn, TestRunId, TestRunResult,
    TestSuite, TestSuiteId, UserId, UserProfile,
};
use tokio::sync::RwLock;

// ============================================================================
// CALL STATISTICS
// ============================================================================

/// Number of collaborator calls served, per collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockStorageStats {
    pub run_queries: u64,
    pub suite_lookups: u64,
    pub case_lookups: u64,
    pub plan_lookups: u64,
    pub column_reads: u64,
    pub column_writes: u64,
    pub user_lookups: u64,
    pub tree_lookups: u64,
}

#[derive(Debug, Default)]
struct Counters {
    run_queries: AtomicU64,
    suite_lookups: AtomicU64,
    case_lookups: AtomicU64,
    plan_lookups: AtomicU64,
    column_reads: AtomicU64,
    column_writes: AtomicU64,
    user_lookups: AtomicU64,
    tree_lookups: AtomicU64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, AtomicOrdering::Relaxed);
}

// ============================================================================
// MOCK STORAGE
// ============================================================================

/// In-memory storage implementing every collaborator trait.
///
/// Runs are kept ordered by id, which for UUIDv7 ids is creation order; that
/// order is the default ordering of run queries.
#[derive(Debug, Default)]
pub struct MockStorage {
    runs: RwLock<BTreeMap<TestRunId, TestRun>>,
    suites: RwLock<HashMap<TestSuiteId, TestSuite>>,
    cases: RwLock<HashMap<TestCaseId, TestCase>>,
    plans: RwLock<HashMap<TestPlanId, TestPlan>>,
    columns: RwLock<HashMap<(UserId, TestPlanId), TestRunColumn>>,
    users: RwLock<HashMap<UserId, UserProfile>>,
    fail_column_writes: AtomicBool,
    fail_run_queries: AtomicBool,
    counters: Counters,
}

impl MockStorage {
    /// Create an empty mock storage.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_run(&self, run: TestRun) {
        self.runs.write().await.insert(run.test_run_id, run);
    }

    pub async fn insert_suite(&self, suite: TestSuite) {
        self.suites.write().await.insert(suite.suite_id, suite);
    }

    pub async fn insert_case(&self, case: TestCase) {
        self.cases.write().await.insert(case.test_case_id, case);
    }

    pub async fn insert_plan(&self, plan: TestPlan) {
        self.plans.write().await.insert(plan.test_plan_id, plan);
    }

    pub async fn insert_user(&self, user: UserProfile) {
        self.users.write().await.insert(user.uid, user);
    }

    /// Make every subsequent column write fail until reset.
    pub fn set_fail_column_writes(&self, fail: bool) {
        self.fail_column_writes.store(fail, AtomicOrdering::SeqCst);
    }

    /// Make every subsequent run query fail until reset.
    pub fn set_fail_run_queries(&self, fail: bool) {
        self.fail_run_queries.store(fail, AtomicOrdering::SeqCst);
    }

    /// Snapshot of the call counters.
    pub fn stats(&self) -> MockStorageStats {
        let c = &self.counters;
        MockStorageStats {
            run_queries: c.run_queries.load(AtomicOrdering::Relaxed),
            suite_lookups: c.suite_lookups.load(AtomicOrdering::Relaxed),
            case_lookups: c.case_lookups.load(AtomicOrdering::Relaxed),
            plan_lookups: c.plan_lookups.load(AtomicOrdering::Relaxed),
            column_reads: c.column_reads.load(AtomicOrdering::Relaxed),
            column_writes: c.column_writes.load(AtomicOrdering::Relaxed),
            user_lookups: c.user_lookups.load(AtomicOrdering::Relaxed),
            tree_lookups: c.tree_lookups.load(AtomicOrdering::Relaxed),
        }
    }

    /// Stored column record, bypassing the repository trait.
    pub async fn column_record(&self, uid: UserId, plan: TestPlanId) -> Option<TestRunColumn> {
        self.columns.read().await.get(&(uid, plan)).cloned()
    }

    fn check_run_queries(&self) -> TestRunResult<()> {
        if self.fail_run_queries.load(AtomicOrdering::SeqCst) {
            return Err(StorageError::QueryFailed {
                entity_type: EntityType::TestRun,
                reason: "injected failure".to_string(),
            }
            .into());
        }
        Ok(())
    }

    async fn matching_runs(
        &self,
        condition: &RunCondition,
        options: &FindOptions,
    ) -> TestRunResult<Vec<TestRun>> {
        self.check_run_queries()?;
        bump(&self.counters.run_queries);

        let runs = self.runs.read().await;
        let mut matched: Vec<TestRun> = runs
            .values()
            .filter(|run| condition.matches(run))
            .cloned()
            .collect();
        drop(runs);

        if let Some(sort) = &options.sort {
            let mut keyed: Vec<(Value, TestRun)> = matched
                .into_iter()
                .map(|run| (sort_key(&run, &sort.field), run))
                .collect();
            keyed.sort_by(|(a, _), (b, _)| sort.direction.apply(compare_values(a, b)));
            matched = keyed.into_iter().map(|(_, run)| run).collect();
        }

        Ok(matched
            .into_iter()
            .map(|run| project_run(run, options))
            .collect())
    }
}

/// Serialized value of `field` on a run, `Null` when absent.
fn sort_key(run: &TestRun, field: &str) -> Value {
    serde_json::to_value(run)
        .ok()
        .and_then(|value| value.get(field).cloned())
        .unwrap_or(Value::Null)
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values: by type first, then by value.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Drop the payload the projection does not ask for.
fn project_run(mut run: TestRun, options: &FindOptions) -> TestRun {
    if let Some(projection) = &options.projection {
        if !projection.includes("steps") {
            run.steps.clear();
        }
        run.extra.retain(|key, _| projection.includes(key));
    }
    run
}

fn project_user(user: &UserProfile, projection: &UserProjection) -> UserProfile {
    let pick = |field: UserField, value: &Option<String>| {
        if projection.includes(field) {
            value.clone()
        } else {
            None
        }
    };
    UserProfile {
        uid: user.uid,
        name: pick(UserField::Name, &user.name),
        display_name: pick(UserField::DisplayName, &user.display_name),
        desc: pick(UserField::Desc, &user.desc),
        avatar: pick(UserField::Avatar, &user.avatar),
        mobile: pick(UserField::Mobile, &user.mobile),
        email: pick(UserField::Email, &user.email),
    }
}

fn suites_by_ids(suites: &HashMap<TestSuiteId, TestSuite>, ids: &[TestSuiteId]) -> Vec<TestSuite> {
    let mut seen = std::collections::HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(**id))
        .filter_map(|id| suites.get(id).cloned())
        .collect()
}

#[async_trait]
impl TestRunRepository for MockStorage {
    async fn find(
        &self,
        _ctx: &OperationContext,
        condition: &RunCondition,
        options: &FindOptions,
    ) -> TestRunResult<Vec<TestRun>> {
        self.matching_runs(condition, options).await
    }

    async fn find_one_by_id(
        &self,
        _ctx: &OperationContext,
        id: TestRunId,
        options: &FindOptions,
    ) -> TestRunResult<Option<TestRun>> {
        self.check_run_queries()?;
        bump(&self.counters.run_queries);
        let runs = self.runs.read().await;
        Ok(runs.get(&id).cloned().map(|run| project_run(run, options)))
    }

    async fn find_by_page_index(
        &self,
        _ctx: &OperationContext,
        condition: &RunCondition,
        page_index: u32,
        page_size: u32,
        options: &FindOptions,
    ) -> TestRunResult<PageResult<TestRun>> {
        let matched = self.matching_runs(condition, options).await?;
        Ok(PageResult::from_all(matched, page_index, page_size))
    }
}

#[async_trait]
impl TestSuiteRepository for MockStorage {
    async fn find_by_ids(
        &self,
        _ctx: &OperationContext,
        ids: &[TestSuiteId],
    ) -> TestRunResult<Vec<TestSuite>> {
        bump(&self.counters.suite_lookups);
        Ok(suites_by_ids(&*self.suites.read().await, ids))
    }

    async fn find_one_by_id(
        &self,
        _ctx: &OperationContext,
        id: TestSuiteId,
    ) -> TestRunResult<Option<TestSuite>> {
        bump(&self.counters.suite_lookups);
        Ok(self.suites.read().await.get(&id).cloned())
    }
}

#[async_trait]
impl TestCaseRepository for MockStorage {
    async fn find(
        &self,
        _ctx: &OperationContext,
        condition: &CaseCondition,
    ) -> TestRunResult<Vec<TestCase>> {
        bump(&self.counters.case_lookups);
        let cases = self.cases.read().await;
        Ok(cases
            .values()
            .filter(|case| condition.matches(case))
            .cloned()
            .collect())
    }

    async fn find_by_ids(
        &self,
        _ctx: &OperationContext,
        ids: &[TestCaseId],
    ) -> TestRunResult<Vec<TestCase>> {
        bump(&self.counters.case_lookups);
        let cases = self.cases.read().await;
        let mut seen = std::collections::HashSet::new();
        Ok(ids
            .iter()
            .filter(|id| seen.insert(**id))
            .filter_map(|id| cases.get(id).cloned())
            .collect())
    }

    async fn find_one_by_id(
        &self,
        _ctx: &OperationContext,
        id: TestCaseId,
    ) -> TestRunResult<Option<TestCase>> {
        bump(&self.counters.case_lookups);
        Ok(self.cases.read().await.get(&id).cloned())
    }
}

#[async_trait]
impl TestPlanRepository for MockStorage {
    async fn find_one_by_id(
        &self,
        _ctx: &OperationContext,
        id: TestPlanId,
    ) -> TestRunResult<Option<TestPlan>> {
        bump(&self.counters.plan_lookups);
        Ok(self.plans.read().await.get(&id).cloned())
    }
}

#[async_trait]
impl TestRunColumnRepository for MockStorage {
    async fn find_one(
        &self,
        _ctx: &OperationContext,
        uid: UserId,
        test_plan_id: TestPlanId,
    ) -> TestRunResult<Option<TestRunColumn>> {
        bump(&self.counters.column_reads);
        Ok(self.column_record(uid, test_plan_id).await)
    }

    async fn upsert(&self, _ctx: &OperationContext, column: &TestRunColumn) -> TestRunResult<()> {
        bump(&self.counters.column_writes);
        if self.fail_column_writes.load(AtomicOrdering::SeqCst) {
            return Err(StorageError::UpdateFailed {
                entity_type: EntityType::TestRunColumn,
                reason: "injected failure".to_string(),
            }
            .into());
        }
        self.columns
            .write()
            .await
            .insert((column.uid, column.test_plan_id), column.clone());
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for MockStorage {
    async fn get_users_by_ids(
        &self,
        _ctx: &OperationContext,
        ids: &[UserId],
        projection: &UserProjection,
    ) -> TestRunResult<Vec<UserProfile>> {
        bump(&self.counters.user_lookups);
        let users = self.users.read().await;
        let mut seen = std::collections::HashSet::new();
        Ok(ids
            .iter()
            .filter(|id| seen.insert(**id))
            .filter_map(|id| users.get(id))
            .map(|user| project_user(user, projection))
            .collect())
    }

    async fn get_user_by_id(
        &self,
        _ctx: &OperationContext,
        id: UserId,
    ) -> TestRunResult<Option<UserProfile>> {
        bump(&self.counters.user_lookups);
        Ok(self.users.read().await.get(&id).cloned())
    }
}

#[async_trait]
impl TreeDisplay for MockStorage {
    async fn get_tree_nodes(
        &self,
        _ctx: &OperationContext,
        ids: &[TestSuiteId],
    ) -> TestRunResult<Vec<TestSuite>> {
        bump(&self.counters.tree_lookups);
        Ok(suites_by_ids(&*self.suites.read().await, ids))
    }
}

// ============================================================================
// TESTS
// ============================================================================
