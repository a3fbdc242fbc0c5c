//! Async collaborator traits.
//!
//! These are the document-store repositories, the user directory and the
//! tree display service the run views read from. Implementations are supplied
//! to the services at construction time. Lookups by id are best-effort: ids
//! that do not resolve are simply absent from the result.

use ::async_trait::async_trait;
use testrun_core::{
    CaseCondition, OperationContext, RunCondition, TestCase, TestCaseId, TestPlan, TestPlanId,
    TestRun, TestRunColumn, TestRunId, TestRunResult, TestSuite, TestSuiteId, UserId,
    UserProfile,
};

use crate::options::{FindOptions, PageResult, UserProjection};

/// Test run documents.
#[async_trait]
pub trait TestRunRepository: Send + Sync {
    /// All runs matching `condition`.
    async fn find(
        &self,
        ctx: &OperationContext,
        condition: &RunCondition,
        options: &FindOptions,
    ) -> TestRunResult<Vec<TestRun>>;

    /// One run by id.
    async fn find_one_by_id(
        &self,
        ctx: &OperationContext,
        id: TestRunId,
        options: &FindOptions,
    ) -> TestRunResult<Option<TestRun>>;

    /// One page of runs matching `condition`, with total count metadata.
    async fn find_by_page_index(
        &self,
        ctx: &OperationContext,
        condition: &RunCondition,
        page_index: u32,
        page_size: u32,
        options: &FindOptions,
    ) -> TestRunResult<PageResult<TestRun>>;
}

/// Test suite documents.
#[async_trait]
pub trait TestSuiteRepository: Send + Sync {
    async fn find_by_ids(
        &self,
        ctx: &OperationContext,
        ids: &[TestSuiteId],
    ) -> TestRunResult<Vec<TestSuite>>;

    async fn find_one_by_id(
        &self,
        ctx: &OperationContext,
        id: TestSuiteId,
    ) -> TestRunResult<Option<TestSuite>>;
}

/// Test case documents.
#[async_trait]
pub trait TestCaseRepository: Send + Sync {
    /// All cases matching one facet.
    async fn find(
        &self,
        ctx: &OperationContext,
        condition: &CaseCondition,
    ) -> TestRunResult<Vec<TestCase>>;

    async fn find_by_ids(
        &self,
        ctx: &OperationContext,
        ids: &[TestCaseId],
    ) -> TestRunResult<Vec<TestCase>>;

    async fn find_one_by_id(
        &self,
        ctx: &OperationContext,
        id: TestCaseId,
    ) -> TestRunResult<Option<TestCase>>;
}

/// Test plan documents.
#[async_trait]
pub trait TestPlanRepository: Send + Sync {
    async fn find_one_by_id(
        &self,
        ctx: &OperationContext,
        id: TestPlanId,
    ) -> TestRunResult<Option<TestPlan>>;
}

/// Column preference documents keyed by `(uid, test_plan_id)`.
#[async_trait]
pub trait TestRunColumnRepository: Send + Sync {
    async fn find_one(
        &self,
        ctx: &OperationContext,
        uid: UserId,
        test_plan_id: TestPlanId,
    ) -> TestRunResult<Option<TestRunColumn>>;

    /// Insert or replace the record for `(column.uid, column.test_plan_id)`.
    async fn upsert(&self, ctx: &OperationContext, column: &TestRunColumn) -> TestRunResult<()>;
}

/// User directory service.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_users_by_ids(
        &self,
        ctx: &OperationContext,
        ids: &[UserId],
        projection: &UserProjection,
    ) -> TestRunResult<Vec<UserProfile>>;

    async fn get_user_by_id(
        &self,
        ctx: &OperationContext,
        id: UserId,
    ) -> TestRunResult<Option<UserProfile>>;
}

/// Tree display service over the suite tree.
#[async_trait]
pub trait TreeDisplay: Send + Sync {
    /// Tree nodes whose ids are in `ids`.
    async fn get_tree_nodes(
        &self,
        ctx: &OperationContext,
        ids: &[TestSuiteId],
    ) -> TestRunResult<Vec<TestSuite>>;
}
