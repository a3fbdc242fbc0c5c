//! Test Run Service
//!
//! Read views over the runs of a plan: the paginated listing with its
//! secondary lookups, the suite navigation set, and the single-run detail.
//! Column preferences are exposed here as well so one service value serves
//! every run view.

use std::sync::Arc;

use serde::Serialize;
use testrun_core::{
    coerce_number, supplied, ColumnDescriptor, OperationContext, SortDirection, TestCase,
    TestPlanId, TestRun, TestRunError, TestRunId, TestRunQuery, TestRunSummary, TestSuite,
    UserProfile, ValidationError,
};
use testrun_storage::{
    FindOptions, PageResult, Projection, SortSpec, TestCaseRepository, TestPlanRepository,
    TestRunColumnRepository, TestRunRepository, TestSuiteRepository, TreeDisplay, UserDirectory,
    UserProjection,
};

use crate::config::ServiceConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::services::column_service::{ColumnService, ColumnSettings, SetColumnsRequest};
use crate::services::condition_builder::ConditionBuilder;
use crate::services::suite_hierarchy::{dedup, SuiteHierarchy, SuiteSource};

// ============================================================================
// COLLABORATORS
// ============================================================================

/// Every collaborator the run views read from.
#[derive(Clone)]
pub struct Collaborators {
    pub runs: Arc<dyn TestRunRepository>,
    pub suites: Arc<dyn TestSuiteRepository>,
    pub cases: Arc<dyn TestCaseRepository>,
    pub plans: Arc<dyn TestPlanRepository>,
    pub columns: Arc<dyn TestRunColumnRepository>,
    pub users: Arc<dyn UserDirectory>,
    pub tree: Arc<dyn TreeDisplay>,
}

impl Collaborators {
    /// Use one store for every collaborator.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: TestRunRepository
            + TestSuiteRepository
            + TestCaseRepository
            + TestPlanRepository
            + TestRunColumnRepository
            + UserDirectory
            + TreeDisplay
            + 'static,
    {
        Self {
            runs: store.clone(),
            suites: store.clone(),
            cases: store.clone(),
            plans: store.clone(),
            columns: store.clone(),
            users: store.clone(),
            tree: store,
        }
    }
}

// ============================================================================
// VIEW TYPES
// ============================================================================

/// Paging request for the run listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub page_index: Option<u32>,
    pub page_size: Option<u32>,
}

impl PageRequest {
    pub fn new(page_index: u32, page_size: u32) -> Self {
        Self {
            page_index: Some(page_index),
            page_size: Some(page_size),
        }
    }
}

/// One page of runs with everything needed to render it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestRunPage {
    pub page: PageResult<TestRun>,
    pub users: Vec<UserProfile>,
    pub suites: Vec<TestSuite>,
    pub columns: Vec<ColumnDescriptor>,
    pub test_cases: Vec<TestCase>,
}

/// A single run with its case, suite breadcrumb and executor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestRunDetail {
    pub test_run: TestRunSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_case: Option<TestCase>,
    pub suites: Vec<TestSuite>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

// ============================================================================
// SERVICE
// ============================================================================

/// Aggregating read service over test runs.
#[derive(Clone)]
pub struct TestRunService {
    runs: Arc<dyn TestRunRepository>,
    cases: Arc<dyn TestCaseRepository>,
    users: Arc<dyn UserDirectory>,
    hierarchy: SuiteHierarchy,
    columns: ColumnService,
    conditions: ConditionBuilder,
    config: ServiceConfig,
}

impl TestRunService {
    pub fn new(collaborators: Collaborators, config: ServiceConfig) -> Self {
        let Collaborators {
            runs,
            suites,
            cases,
            plans,
            columns,
            users,
            tree,
        } = collaborators;
        Self {
            runs,
            cases: cases.clone(),
            users,
            hierarchy: SuiteHierarchy::new(suites, tree),
            columns: ColumnService::new(columns),
            conditions: ConditionBuilder::new(cases, plans)
                .with_null_suite_arg(config.null_suite_arg.clone()),
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// One page of a plan's runs with users, suites, columns and cases.
    ///
    /// Secondary lookups run concurrently and only after the page query
    /// succeeds.
    pub async fn get_test_runs(
        &self,
        ctx: &OperationContext,
        test_plan_id: TestPlanId,
        query: &TestRunQuery,
        paging: PageRequest,
    ) -> ServiceResult<TestRunPage> {
        let rejected = |e: TestRunError| {
            tracing::warn!(plan_id = %test_plan_id, error = %e, "Rejected run query");
            ServiceError::from(e)
        };
        // Sort is checked before any collaborator is consulted.
        let sort = sort_spec(query).map_err(|e| rejected(e.into()))?;
        let condition = self
            .conditions
            .build(ctx, test_plan_id, query)
            .await
            .map_err(rejected)?;
        let options = FindOptions {
            projection: None,
            sort,
        };
        let page_index = paging.page_index.unwrap_or(0);
        let page_size = self.config.resolve_page_size(paging.page_size);

        let page = self
            .runs
            .find_by_page_index(ctx, &condition, page_index, page_size, &options)
            .await?;

        let executor_ids = dedup(page.entities.iter().filter_map(|r| r.executor_uid));
        let suite_ids = dedup(page.entities.iter().filter_map(|r| r.suite_id));
        let case_ids = dedup(page.entities.iter().map(|r| r.test_case_id));
        tracing::debug!(
            plan_id = %test_plan_id,
            runs = page.entities.len(),
            count = page.count,
            executors = executor_ids.len(),
            suites = suite_ids.len(),
            cases = case_ids.len(),
            "Fetched run page"
        );

        let user_projection = UserProjection::profile();
        let (suites, users, columns, test_cases) = tokio::try_join!(
            self.hierarchy
                .resolve_with_ancestors(ctx, &suite_ids, SuiteSource::TreeDisplay),
            async {
                if executor_ids.is_empty() {
                    return Ok(Vec::new());
                }
                self.users
                    .get_users_by_ids(ctx, &executor_ids, &user_projection)
                    .await
            },
            self.columns.get_columns(ctx, test_plan_id),
            async {
                if case_ids.is_empty() {
                    return Ok(Vec::new());
                }
                self.cases.find_by_ids(ctx, &case_ids).await
            },
        )?;

        Ok(TestRunPage {
            page,
            users,
            suites,
            columns,
            test_cases,
        })
    }

    /// Every suite referenced by a plan's runs, with all ancestors.
    pub async fn get_test_run_by_suite_id(
        &self,
        ctx: &OperationContext,
        test_plan_id: TestPlanId,
    ) -> ServiceResult<Vec<TestSuite>> {
        let options = FindOptions::with_projection(Projection::new(["suite_id"]));
        let runs = self
            .runs
            .find(ctx, &testrun_core::RunCondition::for_plan(test_plan_id), &options)
            .await?;
        let suite_ids = dedup(runs.iter().filter_map(|r| r.suite_id));
        tracing::debug!(
            plan_id = %test_plan_id,
            runs = runs.len(),
            suites = suite_ids.len(),
            "Collected suites referenced by plan"
        );

        Ok(self
            .hierarchy
            .resolve_with_ancestors(ctx, &suite_ids, SuiteSource::Repository)
            .await?)
    }

    /// One run with its case, suite breadcrumb and executor profile.
    pub async fn get_test_run_detail(
        &self,
        ctx: &OperationContext,
        test_run_id: TestRunId,
    ) -> ServiceResult<TestRunDetail> {
        let options = FindOptions::with_projection(Projection::new(TestRunSummary::FIELDS));
        let run = self
            .runs
            .find_one_by_id(ctx, test_run_id, &options)
            .await?
            .ok_or_else(|| ServiceError::test_run_not_found(test_run_id))?;
        let test_run = TestRunSummary::from(run);

        let (test_case, suites, user) = tokio::try_join!(
            self.cases.find_one_by_id(ctx, test_run.test_case_id),
            async {
                match test_run.suite_id {
                    Some(suite_id) => self.hierarchy.breadcrumb(ctx, suite_id).await,
                    None => Ok(Vec::new()),
                }
            },
            async {
                match test_run.executor_uid {
                    Some(uid) => self.users.get_user_by_id(ctx, uid).await,
                    None => Ok(None),
                }
            },
        )?;

        Ok(TestRunDetail {
            test_run,
            test_case,
            suites,
            user,
        })
    }

    /// Resolved display columns of the caller for a plan.
    pub async fn get_columns(
        &self,
        ctx: &OperationContext,
        test_plan_id: TestPlanId,
    ) -> ServiceResult<Vec<ColumnDescriptor>> {
        Ok(self.columns.get_columns(ctx, test_plan_id).await?)
    }

    /// Save the caller's columns for a plan and return them resolved.
    pub async fn set_columns(
        &self,
        ctx: &OperationContext,
        test_plan_id: TestPlanId,
        request: SetColumnsRequest,
    ) -> ServiceResult<Vec<ColumnDescriptor>> {
        self.columns.set_columns(ctx, test_plan_id, request).await
    }

    /// Raw stored column lists plus the property catalog.
    pub async fn get_column_settings(
        &self,
        ctx: &OperationContext,
        test_plan_id: TestPlanId,
    ) -> ServiceResult<ColumnSettings> {
        Ok(self.columns.get_column_settings(ctx, test_plan_id).await?)
    }
}

/// Sort option, present only when both the field and the direction are.
fn sort_spec(query: &TestRunQuery) -> Result<Option<SortSpec>, ValidationError> {
    let (Some(field), Some(raw)) = (supplied(&query.sort_by), supplied(&query.sort_direction))
    else {
        return Ok(None);
    };
    let invalid = || ValidationError::InvalidSortDirection {
        value: raw.to_string(),
    };
    let direction = coerce_number("sort_direction", raw)
        .ok()
        .and_then(SortDirection::from_i64)
        .ok_or_else(invalid)?;
    Ok(Some(SortSpec::new(field, direction)))
}
