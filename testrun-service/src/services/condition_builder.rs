//! Condition Builder
//!
//! Turns a raw `TestRunQuery` into a `RunCondition`. Run-level facets map to
//! exact-match fields. Case-level facets are each resolved to a set of case
//! ids and folded into one `test_case_ids` restriction by intersection,
//! starting from the plan's case universe.

use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;

use futures_util::future::try_join_all;
use testrun_core::{
    coerce_number, supplied, CaseCondition, OperationContext, RunCondition, SuiteRestriction,
    TestCaseId, TestPlanId, TestRunError, TestRunQuery, TestRunResult, TestSuiteId, UserId,
    ValidationError,
};
use testrun_storage::{TestCaseRepository, TestPlanRepository};

use crate::config::DEFAULT_NULL_SUITE_ARG;

/// Builds run predicates from raw queries.
#[derive(Clone)]
pub struct ConditionBuilder {
    cases: Arc<dyn TestCaseRepository>,
    plans: Arc<dyn TestPlanRepository>,
    null_suite_arg: String,
}

impl ConditionBuilder {
    pub fn new(cases: Arc<dyn TestCaseRepository>, plans: Arc<dyn TestPlanRepository>) -> Self {
        Self {
            cases,
            plans,
            null_suite_arg: DEFAULT_NULL_SUITE_ARG.to_string(),
        }
    }

    /// Override the `suite_id` value that selects runs without a suite.
    pub fn with_null_suite_arg(mut self, arg: impl Into<String>) -> Self {
        self.null_suite_arg = arg.into();
        self
    }

    /// Build the predicate for one plan.
    ///
    /// Every facet is validated before any lookup is issued. The plan is only
    /// loaded when at least one case-level facet is present.
    pub async fn build(
        &self,
        ctx: &OperationContext,
        test_plan_id: TestPlanId,
        query: &TestRunQuery,
    ) -> TestRunResult<RunCondition> {
        let mut condition = RunCondition::for_plan(test_plan_id);

        if let Some(raw) = supplied(&query.executor) {
            condition.executor_uid = Some(parse_id::<UserId>("executor", raw)?);
        }
        if let Some(raw) = supplied(&query.priority) {
            condition.priority = Some(coerce_number("priority", raw)?);
        }
        if let Some(raw) = supplied(&query.status) {
            condition.status = Some(coerce_number("status", raw)?);
        }
        if let Some(raw) = supplied(&query.suite_id) {
            condition.suite = Some(if raw == self.null_suite_arg {
                SuiteRestriction::Unassigned
            } else {
                SuiteRestriction::Exact(parse_id::<TestSuiteId>("suite_id", raw)?)
            });
        }

        let facets = case_facets(query)?;
        if !facets.is_empty() {
            condition.test_case_ids = Some(self.restrict_cases(ctx, test_plan_id, &facets).await?);
        }

        tracing::debug!(
            plan_id = %test_plan_id,
            case_facets = facets.len(),
            restricted_cases = condition.test_case_ids.as_ref().map(BTreeSet::len),
            "Built run condition"
        );
        Ok(condition)
    }

    /// Intersect the plan universe with the matches of every facet.
    async fn restrict_cases(
        &self,
        ctx: &OperationContext,
        test_plan_id: TestPlanId,
        facets: &[CaseCondition],
    ) -> TestRunResult<BTreeSet<TestCaseId>> {
        let universe = async {
            Ok::<_, TestRunError>(self
                .plans
                .find_one_by_id(ctx, test_plan_id)
                .await?
                .map(|plan| plan.test_case_ids.into_iter().collect::<BTreeSet<_>>())
                .unwrap_or_default())
        };
        let candidates = try_join_all(facets.iter().map(|facet| self.matching_cases(ctx, facet)));
        let (universe, candidates) = tokio::try_join!(universe, candidates)?;

        Ok(candidates
            .into_iter()
            .fold(universe, |acc, set| acc.intersection(&set).copied().collect()))
    }

    async fn matching_cases(
        &self,
        ctx: &OperationContext,
        facet: &CaseCondition,
    ) -> TestRunResult<BTreeSet<TestCaseId>> {
        let cases = self.cases.find(ctx, facet).await?;
        Ok(cases.into_iter().map(|c| c.test_case_id).collect())
    }
}

/// Case-level facets in evaluation order: title, important level, type.
fn case_facets(query: &TestRunQuery) -> Result<Vec<CaseCondition>, ValidationError> {
    let title = supplied(&query.title).map(CaseCondition::title);
    let level = supplied(&query.important_level)
        .map(|raw| coerce_number("important_level", raw).map(CaseCondition::ImportantLevel))
        .transpose()?;
    let case_type = supplied(&query.case_type)
        .map(|raw| coerce_number("type", raw).map(CaseCondition::CaseType))
        .transpose()?;
    Ok([title, level, case_type].into_iter().flatten().collect())
}

fn parse_id<T: FromStr>(field: &str, raw: &str) -> Result<T, ValidationError> {
    raw.parse().map_err(|_| ValidationError::InvalidId {
        field: field.to_string(),
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use testrun_core::{EntityIdType, TestCase, TestPlan};
    use testrun_storage::MockStorage;

    fn case(title: &str, important_level: i64, case_type: i64) -> TestCase {
        TestCase {
            test_case_id: TestCaseId::now_v7(),
            title: title.to_string(),
            important_level,
            case_type,
        }
    }

    struct Setup {
        storage: Arc<MockStorage>,
        builder: ConditionBuilder,
        plan: TestPlanId,
        cases: [TestCase; 3],
    }

    async fn setup() -> Setup {
        let storage = Arc::new(MockStorage::new());
        let cases = [
            case("Login page renders", 1, 1),
            case("Login with SSO", 2, 1),
            case("Checkout total", 2, 3),
        ];
        for c in &cases {
            storage.insert_case(c.clone()).await;
        }
        let plan = TestPlanId::now_v7();
        storage
            .insert_plan(TestPlan {
                test_plan_id: plan,
                name: "release".to_string(),
                test_case_ids: cases.iter().map(|c| c.test_case_id).collect(),
            })
            .await;
        let builder = ConditionBuilder::new(storage.clone(), storage.clone());
        Setup {
            storage,
            builder,
            plan,
            cases,
        }
    }

    fn ctx() -> OperationContext {
        OperationContext::new(UserId::now_v7())
    }

    fn query(fields: &[(&str, &str)]) -> TestRunQuery {
        let object: serde_json::Map<_, _> = fields
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::from(*v)))
            .collect();
        serde_json::from_value(serde_json::Value::Object(object)).unwrap()
    }

    #[tokio::test]
    async fn test_no_case_facets_leaves_cases_unrestricted() {
        let s = setup().await;
        let condition = s
            .builder
            .build(&ctx(), s.plan, &query(&[("priority", "2"), ("status", "1")]))
            .await
            .unwrap();
        assert_eq!(condition.test_case_ids, None);
        assert_eq!(condition.priority, Some(2));
        assert_eq!(condition.status, Some(1));
        assert_eq!(s.storage.stats().plan_lookups, 0);
        assert_eq!(s.storage.stats().case_lookups, 0);
    }

    #[tokio::test]
    async fn test_case_facets_intersect() {
        let s = setup().await;
        let condition = s
            .builder
            .build(
                &ctx(),
                s.plan,
                &query(&[("title", " login "), ("important_level", "2")]),
            )
            .await
            .unwrap();
        assert_eq!(
            condition.test_case_ids,
            Some(BTreeSet::from([s.cases[1].test_case_id]))
        );
        assert_eq!(s.storage.stats().plan_lookups, 1);
    }

    #[tokio::test]
    async fn test_facet_without_matches_restricts_to_nothing() {
        let s = setup().await;
        let condition = s
            .builder
            .build(&ctx(), s.plan, &query(&[("type", "9")]))
            .await
            .unwrap();
        assert_eq!(condition.test_case_ids, Some(BTreeSet::new()));
    }

    #[tokio::test]
    async fn test_missing_plan_gives_empty_universe() {
        let s = setup().await;
        let condition = s
            .builder
            .build(&ctx(), TestPlanId::now_v7(), &query(&[("title", "login")]))
            .await
            .unwrap();
        assert_eq!(condition.test_case_ids, Some(BTreeSet::new()));
    }

    #[tokio::test]
    async fn test_cases_outside_plan_are_excluded() {
        let s = setup().await;
        let outsider = case("Login outside plan", 1, 1);
        s.storage.insert_case(outsider.clone()).await;
        let condition = s
            .builder
            .build(&ctx(), s.plan, &query(&[("title", "LOGIN")]))
            .await
            .unwrap();
        let ids = condition.test_case_ids.unwrap();
        assert_eq!(ids.len(), 2);
        assert!(!ids.contains(&outsider.test_case_id));
    }

    #[tokio::test]
    async fn test_suite_sentinel_and_exact_suite() {
        let s = setup().await;
        let condition = s
            .builder
            .build(&ctx(), s.plan, &query(&[("suite_id", "-1")]))
            .await
            .unwrap();
        assert_eq!(condition.suite, Some(SuiteRestriction::Unassigned));

        let suite = TestSuiteId::now_v7();
        let condition = s
            .builder
            .build(&ctx(), s.plan, &query(&[("suite_id", &suite.to_string())]))
            .await
            .unwrap();
        assert_eq!(condition.suite, Some(SuiteRestriction::Exact(suite)));

        let condition = s.builder.build(&ctx(), s.plan, &query(&[])).await.unwrap();
        assert_eq!(condition.suite, None);
    }

    #[tokio::test]
    async fn test_custom_null_suite_arg() {
        let s = setup().await;
        let builder = s.builder.clone().with_null_suite_arg("none");
        let condition = builder
            .build(&ctx(), s.plan, &query(&[("suite_id", "none")]))
            .await
            .unwrap();
        assert_eq!(condition.suite, Some(SuiteRestriction::Unassigned));

        let err = builder
            .build(&ctx(), s.plan, &query(&[("suite_id", "-1")]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TestRunError::Validation(ValidationError::InvalidId { .. })
        ));
    }

    #[tokio::test]
    async fn test_executor_facet_is_parsed() {
        let s = setup().await;
        let executor = UserId::now_v7();
        let condition = s
            .builder
            .build(&ctx(), s.plan, &query(&[("executor", &executor.to_string())]))
            .await
            .unwrap();
        assert_eq!(condition.executor_uid, Some(executor));

        let err = s
            .builder
            .build(&ctx(), s.plan, &query(&[("executor", "alice")]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TestRunError::Validation(ValidationError::InvalidId { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_numbers_fail_before_lookups() {
        let s = setup().await;
        let err = s
            .builder
            .build(
                &ctx(),
                s.plan,
                &query(&[("title", "login"), ("important_level", "high")]),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TestRunError::Validation(ValidationError::InvalidNumber { .. })
        ));
        assert_eq!(s.storage.stats().case_lookups, 0);
        assert_eq!(s.storage.stats().plan_lookups, 0);
    }

    #[tokio::test]
    async fn test_blank_facets_are_ignored() {
        let s = setup().await;
        let condition = s
            .builder
            .build(
                &ctx(),
                s.plan,
                &query(&[("title", "  "), ("priority", ""), ("suite_id", " ")]),
            )
            .await
            .unwrap();
        assert_eq!(condition, RunCondition::for_plan(s.plan));
    }
}
