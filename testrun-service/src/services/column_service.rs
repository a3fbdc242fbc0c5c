//! Column Service
//!
//! Per-user, per-plan display column preferences for the run listing.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use testrun_core::{
    ColumnDescriptor, OperationContext, PropertyDef, TestPlanId, TestRunColumn, TestRunResult,
    ValidationError, PROPERTIES,
};
use testrun_storage::TestRunColumnRepository;

use crate::error::{ServiceError, ServiceResult};

/// Stored column lists plus the catalog, for rendering a column picker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSettings {
    pub locked_fields: Vec<String>,
    pub normal_fields: Vec<String>,
    pub properties: Vec<PropertyDef>,
}

/// Request body for saving columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetColumnsRequest {
    #[serde(default)]
    pub locked_fields: Vec<String>,
    #[serde(default)]
    pub normal_fields: Vec<String>,
}

/// Reads and writes `TestRunColumn` records for the calling user.
#[derive(Clone)]
pub struct ColumnService {
    columns: Arc<dyn TestRunColumnRepository>,
}

impl ColumnService {
    pub fn new(columns: Arc<dyn TestRunColumnRepository>) -> Self {
        Self { columns }
    }

    /// The caller's record for a plan, or the empty record if none was saved.
    async fn record(
        &self,
        ctx: &OperationContext,
        test_plan_id: TestPlanId,
    ) -> TestRunResult<TestRunColumn> {
        Ok(self
            .columns
            .find_one(ctx, ctx.uid, test_plan_id)
            .await?
            .unwrap_or_else(|| TestRunColumn::empty(ctx.uid, test_plan_id)))
    }

    /// Resolved columns: locked fields first, then normal fields, each in
    /// stored order. Keys missing from the catalog are skipped.
    pub async fn get_columns(
        &self,
        ctx: &OperationContext,
        test_plan_id: TestPlanId,
    ) -> TestRunResult<Vec<ColumnDescriptor>> {
        let record = self.record(ctx, test_plan_id).await?;
        Ok(describe(&record))
    }

    /// Raw stored lists together with the full property catalog.
    pub async fn get_column_settings(
        &self,
        ctx: &OperationContext,
        test_plan_id: TestPlanId,
    ) -> TestRunResult<ColumnSettings> {
        let record = self.record(ctx, test_plan_id).await?;
        Ok(ColumnSettings {
            locked_fields: record.locked_fields,
            normal_fields: record.normal_fields,
            properties: PROPERTIES.to_vec(),
        })
    }

    /// Replace the caller's columns for a plan and return the resolved result.
    ///
    /// A key may not be both locked and normal. A failed write is reported as
    /// an internal error and nothing is read back.
    pub async fn set_columns(
        &self,
        ctx: &OperationContext,
        test_plan_id: TestPlanId,
        request: SetColumnsRequest,
    ) -> ServiceResult<Vec<ColumnDescriptor>> {
        check_disjoint(&request.locked_fields, &request.normal_fields).map_err(|e| {
            tracing::warn!(plan_id = %test_plan_id, error = %e, "Rejected column settings");
            ServiceError::from(e)
        })?;

        let record = TestRunColumn {
            uid: ctx.uid,
            test_plan_id,
            locked_fields: request.locked_fields,
            normal_fields: request.normal_fields,
        };
        if let Err(e) = self.columns.upsert(ctx, &record).await {
            tracing::error!(plan_id = %test_plan_id, uid = %ctx.uid, error = %e, "Column write failed");
            return Err(ServiceError::internal_error("set test run property failure"));
        }

        Ok(self.get_columns(ctx, test_plan_id).await?)
    }
}

/// Resolve a record against the property catalog.
pub fn describe(record: &TestRunColumn) -> Vec<ColumnDescriptor> {
    let locked = record
        .locked_fields
        .iter()
        .filter_map(|key| ColumnDescriptor::resolve(key, true));
    let normal = record
        .normal_fields
        .iter()
        .filter_map(|key| ColumnDescriptor::resolve(key, false));
    locked.chain(normal).collect()
}

fn check_disjoint(locked: &[String], normal: &[String]) -> Result<(), ValidationError> {
    let locked: HashSet<&str> = locked.iter().map(String::as_str).collect();
    let mut overlap: Vec<String> = normal
        .iter()
        .filter(|key| locked.contains(key.as_str()))
        .cloned()
        .collect();
    if overlap.is_empty() {
        return Ok(());
    }
    overlap.sort();
    overlap.dedup();
    Err(ValidationError::OverlappingColumnFields { keys: overlap })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use testrun_core::{EntityIdType, UserId};
    use testrun_storage::MockStorage;

    fn setup() -> (Arc<MockStorage>, ColumnService, OperationContext, TestPlanId) {
        let storage = Arc::new(MockStorage::new());
        let service = ColumnService::new(storage.clone());
        (
            storage,
            service,
            OperationContext::new(UserId::now_v7()),
            TestPlanId::now_v7(),
        )
    }

    fn keys(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    #[tokio::test]
    async fn test_columns_before_any_write_are_empty() {
        let (_, service, ctx, plan) = setup();
        let columns = service.get_columns(&ctx, plan).await.unwrap();
        assert!(columns.is_empty());

        let settings = service.get_column_settings(&ctx, plan).await.unwrap();
        assert!(settings.locked_fields.is_empty());
        assert!(settings.normal_fields.is_empty());
        assert_eq!(settings.properties.len(), PROPERTIES.len());
    }

    #[tokio::test]
    async fn test_set_then_get_orders_locked_before_normal() {
        let (_, service, ctx, plan) = setup();
        let request = SetColumnsRequest {
            locked_fields: keys(&["title", "bogus", "identifier"]),
            normal_fields: keys(&["status", "executor", "not_a_property", "priority"]),
        };
        let set = service.set_columns(&ctx, plan, request).await.unwrap();
        let got = service.get_columns(&ctx, plan).await.unwrap();
        assert_eq!(set, got);

        let rendered: Vec<(&str, bool)> = got
            .iter()
            .map(|c| (c.key.as_str(), c.is_locked))
            .collect();
        assert_eq!(
            rendered,
            vec![
                ("title", true),
                ("identifier", true),
                ("status", false),
                ("executor", false),
                ("priority", false),
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_keys_are_stored_but_not_rendered() {
        let (storage, service, ctx, plan) = setup();
        let request = SetColumnsRequest {
            locked_fields: keys(&["bogus"]),
            normal_fields: Vec::new(),
        };
        let columns = service.set_columns(&ctx, plan, request).await.unwrap();
        assert!(columns.is_empty());
        let stored = storage.column_record(ctx.uid, plan).await.unwrap();
        assert_eq!(stored.locked_fields, keys(&["bogus"]));
    }

    #[tokio::test]
    async fn test_columns_are_per_user() {
        let (_, service, ctx, plan) = setup();
        let request = SetColumnsRequest {
            locked_fields: keys(&["title"]),
            normal_fields: Vec::new(),
        };
        service.set_columns(&ctx, plan, request).await.unwrap();

        let other = OperationContext::new(UserId::now_v7());
        assert!(service.get_columns(&other, plan).await.unwrap().is_empty());
        assert!(service
            .get_columns(&ctx, TestPlanId::now_v7())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_overlapping_fields_are_rejected_before_write() {
        let (storage, service, ctx, plan) = setup();
        let request = SetColumnsRequest {
            locked_fields: keys(&["title", "status"]),
            normal_fields: keys(&["status", "priority", "status"]),
        };
        let err = service.set_columns(&ctx, plan, request).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
        assert_eq!(err.details, Some(serde_json::json!({ "keys": ["status"] })));
        assert_eq!(storage.stats().column_writes, 0);
    }

    #[tokio::test]
    async fn test_failed_write_is_internal_error_without_read_back() {
        let (storage, service, ctx, plan) = setup();
        storage.set_fail_column_writes(true);
        let request = SetColumnsRequest {
            locked_fields: keys(&["title"]),
            normal_fields: Vec::new(),
        };
        let err = service.set_columns(&ctx, plan, request).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InternalError);
        assert_eq!(err.message, "set test run property failure");
        assert_eq!(storage.stats().column_reads, 0);
    }

    #[test]
    fn test_describe_tolerates_key_in_both_lists() {
        let record = TestRunColumn {
            uid: UserId::nil(),
            test_plan_id: TestPlanId::nil(),
            locked_fields: keys(&["title"]),
            normal_fields: keys(&["title"]),
        };
        let columns = describe(&record);
        assert_eq!(columns.len(), 2);
        assert!(columns[0].is_locked);
        assert!(!columns[1].is_locked);
    }
}
