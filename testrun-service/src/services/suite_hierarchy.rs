//! Suite Hierarchy Service
//!
//! Resolves suites together with their ancestor chains, for navigation,
//! page display and single-run breadcrumbs.

use std::collections::HashSet;
use std::sync::Arc;

use testrun_core::{OperationContext, TestRunResult, TestSuite, TestSuiteId};
use testrun_storage::{TestSuiteRepository, TreeDisplay};

/// Where suite nodes are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuiteSource {
    /// The suite repository (navigation, breadcrumbs).
    Repository,
    /// The tree display service (page display).
    TreeDisplay,
}

/// Resolves suites plus ancestors.
#[derive(Clone)]
pub struct SuiteHierarchy {
    suites: Arc<dyn TestSuiteRepository>,
    tree: Arc<dyn TreeDisplay>,
}

impl SuiteHierarchy {
    pub fn new(suites: Arc<dyn TestSuiteRepository>, tree: Arc<dyn TreeDisplay>) -> Self {
        Self { suites, tree }
    }

    async fn fetch(
        &self,
        ctx: &OperationContext,
        source: SuiteSource,
        ids: &[TestSuiteId],
    ) -> TestRunResult<Vec<TestSuite>> {
        match source {
            SuiteSource::Repository => self.suites.find_by_ids(ctx, ids).await,
            SuiteSource::TreeDisplay => self.tree.get_tree_nodes(ctx, ids).await,
        }
    }

    /// The requested suites followed by every ancestor not already present.
    ///
    /// Empty input performs no lookup. Ids that do not resolve are dropped.
    pub async fn resolve_with_ancestors(
        &self,
        ctx: &OperationContext,
        ids: &[TestSuiteId],
        source: SuiteSource,
    ) -> TestRunResult<Vec<TestSuite>> {
        let requested = dedup(ids.iter().copied());
        if requested.is_empty() {
            return Ok(Vec::new());
        }

        let mut suites = self.fetch(ctx, source, &requested).await?;
        let mut seen: HashSet<TestSuiteId> = suites.iter().map(|s| s.suite_id).collect();

        let ancestor_ids: Vec<TestSuiteId> = dedup(
            suites
                .iter()
                .flat_map(|s| s.parent_ids.iter().copied())
                .filter(|id| !seen.contains(id)),
        );
        if ancestor_ids.is_empty() {
            return Ok(suites);
        }

        let ancestors = self.fetch(ctx, source, &ancestor_ids).await?;
        for ancestor in ancestors {
            if seen.insert(ancestor.suite_id) {
                suites.push(ancestor);
            }
        }

        tracing::debug!(
            requested = requested.len(),
            resolved = suites.len(),
            ?source,
            "Resolved suite hierarchy"
        );
        Ok(suites)
    }

    /// Ancestor chain of one suite, root first, ending with the suite itself.
    ///
    /// A missing suite yields an empty chain; missing ancestors are skipped.
    pub async fn breadcrumb(
        &self,
        ctx: &OperationContext,
        suite_id: TestSuiteId,
    ) -> TestRunResult<Vec<TestSuite>> {
        let Some(suite) = self.suites.find_one_by_id(ctx, suite_id).await? else {
            return Ok(Vec::new());
        };

        let mut chain = Vec::with_capacity(suite.parent_ids.len() + 1);
        if !suite.parent_ids.is_empty() {
            let mut parents = self.suites.find_by_ids(ctx, &suite.parent_ids).await?;
            // Lookups by id come back in store order; rebuild parent_ids order.
            for parent_id in &suite.parent_ids {
                if let Some(pos) = parents.iter().position(|p| p.suite_id == *parent_id) {
                    chain.push(parents.swap_remove(pos));
                }
            }
        }
        chain.push(suite);
        Ok(chain)
    }
}

/// Distinct values in first-seen order.
pub(crate) fn dedup<T, I>(values: I) -> Vec<T>
where
    T: Copy + Eq + std::hash::Hash,
    I: IntoIterator<Item = T>,
{
    let mut seen = HashSet::new();
    values.into_iter().filter(|v| seen.insert(*v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use testrun_core::{EntityIdType, UserId};
    use testrun_storage::MockStorage;

    fn suite(name: &str, parent_ids: Vec<TestSuiteId>) -> TestSuite {
        TestSuite {
            suite_id: TestSuiteId::now_v7(),
            name: name.to_string(),
            parent_ids,
        }
    }

    async fn hierarchy() -> (Arc<MockStorage>, SuiteHierarchy, [TestSuite; 4]) {
        let storage = Arc::new(MockStorage::new());
        let root = suite("root", vec![]);
        let mid = suite("mid", vec![root.suite_id]);
        let leaf = suite("leaf", vec![root.suite_id, mid.suite_id]);
        let sibling = suite("sibling", vec![root.suite_id]);
        for s in [&root, &mid, &leaf, &sibling] {
            storage.insert_suite(s.clone()).await;
        }
        let resolver = SuiteHierarchy::new(storage.clone(), storage.clone());
        (storage, resolver, [root, mid, leaf, sibling])
    }

    fn ctx() -> OperationContext {
        OperationContext::new(UserId::now_v7())
    }

    fn ids(suites: &[TestSuite]) -> HashSet<TestSuiteId> {
        suites.iter().map(|s| s.suite_id).collect()
    }

    #[tokio::test]
    async fn test_empty_input_performs_no_lookup() {
        let (storage, resolver, _) = hierarchy().await;
        let resolved = resolver
            .resolve_with_ancestors(&ctx(), &[], SuiteSource::Repository)
            .await
            .unwrap();
        assert!(resolved.is_empty());
        assert_eq!(storage.stats().suite_lookups, 0);
    }

    #[tokio::test]
    async fn test_suite_resolves_with_all_ancestors() {
        let (_, resolver, [root, mid, leaf, _]) = hierarchy().await;
        let resolved = resolver
            .resolve_with_ancestors(&ctx(), &[leaf.suite_id], SuiteSource::Repository)
            .await
            .unwrap();
        assert_eq!(resolved[0], leaf);
        assert_eq!(
            ids(&resolved),
            HashSet::from([leaf.suite_id, root.suite_id, mid.suite_id])
        );
    }

    #[tokio::test]
    async fn test_shared_ancestors_are_deduplicated() {
        let (_, resolver, [root, mid, leaf, sibling]) = hierarchy().await;
        let resolved = resolver
            .resolve_with_ancestors(
                &ctx(),
                &[leaf.suite_id, sibling.suite_id, mid.suite_id, leaf.suite_id],
                SuiteSource::TreeDisplay,
            )
            .await
            .unwrap();
        assert_eq!(resolved.len(), 4);
        assert_eq!(
            ids(&resolved),
            HashSet::from([leaf.suite_id, sibling.suite_id, mid.suite_id, root.suite_id])
        );
    }

    #[tokio::test]
    async fn test_tree_display_source_is_used() {
        let (storage, resolver, [_, _, leaf, _]) = hierarchy().await;
        resolver
            .resolve_with_ancestors(&ctx(), &[leaf.suite_id], SuiteSource::TreeDisplay)
            .await
            .unwrap();
        let stats = storage.stats();
        assert_eq!(stats.tree_lookups, 2);
        assert_eq!(stats.suite_lookups, 0);
    }

    #[tokio::test]
    async fn test_missing_suites_are_dropped() {
        let (_, resolver, [root, ..]) = hierarchy().await;
        let orphan_parent = TestSuiteId::now_v7();
        let resolved = resolver
            .resolve_with_ancestors(
                &ctx(),
                &[root.suite_id, TestSuiteId::now_v7(), orphan_parent],
                SuiteSource::Repository,
            )
            .await
            .unwrap();
        assert_eq!(resolved, vec![root]);
    }

    #[tokio::test]
    async fn test_breadcrumb_follows_parent_order() {
        let (_, resolver, [root, mid, leaf, _]) = hierarchy().await;
        let chain = resolver.breadcrumb(&ctx(), leaf.suite_id).await.unwrap();
        let names: Vec<_> = chain.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["root", "mid", "leaf"]);
        assert_eq!(chain[0], root);
        assert_eq!(chain[1], mid);
    }

    #[tokio::test]
    async fn test_breadcrumb_of_missing_suite_is_empty() {
        let (_, resolver, _) = hierarchy().await;
        let chain = resolver
            .breadcrumb(&ctx(), TestSuiteId::now_v7())
            .await
            .unwrap();
        assert!(chain.is_empty());
    }

    #[test]
    fn test_dedup_keeps_first_seen_order() {
        assert_eq!(dedup([3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }
}
