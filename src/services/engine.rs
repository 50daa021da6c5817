// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Seams to the external collaborators: the search engine and the directory
//! that maps collection handles onto engine indices.

use crate::error::{SearchError, MISSING_HANDLES_MESSAGE};
use crate::models::document::IndexedRecord;
use crate::models::query::{EngineResponse, StructuredQuery};
use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use tracing::warn;

/// Search engine holding one index per collection.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Run one query across all `indices` and return the merged page of hits.
    async fn execute_query(
        &self,
        indices: &[String],
        query: &StructuredQuery,
    ) -> Result<EngineResponse>;

    /// Add or replace a record; records without an ID are rejected.
    async fn index_document(&self, index: &str, record: &IndexedRecord) -> Result<()>;

    async fn index_exists(&self, index: &str) -> Result<bool>;

    async fn fetch_document(&self, index: &str, id: &str) -> Result<Option<IndexedRecord>>;
}

/// A collection handle resolved to the engine index backing it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCollection {
    pub handle: String,
    pub index: String,
}

/// Maps collection handles onto engine indices.
#[async_trait]
pub trait CollectionDirectory: Send + Sync {
    /// Resolve every handle or fail with [`SearchError::NotFound`]; never a subset.
    async fn resolve_handles(
        &self,
        handles: &[String],
    ) -> Result<Vec<ResolvedCollection>, SearchError>;
}

/// Index name for a collection handle
pub fn index_name(prefix: &str, handle: &str) -> String {
    format!("{}-{}", prefix, handle)
}

/// Directory backed by the engine itself: a collection exists when its index does
pub struct IndexDirectory {
    engine: Arc<dyn SearchEngine>,
    prefix: String,
}

impl IndexDirectory {
    pub fn new(engine: Arc<dyn SearchEngine>, prefix: String) -> Self {
        Self { engine, prefix }
    }
}

#[async_trait]
impl CollectionDirectory for IndexDirectory {
    async fn resolve_handles(
        &self,
        handles: &[String],
    ) -> Result<Vec<ResolvedCollection>, SearchError> {
        let checks = join_all(handles.iter().map(|handle| async move {
            let index = index_name(&self.prefix, handle);
            let exists = self.engine.index_exists(&index).await;
            (handle, index, exists)
        }))
        .await;

        let mut resolved = Vec::with_capacity(checks.len());
        let mut missing = Vec::new();
        for (handle, index, exists) in checks {
            match exists {
                Ok(true) => resolved.push(ResolvedCollection {
                    handle: handle.clone(),
                    index,
                }),
                Ok(false) => missing.push(handle.as_str()),
                Err(e) => {
                    warn!(handle = %handle, error = %e, "Failed to check collection index");
                    return Err(SearchError::UpstreamUnavailable(e.to_string()));
                }
            }
        }

        if !missing.is_empty() {
            warn!(missing = ?missing, "Unknown collection handles requested");
            return Err(SearchError::NotFound(MISSING_HANDLES_MESSAGE.to_string()));
        }

        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::collections::HashSet;

    struct ExistingIndices {
        names: HashSet<String>,
        fail: bool,
    }

    #[async_trait]
    impl SearchEngine for ExistingIndices {
        async fn execute_query(
            &self,
            _indices: &[String],
            _query: &StructuredQuery,
        ) -> Result<EngineResponse> {
            Ok(EngineResponse::default())
        }

        async fn index_document(&self, _index: &str, _record: &IndexedRecord) -> Result<()> {
            Ok(())
        }

        async fn index_exists(&self, index: &str) -> Result<bool> {
            if self.fail {
                return Err(anyhow!("connection refused"));
            }
            Ok(self.names.contains(index))
        }

        async fn fetch_document(&self, _index: &str, _id: &str) -> Result<Option<IndexedRecord>> {
            Ok(None)
        }
    }

    fn directory(names: &[&str], fail: bool) -> IndexDirectory {
        let engine = ExistingIndices {
            names: names.iter().map(|n| n.to_string()).collect(),
            fail,
        };
        IndexDirectory::new(Arc::new(engine), "documents".to_string())
    }

    fn handles(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_index_name() {
        assert_eq!(index_name("documents", "agency_blogs"), "documents-agency_blogs");
    }

    #[tokio::test]
    async fn test_resolves_every_known_handle() {
        let directory = directory(&["documents-a", "documents-b"], false);
        let resolved = directory.resolve_handles(&handles(&["a", "b"])).await.unwrap();
        assert_eq!(
            resolved,
            vec![
                ResolvedCollection {
                    handle: "a".to_string(),
                    index: "documents-a".to_string(),
                },
                ResolvedCollection {
                    handle: "b".to_string(),
                    index: "documents-b".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_any_unknown_handle_fails_the_whole_set() {
        let directory = directory(&["documents-known"], false);
        let error = directory
            .resolve_handles(&handles(&["known", "missing"]))
            .await
            .unwrap_err();
        assert!(matches!(error, SearchError::NotFound(ref m) if m == MISSING_HANDLES_MESSAGE));
    }

    #[tokio::test]
    async fn test_engine_failure_is_upstream_unavailable() {
        let directory = directory(&[], true);
        let error = directory.resolve_handles(&handles(&["a"])).await.unwrap_err();
        assert!(error.is_retryable());
    }
}
