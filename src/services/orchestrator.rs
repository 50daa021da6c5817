// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Multi-collection search: validate, resolve collections, query the engine
//! once, then project.

use crate::error::SearchError;
use crate::models::search::SearchMetadata;
use crate::models::settings::SearchSettings;
use crate::services::engine::{CollectionDirectory, SearchEngine};
use crate::services::logging::truncate_for_log;
use crate::services::query_compiler::{build_query, compile};
use crate::services::result_projector::{project, ProjectedResults};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

const LOGGED_QUERY_CHARS: usize = 80;

pub struct SearchOrchestrator {
    engine: Arc<dyn SearchEngine>,
    directory: Arc<dyn CollectionDirectory>,
    settings: SearchSettings,
}

impl SearchOrchestrator {
    pub fn new(
        engine: Arc<dyn SearchEngine>,
        directory: Arc<dyn CollectionDirectory>,
        settings: SearchSettings,
    ) -> Self {
        Self {
            engine,
            directory,
            settings,
        }
    }

    /// Run one search over every requested collection.
    ///
    /// Nothing reaches the engine unless the parameters are valid and every
    /// handle resolves. The engine is asked exactly once. The collection
    /// lookup and the query share one deadline of the configured timeout.
    pub async fn search(
        &self,
        params: &HashMap<String, String>,
    ) -> Result<(ProjectedResults, SearchMetadata), SearchError> {
        let request = compile(params, &self.settings)?;

        let started = Instant::now();
        let deadline = tokio::time::Instant::from_std(started) + self.settings.engine_timeout;

        let collections =
            match tokio::time::timeout_at(deadline, self.directory.resolve_handles(&request.handles))
                .await
            {
                Ok(resolved) => resolved?,
                Err(_) => return Err(self.timed_out("Collection lookup timed out", &request.handles)),
            };
        let indices: Vec<String> = collections.into_iter().map(|c| c.index).collect();
        let query = build_query(&request);

        let response = match tokio::time::timeout_at(
            deadline,
            self.engine.execute_query(&indices, &query),
        )
        .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!(indices = ?indices, error = %e, "Search engine query failed");
                return Err(SearchError::UpstreamUnavailable(e.to_string()));
            }
            Err(_) => return Err(self.timed_out("Search engine query timed out", &indices)),
        };

        info!(
            handles = ?request.handles,
            language = %request.language,
            query = %truncate_for_log(request.query.as_deref().unwrap_or(""), LOGGED_QUERY_CHARS),
            total = response.total,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Search completed"
        );

        Ok(project(response, &request))
    }

    fn timed_out(&self, message: &str, targets: &[String]) -> SearchError {
        let timeout_ms = self.settings.engine_timeout.as_millis() as u64;
        warn!(targets = ?targets, timeout_ms, "{}", message);
        SearchError::UpstreamUnavailable(format!("no response within {} ms", timeout_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MISSING_HANDLES_MESSAGE;
    use crate::models::document::IndexedRecord;
    use crate::models::query::{EngineResponse, StructuredQuery};
    use crate::services::engine::IndexDirectory;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Engine with a fixed set of indices that counts the queries it receives
    struct CountingEngine {
        indices: Vec<String>,
        queries: AtomicUsize,
        delay: Option<Duration>,
        lookup_delay: Option<Duration>,
        fail: bool,
    }

    impl CountingEngine {
        fn new(indices: &[&str]) -> Self {
            Self {
                indices: indices.iter().map(|i| i.to_string()).collect(),
                queries: AtomicUsize::new(0),
                delay: None,
                lookup_delay: None,
                fail: false,
            }
        }
    }

    #[async_trait]
    impl SearchEngine for CountingEngine {
        async fn execute_query(
            &self,
            _indices: &[String],
            _query: &StructuredQuery,
        ) -> Result<EngineResponse> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(anyhow!("connection reset"));
            }
            Ok(EngineResponse::default())
        }

        async fn index_document(&self, _index: &str, _record: &IndexedRecord) -> Result<()> {
            Ok(())
        }

        async fn index_exists(&self, index: &str) -> Result<bool> {
            if let Some(delay) = self.lookup_delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self.indices.iter().any(|i| i == index))
        }

        async fn fetch_document(&self, _index: &str, _id: &str) -> Result<Option<IndexedRecord>> {
            Ok(None)
        }
    }

    fn orchestrator(engine: Arc<CountingEngine>, timeout: Duration) -> SearchOrchestrator {
        let directory = IndexDirectory::new(engine.clone(), "documents".to_string());
        let settings = SearchSettings {
            engine_timeout: timeout,
            ..SearchSettings::default()
        };
        SearchOrchestrator::new(engine, Arc::new(directory), settings)
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_valid_search_queries_engine_once() {
        let engine = Arc::new(CountingEngine::new(&["documents-a", "documents-b"]));
        let orchestrator = orchestrator(engine.clone(), Duration::from_secs(5));

        let (results, metadata) = orchestrator
            .search(&params(&[("handles", "a,b"), ("query", "common")]))
            .await
            .unwrap();

        assert_eq!(results.count(), 0);
        assert_eq!(metadata.total, 0);
        assert_eq!(engine.queries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_params_never_reach_engine() {
        let engine = Arc::new(CountingEngine::new(&["documents-a"]));
        let orchestrator = orchestrator(engine.clone(), Duration::from_secs(5));

        let error = orchestrator
            .search(&params(&[("handles", "a"), ("size", "-1")]))
            .await
            .unwrap_err();

        assert!(matches!(error, SearchError::Validation(_)));
        assert_eq!(engine.queries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_handle_never_reaches_engine() {
        let engine = Arc::new(CountingEngine::new(&["documents-a"]));
        let orchestrator = orchestrator(engine.clone(), Duration::from_secs(5));

        let error = orchestrator
            .search(&params(&[("handles", "a,missing")]))
            .await
            .unwrap_err();

        assert!(matches!(error, SearchError::NotFound(ref m) if m == MISSING_HANDLES_MESSAGE));
        assert_eq!(engine.queries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_engine_failure_is_retryable() {
        let mut engine = CountingEngine::new(&["documents-a"]);
        engine.fail = true;
        let orchestrator = orchestrator(Arc::new(engine), Duration::from_secs(5));

        let error = orchestrator
            .search(&params(&[("handles", "a")]))
            .await
            .unwrap_err();
        assert!(error.is_retryable());
    }

    #[tokio::test]
    async fn test_engine_timeout_is_retryable() {
        let mut engine = CountingEngine::new(&["documents-a"]);
        engine.delay = Some(Duration::from_millis(500));
        let orchestrator = orchestrator(Arc::new(engine), Duration::from_millis(20));

        let error = orchestrator
            .search(&params(&[("handles", "a")]))
            .await
            .unwrap_err();
        assert!(matches!(error, SearchError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_slow_collection_lookup_is_retryable() {
        let mut engine = CountingEngine::new(&["documents-a"]);
        engine.lookup_delay = Some(Duration::from_secs(2));
        let engine = Arc::new(engine);
        let orchestrator = orchestrator(engine.clone(), Duration::from_millis(20));

        let started = Instant::now();
        let error = orchestrator
            .search(&params(&[("handles", "a")]))
            .await
            .unwrap_err();

        assert!(error.is_retryable());
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(engine.queries.load(Ordering::SeqCst), 0);
    }
}
