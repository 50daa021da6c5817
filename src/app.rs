// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Application state, route handlers, and router construction.
//!
//! This module is `pub` so that integration tests can build a test router directly
//! without starting the full binary.

use crate::error::SearchError;
use crate::models::search::SearchResponse;
use crate::models::settings::SearchSettings;
use crate::models::version::VersionResponse;
use crate::routes::documents_router;
use crate::services::engine::{CollectionDirectory, SearchEngine};
use crate::services::orchestrator::SearchOrchestrator;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Application version extracted from `Cargo.toml` at compile time.
/// The patch segment can be overridden via `APP_PATCH_VERSION` (see `build.rs`).
pub const VERSION: &str = env!("APP_VERSION");

pub const SERVICE_NAME: &str = "collection-search";

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Shared application state injected into every route handler via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<SearchOrchestrator>,
    /// Used directly by the document routes
    pub engine: Arc<dyn SearchEngine>,
    pub directory: Arc<dyn CollectionDirectory>,
    pub settings: SearchSettings,
}

impl AppState {
    /// Wire the orchestrator and document routes to the same collaborators.
    pub fn new(
        engine: Arc<dyn SearchEngine>,
        directory: Arc<dyn CollectionDirectory>,
        settings: SearchSettings,
    ) -> Self {
        let orchestrator = Arc::new(SearchOrchestrator::new(
            engine.clone(),
            directory.clone(),
            settings.clone(),
        ));
        Self {
            orchestrator,
            engine,
            directory,
            settings,
        }
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

pub async fn version_handler() -> Json<VersionResponse> {
    Json(VersionResponse {
        service: SERVICE_NAME.to_string(),
        version: VERSION.to_string(),
    })
}

/// Search across the collections named in `handles`; every other query
/// parameter is validated by the orchestrator.
pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<SearchResponse>, SearchError> {
    let (results, metadata) = state.orchestrator.search(&params).await?;
    Ok(Json(SearchResponse {
        results: results.collect(),
        metadata,
    }))
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the Axum application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/version", get(version_handler))
        .route("/api/v1/collections/search", get(search_handler))
        .nest("/api/v1/collections", documents_router())
        .with_state(state)
}
