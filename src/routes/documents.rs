// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Collection document route handlers.

use crate::app::AppState;
use crate::error::{SearchError, MISSING_HANDLES_MESSAGE};
use crate::models::document::{DocumentStatusResponse, Language, PublicDocument};
use crate::services::engine::ResolvedCollection;
use crate::services::field_codec::{deserialize, serialize};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

/// Routes nested under `/api/v1/collections`
pub fn documents_router() -> Router<AppState> {
    Router::new()
        .route("/{handle}/documents", post(create_document_handler))
        .route(
            "/{handle}/documents/{id}",
            get(get_document_handler).put(put_document_handler),
        )
}

#[derive(Debug, Deserialize)]
pub struct DocumentQuery {
    pub language: Option<String>,
}

async fn resolve_collection(
    state: &AppState,
    handle: String,
) -> Result<ResolvedCollection, SearchError> {
    state
        .directory
        .resolve_handles(&[handle])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| SearchError::NotFound(MISSING_HANDLES_MESSAGE.to_string()))
}

pub async fn create_document_handler(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    payload: Result<Json<PublicDocument>, JsonRejection>,
) -> Result<(StatusCode, Json<DocumentStatusResponse>), SearchError> {
    let Json(document) = payload.map_err(|e| SearchError::validation(e.body_text()))?;
    store_document(&state, handle, document).await
}

/// Stores a document under the id given in the path; a body `id` is overridden
pub async fn put_document_handler(
    State(state): State<AppState>,
    Path((handle, id)): Path<(String, String)>,
    payload: Result<Json<PublicDocument>, JsonRejection>,
) -> Result<(StatusCode, Json<DocumentStatusResponse>), SearchError> {
    let Json(document) = payload.map_err(|e| SearchError::validation(e.body_text()))?;
    let document = PublicDocument {
        id: Some(id),
        ..document
    };
    store_document(&state, handle, document).await
}

// Meilisearch needs the primary key from the caller, it never generates one
async fn store_document(
    state: &AppState,
    handle: String,
    document: PublicDocument,
) -> Result<(StatusCode, Json<DocumentStatusResponse>), SearchError> {
    let collection = resolve_collection(state, handle).await?;

    let mut violations = Vec::new();
    let id = document
        .id
        .clone()
        .filter(|id| !id.trim().is_empty());
    if id.is_none() {
        violations.push("id is missing".to_string());
    }

    let language = document.language.clone().unwrap_or_default();
    let record = match serialize(document, &language) {
        Ok(record) if violations.is_empty() => record,
        Ok(_) => return Err(SearchError::Validation(violations)),
        Err(SearchError::Validation(more)) => {
            violations.extend(more);
            return Err(SearchError::Validation(violations));
        }
        Err(e) => return Err(e),
    };

    state
        .engine
        .index_document(&collection.index, &record)
        .await
        .map_err(|e| {
            warn!(index = %collection.index, error = %e, "Failed to index document");
            SearchError::UpstreamUnavailable(e.to_string())
        })?;

    info!(
        handle = %collection.handle,
        id = ?id,
        language = %record.language,
        "Indexed document"
    );

    Ok((
        StatusCode::CREATED,
        Json(DocumentStatusResponse {
            status: StatusCode::CREATED.as_u16(),
            developer_message: "OK".to_string(),
            user_message: "Your document was successfully created.".to_string(),
        }),
    ))
}

pub async fn get_document_handler(
    State(state): State<AppState>,
    Path((handle, id)): Path<(String, String)>,
    Query(params): Query<DocumentQuery>,
) -> Result<Response, SearchError> {
    let language = match params.language.as_deref() {
        None => state.settings.default_language,
        Some(code) => Language::parse(code)
            .ok_or_else(|| SearchError::validation("language does not have a valid value"))?,
    };
    let collection = resolve_collection(&state, handle).await?;

    let record = state
        .engine
        .fetch_document(&collection.index, &id)
        .await
        .map_err(|e| {
            warn!(index = %collection.index, error = %e, "Failed to fetch document");
            SearchError::UpstreamUnavailable(e.to_string())
        })?;

    match record {
        Some(record) => Ok(Json(deserialize(record, language)).into_response()),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Document not found" })),
        )
            .into_response()),
    }
}
