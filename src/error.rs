// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Error taxonomy shared by the document codec, the query compiler and the
//! search orchestrator, plus its mapping onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Message returned when any requested collection handle is unknown.
pub const MISSING_HANDLES_MESSAGE: &str = "Could not find all the specified collection handles";

const UNEXPECTED_MESSAGE: &str = "Something unexpected happened and we've been alerted.";

#[derive(Debug, Error)]
pub enum SearchError {
    /// Malformed or missing input; every violated constraint is listed.
    #[error("{}", .0.join(", "))]
    Validation(Vec<String>),

    /// One or more referenced collections do not exist.
    #[error("{0}")]
    NotFound(String),

    /// The search engine failed or timed out. Callers may retry.
    #[error("Search engine unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl SearchError {
    /// Validation error with a single violation
    pub fn validation(message: impl Into<String>) -> Self {
        SearchError::Validation(vec![message.into()])
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, SearchError::UpstreamUnavailable(_))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            SearchError::Validation(_) | SearchError::NotFound(_) => StatusCode::BAD_REQUEST,
            SearchError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            SearchError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            SearchError::NotFound(message) => json!({ "error": message }),
            SearchError::Unexpected(e) => {
                tracing::error!(error = ?e, "Unexpected error while handling request");
                json!({ "status": status.as_u16(), "developer_message": UNEXPECTED_MESSAGE })
            }
            other => json!({ "status": status.as_u16(), "developer_message": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
