// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::document::Language;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Validated search parameters for one call
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    /// Collection handles to search across (non-empty, deduplicated)
    pub handles: Vec<String>,
    pub language: Language,
    /// Free-text query; `None` matches every document
    pub query: Option<String>,
    /// Lower-cased tags a result should carry (any of them)
    pub tags: Vec<String>,
    /// Lower-cased tags no result may carry
    pub ignore_tags: Vec<String>,
    pub min_timestamp: Option<DateTime<FixedOffset>>,
    pub max_timestamp: Option<DateTime<FixedOffset>>,
    /// Newest first instead of by relevance
    pub sort_by_date: bool,
    pub offset: u64,
    pub size: u32,
    /// Fields to project into each result; empty means the default set
    pub include: Vec<String>,
}

impl SearchRequest {
    /// Requested tags minus the ignored ones
    pub fn effective_tags(&self) -> Vec<String> {
        self.tags
            .iter()
            .filter(|tag| !self.ignore_tags.contains(tag))
            .cloned()
            .collect()
    }
}

/// One projected hit, keyed by canonical (un-suffixed) field names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchResult {
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// Spelling correction proposed by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub text: String,
    pub highlighted: String,
}

/// Count of documents sharing one facet value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationBucket {
    pub value: String,
    pub count: u64,
}

/// Metadata returned alongside search results
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchMetadata {
    /// Total number of matching documents
    pub total: u64,
    /// Always serialized, `null` when there is nothing to suggest
    pub suggestion: Option<Suggestion>,
    pub aggregations: BTreeMap<String, Vec<AggregationBucket>>,
}

/// Search response containing results and metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub metadata: SearchMetadata,
}
