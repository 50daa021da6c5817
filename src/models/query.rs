// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Engine-neutral query and response shapes exchanged with a [`SearchEngine`].
//!
//! [`SearchEngine`]: crate::services::engine::SearchEngine

use crate::models::document::IndexedRecord;
use crate::models::search::{AggregationBucket, Suggestion};
use std::collections::BTreeMap;

/// Marks the start of a highlighted span (private-use code point)
pub const HIGHLIGHT_PRE_TAG: &str = "\u{e000}";
/// Marks the end of a highlighted span
pub const HIGHLIGHT_POST_TAG: &str = "\u{e001}";

/// Restriction applied to candidate documents before scoring
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Field equals the value
    Term { field: String, value: String },
    /// Field contains at least one of the values
    AnyOf { field: String, values: Vec<String> },
    /// Field contains none of the values
    NoneOf { field: String, values: Vec<String> },
    /// Numeric field within inclusive bounds
    Range {
        field: String,
        gte: Option<i64>,
        lte: Option<i64>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortOrder {
    Relevance,
    Descending(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightSpec {
    pub fields: Vec<String>,
    pub pre_tag: String,
    pub post_tag: String,
}

impl HighlightSpec {
    pub fn new(fields: Vec<String>) -> Self {
        Self {
            fields,
            pre_tag: HIGHLIGHT_PRE_TAG.to_string(),
            post_tag: HIGHLIGHT_POST_TAG.to_string(),
        }
    }
}

/// Structured query sent once to the engine for all target indices
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredQuery {
    pub text: Option<String>,
    /// Fields the text is matched against
    pub search_fields: Vec<String>,
    /// All filters must hold
    pub filters: Vec<Filter>,
    /// Fields to count values for
    pub facets: Vec<String>,
    pub highlight: HighlightSpec,
    pub sort: SortOrder,
    pub offset: u64,
    pub size: u32,
}

/// One scored hit as returned by the engine
#[derive(Debug, Clone, PartialEq)]
pub struct EngineHit {
    /// Index the hit came from, when the engine reports it
    pub index: Option<String>,
    pub score: Option<f64>,
    pub record: IndexedRecord,
    /// Highlighted fragments keyed by stored (suffixed) field name
    pub highlights: BTreeMap<String, Vec<String>>,
}

/// Raw engine answer to a [`StructuredQuery`]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineResponse {
    pub total: u64,
    pub hits: Vec<EngineHit>,
    pub aggregations: BTreeMap<String, Vec<AggregationBucket>>,
    pub suggestion: Option<Suggestion>,
}
