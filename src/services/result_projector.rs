// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Flattening of engine responses into the public result envelope.

use crate::models::document::{Language, LanguageField};
use crate::models::query::{EngineHit, EngineResponse};
use crate::models::search::{AggregationBucket, SearchMetadata, SearchRequest, SearchResult};
use crate::services::field_codec::{deserialize, localized_key};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Fields projected when a request does not name any
pub const DEFAULT_FIELDS: &[&str] = &["title", "path", "created", "changed", "language"];

/// Separator between highlighted fragments of one field
const FRAGMENT_SEPARATOR: &str = "...";

/// Projected hits in engine order. Consumed once; each hit is projected on demand.
#[derive(Debug)]
pub struct ProjectedResults {
    hits: std::vec::IntoIter<EngineHit>,
    language: Language,
    include: Vec<String>,
}

impl Iterator for ProjectedResults {
    type Item = SearchResult;

    fn next(&mut self) -> Option<SearchResult> {
        let hit = self.hits.next()?;
        Some(project_hit(hit, self.language, &self.include))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.hits.size_hint()
    }
}

impl ExactSizeIterator for ProjectedResults {}

/// Split an engine response into lazily projected results and metadata
pub fn project(response: EngineResponse, request: &SearchRequest) -> (ProjectedResults, SearchMetadata) {
    let suggestion = response.suggestion.filter(|suggestion| {
        request.query.as_deref().map(str::trim) != Some(suggestion.text.trim())
    });

    let metadata = SearchMetadata {
        total: response.total,
        suggestion,
        aggregations: order_aggregations(response.aggregations),
    };

    let results = ProjectedResults {
        hits: response.hits.into_iter(),
        language: request.language,
        include: request.include.clone(),
    };

    (results, metadata)
}

fn project_hit(hit: EngineHit, language: Language, include: &[String]) -> SearchResult {
    let highlights = highlighted_fields(&hit.highlights, language);
    let document = deserialize(hit.record, language);

    let mut fields = match serde_json::to_value(document) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };

    let explicit = !include.is_empty();
    fields.retain(|key, _| {
        if explicit {
            include.iter().any(|field| field == key)
        } else {
            DEFAULT_FIELDS.contains(&key.as_str())
        }
    });

    for (field, fragment) in highlights {
        if explicit && !include.iter().any(|f| f == field) {
            continue;
        }
        fields.insert(field.to_string(), Value::String(fragment));
    }

    SearchResult { fields }
}

/// Highlight fragments keyed by canonical field name
fn highlighted_fields(
    highlights: &BTreeMap<String, Vec<String>>,
    language: Language,
) -> Vec<(&'static str, String)> {
    LanguageField::ALL
        .into_iter()
        .filter_map(|field| {
            highlights
                .get(localized_key(field, language))
                .filter(|fragments| !fragments.is_empty())
                .map(|fragments| (field.name(), fragments.join(FRAGMENT_SEPARATOR)))
        })
        .collect()
}

/// Buckets by count descending, ties by value; facets without buckets are dropped
fn order_aggregations(
    aggregations: BTreeMap<String, Vec<AggregationBucket>>,
) -> BTreeMap<String, Vec<AggregationBucket>> {
    aggregations
        .into_iter()
        .filter_map(|(facet, mut buckets)| {
            buckets.retain(|bucket| bucket.count > 0);
            buckets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
            (!buckets.is_empty()).then_some((facet, buckets))
        })
        .collect()
}
