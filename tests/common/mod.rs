// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! In-memory search engine shared by the integration tests.

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use collection_search::models::document::{IndexedRecord, LANGUAGE_FIELD};
use collection_search::models::query::{
    EngineHit, EngineResponse, Filter, SortOrder, StructuredQuery,
};
use collection_search::models::search::AggregationBucket;
use collection_search::services::engine::{index_name, SearchEngine};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

pub const PREFIX: &str = "documents";

/// Engine keeping records per index in memory.
///
/// Text matching is case-insensitive on whole words; relevance is the number
/// of matching words.
#[derive(Default)]
pub struct FakeEngine {
    indices: Mutex<HashMap<String, BTreeMap<String, IndexedRecord>>>,
    queries: Mutex<Vec<(Vec<String>, StructuredQuery)>>,
    delay: Option<Duration>,
    fail: bool,
}

impl FakeEngine {
    /// Engine with empty indices for the given collection handles
    pub fn with_collections(handles: &[&str]) -> Self {
        let engine = Self::default();
        {
            let mut indices = engine.indices.lock().unwrap();
            for handle in handles {
                indices.insert(index_name(PREFIX, handle), BTreeMap::new());
            }
        }
        engine
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn last_query(&self) -> Option<(Vec<String>, StructuredQuery)> {
        self.queries.lock().unwrap().last().cloned()
    }

    pub fn stored(&self, handle: &str, id: &str) -> Option<IndexedRecord> {
        self.indices
            .lock()
            .unwrap()
            .get(&index_name(PREFIX, handle))
            .and_then(|records| records.get(id).cloned())
    }
}

#[async_trait]
impl SearchEngine for FakeEngine {
    async fn execute_query(
        &self,
        indices: &[String],
        query: &StructuredQuery,
    ) -> Result<EngineResponse> {
        self.queries
            .lock()
            .unwrap()
            .push((indices.to_vec(), query.clone()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(anyhow!("connection refused"));
        }

        let terms = words(query.text.as_deref().unwrap_or(""));
        let mut matched: Vec<(String, usize, IndexedRecord)> = Vec::new();
        {
            let stored = self.indices.lock().unwrap();
            for index in indices {
                let records = stored
                    .get(index)
                    .ok_or_else(|| anyhow!("index {} not found", index))?;
                for record in records.values() {
                    if !query.filters.iter().all(|f| matches_filter(record, f)) {
                        continue;
                    }
                    let score = relevance(record, &query.search_fields, &terms);
                    if terms.is_empty() || score > 0 {
                        matched.push((index.clone(), score, record.clone()));
                    }
                }
            }
        }

        match &query.sort {
            SortOrder::Relevance => matched.sort_by(|a, b| b.1.cmp(&a.1)),
            SortOrder::Descending(_) => {
                matched.sort_by(|a, b| b.2.changed_timestamp.cmp(&a.2.changed_timestamp))
            }
        }

        let mut aggregations = BTreeMap::new();
        for facet in &query.facets {
            let mut counts: BTreeMap<String, u64> = BTreeMap::new();
            for (_, _, record) in &matched {
                for value in record.list_field(facet) {
                    *counts.entry(value.clone()).or_default() += 1;
                }
            }
            let buckets: Vec<AggregationBucket> = counts
                .into_iter()
                .map(|(value, count)| AggregationBucket { value, count })
                .collect();
            aggregations.insert(facet.clone(), buckets);
        }

        let total = matched.len() as u64;
        let hits = matched
            .into_iter()
            .skip(usize::try_from(query.offset).unwrap_or(usize::MAX))
            .take(query.size as usize)
            .map(|(index, score, record)| EngineHit {
                index: Some(index),
                score: Some(score as f64),
                highlights: highlight(&record, query, &terms),
                record,
            })
            .collect();

        Ok(EngineResponse {
            total,
            hits,
            aggregations,
            suggestion: None,
        })
    }

    async fn index_document(&self, index: &str, record: &IndexedRecord) -> Result<()> {
        let id = record
            .id
            .clone()
            .ok_or_else(|| anyhow!("record without id"))?;
        if self.fail {
            return Err(anyhow!("connection refused"));
        }
        self.indices
            .lock()
            .unwrap()
            .entry(index.to_string())
            .or_default()
            .insert(id, record.clone());
        Ok(())
    }

    async fn index_exists(&self, index: &str) -> Result<bool> {
        Ok(self.indices.lock().unwrap().contains_key(index))
    }

    async fn fetch_document(&self, index: &str, id: &str) -> Result<Option<IndexedRecord>> {
        Ok(self
            .indices
            .lock()
            .unwrap()
            .get(index)
            .and_then(|records| records.get(id).cloned()))
    }
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn relevance(record: &IndexedRecord, fields: &[String], terms: &[String]) -> usize {
    fields
        .iter()
        .filter_map(|field| record.localized.get(field))
        .flat_map(|value| words(value))
        .filter(|word| terms.contains(word))
        .count()
}

fn matches_filter(record: &IndexedRecord, filter: &Filter) -> bool {
    match filter {
        Filter::Term { field, value } if field == LANGUAGE_FIELD => &record.language == value,
        Filter::Term { field, value } => record.list_field(field).contains(value),
        Filter::AnyOf { field, values } => {
            record.list_field(field).iter().any(|v| values.contains(v))
        }
        Filter::NoneOf { field, values } => {
            !record.list_field(field).iter().any(|v| values.contains(v))
        }
        Filter::Range { gte, lte, .. } => match record.changed_timestamp {
            None => false,
            Some(ts) => gte.map_or(true, |min| ts >= min) && lte.map_or(true, |max| ts <= max),
        },
    }
}

fn highlight(
    record: &IndexedRecord,
    query: &StructuredQuery,
    terms: &[String],
) -> BTreeMap<String, Vec<String>> {
    let spec = &query.highlight;
    spec.fields
        .iter()
        .filter_map(|field| {
            let value = record.localized.get(field)?;
            let mut hit = false;
            let marked: Vec<String> = value
                .split(' ')
                .map(|word| {
                    if terms.contains(&word.to_lowercase()) {
                        hit = true;
                        format!("{}{}{}", spec.pre_tag, word, spec.post_tag)
                    } else {
                        word.to_string()
                    }
                })
                .collect();
            hit.then(|| (field.clone(), vec![marked.join(" ")]))
        })
        .collect()
}
