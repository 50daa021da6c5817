// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Meilisearch-backed [`SearchEngine`].
//!
//! Document writes and lookups go through the SDK. Searches across several
//! collections are sent as one federated `/multi-search` request so results
//! are merged, ranked and paginated by the engine.

use crate::models::document::{
    IndexedRecord, Language, LanguageField, CUSTOM_FIELDS, LANGUAGE_FIELD, TAGS_FIELD,
    TIMESTAMP_FIELD,
};
use crate::models::query::{EngineHit, EngineResponse, Filter, SortOrder, StructuredQuery};
use crate::models::search::AggregationBucket;
use crate::services::engine::SearchEngine;
use crate::services::field_codec::localized_key;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use meilisearch_sdk::client::Client;
use meilisearch_sdk::errors::{Error as MeilisearchSdkError, ErrorCode};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::env;
use std::sync::Mutex;
use tracing::{debug, info, warn};

const DEFAULT_INDEX_PREFIX: &str = "documents";

/// Connection settings for the Meilisearch engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeilisearchConfig {
    pub host: String,
    pub api_key: Option<String>,
    /// Collection indices are named `<prefix>-<handle>`
    pub index_prefix: String,
}

impl MeilisearchConfig {
    /// Load the engine settings from environment variables.
    /// `MEILISEARCH_HOST` is required.
    pub fn from_env() -> Result<Self> {
        let host = env::var("MEILISEARCH_HOST")
            .context("MEILISEARCH_HOST environment variable must be set")?;
        Ok(Self {
            host: normalize_host(&host),
            api_key: env::var("MEILISEARCH_API_KEY")
                .ok()
                .filter(|key| !key.is_empty()),
            index_prefix: env::var("INDEX_PREFIX")
                .ok()
                .filter(|prefix| !prefix.is_empty())
                .unwrap_or_else(|| DEFAULT_INDEX_PREFIX.to_string()),
        })
    }
}

/// Add a scheme when only host:port is given
fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}

/// Meilisearch client holding one index per collection
pub struct MeilisearchEngine {
    client: Client,
    http: reqwest::Client,
    host: String,
    api_key: Option<String>,
    /// Indices whose settings were applied by this process
    configured: Mutex<HashSet<String>>,
}

impl MeilisearchEngine {
    pub fn new(config: &MeilisearchConfig) -> Result<Self> {
        let client = Client::new(&config.host, config.api_key.clone())?;
        info!(host = %config.host, "Connected to Meilisearch");

        Ok(Self {
            client,
            http: reqwest::Client::new(),
            host: config.host.clone(),
            api_key: config.api_key.clone(),
            configured: Mutex::new(HashSet::new()),
        })
    }

    /// Apply searchable, filterable and sortable attributes once per index
    async fn configure_index(&self, index: &str) -> Result<()> {
        let already = self
            .configured
            .lock()
            .map_err(|_| anyhow!("index settings lock poisoned"))?
            .contains(index);
        if already {
            return Ok(());
        }

        let handle = self.client.index(index);

        let searchable: Vec<&str> = Language::all()
            .flat_map(|language| {
                LanguageField::ALL
                    .into_iter()
                    .map(move |field| localized_key(field, language))
            })
            .collect();
        handle
            .set_searchable_attributes(&searchable)
            .await
            .map_err(|e| anyhow!("Failed to set searchable attributes: {}", e))?;

        let filterable: Vec<&str> = [LANGUAGE_FIELD, TAGS_FIELD, TIMESTAMP_FIELD]
            .into_iter()
            .chain(CUSTOM_FIELDS)
            .collect();
        handle
            .set_filterable_attributes(&filterable)
            .await
            .map_err(|e| anyhow!("Failed to set filterable attributes: {}", e))?;

        handle
            .set_sortable_attributes([TIMESTAMP_FIELD])
            .await
            .map_err(|e| anyhow!("Failed to set sortable attributes: {}", e))?;

        self.configured
            .lock()
            .map_err(|_| anyhow!("index settings lock poisoned"))?
            .insert(index.to_string());
        info!(index = %index, "Initialized Meilisearch index settings");

        Ok(())
    }
}

#[async_trait]
impl SearchEngine for MeilisearchEngine {
    async fn execute_query(
        &self,
        indices: &[String],
        query: &StructuredQuery,
    ) -> Result<EngineResponse> {
        let body = federated_body(indices, query);
        debug!(indices = ?indices, "Sending federated search");

        let mut request = self
            .http
            .post(format!("{}/multi-search", self.host))
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .context("Failed to reach Meilisearch")?
            .error_for_status()
            .context("Meilisearch rejected the search")?
            .json::<Value>()
            .await
            .context("Failed to decode Meilisearch response")?;

        parse_federated_response(response, query)
    }

    async fn index_document(&self, index: &str, record: &IndexedRecord) -> Result<()> {
        if record.id.is_none() {
            return Err(anyhow!("Cannot index a record without an ID"));
        }

        self.configure_index(index).await?;

        self.client
            .index(index)
            .add_documents(std::slice::from_ref(record), Some("id"))
            .await
            .map_err(|e| anyhow!("Failed to index document: {}", e))?;

        Ok(())
    }

    async fn index_exists(&self, index: &str) -> Result<bool> {
        match self.client.get_index(index).await {
            Ok(_) => Ok(true),
            Err(MeilisearchSdkError::Meilisearch(e))
                if matches!(e.error_code, ErrorCode::IndexNotFound) =>
            {
                Ok(false)
            }
            Err(e) => Err(anyhow!("Failed to look up index {}: {}", index, e)),
        }
    }

    async fn fetch_document(&self, index: &str, id: &str) -> Result<Option<IndexedRecord>> {
        match self.client.index(index).get_document::<IndexedRecord>(id).await {
            Ok(record) => Ok(Some(record)),
            Err(MeilisearchSdkError::Meilisearch(e))
                if matches!(
                    e.error_code,
                    ErrorCode::DocumentNotFound | ErrorCode::IndexNotFound
                ) =>
            {
                Ok(None)
            }
            Err(e) => Err(anyhow!("Failed to fetch document {}: {}", id, e)),
        }
    }
}

/// Filter expression in Meilisearch syntax; `None` for a range without bounds
pub fn render_filter(filter: &Filter) -> Option<String> {
    match filter {
        Filter::Term { field, value } => Some(format!("{} = {}", field, quote(value))),
        Filter::AnyOf { field, values } => Some(format!("{} IN {}", field, quote_all(values))),
        Filter::NoneOf { field, values } => {
            Some(format!("{} NOT IN {}", field, quote_all(values)))
        }
        Filter::Range { field, gte, lte } => {
            let bounds: Vec<String> = [(">=", gte), ("<=", lte)]
                .into_iter()
                .filter_map(|(op, bound)| bound.map(|b| format!("{} {} {}", field, op, b)))
                .collect();
            (!bounds.is_empty()).then(|| bounds.join(" AND "))
        }
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn quote_all(values: &[String]) -> String {
    let quoted: Vec<String> = values.iter().map(|v| quote(v)).collect();
    format!("[{}]", quoted.join(", "))
}

/// Body of a federated `/multi-search` request: one query per index
pub fn federated_body(indices: &[String], query: &StructuredQuery) -> Value {
    let filter: Vec<String> = query.filters.iter().filter_map(render_filter).collect();
    let sort: Vec<String> = match &query.sort {
        SortOrder::Relevance => Vec::new(),
        SortOrder::Descending(field) => vec![format!("{}:desc", field)],
    };

    let queries: Vec<Value> = indices
        .iter()
        .map(|index| {
            let mut q = json!({
                "indexUid": index,
                "q": query.text.clone().unwrap_or_default(),
                "attributesToSearchOn": query.search_fields,
                "filter": filter,
                "attributesToHighlight": query.highlight.fields,
                "highlightPreTag": query.highlight.pre_tag,
                "highlightPostTag": query.highlight.post_tag,
                "showRankingScore": true,
            });
            if !sort.is_empty() {
                q["sort"] = json!(sort);
            }
            q
        })
        .collect();

    let facets_by_index: Map<String, Value> = indices
        .iter()
        .map(|index| (index.clone(), json!(query.facets)))
        .collect();

    json!({
        "federation": {
            "offset": query.offset,
            "limit": query.size,
            "facetsByIndex": facets_by_index,
            "mergeFacets": {},
        },
        "queries": queries,
    })
}

/// Decode a federated search response
pub fn parse_federated_response(response: Value, query: &StructuredQuery) -> Result<EngineResponse> {
    let total = response
        .get("estimatedTotalHits")
        .or_else(|| response.get("totalHits"))
        .and_then(Value::as_u64)
        .unwrap_or(0);

    let hits = match response.get("hits") {
        Some(Value::Array(hits)) => hits
            .iter()
            .map(|hit| parse_hit(hit, query))
            .collect::<Result<Vec<_>>>()?,
        Some(_) => return Err(anyhow!("Meilisearch hits are not an array")),
        None => Vec::new(),
    };

    let aggregations = response
        .get("facetDistribution")
        .and_then(Value::as_object)
        .map(|distribution| {
            query
                .facets
                .iter()
                .filter_map(|facet| {
                    let counts = distribution.get(facet)?.as_object()?;
                    let buckets = counts
                        .iter()
                        .filter_map(|(value, count)| {
                            Some(AggregationBucket {
                                value: value.clone(),
                                count: count.as_u64()?,
                            })
                        })
                        .collect();
                    Some((facet.clone(), buckets))
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(EngineResponse {
        total,
        hits,
        aggregations,
        // Meilisearch has no spelling suggester
        suggestion: None,
    })
}

/// Decode one hit, separating engine annotations from the stored record
pub fn parse_hit(hit: &Value, query: &StructuredQuery) -> Result<EngineHit> {
    let object = hit
        .as_object()
        .ok_or_else(|| anyhow!("Meilisearch hit is not an object"))?;

    let federation = object.get("_federation");
    let index = federation
        .and_then(|f| f.get("indexUid"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let score = federation
        .and_then(|f| f.get("weightedRankingScore"))
        .or_else(|| object.get("_rankingScore"))
        .and_then(Value::as_f64);

    let pre_tag = query.highlight.pre_tag.as_str();
    let highlights: BTreeMap<String, Vec<String>> = object
        .get("_formatted")
        .and_then(Value::as_object)
        .map(|formatted| {
            query
                .highlight
                .fields
                .iter()
                .filter_map(|field| {
                    let fragment = formatted.get(field)?.as_str()?;
                    fragment
                        .contains(pre_tag)
                        .then(|| (field.clone(), vec![fragment.to_string()]))
                })
                .collect()
        })
        .unwrap_or_default();

    let stored: Map<String, Value> = object
        .iter()
        .filter(|(key, _)| !key.starts_with('_'))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    let record: IndexedRecord =
        serde_json::from_value(Value::Object(stored)).context("Malformed record in search hit")?;

    if index.is_none() {
        warn!(id = ?record.id, "Search hit without federation details");
    }

    Ok(EngineHit {
        index,
        score,
        record,
        highlights,
    })
}
