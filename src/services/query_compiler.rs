// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Validation of raw search parameters and compilation into a [`StructuredQuery`].

use crate::error::SearchError;
use crate::models::document::{
    Language, LanguageField, CUSTOM_FIELDS, LANGUAGE_FIELD, TAGS_FIELD, TIMESTAMP_FIELD,
};
use crate::models::query::{Filter, HighlightSpec, SortOrder, StructuredQuery};
use crate::models::search::SearchRequest;
use crate::models::settings::SearchSettings;
use crate::services::field_codec::{localized_key, normalize_tags, split_list};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use std::collections::HashMap;

/// Fields a caller may ask to have projected into results
pub const PROJECTABLE_FIELDS: &[&str] = &[
    "id",
    "language",
    "title",
    "description",
    "content",
    "path",
    "created",
    "changed",
    "promote",
    "tags",
    "custom_field_1",
    "custom_field_2",
    "custom_field_3",
    "created_at",
    "updated_at",
];

/// Validate raw query-string parameters.
///
/// Every violation found is reported together in one [`SearchError::Validation`].
pub fn compile(
    params: &HashMap<String, String>,
    settings: &SearchSettings,
) -> Result<SearchRequest, SearchError> {
    let mut violations = Vec::new();
    let mut check = |ok: bool, message: &str| {
        if !ok {
            violations.push(message.to_string());
        }
    };

    let handles = match params.get("handles") {
        None => {
            check(false, "handles is missing");
            check(false, "handles is empty");
            Vec::new()
        }
        Some(raw) => {
            let handles = unique(split_list(raw));
            check(!handles.is_empty(), "handles is empty");
            check(handles.iter().all(|h| is_valid_handle(h)), "handles is invalid");
            handles
        }
    };

    let language = match param(params, "language") {
        None => Some(settings.default_language),
        Some(raw) => Language::parse(raw),
    };
    check(language.is_some(), "language does not have a valid value");

    let offset = param(params, "offset").map_or(Some(0), |raw| raw.parse::<u64>().ok());
    check(offset.is_some(), "offset is invalid");

    let size = param(params, "size").map_or(Some(settings.default_size), |raw| {
        raw.parse::<u64>()
            .ok()
            .filter(|size| *size > 0)
            .map(|size| size.min(u64::from(settings.max_size)) as u32)
    });
    check(size.is_some(), "size is invalid");

    let sort_by_date = param(params, "sort_by_date").map_or(Some(false), parse_flag);
    check(sort_by_date.is_some(), "sort_by_date is invalid");

    let min_timestamp = param(params, "min_timestamp").map(parse_timestamp);
    check(!matches!(min_timestamp, Some(None)), "min_timestamp is invalid");
    let max_timestamp = param(params, "max_timestamp").map(parse_timestamp);
    check(!matches!(max_timestamp, Some(None)), "max_timestamp is invalid");
    let (min_timestamp, max_timestamp) = (min_timestamp.flatten(), max_timestamp.flatten());
    check(
        !matches!((min_timestamp, max_timestamp), (Some(min), Some(max)) if min > max),
        "min_timestamp must not be after max_timestamp",
    );

    let include = param(params, "include")
        .map(|raw| unique(split_list(&raw.to_lowercase())))
        .unwrap_or_default();
    check(
        include.iter().all(|field| PROJECTABLE_FIELDS.contains(&field.as_str())),
        "include does not have a valid value",
    );

    let (Some(language), Some(offset), Some(size), Some(sort_by_date), true) =
        (language, offset, size, sort_by_date, violations.is_empty())
    else {
        return Err(SearchError::Validation(violations));
    };

    Ok(SearchRequest {
        handles,
        language,
        query: param(params, "query").map(str::to_string),
        tags: param(params, "tags").map(normalize_tags).unwrap_or_default(),
        ignore_tags: param(params, "ignore_tags")
            .map(normalize_tags)
            .unwrap_or_default(),
        min_timestamp,
        max_timestamp,
        sort_by_date,
        offset,
        size,
        include,
    })
}

/// Build the engine query for a validated request
pub fn build_query(request: &SearchRequest) -> StructuredQuery {
    let search_fields: Vec<String> = LanguageField::ALL
        .into_iter()
        .map(|field| localized_key(field, request.language).to_string())
        .collect();

    let mut filters = vec![Filter::Term {
        field: LANGUAGE_FIELD.to_string(),
        value: request.language.as_str().to_string(),
    }];

    let tags = request.effective_tags();
    if !tags.is_empty() {
        filters.push(Filter::AnyOf {
            field: TAGS_FIELD.to_string(),
            values: tags,
        });
    }

    if !request.ignore_tags.is_empty() {
        filters.push(Filter::NoneOf {
            field: TAGS_FIELD.to_string(),
            values: request.ignore_tags.clone(),
        });
    }

    if request.min_timestamp.is_some() || request.max_timestamp.is_some() {
        filters.push(Filter::Range {
            field: TIMESTAMP_FIELD.to_string(),
            gte: request.min_timestamp.map(|t| t.timestamp_millis()),
            lte: request.max_timestamp.map(|t| t.timestamp_millis()),
        });
    }

    let sort = if request.sort_by_date {
        SortOrder::Descending(TIMESTAMP_FIELD.to_string())
    } else {
        SortOrder::Relevance
    };

    StructuredQuery {
        text: request.query.clone(),
        search_fields: search_fields.clone(),
        filters,
        facets: facet_fields(),
        highlight: HighlightSpec::new(search_fields),
        sort,
        offset: request.offset,
        size: request.size,
    }
}

/// Fields aggregated for every search
pub fn facet_fields() -> Vec<String> {
    std::iter::once(TAGS_FIELD)
        .chain(CUSTOM_FIELDS)
        .map(str::to_string)
        .collect()
}

/// Handles are lower-case letters, digits and underscores
pub fn is_valid_handle(handle: &str) -> bool {
    !handle.is_empty()
        && handle
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Parse the accepted literal forms of a boolean flag
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

/// Parse an ISO-8601 date-time; a missing offset means UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc().fixed_offset())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc().fixed_offset())
        })
}

/// Trimmed, non-blank parameter value
fn param<'a>(params: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

fn unique(values: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(values.len());
    for value in values {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}
