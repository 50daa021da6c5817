// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Conversion between the public document shape and the per-language record
//! stored in a collection index.

use crate::error::SearchError;
use crate::models::document::{
    IndexedRecord, Language, LanguageField, PublicDocument, StringList, UriParts,
    SUPPORTED_LANGUAGES,
};
use chrono::Utc;
use scraper::{ElementRef, Html, Node};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Elements whose text never reaches the index
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Elements that separate words when their tags are stripped
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr",
    "li", "main", "nav", "ol", "p", "pre", "section", "table", "tbody", "td", "tfoot", "th",
    "thead", "tr", "ul",
];

/// Stored key of every language-bearing field, per language
static LOCALIZED_KEYS: LazyLock<HashMap<(&'static str, LanguageField), String>> =
    LazyLock::new(|| {
        SUPPORTED_LANGUAGES
            .iter()
            .flat_map(|lang| {
                LanguageField::ALL
                    .into_iter()
                    .map(move |field| ((*lang, field), format!("{}_{}", field.name(), lang)))
            })
            .collect()
    });

/// Stored key for a language-bearing field, e.g. `title_en`
pub fn localized_key(field: LanguageField, language: Language) -> &'static str {
    LOCALIZED_KEYS
        .get(&(language.as_str(), field))
        .map(String::as_str)
        .unwrap_or_default()
}

/// Convert a public document into the record stored for `language`.
///
/// Text fields are sanitized and suffixed, list fields become arrays, URI parts
/// are derived from `path` and `updated_at` is stamped with the current time.
pub fn serialize(document: PublicDocument, language: &str) -> Result<IndexedRecord, SearchError> {
    let mut violations = Vec::new();

    let parsed_language = Language::parse(language);
    if parsed_language.is_none() {
        violations.push(if language.trim().is_empty() {
            "language is missing".to_string()
        } else {
            "language does not have a valid value".to_string()
        });
    }

    let uri = match document.path.as_deref() {
        None => {
            violations.push("path is missing".to_string());
            None
        }
        Some(path) => decompose_uri(path)
            .map_err(|e| violations.push(e.to_string()))
            .ok(),
    };

    let (Some(language), Some(uri), Some(path)) = (parsed_language, uri, document.path) else {
        return Err(SearchError::Validation(violations));
    };

    let localized = [
        (LanguageField::Title, document.title),
        (LanguageField::Description, document.description),
        (LanguageField::Content, document.content),
    ]
    .into_iter()
    .filter_map(|(field, value)| {
        value.map(|raw| (localized_key(field, language).to_string(), sanitize(&raw)))
    })
    .collect();

    let changed = document.changed.or(document.created);

    Ok(IndexedRecord {
        id: document.id,
        language: language.as_str().to_string(),
        tags: normalize_list(document.tags, true),
        custom_field_1: normalize_list(document.custom_field_1, false),
        custom_field_2: normalize_list(document.custom_field_2, false),
        custom_field_3: normalize_list(document.custom_field_3, false),
        path,
        basename: uri.basename,
        extension: uri.extension,
        url_path: uri.url_path,
        domain_name: uri.domain_name,
        created: document.created,
        changed,
        changed_timestamp: changed.map(|c| c.timestamp_millis()),
        promote: document.promote,
        created_at: document.created_at,
        updated_at: Utc::now(),
        localized,
    })
}

/// Convert a stored record back into the public shape for `language`.
///
/// Text fields lose their suffix; a text field missing for this language is
/// omitted. Derived URI parts and the sort timestamp are not exposed.
pub fn deserialize(mut record: IndexedRecord, language: Language) -> PublicDocument {
    let mut take = |field| record.localized.remove(localized_key(field, language));
    let title = take(LanguageField::Title);
    let description = take(LanguageField::Description);
    let content = take(LanguageField::Content);

    PublicDocument {
        id: record.id,
        language: Some(record.language),
        title,
        description,
        content,
        tags: as_list(record.tags),
        custom_field_1: as_list(record.custom_field_1),
        custom_field_2: as_list(record.custom_field_2),
        custom_field_3: as_list(record.custom_field_3),
        path: Some(record.path),
        created: record.created,
        changed: record.changed,
        promote: record.promote,
        created_at: record.created_at,
        updated_at: Some(record.updated_at),
    }
}

/// Split an absolute URL into the parts indexed alongside a document
pub fn decompose_uri(path: &str) -> Result<UriParts, SearchError> {
    let url = url::Url::parse(path).map_err(|_| SearchError::validation("path is invalid"))?;

    let domain_name = url
        .host_str()
        .filter(|host| !host.is_empty())
        .ok_or_else(|| SearchError::validation("path is invalid"))?
        .to_string();

    let last_segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();

    let (basename, extension) = match last_segment.rsplit_once('.') {
        Some((base, ext)) => (base.to_string(), ext.to_lowercase()),
        None => (last_segment.to_string(), String::new()),
    };

    Ok(UriParts {
        basename,
        extension,
        url_path: url.path().to_string(),
        domain_name,
    })
}

/// Strip markup down to its visible text with entities decoded and whitespace
/// collapsed.
///
/// Only the tags of the input itself are stripped. Nested entities such as
/// `&amp;amp;` are then decoded until the text stops changing, so applying
/// `sanitize` twice gives the same result as applying it once, unless the
/// decoded text itself reads as markup (`&lt;b&gt;` becomes a literal `<b>`).
pub fn sanitize(markup: &str) -> String {
    let mut current = strip_markup(markup);
    loop {
        let next = decode_text(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Split a comma-delimited list, trimming each entry and dropping empty ones
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Comma-delimited tags as a lower-cased, de-duplicated list
pub fn normalize_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in split_list(raw) {
        let tag = tag.to_lowercase();
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

fn normalize_list(value: Option<StringList>, lowercase: bool) -> Vec<String> {
    match value {
        None => Vec::new(),
        Some(StringList::Many(items)) => items,
        Some(StringList::One(raw)) if lowercase => normalize_tags(&raw),
        Some(StringList::One(raw)) => split_list(&raw),
    }
}

fn as_list(values: Vec<String>) -> Option<StringList> {
    if values.is_empty() {
        None
    } else {
        Some(StringList::Many(values))
    }
}

fn strip_markup(markup: &str) -> String {
    let fragment = Html::parse_fragment(markup);
    let mut text = String::new();
    collect_text(fragment.root_element(), &mut text);
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// Decodes one level of entities; text that looks like a tag stays text
fn decode_text(text: &str) -> String {
    strip_markup(&text.replace('<', "&lt;"))
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED_ELEMENTS.contains(&name) {
                    continue;
                }
                let is_block = BLOCK_ELEMENTS.contains(&name);
                if is_block {
                    out.push(' ');
                }
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, out);
                }
                if is_block {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}
