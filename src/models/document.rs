// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// ISO 639-1 codes a collection document may be written in
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "ar", "bg", "bn", "ca", "cs", "da", "de", "el", "en", "es", "et", "fa", "fr", "he", "hi", "hr",
    "ht", "hu", "hy", "id", "it", "ja", "km", "ko", "lt", "lv", "nl", "pl", "pt", "ro", "ru", "sk",
    "sq", "sr", "sv", "th", "tr", "uk", "ur", "vi", "zh",
];

pub const TAGS_FIELD: &str = "tags";
pub const LANGUAGE_FIELD: &str = "language";
pub const CUSTOM_FIELDS: [&str; 3] = ["custom_field_1", "custom_field_2", "custom_field_3"];

/// Epoch-milliseconds copy of `changed`, used for range filters and date sorting
pub const TIMESTAMP_FIELD: &str = "changed_timestamp";

/// Language of a document, restricted to [`SUPPORTED_LANGUAGES`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Language(&'static str);

impl Language {
    pub const ENGLISH: Language = Language("en");

    /// Parse a language code, ignoring case and surrounding whitespace
    pub fn parse(code: &str) -> Option<Self> {
        let code = code.trim().to_ascii_lowercase();
        SUPPORTED_LANGUAGES
            .iter()
            .find(|supported| **supported == code)
            .map(|supported| Language(*supported))
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }

    pub fn all() -> impl Iterator<Item = Language> {
        SUPPORTED_LANGUAGES.iter().map(|code| Language(*code))
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Text fields stored once per language under a `<field>_<language>` key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageField {
    Title,
    Description,
    Content,
}

impl LanguageField {
    pub const ALL: [LanguageField; 3] = [
        LanguageField::Title,
        LanguageField::Description,
        LanguageField::Content,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LanguageField::Title => "title",
            LanguageField::Description => "description",
            LanguageField::Content => "content",
        }
    }
}

/// A list field as clients may send it: either a comma-delimited string or an array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringList {
    One(String),
    Many(Vec<String>),
}

/// Document as submitted to and returned from the API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublicDocument {
    /// Engine document ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<StringList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_field_1: Option<StringList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_field_2: Option<StringList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_field_3: Option<StringList>,
    /// Absolute URL of the page this document describes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<FixedOffset>>,
    #[serde(default, alias = "updated", skip_serializing_if = "Option::is_none")]
    pub changed: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub promote: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Components derived from a document's `path`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UriParts {
    pub basename: String,
    pub extension: String,
    pub url_path: String,
    pub domain_name: String,
}

/// Document as stored in a collection's search index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub language: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub custom_field_1: Vec<String>,
    #[serde(default)]
    pub custom_field_2: Vec<String>,
    #[serde(default)]
    pub custom_field_3: Vec<String>,
    pub path: String,
    pub basename: String,
    pub extension: String,
    pub url_path: String,
    pub domain_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed_timestamp: Option<i64>,
    #[serde(default)]
    pub promote: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    /// Language-suffixed text fields such as `title_en`
    #[serde(flatten)]
    pub localized: BTreeMap<String, String>,
}

impl IndexedRecord {
    /// Values of a list-valued field by name; empty for unknown names
    pub fn list_field(&self, name: &str) -> &[String] {
        match name {
            TAGS_FIELD => &self.tags,
            "custom_field_1" => &self.custom_field_1,
            "custom_field_2" => &self.custom_field_2,
            "custom_field_3" => &self.custom_field_3,
            _ => &[],
        }
    }
}

/// Acknowledgement returned after a document write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStatusResponse {
    pub status: u16,
    pub developer_message: String,
    pub user_message: String,
}
