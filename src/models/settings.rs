// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::document::Language;
use std::env;
use std::time::Duration;

const DEFAULT_SIZE: u32 = 20;
const MAX_SIZE: u32 = 1000;
const ENGINE_TIMEOUT_MS: u64 = 5000;

/// Search behaviour shared by every request
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    /// Language used when a request does not name one
    pub default_language: Language,
    /// Page size when a request does not name one
    pub default_size: u32,
    /// Upper bound applied to requested page sizes
    pub max_size: u32,
    /// How long to wait for the engine before giving up
    pub engine_timeout: Duration,
}

impl SearchSettings {
    /// Load search settings from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_language: env::var("DEFAULT_LANGUAGE")
                .ok()
                .and_then(|code| Language::parse(&code))
                .unwrap_or(defaults.default_language),
            default_size: env::var("SEARCH_DEFAULT_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|size| *size > 0)
                .unwrap_or(defaults.default_size),
            max_size: env::var("SEARCH_MAX_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|size| *size > 0)
                .unwrap_or(defaults.max_size),
            engine_timeout: env::var("ENGINE_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.engine_timeout),
        }
        .with_default_size_capped()
    }

    /// Keep the default page size within `max_size`
    pub fn with_default_size_capped(self) -> Self {
        Self {
            default_size: self.default_size.min(self.max_size),
            ..self
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_language: Language::ENGLISH,
            default_size: DEFAULT_SIZE,
            max_size: MAX_SIZE,
            engine_timeout: Duration::from_millis(ENGINE_TIMEOUT_MS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = SearchSettings::default();
        assert_eq!(settings.default_language, Language::ENGLISH);
        assert_eq!(settings.default_size, 20);
        assert_eq!(settings.max_size, 1000);
        assert_eq!(settings.engine_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_default_size_never_exceeds_max_size() {
        let settings = SearchSettings {
            default_size: 50,
            max_size: 10,
            ..SearchSettings::default()
        }
        .with_default_size_capped();
        assert_eq!(settings.default_size, 10);
        assert_eq!(settings.max_size, 10);

        let settings = SearchSettings::default().with_default_size_capped();
        assert_eq!(settings.default_size, 20);
    }
}
