// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Logging setup and helpers for keeping user input out of log lines.

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber. Verbosity comes from `RUST_LOG`,
/// defaulting to `info`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A subscriber may already be installed (tests, embedding binaries)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Shorten free text for logging, keeping at most `max_chars` characters.
/// Truncated text ends with "...".
pub fn truncate_for_log(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_for_log("common content", 80), "common content");
    }

    #[test]
    fn test_truncate_exact_length_unchanged() {
        assert_eq!(truncate_for_log("abc", 3), "abc");
    }

    #[test]
    fn test_truncate_long_text() {
        assert_eq!(truncate_for_log("abcdef", 3), "abc...");
    }

    #[test]
    fn test_truncate_counts_characters_not_bytes() {
        assert_eq!(truncate_for_log("ñandú", 2), "ña...");
    }

    #[test]
    fn test_init_logging_twice_is_harmless() {
        init_logging();
        init_logging();
    }
}
