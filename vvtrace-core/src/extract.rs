//! Requirement reference extraction from test names
//!
//! Every piece of token parsing in the crate goes through this module. Three
//! modes exist:
//!
//! - [`ExtractionMode::Tokens`]: split on whitespace; a token is a reference
//!   when it starts with the prefix and ends in a digit.
//! - [`ExtractionMode::Delimited`]: like `Tokens`, but commas also separate
//!   tokens. Used for multi-value PRD cells such as `"US10, US11"`.
//! - [`ExtractionMode::Pattern`]: `prefix` followed by one or more digits,
//!   matched anywhere in the text. Used for automated test names. Nothing is
//!   stripped before matching, so the digits directly after the prefix form
//!   the reference (`TC12_3` yields `TC12`).
//!
//! Extraction never fails on content: no match is an empty result.
//! References are returned in the order they appear; duplicates are kept and
//! callers that need a set use [`unique_refs`].

use std::collections::HashSet;

use regex::Regex;

use crate::error::{
    TraceError,
    TraceResult,
};

/// How a text is split into candidate references
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    /// Whitespace-separated tokens ending in a digit
    Tokens,
    /// Whitespace- or comma-separated tokens ending in a digit
    Delimited,
    /// `prefix` + digits anywhere in the text
    Pattern,
}

/// Reusable extractor for one prefix and mode
#[derive(Debug, Clone)]
pub struct RefExtractor {
    prefix:  String,
    mode:    ExtractionMode,
    pattern: Option<Regex>,
}

impl RefExtractor {
    /// Create an extractor. Compiles the search pattern once for
    /// [`ExtractionMode::Pattern`].
    pub fn new(prefix: impl Into<String>, mode: ExtractionMode) -> TraceResult<Self> {
        let prefix = prefix.into();
        let pattern = match mode {
            ExtractionMode::Pattern => {
                let source = format!("{}[0-9]+", regex::escape(&prefix));
                let regex = Regex::new(&source).map_err(|e| {
                    TraceError::Config(format!("Invalid reference prefix '{}': {}", prefix, e))
                })?;
                Some(regex)
            },
            ExtractionMode::Tokens | ExtractionMode::Delimited => None,
        };

        Ok(Self {
            prefix,
            mode,
            pattern,
        })
    }

    /// Extract references from `text`, in order of appearance
    pub fn extract(&self, text: &str) -> Vec<String> {
        match (&self.pattern, self.mode) {
            (Some(pattern), _) => {
                pattern.find_iter(text).map(|m| m.as_str().to_string()).collect()
            },
            (None, ExtractionMode::Delimited) => {
                token_refs(text.split(|c: char| c == ',' || c.is_whitespace()), &self.prefix)
            },
            (None, _) => token_refs(text.split_whitespace(), &self.prefix),
        }
    }
}

/// Whitespace-token extraction: tokens starting with `prefix` and ending in
/// a digit
pub fn extract_refs(text: &str, prefix: &str) -> Vec<String> {
    token_refs(text.split_whitespace(), prefix)
}

/// Token extraction that also treats commas as separators
pub fn extract_delimited_refs(text: &str, prefix: &str) -> Vec<String> {
    token_refs(text.split(|c: char| c == ',' || c.is_whitespace()), prefix)
}

/// Drop repeated references, keeping the first occurrence of each
pub fn unique_refs(refs: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    refs.into_iter().filter(|r| seen.insert(r.clone())).collect()
}

fn token_refs<'a>(tokens: impl Iterator<Item = &'a str>, prefix: &str) -> Vec<String> {
    tokens
        .filter(|token| is_reference(token, prefix))
        .map(str::to_string)
        .collect()
}

fn is_reference(token: &str, prefix: &str) -> bool {
    token.starts_with(prefix) && token.chars().last().is_some_and(|c| c.is_ascii_digit())
}
