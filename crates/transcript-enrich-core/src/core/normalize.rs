// transcript-enrich-core/src/core/normalize.rs
// ============================================================================
// Module: Text Normalizer
// Description: Stable content keys from raw item text.
// Purpose: Make cosmetic re-renders and the engine's own writes key-neutral.
// Dependencies: crate::core, crate::interfaces, regex
// ============================================================================

//! ## Overview
//! The normalizer derives a stable fingerprint from an item's rendered text.
//! It excludes the engine's own markup (enrichment node, loading affordance)
//! and host action chrome when reading text, strips decorative glyphs and
//! known boilerplate annotations, trims, and bounds the result to a fixed
//! key prefix. Running it over an item the engine already enriched yields
//! the same key as before the write.

// ============================================================================
// SECTION: Imports
// ============================================================================

use regex::Regex;
use regex::RegexBuilder;
use thiserror::Error;

use crate::core::cache::CacheKey;
use crate::core::config::EngineConfig;
use crate::interfaces::NodeId;
use crate::interfaces::TranscriptTree;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Normalizer construction errors.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// A configured boilerplate pattern failed to compile.
    #[error("invalid boilerplate pattern {pattern:?}: {message}")]
    Pattern {
        /// Pattern text as configured.
        pattern: String,
        /// Compiler diagnostic.
        message: String,
    },
}

// ============================================================================
// SECTION: Normalizer
// ============================================================================

/// Derives bounded, boilerplate-free content keys from item text.
#[derive(Debug)]
pub struct Normalizer {
    /// Selectors whose subtrees are excluded when reading item text.
    excluded: Vec<String>,
    /// Literal substrings removed outright.
    strip_literals: Vec<String>,
    /// Compiled case-insensitive boilerplate patterns.
    patterns: Vec<Regex>,
    /// Minimum normalized length worth translating, in characters.
    min_text_chars: usize,
    /// Key prefix bound, in characters.
    key_prefix_chars: usize,
}

impl Normalizer {
    /// Compiles the normalizer from engine configuration.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::Pattern`] when a boilerplate pattern does
    /// not compile.
    pub fn new(config: &EngineConfig) -> Result<Self, NormalizeError> {
        let mut patterns = Vec::with_capacity(config.normalizer.boilerplate_patterns.len());
        for pattern in &config.normalizer.boilerplate_patterns {
            let compiled = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|err| NormalizeError::Pattern {
                    pattern: pattern.clone(),
                    message: err.to_string(),
                })?;
            patterns.push(compiled);
        }
        Ok(Self {
            excluded: config.selectors.excluded_from_text(),
            strip_literals: config.normalizer.strip_literals.clone(),
            patterns,
            min_text_chars: config.min_text_chars,
            key_prefix_chars: config.key_prefix_chars,
        })
    }

    /// Normalizes raw text: strips literals and boilerplate, then trims.
    /// Idempotent; an item with no text yields an empty string.
    #[must_use]
    pub fn normalize_text(&self, raw: &str) -> String {
        let mut text = raw.to_string();
        for literal in &self.strip_literals {
            if text.contains(literal.as_str()) {
                text = text.replace(literal.as_str(), "");
            }
        }
        for pattern in &self.patterns {
            text = pattern.replace_all(&text, "").into_owned();
        }
        text.trim().to_string()
    }

    /// Reads an item's text from the tree, excluding enrichment, loader, and
    /// action markup, and normalizes it.
    #[must_use]
    pub fn item_text(&self, tree: &dyn TranscriptTree, item: NodeId) -> String {
        self.normalize_text(&tree.text_excluding(item, &self.excluded))
    }

    /// Derives the cache key for normalized text. Returns `None` when the
    /// text is below the minimum length floor; such items are cheap enough
    /// to recheck every scan and never enter the cache.
    #[must_use]
    pub fn key(&self, normalized: &str) -> Option<CacheKey> {
        if normalized.chars().count() < self.min_text_chars {
            return None;
        }
        Some(CacheKey::truncated(normalized, self.key_prefix_chars))
    }

    /// Convenience: normalized text and key for an item in one call.
    #[must_use]
    pub fn item_key(&self, tree: &dyn TranscriptTree, item: NodeId) -> (String, Option<CacheKey>) {
        let normalized = self.item_text(tree, item);
        let key = self.key(&normalized);
        (normalized, key)
    }
}

// ============================================================================
// SECTION: Text Equivalence
// ============================================================================

/// Compares two texts ignoring case and whitespace runs. Used to decide
/// whether a provider result actually translated anything.
#[must_use]
pub fn texts_equivalent(left: &str, right: &str) -> bool {
    let fold = |text: &str| {
        text.split_whitespace().map(str::to_lowercase).collect::<Vec<String>>().join(" ")
    };
    fold(left) == fold(right)
}
