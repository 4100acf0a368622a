// transcript-enrich-core/src/core/config.rs
// ============================================================================
// Module: Engine Configuration
// Description: Timings, bounds, selectors, and normalizer patterns.
// Purpose: Own every tunable of the enrichment engine in one validated struct.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! All engine tunables live here: the self-throttle and debounce timings, the
//! content-key bounds, the selector strings used against the host render
//! tree, and the boilerplate patterns stripped by the normalizer. Defaults
//! reproduce the original system's behavior. Configuration is validated once
//! at engine construction; nothing re-reads the environment afterwards.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A numeric bound is outside its permitted range.
    #[error("invalid bound for {field}: {message}")]
    InvalidBound {
        /// Field name as written in the configuration.
        field: &'static str,
        /// Human-readable constraint description.
        message: String,
    },
    /// A selector that must be present is empty.
    #[error("selector {0} must not be empty")]
    EmptySelector(&'static str),
}

// ============================================================================
// SECTION: Selector Configuration
// ============================================================================

/// Selector strings used to locate structure in the host render tree.
///
/// Selectors are opaque to the engine and interpreted by the
/// [`TranscriptTree`](crate::interfaces::TranscriptTree) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Ancestor viewport node watched for container replacement.
    pub viewport: String,
    /// List-root container holding the rendered items.
    pub container: String,
    /// One transcript item.
    pub item: String,
    /// Item variant for messages the local user sent.
    pub sent: String,
    /// Item variant for messages the local user received.
    pub received: String,
    /// Content-container probes for sent items, tried in order.
    pub content_sent: Vec<String>,
    /// Content-container probes for received items, tried in order.
    pub content_received: Vec<String>,
    /// Action/chrome regions excluded from normalized text.
    pub actions: Vec<String>,
    /// Class attribute of the injected enrichment node.
    pub enrichment_class: String,
    /// Class attribute of the language badge inside the enrichment node.
    pub badge_class: String,
    /// Class attribute of the transient loading affordance.
    pub loader_class: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            viewport: "[aria-label=\"scrollable content\"]".to_string(),
            container: ".chat__messages".to_string(),
            item: ".msg_pos".to_string(),
            sent: ".chat__message_send".to_string(),
            received: ".chat__message_received".to_string(),
            content_sent: vec![".msg_text_send".to_string(), ".msg_text".to_string()],
            content_received: vec![".msg_text_received".to_string(), ".msg_text".to_string()],
            actions: vec!["button".to_string(), ".msg_actions".to_string()],
            enrichment_class: "auto-translation".to_string(),
            badge_class: "lang-badge".to_string(),
            loader_class: "translation-loading".to_string(),
        }
    }
}

impl SelectorConfig {
    /// Returns the enrichment node as a selector (`.class` form).
    #[must_use]
    pub fn enrichment_selector(&self) -> String {
        format!(".{}", self.enrichment_class)
    }

    /// Returns the loading affordance as a selector (`.class` form).
    #[must_use]
    pub fn loader_selector(&self) -> String {
        format!(".{}", self.loader_class)
    }

    /// Returns every selector whose subtree is excluded when reading item
    /// text: the engine's own markup plus host action chrome.
    #[must_use]
    pub fn excluded_from_text(&self) -> Vec<String> {
        let mut excluded = vec![self.enrichment_selector(), self.loader_selector()];
        excluded.extend(self.actions.iter().cloned());
        excluded
    }
}

// ============================================================================
// SECTION: Normalizer Configuration
// ============================================================================

/// Boilerplate stripped from item text before key derivation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Literal substrings removed outright (decorative glyphs).
    pub strip_literals: Vec<String>,
    /// Case-insensitive regex patterns removed from the text.
    pub boilerplate_patterns: Vec<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            strip_literals: vec!["\u{2737}".to_string()],
            boilerplate_patterns: vec![
                r"Reply\s+Forward\s+Bookmark\s+Delete".to_string(),
                r"\(Renze\)".to_string(),
                r"\(Bas\)".to_string(),
            ],
        }
    }
}

// ============================================================================
// SECTION: Engine Configuration
// ============================================================================

/// Configuration for the enrichment engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Delay before the first viewport probe, letting the host framework
    /// finish its initial render (milliseconds).
    pub settle_delay_ms: u64,
    /// Interval between viewport probes while the host has not rendered the
    /// expected structure yet (milliseconds).
    pub viewport_poll_interval_ms: u64,
    /// Maximum number of viewport probes before giving up.
    pub viewport_max_attempts: u32,
    /// Self-throttle pause between consecutive translate calls within one
    /// scan (milliseconds).
    pub inter_request_delay_ms: u64,
    /// Debounce window collapsing insertion bursts into one scheduled scan;
    /// the timer restarts on every new burst (milliseconds).
    pub scan_debounce_ms: u64,
    /// Normalized texts shorter than this are not worth translating.
    pub min_text_chars: usize,
    /// Cache keys keep at most this many leading characters.
    pub key_prefix_chars: usize,
    /// Text content of the loading affordance.
    pub loader_text: String,
    /// Render-tree selectors.
    pub selectors: SelectorConfig,
    /// Normalizer boilerplate patterns.
    pub normalizer: NormalizerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 2_000,
            viewport_poll_interval_ms: 1_500,
            viewport_max_attempts: 20,
            inter_request_delay_ms: 200,
            scan_debounce_ms: 500,
            min_text_chars: 5,
            key_prefix_chars: 50,
            loader_text: "\u{23f3} Translating...".to_string(),
            selectors: SelectorConfig::default(),
            normalizer: NormalizerConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Validates bounds and selector presence.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_text_chars == 0 {
            return Err(ConfigError::InvalidBound {
                field: "min_text_chars",
                message: "must be at least 1".to_string(),
            });
        }
        if self.key_prefix_chars < self.min_text_chars {
            return Err(ConfigError::InvalidBound {
                field: "key_prefix_chars",
                message: format!("must be at least min_text_chars ({})", self.min_text_chars),
            });
        }
        if self.viewport_max_attempts == 0 {
            return Err(ConfigError::InvalidBound {
                field: "viewport_max_attempts",
                message: "must be at least 1".to_string(),
            });
        }
        let selectors = &self.selectors;
        let required: [(&'static str, &str); 5] = [
            ("viewport", &selectors.viewport),
            ("container", &selectors.container),
            ("item", &selectors.item),
            ("sent", &selectors.sent),
            ("received", &selectors.received),
        ];
        for (name, value) in required {
            if value.is_empty() {
                return Err(ConfigError::EmptySelector(name));
            }
        }
        if selectors.content_sent.is_empty() {
            return Err(ConfigError::EmptySelector("content_sent"));
        }
        if selectors.content_received.is_empty() {
            return Err(ConfigError::EmptySelector("content_received"));
        }
        Ok(())
    }

    /// Settle delay before the first viewport probe.
    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Interval between viewport probes.
    #[must_use]
    pub const fn viewport_poll_interval(&self) -> Duration {
        Duration::from_millis(self.viewport_poll_interval_ms)
    }

    /// Pause between consecutive translate calls.
    #[must_use]
    pub const fn inter_request_delay(&self) -> Duration {
        Duration::from_millis(self.inter_request_delay_ms)
    }

    /// Debounce window for scheduled scans.
    #[must_use]
    pub const fn scan_debounce(&self) -> Duration {
        Duration::from_millis(self.scan_debounce_ms)
    }
}
