// transcript-enrich-core/src/runtime/projector.rs
// ============================================================================
// Module: Cache Projector
// Description: Idempotent projection of cache entries onto render-tree items.
// Purpose: Keep the rendered enrichment state a pure function of the cache.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! The projector is the only code that writes into the render tree. Applying
//! it twice in a row with no cache change produces the same markup as once:
//! the enrichment node is keyed by presence, the loading affordance is
//! cleared before every application, and a missing content container
//! degrades to a structural warning instead of an error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::core::cache::CacheEntry;
use crate::core::cache::TranslationCache;
use crate::core::config::EngineConfig;
use crate::core::events::EngineEvent;
use crate::core::events::EventSink;
use crate::core::normalize::Normalizer;
use crate::interfaces::NodeId;
use crate::interfaces::NodeSpec;
use crate::interfaces::TranscriptTree;
use crate::interfaces::Translation;
use crate::interfaces::TreeError;

// ============================================================================
// SECTION: Projection Outcome
// ============================================================================

/// Result of projecting the cache onto one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionOutcome {
    /// Normalized text is below the length floor; never cached or fetched.
    ShortText,
    /// No cache entry for the item's key yet; a fetch is needed.
    NotCached,
    /// Entry is the no-op sentinel; nothing is rendered.
    Suppressed,
    /// A translation is rendered for the item (freshly injected or already
    /// present from an earlier projection).
    Enriched,
    /// No content-container probe matched; injection skipped with a warning.
    NoContainer,
    /// The tree rejected the write mid-flight; the item is skipped.
    InjectFailed,
}

// ============================================================================
// SECTION: Projector
// ============================================================================

/// Applies cache state to the render tree, idempotently.
pub struct Projector {
    /// Host render tree.
    tree: Arc<dyn TranscriptTree>,
    /// Shared translation cache (read-only from here).
    cache: Arc<TranslationCache>,
    /// Shared text normalizer.
    normalizer: Arc<Normalizer>,
    /// Event destination.
    sink: Arc<dyn EventSink>,
    /// Engine configuration.
    config: Arc<EngineConfig>,
}

impl Projector {
    /// Creates a projector over the shared engine state.
    #[must_use]
    pub fn new(
        tree: Arc<dyn TranscriptTree>,
        cache: Arc<TranslationCache>,
        normalizer: Arc<Normalizer>,
        sink: Arc<dyn EventSink>,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            tree,
            cache,
            normalizer,
            sink,
            config,
        }
    }

    /// Shows the loading affordance on `item` unless one is already present.
    pub fn show_loader(&self, item: NodeId) {
        let selectors = &self.config.selectors;
        if self.tree.query_first(item, &selectors.loader_selector()).is_some() {
            return;
        }
        let spec = NodeSpec::leaf(selectors.loader_class.clone(), self.config.loader_text.clone());
        if let Err(err) = self.tree.append(item, &spec) {
            self.sink.record(&EngineEvent::InjectFailed {
                item,
                error: err.to_string(),
            });
        }
    }

    /// Removes every loading affordance under `item`. Idempotent.
    pub fn remove_loader(&self, item: NodeId) {
        let selector = self.config.selectors.loader_selector();
        for loader in self.tree.query(item, &selector) {
            // Removing an already-detached node is a no-op by contract.
            let _ = self.tree.remove(loader);
        }
    }

    /// Projects the cached outcome for `item` onto the render tree.
    ///
    /// Always clears the loading affordance first, then renders exactly what
    /// the cache dictates: nothing for an absent entry or the no-op
    /// sentinel, exactly one enrichment node for a translation.
    pub fn apply_entry(&self, item: NodeId) -> ProjectionOutcome {
        self.remove_loader(item);

        let normalized = self.normalizer.item_text(self.tree.as_ref(), item);
        let Some(key) = self.normalizer.key(&normalized) else {
            return ProjectionOutcome::ShortText;
        };

        let entry = match self.cache.lookup(&key) {
            Ok(entry) => entry,
            Err(err) => {
                self.sink.record(&EngineEvent::CacheFault {
                    error: err.to_string(),
                });
                return ProjectionOutcome::NotCached;
            }
        };

        match entry {
            None => ProjectionOutcome::NotCached,
            Some(CacheEntry::AlreadyTarget) => ProjectionOutcome::Suppressed,
            Some(CacheEntry::Translated(translation)) => self.inject(item, &translation),
        }
    }

    /// Ensures exactly one enrichment node exists for `item`.
    fn inject(&self, item: NodeId, translation: &Translation) -> ProjectionOutcome {
        let selectors = &self.config.selectors;
        if self.tree.query_first(item, &selectors.enrichment_selector()).is_some() {
            return ProjectionOutcome::Enriched;
        }

        let Some(target) = self.content_container(item) else {
            self.sink.record(&EngineEvent::ContentContainerMissing { item });
            return ProjectionOutcome::NoContainer;
        };

        let badge = NodeSpec {
            class_name: selectors.badge_class.clone(),
            text: translation.detected_language.to_uppercase(),
            title: Some(format!("Detected language: {}", translation.detected_language)),
            children: Vec::new(),
        };
        let node = NodeSpec {
            class_name: selectors.enrichment_class.clone(),
            text: format!(" {}", translation.text),
            title: None,
            children: vec![badge],
        };

        match self.tree.append(target, &node) {
            Ok(_) => {
                self.sink.record(&EngineEvent::ItemEnriched {
                    item,
                    detected_language: translation.detected_language.clone(),
                });
                ProjectionOutcome::Enriched
            }
            Err(TreeError::Detached(_)) => {
                // The host recycled the item mid-write; the next projection
                // over the replacement wrapper renders it from cache.
                ProjectionOutcome::InjectFailed
            }
            Err(err) => {
                self.sink.record(&EngineEvent::InjectFailed {
                    item,
                    error: err.to_string(),
                });
                ProjectionOutcome::InjectFailed
            }
        }
    }

    /// Locates the item's content container using the prioritized,
    /// role-dependent probe list.
    fn content_container(&self, item: NodeId) -> Option<NodeId> {
        let selectors = &self.config.selectors;
        let probes = if self.tree.matches(item, &selectors.sent) {
            &selectors.content_sent
        } else if self.tree.matches(item, &selectors.received) {
            &selectors.content_received
        } else {
            return None;
        };
        probes.iter().find_map(|probe| self.tree.query_first(item, probe))
    }
}
