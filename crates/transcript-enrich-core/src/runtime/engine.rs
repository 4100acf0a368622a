// transcript-enrich-core/src/runtime/engine.rs
// ============================================================================
// Module: Enrichment Engine
// Description: Session-scoped composition of cache, scanner, and synchronizer.
// Purpose: Own all mutable engine state behind one constructed instance.
// Dependencies: crate::core, crate::interfaces, crate::runtime
// ============================================================================

//! ## Overview
//! The engine is constructed once per session and owns every piece of shared
//! state: the translation cache, the in-flight scan guard, and the debounce
//! timer all live behind this instance rather than in module globals, so
//! independent engines can coexist and tear down cleanly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use thiserror::Error;

use crate::core::cache::TranslationCache;
use crate::core::config::ConfigError;
use crate::core::config::EngineConfig;
use crate::core::events::EventSink;
use crate::core::normalize::NormalizeError;
use crate::core::normalize::Normalizer;
use crate::interfaces::MutationFeed;
use crate::interfaces::TranscriptTree;
use crate::interfaces::Translator;
use crate::interfaces::TreeError;
use crate::runtime::projector::Projector;
use crate::runtime::scanner::Scanner;
use crate::runtime::synchronizer::Synchronizer;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Engine construction and session errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration failed validation.
    #[error("invalid engine configuration: {0}")]
    Config(#[from] ConfigError),
    /// A normalizer pattern failed to compile.
    #[error("invalid normalizer configuration: {0}")]
    Normalizer(#[from] NormalizeError),
    /// The host never rendered the viewport within the allowed attempts.
    #[error("viewport not found after {attempts} probes")]
    ViewportUnavailable {
        /// Number of probes issued before giving up.
        attempts: u32,
    },
    /// A change-notification subscription could not be established.
    #[error("subscription failed: {0}")]
    Subscribe(#[from] TreeError),
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// One enrichment session over one host tree.
pub struct EnrichmentEngine {
    /// Shared translation cache.
    cache: Arc<TranslationCache>,
    /// Cache projector.
    projector: Arc<Projector>,
    /// Enrichment scanner.
    scanner: Arc<Scanner>,
    /// Tree synchronizer driving the session.
    synchronizer: Synchronizer,
}

impl EnrichmentEngine {
    /// Wires an engine over the host collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the configuration fails validation or a
    /// normalizer pattern does not compile.
    pub fn new(
        tree: Arc<dyn TranscriptTree>,
        feed: Arc<dyn MutationFeed>,
        translator: Arc<dyn Translator>,
        sink: Arc<dyn EventSink>,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let normalizer = Arc::new(Normalizer::new(&config)?);
        let config = Arc::new(config);
        let cache = Arc::new(TranslationCache::new());
        let projector = Arc::new(Projector::new(
            Arc::clone(&tree),
            Arc::clone(&cache),
            Arc::clone(&normalizer),
            Arc::clone(&sink),
            Arc::clone(&config),
        ));
        let scanner = Arc::new(Scanner::new(
            Arc::clone(&tree),
            Arc::clone(&cache),
            Arc::clone(&normalizer),
            translator,
            Arc::clone(&projector),
            Arc::clone(&sink),
            Arc::clone(&config),
        ));
        let synchronizer = Synchronizer::new(
            tree,
            feed,
            Arc::clone(&projector),
            Arc::clone(&scanner),
            sink,
            config,
        );
        Ok(Self {
            cache,
            projector,
            scanner,
            synchronizer,
        })
    }

    /// Runs the session until the host feed closes.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when startup cannot attach to the host tree.
    pub async fn run(&self) -> Result<(), EngineError> {
        self.synchronizer.run().await
    }

    /// Shared translation cache, for diagnostics.
    #[must_use]
    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    /// Cache projector, for host-driven re-projection.
    #[must_use]
    pub fn projector(&self) -> &Projector {
        &self.projector
    }

    /// Enrichment scanner, for host-driven scans.
    #[must_use]
    pub fn scanner(&self) -> &Arc<Scanner> {
        &self.scanner
    }
}
