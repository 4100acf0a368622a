// transcript-enrich-core/src/runtime/scanner.rs
// ============================================================================
// Module: Enrichment Scanner
// Description: Single-flight async fetch loop over visible items.
// Purpose: Resolve cache misses one at a time without racing another scan.
// Dependencies: crate::core, crate::interfaces, crate::runtime, tokio
// ============================================================================

//! ## Overview
//! The scanner walks a snapshot of visible items newest-first, applies cache
//! hits immediately, and fetches misses one at a time with a fixed pause
//! between provider calls. One atomic in-flight guard is the system's entire
//! concurrency control: a scan requested while another runs is dropped, and
//! the guard is released on every exit path.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use tokio::time::sleep;

use crate::core::cache::CacheEntry;
use crate::core::cache::TranslationCache;
use crate::core::config::EngineConfig;
use crate::core::events::EngineEvent;
use crate::core::events::EventSink;
use crate::core::normalize::Normalizer;
use crate::core::normalize::texts_equivalent;
use crate::interfaces::NodeId;
use crate::interfaces::TranscriptTree;
use crate::interfaces::Translator;
use crate::runtime::projector::ProjectionOutcome;
use crate::runtime::projector::Projector;

// ============================================================================
// SECTION: In-Flight Guard
// ============================================================================

/// Drop-based release of the scan in-flight flag.
///
/// Constructed only after winning the compare-exchange, so the flag is
/// cleared exactly once per real scan even when an item-level failure exits
/// the loop early.
struct ScanGuard<'a> {
    /// Flag owned by the scanner.
    flag: &'a AtomicBool,
}

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

// ============================================================================
// SECTION: Scanner
// ============================================================================

/// Drives the asynchronous enrichment fetch loop.
pub struct Scanner {
    /// Host render tree.
    tree: Arc<dyn TranscriptTree>,
    /// Shared translation cache (single writer: this scanner).
    cache: Arc<TranslationCache>,
    /// Shared text normalizer.
    normalizer: Arc<Normalizer>,
    /// Remote translation provider.
    translator: Arc<dyn Translator>,
    /// Cache projector for loaders and enrichment nodes.
    projector: Arc<Projector>,
    /// Event destination.
    sink: Arc<dyn EventSink>,
    /// Engine configuration.
    config: Arc<EngineConfig>,
    /// In-flight guard; `true` while a scan is running.
    in_flight: AtomicBool,
}

impl Scanner {
    /// Creates a scanner over the shared engine state.
    #[must_use]
    pub fn new(
        tree: Arc<dyn TranscriptTree>,
        cache: Arc<TranslationCache>,
        normalizer: Arc<Normalizer>,
        translator: Arc<dyn Translator>,
        projector: Arc<Projector>,
        sink: Arc<dyn EventSink>,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            tree,
            cache,
            normalizer,
            translator,
            projector,
            sink,
            config,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Returns whether a scan is currently in flight. Diagnostics only.
    #[must_use]
    pub fn is_scanning(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Runs one scan over a snapshot of visible items.
    ///
    /// Silently returns when another scan is already in flight; callers rely
    /// on later change notifications for eventual re-triggering, never on a
    /// queued request.
    pub async fn scan(&self, mut items: Vec<NodeId>) {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            self.sink.record(&EngineEvent::ScanAlreadyRunning);
            return;
        }
        let _guard = ScanGuard {
            flag: &self.in_flight,
        };

        self.sink.record(&EngineEvent::ScanStarted { items: items.len() });

        // Newest-first: recently visible content is enriched before older,
        // likely-scrolled-away content.
        items.reverse();

        let mut translated = 0usize;
        let mut skipped = 0usize;
        let mut failed = 0usize;

        for item in items {
            if !self.tree.is_attached(item) {
                skipped += 1;
                continue;
            }

            let normalized = self.normalizer.item_text(self.tree.as_ref(), item);
            let Some(key) = self.normalizer.key(&normalized) else {
                skipped += 1;
                continue;
            };

            let cached = match self.cache.lookup(&key) {
                Ok(cached) => cached,
                Err(err) => {
                    self.sink.record(&EngineEvent::CacheFault {
                        error: err.to_string(),
                    });
                    failed += 1;
                    continue;
                }
            };

            if cached.is_some() {
                // Pure cache projection; no network interaction.
                match self.projector.apply_entry(item) {
                    ProjectionOutcome::NoContainer | ProjectionOutcome::InjectFailed => failed += 1,
                    _ => skipped += 1,
                }
                continue;
            }

            self.projector.show_loader(item);

            let mut fetch_failed = false;
            let entry = match self.translator.translate(&normalized).await {
                Ok(translation) => {
                    if texts_equivalent(&translation.text, &normalized) {
                        self.sink.record(&EngineEvent::AlreadyTargetLanguage { item });
                        CacheEntry::AlreadyTarget
                    } else {
                        CacheEntry::Translated(translation)
                    }
                }
                Err(err) => {
                    // Policy: a failed fetch is cached as the no-op sentinel
                    // and not retried this session.
                    self.sink.record(&EngineEvent::TranslateFailed {
                        item,
                        error: err.to_string(),
                    });
                    fetch_failed = true;
                    CacheEntry::AlreadyTarget
                }
            };

            let fetched_translation = matches!(entry, CacheEntry::Translated(_));
            if let Err(err) = self.cache.store(key, entry) {
                self.sink.record(&EngineEvent::CacheFault {
                    error: err.to_string(),
                });
                self.projector.remove_loader(item);
                failed += 1;
                continue;
            }

            match self.projector.apply_entry(item) {
                _ if fetch_failed => failed += 1,
                ProjectionOutcome::Enriched if fetched_translation => translated += 1,
                ProjectionOutcome::NoContainer | ProjectionOutcome::InjectFailed => failed += 1,
                _ => skipped += 1,
            }

            // Fixed self-throttle against provider rate limiting.
            sleep(self.config.inter_request_delay()).await;
        }

        self.sink.record(&EngineEvent::ScanFinished {
            translated,
            skipped,
            failed,
        });
    }
}
