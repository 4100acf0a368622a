// transcript-enrich-core/tests/scanner.rs
// ============================================================================
// Module: Enrichment Scanner Tests
// Description: Tests for the single-flight fetch loop over visible items.
// Purpose: Validate fetch-once semantics, ordering, and guard release.
// Dependencies: transcript-enrich-core, tokio
// ============================================================================
//! ## Overview
//! Ensures scans fetch each distinct content exactly once, walk items
//! newest-first, cache failures as the no-op sentinel, and drop overlapping
//! scan requests while always releasing the in-flight guard.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::sync::Arc;

use transcript_enrich_core::CacheEntry;
use transcript_enrich_core::EngineConfig;
use transcript_enrich_core::EngineEvent;
use transcript_enrich_core::EventSink;
use transcript_enrich_core::MemoryEventSink;
use transcript_enrich_core::MemoryTree;
use transcript_enrich_core::NodeId;
use transcript_enrich_core::Normalizer;
use transcript_enrich_core::Projector;
use transcript_enrich_core::Scanner;
use transcript_enrich_core::StaticTranslator;
use transcript_enrich_core::TranscriptTree;
use transcript_enrich_core::Translator;
use transcript_enrich_core::TranslationCache;

struct Fixture {
    tree: Arc<MemoryTree>,
    cache: Arc<TranslationCache>,
    translator: Arc<StaticTranslator>,
    sink: Arc<MemoryEventSink>,
    scanner: Arc<Scanner>,
}

fn fixture(translator: StaticTranslator) -> Fixture {
    let config = Arc::new(EngineConfig::default());
    let tree = Arc::new(MemoryTree::new());
    let cache = Arc::new(TranslationCache::new());
    let translator = Arc::new(translator);
    let sink = Arc::new(MemoryEventSink::new());
    let normalizer =
        Arc::new(Normalizer::new(&config).expect("default patterns compile"));
    let projector = Arc::new(Projector::new(
        Arc::clone(&tree) as Arc<dyn TranscriptTree>,
        Arc::clone(&cache),
        Arc::clone(&normalizer),
        Arc::clone(&sink) as Arc<dyn EventSink>,
        Arc::clone(&config),
    ));
    let scanner = Arc::new(Scanner::new(
        Arc::clone(&tree) as Arc<dyn TranscriptTree>,
        Arc::clone(&cache),
        normalizer,
        Arc::clone(&translator) as Arc<dyn Translator>,
        projector,
        Arc::clone(&sink) as Arc<dyn EventSink>,
        config,
    ));
    Fixture {
        tree,
        cache,
        translator,
        sink,
        scanner,
    }
}

fn received_item(tree: &MemoryTree, text: &str) -> NodeId {
    let item = tree
        .create_element(tree.root(), "div", "msg_pos chat__message_received", "")
        .expect("attached parent");
    tree.create_element(item, "div", "msg_text_received", text).expect("attached parent");
    item
}

fn scan_finished(events: &[EngineEvent]) -> Option<(usize, usize, usize)> {
    events.iter().rev().find_map(|event| match event {
        EngineEvent::ScanFinished {
            translated,
            skipped,
            failed,
        } => Some((*translated, *skipped, *failed)),
        _ => None,
    })
}

/// Verifies a cache miss is fetched, cached, and rendered, with the loader
/// cleared afterwards.
#[tokio::test(start_paused = true)]
async fn scan_fetches_and_renders_miss() {
    let fx = fixture(
        StaticTranslator::new().with_translation(
            "Hola amigo, como estas?",
            "Hi friend, how are you?",
            "es",
        ),
    );
    let item = received_item(&fx.tree, "Hola amigo, como estas?");

    fx.scanner.scan(vec![item]).await;

    assert_eq!(fx.translator.calls(), 1);
    assert_eq!(fx.cache.len().expect("len"), 1);
    assert_eq!(fx.tree.query(item, ".auto-translation").len(), 1);
    assert!(fx.tree.query(item, ".translation-loading").is_empty());
    assert!(!fx.scanner.is_scanning());
    assert_eq!(scan_finished(&fx.sink.snapshot()), Some((1, 0, 0)));
}

/// Verifies a cache hit is projected without any provider call.
#[tokio::test(start_paused = true)]
async fn scan_never_fetches_cached_content() {
    let fx = fixture(StaticTranslator::new());
    let item = received_item(&fx.tree, "Hola amigo, como estas?");

    let normalizer =
        Normalizer::new(&EngineConfig::default()).expect("default patterns compile");
    let key = normalizer.key("Hola amigo, como estas?").expect("keyable text");
    assert!(
        fx.cache
            .store(
                key,
                CacheEntry::Translated(transcript_enrich_core::Translation {
                    text: "Hi friend, how are you?".to_string(),
                    detected_language: "es".to_string(),
                }),
            )
            .expect("store")
    );

    fx.scanner.scan(vec![item]).await;

    assert_eq!(fx.translator.calls(), 0);
    assert_eq!(fx.tree.query(item, ".auto-translation").len(), 1);
    assert_eq!(scan_finished(&fx.sink.snapshot()), Some((0, 1, 0)));
}

/// Verifies items below the length floor are skipped without fetching or
/// caching.
#[tokio::test(start_paused = true)]
async fn scan_skips_short_text() {
    let fx = fixture(StaticTranslator::new());
    let item = received_item(&fx.tree, "Hoi!");

    fx.scanner.scan(vec![item]).await;

    assert_eq!(fx.translator.calls(), 0);
    assert!(fx.cache.is_empty().expect("is_empty"));
    assert_eq!(scan_finished(&fx.sink.snapshot()), Some((0, 1, 0)));
}

/// Verifies detached items are skipped without fetching.
#[tokio::test(start_paused = true)]
async fn scan_skips_detached_items() {
    let fx = fixture(StaticTranslator::new());
    let item = received_item(&fx.tree, "Hola amigo, como estas?");
    fx.tree.remove(item).expect("remove");

    fx.scanner.scan(vec![item]).await;

    assert_eq!(fx.translator.calls(), 0);
    assert!(fx.cache.is_empty().expect("is_empty"));
}

/// Verifies text the provider echoes back is cached as the no-op sentinel
/// and never refetched.
#[tokio::test(start_paused = true)]
async fn scan_caches_already_target_text() {
    let fx = fixture(StaticTranslator::new());
    let item = received_item(&fx.tree, "Hello there my friend");

    fx.scanner.scan(vec![item]).await;
    assert_eq!(fx.translator.calls(), 1);
    assert!(fx.tree.query(item, ".auto-translation").is_empty());
    assert!(
        fx.sink
            .snapshot()
            .iter()
            .any(|event| matches!(event, EngineEvent::AlreadyTargetLanguage { .. }))
    );

    fx.scanner.scan(vec![item]).await;
    assert_eq!(fx.translator.calls(), 1);
}

/// Verifies a failed fetch is reported, cached as the no-op sentinel, and
/// not retried, with the loader cleared.
#[tokio::test(start_paused = true)]
async fn scan_caches_failures_without_retry() {
    let fx = fixture(StaticTranslator::new().failing_on("Hola amigo, como estas?"));
    let item = received_item(&fx.tree, "Hola amigo, como estas?");

    fx.scanner.scan(vec![item]).await;

    assert_eq!(fx.translator.calls(), 1);
    assert_eq!(fx.cache.len().expect("len"), 1);
    assert!(fx.tree.query(item, ".translation-loading").is_empty());
    let events = fx.sink.snapshot();
    assert!(events.iter().any(|event| matches!(event, EngineEvent::TranslateFailed { .. })));
    assert_eq!(scan_finished(&events), Some((0, 0, 1)));

    fx.scanner.scan(vec![item]).await;
    assert_eq!(fx.translator.calls(), 1);
}

/// Verifies the snapshot is walked newest-first.
#[tokio::test(start_paused = true)]
async fn scan_walks_items_newest_first() {
    let fx = fixture(
        StaticTranslator::new()
            .with_translation("Hola amigo, como estas?", "Hi friend, how are you?", "es")
            .with_translation("Tot morgen, slaap lekker!", "See you tomorrow!", "nl"),
    );
    let older = received_item(&fx.tree, "Hola amigo, como estas?");
    let newer = received_item(&fx.tree, "Tot morgen, slaap lekker!");

    fx.scanner.scan(vec![older, newer]).await;

    let enriched: Vec<NodeId> = fx
        .sink
        .snapshot()
        .iter()
        .filter_map(|event| match event {
            EngineEvent::ItemEnriched { item, .. } => Some(*item),
            _ => None,
        })
        .collect();
    assert_eq!(enriched, vec![newer, older]);
}

/// Verifies a scan requested while another runs is dropped, and the guard is
/// released once the running scan completes.
#[tokio::test(start_paused = true)]
async fn scan_drops_overlapping_requests() {
    let fx = fixture(
        StaticTranslator::new().with_translation(
            "Hola amigo, como estas?",
            "Hi friend, how are you?",
            "es",
        ),
    );
    let item = received_item(&fx.tree, "Hola amigo, como estas?");

    let scanner = Arc::clone(&fx.scanner);
    let first = tokio::spawn(async move {
        scanner.scan(vec![item]).await;
    });

    // Let the first scan win the guard and park at its inter-request pause.
    for _ in 0 .. 16 {
        if fx.scanner.is_scanning() {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert!(fx.scanner.is_scanning());

    fx.scanner.scan(vec![item]).await;

    first.await.expect("first scan task");
    assert!(!fx.scanner.is_scanning());

    let events = fx.sink.snapshot();
    assert!(events.iter().any(|event| matches!(event, EngineEvent::ScanAlreadyRunning)));
    let started = events
        .iter()
        .filter(|event| matches!(event, EngineEvent::ScanStarted { .. }))
        .count();
    assert_eq!(started, 1);
    assert_eq!(fx.translator.calls(), 1);
}

/// Verifies two items with identical content trigger one fetch; the second
/// item is rendered from the entry the first one stored.
#[tokio::test(start_paused = true)]
async fn scan_fetches_duplicate_content_once() {
    let fx = fixture(
        StaticTranslator::new().with_translation(
            "Hola amigo, como estas?",
            "Hi friend, how are you?",
            "es",
        ),
    );
    let first = received_item(&fx.tree, "Hola amigo, como estas?");
    let second = received_item(&fx.tree, "Hola amigo, como estas?");

    fx.scanner.scan(vec![first, second]).await;

    assert_eq!(fx.translator.calls(), 1);
    assert_eq!(fx.cache.len().expect("len"), 1);
    assert_eq!(fx.tree.query(first, ".auto-translation").len(), 1);
    assert_eq!(fx.tree.query(second, ".auto-translation").len(), 1);
}
