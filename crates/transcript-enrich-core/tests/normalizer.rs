// transcript-enrich-core/tests/normalizer.rs
// ============================================================================
// Module: Text Normalizer Tests
// Description: Tests for boilerplate stripping and content-key derivation.
// Purpose: Validate stable keys across cosmetic re-renders and engine writes.
// Dependencies: transcript-enrich-core
// ============================================================================
//! ## Overview
//! Ensures the normalizer strips decorative glyphs, boilerplate annotations,
//! and engine-injected markup, and that the derived keys honor the length
//! floor and the prefix bound.

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

use transcript_enrich_core::EngineConfig;
use transcript_enrich_core::MemoryTree;
use transcript_enrich_core::Normalizer;
use transcript_enrich_core::TranscriptTree;
use transcript_enrich_core::texts_equivalent;

fn normalizer() -> Normalizer {
    Normalizer::new(&EngineConfig::default()).expect("default patterns compile")
}

/// Verifies decorative glyphs and name annotations are stripped and the
/// result is trimmed.
#[test]
fn normalize_strips_glyphs_and_annotations() {
    let normalizer = normalizer();
    assert_eq!(normalizer.normalize_text("\u{2737}Hola amigo (Renze)"), "Hola amigo");
    assert_eq!(normalizer.normalize_text("  Dag hoor (Bas)  "), "Dag hoor");
}

/// Verifies the action-row boilerplate is removed case-insensitively.
#[test]
fn normalize_strips_action_row_any_case() {
    let normalizer = normalizer();
    assert_eq!(
        normalizer.normalize_text("Hola amigo Reply Forward Bookmark Delete"),
        "Hola amigo"
    );
    assert_eq!(
        normalizer.normalize_text("Hola amigo REPLY  FORWARD\tBOOKMARK DELETE"),
        "Hola amigo"
    );
}

/// Verifies normalization is idempotent: a second pass changes nothing.
#[test]
fn normalize_is_idempotent() {
    let normalizer = normalizer();
    let once = normalizer.normalize_text("\u{2737} Hoi daar (Bas) Reply Forward Bookmark Delete");
    assert_eq!(normalizer.normalize_text(&once), once);
}

/// Verifies texts below the length floor never produce a key.
#[test]
fn key_honors_length_floor() {
    let normalizer = normalizer();
    assert!(normalizer.key("Hoi!").is_none());
    assert!(normalizer.key("").is_none());
    assert!(normalizer.key("Hola!").is_some());
}

/// Verifies keys are truncated to the configured prefix on character
/// boundaries, not bytes.
#[test]
fn key_truncates_to_prefix_chars() {
    let normalizer = normalizer();
    let long = "\u{a1}".repeat(80);
    let key = normalizer.key(&long).expect("long text keys");
    assert_eq!(key.as_str().chars().count(), 50);
    assert!(long.starts_with(key.as_str()));
}

/// Verifies two long messages sharing a prefix map to the same key.
#[test]
fn key_collides_on_shared_prefix() {
    let normalizer = normalizer();
    let prefix = "x".repeat(50);
    let first = normalizer.key(&format!("{prefix} first tail")).expect("keyed");
    let second = normalizer.key(&format!("{prefix} second tail")).expect("keyed");
    assert_eq!(first, second);
}

/// Verifies item text excludes action chrome and engine-injected markup, so
/// an enriched item keeps its pre-enrichment key.
#[test]
fn item_text_excludes_chrome_and_engine_markup() {
    let normalizer = normalizer();
    let tree = Arc::new(MemoryTree::new());
    let item = tree
        .create_element(tree.root(), "div", "msg_pos chat__message_received", "")
        .expect("attached parent");
    let content = tree
        .create_element(item, "div", "msg_text_received", "Hola amigo, como estas?")
        .expect("attached parent");
    tree.create_element(item, "button", "", "Reply").expect("attached parent");
    tree.create_element(item, "div", "msg_actions", "Forward").expect("attached parent");
    tree.create_element(content, "div", "auto-translation", " Hi friend, how are you?")
        .expect("attached parent");
    tree.create_element(item, "div", "translation-loading", "\u{23f3} Translating...")
        .expect("attached parent");

    assert_eq!(normalizer.item_text(tree.as_ref(), item), "Hola amigo, como estas?");
}

/// Verifies equivalence comparison folds case and whitespace runs.
#[test]
fn texts_equivalent_folds_case_and_whitespace() {
    assert!(texts_equivalent("Hello there", "hello   THERE"));
    assert!(texts_equivalent(" hello there ", "hello there"));
    assert!(!texts_equivalent("hello there", "hello here"));
}
