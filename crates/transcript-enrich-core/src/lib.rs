// transcript-enrich-core/src/lib.rs
// ============================================================================
// Module: Transcript Enrich Core Library
// Description: Public API surface for the transcript enrichment engine.
// Purpose: Expose core types, host interfaces, and the runtime.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Transcript Enrich keeps a recycled chat render tree aligned with a
//! content-addressed translation cache: visible transcript items are
//! normalized, translated once, and re-rendered from cache on every later
//! appearance. The engine is host-agnostic and integrates through explicit
//! interfaces for the render tree, change notification, and the translation
//! provider.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::MutationBatch;
pub use interfaces::MutationFeed;
pub use interfaces::MutationSubscription;
pub use interfaces::NodeId;
pub use interfaces::NodeSpec;
pub use interfaces::TranscriptTree;
pub use interfaces::TranslateError;
pub use interfaces::Translation;
pub use interfaces::Translator;
pub use interfaces::TreeError;
pub use runtime::EngineError;
pub use runtime::EnrichmentEngine;
pub use runtime::MemoryFeed;
pub use runtime::MemoryTree;
pub use runtime::ProjectionOutcome;
pub use runtime::Projector;
pub use runtime::Scanner;
pub use runtime::StaticTranslator;
pub use runtime::Synchronizer;
