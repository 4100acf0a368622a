// transcript-enrich-core/src/core/mod.rs
// ============================================================================
// Module: Transcript Enrich Core Types
// Description: Cache, configuration, events, and text normalization.
// Purpose: Group the engine's passive building blocks.
// Dependencies: crate::interfaces
// ============================================================================

//! ## Overview
//! The core module holds everything the runtime composes but that carries no
//! control flow of its own: the translation cache, the validated engine
//! configuration, the structured event log, and the text normalizer.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod cache;
pub mod config;
pub mod events;
pub mod normalize;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use cache::CacheEntry;
pub use cache::CacheError;
pub use cache::CacheKey;
pub use cache::TranslationCache;
pub use config::ConfigError;
pub use config::EngineConfig;
pub use config::NormalizerConfig;
pub use config::SelectorConfig;
pub use events::EngineEvent;
pub use events::EventSink;
pub use events::MemoryEventSink;
pub use events::NoopEventSink;
pub use events::ScanReason;
pub use events::StderrEventSink;
pub use normalize::NormalizeError;
pub use normalize::Normalizer;
pub use normalize::texts_equivalent;
