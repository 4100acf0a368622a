// crates/transcript-enrich-providers/src/lib.rs
// ============================================================================
// Module: Transcript Enrich Providers Library
// Description: Translation provider implementations for the enrichment engine.
// Purpose: Expose network-backed implementations of the translator interface.
// Dependencies: transcript-enrich-core, reqwest
// ============================================================================

//! ## Overview
//! Provider implementations of the core
//! [`Translator`](transcript_enrich_core::Translator) interface. The Google
//! web translator is the only production provider; the core crate ships
//! in-memory fakes for tests and examples.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod google;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use google::GoogleTranslatorConfig;
pub use google::GoogleWebTranslator;
pub use google::decode_translation;
