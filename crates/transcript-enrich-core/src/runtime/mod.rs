// transcript-enrich-core/src/runtime/mod.rs
// ============================================================================
// Module: Transcript Enrich Runtime
// Description: Projector, scanner, synchronizer, engine, and in-memory fakes.
// Purpose: Drive enrichment sessions over host collaborator interfaces.
// Dependencies: crate::{core, interfaces}, tokio
// ============================================================================

//! ## Overview
//! Runtime modules implement the enrichment session: idempotent cache
//! projection, the single-flight fetch scanner, and the two-tier tree
//! synchronizer, composed by the engine. In-memory host fakes live here for
//! tests and examples.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod engine;
pub mod memory;
pub mod projector;
pub mod scanner;
pub mod synchronizer;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use engine::EngineError;
pub use engine::EnrichmentEngine;
pub use memory::MemoryFeed;
pub use memory::MemoryTree;
pub use memory::StaticTranslator;
pub use projector::ProjectionOutcome;
pub use projector::Projector;
pub use scanner::Scanner;
pub use synchronizer::Synchronizer;
