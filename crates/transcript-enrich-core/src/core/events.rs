// transcript-enrich-core/src/core/events.rs
// ============================================================================
// Module: Engine Event Log
// Description: Structured event records for engine observability.
// Purpose: Emit enrichment lifecycle events without hard logger dependencies.
// Dependencies: crate::interfaces, serde, serde_json
// ============================================================================

//! ## Overview
//! The engine reports its lifecycle through serializable events handed to an
//! [`EventSink`]. Deployments route them to their preferred logging pipeline;
//! tests capture them in memory to assert on engine behavior. No global
//! logger state is involved.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::sync::Mutex;

use serde::Serialize;

use crate::interfaces::NodeId;

// ============================================================================
// SECTION: Event Types
// ============================================================================

/// Why a scan was scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanReason {
    /// Initial attach after startup.
    Startup,
    /// The host replaced the list container wholesale.
    ContainerReplaced,
    /// New items were inserted under the current container.
    ItemsInserted,
}

/// Engine lifecycle event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    /// The viewport node was located and the replacement tier subscribed.
    ViewportAttached {
        /// Viewport node handle.
        viewport: NodeId,
    },
    /// Viewport polling gave up after exhausting its attempt ceiling.
    ViewportPollExhausted {
        /// Number of probes issued.
        attempts: u32,
    },
    /// The insertion tier attached to a container.
    ContainerAttached {
        /// Container node handle.
        container: NodeId,
        /// Items visible under the container at attach time.
        visible_items: usize,
    },
    /// Cached entries were projected onto visible items without fetching.
    CacheReplayed {
        /// Scope the replay covered.
        scope: NodeId,
        /// Items touched by the replay.
        items: usize,
    },
    /// A scan was scheduled (possibly coalescing earlier requests).
    ScanScheduled {
        /// What prompted the schedule.
        reason: ScanReason,
    },
    /// A scan started over a snapshot of visible items.
    ScanStarted {
        /// Items in the snapshot.
        items: usize,
    },
    /// A scan request was dropped because one is already in flight.
    ScanAlreadyRunning,
    /// A scan finished and released the in-flight guard.
    ScanFinished {
        /// Items enriched with a translation during this scan.
        translated: usize,
        /// Items skipped (short text, cache hit, already target language).
        skipped: usize,
        /// Items whose fetch or projection failed.
        failed: usize,
    },
    /// An item was rendered from a cached translation.
    ItemEnriched {
        /// Item node handle.
        item: NodeId,
        /// Detected source language code.
        detected_language: String,
    },
    /// An item's text is already in the target language; nothing rendered.
    AlreadyTargetLanguage {
        /// Item node handle.
        item: NodeId,
    },
    /// The translate call failed; the failure is cached as the no-op
    /// sentinel and not retried this session.
    TranslateFailed {
        /// Item node handle.
        item: NodeId,
        /// Provider error description.
        error: String,
    },
    /// No content-container probe matched; injection skipped.
    ContentContainerMissing {
        /// Item node handle.
        item: NodeId,
    },
    /// The tree rejected an injection mid-write; the item is skipped.
    InjectFailed {
        /// Item node handle.
        item: NodeId,
        /// Tree error description.
        error: String,
    },
    /// A shared-state fault (poisoned lock) was observed and skipped over.
    CacheFault {
        /// Fault description.
        error: String,
    },
}

// ============================================================================
// SECTION: Event Sinks
// ============================================================================

/// Destination for engine events.
pub trait EventSink: Send + Sync {
    /// Records one event. Implementations must not block the engine for
    /// longer than a local write.
    fn record(&self, event: &EngineEvent);
}

/// Event sink that logs JSON lines to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrEventSink;

impl EventSink for StderrEventSink {
    fn record(&self, event: &EngineEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Event sink that drops all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn record(&self, _event: &EngineEvent) {}
}

/// Event sink that buffers events in memory, for tests and examples.
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    /// Recorded events in arrival order.
    events: Mutex<Vec<EngineEvent>>,
}

impl MemoryEventSink {
    /// Creates an empty memory sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every event recorded so far.
    #[must_use]
    pub fn snapshot(&self) -> Vec<EngineEvent> {
        self.events.lock().map(|guard| guard.clone()).unwrap_or_default()
    }
}

impl EventSink for MemoryEventSink {
    fn record(&self, event: &EngineEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event.clone());
        }
    }
}
