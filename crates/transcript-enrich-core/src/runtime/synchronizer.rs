// transcript-enrich-core/src/runtime/synchronizer.rs
// ============================================================================
// Module: Tree Synchronizer
// Description: Two-tier subscription state machine over the host tree.
// Purpose: Decide between pure cache replay and scheduling a fresh scan.
// Dependencies: crate::core, crate::interfaces, crate::runtime, tokio
// ============================================================================

//! ## Overview
//! The synchronizer owns both change-notification tiers: the viewport tier
//! watching for wholesale container replacement, and the container tier
//! watching item insertions. Container replacement triggers a synchronous
//! cache replay plus re-subscription; insertion bursts are projected
//! immediately and collapse into one debounce-scheduled scan. Scans run as
//! spawned tasks; the scanner's in-flight guard drops overlapping requests.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::pending;
use std::sync::Arc;

use tokio::time::Instant;
use tokio::time::sleep;
use tokio::time::sleep_until;

use crate::core::config::EngineConfig;
use crate::core::events::EngineEvent;
use crate::core::events::EventSink;
use crate::core::events::ScanReason;
use crate::interfaces::MutationBatch;
use crate::interfaces::MutationFeed;
use crate::interfaces::MutationSubscription;
use crate::interfaces::NodeId;
use crate::interfaces::TranscriptTree;
use crate::runtime::engine::EngineError;
use crate::runtime::projector::ProjectionOutcome;
use crate::runtime::projector::Projector;
use crate::runtime::scanner::Scanner;

// ============================================================================
// SECTION: Container Attachment
// ============================================================================

/// Live attachment to one container generation.
struct Attachment {
    /// Container node for this generation.
    container: NodeId,
    /// Insertion-tier subscription on the container.
    subscription: MutationSubscription,
}

/// Waits for the next insertion batch, or forever when detached.
async fn container_batch(attachment: &mut Option<Attachment>) -> Option<MutationBatch> {
    match attachment {
        Some(attachment) => attachment.subscription.next_batch().await,
        None => pending().await,
    }
}

/// Waits until the debounce deadline, or forever when none is pending.
async fn debounce(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}

// ============================================================================
// SECTION: Synchronizer
// ============================================================================

/// Keeps the subscriptions and the cache projection aligned with the host
/// tree for the lifetime of the session.
pub struct Synchronizer {
    /// Host render tree.
    tree: Arc<dyn TranscriptTree>,
    /// Host change-notification primitive.
    feed: Arc<dyn MutationFeed>,
    /// Cache projector.
    projector: Arc<Projector>,
    /// Enrichment scanner, shared with spawned scan tasks.
    scanner: Arc<Scanner>,
    /// Event destination.
    sink: Arc<dyn EventSink>,
    /// Engine configuration.
    config: Arc<EngineConfig>,
}

impl Synchronizer {
    /// Creates a synchronizer over the shared engine state.
    #[must_use]
    pub fn new(
        tree: Arc<dyn TranscriptTree>,
        feed: Arc<dyn MutationFeed>,
        projector: Arc<Projector>,
        scanner: Arc<Scanner>,
        sink: Arc<dyn EventSink>,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            tree,
            feed,
            projector,
            scanner,
            sink,
            config,
        }
    }

    /// Runs the synchronizer until the host feed closes.
    ///
    /// Startup waits a settle delay, locates the viewport with bounded
    /// polling, subscribes the replacement tier, and attaches to whatever
    /// container exists right now. The loop then serves both tiers plus the
    /// scan debounce timer.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ViewportUnavailable`] when the host never
    /// renders the expected viewport, or [`EngineError::Subscribe`] when the
    /// replacement tier cannot be attached.
    pub async fn run(&self) -> Result<(), EngineError> {
        sleep(self.config.settle_delay()).await;

        let viewport = self.poll_viewport().await?;
        let mut viewport_sub = self.feed.subscribe(viewport, true)?;
        self.sink.record(&EngineEvent::ViewportAttached { viewport });

        let mut deadline: Option<Instant> = None;
        let mut attachment: Option<Attachment> = None;
        let initial = self.tree.query_first(viewport, &self.config.selectors.container);
        if let Some(container) = initial {
            self.attach(container, &mut attachment, &mut deadline, ScanReason::Startup);
        }

        loop {
            tokio::select! {
                batch = viewport_sub.next_batch() => {
                    let Some(batch) = batch else { break };
                    self.on_viewport_batch(&batch, &mut attachment, &mut deadline);
                }
                batch = container_batch(&mut attachment) => {
                    match batch {
                        Some(batch) => self.on_container_batch(&batch, &mut deadline),
                        // Container generation torn down; wait for the
                        // replacement tier to deliver its successor.
                        None => attachment = None,
                    }
                }
                () = debounce(deadline) => {
                    deadline = None;
                    self.trigger_scan(attachment.as_ref());
                }
            }
        }
        Ok(())
    }

    /// Polls for the viewport node with a fixed interval and a bounded
    /// attempt ceiling.
    async fn poll_viewport(&self) -> Result<NodeId, EngineError> {
        let selector = &self.config.selectors.viewport;
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            if let Some(viewport) = self.tree.query_first(self.tree.root(), selector) {
                return Ok(viewport);
            }
            if attempts >= self.config.viewport_max_attempts {
                self.sink.record(&EngineEvent::ViewportPollExhausted { attempts });
                return Err(EngineError::ViewportUnavailable { attempts });
            }
            sleep(self.config.viewport_poll_interval()).await;
        }
    }

    /// Handles one replacement-tier batch: re-attaches to any new container
    /// found among the added nodes.
    fn on_viewport_batch(
        &self,
        batch: &MutationBatch,
        attachment: &mut Option<Attachment>,
        deadline: &mut Option<Instant>,
    ) {
        let selector = &self.config.selectors.container;
        for &added in &batch.added {
            let container = if self.tree.matches(added, selector) {
                Some(added)
            } else {
                self.tree.query_first(added, selector)
            };
            if let Some(container) = container {
                if attachment.as_ref().is_some_and(|current| current.container == container) {
                    continue;
                }
                self.attach(container, attachment, deadline, ScanReason::ContainerReplaced);
            }
        }
    }

    /// Replays the cache onto a container generation and moves the
    /// insertion-tier subscription over to it.
    fn attach(
        &self,
        container: NodeId,
        attachment: &mut Option<Attachment>,
        deadline: &mut Option<Instant>,
        reason: ScanReason,
    ) {
        // Pure cache projection first: a recycled list redraws instantly,
        // with no fetch and no loader.
        let items = self.tree.query(container, &self.config.selectors.item);
        let mut uncached = false;
        for &item in &items {
            if self.projector.apply_entry(item) == ProjectionOutcome::NotCached {
                uncached = true;
            }
        }
        self.sink.record(&EngineEvent::CacheReplayed {
            scope: container,
            items: items.len(),
        });

        // Disconnect before re-subscribing to avoid duplicate delivery.
        if let Some(previous) = attachment.take() {
            previous.subscription.disconnect();
        }
        match self.feed.subscribe(container, false) {
            Ok(subscription) => {
                self.sink.record(&EngineEvent::ContainerAttached {
                    container,
                    visible_items: items.len(),
                });
                *attachment = Some(Attachment {
                    container,
                    subscription,
                });
            }
            // The container vanished between discovery and subscription;
            // the replacement tier will deliver its successor.
            Err(_) => *attachment = None,
        }

        if uncached {
            self.schedule_scan(deadline, reason);
        }
    }

    /// Handles one insertion-tier batch: projects added items immediately
    /// and debounce-schedules a scan when any of them is uncached.
    fn on_container_batch(&self, batch: &MutationBatch, deadline: &mut Option<Instant>) {
        let selector = &self.config.selectors.item;
        let mut uncached = false;
        for &added in &batch.added {
            let items = if self.tree.matches(added, selector) {
                vec![added]
            } else {
                self.tree.query(added, selector)
            };
            for item in items {
                if self.projector.apply_entry(item) == ProjectionOutcome::NotCached {
                    uncached = true;
                }
            }
        }
        if uncached {
            self.schedule_scan(deadline, ScanReason::ItemsInserted);
        }
    }

    /// (Re)starts the debounce timer; repeated bursts collapse into one scan.
    fn schedule_scan(&self, deadline: &mut Option<Instant>, reason: ScanReason) {
        *deadline = Some(Instant::now() + self.config.scan_debounce());
        self.sink.record(&EngineEvent::ScanScheduled { reason });
    }

    /// Snapshots the visible items and spawns a scan task over them. The
    /// scanner's in-flight guard drops the request when a scan is running.
    fn trigger_scan(&self, attachment: Option<&Attachment>) {
        let Some(attachment) = attachment else {
            return;
        };
        let items = self.tree.query(attachment.container, &self.config.selectors.item);
        let scanner = Arc::clone(&self.scanner);
        drop(tokio::spawn(async move {
            scanner.scan(items).await;
        }));
    }
}
