// transcript-enrich-core/src/interfaces/mod.rs
// ============================================================================
// Module: Transcript Enrich Interfaces
// Description: Host-agnostic interfaces for translation, tree access, and
//              change notification.
// Purpose: Define the contract surfaces used by the enrichment runtime.
// Dependencies: tokio, async-trait, serde, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the enrichment engine integrates with its host
//! environment without embedding host-specific details. The render tree, the
//! change-notification primitive, and the translation provider are external
//! collaborators; the engine only ever sees them through these traits.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;

// ============================================================================
// SECTION: Node Identity
// ============================================================================

/// Opaque handle to a node in the host render tree.
///
/// Handles are assigned by the [`TranscriptTree`] implementation. A handle
/// identifies a node object, not its content: the host framework recycles
/// wrappers, so two visually identical items may carry different handles
/// across renders, and a handle may refer to a detached node at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    /// Creates a node handle from a raw identifier.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

// ============================================================================
// SECTION: Render Tree
// ============================================================================

/// Description of a node subtree to append into the render tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSpec {
    /// Class attribute for the new node.
    pub class_name: String,
    /// Direct text content of the new node.
    pub text: String,
    /// Optional title attribute (hover text).
    pub title: Option<String>,
    /// Child nodes appended in order before the text content.
    pub children: Vec<NodeSpec>,
}

impl NodeSpec {
    /// Creates a leaf node spec with a class and text content.
    #[must_use]
    pub fn leaf(class_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            text: text.into(),
            title: None,
            children: Vec::new(),
        }
    }
}

/// Render tree errors.
#[derive(Debug, Error)]
pub enum TreeError {
    /// The referenced node is no longer attached to the tree.
    #[error("{0} is no longer attached to the render tree")]
    Detached(NodeId),
    /// The tree backend rejected a mutation.
    #[error("render tree mutation failed: {0}")]
    Mutation(String),
}

/// Host render tree query and mutation primitives.
///
/// Selectors are opaque strings interpreted by the implementation; the engine
/// only passes through the strings it was configured with. `query` results
/// are returned in document order.
pub trait TranscriptTree: Send + Sync {
    /// Returns the tree root handle.
    fn root(&self) -> NodeId;

    /// Returns all descendants of `scope` matching `selector`, in document
    /// order. A detached or unknown scope yields an empty result.
    fn query(&self, scope: NodeId, selector: &str) -> Vec<NodeId>;

    /// Returns the first descendant of `scope` matching `selector`.
    fn query_first(&self, scope: NodeId, selector: &str) -> Option<NodeId>;

    /// Returns whether `node` itself matches `selector`.
    fn matches(&self, node: NodeId, selector: &str) -> bool;

    /// Returns whether `node` is currently attached under the tree root.
    fn is_attached(&self, node: NodeId) -> bool;

    /// Returns the concatenated text content of `node`, excluding the
    /// subtrees of any descendant matching one of `excluded`.
    fn text_excluding(&self, node: NodeId, excluded: &[String]) -> String;

    /// Appends a new subtree described by `spec` as the last child of
    /// `parent` and returns the new node's handle.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError`] when `parent` is detached or the backend rejects
    /// the mutation.
    fn append(&self, parent: NodeId, spec: &NodeSpec) -> Result<NodeId, TreeError>;

    /// Removes `node` from the tree. Removing an already-detached node is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError`] when the backend rejects the mutation.
    fn remove(&self, node: NodeId) -> Result<(), TreeError>;
}

// ============================================================================
// SECTION: Mutation Feed
// ============================================================================

/// One coalesced batch of change notifications.
///
/// The host notification mechanism delivers added nodes in bursts; a batch
/// carries every node added since the previous delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationBatch {
    /// Nodes added under the subscribed scope, in document order.
    pub added: Vec<NodeId>,
}

/// Live subscription to a node's mutation batches.
///
/// A subscription must be disconnected before re-subscribing to the same
/// scope, otherwise batches are delivered twice.
#[derive(Debug)]
pub struct MutationSubscription {
    /// Channel carrying coalesced batches from the host.
    batches: UnboundedReceiver<MutationBatch>,
}

impl MutationSubscription {
    /// Wraps a receiver handed out by a [`MutationFeed`] implementation.
    #[must_use]
    pub const fn new(batches: UnboundedReceiver<MutationBatch>) -> Self {
        Self { batches }
    }

    /// Waits for the next batch. Returns `None` once the feed side is gone.
    pub async fn next_batch(&mut self) -> Option<MutationBatch> {
        self.batches.recv().await
    }

    /// Disconnects the subscription. Batches queued but not yet read are
    /// dropped.
    pub fn disconnect(mut self) {
        self.batches.close();
    }
}

/// Host change-notification primitive for the render tree.
pub trait MutationFeed: Send + Sync {
    /// Subscribes to node insertions under `scope`. With `descendants` set,
    /// insertions anywhere in the subtree are reported; otherwise only
    /// direct children.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::Detached`] when `scope` is not attached.
    fn subscribe(&self, scope: NodeId, descendants: bool)
    -> Result<MutationSubscription, TreeError>;
}

// ============================================================================
// SECTION: Translator
// ============================================================================

/// A successful translation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    /// Translated text in the target language.
    pub text: String,
    /// Detected source language code (lowercase, e.g. `"es"`).
    pub detected_language: String,
}

/// Translation provider errors.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// The provider could not be reached or the transport failed mid-call.
    #[error("translate transport error: {0}")]
    Transport(String),
    /// The provider answered with a response the decoder does not accept.
    #[error("malformed translate response: {0}")]
    Malformed(String),
}

/// Remote translation provider.
///
/// One invocation is one network round trip; the engine never batches.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translates `text` into the provider's fixed target language.
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError`] when the call fails or the response cannot
    /// be decoded.
    async fn translate(&self, text: &str) -> Result<Translation, TranslateError>;
}
