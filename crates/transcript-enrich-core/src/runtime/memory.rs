// transcript-enrich-core/src/runtime/memory.rs
// ============================================================================
// Module: In-Memory Host Fakes
// Description: Deterministic tree, feed, and translator implementations.
// Purpose: Exercise the engine in tests and examples without a real host.
// Dependencies: crate::interfaces, tokio
// ============================================================================

//! ## Overview
//! This module provides in-memory implementations of the host collaborator
//! traits: a small render tree with class/attribute selector matching, a
//! mutation feed driven by explicit `publish` calls, and a translator backed
//! by a fixed table. They are deterministic and intended for tests and local
//! demos, not production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::unbounded_channel;

use crate::interfaces::MutationBatch;
use crate::interfaces::MutationFeed;
use crate::interfaces::MutationSubscription;
use crate::interfaces::NodeId;
use crate::interfaces::NodeSpec;
use crate::interfaces::TranscriptTree;
use crate::interfaces::TranslateError;
use crate::interfaces::Translation;
use crate::interfaces::Translator;
use crate::interfaces::TreeError;

// ============================================================================
// SECTION: Selector Parsing
// ============================================================================

/// Parsed form of the selector subset the memory tree understands:
/// an optional tag, any number of `.class` terms, and one `[attr="value"]`.
#[derive(Debug, Default)]
struct Selector {
    /// Required tag name, when present.
    tag: Option<String>,
    /// Required class names.
    classes: Vec<String>,
    /// Required attribute equality, when present.
    attribute: Option<(String, String)>,
}

impl Selector {
    /// Parses a selector string. Unsupported syntax degrades to a selector
    /// that matches nothing, mirroring a host that knows no such structure.
    fn parse(selector: &str) -> Self {
        let mut parsed = Self::default();
        let mut rest = selector.trim();

        if let Some(open) = rest.find('[') {
            let Some(close) = rest.rfind(']') else {
                return Self::default();
            };
            let body = &rest[open + 1..close];
            if let Some((name, value)) = body.split_once('=') {
                let value = value.trim_matches('"').to_string();
                parsed.attribute = Some((name.trim().to_string(), value));
            }
            rest = &rest[..open];
        }

        let mut parts = rest.split('.');
        if let Some(tag) = parts.next() {
            if !tag.is_empty() {
                parsed.tag = Some(tag.to_string());
            }
        }
        for class in parts {
            if !class.is_empty() {
                parsed.classes.push(class.to_string());
            }
        }
        parsed
    }

    /// Returns whether a node satisfies every term of the selector.
    fn matches(&self, node: &NodeData) -> bool {
        if self.tag.is_none() && self.classes.is_empty() && self.attribute.is_none() {
            return false;
        }
        if let Some(tag) = &self.tag {
            if node.tag != *tag {
                return false;
            }
        }
        for class in &self.classes {
            if !node.classes.contains(class) {
                return false;
            }
        }
        if let Some((name, value)) = &self.attribute {
            if node.attributes.get(name) != Some(value) {
                return false;
            }
        }
        true
    }
}

// ============================================================================
// SECTION: Memory Tree
// ============================================================================

/// One node's stored state.
#[derive(Debug, Clone)]
struct NodeData {
    /// Tag name (`div` for engine-appended nodes).
    tag: String,
    /// Class names on the node.
    classes: HashSet<String>,
    /// Attribute map.
    attributes: BTreeMap<String, String>,
    /// Direct text content.
    text: String,
    /// Child handles in document order.
    children: Vec<NodeId>,
    /// Parent handle; `None` only for the root.
    parent: Option<NodeId>,
}

/// Mutable tree storage behind the lock.
#[derive(Debug)]
struct TreeInner {
    /// Node storage keyed by raw handle.
    nodes: HashMap<u64, NodeData>,
    /// Next handle to hand out.
    next_id: u64,
}

/// In-memory render tree for tests and examples.
#[derive(Debug)]
pub struct MemoryTree {
    /// Tree storage protected by a mutex.
    inner: Mutex<TreeInner>,
}

/// Handle of the implicit root node.
const ROOT: NodeId = NodeId::from_raw(0);

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTree {
    /// Creates a tree holding only the root node.
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            ROOT.raw(),
            NodeData {
                tag: "body".to_string(),
                classes: HashSet::new(),
                attributes: BTreeMap::new(),
                text: String::new(),
                children: Vec::new(),
                parent: None,
            },
        );
        Self {
            inner: Mutex::new(TreeInner { nodes, next_id: 1 }),
        }
    }

    /// Locks the storage, recovering from a poisoned lock: test fakes keep
    /// serving their last coherent state rather than cascading panics.
    fn lock(&self) -> MutexGuard<'_, TreeInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Creates an element under `parent` and returns its handle.
    ///
    /// `classes` is space-separated. Intended for test fixtures; engine code
    /// only mutates the tree through [`TranscriptTree`].
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::Detached`] when `parent` is unknown.
    pub fn create_element(
        &self,
        parent: NodeId,
        tag: &str,
        classes: &str,
        text: &str,
    ) -> Result<NodeId, TreeError> {
        let mut inner = self.lock();
        if !inner.nodes.contains_key(&parent.raw()) {
            return Err(TreeError::Detached(parent));
        }
        let id = NodeId::from_raw(inner.next_id);
        inner.next_id += 1;
        inner.nodes.insert(
            id.raw(),
            NodeData {
                tag: tag.to_string(),
                classes: classes.split_whitespace().map(str::to_string).collect(),
                attributes: BTreeMap::new(),
                text: text.to_string(),
                children: Vec::new(),
                parent: Some(parent),
            },
        );
        if let Some(parent_data) = inner.nodes.get_mut(&parent.raw()) {
            parent_data.children.push(id);
        }
        Ok(id)
    }

    /// Sets an attribute on a node. Unknown nodes are ignored.
    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        let mut inner = self.lock();
        if let Some(data) = inner.nodes.get_mut(&node.raw()) {
            data.attributes.insert(name.to_string(), value.to_string());
        }
    }

    /// Replaces a node's direct text content. Unknown nodes are ignored.
    pub fn set_text(&self, node: NodeId, text: &str) {
        let mut inner = self.lock();
        if let Some(data) = inner.nodes.get_mut(&node.raw()) {
            data.text = text.to_string();
        }
    }

    /// Returns the class set of a node, for assertions.
    #[must_use]
    pub fn classes_of(&self, node: NodeId) -> Vec<String> {
        let inner = self.lock();
        inner
            .nodes
            .get(&node.raw())
            .map(|data| {
                let mut classes: Vec<String> = data.classes.iter().cloned().collect();
                classes.sort();
                classes
            })
            .unwrap_or_default()
    }

    /// Returns the direct text content of a node, for assertions.
    #[must_use]
    pub fn text_of(&self, node: NodeId) -> String {
        let inner = self.lock();
        inner.nodes.get(&node.raw()).map(|data| data.text.clone()).unwrap_or_default()
    }

    /// Collects `scope`'s descendants matching `selector` in document order.
    fn collect(
        inner: &TreeInner,
        scope: NodeId,
        selector: &Selector,
        out: &mut Vec<NodeId>,
        include_self: bool,
    ) {
        let Some(data) = inner.nodes.get(&scope.raw()) else {
            return;
        };
        if include_self && selector.matches(data) {
            out.push(scope);
        }
        for &child in &data.children {
            Self::collect(inner, child, selector, out, true);
        }
    }

    /// Gathers text below `node`, skipping subtrees matching `excluded`.
    fn gather_text(
        inner: &TreeInner,
        node: NodeId,
        excluded: &[Selector],
        out: &mut Vec<String>,
        is_scope: bool,
    ) {
        let Some(data) = inner.nodes.get(&node.raw()) else {
            return;
        };
        if !is_scope && excluded.iter().any(|selector| selector.matches(data)) {
            return;
        }
        let text = data.text.trim();
        if !text.is_empty() {
            out.push(text.to_string());
        }
        for &child in &data.children {
            Self::gather_text(inner, child, excluded, out, false);
        }
    }

    /// Deletes a subtree from storage.
    fn delete_subtree(inner: &mut TreeInner, node: NodeId) {
        if let Some(data) = inner.nodes.remove(&node.raw()) {
            for child in data.children {
                Self::delete_subtree(inner, child);
            }
        }
    }
}

impl TranscriptTree for MemoryTree {
    fn root(&self) -> NodeId {
        ROOT
    }

    fn query(&self, scope: NodeId, selector: &str) -> Vec<NodeId> {
        let parsed = Selector::parse(selector);
        let inner = self.lock();
        let mut out = Vec::new();
        Self::collect(&inner, scope, &parsed, &mut out, false);
        out
    }

    fn query_first(&self, scope: NodeId, selector: &str) -> Option<NodeId> {
        self.query(scope, selector).into_iter().next()
    }

    fn matches(&self, node: NodeId, selector: &str) -> bool {
        let parsed = Selector::parse(selector);
        let inner = self.lock();
        inner.nodes.get(&node.raw()).is_some_and(|data| parsed.matches(data))
    }

    fn is_attached(&self, node: NodeId) -> bool {
        let inner = self.lock();
        let mut current = node;
        loop {
            if current == ROOT {
                return true;
            }
            match inner.nodes.get(&current.raw()).and_then(|data| data.parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    fn text_excluding(&self, node: NodeId, excluded: &[String]) -> String {
        let parsed: Vec<Selector> = excluded.iter().map(|s| Selector::parse(s)).collect();
        let inner = self.lock();
        let mut out = Vec::new();
        Self::gather_text(&inner, node, &parsed, &mut out, true);
        out.join(" ")
    }

    fn append(&self, parent: NodeId, spec: &NodeSpec) -> Result<NodeId, TreeError> {
        {
            let inner = self.lock();
            if !inner.nodes.contains_key(&parent.raw()) {
                return Err(TreeError::Detached(parent));
            }
        }
        let node = self.create_element(parent, "div", &spec.class_name, "")?;
        if let Some(title) = &spec.title {
            self.set_attribute(node, "title", title);
        }
        for child in &spec.children {
            self.append(node, child)?;
        }
        // Children render before the node's own text, matching how the
        // engine lays out badge-then-translation.
        self.set_text(node, &spec.text);
        Ok(node)
    }

    fn remove(&self, node: NodeId) -> Result<(), TreeError> {
        let mut inner = self.lock();
        let Some(parent) = inner.nodes.get(&node.raw()).and_then(|data| data.parent) else {
            // Already detached or unknown; removal is a no-op by contract.
            return Ok(());
        };
        if let Some(parent_data) = inner.nodes.get_mut(&parent.raw()) {
            parent_data.children.retain(|&child| child != node);
        }
        Self::delete_subtree(&mut inner, node);
        Ok(())
    }
}

// ============================================================================
// SECTION: Memory Feed
// ============================================================================

/// One registered subscription.
#[derive(Debug)]
struct FeedEntry {
    /// Subscribed scope.
    scope: NodeId,
    /// Whether descendant insertions are reported.
    descendants: bool,
    /// Delivery channel into the subscription.
    sender: UnboundedSender<MutationBatch>,
}

/// In-memory mutation feed driven by explicit `publish` calls.
#[derive(Debug, Default)]
pub struct MemoryFeed {
    /// Registered subscriptions.
    entries: Mutex<Vec<FeedEntry>>,
}

impl MemoryFeed {
    /// Creates a feed with no subscriptions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the subscription table, recovering from poisoning.
    fn lock(&self) -> MutexGuard<'_, Vec<FeedEntry>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Delivers one batch to every live subscription on `scope`.
    pub fn publish(&self, scope: NodeId, added: Vec<NodeId>) {
        let mut entries = self.lock();
        entries.retain(|entry| !entry.sender.is_closed());
        let batch = MutationBatch { added };
        for entry in entries.iter() {
            if entry.scope == scope {
                let _ = entry.sender.send(batch.clone());
            }
        }
    }

    /// Returns the live subscriptions as `(scope, descendants)` pairs, for
    /// assertions on attach/detach behavior.
    #[must_use]
    pub fn subscriptions(&self) -> Vec<(NodeId, bool)> {
        let mut entries = self.lock();
        entries.retain(|entry| !entry.sender.is_closed());
        entries.iter().map(|entry| (entry.scope, entry.descendants)).collect()
    }
}

impl MutationFeed for MemoryFeed {
    fn subscribe(
        &self,
        scope: NodeId,
        descendants: bool,
    ) -> Result<MutationSubscription, TreeError> {
        let (sender, receiver) = unbounded_channel();
        self.lock().push(FeedEntry {
            scope,
            descendants,
            sender,
        });
        Ok(MutationSubscription::new(receiver))
    }
}

// ============================================================================
// SECTION: Static Translator
// ============================================================================

/// Translator backed by a fixed table, for tests and examples.
///
/// Unmapped text is echoed back unchanged (the provider's way of saying the
/// text is already in the target language); texts registered as failing
/// return a transport error.
#[derive(Debug, Default)]
pub struct StaticTranslator {
    /// Source-text-to-translation table.
    table: HashMap<String, Translation>,
    /// Source texts whose calls fail with a transport error.
    failing: HashSet<String>,
    /// Number of translate calls issued.
    calls: AtomicUsize,
}

impl StaticTranslator {
    /// Creates an empty (echo-everything) translator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a translation for `source`.
    #[must_use]
    pub fn with_translation(mut self, source: &str, text: &str, detected_language: &str) -> Self {
        self.table.insert(
            source.to_string(),
            Translation {
                text: text.to_string(),
                detected_language: detected_language.to_string(),
            },
        );
        self
    }

    /// Registers `source` as failing with a transport error.
    #[must_use]
    pub fn failing_on(mut self, source: &str) -> Self {
        self.failing.insert(source.to_string());
        self
    }

    /// Returns how many translate calls were issued.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Translator for StaticTranslator {
    async fn translate(&self, text: &str) -> Result<Translation, TranslateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(text) {
            return Err(TranslateError::Transport("connection reset".to_string()));
        }
        Ok(self.table.get(text).cloned().unwrap_or_else(|| Translation {
            text: text.to_string(),
            detected_language: "en".to_string(),
        }))
    }
}
