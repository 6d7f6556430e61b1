#![forbid(unsafe_code)]

//! Headless document.
//!
//! A small, host-driven stand-in for a browser page: a node tree with inline
//! styles and text, named containers, a viewport, and an observer registry.
//!
//! # Layout model
//!
//! - Every connected node is as wide as the viewport.
//! - A node's height is its `height` style if set, otherwise one
//!   [`TEXT_LINE_HEIGHT`] per line of its own text plus the heights of its
//!   in-flow children.
//! - Children styled `display: none` or `position: absolute` are out of flow.
//!   A `display: none` node measures as zero.
//!
//! # Delivery
//!
//! Mutations and viewport changes are queued, never delivered while the
//! change is being made. [`Document::flush`] delivers the queue in order.
//! Changes that leave the document as it was queue nothing.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::rc::Rc;

use autostack_core::{
    BoxSize, ChangeCallback, Measure, MutationKind, MutationRecord, NodeId, ObserveError,
    ObserveTarget, SizeEvent, SizeObserver, SubscriptionHandle,
};

/// Height contributed by each line of a node's own text.
pub const TEXT_LINE_HEIGHT: f64 = 22.0;

#[derive(Debug, Default)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    style: BTreeMap<String, String>,
    text: String,
    container: bool,
}

impl Node {
    fn style_is(&self, key: &str, value: &str) -> bool {
        self.style.get(key).is_some_and(|v| v == value)
    }

    fn hidden(&self) -> bool {
        self.style_is("display", "none")
    }

    fn in_flow(&self) -> bool {
        !self.hidden() && !self.style_is("position", "absolute")
    }

    fn fixed_height(&self) -> Option<f64> {
        let raw = self.style.get("height")?;
        raw.trim().trim_end_matches("px").trim().parse::<f64>().ok()
    }
}

struct Subscription {
    target: ObserveTarget,
    callback: ChangeCallback,
}

#[derive(Default)]
struct Inner {
    nodes: Vec<Node>,
    containers: BTreeMap<String, NodeId>,
    viewport: (f64, f64),
    subscriptions: BTreeMap<SubscriptionHandle, Subscription>,
    next_handle: u64,
    queue: VecDeque<SizeEvent>,
}

impl Inner {
    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0 as usize)
    }

    fn create(&mut self, container: bool) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            container,
            ..Node::default()
        });
        id
    }

    fn mutated(&mut self, target: NodeId, kind: MutationKind) {
        self.queue
            .push_back(SizeEvent::Mutation(MutationRecord::new(target, kind)));
    }

    /// Whether `ancestor` is a proper ancestor of `node`.
    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = self.node(node).and_then(|n| n.parent);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.node(id).and_then(|n| n.parent);
        }
        false
    }

    fn is_connected(&self, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            let Some(n) = self.node(id) else {
                return false;
            };
            if n.container {
                return true;
            }
            cursor = n.parent;
        }
        false
    }

    fn height_of(&self, id: NodeId) -> f64 {
        let Some(node) = self.node(id) else {
            return 0.0;
        };
        if node.hidden() {
            return 0.0;
        }
        if let Some(height) = node.fixed_height() {
            return height;
        }
        let text = node.text.lines().count() as f64 * TEXT_LINE_HEIGHT;
        let children: f64 = node
            .children
            .iter()
            .filter(|c| self.node(**c).is_some_and(Node::in_flow))
            .map(|c| self.height_of(*c))
            .sum();
        text + children
    }

    fn wants(&self, target: &ObserveTarget, event: &SizeEvent) -> bool {
        match (target, event) {
            (ObserveTarget::Viewport, SizeEvent::Viewport { .. }) => true,
            (ObserveTarget::Subtree { node, options }, SizeEvent::Mutation(record)) => {
                options.accepts(&record.kind)
                    && (record.target == *node
                        || (options.subtree && self.is_ancestor(*node, record.target)))
            }
            _ => false,
        }
    }

    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.node(child).and_then(|n| n.parent) else {
            return;
        };
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|c| *c != child);
        }
        if let Some(c) = self.node_mut(child) {
            c.parent = None;
        }
        self.mutated(parent, MutationKind::ChildList);
    }
}

/// A headless, host-driven document.
pub struct Document {
    inner: RefCell<Inner>,
    mutation_observer: bool,
    resize_observer: bool,
}

impl Document {
    /// Create a document with the given viewport.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            inner: RefCell::new(Inner {
                viewport: (width, height),
                ..Inner::default()
            }),
            mutation_observer: true,
            resize_observer: true,
        }
    }

    /// Model a host without mutation observation.
    #[must_use]
    pub fn without_mutation_observer(mut self) -> Self {
        self.mutation_observer = false;
        self
    }

    /// Model a host without viewport resize observation.
    #[must_use]
    pub fn without_resize_observer(mut self) -> Self {
        self.resize_observer = false;
        self
    }

    /// Whether subtree subscriptions are available.
    #[must_use]
    pub fn supports_mutation_observer(&self) -> bool {
        self.mutation_observer
    }

    /// Create a detached element.
    pub fn create_element(&self) -> NodeId {
        self.inner.borrow_mut().create(false)
    }

    /// Create a named attachment point. Containers are always connected.
    pub fn create_container(&self, name: impl Into<String>) -> NodeId {
        let mut inner = self.inner.borrow_mut();
        let id = inner.create(true);
        inner.containers.insert(name.into(), id);
        id
    }

    /// Look up a container by name.
    #[must_use]
    pub fn container(&self, name: &str) -> Option<NodeId> {
        self.inner.borrow().containers.get(name).copied()
    }

    /// Append `child` to `parent`, moving it if it is attached elsewhere.
    ///
    /// Returns `false` if either node is unknown or the move would create
    /// a cycle.
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.node(parent).is_none()
            || inner.node(child).is_none()
            || parent == child
            || inner.is_ancestor(child, parent)
        {
            return false;
        }
        inner.detach(child);
        if let Some(p) = inner.node_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = inner.node_mut(child) {
            c.parent = Some(parent);
        }
        inner.mutated(parent, MutationKind::ChildList);
        true
    }

    /// Remove `child` from `parent`. Returns `false` if it is not a child.
    pub fn remove_child(&self, parent: NodeId, child: NodeId) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.node(child).and_then(|n| n.parent) != Some(parent) {
            return false;
        }
        inner.detach(child);
        true
    }

    /// Children of `node`, in order.
    #[must_use]
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.inner
            .borrow()
            .node(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Parent of `node`.
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.inner.borrow().node(node).and_then(|n| n.parent)
    }

    /// Set one inline style property. Returns whether it changed.
    pub fn set_style(&self, node: NodeId, key: &str, value: impl Into<String>) -> bool {
        let value = value.into();
        let mut inner = self.inner.borrow_mut();
        let Some(n) = inner.node_mut(node) else {
            return false;
        };
        if n.style.get(key) == Some(&value) {
            return false;
        }
        n.style.insert(key.to_owned(), value);
        inner.mutated(node, MutationKind::style());
        true
    }

    /// Remove one inline style property. Returns whether it was set.
    pub fn remove_style(&self, node: NodeId, key: &str) -> bool {
        let mut inner = self.inner.borrow_mut();
        let Some(n) = inner.node_mut(node) else {
            return false;
        };
        if n.style.remove(key).is_none() {
            return false;
        }
        inner.mutated(node, MutationKind::style());
        true
    }

    /// Read one inline style property.
    #[must_use]
    pub fn style(&self, node: NodeId, key: &str) -> Option<String> {
        self.inner
            .borrow()
            .node(node)
            .and_then(|n| n.style.get(key).cloned())
    }

    /// Set a node's own text. Returns whether it changed.
    pub fn set_text(&self, node: NodeId, text: impl Into<String>) -> bool {
        let text = text.into();
        let mut inner = self.inner.borrow_mut();
        let Some(n) = inner.node_mut(node) else {
            return false;
        };
        if n.text == text {
            return false;
        }
        n.text = text;
        inner.mutated(node, MutationKind::CharacterData);
        true
    }

    /// A node's own text.
    #[must_use]
    pub fn text(&self, node: NodeId) -> String {
        self.inner
            .borrow()
            .node(node)
            .map(|n| n.text.clone())
            .unwrap_or_default()
    }

    /// Resize the viewport. Returns whether it changed.
    pub fn resize_viewport(&self, width: f64, height: f64) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.viewport == (width, height) {
            return false;
        }
        inner.viewport = (width, height);
        inner.queue.push_back(SizeEvent::Viewport { width, height });
        true
    }

    /// Current viewport `(width, height)`.
    #[must_use]
    pub fn viewport(&self) -> (f64, f64) {
        self.inner.borrow().viewport
    }

    /// Whether `node` hangs off a container.
    #[must_use]
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.inner.borrow().is_connected(node)
    }

    /// Number of queued, undelivered events.
    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.inner.borrow().queue.len()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn live_subscriptions(&self) -> usize {
        self.inner.borrow().subscriptions.len()
    }

    /// Deliver queued events, in order, to every matching subscription.
    ///
    /// Events queued by callbacks are delivered in the same flush. A
    /// subscription released during the flush receives nothing further.
    /// Returns the number of events drained.
    pub fn flush(&self) -> usize {
        let mut drained = 0;
        loop {
            let Some(event) = self.inner.borrow_mut().queue.pop_front() else {
                break;
            };
            drained += 1;
            let targets: Vec<(SubscriptionHandle, ChangeCallback)> = {
                let inner = self.inner.borrow();
                inner
                    .subscriptions
                    .iter()
                    .filter(|(_, sub)| inner.wants(&sub.target, &event))
                    .map(|(handle, sub)| (*handle, Rc::clone(&sub.callback)))
                    .collect()
            };
            tracing::trace!(?event, listeners = targets.len(), "delivering");
            for (handle, callback) in targets {
                if !self.inner.borrow().subscriptions.contains_key(&handle) {
                    continue;
                }
                callback(&event);
            }
        }
        drained
    }
}

impl Measure for Document {
    fn measure(&self, node: NodeId) -> Option<BoxSize> {
        let inner = self.inner.borrow();
        if !inner.is_connected(node) {
            return None;
        }
        if inner.node(node).is_some_and(Node::hidden) {
            return Some(BoxSize::ZERO);
        }
        Some(BoxSize::new(inner.viewport.0, inner.height_of(node)))
    }
}

impl SizeObserver for Document {
    fn subscribe(
        &self,
        target: ObserveTarget,
        on_change: ChangeCallback,
    ) -> Result<SubscriptionHandle, ObserveError> {
        let mut inner = self.inner.borrow_mut();
        match &target {
            ObserveTarget::Viewport if !self.resize_observer => {
                return Err(ObserveError::Unsupported("resize observer"));
            }
            ObserveTarget::Subtree { .. } if !self.mutation_observer => {
                return Err(ObserveError::Unsupported("mutation observer"));
            }
            ObserveTarget::Subtree { node, .. } if inner.node(*node).is_none() => {
                return Err(ObserveError::UnknownNode(*node));
            }
            _ => {}
        }
        inner.next_handle += 1;
        let handle = SubscriptionHandle(inner.next_handle);
        inner.subscriptions.insert(
            handle,
            Subscription {
                target,
                callback: on_change,
            },
        );
        Ok(handle)
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) {
        self.inner.borrow_mut().subscriptions.remove(&handle);
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Document")
            .field("nodes", &inner.nodes.len())
            .field("viewport", &inner.viewport)
            .field("subscriptions", &inner.subscriptions.len())
            .field("pending", &inner.queue.len())
            .field("mutation_observer", &self.mutation_observer)
            .field("resize_observer", &self.resize_observer)
            .finish()
    }
}
