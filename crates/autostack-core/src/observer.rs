#![forbid(unsafe_code)]

//! Size-observation capability.
//!
//! Boxes never talk to a concrete host API. They receive an [`Environment`]
//! holding two injected capabilities:
//!
//! - [`Measure`] reads the current rendered size of a node.
//! - [`SizeObserver`] delivers [`SizeEvent`]s for a target until the
//!   subscription is released.
//!
//! Subscriptions are held through [`ObserverGuard`], which unsubscribes when
//! dropped. A host that cannot observe subtree mutations answers
//! [`ObserveError::Unsupported`] and callers fall back to viewport events.

use core::fmt;
use std::rc::Rc;

use bitflags::bitflags;

use crate::event::{MutationKind, SizeEvent};
use crate::geometry::BoxSize;

/// Identifier of a node in the host's tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

bitflags! {
    /// Mutation categories a subtree subscription listens for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ObserveKinds: u8 {
        /// Attribute changes (subject to the attribute filter).
        const ATTRIBUTES     = 0b001;
        /// Child insertion and removal.
        const CHILD_LIST     = 0b010;
        /// Text content changes.
        const CHARACTER_DATA = 0b100;
    }
}

impl Default for ObserveKinds {
    fn default() -> Self {
        Self::all()
    }
}

/// What a subtree subscription reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObserveOptions {
    /// Mutation categories to report.
    pub kinds: ObserveKinds,
    /// Also report mutations of descendants, not just the target itself.
    pub subtree: bool,
    /// Attribute names to report. Empty means every attribute.
    pub attribute_filter: Vec<String>,
}

impl Default for ObserveOptions {
    fn default() -> Self {
        Self {
            kinds: ObserveKinds::default(),
            subtree: true,
            attribute_filter: vec!["style".to_owned()],
        }
    }
}

impl ObserveOptions {
    /// Set the reported mutation categories.
    #[must_use]
    pub fn with_kinds(mut self, kinds: ObserveKinds) -> Self {
        self.kinds = kinds;
        self
    }

    /// Enable or disable descendant observation.
    #[must_use]
    pub fn with_subtree(mut self, subtree: bool) -> Self {
        self.subtree = subtree;
        self
    }

    /// Replace the attribute filter.
    #[must_use]
    pub fn with_attribute_filter<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attribute_filter = names.into_iter().map(Into::into).collect();
        self
    }

    /// Whether a mutation of `kind` should be delivered.
    #[must_use]
    pub fn accepts(&self, kind: &MutationKind) -> bool {
        if !self.kinds.contains(kind.flag()) {
            return false;
        }
        match kind {
            MutationKind::Attributes { name } => {
                self.attribute_filter.is_empty() || self.attribute_filter.iter().any(|f| f == name)
            }
            MutationKind::ChildList | MutationKind::CharacterData => true,
        }
    }
}

/// What to observe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObserveTarget {
    /// Global viewport resizes.
    Viewport,
    /// Mutations at or below `node`.
    Subtree {
        /// Root of the observed subtree.
        node: NodeId,
        /// Reporting options.
        options: ObserveOptions,
    },
}

/// Callback invoked for each delivered event.
pub type ChangeCallback = Rc<dyn Fn(&SizeEvent)>;

/// Opaque token identifying one live subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionHandle(pub u64);

/// Why a subscription could not be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObserveError {
    /// The host has no such observation capability.
    Unsupported(&'static str),
    /// The target node does not exist.
    UnknownNode(NodeId),
}

impl fmt::Display for ObserveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported(what) => write!(f, "unsupported: {what}"),
            Self::UnknownNode(node) => write!(f, "unknown node {node}"),
        }
    }
}

impl std::error::Error for ObserveError {}

/// Delivers size-change signals for a target.
///
/// Implementations must not call `on_change` for a handle after
/// [`unsubscribe`](SizeObserver::unsubscribe) returns, and must deliver
/// events for one target in the order they occurred.
pub trait SizeObserver {
    /// Start delivering events for `target`.
    fn subscribe(
        &self,
        target: ObserveTarget,
        on_change: ChangeCallback,
    ) -> Result<SubscriptionHandle, ObserveError>;

    /// Stop delivering events for `handle`. Unknown handles are ignored.
    fn unsubscribe(&self, handle: SubscriptionHandle);
}

/// Reads a node's current rendered size.
pub trait Measure {
    /// Bounding size of `node`, or `None` when it is not attached.
    fn measure(&self, node: NodeId) -> Option<BoxSize>;
}

/// The capabilities a box needs from its host.
#[derive(Clone)]
pub struct Environment {
    /// Size reader.
    pub measure: Rc<dyn Measure>,
    /// Change notifier.
    pub observer: Rc<dyn SizeObserver>,
}

impl Environment {
    /// Bundle a measurer and an observer.
    pub fn new(measure: Rc<dyn Measure>, observer: Rc<dyn SizeObserver>) -> Self {
        Self { measure, observer }
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment").finish_non_exhaustive()
    }
}

/// A subscription that is released when the guard is dropped.
pub struct ObserverGuard {
    observer: Rc<dyn SizeObserver>,
    handle: Option<SubscriptionHandle>,
}

impl ObserverGuard {
    /// Subscribe and wrap the resulting handle.
    pub fn subscribe(
        observer: Rc<dyn SizeObserver>,
        target: ObserveTarget,
        on_change: ChangeCallback,
    ) -> Result<Self, ObserveError> {
        let handle = observer.subscribe(target, on_change)?;
        Ok(Self {
            observer,
            handle: Some(handle),
        })
    }

    /// The live handle, or `None` once released.
    #[must_use]
    pub fn handle(&self) -> Option<SubscriptionHandle> {
        self.handle
    }

    /// Release the subscription now. Further calls do nothing.
    pub fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            crate::trace!(handle = handle.0, "releasing size subscription");
            self.observer.unsubscribe(handle);
        }
    }
}

impl Drop for ObserverGuard {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for ObserverGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverGuard")
            .field("handle", &self.handle)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        next: RefCell<u64>,
        live: RefCell<Vec<u64>>,
        unsupported_subtree: bool,
    }

    impl SizeObserver for Recorder {
        fn subscribe(
            &self,
            target: ObserveTarget,
            _on_change: ChangeCallback,
        ) -> Result<SubscriptionHandle, ObserveError> {
            if self.unsupported_subtree && matches!(target, ObserveTarget::Subtree { .. }) {
                return Err(ObserveError::Unsupported("mutation observer"));
            }
            let mut next = self.next.borrow_mut();
            *next += 1;
            self.live.borrow_mut().push(*next);
            Ok(SubscriptionHandle(*next))
        }

        fn unsubscribe(&self, handle: SubscriptionHandle) {
            self.live.borrow_mut().retain(|h| *h != handle.0);
        }
    }

    fn noop() -> ChangeCallback {
        Rc::new(|_: &SizeEvent| {})
    }

    #[test]
    fn default_options_watch_everything_with_style_filter() {
        let opts = ObserveOptions::default();
        assert!(opts.subtree);
        assert_eq!(opts.kinds, ObserveKinds::all());
        assert!(opts.accepts(&MutationKind::style()));
        assert!(!opts.accepts(&MutationKind::Attributes {
            name: "class".into()
        }));
        assert!(opts.accepts(&MutationKind::ChildList));
        assert!(opts.accepts(&MutationKind::CharacterData));
    }

    #[test]
    fn empty_filter_accepts_any_attribute() {
        let opts = ObserveOptions::default().with_attribute_filter(Vec::<String>::new());
        assert!(opts.accepts(&MutationKind::Attributes {
            name: "class".into()
        }));
    }

    #[test]
    fn disabled_kind_is_rejected() {
        let opts = ObserveOptions::default().with_kinds(ObserveKinds::ATTRIBUTES);
        assert!(!opts.accepts(&MutationKind::ChildList));
        assert!(!opts.accepts(&MutationKind::CharacterData));
        assert!(opts.accepts(&MutationKind::style()));
    }

    #[test]
    fn guard_unsubscribes_on_drop() {
        let recorder = Rc::new(Recorder::default());
        let observer: Rc<dyn SizeObserver> = recorder.clone();
        {
            let guard = ObserverGuard::subscribe(observer, ObserveTarget::Viewport, noop())
                .expect("viewport is supported");
            assert_eq!(guard.handle(), Some(SubscriptionHandle(1)));
            assert_eq!(recorder.live.borrow().as_slice(), &[1]);
        }
        assert!(recorder.live.borrow().is_empty());
    }

    #[test]
    fn release_is_idempotent() {
        let recorder = Rc::new(Recorder::default());
        let mut guard =
            ObserverGuard::subscribe(recorder.clone(), ObserveTarget::Viewport, noop()).unwrap();
        guard.release();
        guard.release();
        assert_eq!(guard.handle(), None);
        drop(guard);
        assert!(recorder.live.borrow().is_empty());
    }

    #[test]
    fn unsupported_target_surfaces_error() {
        let recorder = Rc::new(Recorder {
            unsupported_subtree: true,
            ..Recorder::default()
        });
        let err = ObserverGuard::subscribe(
            recorder.clone(),
            ObserveTarget::Subtree {
                node: NodeId(7),
                options: ObserveOptions::default(),
            },
            noop(),
        )
        .unwrap_err();
        assert_eq!(err, ObserveError::Unsupported("mutation observer"));
        assert_eq!(err.to_string(), "unsupported: mutation observer");
        assert!(recorder.live.borrow().is_empty());
    }
}
