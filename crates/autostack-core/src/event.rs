#![forbid(unsafe_code)]

//! Signals that may change a box's rendered size.
//!
//! A host delivers these to observation callbacks. None of them carries a
//! size: receiving one only means "measure again".

use crate::observer::{NodeId, ObserveKinds};

/// An observation delivered to a subscriber.
#[derive(Debug, Clone, PartialEq)]
pub enum SizeEvent {
    /// The viewport was resized.
    Viewport {
        /// New viewport width.
        width: f64,
        /// New viewport height.
        height: f64,
    },

    /// Something in an observed subtree changed.
    Mutation(MutationRecord),
}

/// One change to a node in the host's tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    /// The node that changed. For child-list records this is the parent.
    pub target: NodeId,
    /// What changed.
    pub kind: MutationKind,
}

impl MutationRecord {
    /// Create a new record.
    #[must_use]
    pub fn new(target: NodeId, kind: MutationKind) -> Self {
        Self { target, kind }
    }
}

/// The category of a [`MutationRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationKind {
    /// An attribute changed.
    Attributes {
        /// Attribute name, e.g. `style`.
        name: String,
    },
    /// Children were inserted or removed.
    ChildList,
    /// Text content changed.
    CharacterData,
}

impl MutationKind {
    /// The observation flag that must be enabled to receive this kind.
    #[must_use]
    pub const fn flag(&self) -> ObserveKinds {
        match self {
            Self::Attributes { .. } => ObserveKinds::ATTRIBUTES,
            Self::ChildList => ObserveKinds::CHILD_LIST,
            Self::CharacterData => ObserveKinds::CHARACTER_DATA,
        }
    }

    /// Shorthand for a `style` attribute change.
    #[must_use]
    pub fn style() -> Self {
        Self::Attributes {
            name: "style".to_owned(),
        }
    }
}
