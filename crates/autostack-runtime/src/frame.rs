#![forbid(unsafe_code)]

//! View output.
//!
//! A [`Frame`] lists, in stack order, where each box should be drawn and
//! the debug label it carries. Hosts diff consecutive frames and touch only
//! the boxes whose paint changed.

use autostack_core::{BoxPosition, NodeId};
use autostack_layout::BoxId;

/// Text of the diagnostic label drawn in a box's top-right corner.
#[must_use]
pub fn debug_label(position: &BoxPosition) -> String {
    format!("top: {}", position.top)
}

/// How one box should be drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxPaint {
    /// Box identity.
    pub id: BoxId,
    /// The box's container node in the host tree.
    pub node: NodeId,
    /// Placement.
    pub position: BoxPosition,
    /// Debug label text.
    pub label: String,
}

/// The paints of one view pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    paints: Vec<BoxPaint>,
}

impl Frame {
    /// An empty frame.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a paint.
    pub fn push(&mut self, paint: BoxPaint) {
        self.paints.push(paint);
    }

    /// All paints, in stack order.
    #[must_use]
    pub fn paints(&self) -> &[BoxPaint] {
        &self.paints
    }

    /// Number of paints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paints.len()
    }

    /// Whether the frame is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paints.is_empty()
    }

    /// Paints that are new or differ from the paint with the same id in `prev`.
    pub fn changed_since<'a>(&'a self, prev: &'a Frame) -> impl Iterator<Item = &'a BoxPaint> + 'a {
        self.paints.iter().filter(move |paint| {
            prev.paints
                .iter()
                .find(|old| old.id == paint.id)
                .is_none_or(|old| old != *paint)
        })
    }
}
