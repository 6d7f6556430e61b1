#![forbid(unsafe_code)]

//! Serializable layout snapshots.

use autostack_core::{BoxPosition, BoxSize};
use autostack_layout::{SlotPhase, StackState};

/// One box in a [`LayoutSnapshot`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoxSnapshot {
    /// Box id.
    pub id: u32,
    /// Last reported size.
    pub size: BoxSize,
    /// Current placement.
    pub position: BoxPosition,
    /// Whether the box has reported at least once.
    pub settled: bool,
}

/// The whole stack at one generation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayoutSnapshot {
    /// State generation the snapshot was taken at.
    pub generation: u64,
    /// Sum of all box heights.
    pub total_height: f64,
    /// Boxes in stack order.
    pub boxes: Vec<BoxSnapshot>,
}

impl LayoutSnapshot {
    /// Capture `state`.
    #[must_use]
    pub fn capture(state: &StackState, generation: u64) -> Self {
        let boxes = state
            .ids()
            .zip(state.sizes())
            .zip(state.positions().iter().copied())
            .map(|((id, size), position)| BoxSnapshot {
                id: id.0,
                size,
                position,
                settled: state.phase_of(id) == Some(SlotPhase::Settled),
            })
            .collect();
        Self {
            generation,
            total_height: state.total_height(),
            boxes,
        }
    }
}
