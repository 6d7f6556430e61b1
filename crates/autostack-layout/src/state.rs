#![forbid(unsafe_code)]

//! Immutable stack state.
//!
//! A [`StackState`] pairs the ordered slot sizes with the positions derived
//! from them. Every transition builds a whole new state, so a reader never
//! sees sizes and positions that disagree. Transitions that would change
//! nothing return `None` instead of an equal copy.
//!
//! # Invariants
//!
//! 1. `positions().len() == len()` and slots are ordered by [`BoxId`].
//! 2. `positions() == stack_positions(sizes)` for the stored sizes.
//! 3. A slot exists exactly while its box is mounted.

use core::fmt;

use crate::{BoxPosition, BoxSize, stack_height, stack_positions};

/// Stable identity of a box, assigned in declaration order.
///
/// Ids are never reused or renumbered, so removing a box leaves the ids of
/// its siblings untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BoxId(pub u32);

impl fmt::Display for BoxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "box{}", self.0)
    }
}

/// Measurement phase of one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotPhase {
    /// Mounted, holding the zero placeholder until the first report.
    Measuring,
    /// Holding the last reported size.
    Settled,
}

#[derive(Debug, Clone, PartialEq)]
struct Slot {
    id: BoxId,
    size: BoxSize,
    phase: SlotPhase,
}

/// Ordered slot sizes plus the positions derived from them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StackState {
    slots: Vec<Slot>,
    positions: Vec<BoxPosition>,
}

impl StackState {
    /// An empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn from_slots(slots: Vec<Slot>) -> Self {
        let sizes: Vec<BoxSize> = slots.iter().map(|s| s.size).collect();
        let positions = stack_positions(&sizes);
        Self { slots, positions }
    }

    fn slot_index(&self, id: BoxId) -> Result<usize, usize> {
        self.slots.binary_search_by_key(&id, |s| s.id)
    }

    /// Number of mounted slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no slot is mounted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot ids in stack order.
    pub fn ids(&self) -> impl Iterator<Item = BoxId> + '_ {
        self.slots.iter().map(|s| s.id)
    }

    /// Slot sizes in stack order.
    #[must_use]
    pub fn sizes(&self) -> Vec<BoxSize> {
        self.slots.iter().map(|s| s.size).collect()
    }

    /// Slot positions in stack order.
    #[must_use]
    pub fn positions(&self) -> &[BoxPosition] {
        &self.positions
    }

    /// `(id, position)` pairs in stack order.
    pub fn placements(&self) -> impl Iterator<Item = (BoxId, BoxPosition)> + '_ {
        self.slots
            .iter()
            .zip(self.positions.iter())
            .map(|(slot, pos)| (slot.id, *pos))
    }

    /// Position of `id`, if mounted.
    #[must_use]
    pub fn position_of(&self, id: BoxId) -> Option<BoxPosition> {
        self.slot_index(id).ok().map(|idx| self.positions[idx])
    }

    /// Stored size of `id`, if mounted.
    #[must_use]
    pub fn size_of(&self, id: BoxId) -> Option<BoxSize> {
        self.slot_index(id).ok().map(|idx| self.slots[idx].size)
    }

    /// Phase of `id`, if mounted.
    #[must_use]
    pub fn phase_of(&self, id: BoxId) -> Option<SlotPhase> {
        self.slot_index(id).ok().map(|idx| self.slots[idx].phase)
    }

    /// Whether every mounted slot has reported at least once.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.slots.iter().all(|s| s.phase == SlotPhase::Settled)
    }

    /// Total stack height.
    #[must_use]
    pub fn total_height(&self) -> f64 {
        stack_height(&self.sizes())
    }

    /// Add a zero-size slot for `id`. `None` if it is already mounted.
    #[must_use]
    pub fn with_mounted(&self, id: BoxId) -> Option<Self> {
        let at = self.slot_index(id).err()?;
        let mut slots = self.slots.clone();
        slots.insert(
            at,
            Slot {
                id,
                size: BoxSize::ZERO,
                phase: SlotPhase::Measuring,
            },
        );
        Some(Self::from_slots(slots))
    }

    /// Remove the slot for `id`. `None` if it is not mounted.
    #[must_use]
    pub fn with_unmounted(&self, id: BoxId) -> Option<Self> {
        let at = self.slot_index(id).ok()?;
        let mut slots = self.slots.clone();
        slots.remove(at);
        Some(Self::from_slots(slots))
    }

    /// Replace the size of `id` and recompute all positions.
    ///
    /// `None` when `id` is not mounted, or when the slot has already
    /// settled at exactly `size`.
    #[must_use]
    pub fn with_size(&self, id: BoxId, size: BoxSize) -> Option<Self> {
        let at = self.slot_index(id).ok()?;
        let current = &self.slots[at];
        if current.phase == SlotPhase::Settled && current.size == size {
            return None;
        }
        let mut slots = self.slots.clone();
        slots[at] = Slot {
            id,
            size,
            phase: SlotPhase::Settled,
        };
        Some(Self::from_slots(slots))
    }
}
