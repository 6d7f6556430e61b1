#![forbid(unsafe_code)]

//! Stack coordinator.
//!
//! Owns the boxes of one stack and the [`StackState`] derived from their
//! sizes. Boxes never touch the state: each one gets a callback that posts a
//! [`SizeReport`] into the coordinator's queue. Reports are reduced later,
//! in [`StackCoordinator::process_pending`], one atomic state replacement
//! per report that actually changes a slot.
//!
//! # Invariants
//!
//! 1. The state has exactly one slot per mounted box, in [`BoxId`] order.
//! 2. A report for an unmounted id is dropped.
//! 3. A report equal to the stored size produces no new state, so the
//!    shared `Rc<StackState>` stays pointer-identical.
//! 4. After every transition each box holds the position from the new state;
//!    boxes whose position did not change are not touched.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::sync::mpsc;

use autostack_core::{BoxPosition, BoxSize, Environment, NodeId, ObserveError, ObserveOptions};
use autostack_layout::{BoxId, StackState};

use crate::frame::Frame;
use crate::measured_box::{MeasuredBox, SizeCallback};

/// A box's report of a new measured size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeReport {
    /// Reporting box.
    pub id: BoxId,
    /// Its new size.
    pub size: BoxSize,
}

/// Error returned by [`StackCoordinator::mount_box`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountBoxError {
    /// The box could not subscribe to its triggers.
    Observe(ObserveError),
    /// Every box id has been handed out.
    IdsExhausted,
}

impl fmt::Display for MountBoxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Observe(err) => write!(f, "{err}"),
            Self::IdsExhausted => write!(f, "box ids exhausted"),
        }
    }
}

impl std::error::Error for MountBoxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Observe(err) => Some(err),
            Self::IdsExhausted => None,
        }
    }
}

impl From<ObserveError> for MountBoxError {
    fn from(err: ObserveError) -> Self {
        Self::Observe(err)
    }
}

/// Root of a stack: boxes, state, and the report queue between them.
pub struct StackCoordinator {
    env: Environment,
    observe: ObserveOptions,
    state: Rc<StackState>,
    generation: u64,
    boxes: BTreeMap<BoxId, MeasuredBox>,
    next_id: u32,
    sender: mpsc::Sender<SizeReport>,
    receiver: mpsc::Receiver<SizeReport>,
}

impl StackCoordinator {
    /// Create an empty stack whose boxes will use `env` and `observe`.
    #[must_use]
    pub fn new(env: Environment, observe: ObserveOptions) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            env,
            observe,
            state: Rc::new(StackState::new()),
            generation: 0,
            boxes: BTreeMap::new(),
            next_id: 0,
            sender,
            receiver,
        }
    }

    /// The callback bound to slot `id`.
    ///
    /// Calling it only enqueues; the state changes on the next
    /// [`process_pending`](Self::process_pending).
    #[must_use]
    pub fn size_callback(&self, id: BoxId) -> SizeCallback {
        let sender = self.sender.clone();
        Rc::new(move |size: BoxSize| {
            if sender.send(SizeReport { id, size }).is_err() {
                tracing::trace!(box_id = %id, "size report dropped, coordinator gone");
            }
        })
    }

    /// Mount a box around `node` at the end of the stack.
    ///
    /// The id is assigned here, in declaration order, and never reused.
    pub fn mount_box(&mut self, node: NodeId) -> Result<BoxId, MountBoxError> {
        let id = BoxId(self.next_id);
        let next_id = self
            .next_id
            .checked_add(1)
            .ok_or(MountBoxError::IdsExhausted)?;
        let measured = MeasuredBox::mount(
            id,
            node,
            &self.env,
            &self.observe,
            Some(self.size_callback(id)),
        )?;
        self.next_id = next_id;
        self.boxes.insert(id, measured);
        if let Some(next) = self.state.with_mounted(id) {
            self.install(next);
        }
        Ok(id)
    }

    /// Unmount box `id`, releasing its subscriptions and removing its slot.
    ///
    /// Returns `false` if no such box is mounted.
    pub fn unmount_box(&mut self, id: BoxId) -> bool {
        let Some(measured) = self.boxes.remove(&id) else {
            return false;
        };
        measured.unmount();
        if let Some(next) = self.state.with_unmounted(id) {
            self.install(next);
        }
        true
    }

    /// Reduce every queued report. Returns how many were received.
    pub fn process_pending(&mut self) -> usize {
        let mut received = 0;
        while let Ok(report) = self.receiver.try_recv() {
            received += 1;
            self.apply(report);
        }
        received
    }

    /// Reduce one report. Returns whether the state changed.
    pub fn apply(&mut self, report: SizeReport) -> bool {
        match self.state.with_size(report.id, report.size) {
            Some(next) => {
                self.install(next);
                true
            }
            None => {
                tracing::trace!(box_id = %report.id, size = %report.size, "report ignored");
                false
            }
        }
    }

    fn install(&mut self, next: StackState) {
        self.state = Rc::new(next);
        self.generation += 1;
        tracing::debug!(
            generation = self.generation,
            boxes = self.state.len(),
            total_height = self.state.total_height(),
            "stack state replaced"
        );
        self.sync_positions();
    }

    fn sync_positions(&mut self) {
        for (id, position) in self.state.placements() {
            if let Some(measured) = self.boxes.get_mut(&id)
                && measured.set_position(position)
            {
                tracing::trace!(box_id = %id, top = position.top, "box moved");
            }
        }
    }

    /// Paint every box, in stack order.
    pub fn view(&self, frame: &mut Frame) {
        for measured in self.boxes.values() {
            measured.render(frame);
        }
    }

    /// The current state snapshot.
    #[must_use]
    pub fn state(&self) -> Rc<StackState> {
        Rc::clone(&self.state)
    }

    /// Number of state replacements so far.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Positions in stack order.
    #[must_use]
    pub fn positions(&self) -> Vec<BoxPosition> {
        self.state.positions().to_vec()
    }

    /// The mounted box `id`.
    #[must_use]
    pub fn get(&self, id: BoxId) -> Option<&MeasuredBox> {
        self.boxes.get(&id)
    }

    /// Number of mounted boxes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Whether no box is mounted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

impl fmt::Debug for StackCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackCoordinator")
            .field("generation", &self.generation)
            .field("state", &self.state)
            .field("boxes", &self.boxes.len())
            .finish()
    }
}
