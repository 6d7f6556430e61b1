#![forbid(unsafe_code)]

//! Host-driven stack runner.
//!
//! [`StackProgram`] owns a [`StackCoordinator`] bound to a [`Document`] and
//! advances the measure/layout loop one step at a time. Nothing happens
//! between steps: the host mutates the document, then calls
//! [`StackProgram::step`] or [`StackProgram::settle`].
//!
//! # Lifecycle
//!
//! 1. [`StackProgram::mount`] - find the container and wrap the initial blocks.
//! 2. [`StackProgram::push_block`] / [`StackProgram::remove_block`] - change
//!    the stack.
//! 3. [`StackProgram::step`] - deliver queued document events, reduce size
//!    reports, present changed boxes.
//! 4. [`StackProgram::settle`] - step until nothing is left to do.
//!
//! # Presentation
//!
//! Each block is wrapped in a root node styled `width: 100%` with the
//! box's `position` and `top`, plus a small absolutely positioned label
//! reading `top: N`. Only boxes whose paint changed are written back.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use autostack_core::{BoxPosition, Environment, NodeId, ObserveError};
use autostack_layout::{BoxId, StackState};
use autostack_runtime::{
    BoxPaint, Frame, MountBoxError, StackConfig, StackCoordinator, debug_label,
};

use crate::document::Document;
use crate::snapshot::LayoutSnapshot;

/// Error returned by [`StackProgram::mount`] and [`StackProgram::push_block`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountError {
    /// No container with this name exists in the document.
    MissingContainer(String),
    /// A box could not subscribe to its triggers.
    Observe(ObserveError),
    /// Every box id has been handed out.
    IdsExhausted,
}

impl fmt::Display for MountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingContainer(name) => write!(f, "container not found: {name}"),
            Self::Observe(err) => write!(f, "observation failed: {err}"),
            Self::IdsExhausted => write!(f, "box ids exhausted"),
        }
    }
}

impl std::error::Error for MountError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Observe(err) => Some(err),
            Self::MissingContainer(_) | Self::IdsExhausted => None,
        }
    }
}

impl From<ObserveError> for MountError {
    fn from(err: ObserveError) -> Self {
        Self::Observe(err)
    }
}

impl From<MountBoxError> for MountError {
    fn from(err: MountBoxError) -> Self {
        match err {
            MountBoxError::Observe(err) => Self::Observe(err),
            MountBoxError::IdsExhausted => Self::IdsExhausted,
        }
    }
}

/// Error returned by [`StackProgram::settle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettleError {
    /// The budget ran out before a step came back idle.
    Unsettled {
        /// Steps taken.
        budget: usize,
        /// Document events still queued.
        pending_events: usize,
    },
}

impl fmt::Display for SettleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsettled {
                budget,
                pending_events,
            } => write!(
                f,
                "stack did not settle within {budget} steps ({pending_events} events pending)"
            ),
        }
    }
}

impl std::error::Error for SettleError {}

/// Outcome of a single [`StackProgram::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepResult {
    /// Document events delivered during this step.
    pub events_dispatched: usize,
    /// Size reports reduced during this step.
    pub reports_processed: usize,
    /// Whether any box was written back to the document.
    pub rendered: bool,
    /// State generation after the step.
    pub generation: u64,
}

impl StepResult {
    /// A step that found nothing to do.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.events_dispatched == 0 && self.reports_processed == 0 && !self.rendered
    }
}

/// Outcome of a successful [`StackProgram::settle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleReport {
    /// Steps taken, including the final idle one.
    pub steps: usize,
    /// State generation at the fixed point.
    pub generation: u64,
}

#[derive(Debug, Clone, Copy)]
struct Block {
    root: NodeId,
    label: NodeId,
    content: NodeId,
}

/// Host-driven runner for one stack in one [`Document`].
pub struct StackProgram {
    doc: Rc<Document>,
    config: StackConfig,
    container: NodeId,
    coordinator: StackCoordinator,
    blocks: BTreeMap<BoxId, Block>,
    presented: Frame,
}

impl StackProgram {
    /// Mount a stack into the configured container and wrap `blocks`, in
    /// order.
    pub fn mount(
        doc: Rc<Document>,
        config: StackConfig,
        blocks: impl IntoIterator<Item = NodeId>,
    ) -> Result<Self, MountError> {
        let container = doc
            .container(&config.container)
            .ok_or_else(|| MountError::MissingContainer(config.container.clone()))?;
        let env = Environment::new(doc.clone(), doc.clone());
        let coordinator = StackCoordinator::new(env, config.observe.clone());
        let mut program = Self {
            doc,
            config,
            container,
            coordinator,
            blocks: BTreeMap::new(),
            presented: Frame::new(),
        };
        for content in blocks {
            program.push_block(content)?;
        }
        tracing::debug!(
            container = %program.config.container,
            boxes = program.blocks.len(),
            "stack mounted"
        );
        Ok(program)
    }

    /// Wrap `content` in a new box at the end of the stack.
    pub fn push_block(&mut self, content: NodeId) -> Result<BoxId, MountError> {
        let doc = &self.doc;
        let root = doc.create_element();
        let label = doc.create_element();
        let position = BoxPosition::ANCHOR;
        doc.set_style(root, "width", "100%");
        doc.set_style(root, "position", position.mode.as_css());
        doc.set_style(root, "top", format!("{}px", position.top));
        for (key, value) in [
            ("position", "absolute"),
            ("top", "0"),
            ("right", "0"),
            ("background", "#eee"),
            ("padding", "2px 4px"),
            ("color", "green"),
        ] {
            doc.set_style(label, key, value);
        }
        doc.set_text(label, debug_label(&position));
        doc.append_child(root, label);
        doc.append_child(root, content);
        doc.append_child(self.container, root);

        match self.coordinator.mount_box(root) {
            Ok(id) => {
                self.blocks.insert(
                    id,
                    Block {
                        root,
                        label,
                        content,
                    },
                );
                Ok(id)
            }
            Err(err) => {
                doc.remove_child(self.container, root);
                doc.remove_child(root, content);
                tracing::warn!(error = %err, content = %content, "block not mounted");
                Err(err.into())
            }
        }
    }

    /// Unmount box `id` and detach its wrapper. Returns `false` if unknown.
    pub fn remove_block(&mut self, id: BoxId) -> bool {
        let Some(block) = self.blocks.remove(&id) else {
            return false;
        };
        self.coordinator.unmount_box(id);
        self.doc.remove_child(self.container, block.root);
        true
    }

    /// Run one step of the loop.
    pub fn step(&mut self) -> StepResult {
        let events_dispatched = self.doc.flush();
        let reports_processed = self.coordinator.process_pending();
        let rendered = self.present();
        let result = StepResult {
            events_dispatched,
            reports_processed,
            rendered,
            generation: self.coordinator.generation(),
        };
        tracing::trace!(?result, "step");
        result
    }

    /// Step until a step comes back idle, within the settle budget.
    pub fn settle(&mut self) -> Result<SettleReport, SettleError> {
        let budget = self.config.settle_budget;
        for steps in 1..=budget {
            if self.step().is_idle() {
                let generation = self.coordinator.generation();
                tracing::debug!(steps, generation, "stack settled");
                return Ok(SettleReport { steps, generation });
            }
        }
        let pending_events = self.doc.pending_events();
        tracing::warn!(budget, pending_events, "stack did not settle");
        Err(SettleError::Unsettled {
            budget,
            pending_events,
        })
    }

    fn present(&mut self) -> bool {
        let mut frame = Frame::new();
        self.coordinator.view(&mut frame);
        let mut rendered = false;
        for paint in frame.changed_since(&self.presented) {
            rendered |= self.write_paint(paint);
        }
        self.presented = frame;
        rendered
    }

    fn write_paint(&self, paint: &BoxPaint) -> bool {
        let Some(block) = self.blocks.get(&paint.id) else {
            return false;
        };
        let doc = &self.doc;
        let moved = doc.set_style(block.root, "position", paint.position.mode.as_css());
        let shifted = doc.set_style(block.root, "top", format!("{}px", paint.position.top));
        let relabeled = doc.set_text(block.label, paint.label.clone());
        moved | shifted | relabeled
    }

    /// Current positions, in stack order.
    #[must_use]
    pub fn positions(&self) -> Vec<BoxPosition> {
        self.coordinator.positions()
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> Rc<StackState> {
        self.coordinator.state()
    }

    /// The underlying coordinator.
    #[must_use]
    pub fn coordinator(&self) -> &StackCoordinator {
        &self.coordinator
    }

    /// The document this stack lives in.
    #[must_use]
    pub fn document(&self) -> &Rc<Document> {
        &self.doc
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    /// Wrapper root node of box `id`.
    #[must_use]
    pub fn root_of(&self, id: BoxId) -> Option<NodeId> {
        self.blocks.get(&id).map(|b| b.root)
    }

    /// Label node of box `id`.
    #[must_use]
    pub fn label_of(&self, id: BoxId) -> Option<NodeId> {
        self.blocks.get(&id).map(|b| b.label)
    }

    /// Content node of box `id`.
    #[must_use]
    pub fn content_of(&self, id: BoxId) -> Option<NodeId> {
        self.blocks.get(&id).map(|b| b.content)
    }

    /// Serializable view of the current layout.
    #[must_use]
    pub fn snapshot(&self) -> LayoutSnapshot {
        LayoutSnapshot::capture(&self.coordinator.state(), self.coordinator.generation())
    }
}

impl fmt::Debug for StackProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackProgram")
            .field("container", &self.config.container)
            .field("blocks", &self.blocks.len())
            .field("coordinator", &self.coordinator)
            .finish()
    }
}
