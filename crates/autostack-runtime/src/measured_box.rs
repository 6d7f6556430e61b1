#![forbid(unsafe_code)]

//! A box that measures itself.
//!
//! [`MeasuredBox`] wraps one node of the host tree. It subscribes to
//! viewport resizes and to mutations of its own subtree, and on every such
//! signal reads its rendered size. Only a size that differs from the last
//! one it reported is passed to the `on_size_change` callback; this check is
//! what stops a position update, which mutates the box's style and so fires
//! another observation, from looping forever.
//!
//! # Failure Modes
//!
//! | Condition                          | Behavior                                 |
//! |------------------------------------|------------------------------------------|
//! | Host cannot observe mutations      | Mounts with [`Detection::ResizeOnly`]    |
//! | Measurement is NaN, infinite, < 0  | Skipped, last good size kept, warn logged |
//! | Node not attached                  | Skipped silently                         |
//! | No callback supplied               | Sizes tracked, nothing reported          |
//! | Event arrives after unmount        | Ignored                                  |
//! | Signal arrives while measuring     | Ignored, the outer measurement reports   |

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use autostack_core::{
    BoxPosition, BoxSize, ChangeCallback, Environment, Measure, NodeId, ObserveError,
    ObserveOptions, ObserveTarget, ObserverGuard, SizeEvent,
};
use autostack_layout::BoxId;

use crate::frame::{BoxPaint, Frame, debug_label};

/// Receives each distinct size a box measures.
///
/// The callback runs with no borrow of the box held, so it may mutate the
/// host and trigger the box again.
pub type SizeCallback = Rc<dyn Fn(BoxSize)>;

/// Which triggers a mounted box is listening to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Detection {
    /// Viewport resize and subtree mutation.
    Full,
    /// Viewport resize only; the host offered no mutation observation.
    ResizeOnly,
}

/// State shared between the box and its observation callbacks.
struct Probe {
    id: BoxId,
    node: NodeId,
    measure: Rc<dyn Measure>,
    last_size: BoxSize,
    on_size_change: Option<SizeCallback>,
    mounted: bool,
}

impl Probe {
    /// Measure and, if the size is new, cache it and return it.
    fn remeasure(&mut self) -> Option<BoxSize> {
        if !self.mounted {
            return None;
        }
        let raw = self.measure.measure(self.node)?;
        let size = match raw.validate() {
            Ok(size) => size,
            Err(err) => {
                tracing::warn!(
                    box_id = %self.id,
                    node = %self.node,
                    error = %err,
                    kept = %self.last_size,
                    "rejected measurement"
                );
                return None;
            }
        };
        if size == self.last_size {
            tracing::trace!(box_id = %self.id, size = %size, "size unchanged");
            return None;
        }
        self.last_size = size;
        Some(size)
    }
}

/// Measure `probe` and notify its callback if the size changed.
///
/// A signal that arrives while the box is already measuring is skipped.
fn measure_and_report(probe: &RefCell<Probe>) -> bool {
    let Ok(mut state) = probe.try_borrow_mut() else {
        tracing::trace!("size signal during measurement skipped");
        return false;
    };
    let Some(size) = state.remeasure() else {
        return false;
    };
    let id = state.id;
    let callback = state.on_size_change.clone();
    drop(state);

    tracing::debug!(box_id = %id, size = %size, "box size changed");
    if let Some(callback) = callback {
        callback(size);
    }
    true
}

fn observation_callback(id: BoxId, probe: Weak<RefCell<Probe>>) -> ChangeCallback {
    Rc::new(move |event: &SizeEvent| {
        let Some(probe) = probe.upgrade() else {
            return;
        };
        tracing::trace!(box_id = %id, ?event, "size signal");
        measure_and_report(&probe);
    })
}

/// One content block in a stack.
pub struct MeasuredBox {
    id: BoxId,
    node: NodeId,
    position: BoxPosition,
    detection: Detection,
    probe: Rc<RefCell<Probe>>,
    subscriptions: Vec<ObserverGuard>,
}

impl MeasuredBox {
    /// Mount a box around `node`, subscribe to its size triggers, and take
    /// the first measurement.
    ///
    /// Renders at [`BoxPosition::ANCHOR`] until given a position. Fails only
    /// if viewport observation is unavailable or the host rejects `node`.
    pub fn mount(
        id: BoxId,
        node: NodeId,
        env: &Environment,
        options: &ObserveOptions,
        on_size_change: Option<SizeCallback>,
    ) -> Result<Self, ObserveError> {
        let probe = Rc::new(RefCell::new(Probe {
            id,
            node,
            measure: Rc::clone(&env.measure),
            last_size: BoxSize::ZERO,
            on_size_change,
            mounted: true,
        }));

        let mut subscriptions = Vec::with_capacity(2);
        subscriptions.push(ObserverGuard::subscribe(
            Rc::clone(&env.observer),
            ObserveTarget::Viewport,
            observation_callback(id, Rc::downgrade(&probe)),
        )?);

        let detection = match ObserverGuard::subscribe(
            Rc::clone(&env.observer),
            ObserveTarget::Subtree {
                node,
                options: options.clone(),
            },
            observation_callback(id, Rc::downgrade(&probe)),
        ) {
            Ok(guard) => {
                subscriptions.push(guard);
                Detection::Full
            }
            Err(ObserveError::Unsupported(what)) => {
                tracing::warn!(
                    box_id = %id,
                    node = %node,
                    missing = what,
                    "mutation observation unavailable, detecting viewport resizes only"
                );
                Detection::ResizeOnly
            }
            Err(err) => return Err(err),
        };

        let mounted = Self {
            id,
            node,
            position: BoxPosition::ANCHOR,
            detection,
            probe,
            subscriptions,
        };
        tracing::debug!(box_id = %id, node = %node, ?detection, "box mounted");
        mounted.remeasure();
        Ok(mounted)
    }

    /// Measure now, reporting if the size changed. Returns whether it did.
    pub fn remeasure(&self) -> bool {
        measure_and_report(&self.probe)
    }

    /// Box identity.
    #[must_use]
    pub fn id(&self) -> BoxId {
        self.id
    }

    /// The wrapped host node.
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Current position.
    #[must_use]
    pub fn position(&self) -> BoxPosition {
        self.position
    }

    /// Active triggers.
    #[must_use]
    pub fn detection(&self) -> Detection {
        self.detection
    }

    /// Last size reported (zero before the first report).
    #[must_use]
    pub fn last_size(&self) -> BoxSize {
        self.probe.borrow().last_size
    }

    /// Whether the box still holds its subscriptions.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.probe.borrow().mounted
    }

    /// Take a new position. Returns whether it differed.
    ///
    /// Does not measure: if the move changes geometry, the host's own
    /// observation of the style change will bring the box back here.
    pub fn set_position(&mut self, position: BoxPosition) -> bool {
        if self.position == position {
            return false;
        }
        self.position = position;
        true
    }

    /// Add this box's paint to `frame`.
    pub fn render(&self, frame: &mut Frame) {
        frame.push(BoxPaint {
            id: self.id,
            node: self.node,
            position: self.position,
            label: debug_label(&self.position),
        });
    }

    /// Release every subscription. No callback fires for this box afterwards.
    pub fn unmount(mut self) {
        self.teardown();
        tracing::debug!(box_id = %self.id, "box unmounted");
    }

    fn teardown(&mut self) {
        self.probe.borrow_mut().mounted = false;
        for guard in &mut self.subscriptions {
            guard.release();
        }
    }
}

impl Drop for MeasuredBox {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for MeasuredBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeasuredBox")
            .field("id", &self.id)
            .field("node", &self.node)
            .field("position", &self.position)
            .field("detection", &self.detection)
            .field("last_size", &self.last_size())
            .finish()
    }
}
