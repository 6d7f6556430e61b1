#![forbid(unsafe_code)]

//! Core: box geometry, size-change events, and the observation capability.
//!
//! Nothing in this crate knows how a stack is laid out. It defines the
//! values that flow around the measure/recompute loop ([`geometry`]), the
//! signals that can change a box's rendered size ([`event`]), and the
//! injected interfaces a host environment implements so boxes can watch
//! and measure themselves ([`observer`]).

pub mod event;
pub mod geometry;
pub mod logging;
pub mod observer;

pub use event::{MutationKind, MutationRecord, SizeEvent};
pub use geometry::{BoxPosition, BoxSize, MeasureError, PositionMode};
pub use observer::{
    ChangeCallback, Environment, Measure, NodeId, ObserveError, ObserveKinds, ObserveOptions,
    ObserveTarget, ObserverGuard, SizeObserver, SubscriptionHandle,
};

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, trace, warn};
