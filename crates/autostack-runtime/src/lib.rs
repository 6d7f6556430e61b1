#![forbid(unsafe_code)]

//! Autostack Runtime
//!
//! Ties measurement and layout into one feedback loop.
//!
//! # Key Components
//!
//! - [`MeasuredBox`] - leaf: wraps one content node, measures it on every
//!   observed trigger, reports distinct sizes upward
//! - [`StackCoordinator`] - root: owns the boxes and the [`StackState`],
//!   reduces size reports, hands each box its new position
//! - [`Frame`] - what a view pass produces for the host to present
//! - [`StackConfig`] - container name, observation options, settle budget
//!
//! # The loop
//!
//! ```text
//! coordinator --position--> box --(host renders)--> observation event
//!      ^                                                   |
//!      +------------- SizeReport (only if changed) <-------+
//! ```
//!
//! The loop reaches a fixed point because a box only reports when its
//! measured size differs from the last one it reported, and the reducer
//! only installs a new state when a slot's stored size actually changes.
//!
//! [`StackState`]: autostack_layout::StackState

pub mod config;
pub mod coordinator;
pub mod frame;
pub mod measured_box;

pub use config::StackConfig;
pub use coordinator::{MountBoxError, SizeReport, StackCoordinator};
pub use frame::{BoxPaint, Frame, debug_label};
pub use measured_box::{Detection, MeasuredBox, SizeCallback};
