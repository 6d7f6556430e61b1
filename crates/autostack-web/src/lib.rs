#![forbid(unsafe_code)]

//! `autostack-web` runs a stack against a headless, host-driven document.
//!
//! Design goals:
//! - **Host-driven**: the embedder mutates the document, resizes the
//!   viewport, and decides when to step.
//! - **Asynchronous delivery**: observers hear about changes on the next
//!   [`Document::flush`], never while a change is being made.
//! - **No threads**: everything is single-threaded and deterministic.
//!
//! [`Document`] implements both host capabilities a box needs
//! ([`Measure`](autostack_core::Measure) and
//! [`SizeObserver`](autostack_core::SizeObserver)); [`StackProgram`] wires a
//! [`StackCoordinator`](autostack_runtime::StackCoordinator) to it and
//! writes positions back.

pub mod document;
pub mod program;
pub mod snapshot;

pub use document::{Document, TEXT_LINE_HEIGHT};
pub use program::{MountError, SettleError, SettleReport, StackProgram, StepResult};
pub use snapshot::{BoxSnapshot, LayoutSnapshot};
