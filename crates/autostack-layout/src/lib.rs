#![forbid(unsafe_code)]

//! Vertical stacking.
//!
//! - [`stack_positions`] - the pure offset fold over measured sizes
//! - [`StackState`] - immutable snapshot of slot sizes and their positions
//!
//! # Offset law
//!
//! For sizes `s[0..n]` the positions are
//!
//! ```text
//! p[0] = { relative, 0 }
//! p[k] = { absolute, s[0].height + ... + s[k-1].height }   (k > 0)
//! ```
//!
//! ```
//! use autostack_layout::{BoxPosition, BoxSize, stack_positions};
//!
//! let sizes = [
//!     BoxSize::new(800.0, 150.0),
//!     BoxSize::new(800.0, 200.0),
//!     BoxSize::new(800.0, 100.0),
//! ];
//! assert_eq!(
//!     stack_positions(&sizes),
//!     vec![
//!         BoxPosition::ANCHOR,
//!         BoxPosition::absolute(150.0),
//!         BoxPosition::absolute(350.0),
//!     ]
//! );
//! ```

pub mod state;

pub use autostack_core::geometry::{BoxPosition, BoxSize, PositionMode};
pub use state::{BoxId, SlotPhase, StackState};

/// Compute every slot's position from the ordered slot sizes.
///
/// A single left-to-right scan; the running total lives only inside the
/// scan. Always returns exactly `sizes.len()` positions.
#[must_use]
pub fn stack_positions(sizes: &[BoxSize]) -> Vec<BoxPosition> {
    sizes
        .iter()
        .enumerate()
        .scan(0.0_f64, |top, (idx, size)| {
            let position = if idx == 0 {
                BoxPosition::ANCHOR
            } else {
                BoxPosition::absolute(*top)
            };
            *top += size.height;
            Some(position)
        })
        .collect()
}

/// Total height of a stack: the sum of all slot heights.
#[must_use]
pub fn stack_height(sizes: &[BoxSize]) -> f64 {
    sizes.iter().map(|s| s.height).sum()
}
