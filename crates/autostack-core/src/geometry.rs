#![forbid(unsafe_code)]

//! Geometric primitives for vertical stacking.
//!
//! Sizes and offsets are CSS-pixel style `f64` values. A [`BoxSize`] only
//! enters the layout after [`BoxSize::validate`] has accepted it, so the
//! derived `PartialEq` is total for every size the stack ever stores.

use core::fmt;

/// The rendered extent of one box, as reported by a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoxSize {
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent. The only dimension that affects stacking.
    pub height: f64,
}

impl BoxSize {
    /// The placeholder size of a box that has not been measured yet.
    pub const ZERO: Self = Self {
        width: 0.0,
        height: 0.0,
    };

    /// Create a new size.
    #[inline]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Accept a raw measurement, rejecting NaN, infinite or negative values.
    pub fn validate(self) -> Result<Self, MeasureError> {
        if !self.width.is_finite() || !self.height.is_finite() {
            return Err(MeasureError::NonFinite {
                width: self.width,
                height: self.height,
            });
        }
        if self.width < 0.0 || self.height < 0.0 {
            return Err(MeasureError::Negative {
                width: self.width,
                height: self.height,
            });
        }
        Ok(self)
    }
}

impl fmt::Display for BoxSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A measurement that cannot be used for layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeasureError {
    /// At least one dimension was NaN or infinite.
    NonFinite {
        /// Reported width.
        width: f64,
        /// Reported height.
        height: f64,
    },
    /// At least one dimension was below zero.
    Negative {
        /// Reported width.
        width: f64,
        /// Reported height.
        height: f64,
    },
}

impl fmt::Display for MeasureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFinite { width, height } => {
                write!(f, "non-finite measurement {width}x{height}")
            }
            Self::Negative { width, height } => {
                write!(f, "negative measurement {width}x{height}")
            }
        }
    }
}

impl std::error::Error for MeasureError {}

/// How a box is placed relative to the stack origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PositionMode {
    /// In normal flow. Only the anchor box uses this.
    #[default]
    Relative,
    /// Taken out of flow and placed at an explicit `top`.
    Absolute,
}

impl PositionMode {
    /// The CSS keyword for this mode.
    #[must_use]
    pub const fn as_css(self) -> &'static str {
        match self {
            Self::Relative => "relative",
            Self::Absolute => "absolute",
        }
    }
}

/// Where a box is drawn: its placement mode and offset from the stack origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoxPosition {
    /// Placement mode.
    pub mode: PositionMode,
    /// Vertical distance from the stack origin to the box's top edge.
    pub top: f64,
}

impl BoxPosition {
    /// The anchor position of the first box in a stack.
    ///
    /// Also the position a box renders at before its first layout.
    pub const ANCHOR: Self = Self {
        mode: PositionMode::Relative,
        top: 0.0,
    };

    /// An out-of-flow position at `top`.
    #[inline]
    pub const fn absolute(top: f64) -> Self {
        Self {
            mode: PositionMode::Absolute,
            top,
        }
    }

    /// Whether this is the stack anchor.
    #[inline]
    pub fn is_anchor(&self) -> bool {
        *self == Self::ANCHOR
    }
}

impl fmt::Display for BoxPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.mode.as_css(), self.top)
    }
}
