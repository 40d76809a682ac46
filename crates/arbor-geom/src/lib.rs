//! Geometry primitives used across arbor.
//!
//! Everything here is plain data: constraint ranges passed down during
//! measurement, the sizes that come back up, and the rectangles assigned during
//! arrangement.

#![warn(missing_docs)]

/// Min/max constraint ranges.
mod constraints;
/// Edge insets for margins.
mod edges;
/// Error types for geometry operations.
mod error;
/// Width/height size type.
mod expanse;
/// Point helpers.
mod point;
/// Rectangle operations.
mod rect;

pub use constraints::Constraints;
pub use edges::Edges;
pub use error::{Error, Result};
pub use expanse::Expanse;
pub use point::Point;
pub use rect::Rect;

/// A layout axis.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Axis {
    /// The x axis.
    Horizontal,
    /// The y axis.
    Vertical,
}

impl Axis {
    /// The perpendicular axis.
    pub fn cross(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }
}
