use super::{Axis, Edges, Expanse};

/// Min/max bounds on both axes, passed top-down during measurement.
///
/// A `None` maximum means the axis is unconstrained. The minimum never exceeds
/// the maximum: constructors repair inverted ranges by lowering the minimum,
/// so an invalid range is corrected at the boundary rather than reported.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Default)]
pub struct Constraints {
    /// Minimum width.
    pub min_w: u32,
    /// Maximum width, or `None` when unconstrained.
    pub max_w: Option<u32>,
    /// Minimum height.
    pub min_h: u32,
    /// Maximum height, or `None` when unconstrained.
    pub max_h: Option<u32>,
}

impl Constraints {
    /// Construct constraints, repairing any `min > max` range.
    pub fn new(min_w: u32, max_w: Option<u32>, min_h: u32, max_h: Option<u32>) -> Self {
        Self {
            min_w: repair_min(min_w, max_w),
            max_w,
            min_h: repair_min(min_h, max_h),
            max_h,
        }
    }

    /// Constraints that admit exactly one size.
    pub fn tight(size: Expanse) -> Self {
        Self::new(size.w, Some(size.w), size.h, Some(size.h))
    }

    /// Constraints that admit anything from zero up to `size`.
    pub fn loose(size: Expanse) -> Self {
        Self::new(0, Some(size.w), 0, Some(size.h))
    }

    /// Constraints with no bounds at all.
    pub fn unbounded() -> Self {
        Self::new(0, None, 0, None)
    }

    /// Minimum along an axis.
    pub fn min_along(&self, axis: Axis) -> u32 {
        match axis {
            Axis::Horizontal => self.min_w,
            Axis::Vertical => self.min_h,
        }
    }

    /// Maximum along an axis.
    pub fn max_along(&self, axis: Axis) -> Option<u32> {
        match axis {
            Axis::Horizontal => self.max_w,
            Axis::Vertical => self.max_h,
        }
    }

    /// True if the axis admits exactly one extent.
    pub fn is_tight_along(&self, axis: Axis) -> bool {
        self.max_along(axis) == Some(self.min_along(axis))
    }

    /// Replace the range on one axis.
    pub fn with_axis(&self, axis: Axis, min: u32, max: Option<u32>) -> Self {
        match axis {
            Axis::Horizontal => Self::new(min, max, self.min_h, self.max_h),
            Axis::Vertical => Self::new(self.min_w, self.max_w, min, max),
        }
    }

    /// Make one axis tight at `extent`.
    pub fn tight_along(&self, axis: Axis, extent: u32) -> Self {
        self.with_axis(axis, extent, Some(extent))
    }

    /// Clamp a size so it satisfies these constraints.
    pub fn clamp(&self, size: Expanse) -> Expanse {
        Expanse::new(
            clamp_axis(size.w, self.min_w, self.max_w),
            clamp_axis(size.h, self.min_h, self.max_h),
        )
    }

    /// True if the size satisfies these constraints.
    pub fn contains(&self, size: Expanse) -> bool {
        size.w >= self.min_w
            && size.h >= self.min_h
            && self.max_w.is_none_or(|m| size.w <= m)
            && self.max_h.is_none_or(|m| size.h <= m)
    }

    /// Narrow one axis by a node's own bounds. The result always lies inside
    /// the current range: when the node's request is incompatible, the outer
    /// range wins.
    pub fn narrow(
        &self,
        axis: Axis,
        exact: Option<u32>,
        min: Option<u32>,
        max: Option<u32>,
    ) -> Self {
        let outer_min = self.min_along(axis);
        let outer_max = self.max_along(axis);
        if let Some(exact) = exact {
            let v = clamp_axis(exact, outer_min, outer_max);
            return self.with_axis(axis, v, Some(v));
        }
        let hi = match (outer_max, max) {
            (Some(a), Some(b)) => Some(a.min(b.max(outer_min))),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b.max(outer_min)),
            (None, None) => None,
        };
        let lo = outer_min.max(min.unwrap_or(0));
        let lo = hi.map_or(lo, |h| lo.min(h));
        self.with_axis(axis, lo, hi)
    }

    /// Shrink both ranges by an inset, saturating at zero.
    pub fn deflate(&self, edges: Edges) -> Self {
        let h = edges.horizontal();
        let v = edges.vertical();
        Self::new(
            self.min_w.saturating_sub(h),
            self.max_w.map(|m| m.saturating_sub(h)),
            self.min_h.saturating_sub(v),
            self.max_h.map(|m| m.saturating_sub(v)),
        )
    }

    /// The smallest admissible size.
    pub fn smallest(&self) -> Expanse {
        Expanse::new(self.min_w, self.min_h)
    }
}

/// Lower a minimum so it does not exceed the maximum.
fn repair_min(min: u32, max: Option<u32>) -> u32 {
    max.map_or(min, |m| min.min(m))
}

/// Clamp a single value into an optional-max range.
fn clamp_axis(value: u32, min: u32, max: Option<u32>) -> u32 {
    let value = value.max(min);
    max.map_or(value, |m| value.min(m))
}
