use super::{Axis, Edges, Expanse, Point};
use crate::{Error, Result};

/// A rectangle in cell coordinates.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Default)]
pub struct Rect {
    /// Top-left corner.
    pub tl: Point,
    /// Width.
    pub w: u32,
    /// Height.
    pub h: u32,
}

impl Rect {
    /// Construct a rectangle from its origin and size.
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self {
            tl: Point { x, y },
            w,
            h,
        }
    }

    /// The zero rectangle at the origin.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Construct a rectangle from an origin and an expanse.
    pub fn at(tl: Point, size: Expanse) -> Self {
        Self {
            tl,
            w: size.w,
            h: size.h,
        }
    }

    /// The size of this rectangle.
    pub fn expanse(&self) -> Expanse {
        Expanse::new(self.w, self.h)
    }

    /// One past the rightmost column.
    pub fn right(&self) -> u32 {
        self.tl.x.saturating_add(self.w)
    }

    /// One past the bottom row.
    pub fn bottom(&self) -> u32 {
        self.tl.y.saturating_add(self.h)
    }

    /// True if the rectangle has no area.
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Origin coordinate along an axis.
    pub fn origin_along(&self, axis: Axis) -> u32 {
        match axis {
            Axis::Horizontal => self.tl.x,
            Axis::Vertical => self.tl.y,
        }
    }

    /// Does this rectangle contain the point?
    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.tl.x && p.x < self.right() && p.y >= self.tl.y && p.y < self.bottom()
    }

    /// Does this rectangle completely enclose the other?
    pub fn contains_rect(&self, other: &Self) -> bool {
        other.tl.x >= self.tl.x
            && other.tl.y >= self.tl.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// The overlapping region of two rectangles, if any.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let x = self.tl.x.max(other.tl.x);
        let y = self.tl.y.max(other.tl.y);
        let r = self.right().min(other.right());
        let b = self.bottom().min(other.bottom());
        if r <= x || b <= y {
            return None;
        }
        Some(Self::new(x, y, r - x, b - y))
    }

    /// Move the rectangle by an offset without overflowing.
    pub fn shift(&self, dx: u32, dy: u32) -> Self {
        Self {
            tl: self.tl.offset(dx, dy),
            w: self.w,
            h: self.h,
        }
    }

    /// Shrink the rectangle by per-side insets. Insets larger than the
    /// rectangle collapse it to zero size at the inset origin.
    pub fn inset(&self, edges: Edges) -> Self {
        Self {
            tl: self.tl.offset(edges.left, edges.top),
            w: self.w.saturating_sub(edges.horizontal()),
            h: self.h.saturating_sub(edges.vertical()),
        }
    }

    /// Given a point that falls within this rectangle, rebase the point to be
    /// relative to our origin. If the point falls outside the rect, an error is
    /// returned.
    pub fn rebase(&self, pt: Point) -> Result<Point> {
        if !self.contains_point(pt) {
            return Err(Error::Geometry("co-ords outside rectangle".into()));
        }
        Ok(Point {
            x: pt.x - self.tl.x,
            y: pt.y - self.tl.y,
        })
    }
}
