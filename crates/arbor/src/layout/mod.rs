//! Layout configuration carried by every node, and the flex distribution
//! used by row and column containers.

/// Proportional space distribution.
pub mod flex;
/// The measure/arrange passes.
pub(crate) mod pass;

pub use flex::{FlexItem, distribute};

use crate::geom::{Axis, Edges};

/// How a container places its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Children side by side, growing along x.
    Row,
    /// Children stacked top to bottom, growing along y.
    #[default]
    Column,
    /// Children overlaid on top of each other in the content box.
    Stack,
}

impl Direction {
    /// The growth axis, if this direction has one.
    pub fn axis(self) -> Option<Axis> {
        match self {
            Self::Row => Some(Axis::Horizontal),
            Self::Column => Some(Axis::Vertical),
            Self::Stack => None,
        }
    }
}

/// Cross-axis placement of a child inside its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Align {
    /// Leading edge.
    Start,
    /// Centered.
    Center,
    /// Trailing edge.
    End,
    /// Fill the full cross extent.
    #[default]
    Stretch,
}

impl Align {
    /// Offset of a child of extent `child` inside `available`.
    pub fn offset(self, child: u32, available: u32) -> u32 {
        match self {
            Self::Start | Self::Stretch => 0,
            Self::Center => available.saturating_sub(child) / 2,
            Self::End => available.saturating_sub(child),
        }
    }
}

/// Layout configuration for a node.
///
/// Explicit sizes and min/max bounds describe the node's content box; the
/// margin is added around it and counts toward the space the parent reserves.
/// A node with an explicit size along its parent's growth axis is *fixed*;
/// otherwise it is *flexible* and shares leftover space by `flex` factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Layout {
    /// How children are placed.
    pub direction: Direction,
    /// Explicit width.
    pub width: Option<u32>,
    /// Explicit height.
    pub height: Option<u32>,
    /// Minimum width.
    pub min_width: Option<u32>,
    /// Maximum width.
    pub max_width: Option<u32>,
    /// Minimum height.
    pub min_height: Option<u32>,
    /// Maximum height.
    pub max_height: Option<u32>,
    /// Flex factor. Zero means never grow past the minimum.
    pub flex: u32,
    /// Cross-axis alignment applied to children.
    pub align: Align,
    /// Override of the parent's alignment for this node.
    pub align_self: Option<Align>,
    /// Space around the content box.
    pub margin: Edges,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            direction: Direction::Column,
            width: None,
            height: None,
            min_width: None,
            max_width: None,
            min_height: None,
            max_height: None,
            flex: 1,
            align: Align::Stretch,
            align_self: None,
            margin: Edges::default(),
        }
    }
}

/// Reject negative input by clamping it to zero.
fn non_negative(v: i32) -> u32 {
    u32::try_from(v).unwrap_or(0)
}

impl Layout {
    /// A row container.
    pub fn row() -> Self {
        Self::default().direction(Direction::Row)
    }

    /// A column container.
    pub fn column() -> Self {
        Self::default()
    }

    /// A stack container.
    pub fn stack() -> Self {
        Self::default().direction(Direction::Stack)
    }

    /// Set the direction.
    #[must_use]
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Set an explicit width. Negative values become zero.
    #[must_use]
    pub fn width(mut self, w: i32) -> Self {
        self.width = Some(non_negative(w));
        self
    }

    /// Set an explicit height. Negative values become zero.
    #[must_use]
    pub fn height(mut self, h: i32) -> Self {
        self.height = Some(non_negative(h));
        self
    }

    /// Set an explicit width and height.
    #[must_use]
    pub fn size(self, w: i32, h: i32) -> Self {
        self.width(w).height(h)
    }

    /// Set a minimum width.
    #[must_use]
    pub fn min_width(mut self, w: i32) -> Self {
        self.min_width = Some(non_negative(w));
        self
    }

    /// Set a maximum width.
    #[must_use]
    pub fn max_width(mut self, w: i32) -> Self {
        self.max_width = Some(non_negative(w));
        self
    }

    /// Set a minimum height.
    #[must_use]
    pub fn min_height(mut self, h: i32) -> Self {
        self.min_height = Some(non_negative(h));
        self
    }

    /// Set a maximum height.
    #[must_use]
    pub fn max_height(mut self, h: i32) -> Self {
        self.max_height = Some(non_negative(h));
        self
    }

    /// Set the flex factor.
    #[must_use]
    pub fn flex(mut self, factor: u32) -> Self {
        self.flex = factor;
        self
    }

    /// Set the alignment applied to children.
    #[must_use]
    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    /// Override the parent's alignment for this node.
    #[must_use]
    pub fn align_self(mut self, align: Align) -> Self {
        self.align_self = Some(align);
        self
    }

    /// Set the margin.
    #[must_use]
    pub fn margin(mut self, margin: Edges) -> Self {
        self.margin = margin;
        self
    }

    /// Explicit size along an axis.
    pub fn fixed_along(&self, axis: Axis) -> Option<u32> {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
    }

    /// Minimum along an axis.
    pub fn min_along(&self, axis: Axis) -> Option<u32> {
        match axis {
            Axis::Horizontal => self.min_width,
            Axis::Vertical => self.min_height,
        }
    }

    /// Maximum along an axis.
    pub fn max_along(&self, axis: Axis) -> Option<u32> {
        match axis {
            Axis::Horizontal => self.max_width,
            Axis::Vertical => self.max_height,
        }
    }

    /// The sizing requirement this node presents as a flexible child along `axis`.
    pub fn flex_item(&self, axis: Axis) -> FlexItem {
        FlexItem::new(
            self.flex,
            self.min_along(axis).unwrap_or(0),
            self.max_along(axis),
        )
    }
}
