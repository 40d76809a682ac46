//! The two-phase layout pass.
//!
//! `measure` walks down with constraints and returns desired sizes, which are
//! memoized per node until the node is invalidated or asked again under
//! different constraints. Stretched children are settled during measure: once
//! a container knows its cross extent, they are measured again at exactly
//! that extent. `arrange` then walks down with final rectangles and only
//! consumes those sizes; a rectangle that differs from the desired size is a
//! protocol error.

use tracing::{error, trace};

use super::{Align, Layout, distribute};
use crate::{
    NodeId,
    error::{Error, Result},
    geom::{Axis, Constraints, Expanse, Rect},
    tree::Tree,
};

/// A measure/arrange walk over a tree.
pub(crate) struct LayoutPass<'a> {
    /// The tree being laid out.
    tree: &'a mut Tree,
}

/// A visible child and the layout facts the pass needs about it.
#[derive(Clone, Copy)]
struct Child {
    /// Child id.
    id: NodeId,
    /// Child layout.
    layout: Layout,
    /// Alignment after applying the parent default and fixed cross sizes.
    align: Align,
}

/// Constraints for a node's content box: the parent's constraints minus the
/// margin, narrowed by the node's own explicit size and min/max bounds.
fn content_constraints(c: Constraints, layout: &Layout) -> Constraints {
    c.deflate(layout.margin)
        .narrow(
            Axis::Horizontal,
            layout.width,
            layout.min_width,
            layout.max_width,
        )
        .narrow(
            Axis::Vertical,
            layout.height,
            layout.min_height,
            layout.max_height,
        )
}

/// The largest outer extent a stretched child may take along `axis`.
fn stretch_cap(layout: &Layout, axis: Axis) -> Option<u32> {
    layout
        .max_along(axis)
        .map(|m| m.saturating_add(layout.margin.along(axis)))
}

/// The constraint range a child is measured under along a cross axis.
fn cross_range(child: &Child, axis: Axis, inner: Constraints) -> (u32, Option<u32>) {
    let max = inner.max_along(axis);
    if child.align == Align::Stretch {
        let min = inner.min_along(axis);
        let min = stretch_cap(&child.layout, axis).map_or(min, |cap| min.min(cap));
        (min, max)
    } else {
        (0, max)
    }
}

/// The extent a child occupies along a cross axis once arranged.
fn cross_extent(child: &Child, axis: Axis, desired: Expanse, available: u32) -> u32 {
    if child.align == Align::Stretch {
        stretch_cap(&child.layout, axis).map_or(available, |cap| available.min(cap))
    } else {
        desired.along(axis).min(available)
    }
}

impl<'a> LayoutPass<'a> {
    /// A pass over `tree`.
    pub(crate) fn new(tree: &'a mut Tree) -> Self {
        Self { tree }
    }

    /// Visible children of a node, with their effective alignment under a
    /// parent aligning with `default`. For stacks both axes count as cross.
    fn visible_children(&self, id: NodeId, default: Align, cross: &[Axis]) -> Result<Vec<Child>> {
        let mut out = Vec::new();
        for c in self.tree.get(id)?.children() {
            let node = self.tree.get(*c)?;
            if !node.is_visible() {
                continue;
            }
            let layout = node.layout();
            let mut align = layout.align_self.unwrap_or(default);
            if align == Align::Stretch && cross.iter().any(|a| layout.fixed_along(*a).is_some()) {
                align = Align::Start;
            }
            out.push(Child {
                id: *c,
                layout,
                align,
            });
        }
        Ok(out)
    }

    /// Measure a node and its subtree. The result always satisfies `c`.
    pub(crate) fn measure(&mut self, id: NodeId, c: Constraints) -> Result<Expanse> {
        let node = self.tree.get(id)?;
        if node.measured == Some(c) {
            return Ok(node.desired);
        }
        let layout = node.layout();
        let size = if node.is_visible() {
            let inner = content_constraints(c, &layout);
            let content = if node.children().is_empty() {
                node.control()
                    .as_measurable()
                    .map_or_else(|| inner.smallest(), |m| m.measure(inner))
            } else {
                match layout.direction.axis() {
                    Some(axis) => self.measure_linear(id, &layout, axis, inner)?,
                    None => self.measure_stack(id, &layout, inner)?,
                }
            };
            let content = inner.clamp(content);
            c.clamp(Expanse::new(
                content.w.saturating_add(layout.margin.horizontal()),
                content.h.saturating_add(layout.margin.vertical()),
            ))
        } else {
            c.smallest()
        };
        let node = self.tree.get_mut(id)?;
        node.desired = size;
        node.measured = Some(c);
        trace!(node = %node.name, ?c, ?size, "measured");
        Ok(size)
    }

    /// Measure a row or column: fixed children take their explicit size,
    /// flexible children share what is left.
    fn measure_linear(
        &mut self,
        id: NodeId,
        layout: &Layout,
        axis: Axis,
        inner: Constraints,
    ) -> Result<Expanse> {
        let cross = axis.cross();
        let children = self.visible_children(id, layout.align, &[cross])?;

        let mut main: Vec<Option<u32>> = Vec::with_capacity(children.len());
        let mut reserved = 0u32;
        let mut flexible = Vec::new();
        let mut items = Vec::new();
        for (i, child) in children.iter().enumerate() {
            let margin = child.layout.margin.along(axis);
            reserved = reserved.saturating_add(margin);
            if let Some(fixed) = child.layout.fixed_along(axis) {
                reserved = reserved.saturating_add(fixed);
                main.push(Some(fixed.saturating_add(margin)));
            } else {
                main.push(None);
                flexible.push(i);
                items.push(child.layout.flex_item(axis));
            }
        }
        if let Some(available) = inner.max_along(axis) {
            let budget = available.saturating_sub(reserved);
            for (i, alloc) in flexible.into_iter().zip(distribute(budget, &items)) {
                let margin = children[i].layout.margin.along(axis);
                main[i] = Some(alloc.saturating_add(margin));
            }
        }

        let mut measured = Vec::with_capacity(children.len());
        let mut thickest = 0u32;
        for (child, main) in children.iter().zip(main) {
            let cc = match main {
                Some(extent) => inner.tight_along(axis, extent),
                None => inner.with_axis(axis, 0, None),
            };
            let (lo, hi) = cross_range(child, cross, inner);
            let size = self.measure(child.id, cc.with_axis(cross, lo, hi))?;
            thickest = thickest.max(size.along(cross));
            measured.push((cc, size));
        }

        let available = inner
            .clamp(Expanse::from_axis(axis, 0, thickest))
            .along(cross);
        let mut total = 0u32;
        for (child, (cc, size)) in children.iter().zip(measured) {
            let extent = cross_extent(child, cross, size, available);
            let size = if size.along(cross) == extent {
                size
            } else {
                self.measure(child.id, cc.tight_along(cross, extent))?
            };
            total = total.saturating_add(size.along(axis));
        }
        Ok(Expanse::from_axis(axis, total, available))
    }

    /// Measure a stack: every child gets the whole content box.
    fn measure_stack(&mut self, id: NodeId, layout: &Layout, inner: Constraints) -> Result<Expanse> {
        let axes = [Axis::Horizontal, Axis::Vertical];
        let children = self.visible_children(id, layout.align, &axes)?;
        let mut measured = Vec::with_capacity(children.len());
        let mut out = Expanse::ZERO;
        for child in &children {
            let (min_w, max_w) = cross_range(child, Axis::Horizontal, inner);
            let (min_h, max_h) = cross_range(child, Axis::Vertical, inner);
            let size = self.measure(child.id, Constraints::new(min_w, max_w, min_h, max_h))?;
            out = Expanse::new(out.w.max(size.w), out.h.max(size.h));
            measured.push(size);
        }

        let out = inner.clamp(out);
        for (child, size) in children.iter().zip(measured) {
            let target = Expanse::new(
                cross_extent(child, Axis::Horizontal, size, out.w),
                cross_extent(child, Axis::Vertical, size, out.h),
            );
            if target != size {
                self.measure(child.id, Constraints::tight(target))?;
            }
        }
        Ok(out)
    }

    /// Arrange a measured node into `bounds`, which is relative to the
    /// parent's content origin.
    pub(crate) fn arrange(&mut self, id: NodeId, bounds: Rect) -> Result<()> {
        let node = self.tree.get(id)?;
        let size = bounds.expanse();
        if node.measured.is_none() || size != node.desired {
            error!(
                node = %node.name,
                ?bounds,
                desired = ?node.desired,
                "arrange without a matching measure"
            );
            return Err(Error::ArrangeWithoutMeasure(id));
        }
        let node = self.tree.get_mut(id)?;
        node.bounds = bounds;
        trace!(node = %node.name, ?bounds, "arranged");
        if !node.is_visible() {
            return Ok(());
        }
        let layout = node.layout();
        let content = node.content_rect().expanse();
        for c in node.children().to_vec() {
            let child = self.tree.get_mut(c)?;
            if !child.is_visible() {
                child.bounds = Rect::zero();
            }
        }
        match layout.direction.axis() {
            Some(axis) => self.arrange_linear(id, &layout, axis, content),
            None => self.arrange_stack(id, &layout, content),
        }
    }

    /// Place row or column children one after another along the growth axis.
    fn arrange_linear(
        &mut self,
        id: NodeId,
        layout: &Layout,
        axis: Axis,
        content: Expanse,
    ) -> Result<()> {
        let cross = axis.cross();
        let available = content.along(cross);
        let mut offset = 0u32;
        for child in self.visible_children(id, layout.align, &[cross])? {
            let desired = self.tree.get(child.id)?.desired();
            let main = desired.along(axis);
            let thickness = cross_extent(&child, cross, desired, available);
            let lead = child.align.offset(thickness, available);
            let rect = match axis {
                Axis::Horizontal => Rect::new(offset, lead, main, thickness),
                Axis::Vertical => Rect::new(lead, offset, thickness, main),
            };
            self.arrange(child.id, rect)?;
            offset = offset.saturating_add(main);
        }
        Ok(())
    }

    /// Place stack children over the whole content box.
    fn arrange_stack(&mut self, id: NodeId, layout: &Layout, content: Expanse) -> Result<()> {
        let axes = [Axis::Horizontal, Axis::Vertical];
        for child in self.visible_children(id, layout.align, &axes)? {
            let desired = self.tree.get(child.id)?.desired();
            let w = cross_extent(&child, Axis::Horizontal, desired, content.w);
            let h = cross_extent(&child, Axis::Vertical, desired, content.h);
            let rect = Rect::new(
                child.align.offset(w, content.w),
                child.align.offset(h, content.h),
                w,
                h,
            );
            self.arrange(child.id, rect)?;
        }
        Ok(())
    }
}
