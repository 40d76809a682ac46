//! The capability model for anything that lives in the tree.
//!
//! A [`Control`] is the only required trait. Everything else is an optional
//! capability the layout and paint passes query for at runtime: a control
//! that does not report itself [`Measurable`] measures to the smallest size
//! its constraints allow, and one that is not [`Paintable`] leaves its area
//! filled with the resolved background.

use std::any::{Any, type_name};

use crate::{
    color::Colors,
    error::Result,
    geom::{Constraints, Expanse, Rect},
    invalidate::InvalidationReason,
    layout::Layout,
    name::NodeName,
    termbuf::TermBuf,
};

/// A node's behaviour. Controls are owned by the tree and must be `Send` so a
/// window can be handed to a render thread.
pub trait Control: Any + Send {
    /// Name used in dumps and traces.
    fn name(&self) -> NodeName {
        let full = type_name::<Self>();
        let base = full.split('<').next().unwrap_or(full);
        NodeName::convert(base.rsplit("::").next().unwrap_or(base))
    }

    /// Layout configuration picked up when the control is inserted.
    fn layout(&self) -> Layout {
        Layout::default()
    }

    /// The measuring capability, if any.
    fn as_measurable(&self) -> Option<&dyn Measurable> {
        None
    }

    /// The painting capability, if any.
    fn as_paintable(&mut self) -> Option<&mut dyn Paintable> {
        None
    }

    /// The focus capability, if any.
    fn as_focusable(&mut self) -> Option<&mut dyn Focusable> {
        None
    }

    /// True for controls that act as a window boundary. Ancestor searches stop
    /// at the nearest one.
    fn is_window(&self) -> bool {
        false
    }

    /// Pull in data queued from other threads. Called on the layout thread at
    /// the start of every frame; return a reason to invalidate this node.
    fn ingest(&mut self) -> Option<InvalidationReason> {
        None
    }
}

/// Controls that compute their own desired size.
pub trait Measurable {
    /// Desired content size under `c`. The result is clamped into `c` by the
    /// caller, so implementations may return anything.
    fn measure(&self, c: Constraints) -> Expanse;
}

/// Controls that draw themselves.
pub trait Paintable {
    /// Draw into `buf`, which covers `bounds` exactly. Only cells inside
    /// `clip` are guaranteed to be shown.
    fn paint(&mut self, buf: &mut TermBuf, bounds: Rect, clip: Rect, colors: Colors) -> Result<()>;
}

/// Controls that can hold keyboard focus.
pub trait Focusable {
    /// Whether focus may move here right now.
    fn accepts_focus(&self) -> bool {
        true
    }

    /// Focus was gained or lost.
    fn set_focused(&mut self, focused: bool);
}

/// A plain control with no capabilities of its own. Useful as a container.
#[derive(Debug, Default, Clone, Copy)]
pub struct Container {
    /// Layout applied on insert.
    layout: Layout,
}

impl Container {
    /// A container with the given layout.
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }
}

impl Control for Container {
    fn layout(&self) -> Layout {
        self.layout
    }
}

/// The control at the root of every window.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowRoot;

impl Control for WindowRoot {
    fn name(&self) -> NodeName {
        NodeName::convert("window")
    }

    fn layout(&self) -> Layout {
        Layout::stack()
    }

    fn is_window(&self) -> bool {
        true
    }
}

/// Downcast a control to a concrete type.
pub(crate) fn downcast_ref<T: Control>(control: &dyn Control) -> Option<&T> {
    (control as &dyn Any).downcast_ref::<T>()
}

/// Downcast a control to a concrete type mutably.
pub(crate) fn downcast_mut<T: Control>(control: &mut dyn Control) -> Option<&mut T> {
    (control as &mut dyn Any).downcast_mut::<T>()
}
