//! Arbor: the layout and rendering core of a terminal UI toolkit.
//!
//! Arbor keeps a tree of controls in an arena, sizes them with a two-phase
//! measure/arrange pass, repaints only what was invalidated, and positions
//! overlay content (menus, dropdowns) next to an anchor without leaving the
//! screen.
//!
//! # Quick Start
//!
//! The main entry points are:
//! - [`Window`] - owns a tree, its portals and the painted frame
//! - [`Tree`] - the node arena and layout engine
//! - [`control::Control`] - the trait implemented by every control
//!
//! # Module Organization
//!
//! - [`geom`] - Geometry primitives (Rect, Point, Expanse, Constraints)
//! - [`layout`] - Layout configuration and flex distribution
//! - [`widgets`] - Built-in controls

#![warn(missing_docs)]

// Internal core module - re-export specific items below
mod core;

// Public modules
pub mod control;
pub mod layout;
pub mod widgets;

/// Geometry primitives.
pub mod geom {
    pub use arbor_geom::*;
}

pub use core::{NodeId, Tree, TypedId, Window, WindowConfig};
pub use core::{
    cache, color, dump, error, ingest, invalidate, name, node, portal, termbuf, tree, window,
};
