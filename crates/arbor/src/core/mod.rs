//! Core types: the node arena, invalidation, caching, portals and the window.

/// Per-node render caches.
pub mod cache;
/// Terminal colors and overrides.
pub mod color;
/// Debug dump utilities.
pub mod dump;
/// Core error types.
pub mod error;
/// Node ID types.
pub mod id;
/// Cross-thread ingestion.
pub mod ingest;
/// Invalidation reasons and propagation.
pub mod invalidate;
/// Node names.
pub mod name;
/// Node records.
pub mod node;
/// Portal registry and placement.
pub mod portal;
/// Terminal cell buffers.
pub mod termbuf;
/// The node arena.
pub mod tree;
/// The window.
pub mod window;

pub use id::{NodeId, TypedId};
pub use tree::Tree;
pub use window::{Window, WindowConfig};
