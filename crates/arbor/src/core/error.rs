use std::result::Result as StdResult;

use thiserror::Error;

use crate::{NodeId, geom, portal::PortalId};

/// Result type for arbor operations.
pub type Result<T> = StdResult<T, Error>;

/// Core error type.
///
/// Configuration mistakes (negative sizes, inverted ranges) never show up here:
/// they are clamped where they enter the system. Graph problems (cycles,
/// missing anchors) are handled with guards and "not found" results. What is
/// left are lookups of ids that no longer exist and protocol violations by
/// control implementations.
#[derive(PartialEq, Eq, Error, Debug, Clone)]
pub enum Error {
    #[error("node not found: {0:?}")]
    /// A node id does not refer to a live node.
    NodeNotFound(NodeId),
    #[error("portal not found: {0:?}")]
    /// A portal id does not refer to a live portal.
    PortalNotFound(PortalId),
    #[error("arrange called on {0:?} without a matching measure")]
    /// `arrange` was invoked before a measure for the current dimensions.
    ArrangeWithoutMeasure(NodeId),
    #[error("control type mismatch: expected {0}")]
    /// A typed control lookup found a different control type.
    ControlType(&'static str),
    #[error("invalid: {0}")]
    /// Invalid input error.
    Invalid(String),
    #[error("render: {0}")]
    /// Rendering failure.
    Render(String),
    #[error("geometry: {0}")]
    /// Geometry failure.
    Geometry(String),
    #[error("internal: {0}")]
    /// Internal error.
    Internal(String),
}

impl Error {
    /// True for errors that indicate a bug in a control implementation.
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::ArrangeWithoutMeasure(_))
    }
}

impl From<geom::Error> for Error {
    fn from(e: geom::Error) -> Self {
        Self::Geometry(e.to_string())
    }
}
