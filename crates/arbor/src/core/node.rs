use std::sync::Arc;

use crate::{
    NodeId,
    cache::RenderCache,
    color::ColorOverride,
    control::Control,
    geom::{Constraints, Expanse, Rect},
    layout::Layout,
    name::NodeName,
    termbuf::TermBuf,
};

/// A node in the tree: a control plus everything the engine tracks for it.
pub struct Node {
    /// The node's behaviour.
    pub(crate) control: Box<dyn Control>,
    /// Name used in dumps and traces.
    pub(crate) name: NodeName,
    /// Owning parent. Non-owning back-reference.
    pub(crate) parent: Option<NodeId>,
    /// For portal content roots, the node that opened the portal.
    pub(crate) host: Option<NodeId>,
    /// Ordered children.
    pub(crate) children: Vec<NodeId>,
    /// Nodes invalidated whenever this node is.
    pub(crate) dependents: Vec<NodeId>,
    /// Layout configuration.
    pub(crate) layout: Layout,
    /// Color overrides.
    pub(crate) colors: ColorOverride,
    /// Hidden nodes take no space and are not painted.
    pub(crate) visible: bool,
    /// Set by invalidation, cleared once painted.
    pub(crate) dirty: bool,
    /// Constraints of the last valid measure. `None` means a re-measure is due.
    pub(crate) measured: Option<Constraints>,
    /// Result of the last measure, margin included.
    pub(crate) desired: Expanse,
    /// Arranged rectangle, relative to the parent's content origin.
    pub(crate) bounds: Rect,
    /// Rendered content, shared with other threads on request.
    pub(crate) cache: Arc<RenderCache<TermBuf>>,
}

impl Node {
    /// Wrap a control in a fresh, detached node.
    pub(crate) fn new(control: Box<dyn Control>) -> Self {
        Self {
            name: control.name(),
            layout: control.layout(),
            control,
            parent: None,
            host: None,
            children: Vec::new(),
            dependents: Vec::new(),
            colors: ColorOverride::default(),
            visible: true,
            dirty: true,
            measured: None,
            desired: Expanse::ZERO,
            bounds: Rect::zero(),
            cache: Arc::new(RenderCache::new()),
        }
    }

    /// Node name.
    pub fn name(&self) -> &NodeName {
        &self.name
    }

    /// The node's control.
    pub fn control(&self) -> &dyn Control {
        self.control.as_ref()
    }

    /// Parent node.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Portal owner, for portal content roots.
    pub fn host(&self) -> Option<NodeId> {
        self.host
    }

    /// Ordered children.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Layout configuration.
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Color overrides.
    pub fn colors(&self) -> ColorOverride {
        self.colors
    }

    /// Whether the node takes part in layout and paint.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// True if the node changed since it was last painted.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// True if the node must be measured before it can be arranged.
    pub fn needs_layout(&self) -> bool {
        self.measured.is_none()
    }

    /// Desired size from the last measure.
    pub fn desired(&self) -> Expanse {
        self.desired
    }

    /// Arranged rectangle, relative to the parent's content origin.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// The content rectangle children are placed in, relative to this
    /// node's own origin.
    pub fn content_rect(&self) -> Rect {
        self.bounds.expanse().rect().inset(self.layout.margin)
    }
}
