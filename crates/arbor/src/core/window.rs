use std::sync::Arc;

use tracing::{debug, trace};

use crate::{
    NodeId,
    color::Colors,
    control::{Control, WindowRoot},
    error::{Error, Result},
    geom::{Edges, Expanse, Point, Rect},
    ingest::Inbox,
    invalidate::{InvalidationHandle, InvalidationReason},
    layout::Layout,
    portal::{AnchorSource, Placement, Portal, PortalId, PortalRegistry, resolve_placement},
    termbuf::TermBuf,
    tree::{DEFAULT_MAX_DEPTH, Tree},
};

/// Window settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    /// Colors used where no node overrides them.
    pub colors: Colors,
    /// Limit on ancestor walks.
    pub max_depth: usize,
    /// Space between the screen edge and the root's content. Portals are
    /// kept inside the inset area too.
    pub insets: Edges,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            colors: Colors::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            insets: Edges::default(),
        }
    }
}

impl WindowConfig {
    /// Set the default colors.
    #[must_use]
    pub fn with_colors(mut self, colors: Colors) -> Self {
        self.colors = colors;
        self
    }

    /// Set the ancestor walk limit.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the screen insets.
    #[must_use]
    pub fn with_insets(mut self, insets: Edges) -> Self {
        self.insets = insets;
        self
    }
}

/// What to show in a portal, before its anchor is known.
struct Request {
    /// Node opening the portal.
    owner: NodeId,
    /// Detached content root.
    content: NodeId,
    /// Content size.
    size: Expanse,
    /// Side asked for.
    preferred: Placement,
}

/// The top of a UI: owns the tree, the open portals and the last frame.
///
/// Each frame runs [`layout`](Self::layout) and then paints the main tree
/// followed by portal content, shallow portals before nested ones.
pub struct Window {
    /// Node arena.
    tree: Tree,
    /// Root node; a stack that fills the screen.
    root: NodeId,
    /// Screen size.
    size: Expanse,
    /// Settings.
    config: WindowConfig,
    /// Open portals.
    portals: PortalRegistry,
    /// Invalidations queued from other threads.
    invalidations: Inbox<(NodeId, InvalidationReason)>,
    /// Node holding focus.
    focus: Option<NodeId>,
    /// The last painted frame.
    frame: TermBuf,
}

impl Window {
    /// A window with default settings.
    pub fn new(size: impl Into<Expanse>) -> Self {
        Self::with_config(size, WindowConfig::default())
    }

    /// A window with the given settings.
    pub fn with_config(size: impl Into<Expanse>, config: WindowConfig) -> Self {
        let size = size.into();
        let mut tree = Tree::with_max_depth(config.max_depth);
        let root = tree.insert(WindowRoot);
        if let Ok(node) = tree.get_mut(root) {
            node.layout = Layout::stack().margin(config.insets);
        }
        Self {
            tree,
            root,
            size,
            config,
            portals: PortalRegistry::new(),
            invalidations: Inbox::new(),
            focus: None,
            frame: TermBuf::new(size, config.colors),
        }
    }

    /// The root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Screen size.
    pub fn size(&self) -> Expanse {
        self.size
    }

    /// Settings.
    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// The node tree.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// The node tree, mutably. Remove nodes with [`remove`](Self::remove)
    /// so their portals close with them.
    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    /// Open portals.
    pub fn portals(&self) -> &PortalRegistry {
        &self.portals
    }

    /// The last painted frame.
    pub fn frame(&self) -> &TermBuf {
        &self.frame
    }

    /// A handle other threads can use to request invalidations.
    pub fn invalidation_handle(&self) -> InvalidationHandle {
        InvalidationHandle::new(self.invalidations.clone())
    }

    /// The area usable by content and portals.
    pub fn screen_bounds(&self) -> Rect {
        self.size.rect().inset(self.config.insets)
    }

    /// Append a control under the root.
    pub fn add(&mut self, control: impl Control) -> Result<NodeId> {
        self.tree.add_child(self.root, control)
    }

    /// Change the screen size. Portals are re-clamped against the new screen;
    /// those anchored to their owner also follow it on the next layout.
    pub fn resize(&mut self, size: impl Into<Expanse>) {
        let size = size.into();
        if size == self.size {
            return;
        }
        self.size = size;
        self.portals.reresolve(self.screen_bounds());
        self.tree.invalidate(self.root, InvalidationReason::SizeChanged);
        debug!(?size, "window resized");
    }

    /// Apply queued invalidations, run ingest hooks, and lay out the tree and
    /// every open portal. A portal anchored to its owner is reopened at the
    /// owner's new position if the layout moved it.
    pub fn layout(&mut self) -> Result<()> {
        for (id, reason) in self.invalidations.drain().items {
            if self.tree.contains(id) {
                self.tree.invalidate(id, reason);
            } else {
                trace!(?id, "queued invalidation for removed node");
            }
        }
        let ingested = self.tree.ingest_all();
        if ingested > 0 {
            trace!(ingested, "controls ingested data");
        }
        self.prune_portals()?;
        self.tree.layout_root(self.root, self.size)?;
        // Shallow portals first: a nested portal's owner is only placed once
        // the enclosing portal's content has been laid out.
        for id in self.portals.paint_order() {
            let Ok(portal) = self.portals.get(id) else {
                continue;
            };
            let id = match self.moved_anchor(portal) {
                Some(anchor) => {
                    let source = portal.anchor_source;
                    debug!(?id, ?anchor, "portal anchor moved");
                    self.reopen(id, anchor, source)?
                }
                None => id,
            };
            let portal = self.portals.get(id)?;
            let (content, bounds) = (portal.content, portal.bounds);
            self.tree.layout_at(content, bounds)?;
        }
        Ok(())
    }

    /// The owner-derived anchor of a portal, if it differs from the one the
    /// portal was resolved against. Hidden owners keep their portals put.
    fn moved_anchor(&self, portal: &Portal) -> Option<Rect> {
        if !self.tree.get(portal.owner).is_ok_and(|n| n.is_visible()) {
            return None;
        }
        self.tree
            .absolute_bounds(portal.owner)
            .and_then(|owner| portal.anchor_source.resolve(owner))
            .filter(|anchor| *anchor != portal.anchor)
    }

    /// Lay out and paint a frame.
    pub fn paint(&mut self) -> Result<&TermBuf> {
        self.layout()?;
        let defaults = self.config.colors;
        let mut frame = TermBuf::new(self.size, defaults);
        let screen = frame.rect();
        self.paint_node(&mut frame, self.root, Point::zero(), screen, defaults)?;
        for id in self.portals.paint_order() {
            let portal = self.portals.get(id)?;
            let content = portal.content;
            let colors = self.tree.resolve_colors(portal.owner, defaults);
            self.paint_node(&mut frame, content, Point::zero(), screen, colors)?;
        }
        self.frame = frame;
        Ok(&self.frame)
    }

    /// Paint one node through its render cache, then its children.
    fn paint_node(
        &mut self,
        frame: &mut TermBuf,
        id: NodeId,
        origin: Point,
        clip: Rect,
        inherited: Colors,
    ) -> Result<()> {
        let node = self.tree.get_mut(id)?;
        if !node.visible {
            return Ok(());
        }
        let colors = node.colors.apply(inherited);
        let abs = node.bounds.shift(origin.x, origin.y);
        let content = node.content_rect().shift(abs.tl.x, abs.tl.y);
        let dims = content.expanse();
        if !dims.is_empty() && content.intersect(&clip).is_some() {
            let cache = Arc::clone(&node.cache);
            let control = node.control.as_mut();
            let buf = cache.try_get_or_render(dims, || {
                let mut buf = TermBuf::new(dims, colors);
                if let Some(p) = control.as_paintable() {
                    let r = buf.rect();
                    p.paint(&mut buf, r, r, colors)?;
                }
                Ok::<_, Error>(buf)
            })?;
            frame.blit(&buf, content.tl, clip);
        }
        let children = node.children.clone();
        self.tree.mark_clean(id);
        if let Some(inner) = content.intersect(&clip) {
            for child in children {
                self.paint_node(frame, child, content.tl, inner, colors)?;
            }
        }
        Ok(())
    }

    /// Open a portal showing the detached subtree `content` next to a fixed
    /// `anchor` rectangle.
    pub fn open_portal(
        &mut self,
        owner: NodeId,
        content: NodeId,
        anchor: Rect,
        size: impl Into<Expanse>,
        preferred: Placement,
    ) -> Result<PortalId> {
        let request = Request {
            owner,
            content,
            size: size.into(),
            preferred,
        };
        self.open(request, anchor, AnchorSource::Fixed)
    }

    /// Open a portal anchored to `owner`. The anchor is re-read after every
    /// layout.
    pub fn open_portal_at_owner(
        &mut self,
        owner: NodeId,
        content: NodeId,
        size: impl Into<Expanse>,
        preferred: Placement,
    ) -> Result<PortalId> {
        let request = Request {
            owner,
            content,
            size: size.into(),
            preferred,
        };
        self.open_tracked(request, AnchorSource::Owner)
    }

    /// Open a portal anchored to row `row` of `owner`, as submenus are. The
    /// anchor is re-read after every layout.
    pub fn open_portal_at_row(
        &mut self,
        owner: NodeId,
        row: u32,
        content: NodeId,
        size: impl Into<Expanse>,
        preferred: Placement,
    ) -> Result<PortalId> {
        let request = Request {
            owner,
            content,
            size: size.into(),
            preferred,
        };
        self.open_tracked(request, AnchorSource::OwnerRow(row))
    }

    /// Lay out, then open a portal against the owner's current position.
    fn open_tracked(&mut self, request: Request, source: AnchorSource) -> Result<PortalId> {
        self.layout()?;
        let anchor = self
            .tree
            .absolute_bounds(request.owner)
            .and_then(|owner| source.resolve(owner))
            .ok_or_else(|| Error::Invalid("portal owner is not on screen".into()))?;
        self.open(request, anchor, source)
    }

    /// Validate and record a portal.
    fn open(&mut self, request: Request, anchor: Rect, source: AnchorSource) -> Result<PortalId> {
        let Request {
            owner,
            content,
            size,
            preferred,
        } = request;
        self.tree.get(owner)?;
        if self.tree.get(content)?.parent.is_some() {
            return Err(Error::Invalid("portal content must be detached".into()));
        }
        if self.portals.by_content(content).is_some() || content == self.root {
            return Err(Error::Invalid("node is already displayed".into()));
        }
        if self.tree.in_subtree(content, owner) {
            return Err(Error::Invalid("portal owner lies inside its content".into()));
        }
        let parent = self
            .tree
            .root_of(owner)
            .and_then(|r| self.portals.by_content(r));
        let (placement, bounds) =
            resolve_placement(anchor, size, preferred, self.screen_bounds());
        self.tree.set_host(content, Some(owner))?;
        let id = self.portals.insert(Portal {
            owner,
            content,
            anchor,
            anchor_source: source,
            size,
            preferred,
            placement,
            bounds,
            parent,
            depth: 0,
            seq: 0,
        });
        debug!(?id, ?placement, ?bounds, "portal opened");
        Ok(id)
    }

    /// Close a portal and everything nested in it, deepest first. Content
    /// subtrees are removed. Returns the closed ids in teardown order.
    pub fn close_portal(&mut self, id: PortalId) -> Result<Vec<PortalId>> {
        self.portals.get(id)?;
        let order = self.portals.teardown_order(id);
        for p in &order {
            if let Some(portal) = self.portals.remove(*p)
                && self.tree.contains(portal.content)
            {
                self.tree.remove_subtree(portal.content)?;
            }
            debug!(id = ?p, "portal closed");
        }
        Ok(order)
    }

    /// Close every portal opened by `owner`.
    pub fn close_portals(&mut self, owner: NodeId) -> Result<Vec<PortalId>> {
        let mut closed = Vec::new();
        for id in self.portals.owned_by(owner) {
            if !closed.contains(&id) && self.portals.get(id).is_ok() {
                closed.extend(self.close_portal(id)?);
            }
        }
        Ok(closed)
    }

    /// Re-anchor a portal to a fixed rectangle. Portals are never moved in
    /// place: nested portals are closed, and the same content is reopened at
    /// the new anchor under a new id.
    pub fn move_portal(&mut self, id: PortalId, anchor: Rect) -> Result<PortalId> {
        self.reopen(id, anchor, AnchorSource::Fixed)
    }

    /// Close the portals nested in `id`, then reopen its content at `anchor`.
    fn reopen(&mut self, id: PortalId, anchor: Rect, source: AnchorSource) -> Result<PortalId> {
        let old = self.portals.get(id)?.clone();
        for nested in self.portals.nested_in(id) {
            self.close_portal(nested)?;
        }
        self.portals.remove(id);
        self.tree.set_host(old.content, None)?;
        let request = Request {
            owner: old.owner,
            content: old.content,
            size: old.size,
            preferred: old.preferred,
        };
        self.open(request, anchor, source)
    }

    /// Close portals whose owner or content no longer exists.
    fn prune_portals(&mut self) -> Result<()> {
        for id in self.portals.paint_order() {
            let Ok(p) = self.portals.get(id) else {
                continue;
            };
            if !self.tree.contains(p.owner) || !self.tree.contains(p.content) {
                debug!(?id, "closing orphaned portal");
                self.close_portal(id)?;
            }
        }
        Ok(())
    }

    /// Remove a node and its subtree, closing any portals they own.
    pub fn remove(&mut self, id: NodeId) -> Result<Vec<NodeId>> {
        if id == self.root {
            return Err(Error::Invalid("the window root cannot be removed".into()));
        }
        for n in self.tree.descendants(id) {
            self.close_portals(n)?;
        }
        if self.focus.is_some_and(|f| self.tree.in_subtree(id, f)) {
            self.focus = None;
        }
        self.tree.remove_subtree(id)
    }

    /// The node holding focus.
    pub fn focused(&self) -> Option<NodeId> {
        self.focus
    }

    /// Move focus. Returns `false` if the target does not accept focus, in
    /// which case focus stays where it was.
    pub fn set_focus(&mut self, id: Option<NodeId>) -> Result<bool> {
        if let Some(new) = id {
            let accepts = self
                .tree
                .get_mut(new)?
                .control
                .as_focusable()
                .is_some_and(|f| f.accepts_focus());
            if !accepts {
                return Ok(false);
            }
        }
        if let Some(old) = self.focus.take()
            && let Ok(node) = self.tree.get_mut(old)
        {
            if let Some(f) = node.control.as_focusable() {
                f.set_focused(false);
            }
            self.tree.invalidate(old, InvalidationReason::FocusChanged);
        }
        if let Some(new) = id {
            if let Some(f) = self.tree.get_mut(new)?.control.as_focusable() {
                f.set_focused(true);
            }
            self.tree.invalidate(new, InvalidationReason::FocusChanged);
            self.focus = Some(new);
        }
        Ok(true)
    }
}
