use std::{any::type_name, collections::HashSet, mem, sync::Arc};

use slotmap::SlotMap;
use tracing::{debug, warn};

use crate::{
    NodeId, TypedId,
    cache::RenderCache,
    color::{ColorOverride, Colors},
    control::{self, Control},
    error::{Error, Result},
    geom::{Constraints, Expanse, Point, Rect},
    invalidate::{self, InvalidationReason, InvalidationReport},
    layout::{Layout, pass::LayoutPass},
    name::NodeName,
    node::Node,
    termbuf::TermBuf,
};

/// Default limit on ancestor walks.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// The node arena.
///
/// Nodes own their children by id; parent and host links are non-owning
/// back-references. Every structural change goes through the tree, which
/// rejects cycles and duplicate children and invalidates the affected parent.
pub struct Tree {
    /// Node storage.
    pub(crate) nodes: SlotMap<NodeId, Node>,
    /// Limit on ancestor walks.
    max_depth: usize,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// An empty tree.
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }

    /// An empty tree with a custom ancestor walk limit.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            max_depth: max_depth.max(1),
        }
    }

    /// Limit on ancestor walks.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the tree holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Insert a detached node.
    pub fn insert(&mut self, control: impl Control) -> NodeId {
        self.insert_boxed(Box::new(control))
    }

    /// Insert a detached node and return a typed id.
    pub fn insert_typed<T: Control>(&mut self, control: T) -> TypedId<T> {
        TypedId::new(self.insert(control))
    }

    /// Insert a detached, already boxed control.
    pub fn insert_boxed(&mut self, control: Box<dyn Control>) -> NodeId {
        self.nodes.insert(Node::new(control))
    }

    /// True if the id refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Look up a node.
    pub fn get(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id).ok_or(Error::NodeNotFound(id))
    }

    /// Look up a node mutably.
    pub(crate) fn get_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(id).ok_or(Error::NodeNotFound(id))
    }

    /// Ids of all live nodes, in arena order.
    pub fn ids(&self) -> Vec<NodeId> {
        self.nodes.keys().collect()
    }

    /// Parent of a node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// Children of a node. Empty for missing ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Insert a node and append it to `parent`.
    pub fn add_child(&mut self, parent: NodeId, control: impl Control) -> Result<NodeId> {
        self.get(parent)?;
        let id = self.insert(control);
        self.attach(parent, id)?;
        Ok(id)
    }

    /// Insert a node, append it to `parent` and return a typed id.
    pub fn add_child_typed<T: Control>(&mut self, parent: NodeId, control: T) -> Result<TypedId<T>> {
        self.add_child(parent, control).map(TypedId::new)
    }

    /// True if `ancestor` is `id` or lies on its parent chain. The walk is
    /// bounded by the depth limit.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.lineage(id, false).contains(&ancestor)
    }

    /// True if `id` is `root` or lies anywhere below it. Unlike
    /// [`is_ancestor`](Self::is_ancestor) this ignores the depth limit.
    pub fn in_subtree(&self, root: NodeId, id: NodeId) -> bool {
        self.descendants(root).contains(&id)
    }

    /// Reject an edge `parent -> child` that would close a cycle.
    fn check_edge(&self, parent: NodeId, child: NodeId) -> Result<()> {
        self.get(parent)?;
        self.get(child)?;
        if self.in_subtree(child, parent) {
            return Err(Error::Invalid(format!(
                "attaching {child:?} under {parent:?} would create a cycle"
            )));
        }
        Ok(())
    }

    /// Remove a node from its current parent's child list.
    fn unlink_parent(&mut self, child: NodeId) -> Option<NodeId> {
        let parent = self.nodes.get_mut(child)?.parent.take()?;
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.retain(|c| *c != child);
        }
        Some(parent)
    }

    /// Append an existing node to `parent`, moving it from its previous
    /// parent if it had one.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check_edge(parent, child)?;
        if self.parent(child) == Some(parent) {
            return Ok(());
        }
        if let Some(old) = self.unlink_parent(child) {
            self.invalidate(old, InvalidationReason::ChildInvalidated);
        }
        self.get_mut(child)?.parent = Some(parent);
        self.get_mut(parent)?.children.push(child);
        self.restyle(child);
        self.invalidate(parent, InvalidationReason::ChildInvalidated);
        Ok(())
    }

    /// Drop the rendered content of a subtree whose inherited colors may
    /// have changed. Fresh leaves have nothing to drop.
    fn restyle(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        if node.children.is_empty() && node.cache.renders() == 0 {
            return;
        }
        node.dirty = true;
        node.cache.invalidate(InvalidationReason::StateChanged);
        self.invalidate_children(id, InvalidationReason::StateChanged, None);
    }

    /// Detach a node from its parent. The node stays alive.
    pub fn detach(&mut self, child: NodeId) -> Result<()> {
        self.get(child)?;
        if let Some(parent) = self.unlink_parent(child) {
            self.invalidate(parent, InvalidationReason::ChildInvalidated);
        }
        Ok(())
    }

    /// Replace the child list of `parent`. Previous children that are not in
    /// the new list are detached but stay alive.
    pub fn set_children(&mut self, parent: NodeId, children: Vec<NodeId>) -> Result<()> {
        let mut seen = HashSet::new();
        for c in &children {
            if !seen.insert(*c) {
                return Err(Error::Invalid(format!("duplicate child {c:?}")));
            }
            self.check_edge(parent, *c)?;
        }
        let old = mem::take(&mut self.get_mut(parent)?.children);
        for c in old {
            if !seen.contains(&c)
                && let Some(n) = self.nodes.get_mut(c)
            {
                n.parent = None;
            }
        }
        for c in &children {
            if self.parent(*c) == Some(parent) {
                continue;
            }
            if let Some(prev) = self.unlink_parent(*c) {
                self.invalidate(prev, InvalidationReason::ChildInvalidated);
            }
            self.get_mut(*c)?.parent = Some(parent);
            self.restyle(*c);
        }
        self.get_mut(parent)?.children = children;
        self.invalidate(parent, InvalidationReason::ChildInvalidated);
        Ok(())
    }

    /// Remove every child subtree of `parent` and insert fresh children.
    pub fn rebuild_children(
        &mut self,
        parent: NodeId,
        controls: Vec<Box<dyn Control>>,
    ) -> Result<Vec<NodeId>> {
        for c in self.get(parent)?.children.clone() {
            self.remove_subtree(c)?;
        }
        let ids: Vec<NodeId> = controls
            .into_iter()
            .map(|c| self.insert_boxed(c))
            .collect();
        self.set_children(parent, ids.clone())?;
        Ok(ids)
    }

    /// A node and all of its descendants, in pre-order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            let Some(node) = self.nodes.get(n) else {
                continue;
            };
            if !seen.insert(n) {
                continue;
            }
            out.push(n);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// Remove a node and everything below it. Returns the removed ids in
    /// pre-order. The former parent is invalidated.
    pub fn remove_subtree(&mut self, id: NodeId) -> Result<Vec<NodeId>> {
        self.get(id)?;
        self.detach(id)?;
        let removed = self.descendants(id);
        for n in &removed {
            self.nodes.remove(*n);
        }
        debug!(count = removed.len(), "removed subtree");
        Ok(removed)
    }

    /// Make `to` a dependent of `from`: invalidating `from` also invalidates
    /// `to`. Dependents may form cycles.
    pub fn link(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        self.get(to)?;
        let node = self.get_mut(from)?;
        if !node.dependents.contains(&to) {
            node.dependents.push(to);
        }
        Ok(())
    }

    /// Remove a dependent edge.
    pub fn unlink(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        self.get_mut(from)?.dependents.retain(|d| *d != to);
        Ok(())
    }

    /// Set the portal host back-reference of a detached content root.
    pub(crate) fn set_host(&mut self, id: NodeId, host: Option<NodeId>) -> Result<()> {
        self.get_mut(id)?.host = host;
        Ok(())
    }

    /// Rename a node.
    pub fn set_name(&mut self, id: NodeId, name: &str) -> Result<()> {
        self.get_mut(id)?.name = NodeName::convert(name);
        Ok(())
    }

    /// Replace a node's layout configuration.
    pub fn set_layout(&mut self, id: NodeId, layout: Layout) -> Result<()> {
        let node = self.get_mut(id)?;
        if node.layout != layout {
            node.layout = layout;
            self.invalidate(id, InvalidationReason::PropertyChanged);
        }
        Ok(())
    }

    /// Modify a node's layout configuration in place.
    pub fn update_layout(&mut self, id: NodeId, f: impl FnOnce(&mut Layout)) -> Result<()> {
        let mut layout = self.get(id)?.layout;
        f(&mut layout);
        self.set_layout(id, layout)
    }

    /// Show or hide a node. Hidden nodes take no space.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> Result<()> {
        let node = self.get_mut(id)?;
        if node.visible != visible {
            node.visible = visible;
            self.invalidate(id, InvalidationReason::SizeChanged);
        }
        Ok(())
    }

    /// Set a node's color overrides. The node, its descendants and any portal
    /// content they host repaint.
    pub fn set_colors(&mut self, id: NodeId, colors: ColorOverride) -> Result<()> {
        let node = self.get_mut(id)?;
        if node.colors != colors {
            node.colors = colors;
            self.invalidate(id, InvalidationReason::StateChanged);
            self.invalidate_children(id, InvalidationReason::StateChanged, None);
        }
        Ok(())
    }

    /// Borrow a node's control as a concrete type.
    pub fn control<T: Control>(&self, id: NodeId) -> Result<&T> {
        control::downcast_ref(self.get(id)?.control.as_ref())
            .ok_or(Error::ControlType(type_name::<T>()))
    }

    /// Borrow a node's control mutably as a concrete type. Nothing is
    /// invalidated; see [`update`](Self::update).
    pub fn control_mut<T: Control>(&mut self, id: NodeId) -> Result<&mut T> {
        control::downcast_mut(self.get_mut(id)?.control.as_mut())
            .ok_or(Error::ControlType(type_name::<T>()))
    }

    /// Modify a node's control and invalidate the node for `reason`.
    pub fn update<T: Control, R>(
        &mut self,
        id: NodeId,
        reason: InvalidationReason,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<R> {
        let out = f(self.control_mut::<T>(id)?);
        self.invalidate(id, reason);
        Ok(out)
    }

    /// A node followed by its ancestors, nearest first. With `cross_hosts`,
    /// the walk continues from a portal content root to the portal's owner.
    /// The walk stops after `max_depth` steps.
    pub fn lineage(&self, id: NodeId, cross_hosts: bool) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cur = Some(id);
        while let Some(n) = cur {
            let Some(node) = self.nodes.get(n) else {
                break;
            };
            if out.len() >= self.max_depth {
                warn!(limit = self.max_depth, "ancestor walk hit depth limit");
                break;
            }
            out.push(n);
            cur = node.parent.or(if cross_hosts { node.host } else { None });
        }
        out
    }

    /// Resolve a node's colors: the nearest override for each channel on the
    /// way to the root, then `defaults`.
    pub fn resolve_colors(&self, id: NodeId, defaults: Colors) -> Colors {
        let mut fg = None;
        let mut bg = None;
        for n in self.lineage(id, true) {
            let c = self.nodes[n].colors;
            fg = fg.or(c.fg);
            bg = bg.or(c.bg);
            if fg.is_some() && bg.is_some() {
                break;
            }
        }
        ColorOverride { fg, bg }.apply(defaults)
    }

    /// The nearest node, starting with `id` itself, whose control is a window.
    pub fn find_enclosing_window(&self, id: NodeId) -> Option<NodeId> {
        self.lineage(id, true)
            .into_iter()
            .find(|n| self.nodes[*n].control.is_window())
    }

    /// The root of the subtree containing `id`.
    pub fn root_of(&self, id: NodeId) -> Option<NodeId> {
        self.lineage(id, false).last().copied()
    }

    /// A node's arranged rectangle in window coordinates. `None` if the node
    /// is missing or the walk exceeds the depth limit.
    pub fn absolute_bounds(&self, id: NodeId) -> Option<Rect> {
        let chain = self.lineage(id, false);
        let root = *chain.last()?;
        if self.nodes[root].parent.is_some() {
            return None;
        }
        let mut r = self.nodes[id].bounds;
        for ancestor in chain.iter().skip(1) {
            let a = &self.nodes[*ancestor];
            r = r.shift(
                a.bounds.tl.x + a.layout.margin.left,
                a.bounds.tl.y + a.layout.margin.top,
            );
        }
        Some(r)
    }

    /// A node's content rectangle in window coordinates.
    pub fn absolute_content(&self, id: NodeId) -> Option<Rect> {
        let abs = self.absolute_bounds(id)?;
        let content = self.nodes[id].content_rect();
        Some(content.shift(abs.tl.x, abs.tl.y))
    }

    /// Measure a subtree under `c`. See [`crate::layout`].
    pub fn measure(&mut self, id: NodeId, c: Constraints) -> Result<Expanse> {
        LayoutPass::new(self).measure(id, c)
    }

    /// Arrange a measured subtree into `bounds`.
    pub fn arrange(&mut self, id: NodeId, bounds: Rect) -> Result<()> {
        LayoutPass::new(self).arrange(id, bounds)
    }

    /// Measure `id` with tight constraints and arrange it to fill `bounds`.
    pub fn layout_at(&mut self, id: NodeId, bounds: Rect) -> Result<()> {
        debug!(?id, ?bounds, "layout pass");
        let mut pass = LayoutPass::new(self);
        pass.measure(id, Constraints::tight(bounds.expanse()))?;
        pass.arrange(id, bounds)
    }

    /// Layout a root at the origin.
    pub fn layout_root(&mut self, id: NodeId, size: Expanse) -> Result<()> {
        self.layout_at(id, Rect::at(Point::zero(), size))
    }

    /// Invalidate a node, its ancestors and its dependents.
    pub fn invalidate(&mut self, id: NodeId, reason: InvalidationReason) -> InvalidationReport {
        invalidate::upward(self, id, reason, None)
    }

    /// As [`invalidate`](Self::invalidate), without propagating back into
    /// `caller`.
    pub fn invalidate_from(
        &mut self,
        id: NodeId,
        reason: InvalidationReason,
        caller: Option<NodeId>,
    ) -> InvalidationReport {
        invalidate::upward(self, id, reason, caller)
    }

    /// Invalidate the cached content of every descendant of `id`, including
    /// portal content hosted in the subtree, skipping the caller's subtree.
    /// Nothing is re-measured.
    pub fn invalidate_children(
        &mut self,
        id: NodeId,
        reason: InvalidationReason,
        caller: Option<NodeId>,
    ) -> InvalidationReport {
        invalidate::downward(self, id, reason, caller)
    }

    /// A shareable handle to a node's render cache. The cache may be
    /// invalidated from any thread.
    pub fn cache(&self, id: NodeId) -> Result<Arc<RenderCache<TermBuf>>> {
        Ok(Arc::clone(&self.get(id)?.cache))
    }

    /// Run every control's ingest hook and invalidate the ones that report
    /// a change. Returns the number of nodes invalidated.
    pub(crate) fn ingest_all(&mut self) -> usize {
        let changed: Vec<(NodeId, InvalidationReason)> = self
            .nodes
            .iter_mut()
            .filter_map(|(id, n)| n.control.ingest().map(|r| (id, r)))
            .collect();
        for (id, reason) in &changed {
            self.invalidate(*id, *reason);
        }
        changed.len()
    }

    /// Clear the dirty flag on a node after painting.
    pub(crate) fn mark_clean(&mut self, id: NodeId) {
        if let Some(n) = self.nodes.get_mut(id) {
            n.dirty = false;
        }
    }
}
