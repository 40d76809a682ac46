//! Portals: overlay content anchored to a node and painted above the tree.
//!
//! A portal's content is a detached subtree in the same arena. Its position
//! is resolved from an anchor rectangle and never edited in place: when the
//! anchor moves, the portal is closed and a new one is opened. Portals
//! anchored to their owner are checked after every layout, so they follow the
//! owner wherever the layout puts it.

use std::collections::HashMap;

use slotmap::{SlotMap, new_key_type};

use crate::{
    NodeId,
    error::{Error, Result},
    geom::{Expanse, Point, Rect},
};

new_key_type! {
    /// Identifier of an open portal.
    pub struct PortalId;
}

/// Which side of the anchor the content prefers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Placement {
    /// Under the anchor, left edges aligned.
    #[default]
    Below,
    /// Over the anchor, left edges aligned.
    Above,
    /// To the right of the anchor, top edges aligned.
    Right,
    /// To the left of the anchor, top edges aligned.
    Left,
}

impl Placement {
    /// The side tried when this one does not fit.
    pub fn opposite(self) -> Self {
        match self {
            Self::Below => Self::Above,
            Self::Above => Self::Below,
            Self::Right => Self::Left,
            Self::Left => Self::Right,
        }
    }

    /// Candidate origin for content of `size` on this side of `anchor`, in
    /// signed coordinates so off-screen candidates can be tested.
    fn candidate(self, anchor: Rect, size: Expanse) -> (i64, i64) {
        let ax = i64::from(anchor.tl.x);
        let ay = i64::from(anchor.tl.y);
        match self {
            Self::Below => (ax, ay + i64::from(anchor.h)),
            Self::Above => (ax, ay - i64::from(size.h)),
            Self::Right => (ax + i64::from(anchor.w), ay),
            Self::Left => (ax - i64::from(size.w), ay),
        }
    }
}

/// Where a portal's anchor rectangle comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AnchorSource {
    /// A rectangle given when the portal was opened.
    #[default]
    Fixed,
    /// The owner's window rectangle.
    Owner,
    /// One row of the owner's window rectangle, counted from its top.
    OwnerRow(u32),
}

impl AnchorSource {
    /// The anchor for an owner occupying `owner` in window coordinates, or
    /// `None` for fixed anchors.
    pub fn resolve(self, owner: Rect) -> Option<Rect> {
        match self {
            Self::Fixed => None,
            Self::Owner => Some(owner),
            Self::OwnerRow(row) => Some(Rect::at(
                owner.tl.offset(0, row),
                Expanse::new(owner.w, 1),
            )),
        }
    }
}

/// True if content of `size` at `origin` lies wholly inside `screen`.
fn fits(origin: (i64, i64), size: Expanse, screen: Rect) -> bool {
    let (x, y) = origin;
    x >= i64::from(screen.tl.x)
        && y >= i64::from(screen.tl.y)
        && x + i64::from(size.w) <= i64::from(screen.right())
        && y + i64::from(size.h) <= i64::from(screen.bottom())
}

/// Clamp one coordinate so `[v, v + extent)` stays inside `[lo, hi)`. Content
/// longer than the range starts at `lo`.
fn clamp_coord(v: i64, extent: u32, lo: u32, hi: u32) -> u32 {
    let latest = i64::from(hi) - i64::from(extent);
    let v = if latest < i64::from(lo) {
        i64::from(lo)
    } else {
        v.clamp(i64::from(lo), latest)
    };
    u32::try_from(v).unwrap_or(lo)
}

/// Resolve where content of `size` goes. The preferred side wins if it fits,
/// then the opposite side, then the preferred side anyway. The chosen origin
/// is clamped into `screen`; the size is never changed.
pub fn resolve_placement(
    anchor: Rect,
    size: Expanse,
    preferred: Placement,
    screen: Rect,
) -> (Placement, Rect) {
    let first = preferred.candidate(anchor, size);
    let second = preferred.opposite().candidate(anchor, size);
    let (side, (x, y)) = if fits(first, size, screen) {
        (preferred, first)
    } else if fits(second, size, screen) {
        (preferred.opposite(), second)
    } else {
        (preferred, first)
    };
    let origin = Point::new(
        clamp_coord(x, size.w, screen.tl.x, screen.right()),
        clamp_coord(y, size.h, screen.tl.y, screen.bottom()),
    );
    (side, Rect::at(origin, size))
}

/// An open portal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Portal {
    /// The node that opened the portal.
    pub owner: NodeId,
    /// Root of the content subtree.
    pub content: NodeId,
    /// Anchor rectangle in window coordinates.
    pub anchor: Rect,
    /// Where `anchor` came from.
    pub anchor_source: AnchorSource,
    /// Content size requested at open time.
    pub size: Expanse,
    /// Side asked for.
    pub preferred: Placement,
    /// Side chosen.
    pub placement: Placement,
    /// Resolved rectangle in window coordinates.
    pub bounds: Rect,
    /// Enclosing portal, when the owner lives inside another portal's content.
    pub parent: Option<PortalId>,
    /// Nesting depth; top-level portals are at zero.
    pub depth: usize,
    /// Creation sequence, for stable paint order.
    pub(crate) seq: u64,
}

/// All open portals of a window.
#[derive(Debug, Default)]
pub struct PortalRegistry {
    /// Portal storage.
    portals: SlotMap<PortalId, Portal>,
    /// Lookup from content root to portal.
    by_content: HashMap<NodeId, PortalId>,
    /// Next creation sequence number.
    next_seq: u64,
}

impl PortalRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open portals.
    pub fn len(&self) -> usize {
        self.portals.len()
    }

    /// True if no portals are open.
    pub fn is_empty(&self) -> bool {
        self.portals.is_empty()
    }

    /// Record a new portal, assigning its depth and creation sequence.
    pub(crate) fn insert(&mut self, mut portal: Portal) -> PortalId {
        portal.depth = portal
            .parent
            .and_then(|p| self.portals.get(p))
            .map_or(0, |p| p.depth + 1);
        portal.seq = self.next_seq;
        self.next_seq += 1;
        let content = portal.content;
        let id = self.portals.insert(portal);
        self.by_content.insert(content, id);
        id
    }

    /// Look up a portal.
    pub fn get(&self, id: PortalId) -> Result<&Portal> {
        self.portals.get(id).ok_or(Error::PortalNotFound(id))
    }

    /// Re-resolve every portal's position against a new screen. Anchors are
    /// left alone.
    pub(crate) fn reresolve(&mut self, screen: Rect) {
        for p in self.portals.values_mut() {
            let (side, bounds) = resolve_placement(p.anchor, p.size, p.preferred, screen);
            p.placement = side;
            p.bounds = bounds;
        }
    }

    /// The portal whose content root is `node`.
    pub fn by_content(&self, node: NodeId) -> Option<PortalId> {
        self.by_content.get(&node).copied()
    }

    /// Portals opened by `owner`, oldest first.
    pub fn owned_by(&self, owner: NodeId) -> Vec<PortalId> {
        let mut out: Vec<(u64, PortalId)> = self
            .portals
            .iter()
            .filter(|(_, p)| p.owner == owner)
            .map(|(id, p)| (p.seq, id))
            .collect();
        out.sort_unstable();
        out.into_iter().map(|(_, id)| id).collect()
    }

    /// Portals nested directly inside `id`, oldest first.
    pub fn nested_in(&self, id: PortalId) -> Vec<PortalId> {
        let mut out: Vec<(u64, PortalId)> = self
            .portals
            .iter()
            .filter(|(_, p)| p.parent == Some(id))
            .map(|(k, p)| (p.seq, k))
            .collect();
        out.sort_unstable();
        out.into_iter().map(|(_, k)| k).collect()
    }

    /// `id` and every portal nested below it, deepest first and `id` last.
    pub fn teardown_order(&self, id: PortalId) -> Vec<PortalId> {
        let mut out = Vec::new();
        let mut stack = vec![(id, false)];
        while let Some((p, expanded)) = stack.pop() {
            if expanded {
                out.push(p);
                continue;
            }
            if out.contains(&p) || !self.portals.contains_key(p) {
                continue;
            }
            stack.push((p, true));
            // Newest nested portals close first.
            for child in self.nested_in(p) {
                stack.push((child, false));
            }
        }
        out
    }

    /// Forget a portal. Nested portals are not touched.
    pub(crate) fn remove(&mut self, id: PortalId) -> Option<Portal> {
        let p = self.portals.remove(id)?;
        self.by_content.remove(&p.content);
        Some(p)
    }

    /// Open portals in paint order: shallow before deep, then by creation.
    pub fn paint_order(&self) -> Vec<PortalId> {
        let mut out: Vec<(usize, u64, PortalId)> = self
            .portals
            .iter()
            .map(|(id, p)| (p.depth, p.seq, id))
            .collect();
        out.sort_unstable();
        out.into_iter().map(|(_, _, id)| id).collect()
    }
}
