//! Invalidation: marking nodes stale and propagating the change.
//!
//! Propagation runs over an explicit work-list with a visited set, so a node
//! is processed at most once per call no matter how the parent and dependent
//! edges loop back on each other.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::trace;

use crate::{NodeId, ingest::Inbox, node::Node, tree::Tree};

/// Why a node was invalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvalidationReason {
    /// A layout property changed.
    PropertyChanged,
    /// The displayed content changed.
    ContentChanged,
    /// The node's size requirements changed.
    SizeChanged,
    /// A descendant was invalidated in a way that may change this node's size.
    ChildInvalidated,
    /// Focus moved to or from the node.
    FocusChanged,
    /// Visual state changed without affecting size.
    StateChanged,
}

impl InvalidationReason {
    /// True if the node must be measured again.
    pub fn affects_layout(self) -> bool {
        !matches!(self, Self::FocusChanged | Self::StateChanged)
    }

    /// The reason delivered to a parent. Layout changes become
    /// `ChildInvalidated`; paint-only reasons pass through unchanged so
    /// ancestors repaint without re-measuring.
    pub fn upward(self) -> Self {
        if self.affects_layout() {
            Self::ChildInvalidated
        } else {
            self
        }
    }
}

/// What one invalidation call touched.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InvalidationReport {
    /// Nodes marked stale.
    pub visited: usize,
    /// Edges not followed because they led back to the caller, or ids that
    /// no longer exist.
    pub skipped: usize,
    /// Re-entries into a node already processed in this call.
    pub suppressed: usize,
}

/// Mark a node stale for `reason`.
fn mark(node: &mut Node, reason: InvalidationReason) {
    node.dirty = true;
    node.cache.invalidate(reason);
    if reason.affects_layout() {
        node.measured = None;
    }
}

/// Invalidate `start`, its ancestors and its dependents. An edge from `start`
/// back to `caller` is not followed; `caller` is still reached through any
/// later hop.
pub(crate) fn upward(
    tree: &mut Tree,
    start: NodeId,
    reason: InvalidationReason,
    caller: Option<NodeId>,
) -> InvalidationReport {
    let mut report = InvalidationReport::default();
    let mut visited = HashSet::new();
    let mut work = VecDeque::from([(start, reason)]);
    while let Some((id, reason)) = work.pop_front() {
        if !visited.insert(id) {
            report.suppressed += 1;
            continue;
        }
        let Some(node) = tree.nodes.get_mut(id) else {
            report.skipped += 1;
            continue;
        };
        trace!(node = %node.name, ?reason, "invalidate");
        mark(node, reason);
        report.visited += 1;

        let next = node
            .parent
            .map(|p| (p, reason.upward()))
            .into_iter()
            .chain(node.dependents.iter().map(|d| (*d, reason)));
        for (target, reason) in next {
            if id == start && Some(target) == caller {
                report.skipped += 1;
            } else {
                work.push_back((target, reason));
            }
        }
    }
    report
}

/// Portal content roots keyed by the node hosting them.
fn hosted_content(tree: &Tree) -> HashMap<NodeId, Vec<NodeId>> {
    let mut hosted: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for (id, node) in &tree.nodes {
        if let Some(host) = node.host {
            hosted.entry(host).or_default().push(id);
        }
    }
    hosted
}

/// Children of `id` followed by the portal content it hosts.
fn below(tree: &Tree, hosted: &HashMap<NodeId, Vec<NodeId>>, id: NodeId) -> Vec<NodeId> {
    let children = tree.nodes.get(id).map_or(&[][..], |n| n.children.as_slice());
    let portals = hosted.get(&id).map_or(&[][..], Vec::as_slice);
    children.iter().chain(portals).copied().collect()
}

/// Invalidate the cached content of every descendant of `start` without
/// touching `start` or forcing a re-measure. Portal content hosted anywhere
/// in the subtree, `start` included, counts as a descendant. The caller's
/// subtree is skipped.
pub(crate) fn downward(
    tree: &mut Tree,
    start: NodeId,
    reason: InvalidationReason,
    caller: Option<NodeId>,
) -> InvalidationReport {
    let hosted = hosted_content(tree);
    let mut report = InvalidationReport::default();
    let mut visited = HashSet::from([start]);
    let mut work = VecDeque::from(below(tree, &hosted, start));
    while let Some(id) = work.pop_front() {
        if Some(id) == caller {
            report.skipped += 1;
            continue;
        }
        if !visited.insert(id) {
            report.suppressed += 1;
            continue;
        }
        let Some(node) = tree.nodes.get_mut(id) else {
            report.skipped += 1;
            continue;
        };
        node.dirty = true;
        node.cache.invalidate(reason);
        report.visited += 1;
        work.extend(below(tree, &hosted, id));
    }
    report
}

/// A cloneable, `Send` handle for requesting invalidations from other
/// threads. Requests are applied at the start of the window's next layout.
#[derive(Clone, Debug)]
pub struct InvalidationHandle {
    /// Pending requests.
    inbox: Inbox<(NodeId, InvalidationReason)>,
}

impl InvalidationHandle {
    /// A handle feeding the given inbox.
    pub(crate) fn new(inbox: Inbox<(NodeId, InvalidationReason)>) -> Self {
        Self { inbox }
    }

    /// Queue an invalidation of `id`.
    pub fn invalidate(&self, id: NodeId, reason: InvalidationReason) {
        self.inbox.push((id, reason));
    }

    /// True if requests are waiting to be applied.
    pub fn is_pending(&self) -> bool {
        self.inbox.has_pending()
    }
}
