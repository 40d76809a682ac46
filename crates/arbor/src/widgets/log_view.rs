use std::collections::VecDeque;

use crate::{
    color::Colors,
    control::{Control, Measurable, Paintable},
    error::Result,
    geom::{Constraints, Expanse, Rect},
    ingest::{Inbox, LogSource},
    invalidate::InvalidationReason,
    layout::Layout,
    termbuf::TermBuf,
    widgets::width,
};

/// Default number of retained lines.
const DEFAULT_CAPACITY: usize = 1000;

/// A tail view over lines pushed from any thread.
///
/// Lines are queued in an [`Inbox`] and pulled in once per frame, so
/// producers never touch the tree. The newest lines are shown at the bottom.
pub struct LogView {
    /// Incoming lines.
    inbox: Inbox<String>,
    /// Retained lines, oldest first.
    entries: VecDeque<String>,
    /// Maximum retained lines.
    capacity: usize,
    /// Layout applied on insert.
    layout: Layout,
}

impl LogView {
    /// A view fed by `inbox`.
    pub fn new(inbox: Inbox<String>) -> Self {
        Self {
            inbox,
            entries: VecDeque::new(),
            capacity: DEFAULT_CAPACITY,
            layout: Layout::default(),
        }
    }

    /// A view showing `tracing` output written through `source`.
    pub fn from_source(source: &LogSource) -> Self {
        Self::new(source.inbox())
    }

    /// Retain at most `capacity` lines.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Use a specific layout.
    #[must_use]
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// The inbox producers push to.
    pub fn inbox(&self) -> Inbox<String> {
        self.inbox.clone()
    }

    /// Retained lines, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Number of retained lines.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is retained.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Control for LogView {
    fn layout(&self) -> Layout {
        self.layout
    }

    fn as_measurable(&self) -> Option<&dyn Measurable> {
        Some(self)
    }

    fn as_paintable(&mut self) -> Option<&mut dyn Paintable> {
        Some(self)
    }

    fn ingest(&mut self) -> Option<InvalidationReason> {
        let drained = self.inbox.drain();
        if drained.is_empty() {
            return None;
        }
        if drained.clear {
            self.entries.clear();
        }
        self.entries.extend(drained.items);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        Some(InvalidationReason::ContentChanged)
    }
}

impl Measurable for LogView {
    fn measure(&self, _c: Constraints) -> Expanse {
        let w = self.entries.iter().map(|e| width(e)).max().unwrap_or(0);
        Expanse::new(w, u32::try_from(self.entries.len()).unwrap_or(u32::MAX))
    }
}

impl Paintable for LogView {
    fn paint(&mut self, buf: &mut TermBuf, bounds: Rect, _clip: Rect, colors: Colors) -> Result<()> {
        buf.fill(bounds, ' ', colors);
        let shown = self.entries.len().min(bounds.h as usize);
        let start = self.entries.len() - shown;
        for (y, line) in (0..bounds.h).zip(self.entries.iter().skip(start)) {
            buf.text(bounds.tl.offset(0, y), line, colors, bounds.w);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingest_applies_clear_then_items() {
        let mut v = LogView::new(Inbox::new()).with_capacity(3);
        let inbox = v.inbox();
        assert_eq!(v.ingest(), None);
        inbox.extend(["a", "b", "c", "d"].map(String::from));
        assert_eq!(v.ingest(), Some(InvalidationReason::ContentChanged));
        assert_eq!(v.entries().collect::<Vec<_>>(), vec!["b", "c", "d"]);
        inbox.clear();
        inbox.push("e".into());
        v.ingest();
        assert_eq!(v.entries().collect::<Vec<_>>(), vec!["e"]);
    }

    #[test]
    fn paints_the_tail() {
        let mut v = LogView::new(Inbox::new());
        v.inbox().extend(["one", "two", "three"].map(String::from));
        v.ingest();
        let mut buf = TermBuf::new((5, 2), Colors::default());
        let r = buf.rect();
        v.paint(&mut buf, r, r, Colors::default()).unwrap();
        assert_eq!(buf.lines(), vec!["two  ", "three"]);
    }
}
