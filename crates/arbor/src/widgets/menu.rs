use crate::{
    NodeId,
    color::Colors,
    control::{Control, Focusable, Measurable, Paintable},
    error::{Error, Result},
    geom::{Constraints, Expanse, Point, Rect},
    layout::Layout,
    portal::{Placement, PortalId},
    termbuf::TermBuf,
    widgets::width,
    window::Window,
};

/// A vertical list of labels with one highlighted row. Menus are usually
/// shown as portal content; a row can open a nested submenu to its right.
#[derive(Debug, Clone)]
pub struct Menu {
    /// Row labels.
    items: Vec<String>,
    /// Highlighted row.
    highlighted: usize,
    /// Whether the menu holds focus.
    focused: bool,
}

impl Menu {
    /// A menu with the given rows.
    pub fn new<S: Into<String>>(items: impl IntoIterator<Item = S>) -> Self {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            highlighted: 0,
            focused: false,
        }
    }

    /// Start with a different highlighted row.
    #[must_use]
    pub fn with_highlighted(mut self, row: usize) -> Self {
        self.set_highlighted(row);
        self
    }

    /// Row labels.
    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// Highlighted row.
    pub fn highlighted(&self) -> usize {
        self.highlighted
    }

    /// Highlight a row. Out-of-range rows are ignored.
    pub fn set_highlighted(&mut self, row: usize) {
        if row < self.items.len() {
            self.highlighted = row;
        }
    }

    /// Whether the menu holds focus.
    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Natural size: the widest label plus a cell of padding either side,
    /// one row per item.
    pub fn natural_size(&self) -> Expanse {
        let w = self.items.iter().map(|i| width(i)).max().unwrap_or(0);
        Expanse::new(
            w.saturating_add(2),
            u32::try_from(self.items.len()).unwrap_or(u32::MAX),
        )
    }

    /// Open `submenu` next to row `row` of the menu at `menu`, preferring the
    /// right-hand side. The submenu nests inside the menu's portal, follows
    /// the row if the menu moves, and closes with it.
    pub fn open_submenu(
        window: &mut Window,
        menu: NodeId,
        row: usize,
        submenu: Self,
    ) -> Result<PortalId> {
        let rows = window.tree().control::<Self>(menu)?.items.len();
        let offset = u32::try_from(row)
            .ok()
            .filter(|_| row < rows)
            .ok_or_else(|| Error::Invalid(format!("menu has no row {row}")))?;
        let size = submenu.natural_size();
        let content = window.tree_mut().insert(submenu);
        window.open_portal_at_row(menu, offset, content, size, Placement::Right)
    }
}

impl Control for Menu {
    fn layout(&self) -> Layout {
        Layout::column()
    }

    fn as_measurable(&self) -> Option<&dyn Measurable> {
        Some(self)
    }

    fn as_paintable(&mut self) -> Option<&mut dyn Paintable> {
        Some(self)
    }

    fn as_focusable(&mut self) -> Option<&mut dyn Focusable> {
        Some(self)
    }
}

impl Measurable for Menu {
    fn measure(&self, _c: Constraints) -> Expanse {
        self.natural_size()
    }
}

impl Paintable for Menu {
    fn paint(&mut self, buf: &mut TermBuf, bounds: Rect, _clip: Rect, colors: Colors) -> Result<()> {
        buf.fill(bounds, ' ', colors);
        for (y, (idx, item)) in (0..bounds.h).zip(self.items.iter().enumerate()) {
            let row = if idx == self.highlighted {
                colors.inverted()
            } else {
                colors
            };
            let line = Rect::new(bounds.tl.x, bounds.tl.y + y, bounds.w, 1);
            buf.fill(line, ' ', row);
            buf.text(
                Point::new(line.tl.x + 1, line.tl.y),
                item,
                row,
                bounds.w.saturating_sub(2),
            );
        }
        Ok(())
    }
}

impl Focusable for Menu {
    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}
