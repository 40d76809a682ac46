//! Dropdown control for single-value selection. The option list opens as a
//! [`Menu`] in a portal below the dropdown, or above it near the screen bottom.

use crate::{
    TypedId,
    color::Colors,
    control::{Control, Measurable, Paintable},
    error::Result,
    geom::{Constraints, Expanse, Rect},
    invalidate::InvalidationReason,
    layout::Layout,
    portal::{Placement, PortalId},
    termbuf::TermBuf,
    widgets::{Menu, width},
    window::Window,
};

/// Indicator drawn after the selected label.
const INDICATOR: &str = " ▼";

/// Items that can be shown in a [`Dropdown`].
pub trait DropdownItem {
    /// Display label.
    fn label(&self) -> &str;
}

impl DropdownItem for String {
    fn label(&self) -> &str {
        self
    }
}

impl DropdownItem for &'static str {
    fn label(&self) -> &str {
        self
    }
}

/// A single-line control showing the selected item.
pub struct Dropdown<T> {
    /// Available items.
    items: Vec<T>,
    /// Selected index.
    selected: usize,
}

impl<T> Dropdown<T>
where
    T: DropdownItem + Send + 'static,
{
    /// A dropdown over `items`, with the first selected.
    pub fn new(items: Vec<T>) -> Self {
        Self { items, selected: 0 }
    }

    /// Selected item, if there are any items.
    pub fn selected(&self) -> Option<&T> {
        self.items.get(self.selected)
    }

    /// Selected index.
    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if there are no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The portal showing the option list of the dropdown at `id`, while
    /// open. The window may reopen the list under a new id when the dropdown
    /// moves, so the list is looked up by owner rather than remembered.
    pub fn list_portal(window: &Window, id: TypedId<Self>) -> Option<PortalId> {
        window.portals().owned_by(id.id()).first().copied()
    }

    /// Open the option list, or close it if it is open. Returns the portal
    /// when opened.
    pub fn toggle(window: &mut Window, id: TypedId<Self>) -> Result<Option<PortalId>> {
        if let Some(open) = Self::list_portal(window, id) {
            window.close_portal(open)?;
            return Ok(None);
        }
        let dropdown = id.get(window.tree())?;
        let menu = Menu::new(dropdown.items.iter().map(|i| i.label().to_string()))
            .with_highlighted(dropdown.selected);
        let size = menu.natural_size();
        let content = window.tree_mut().insert(menu);
        window
            .open_portal_at_owner(id.id(), content, size, Placement::Below)
            .map(Some)
    }

    /// Select `index`, closing the option list if it is open. Out-of-range
    /// indices leave the selection unchanged.
    pub fn confirm(window: &mut Window, id: TypedId<Self>, index: usize) -> Result<()> {
        if let Some(open) = Self::list_portal(window, id) {
            window.close_portal(open)?;
        }
        id.update(window.tree_mut(), InvalidationReason::ContentChanged, |d| {
            if index < d.items.len() {
                d.selected = index;
            }
        })
    }
}

impl<T> Control for Dropdown<T>
where
    T: DropdownItem + Send + 'static,
{
    fn layout(&self) -> Layout {
        Layout::column().height(1)
    }

    fn as_measurable(&self) -> Option<&dyn Measurable> {
        Some(self)
    }

    fn as_paintable(&mut self) -> Option<&mut dyn Paintable> {
        Some(self)
    }
}

impl<T> Measurable for Dropdown<T>
where
    T: DropdownItem,
{
    fn measure(&self, _c: Constraints) -> Expanse {
        let widest = self
            .items
            .iter()
            .map(|i| width(i.label()))
            .max()
            .unwrap_or(0);
        Expanse::new(widest.saturating_add(width(INDICATOR)), 1)
    }
}

impl<T> Paintable for Dropdown<T>
where
    T: DropdownItem,
{
    fn paint(&mut self, buf: &mut TermBuf, bounds: Rect, _clip: Rect, colors: Colors) -> Result<()> {
        buf.fill(bounds, ' ', colors);
        let label = self.items.get(self.selected).map_or("", |i| i.label());
        buf.text(bounds.tl, &format!("{label}{INDICATOR}"), colors, bounds.w);
        Ok(())
    }
}
