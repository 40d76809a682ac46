//! Built-in controls.

/// Dropdown selector.
pub mod dropdown;
/// Scrolling log view.
pub mod log_view;
/// Popup menu.
pub mod menu;
/// Plain container with a background.
pub mod panel;
/// Wrapped text.
pub mod text;

pub use dropdown::{Dropdown, DropdownItem};
pub use log_view::LogView;
pub use menu::Menu;
pub use panel::Panel;
pub use text::Text;

use unicode_width::UnicodeWidthStr;

/// Display width of a string in cells.
pub(crate) fn width(s: &str) -> u32 {
    u32::try_from(s.width()).unwrap_or(u32::MAX)
}
