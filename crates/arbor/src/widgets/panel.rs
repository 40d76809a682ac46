use crate::{
    color::Colors,
    control::{Control, Paintable},
    error::Result,
    geom::Rect,
    layout::Layout,
    termbuf::TermBuf,
};

/// A container that fills its content box before its children paint over it.
#[derive(Debug, Clone, Copy)]
pub struct Panel {
    /// Layout applied on insert.
    layout: Layout,
    /// Fill character.
    fill: char,
}

impl Panel {
    /// A panel with the given layout, filled with spaces.
    pub fn new(layout: Layout) -> Self {
        Self { layout, fill: ' ' }
    }

    /// A row panel.
    pub fn row() -> Self {
        Self::new(Layout::row())
    }

    /// A column panel.
    pub fn column() -> Self {
        Self::new(Layout::column())
    }

    /// A stack panel.
    pub fn stack() -> Self {
        Self::new(Layout::stack())
    }

    /// Use a different fill character.
    #[must_use]
    pub fn with_fill(mut self, fill: char) -> Self {
        self.fill = fill;
        self
    }

    /// Adjust the layout.
    #[must_use]
    pub fn with_layout(mut self, f: impl FnOnce(Layout) -> Layout) -> Self {
        self.layout = f(self.layout);
        self
    }
}

impl Control for Panel {
    fn layout(&self) -> Layout {
        self.layout
    }

    fn as_paintable(&mut self) -> Option<&mut dyn Paintable> {
        Some(self)
    }
}

impl Paintable for Panel {
    fn paint(&mut self, buf: &mut TermBuf, bounds: Rect, _clip: Rect, colors: Colors) -> Result<()> {
        buf.fill(bounds, self.fill, colors);
        Ok(())
    }
}
