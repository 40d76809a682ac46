use crate::{
    color::Colors,
    control::{Control, Measurable, Paintable},
    error::Result,
    geom::{Constraints, Expanse, Rect},
    layout::Layout,
    termbuf::TermBuf,
    widgets::width,
};

/// A block of text, wrapped to the available width.
#[derive(Debug, Clone, Default)]
pub struct Text {
    /// Raw text; newlines start new paragraphs.
    raw: String,
    /// Layout applied on insert.
    layout: Layout,
}

impl Text {
    /// A text control.
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            layout: Layout::default(),
        }
    }

    /// Use a specific layout.
    #[must_use]
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// The raw text.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Replace the text. Invalidate the node afterwards with
    /// `ContentChanged`, or use `Tree::update`.
    pub fn set_raw(&mut self, raw: impl Into<String>) {
        self.raw = raw.into();
    }

    /// Lines after wrapping to `w` columns. `None` leaves lines unwrapped.
    fn lines(&self, w: Option<u32>) -> Vec<String> {
        match w {
            Some(w) if w > 0 => self
                .raw
                .lines()
                .flat_map(|l| {
                    if l.is_empty() {
                        vec![String::new()]
                    } else {
                        textwrap::wrap(l, w as usize)
                            .into_iter()
                            .map(|c| c.into_owned())
                            .collect()
                    }
                })
                .collect(),
            _ => self.raw.lines().map(str::to_string).collect(),
        }
    }
}

impl Control for Text {
    fn layout(&self) -> Layout {
        self.layout
    }

    fn as_measurable(&self) -> Option<&dyn Measurable> {
        Some(self)
    }

    fn as_paintable(&mut self) -> Option<&mut dyn Paintable> {
        Some(self)
    }
}

impl Measurable for Text {
    fn measure(&self, c: Constraints) -> Expanse {
        let lines = self.lines(c.max_w);
        let w = lines.iter().map(|l| width(l)).max().unwrap_or(0);
        Expanse::new(w, u32::try_from(lines.len()).unwrap_or(u32::MAX))
    }
}

impl Paintable for Text {
    fn paint(&mut self, buf: &mut TermBuf, bounds: Rect, _clip: Rect, colors: Colors) -> Result<()> {
        buf.fill(bounds, ' ', colors);
        for (y, line) in (0..bounds.h).zip(self.lines(Some(bounds.w))) {
            buf.text(bounds.tl.offset(0, y), &line, colors, bounds.w);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measures_wrapped_size() {
        let t = Text::new("the quick brown fox");
        assert_eq!(t.measure(Constraints::unbounded()), Expanse::new(19, 1));
        assert_eq!(
            t.measure(Constraints::loose(Expanse::new(10, 10))),
            Expanse::new(9, 2)
        );
    }

    #[test]
    fn paints_lines() {
        let mut t = Text::new("ab\ncd");
        let mut buf = TermBuf::new((3, 3), Colors::default());
        let r = buf.rect();
        t.paint(&mut buf, r, r, Colors::default()).unwrap();
        assert_eq!(buf.lines(), vec!["ab ", "cd ", "   "]);
    }
}
