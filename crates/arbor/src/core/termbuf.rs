use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::{
    color::{Color, Colors},
    geom::{Expanse, Point, Rect},
};

/// A terminal cell: one glyph and its colors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    /// Base glyph character.
    pub ch: char,
    /// Combining characters stored with the base glyph.
    pub suffix: String,
    /// Foreground color.
    pub fg: Color,
    /// Background color.
    pub bg: Color,
    /// True when this cell is the right half of a wide glyph.
    pub continuation: bool,
}

impl Cell {
    /// A blank cell in the given colors.
    pub fn blank(colors: Colors) -> Self {
        Self {
            ch: ' ',
            suffix: String::new(),
            fg: colors.fg,
            bg: colors.bg,
            continuation: false,
        }
    }

    /// Append this cell's text to `out`.
    fn push_text(&self, out: &mut String) {
        if self.continuation {
            return;
        }
        out.push(self.ch);
        out.push_str(&self.suffix);
    }
}

/// A rectangular grid of cells. Controls paint into these, and the window
/// composites them into its frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TermBuf {
    /// Buffer size in cells.
    size: Expanse,
    /// Row-major cell storage.
    cells: Vec<Cell>,
}

impl TermBuf {
    /// A blank buffer of the given size.
    pub fn new(size: impl Into<Expanse>, colors: Colors) -> Self {
        let size = size.into();
        Self {
            size,
            cells: vec![Cell::blank(colors); size.area() as usize],
        }
    }

    /// Buffer size.
    pub fn size(&self) -> Expanse {
        self.size
    }

    /// The buffer's extent as a rectangle at the origin.
    pub fn rect(&self) -> Rect {
        self.size.rect()
    }

    /// Index of a point, if it lies inside the buffer.
    fn idx(&self, p: Point) -> Option<usize> {
        (p.x < self.size.w && p.y < self.size.h)
            .then(|| p.y as usize * self.size.w as usize + p.x as usize)
    }

    /// The cell at a point.
    pub fn get(&self, p: Point) -> Option<&Cell> {
        self.idx(p).map(|i| &self.cells[i])
    }

    /// Overwrite one cell. Points outside the buffer are ignored.
    pub fn put(&mut self, p: Point, cell: Cell) {
        if let Some(i) = self.idx(p) {
            self.cells[i] = cell;
        }
    }

    /// Fill a rectangle with a character, clipped to the buffer.
    pub fn fill(&mut self, r: Rect, ch: char, colors: Colors) {
        let Some(r) = r.intersect(&self.rect()) else {
            return;
        };
        let cell = Cell {
            ch,
            ..Cell::blank(colors)
        };
        for y in r.tl.y..r.bottom() {
            for x in r.tl.x..r.right() {
                self.put(Point::new(x, y), cell.clone());
            }
        }
    }

    /// Write text starting at `p`, stopping at `max_width` columns or the
    /// buffer edge. Wide glyphs that would straddle the limit are dropped.
    /// Returns the number of columns written.
    pub fn text(&mut self, p: Point, txt: &str, colors: Colors, max_width: u32) -> u32 {
        let limit = max_width.min(self.size.w.saturating_sub(p.x));
        let mut col = 0;
        for g in txt.graphemes(true) {
            let w = u32::try_from(g.width()).unwrap_or(u32::MAX);
            if w == 0 {
                continue;
            }
            if col + w > limit {
                break;
            }
            let mut chars = g.chars();
            let Some(ch) = chars.next() else {
                continue;
            };
            let at = Point::new(p.x + col, p.y);
            self.put(
                at,
                Cell {
                    ch,
                    suffix: chars.collect(),
                    ..Cell::blank(colors)
                },
            );
            for extra in 1..w {
                self.put(
                    at.offset(extra, 0),
                    Cell {
                        continuation: true,
                        ..Cell::blank(colors)
                    },
                );
            }
            col += w;
        }
        col
    }

    /// Copy `src` so its origin lands at `dest`, writing only cells that fall
    /// inside `clip` and inside this buffer.
    pub fn blit(&mut self, src: &Self, dest: Point, clip: Rect) {
        let placed = Rect::at(dest, src.size);
        let Some(visible) = placed
            .intersect(&clip)
            .and_then(|r| r.intersect(&self.rect()))
        else {
            return;
        };
        for y in visible.tl.y..visible.bottom() {
            for x in visible.tl.x..visible.right() {
                let from = Point::new(x - dest.x, y - dest.y);
                if let Some(cell) = src.get(from) {
                    self.put(Point::new(x, y), cell.clone());
                }
            }
        }
    }

    /// The text of one row.
    pub fn line_text(&self, y: u32) -> Option<String> {
        if y >= self.size.h {
            return None;
        }
        let start = y as usize * self.size.w as usize;
        let mut out = String::new();
        for cell in &self.cells[start..start + self.size.w as usize] {
            cell.push_text(&mut out);
        }
        Some(out)
    }

    /// The text of every row.
    pub fn lines(&self) -> Vec<String> {
        (0..self.size.h).filter_map(|y| self.line_text(y)).collect()
    }

    /// True if `needle` appears on any row.
    pub fn contains_text(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.contains(needle))
    }
}
