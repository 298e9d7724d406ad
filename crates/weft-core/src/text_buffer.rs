//! Styled text storage with wrapping, line info, and selection highlight.

use crate::buffer::CellBuffer;
use crate::cell::Cell;
use crate::color::Rgba;
use crate::geometry::Rect;
use crate::segment::{self, WidthMethod};
use crate::style::Attributes;

/// A run of text sharing one style.
#[derive(Clone, Debug, PartialEq)]
pub struct StyledChunk {
    /// The chunk text (may contain newlines).
    pub text: String,
    /// Foreground override; `None` uses the buffer default.
    pub fg: Option<Rgba>,
    /// Background override; `None` uses the buffer default.
    pub bg: Option<Rgba>,
    /// Text attributes.
    pub attrs: Attributes,
}

impl StyledChunk {
    /// Create a plain chunk with no style overrides.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fg: None,
            bg: None,
            attrs: Attributes::empty(),
        }
    }
}

/// How lines are broken when a wrap width is set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WrapMode {
    /// Break at the last space on the line when possible.
    #[default]
    Word,
    /// Break at the exact grapheme where the width runs out.
    Char,
}

/// One wrapped display line: a grapheme range plus its display width.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineInfo {
    /// Index of the first grapheme on the line.
    pub start: usize,
    /// One past the last grapheme on the line.
    pub end: usize,
    /// Display width of the line in cells.
    pub width: usize,
}

#[derive(Clone, Debug)]
struct Glyph {
    text: String,
    width: u8,
    chunk: usize,
    is_newline: bool,
}

/// Grapheme-aware styled text with wrapping and selection highlight.
///
/// Content is a sequence of [`StyledChunk`]s. Derived line info is kept
/// consistent with the content and wrap settings after every mutation, so
/// drawing never recomputes.
#[derive(Clone, Debug)]
pub struct TextBuffer {
    chunks: Vec<StyledChunk>,
    glyphs: Vec<Glyph>,
    lines: Vec<LineInfo>,
    wrap_width: Option<u16>,
    wrap_mode: WrapMode,
    width_method: WidthMethod,
    default_fg: Rgba,
    default_bg: Rgba,
    selection: Option<(usize, usize)>,
    selection_fg: Option<Rgba>,
    selection_bg: Option<Rgba>,
}

impl TextBuffer {
    /// Create an empty text buffer.
    pub fn new(width_method: WidthMethod) -> Self {
        Self {
            chunks: Vec::new(),
            glyphs: Vec::new(),
            lines: vec![LineInfo {
                start: 0,
                end: 0,
                width: 0,
            }],
            wrap_width: None,
            wrap_mode: WrapMode::default(),
            width_method,
            default_fg: Rgba::WHITE,
            default_bg: Rgba::TRANSPARENT,
            selection: None,
            selection_fg: None,
            selection_bg: None,
        }
    }

    /// Create a buffer holding a single plain chunk.
    pub fn from_text(text: impl Into<String>, width_method: WidthMethod) -> Self {
        let mut buf = Self::new(width_method);
        buf.push_chunk(StyledChunk::plain(text));
        buf
    }

    /// Default colors applied to chunks without overrides.
    pub fn set_default_colors(&mut self, fg: Rgba, bg: Rgba) {
        self.default_fg = fg;
        self.default_bg = bg;
    }

    /// The chunks currently in the buffer.
    pub fn chunks(&self) -> &[StyledChunk] {
        &self.chunks
    }

    /// Append a chunk.
    pub fn push_chunk(&mut self, chunk: StyledChunk) {
        self.chunks.push(chunk);
        self.reflow();
    }

    /// Insert a chunk at `index` (clamped to the end).
    pub fn insert_chunk(&mut self, index: usize, chunk: StyledChunk) {
        let index = index.min(self.chunks.len());
        self.chunks.insert(index, chunk);
        self.reflow();
    }

    /// Replace the chunk at `index`. Out-of-range indices are ignored.
    pub fn replace_chunk(&mut self, index: usize, chunk: StyledChunk) {
        if let Some(slot) = self.chunks.get_mut(index) {
            *slot = chunk;
            self.reflow();
        }
    }

    /// Remove the chunk at `index`. Out-of-range indices are ignored.
    pub fn remove_chunk(&mut self, index: usize) {
        if index < self.chunks.len() {
            self.chunks.remove(index);
            self.reflow();
        }
    }

    /// Set or clear the wrap width.
    pub fn set_wrap_width(&mut self, width: Option<u16>) {
        if self.wrap_width != width {
            self.wrap_width = width;
            self.reflow();
        }
    }

    /// Set the wrap mode.
    pub fn set_wrap_mode(&mut self, mode: WrapMode) {
        if self.wrap_mode != mode {
            self.wrap_mode = mode;
            self.reflow();
        }
    }

    /// The current wrap width.
    pub fn wrap_width(&self) -> Option<u16> {
        self.wrap_width
    }

    /// The wrapped display lines.
    pub fn lines(&self) -> &[LineInfo] {
        &self.lines
    }

    /// Number of display lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Width of the widest display line.
    pub fn max_line_width(&self) -> usize {
        self.lines.iter().map(|l| l.width).max().unwrap_or(0)
    }

    /// Total number of graphemes (newlines included).
    pub fn grapheme_count(&self) -> usize {
        self.glyphs.len()
    }

    /// Intrinsic size at a proposed width, for the layout measure contract.
    ///
    /// When wrapping is enabled the lines are re-evaluated at the proposed
    /// width; otherwise the current line info is used. Both dimensions are
    /// at least 1.
    pub fn measure(&self, proposed_width: Option<u16>) -> (u16, u16) {
        let (max_width, line_count) = match (self.wrap_width, proposed_width) {
            (Some(_), Some(w)) => {
                let lines = compute_lines(&self.glyphs, Some(w), self.wrap_mode);
                (
                    lines.iter().map(|l| l.width).max().unwrap_or(0),
                    lines.len(),
                )
            }
            _ => (self.max_line_width(), self.line_count()),
        };
        (
            (max_width.max(1)).min(usize::from(u16::MAX)) as u16,
            (line_count.max(1)).min(usize::from(u16::MAX)) as u16,
        )
    }

    /// Set the selection from local cell coordinates.
    ///
    /// The two points are interpreted against the wrapped lines; points past
    /// the end of a line clamp to the line end. Returns whether the
    /// resulting grapheme range is non-empty.
    pub fn set_local_selection(
        &mut self,
        anchor_x: i32,
        anchor_y: i32,
        focus_x: i32,
        focus_y: i32,
        fg: Option<Rgba>,
        bg: Option<Rgba>,
    ) -> bool {
        let a = self.grapheme_at(anchor_x, anchor_y);
        let f = self.grapheme_at(focus_x, focus_y);
        let (start, end) = if a <= f { (a, f) } else { (f, a) };
        self.selection = Some((start, end));
        self.selection_fg = fg;
        self.selection_bg = bg;
        start < end
    }

    /// Clear any selection.
    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// The current selection as a grapheme range, if any.
    pub fn selection(&self) -> Option<(usize, usize)> {
        self.selection
    }

    /// Concatenated text of the selected grapheme range.
    pub fn selected_text(&self) -> Option<String> {
        let (start, end) = self.selection?;
        if start >= end {
            return None;
        }
        let mut out = String::new();
        for glyph in self.glyphs.get(start..end).unwrap_or(&[]) {
            if glyph.is_newline {
                out.push('\n');
            } else {
                out.push_str(&glyph.text);
            }
        }
        Some(out)
    }

    /// Draw the wrapped lines into `dst` with the top-left at (x, y).
    ///
    /// An optional clip rectangle is applied on top of the destination's
    /// scissor stack.
    pub fn draw_into(&self, dst: &mut CellBuffer, x: i32, y: i32, clip: Option<Rect>) {
        if let Some(c) = clip {
            dst.push_scissor_rect(i32::from(c.x()), i32::from(c.y()), c.width(), c.height());
        }
        for (row, line) in self.lines.iter().enumerate() {
            let mut cx = x;
            let cy = y + row as i32;
            for idx in line.start..line.end {
                let Some(glyph) = self.glyphs.get(idx) else {
                    continue;
                };
                if glyph.is_newline || glyph.width == 0 {
                    continue;
                }
                let chunk = &self.chunks[glyph.chunk];
                let mut fg = chunk.fg.unwrap_or(self.default_fg);
                let mut bg = chunk.bg.unwrap_or(self.default_bg);
                let mut attrs = chunk.attrs;
                if self
                    .selection
                    .is_some_and(|(s, e)| idx >= s && idx < e)
                {
                    match (self.selection_fg, self.selection_bg) {
                        (None, None) => attrs |= Attributes::INVERSE,
                        (sfg, sbg) => {
                            if let Some(c) = sfg {
                                fg = c;
                            }
                            if let Some(c) = sbg {
                                bg = c;
                            }
                        }
                    }
                }
                dst.set_cell(cx, cy, Cell::new(glyph.text.clone(), glyph.width, fg, bg, attrs));
                cx += i32::from(glyph.width);
            }
        }
        if clip.is_some() {
            dst.pop_scissor_rect();
        }
    }

    /// Map a local cell position to a grapheme index, clamping to line ends.
    fn grapheme_at(&self, x: i32, y: i32) -> usize {
        if y < 0 {
            return 0;
        }
        let row = y as usize;
        let Some(line) = self.lines.get(row) else {
            return self.glyphs.len();
        };
        if x <= 0 {
            return line.start;
        }
        let mut cx = 0i32;
        for idx in line.start..line.end {
            let Some(glyph) = self.glyphs.get(idx) else {
                break;
            };
            if glyph.is_newline {
                return idx;
            }
            cx += i32::from(glyph.width);
            if cx > x {
                return idx;
            }
        }
        line.end
    }

    fn reflow(&mut self) {
        self.glyphs.clear();
        for (ci, chunk) in self.chunks.iter().enumerate() {
            let mut rest = chunk.text.as_str();
            loop {
                match rest.find('\n') {
                    Some(pos) => {
                        push_glyphs(&mut self.glyphs, &rest[..pos], ci, self.width_method);
                        self.glyphs.push(Glyph {
                            text: "\n".into(),
                            width: 0,
                            chunk: ci,
                            is_newline: true,
                        });
                        rest = &rest[pos + 1..];
                    }
                    None => {
                        push_glyphs(&mut self.glyphs, rest, ci, self.width_method);
                        break;
                    }
                }
            }
        }
        self.lines = compute_lines(&self.glyphs, self.wrap_width, self.wrap_mode);
        // A content change invalidates any grapheme-range selection.
        self.selection = None;
    }
}

fn push_glyphs(out: &mut Vec<Glyph>, text: &str, chunk: usize, method: WidthMethod) {
    for g in segment::graphemes(text, method) {
        out.push(Glyph {
            text: g.text.to_string(),
            width: g.width,
            chunk,
            is_newline: false,
        });
    }
}

fn compute_lines(glyphs: &[Glyph], wrap_width: Option<u16>, mode: WrapMode) -> Vec<LineInfo> {
    let mut lines = Vec::new();
    let mut start = 0usize;
    let mut width = 0usize;
    let mut last_space: Option<usize> = None;

    let width_of = |range: std::ops::Range<usize>| -> usize {
        glyphs[range].iter().map(|g| usize::from(g.width)).sum()
    };

    let mut i = 0usize;
    while i < glyphs.len() {
        let glyph = &glyphs[i];
        if glyph.is_newline {
            lines.push(LineInfo {
                start,
                end: i,
                width,
            });
            start = i + 1;
            width = 0;
            last_space = None;
            i += 1;
            continue;
        }

        let gw = usize::from(glyph.width);
        if let Some(maxw) = wrap_width
            && width + gw > usize::from(maxw)
            && i > start
        {
            let break_at = match (mode, last_space) {
                (WrapMode::Word, Some(sp)) if sp > start => sp,
                _ => i,
            };
            lines.push(LineInfo {
                start,
                end: break_at,
                width: width_of(start..break_at),
            });
            // Skip the spaces consumed by a word break.
            let mut next = break_at;
            while next < glyphs.len() && !glyphs[next].is_newline && glyphs[next].text == " " {
                next += 1;
            }
            start = next;
            last_space = None;
            if start > i {
                width = 0;
                i = start;
                continue;
            }
            width = width_of(start..i);
        }

        if glyph.text == " " {
            last_space = Some(i);
        }
        width += gw;
        i += 1;
    }

    lines.push(LineInfo {
        start,
        end: glyphs.len(),
        width,
    });
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::CellBuffer;

    fn tb(text: &str) -> TextBuffer {
        TextBuffer::from_text(text, WidthMethod::WcWidth)
    }

    #[test]
    fn empty_buffer_has_one_empty_line() {
        let b = TextBuffer::new(WidthMethod::WcWidth);
        assert_eq!(b.line_count(), 1);
        assert_eq!(b.max_line_width(), 0);
    }

    #[test]
    fn single_line_width() {
        let b = tb("hello");
        assert_eq!(b.line_count(), 1);
        assert_eq!(b.max_line_width(), 5);
    }

    #[test]
    fn newlines_split_lines() {
        let b = tb("ab\ncdef\ng");
        assert_eq!(b.line_count(), 3);
        assert_eq!(b.max_line_width(), 4);
    }

    #[test]
    fn wide_graphemes_count_double() {
        let b = tb("a\u{4e16}b");
        assert_eq!(b.max_line_width(), 4);
    }

    #[test]
    fn char_wrap_breaks_exactly() {
        let mut b = tb("abcdef");
        b.set_wrap_mode(WrapMode::Char);
        b.set_wrap_width(Some(4));
        assert_eq!(b.line_count(), 2);
        assert_eq!(b.lines()[0].width, 4);
        assert_eq!(b.lines()[1].width, 2);
    }

    #[test]
    fn word_wrap_breaks_at_space() {
        let mut b = tb("hello world");
        b.set_wrap_width(Some(8));
        assert_eq!(b.line_count(), 2);
        assert_eq!(b.lines()[0].width, 5); // "hello"
        assert_eq!(b.lines()[1].width, 5); // "world"
    }

    #[test]
    fn word_wrap_falls_back_to_char_for_long_words() {
        let mut b = tb("abcdefghij");
        b.set_wrap_width(Some(4));
        assert_eq!(b.line_count(), 3);
        assert_eq!(b.lines()[0].width, 4);
    }

    #[test]
    fn unset_wrap_width_restores_single_line() {
        let mut b = tb("hello world");
        b.set_wrap_width(Some(5));
        assert!(b.line_count() > 1);
        b.set_wrap_width(None);
        assert_eq!(b.line_count(), 1);
    }

    #[test]
    fn measure_reports_at_least_one() {
        let b = TextBuffer::new(WidthMethod::WcWidth);
        assert_eq!(b.measure(None), (1, 1));
    }

    #[test]
    fn measure_reevaluates_at_proposed_width() {
        let mut b = tb("hello world");
        b.set_wrap_width(Some(80));
        let (w, h) = b.measure(Some(8));
        assert_eq!(h, 2);
        assert!(w <= 8);
    }

    #[test]
    fn chunk_edits_reflow() {
        let mut b = tb("ab");
        b.push_chunk(StyledChunk::plain("cd"));
        assert_eq!(b.max_line_width(), 4);
        b.replace_chunk(1, StyledChunk::plain("c"));
        assert_eq!(b.max_line_width(), 3);
        b.remove_chunk(1);
        assert_eq!(b.max_line_width(), 2);
    }

    #[test]
    fn selection_range_and_text() {
        let mut b = tb("hello\nworld");
        // Select from (1,0) to (2,1): "ello\nwo"
        let any = b.set_local_selection(1, 0, 2, 1, None, None);
        assert!(any);
        assert_eq!(b.selected_text().as_deref(), Some("ello\nwo"));
    }

    #[test]
    fn selection_clamps_past_line_end() {
        let mut b = tb("ab\ncd");
        b.set_local_selection(0, 0, 99, 0, None, None);
        assert_eq!(b.selected_text().as_deref(), Some("ab"));
    }

    #[test]
    fn selection_swapped_points_normalize() {
        let mut b = tb("abcd");
        b.set_local_selection(3, 0, 1, 0, None, None);
        assert_eq!(b.selected_text().as_deref(), Some("bc"));
    }

    #[test]
    fn content_change_clears_selection() {
        let mut b = tb("abcd");
        b.set_local_selection(0, 0, 2, 0, None, None);
        b.push_chunk(StyledChunk::plain("x"));
        assert!(b.selection().is_none());
    }

    #[test]
    fn draw_into_writes_cells() {
        let b = tb("hi");
        let mut dst = CellBuffer::new(5, 2, Rgba::BLACK, WidthMethod::WcWidth);
        b.draw_into(&mut dst, 1, 0, None);
        assert!(dst.get(1, 0).is_some_and(|c| c.grapheme == "h"));
        assert!(dst.get(2, 0).is_some_and(|c| c.grapheme == "i"));
    }

    #[test]
    fn draw_into_honors_clip() {
        let b = tb("hello");
        let mut dst = CellBuffer::new(10, 1, Rgba::BLACK, WidthMethod::WcWidth);
        b.draw_into(&mut dst, 0, 0, Some(Rect::new(0, 0, 3, 1)));
        assert!(dst.get(2, 0).is_some_and(|c| c.grapheme == "l"));
        assert!(dst.get(3, 0).is_some_and(|c| c.grapheme == " "));
    }

    #[test]
    fn draw_into_selection_uses_override_colors() {
        let mut b = tb("abc");
        let red = Rgba::rgb(1.0, 0.0, 0.0);
        b.set_local_selection(1, 0, 3, 0, None, Some(red));
        let mut dst = CellBuffer::new(5, 1, Rgba::BLACK, WidthMethod::WcWidth);
        b.draw_into(&mut dst, 0, 0, None);
        assert!(dst.get(0, 0).is_some_and(|c| c.bg != red));
        assert!(dst.get(1, 0).is_some_and(|c| c.bg == red));
        assert!(dst.get(2, 0).is_some_and(|c| c.bg == red));
    }

    #[test]
    fn draw_into_selection_without_override_inverses() {
        let mut b = tb("ab");
        b.set_local_selection(0, 0, 2, 0, None, None);
        let mut dst = CellBuffer::new(3, 1, Rgba::BLACK, WidthMethod::WcWidth);
        b.draw_into(&mut dst, 0, 0, None);
        assert!(dst
            .get(0, 0)
            .is_some_and(|c| c.attrs.contains(Attributes::INVERSE)));
    }

    #[test]
    fn styled_chunks_carry_colors() {
        let mut b = TextBuffer::new(WidthMethod::WcWidth);
        let green = Rgba::rgb(0.0, 1.0, 0.0);
        b.push_chunk(StyledChunk {
            text: "ok".into(),
            fg: Some(green),
            bg: None,
            attrs: Attributes::BOLD,
        });
        let mut dst = CellBuffer::new(4, 1, Rgba::BLACK, WidthMethod::WcWidth);
        b.draw_into(&mut dst, 0, 0, None);
        assert!(dst
            .get(0, 0)
            .is_some_and(|c| c.fg == green && c.attrs.contains(Attributes::BOLD)));
    }
}
