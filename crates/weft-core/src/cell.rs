//! Cell type — a single terminal cell.

use crate::color::Rgba;
use crate::style::Attributes;

/// A single cell in a terminal cell buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    /// The grapheme cluster displayed in this cell.
    pub grapheme: String,
    /// Foreground color.
    pub fg: Rgba,
    /// Background color.
    pub bg: Rgba,
    /// Text attributes.
    pub attrs: Attributes,
    /// Display width (1 for most chars, 2 for CJK/emoji, 0 for continuation).
    pub width: u8,
}

impl Cell {
    /// Create a new cell with an explicit display width.
    ///
    /// The width is supplied by the caller because it depends on the
    /// configured width method; see [`crate::segment`].
    pub fn new(
        grapheme: impl Into<String>,
        width: u8,
        fg: Rgba,
        bg: Rgba,
        attrs: Attributes,
    ) -> Self {
        Self {
            grapheme: grapheme.into(),
            fg,
            bg,
            attrs,
            width,
        }
    }

    /// Create a blank cell (space) painted in the given background color.
    pub fn blank(bg: Rgba) -> Self {
        Self {
            grapheme: " ".into(),
            fg: bg,
            bg,
            attrs: Attributes::empty(),
            width: 1,
        }
    }

    /// Create a continuation cell (placeholder for the trailing column of a
    /// wide grapheme). It inherits the leading cell's colors so attribute
    /// runs stay contiguous in the emitted byte stream.
    pub fn continuation(fg: Rgba, bg: Rgba) -> Self {
        Self {
            grapheme: String::new(),
            fg,
            bg,
            attrs: Attributes::empty(),
            width: 0,
        }
    }

    /// Returns true if this is a wide grapheme (width > 1).
    pub fn is_wide(&self) -> bool {
        self.width > 1
    }

    /// Returns true if this is a continuation cell (width == 0).
    pub fn is_continuation(&self) -> bool {
        self.width == 0
    }

    /// Composite `src` over this cell in place, following the alpha rule:
    /// an opaque source replaces outright; a translucent source blends the
    /// color channels and merges attributes with bitwise OR. A translucent
    /// source with a blank grapheme keeps the destination glyph (it only
    /// tints it).
    pub fn composite(&mut self, src: &Cell) {
        if src.bg.is_opaque() && src.fg.is_opaque() {
            *self = src.clone();
            return;
        }
        let keeps_glyph = src.grapheme == " " || src.grapheme.is_empty();
        if !keeps_glyph {
            self.grapheme = src.grapheme.clone();
            self.width = src.width;
            self.fg = src.fg.over(self.fg);
        } else {
            // Tint the existing glyph through the translucent overlay.
            self.fg = src.bg.over(self.fg);
        }
        self.bg = src.bg.over(self.bg);
        self.attrs |= src.attrs;
    }
}
