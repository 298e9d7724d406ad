//! Reference renderable kinds: a styled box and a selectable text block.
//!
//! These two kinds exercise the full [`Renderable`] contract (drawing,
//! intrinsic measurement, selection). Richer widget sets are built on the
//! same trait outside the engine.

use std::time::Duration;

use crate::border::{BorderSides, BorderStyle, BoxOptions, TitleAlignment};
use crate::buffer::CellBuffer;
use crate::color::Rgba;
use crate::node::NodeState;
use crate::renderable::Renderable;
use crate::selection::Selection;
use crate::text_buffer::{StyledChunk, TextBuffer};

/// A container that paints a background and an optional border.
#[derive(Clone, Debug, Default)]
pub struct BoxElement {
    /// Background fill color; `None` leaves the interior untouched.
    pub background: Option<Rgba>,
    /// Border style; `None` draws no border.
    pub border: Option<BorderStyle>,
    /// Which border sides are drawn.
    pub border_sides: BorderSides,
    /// Border color.
    pub border_color: Rgba,
    /// Optional in-border title.
    pub title: Option<String>,
    /// Title placement.
    pub title_alignment: TitleAlignment,
}

impl BoxElement {
    /// A plain filled box.
    pub fn filled(background: Rgba) -> Self {
        Self {
            background: Some(background),
            ..Self::default()
        }
    }

    /// A bordered box.
    pub fn bordered(style: BorderStyle, color: Rgba) -> Self {
        Self {
            border: Some(style),
            border_color: color,
            ..Self::default()
        }
    }
}

impl Renderable for BoxElement {
    fn render_self(&mut self, state: &NodeState, buf: &mut CellBuffer, _dt: Duration) {
        let rect = state.rect();
        if rect.is_empty() {
            return;
        }
        let (x, y) = state.draw_origin();
        if self.border.is_none() {
            if let Some(bg) = self.background {
                let mut opts = BoxOptions::new(x, y, rect.width(), rect.height());
                opts.sides = BorderSides::empty();
                opts.background = bg;
                opts.fill = true;
                buf.draw_box(&opts);
            }
            return;
        }
        let mut opts = BoxOptions::new(x, y, rect.width(), rect.height());
        opts.style = self.border.unwrap_or_default();
        opts.sides = self.border_sides;
        opts.border_color = self.border_color;
        if let Some(bg) = self.background {
            opts.background = bg;
            opts.fill = true;
        }
        opts.title = self.title.clone();
        opts.title_alignment = self.title_alignment;
        buf.draw_box(&opts);
    }
}

/// A block of styled text with optional wrapping and selection support.
#[derive(Clone, Debug)]
pub struct TextElement {
    text: TextBuffer,
    /// Wrap the text to the laid-out width.
    pub wrap_to_width: bool,
    /// Selection highlight foreground override.
    pub selection_fg: Option<Rgba>,
    /// Selection highlight background override.
    pub selection_bg: Option<Rgba>,
}

impl TextElement {
    /// Create a text element around an existing text buffer.
    pub fn new(text: TextBuffer) -> Self {
        Self {
            text,
            wrap_to_width: false,
            selection_fg: None,
            selection_bg: None,
        }
    }

    /// Create a text element holding one plain chunk.
    pub fn from_text(
        content: impl Into<String>,
        width_method: crate::segment::WidthMethod,
    ) -> Self {
        Self::new(TextBuffer::from_text(content, width_method))
    }

    /// Access the underlying text buffer.
    pub fn text(&self) -> &TextBuffer {
        &self.text
    }

    /// Replace the content with a single plain chunk.
    pub fn set_text(&mut self, content: impl Into<String>) {
        while !self.text.chunks().is_empty() {
            self.text.remove_chunk(0);
        }
        self.text.push_chunk(StyledChunk::plain(content));
    }

    /// Append a styled chunk.
    pub fn push_chunk(&mut self, chunk: StyledChunk) {
        self.text.push_chunk(chunk);
    }
}

impl Renderable for TextElement {
    fn render_self(&mut self, state: &NodeState, buf: &mut CellBuffer, _dt: Duration) {
        let (x, y) = state.draw_origin();
        self.text.draw_into(buf, x, y, None);
    }

    fn on_layout_resize(&mut self, state: &mut NodeState, width: u16, _height: u16) {
        if self.wrap_to_width {
            self.text.set_wrap_width(Some(width));
            state.dirty = true;
        }
    }

    fn should_start_selection(&self, state: &NodeState, x: u16, y: u16) -> bool {
        state
            .rect()
            .contains(crate::geometry::Position::new(x, y))
    }

    fn on_selection_changed(&mut self, state: &mut NodeState, selection: &Selection) -> bool {
        state.dirty = true;
        if !selection.is_active {
            self.text.clear_selection();
            return false;
        }
        let rect = state.rect();
        let (start, end) = selection.normalized();
        let has = self.text.set_local_selection(
            i32::from(start.x) - i32::from(rect.x()),
            i32::from(start.y) - i32::from(rect.y()),
            i32::from(end.x) - i32::from(rect.x()),
            i32::from(end.y) - i32::from(rect.y()),
            self.selection_fg,
            self.selection_bg,
        );
        if !has {
            self.text.clear_selection();
        }
        has
    }

    fn selected_text(&self) -> Option<String> {
        self.text.selected_text()
    }

    fn measure(&self, proposed_width: Option<u16>) -> Option<(u16, u16)> {
        Some(self.text.measure(proposed_width))
    }
}
