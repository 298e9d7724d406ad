//! Minimal ANSI serialization of cell changes.
//!
//! Takes the cell diff for a frame and produces the shortest reasonable
//! escape stream: cursor moves only on discontinuity, incremental SGR
//! transitions, and color downgrade to what the terminal supports.

use std::fmt::Write;

use crate::ansi;
use crate::buffer::CellChange;
use crate::color::{self, NamedColor, Rgba};
use crate::style::Attributes;
use crate::terminal::ColorSupport;

/// A color after downgrade to the terminal's support level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ColorKey {
    Rgb(u8, u8, u8),
    Indexed(u8),
    Named(NamedColor),
    Default,
}

/// Renders cell changes into ANSI escape sequences.
pub struct Renderer {
    color_support: ColorSupport,
    synchronized_output: bool,
}

impl Renderer {
    /// Create a renderer for the given color support level.
    pub fn new(color_support: ColorSupport, synchronized_output: bool) -> Self {
        Self {
            color_support,
            synchronized_output,
        }
    }

    /// Serialize a set of cell changes.
    pub fn render(&self, changes: &[CellChange]) -> String {
        if changes.is_empty() {
            return String::new();
        }
        self.render_with_offset(changes, 0)
    }

    /// Serialize cell changes with every row shifted down by `row_offset`
    /// (used by split mode to pin the UI to the bottom rows).
    pub fn render_with_offset(&self, changes: &[CellChange], row_offset: u16) -> String {
        if changes.is_empty() {
            return String::new();
        }

        let mut out = String::with_capacity(changes.len() * 16);
        if self.synchronized_output {
            out.push_str(ansi::SYNC_BEGIN);
        }

        let mut last_x: Option<u16> = None;
        let mut last_y: Option<u16> = None;
        let mut last_fg = ColorKey::Default;
        let mut last_bg = ColorKey::Default;
        let mut last_attrs = Attributes::empty();
        let mut style_active = false;

        for change in changes {
            if change.cell.width == 0 {
                continue;
            }
            let y = change.y + row_offset;

            let contiguous =
                matches!((last_x, last_y), (Some(lx), Some(ly)) if ly == y && lx == change.x);
            if !contiguous {
                ansi::write_cursor_move(&mut out, change.x, y);
            }

            let fg = self.key(flatten_fg(&change.cell.fg, &change.cell.bg));
            let bg = self.key(flatten_bg(&change.cell.bg));
            let attrs = change.cell.attrs;

            // Dropping any attribute needs a full reset; adding is incremental.
            let dropped = last_attrs & !attrs;
            if style_active && !dropped.is_empty() {
                out.push_str(ansi::SGR_RESET);
                last_fg = ColorKey::Default;
                last_bg = ColorKey::Default;
                last_attrs = Attributes::empty();
            }
            for bit in (attrs & !last_attrs).iter() {
                if let Some(code) = bit.sgr_code() {
                    let _ = write!(out, "\x1b[{code}m");
                }
            }
            if !style_active || fg != last_fg {
                write_color(&mut out, fg, true);
            }
            if !style_active || bg != last_bg {
                write_color(&mut out, bg, false);
            }
            last_fg = fg;
            last_bg = bg;
            last_attrs = attrs;
            style_active = true;

            out.push_str(&change.cell.grapheme);
            last_x = Some(change.x + u16::from(change.cell.width));
            last_y = Some(y);
        }

        if style_active {
            out.push_str(ansi::SGR_RESET);
        }
        if self.synchronized_output {
            out.push_str(ansi::SYNC_END);
        }
        out
    }

    /// Downgrade a quantized color to the terminal's support level.
    fn key(&self, rgb: (u8, u8, u8)) -> ColorKey {
        let (r, g, b) = rgb;
        match self.color_support {
            ColorSupport::TrueColor => ColorKey::Rgb(r, g, b),
            ColorSupport::Extended256 => ColorKey::Indexed(color::rgb_to_256(r, g, b)),
            ColorSupport::Basic16 => ColorKey::Named(color::rgb_to_named(r, g, b)),
            ColorSupport::NoColor => ColorKey::Default,
        }
    }
}

/// Flatten a possibly-translucent glyph color against its own background.
fn flatten_fg(fg: &Rgba, bg: &Rgba) -> (u8, u8, u8) {
    if fg.is_opaque() {
        fg.to_rgb8()
    } else {
        fg.over(bg.over(Rgba::BLACK)).to_rgb8()
    }
}

/// Flatten a possibly-translucent background against black.
fn flatten_bg(bg: &Rgba) -> (u8, u8, u8) {
    if bg.is_opaque() {
        bg.to_rgb8()
    } else {
        bg.over(Rgba::BLACK).to_rgb8()
    }
}

fn write_color(out: &mut String, key: ColorKey, foreground: bool) {
    match key {
        ColorKey::Rgb(r, g, b) => {
            let base = if foreground { 38 } else { 48 };
            let _ = write!(out, "\x1b[{base};2;{r};{g};{b}m");
        }
        ColorKey::Indexed(i) => {
            let base = if foreground { 38 } else { 48 };
            let _ = write!(out, "\x1b[{base};5;{i}m");
        }
        ColorKey::Named(n) => {
            let code = if foreground {
                color::named_fg_code(n)
            } else {
                color::named_bg_code(n)
            };
            let _ = write!(out, "\x1b[{code}m");
        }
        ColorKey::Default => {
            let code = if foreground { 39 } else { 49 };
            let _ = write!(out, "\x1b[{code}m");
        }
    }
}
