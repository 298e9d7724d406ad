//! ANSI escape sequences emitted by the engine.
//!
//! Everything the engine writes to the terminal besides cell content is
//! built here: screen and cursor control, mouse reporting modes, keyboard
//! protocol flags, bracketed paste, scroll regions, and queries.

use std::fmt::Write;

/// Enter the alternate screen buffer.
pub const ALT_SCREEN_ENTER: &str = "\x1b[?1049h";
/// Leave the alternate screen buffer.
pub const ALT_SCREEN_LEAVE: &str = "\x1b[?1049l";

/// Hide the cursor.
pub const CURSOR_HIDE: &str = "\x1b[?25l";
/// Show the cursor.
pub const CURSOR_SHOW: &str = "\x1b[?25h";

/// Begin a synchronized update (CSI 2026).
pub const SYNC_BEGIN: &str = "\x1b[?2026h";
/// End a synchronized update.
pub const SYNC_END: &str = "\x1b[?2026l";

/// Enable button-press mouse reporting.
pub const MOUSE_BUTTONS_ON: &str = "\x1b[?1000h\x1b[?1002h\x1b[?1006h";
/// Enable any-motion mouse reporting.
pub const MOUSE_MOTION_ON: &str = "\x1b[?1000h\x1b[?1002h\x1b[?1003h\x1b[?1006h";
/// Disable all mouse reporting modes.
pub const MOUSE_OFF: &str = "\x1b[?1003l\x1b[?1002l\x1b[?1000l\x1b[?1006l";

/// Enable bracketed paste.
pub const PASTE_ON: &str = "\x1b[?2004h";
/// Disable bracketed paste.
pub const PASTE_OFF: &str = "\x1b[?2004l";

/// Pop the Kitty keyboard protocol flags pushed by [`kitty_push`].
pub const KITTY_POP: &str = "\x1b[<u";

/// Query the terminal's pixel size; answered with `CSI 4 ; H ; W t`.
pub const PIXEL_SIZE_QUERY: &str = "\x1b[14t";

/// Reset the scroll region to the full screen.
pub const SCROLL_REGION_RESET: &str = "\x1b[r";

/// Reset all SGR attributes.
pub const SGR_RESET: &str = "\x1b[0m";

/// Push Kitty keyboard protocol flags.
pub fn kitty_push(flags: u8) -> String {
    format!("\x1b[>{flags}u")
}

/// Move the cursor to a 0-based cell position.
pub fn cursor_move(x: u16, y: u16) -> String {
    format!("\x1b[{};{}H", y + 1, x + 1)
}

/// Write a 0-based cursor move into an existing string.
pub fn write_cursor_move(out: &mut String, x: u16, y: u16) {
    let _ = write!(out, "\x1b[{};{}H", y + 1, x + 1);
}

/// Restrict the scroll region to 0-based rows `top..=bottom`.
pub fn scroll_region(top: u16, bottom: u16) -> String {
    format!("\x1b[{};{}r", top + 1, bottom + 1)
}

/// Scroll the region up by `lines`.
pub fn scroll_up(lines: u16) -> String {
    format!("\x1b[{lines}S")
}

/// Cursor shapes selectable via [`cursor_style`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorStyle {
    /// Block cursor.
    Block,
    /// Underline cursor.
    Underline,
    /// Vertical bar cursor.
    Line,
}

/// Select a cursor style (DECSCUSR); `blinking` picks the blinking variant.
pub fn cursor_style(style: CursorStyle, blinking: bool) -> String {
    let code = match (style, blinking) {
        (CursorStyle::Block, true) => 1,
        (CursorStyle::Block, false) => 2,
        (CursorStyle::Underline, true) => 3,
        (CursorStyle::Underline, false) => 4,
        (CursorStyle::Line, true) => 5,
        (CursorStyle::Line, false) => 6,
    };
    format!("\x1b[{code} q")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_move_is_one_based() {
        assert_eq!(cursor_move(0, 0), "\x1b[1;1H");
        assert_eq!(cursor_move(5, 3), "\x1b[4;6H");
    }

    #[test]
    fn scroll_region_is_one_based() {
        assert_eq!(scroll_region(0, 9), "\x1b[1;10r");
    }

    #[test]
    fn kitty_push_includes_flags() {
        assert_eq!(kitty_push(0b101), "\x1b[>5u");
    }

    #[test]
    fn cursor_styles() {
        assert_eq!(cursor_style(CursorStyle::Block, false), "\x1b[2 q");
        assert_eq!(cursor_style(CursorStyle::Line, true), "\x1b[5 q");
    }
}
