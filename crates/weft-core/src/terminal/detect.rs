//! Capability detection from environment variables.

use std::env;

use super::traits::{ColorSupport, TerminalCapabilities};

/// Detect terminal capabilities from the environment.
pub fn detect_capabilities() -> TerminalCapabilities {
    TerminalCapabilities {
        color: detect_color_support(),
        unicode: true,
        synchronized_output: false,
        kitty_keyboard: detect_kitty_keyboard(),
        mouse: true,
        bracketed_paste: true,
    }
}

/// Detect color support from `COLORTERM`, `TERM`, and `NO_COLOR`.
pub fn detect_color_support() -> ColorSupport {
    color_support_from_vars(
        env::var("COLORTERM").ok().as_deref(),
        env::var("TERM").ok().as_deref(),
        env::var("NO_COLOR").is_ok(),
    )
}

fn color_support_from_vars(
    colorterm: Option<&str>,
    term: Option<&str>,
    no_color: bool,
) -> ColorSupport {
    if no_color {
        return ColorSupport::NoColor;
    }
    if let Some(ct) = colorterm
        && (ct == "truecolor" || ct == "24bit")
    {
        return ColorSupport::TrueColor;
    }
    if let Some(term) = term {
        if term.contains("256color") {
            return ColorSupport::Extended256;
        }
        if term == "dumb" {
            return ColorSupport::NoColor;
        }
    }
    ColorSupport::Basic16
}

/// Kitty keyboard support is advertised by a handful of terminals; keep the
/// default conservative (off) unless one is recognized.
fn detect_kitty_keyboard() -> bool {
    if env::var("KITTY_WINDOW_ID").is_ok() {
        return true;
    }
    matches!(
        env::var("TERM_PROGRAM").ok().as_deref(),
        Some("WezTerm") | Some("ghostty")
    )
}
