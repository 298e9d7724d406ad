//! Grapheme segmentation and display-width measurement.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// How display widths are measured.
///
/// The method is engine-wide configuration; every buffer and text store in
/// one engine instance uses the same method so measurements agree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WidthMethod {
    /// Classic `wcwidth` behavior: each scalar measured on its own, summed
    /// per cluster and capped at 2. Matches most terminals in practice.
    #[default]
    WcWidth,
    /// Full Unicode segmentation: one measurement per extended grapheme
    /// cluster, so ZWJ sequences and flags count as a single wide glyph.
    Unicode,
}

/// A measured grapheme cluster within a string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Grapheme<'a> {
    /// The cluster text.
    pub text: &'a str,
    /// Display width in cells (0, 1, or 2).
    pub width: u8,
}

/// Iterate the grapheme clusters of `text` with their display widths.
pub fn graphemes(text: &str, method: WidthMethod) -> impl Iterator<Item = Grapheme<'_>> {
    text.graphemes(true).map(move |g| Grapheme {
        text: g,
        width: grapheme_width(g, method),
    })
}

/// Display width of a single grapheme cluster.
pub fn grapheme_width(cluster: &str, method: WidthMethod) -> u8 {
    match method {
        WidthMethod::WcWidth => {
            let total: usize = cluster.chars().map(|c| c.width().unwrap_or(0)).sum();
            total.min(2) as u8
        }
        WidthMethod::Unicode => {
            if cluster.chars().count() > 1 && contains_emoji_joiner(cluster) {
                // ZWJ sequences, flags, and modifier sequences render as one
                // double-width glyph in Unicode-aware terminals.
                2
            } else {
                (UnicodeWidthStr::width(cluster).min(2)) as u8
            }
        }
    }
}

/// Total display width of a string.
pub fn display_width(text: &str, method: WidthMethod) -> usize {
    graphemes(text, method).map(|g| usize::from(g.width)).sum()
}

/// Count of grapheme clusters in a string.
pub fn grapheme_count(text: &str) -> usize {
    text.graphemes(true).count()
}

fn contains_emoji_joiner(cluster: &str) -> bool {
    cluster.chars().any(|c| {
        c == '\u{200d}' // zero-width joiner
            || ('\u{1f1e6}'..='\u{1f1ff}').contains(&c) // regional indicators
            || ('\u{1f3fb}'..='\u{1f3ff}').contains(&c) // skin tone modifiers
    })
}
