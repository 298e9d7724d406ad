//! Border styles and box-drawing options for [`crate::buffer::CellBuffer::draw_box`].

use crate::color::Rgba;

bitflags::bitflags! {
    /// Which sides of a box get a border.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct BorderSides: u8 {
        /// Top edge.
        const TOP = 1 << 0;
        /// Right edge.
        const RIGHT = 1 << 1;
        /// Bottom edge.
        const BOTTOM = 1 << 2;
        /// Left edge.
        const LEFT = 1 << 3;
    }
}

impl Default for BorderSides {
    fn default() -> Self {
        Self::all()
    }
}

/// The character set used to draw a border.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BorderChars {
    /// Top-left corner.
    pub top_left: char,
    /// Top-right corner.
    pub top_right: char,
    /// Bottom-left corner.
    pub bottom_left: char,
    /// Bottom-right corner.
    pub bottom_right: char,
    /// Horizontal edge.
    pub horizontal: char,
    /// Vertical edge.
    pub vertical: char,
}

/// A border line style.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BorderStyle {
    /// Single thin lines.
    #[default]
    Single,
    /// Double lines.
    Double,
    /// Rounded corners.
    Rounded,
    /// Heavy (thick) lines.
    Heavy,
    /// Caller-provided character set.
    Custom(BorderChars),
}

impl BorderStyle {
    /// The characters for this style.
    pub fn chars(self) -> BorderChars {
        match self {
            BorderStyle::Single => BorderChars {
                top_left: '┌',
                top_right: '┐',
                bottom_left: '└',
                bottom_right: '┘',
                horizontal: '─',
                vertical: '│',
            },
            BorderStyle::Double => BorderChars {
                top_left: '╔',
                top_right: '╗',
                bottom_left: '╚',
                bottom_right: '╝',
                horizontal: '═',
                vertical: '║',
            },
            BorderStyle::Rounded => BorderChars {
                top_left: '╭',
                top_right: '╮',
                bottom_left: '╰',
                bottom_right: '╯',
                horizontal: '─',
                vertical: '│',
            },
            BorderStyle::Heavy => BorderChars {
                top_left: '┏',
                top_right: '┓',
                bottom_left: '┗',
                bottom_right: '┛',
                horizontal: '━',
                vertical: '┃',
            },
            BorderStyle::Custom(chars) => chars,
        }
    }
}

/// Horizontal placement of an in-border title.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TitleAlignment {
    /// Flush left (after the corner).
    #[default]
    Left,
    /// Centered in the top edge.
    Center,
    /// Flush right (before the corner).
    Right,
}

/// Options for [`crate::buffer::CellBuffer::draw_box`].
#[derive(Clone, Debug)]
pub struct BoxOptions {
    /// X position of the box.
    pub x: i32,
    /// Y position of the box.
    pub y: i32,
    /// Width in cells.
    pub width: u16,
    /// Height in rows.
    pub height: u16,
    /// Line style.
    pub style: BorderStyle,
    /// Which sides are drawn.
    pub sides: BorderSides,
    /// Border color.
    pub border_color: Rgba,
    /// Fill color for the interior (and border background).
    pub background: Rgba,
    /// Whether to fill the interior with the background color.
    pub fill: bool,
    /// Optional title painted into the top border, truncated to fit.
    pub title: Option<String>,
    /// Title placement.
    pub title_alignment: TitleAlignment,
}

impl BoxOptions {
    /// A full bordered box at the given rectangle with sane defaults.
    pub fn new(x: i32, y: i32, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
            style: BorderStyle::default(),
            sides: BorderSides::all(),
            border_color: Rgba::WHITE,
            background: Rgba::TRANSPARENT,
            fill: false,
            title: None,
            title_alignment: TitleAlignment::Left,
        }
    }
}
