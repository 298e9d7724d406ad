//! Typed input and interaction events.
//!
//! The engine's events are a small closed set modeled as enums with
//! payloads; listeners are trait hooks on renderables rather than a
//! stringly-typed emitter.

use crate::node::NodeNum;

bitflags::bitflags! {
    /// Keyboard modifier flags.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// Shift key.
        const SHIFT = 1 << 0;
        /// Alt / Option key.
        const ALT = 1 << 1;
        /// Control key.
        const CTRL = 1 << 2;
        /// Super / Command key.
        const SUPER = 1 << 3;
    }
}

/// A mouse button.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseButton {
    /// Left button.
    Left,
    /// Middle button / wheel press.
    Middle,
    /// Right button.
    Right,
}

/// Scroll direction of a wheel event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollDirection {
    /// Away from the user.
    Up,
    /// Toward the user.
    Down,
}

/// Wheel payload on scroll events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScrollInfo {
    /// Direction of travel.
    pub direction: ScrollDirection,
    /// Magnitude in notional rows.
    pub delta: i32,
}

/// Parser-level mouse event kinds, before routing enriches them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseInputKind {
    /// Button pressed.
    Down,
    /// Button released.
    Up,
    /// Motion without a held button.
    Move,
    /// Motion with a held button.
    Drag,
    /// Wheel scroll.
    Scroll,
}

/// A decoded mouse report from the terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MouseInput {
    /// Event kind.
    pub kind: MouseInputKind,
    /// Button involved, if any.
    pub button: Option<MouseButton>,
    /// Column (0-based).
    pub x: u16,
    /// Row (0-based).
    pub y: u16,
    /// Held modifiers.
    pub modifiers: Modifiers,
    /// Wheel payload for scroll events.
    pub scroll: Option<ScrollInfo>,
}

/// Routed mouse event kinds delivered to renderables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseEventKind {
    /// Button pressed over the target.
    Down,
    /// Button released.
    Up,
    /// Motion without a held button.
    Move,
    /// Motion with a held button (target may be captured).
    Drag,
    /// Capture released after a drag.
    DragEnd,
    /// A captured renderable was dropped onto the target.
    Drop,
    /// Pointer entered the target.
    Over,
    /// Pointer left the target.
    Out,
    /// Wheel scroll over the target.
    Scroll,
}

/// A routed mouse event.
#[derive(Clone, Debug)]
pub struct MouseEvent {
    /// Event kind.
    pub kind: MouseEventKind,
    /// Column (0-based, render-offset adjusted).
    pub x: u16,
    /// Row (0-based, render-offset adjusted).
    pub y: u16,
    /// Button involved, if any.
    pub button: Option<MouseButton>,
    /// Held modifiers.
    pub modifiers: Modifiers,
    /// Wheel payload for scroll events.
    pub scroll: Option<ScrollInfo>,
    /// Originating renderable for `Over`/`Drop` during a capture.
    pub source: Option<NodeNum>,
    stopped: bool,
}

impl MouseEvent {
    /// Create a routed event from a decoded report with a new kind.
    pub fn from_input(input: &MouseInput, kind: MouseEventKind) -> Self {
        Self {
            kind,
            x: input.x,
            y: input.y,
            button: input.button,
            modifiers: input.modifiers,
            scroll: input.scroll,
            source: None,
            stopped: false,
        }
    }

    /// Stop this event from bubbling further up the parent chain.
    pub fn stop_propagation(&mut self) {
        self.stopped = true;
    }

    /// Whether propagation has been stopped.
    pub fn propagation_stopped(&self) -> bool {
        self.stopped
    }
}

/// Key event phases (release/repeat require the Kitty protocol).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeyEventKind {
    /// Key pressed.
    #[default]
    Press,
    /// Key held and repeating.
    Repeat,
    /// Key released.
    Release,
}

/// A key code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum KeyCode {
    /// A character key.
    Char(char),
    /// Enter / Return.
    Enter,
    /// Tab.
    Tab,
    /// Backspace.
    Backspace,
    /// Delete.
    Delete,
    /// Escape.
    Escape,
    /// Arrow up.
    Up,
    /// Arrow down.
    Down,
    /// Arrow left.
    Left,
    /// Arrow right.
    Right,
    /// Home.
    Home,
    /// End.
    End,
    /// Page up.
    PageUp,
    /// Page down.
    PageDown,
    /// Insert.
    Insert,
    /// Function key (F1-F12).
    F(u8),
}

/// A decoded keystroke.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedKey {
    /// The key code.
    pub code: KeyCode,
    /// Held modifiers.
    pub modifiers: Modifiers,
    /// Press / repeat / release.
    pub kind: KeyEventKind,
    /// The raw bytes this key was decoded from.
    pub raw: Vec<u8>,
}

impl ParsedKey {
    /// A plain press with no modifiers and no recorded bytes.
    pub fn plain(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::empty(),
            kind: KeyEventKind::Press,
            raw: Vec::new(),
        }
    }

    /// Check if Ctrl is held.
    pub fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    /// Check if Alt is held.
    pub fn alt(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }

    /// Check if Shift is held.
    pub fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }
}

/// An event produced by the input parsers.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum InputEvent {
    /// A decoded keystroke.
    Key(ParsedKey),
    /// A bracketed paste, escapes stripped.
    Paste(String),
    /// A decoded mouse report.
    Mouse(MouseInput),
    /// The terminal reported its pixel size (`CSI 4 ; H ; W t`).
    PixelResolution {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
    /// The terminal gained focus.
    FocusGained,
    /// The terminal lost focus.
    FocusLost,
}
