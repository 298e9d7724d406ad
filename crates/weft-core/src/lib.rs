//! weft-core: a retained-mode terminal UI rendering engine.
//!
//! The engine keeps a tree of renderables, lays it out with flexbox,
//! composites styled cells into a double-buffered grid, and writes a
//! minimal diff of escape sequences to the terminal each frame. Keyboard,
//! mouse, paste, resize, and selection events are parsed from raw bytes
//! and routed back into the tree.

pub mod ansi;
pub mod border;
pub mod buffer;
pub mod cell;
pub mod color;
pub mod compositor;
pub mod console;
pub mod context;
pub mod elements;
pub mod engine;
pub mod error;
pub mod events;
pub mod geometry;
pub mod hit_grid;
pub mod input;
pub mod layout;
pub mod node;
pub mod pipeline;
pub mod renderable;
pub mod renderer;
pub mod routing;
pub mod scheduler;
pub mod segment;
pub mod selection;
pub mod style;
pub mod terminal;
pub mod text_buffer;
pub mod tree;

pub use border::{BorderChars, BorderSides, BorderStyle, BoxOptions, TitleAlignment};
pub use buffer::{CellBuffer, CellChange};
pub use cell::Cell;
pub use color::{NamedColor, Rgba};
pub use compositor::Compositor;
pub use console::{ConsoleCapture, ConsoleWriter};
pub use context::{EngineConfig, EngineContext};
pub use elements::{BoxElement, TextElement};
pub use engine::{Engine, InputSource};
pub use error::{Result, WeftError};
pub use events::{
    InputEvent, KeyCode, KeyEventKind, Modifiers, MouseButton, MouseEvent, MouseEventKind,
    MouseInput, MouseInputKind, ParsedKey, ScrollDirection, ScrollInfo,
};
pub use geometry::{Position, Rect, Size};
pub use hit_grid::HitGrid;
pub use input::InputParser;
pub use layout::{
    AlignItems, ComputedBox, Dimension, Edges, FlexDirection, FlexWrap, JustifyContent, LayoutTree,
    NodeStyle, Overflow, PositionKind,
};
pub use node::{NodeNum, NodeOptions, NodeState};
pub use renderable::{Blank, Renderable};
pub use renderer::Renderer;
pub use routing::EventRouter;
pub use scheduler::{ControlState, FrameScheduler};
pub use segment::WidthMethod;
pub use selection::Selection;
pub use style::Attributes;
pub use terminal::{
    ColorSupport, CrosstermBackend, MouseMode, Terminal, TerminalCapabilities, TestBackend,
};
pub use text_buffer::{LineInfo, StyledChunk, TextBuffer, WrapMode};
pub use tree::Tree;
