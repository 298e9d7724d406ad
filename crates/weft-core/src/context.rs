//! Engine configuration and shared runtime context.
//!
//! There are no process-wide singletons: everything ambient (width
//! method, capabilities, captured console, reported pixel size) lives on
//! an explicit context owned by the engine.

use std::time::Duration;

use crate::color::Rgba;
use crate::console::ConsoleCapture;
use crate::segment::WidthMethod;
use crate::terminal::{MouseMode, TerminalCapabilities};

/// Static configuration for an engine instance.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Target frame rate.
    pub target_fps: u32,
    /// Width-measurement method used everywhere in this engine.
    pub width_method: WidthMethod,
    /// Clear color of the render area.
    pub background: Rgba,
    /// Use the alternate screen buffer (ignored in split mode).
    pub use_alternate_screen: bool,
    /// Mouse reporting mode.
    pub mouse: MouseMode,
    /// Kitty keyboard protocol flags to push, if any.
    pub kitty_keyboard_flags: Option<u8>,
    /// Enable bracketed paste.
    pub bracketed_paste: bool,
    /// Split mode: only the bottom N rows host the UI, captured output
    /// scrolls above.
    pub split_height: Option<u16>,
    /// Debounce window for terminal resizes (forced to zero in split mode).
    pub resize_debounce: Duration,
    /// How many captured console lines to keep for crash dumps.
    pub console_lines: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target_fps: 30,
            width_method: WidthMethod::default(),
            background: Rgba::BLACK,
            use_alternate_screen: true,
            mouse: MouseMode::Buttons,
            kitty_keyboard_flags: None,
            bracketed_paste: true,
            split_height: None,
            resize_debounce: Duration::from_millis(100),
            console_lines: 200,
        }
    }
}

impl EngineConfig {
    /// The effective resize debounce: split mode reacts immediately.
    pub fn effective_resize_debounce(&self) -> Duration {
        if self.split_height.is_some() {
            Duration::ZERO
        } else {
            self.resize_debounce
        }
    }
}

/// Runtime context owned by the engine and readable by embedders.
#[derive(Debug)]
pub struct EngineContext {
    /// The configuration the engine was built with.
    pub config: EngineConfig,
    /// Capabilities of the attached terminal.
    pub capabilities: TerminalCapabilities,
    /// Terminal pixel size from the last `CSI 14 t` response.
    pub pixel_size: Option<(u32, u32)>,
    /// Captured application output.
    pub console: ConsoleCapture,
}

impl EngineContext {
    /// Build a context from configuration and detected capabilities.
    pub fn new(config: EngineConfig, capabilities: TerminalCapabilities) -> Self {
        let console = ConsoleCapture::new(config.console_lines);
        Self {
            config,
            capabilities,
            pixel_size: None,
            console,
        }
    }
}
