//! In-memory terminal backend for testing.

use crate::error::Result;
use crate::geometry::Size;

use super::traits::{Terminal, TerminalCapabilities};

/// In-memory terminal backend.
///
/// All output is captured in a buffer that can be inspected; mode changes
/// are tracked as flags.
pub struct TestBackend {
    size: Size,
    capabilities: TerminalCapabilities,
    buffer: Vec<u8>,
    raw_mode: bool,
    alternate_screen: bool,
}

impl TestBackend {
    /// Create a test backend with the given size.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            size: Size::new(width, height),
            capabilities: TerminalCapabilities::default(),
            buffer: Vec::new(),
            raw_mode: false,
            alternate_screen: false,
        }
    }

    /// Create a test backend with explicit capabilities.
    pub fn with_capabilities(width: u16, height: u16, caps: TerminalCapabilities) -> Self {
        Self {
            capabilities: caps,
            ..Self::new(width, height)
        }
    }

    /// The bytes written so far.
    pub fn output(&self) -> &[u8] {
        &self.buffer
    }

    /// The bytes written so far, lossily decoded.
    pub fn output_string(&self) -> String {
        String::from_utf8_lossy(&self.buffer).into_owned()
    }

    /// Drop captured output.
    pub fn clear_output(&mut self) {
        self.buffer.clear();
    }

    /// Whether raw mode is active.
    pub fn is_raw_mode(&self) -> bool {
        self.raw_mode
    }

    /// Whether the alternate screen is active.
    pub fn is_alternate_screen(&self) -> bool {
        self.alternate_screen
    }

    /// Simulate a terminal resize.
    pub fn set_size(&mut self, width: u16, height: u16) {
        self.size = Size::new(width, height);
    }
}

impl Terminal for TestBackend {
    fn size(&self) -> Result<Size> {
        Ok(self.size)
    }

    fn capabilities(&self) -> &TerminalCapabilities {
        &self.capabilities
    }

    fn enter_raw_mode(&mut self) -> Result<()> {
        self.raw_mode = true;
        Ok(())
    }

    fn exit_raw_mode(&mut self) -> Result<()> {
        self.raw_mode = false;
        Ok(())
    }

    fn enter_alternate_screen(&mut self) -> Result<()> {
        self.alternate_screen = true;
        Ok(())
    }

    fn leave_alternate_screen(&mut self) -> Result<()> {
        self.alternate_screen = false;
        Ok(())
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
