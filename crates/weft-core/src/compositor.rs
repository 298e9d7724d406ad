//! Double-buffered compositing: swap, diff, and minimal byte emission.

use crate::buffer::CellBuffer;
use crate::color::Rgba;
use crate::error::Result;
use crate::renderer::Renderer;
use crate::segment::WidthMethod;
use crate::terminal::Terminal;

/// Owns the two frame buffers and serializes the per-frame diff.
///
/// Each frame: [`Compositor::begin_frame`] swaps buffers and clears the
/// next one, the pipeline draws into it, and [`Compositor::end_frame`]
/// diffs it against the previous frame and writes the escape stream to the
/// terminal. Nothing is observable on the terminal until `end_frame`.
pub struct Compositor {
    current: CellBuffer,
    previous: CellBuffer,
    renderer: Renderer,
    row_offset: u16,
    force_full: bool,
}

impl Compositor {
    /// Create a compositor for a render area of the given size.
    pub fn new(
        width: u16,
        height: u16,
        bg0: Rgba,
        width_method: WidthMethod,
        renderer: Renderer,
    ) -> Self {
        Self {
            current: CellBuffer::new(width, height, bg0, width_method),
            previous: CellBuffer::new(width, height, bg0, width_method),
            renderer,
            row_offset: 0,
            force_full: true,
        }
    }

    /// The buffer being composed this frame.
    pub fn buffer(&self) -> &CellBuffer {
        &self.current
    }

    /// Rows the emitted output is shifted down by (split mode).
    pub fn row_offset(&self) -> u16 {
        self.row_offset
    }

    /// Shift all emitted rows down by `offset` (split mode pinning).
    pub fn set_row_offset(&mut self, offset: u16) {
        self.row_offset = offset;
    }

    /// Swap buffers and clear the next frame's canvas. Returns the buffer
    /// the frame should be drawn into.
    pub fn begin_frame(&mut self) -> &mut CellBuffer {
        std::mem::swap(&mut self.current, &mut self.previous);
        let bg0 = self.current.bg0();
        self.current.clear(bg0);
        &mut self.current
    }

    /// Diff the composed frame against the previous one and write the
    /// changes to the terminal. Returns the number of bytes written.
    pub fn end_frame(&mut self, terminal: &mut dyn Terminal) -> Result<usize> {
        let changes = if self.force_full {
            self.force_full = false;
            self.current.full_diff()
        } else {
            self.current.diff(&self.previous)
        };
        let output = self.renderer.render_with_offset(&changes, self.row_offset);
        if output.is_empty() {
            return Ok(0);
        }
        terminal.write_raw(output.as_bytes())?;
        terminal.flush()?;
        Ok(output.len())
    }

    /// Resize both buffers; the next frame is emitted in full.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.current.resize(width, height);
        self.previous.resize(width, height);
        self.force_full = true;
    }

    /// Force the next `end_frame` to emit every cell (after the scrollback
    /// region above a split UI moved, or an external program wrote to the
    /// screen).
    pub fn invalidate(&mut self) {
        self.force_full = true;
    }
}
