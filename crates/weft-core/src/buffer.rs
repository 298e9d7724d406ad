//! Cell buffer — a scissored 2D grid of styled terminal cells.

use crate::border::{BorderSides, BoxOptions, TitleAlignment};
use crate::cell::Cell;
use crate::color::Rgba;
use crate::geometry::{Rect, Size};
use crate::segment::{self, WidthMethod};
use crate::style::Attributes;
use crate::text_buffer::TextBuffer;

/// A 2D grid of terminal cells with a scissor-rectangle stack.
///
/// All drawing operations clip against the intersection of the scissor
/// stack; an empty stack means the full buffer. Coordinates on drawing
/// operations are signed so content can be translated partially off-screen.
#[derive(Clone, Debug)]
pub struct CellBuffer {
    cells: Vec<Cell>,
    width: u16,
    height: u16,
    bg0: Rgba,
    scissors: Vec<Rect>,
    respect_alpha: bool,
    width_method: WidthMethod,
}

impl CellBuffer {
    /// Create a buffer filled with blank cells in the clear color `bg0`.
    pub fn new(width: u16, height: u16, bg0: Rgba, width_method: WidthMethod) -> Self {
        let len = usize::from(width) * usize::from(height);
        Self {
            cells: vec![Cell::blank(bg0); len],
            width,
            height,
            bg0,
            scissors: Vec::new(),
            respect_alpha: false,
            width_method,
        }
    }

    /// Buffer width in columns.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Buffer height in rows.
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Buffer dimensions.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// The clear color used for blank cells.
    pub fn bg0(&self) -> Rgba {
        self.bg0
    }

    /// The width method used by text drawing operations.
    pub fn width_method(&self) -> WidthMethod {
        self.width_method
    }

    /// Whether blitting this buffer into another composites per cell alpha.
    pub fn respect_alpha(&self) -> bool {
        self.respect_alpha
    }

    /// Set whether this buffer is composited with per-cell alpha when
    /// blitted into another buffer.
    pub fn set_respect_alpha(&mut self, respect: bool) {
        self.respect_alpha = respect;
    }

    /// Fill the whole buffer with blanks in `color` and make it the new
    /// clear color.
    pub fn clear(&mut self, color: Rgba) {
        self.bg0 = color;
        for cell in &mut self.cells {
            *cell = Cell::blank(color);
        }
    }

    /// Resize the buffer. Previous content is discarded.
    ///
    /// The scissor stack is reset; resizing mid-draw is not meaningful.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        let len = usize::from(width) * usize::from(height);
        self.cells.clear();
        self.cells.resize(len, Cell::blank(self.bg0));
        self.scissors.clear();
    }

    /// Push a scissor rectangle. Drawing is clipped to the intersection of
    /// every rectangle on the stack.
    pub fn push_scissor_rect(&mut self, x: i32, y: i32, width: u16, height: u16) {
        let requested = Rect::from_signed(x, y, width, height).unwrap_or(Rect::new(0, 0, 0, 0));
        let clipped = self
            .clip()
            .intersection(&requested)
            .unwrap_or(Rect::new(0, 0, 0, 0));
        self.scissors.push(clipped);
    }

    /// Pop the most recent scissor rectangle.
    ///
    /// Popping an empty stack is an invariant violation: it panics in debug
    /// builds and is skipped with a diagnostic in release builds.
    pub fn pop_scissor_rect(&mut self) {
        if self.scissors.pop().is_none() {
            debug_assert!(false, "pop_scissor_rect without matching push");
            tracing::error!("pop_scissor_rect without matching push; skipping");
        }
    }

    /// Depth of the scissor stack.
    pub fn scissor_depth(&self) -> usize {
        self.scissors.len()
    }

    /// The effective clip rectangle (intersection of the scissor stack).
    pub fn clip(&self) -> Rect {
        self.scissors
            .last()
            .copied()
            .unwrap_or(Rect::new(0, 0, self.width, self.height))
    }

    /// Get the cell at (x, y), or `None` if out of bounds.
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        if x < self.width && y < self.height {
            self.cells.get(self.index(x, y))
        } else {
            None
        }
    }

    /// Get a row of cells as a slice.
    pub fn row(&self, y: u16) -> Option<&[Cell]> {
        if y < self.height {
            let start = self.index(0, y);
            Some(&self.cells[start..start + usize::from(self.width)])
        } else {
            None
        }
    }

    /// Write a cell at (x, y), clipped to the scissor stack.
    ///
    /// An opaque cell replaces the destination; a translucent cell is
    /// composited over it (colors blended, attributes merged with OR).
    /// Wide graphemes also stamp a continuation cell, and any write that
    /// overlaps half of an existing wide grapheme invalidates the other
    /// half.
    pub fn set_cell(&mut self, x: i32, y: i32, cell: Cell) {
        let clip = self.clip();
        if x < 0 || y < 0 {
            return;
        }
        let (ux, uy) = (x as u16, y as u16);
        if !clip.contains(crate::geometry::Position::new(ux, uy)) {
            return;
        }
        // A wide grapheme whose continuation would fall outside the clip is
        // degraded to a blank, mirroring the buffer-edge rule.
        if cell.is_wide()
            && !clip.contains(crate::geometry::Position::new(ux.saturating_add(1), uy))
        {
            self.put(ux, uy, Cell::blank(cell.bg));
            return;
        }

        if cell.fg.is_opaque() && cell.bg.is_opaque() {
            self.put(ux, uy, cell);
        } else {
            let merged = match self.get(ux, uy) {
                Some(dst) => {
                    let mut merged = dst.clone();
                    if merged.is_continuation() {
                        // Compositing over a continuation column; start from a
                        // blank so the merged cell is a real glyph carrier.
                        merged = Cell::blank(merged.bg);
                    }
                    merged.composite(&cell);
                    merged
                }
                None => cell,
            };
            self.put(ux, uy, merged);
        }
    }

    /// Draw a string starting at (x, y). Never wraps; graphemes that fall
    /// outside the clip are dropped.
    pub fn draw_text(
        &mut self,
        text: &str,
        x: i32,
        y: i32,
        fg: Rgba,
        bg: Option<Rgba>,
        attrs: Attributes,
    ) {
        let bg = bg.unwrap_or(Rgba::TRANSPARENT);
        let mut cx = x;
        let method = self.width_method;
        for g in segment::graphemes(text, method) {
            if g.width == 0 {
                continue;
            }
            self.set_cell(cx, y, Cell::new(g.text, g.width, fg, bg, attrs));
            cx += i32::from(g.width);
        }
    }

    /// Draw a box with optional border sides, interior fill, and an
    /// in-border title.
    pub fn draw_box(&mut self, opts: &BoxOptions) {
        if opts.width == 0 || opts.height == 0 {
            return;
        }
        let chars = opts.style.chars();
        let w = i32::from(opts.width);
        let h = i32::from(opts.height);
        let (x0, y0) = (opts.x, opts.y);
        let (x1, y1) = (x0 + w - 1, y0 + h - 1);
        let top = opts.sides.contains(BorderSides::TOP) && opts.height > 0;
        let bottom = opts.sides.contains(BorderSides::BOTTOM) && opts.height > 1;
        let left = opts.sides.contains(BorderSides::LEFT);
        let right = opts.sides.contains(BorderSides::RIGHT) && opts.width > 1;

        if opts.fill {
            let fill_x0 = if left { x0 + 1 } else { x0 };
            let fill_x1 = if right { x1 - 1 } else { x1 };
            let fill_y0 = if top { y0 + 1 } else { y0 };
            let fill_y1 = if bottom { y1 - 1 } else { y1 };
            for fy in fill_y0..=fill_y1 {
                for fx in fill_x0..=fill_x1 {
                    self.set_cell(fx, fy, Cell::blank(opts.background));
                }
            }
        }

        let border_cell = |ch: char| {
            Cell::new(
                ch.to_string(),
                1,
                opts.border_color,
                opts.background,
                Attributes::empty(),
            )
        };

        if top {
            for fx in x0..=x1 {
                self.set_cell(fx, y0, border_cell(chars.horizontal));
            }
        }
        if bottom {
            for fx in x0..=x1 {
                self.set_cell(fx, y1, border_cell(chars.horizontal));
            }
        }
        if left {
            for fy in y0..=y1 {
                self.set_cell(x0, fy, border_cell(chars.vertical));
            }
        }
        if right {
            for fy in y0..=y1 {
                self.set_cell(x1, fy, border_cell(chars.vertical));
            }
        }
        if top && left {
            self.set_cell(x0, y0, border_cell(chars.top_left));
        }
        if top && right {
            self.set_cell(x1, y0, border_cell(chars.top_right));
        }
        if bottom && left {
            self.set_cell(x0, y1, border_cell(chars.bottom_left));
        }
        if bottom && right {
            self.set_cell(x1, y1, border_cell(chars.bottom_right));
        }

        if top && let Some(title) = opts.title.as_deref() {
            self.draw_box_title(opts, title, x0, y0);
        }
    }

    fn draw_box_title(&mut self, opts: &BoxOptions, title: &str, x0: i32, y0: i32) {
        let avail = usize::from(opts.width.saturating_sub(2));
        if avail == 0 {
            return;
        }
        let method = self.width_method;
        // Truncate the padded title to the available top-edge width.
        let padded = format!(" {title} ");
        let mut kept = String::new();
        let mut kept_width = 0usize;
        for g in segment::graphemes(&padded, method) {
            let gw = usize::from(g.width);
            if kept_width + gw > avail {
                break;
            }
            kept.push_str(g.text);
            kept_width += gw;
        }
        if kept_width == 0 {
            return;
        }
        let offset = match opts.title_alignment {
            TitleAlignment::Left => 1,
            TitleAlignment::Center => 1 + (avail - kept_width) as i32 / 2,
            TitleAlignment::Right => 1 + (avail - kept_width) as i32,
        };
        self.draw_text(
            &kept,
            x0 + offset,
            y0,
            opts.border_color,
            Some(opts.background),
            Attributes::empty(),
        );
    }

    /// Render a text buffer's wrapped lines at (x, y), honoring an optional
    /// extra clip rectangle on top of the scissor stack.
    pub fn draw_text_buffer(&mut self, text: &TextBuffer, x: i32, y: i32, clip: Option<Rect>) {
        text.draw_into(self, x, y, clip);
    }

    /// Blit another buffer into this one with its top-left at (x, y).
    ///
    /// Respects this buffer's scissor stack. When the source buffer has
    /// `respect_alpha` set, each cell is composited; otherwise cells
    /// replace the destination.
    pub fn draw_frame_buffer(&mut self, x: i32, y: i32, src: &CellBuffer) {
        for sy in 0..src.height {
            for sx in 0..src.width {
                let Some(cell) = src.get(sx, sy) else {
                    continue;
                };
                if cell.is_continuation() {
                    continue; // re-stamped by the leading cell
                }
                let dx = x + i32::from(sx);
                let dy = y + i32::from(sy);
                if src.respect_alpha {
                    self.set_cell(dx, dy, cell.clone());
                } else {
                    // Forced replacement still goes through set_cell for
                    // clipping and wide-char bookkeeping; make it opaque-wise
                    // equivalent by compositing over the clear color first.
                    let mut flat = Cell::blank(self.bg0);
                    flat.composite(cell);
                    flat.attrs = cell.attrs;
                    self.set_cell(dx, dy, flat);
                }
            }
        }
    }

    /// Compute the differences between this buffer and a previous buffer.
    ///
    /// Returns the cells to rewrite, in row-major order. A size mismatch
    /// yields a full redraw.
    pub fn diff(&self, previous: &CellBuffer) -> Vec<CellChange> {
        if self.width != previous.width || self.height != previous.height {
            return self.full_diff();
        }
        let mut changes = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = self.index(x, y);
                if self.cells[idx] != previous.cells[idx] {
                    changes.push(CellChange {
                        x,
                        y,
                        cell: self.cells[idx].clone(),
                    });
                }
            }
        }
        changes
    }

    /// Changes for every cell (used when sizes differ).
    pub fn full_diff(&self) -> Vec<CellChange> {
        let mut changes = Vec::with_capacity(self.cells.len());
        for y in 0..self.height {
            for x in 0..self.width {
                changes.push(CellChange {
                    x,
                    y,
                    cell: self.cells[self.index(x, y)].clone(),
                });
            }
        }
        changes
    }

    /// Raw write with wide-grapheme bookkeeping, no scissor check.
    ///
    /// - Writing over a continuation cell blanks the leading wide cell.
    /// - Writing over a wide cell blanks its old continuation.
    /// - A wide grapheme at the last column degrades to a blank.
    fn put(&mut self, x: u16, y: u16, cell: Cell) {
        if x >= self.width || y >= self.height {
            return;
        }

        let is_wide = cell.is_wide();
        if is_wide && x + 1 >= self.width {
            let idx = self.index(x, y);
            let blank = Cell::blank(cell.bg);
            if let Some(c) = self.cells.get_mut(idx) {
                *c = blank;
            }
            return;
        }

        let idx = self.index(x, y);
        if let Some(existing) = self.cells.get(idx)
            && existing.is_continuation()
            && x > 0
        {
            let prev_idx = self.index(x - 1, y);
            let bg = self.bg0;
            if let Some(prev) = self.cells.get_mut(prev_idx)
                && prev.is_wide()
            {
                *prev = Cell::blank(bg);
            }
        }

        if let Some(existing) = self.cells.get(idx)
            && existing.is_wide()
        {
            let next_x = x + 1;
            if next_x < self.width {
                let next_idx = self.index(next_x, y);
                let bg = self.bg0;
                if let Some(cont) = self.cells.get_mut(next_idx)
                    && cont.is_continuation()
                {
                    *cont = Cell::blank(bg);
                }
            }
        }

        let (fg, bg) = (cell.fg, cell.bg);
        if let Some(c) = self.cells.get_mut(idx) {
            *c = cell;
        }

        if is_wide {
            let next_x = x + 1;
            if next_x < self.width {
                // If the continuation lands on another wide grapheme's
                // leading cell, that grapheme loses its continuation too.
                let next_idx = self.index(next_x, y);
                if let Some(next_cell) = self.cells.get(next_idx)
                    && next_cell.is_wide()
                {
                    let after = next_x + 1;
                    if after < self.width {
                        let after_idx = self.index(after, y);
                        let blank = Cell::blank(self.bg0);
                        if let Some(after_cell) = self.cells.get_mut(after_idx) {
                            *after_cell = blank;
                        }
                    }
                }
                if let Some(c) = self.cells.get_mut(next_idx) {
                    *c = Cell::continuation(fg, bg);
                }
            }
        }
    }

    fn index(&self, x: u16, y: u16) -> usize {
        usize::from(y) * usize::from(self.width) + usize::from(x)
    }
}

/// A single cell change: position + new cell value.
#[derive(Clone, Debug, PartialEq)]
pub struct CellChange {
    /// Column position.
    pub x: u16,
    /// Row position.
    pub y: u16,
    /// New cell value.
    pub cell: Cell,
}
