//! Spatial index for mouse hit-testing.

use crate::geometry::Rect;
use crate::node::NodeNum;

/// Flat per-frame grid mapping each cell to the topmost renderable there.
///
/// Cleared at the start of every frame and repopulated in render-list
/// order, so the last writer at a cell wins, matching paint order.
pub struct HitGrid {
    grid: Vec<u64>,
    width: u16,
    height: u16,
}

const EMPTY: u64 = 0;

impl HitGrid {
    /// Create a grid of the given size with no entries.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            grid: vec![EMPTY; usize::from(width) * usize::from(height)],
            width,
            height,
        }
    }

    /// Grid width in columns.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Grid height in rows.
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Stamp a rectangle with a renderable's number.
    pub fn fill_rect(&mut self, rect: Rect, num: NodeNum) {
        let x2 = rect.right().min(self.width);
        let y2 = rect.bottom().min(self.height);
        let raw = num.raw();
        for row in rect.y()..y2 {
            let row_start = usize::from(row) * usize::from(self.width);
            for col in rect.x()..x2 {
                self.grid[row_start + usize::from(col)] = raw;
            }
        }
    }

    /// The topmost renderable at (x, y), if any.
    pub fn hit_test(&self, x: u16, y: u16) -> Option<NodeNum> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let raw = self.grid[usize::from(y) * usize::from(self.width) + usize::from(x)];
        (raw != EMPTY).then(|| NodeNum::from_raw(raw))
    }

    /// Clear all entries.
    pub fn clear(&mut self) {
        self.grid.fill(EMPTY);
    }

    /// Resize the grid, clearing all entries.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.grid.clear();
        self.grid
            .resize(usize::from(width) * usize::from(height), EMPTY);
    }
}
