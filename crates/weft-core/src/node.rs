//! Node identity and per-node engine state.

use crate::buffer::CellBuffer;
use crate::geometry::Rect;
use crate::layout::NodeStyle;

/// Process-wide stable node identifier, also used by the hit grid.
///
/// Numbers are handed out monotonically by the tree and never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeNum(u64);

impl NodeNum {
    /// Build a node number from its raw value (tests and hit-grid decode).
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw value.
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Construction options for a node.
#[derive(Clone, Debug, Default)]
pub struct NodeOptions {
    /// Identifier unique among the node's siblings.
    pub id: String,
    /// Layout-affecting attributes.
    pub style: NodeStyle,
    /// Whether the node renders and receives events.
    pub visible: bool,
    /// Whether the node can take keyboard focus.
    pub focusable: bool,
    /// Whether the node participates in text selection.
    pub selectable: bool,
    /// Whether the node needs per-frame ticking while visible.
    pub live: bool,
    /// Whether the node renders into a private framebuffer that is
    /// composited in afterwards.
    pub buffered: bool,
}

impl NodeOptions {
    /// Options with the given id and defaults otherwise (visible, not
    /// focusable, not selectable, not live, not buffered).
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            visible: true,
            ..Self::default()
        }
    }
}

/// Engine-managed state of one node, handed to every renderable hook.
#[derive(Debug)]
pub struct NodeState {
    /// The node's stable number.
    pub num: NodeNum,
    /// Identifier unique among siblings.
    pub id: String,
    /// Layout-affecting attributes. Mutate through the tree so the solver
    /// sees changes.
    pub style: NodeStyle,
    /// Whether the node renders and receives events.
    pub visible: bool,
    /// Whether the node can take keyboard focus.
    pub focusable: bool,
    /// Whether the node currently has focus.
    pub focused: bool,
    /// Whether the node participates in text selection.
    pub selectable: bool,
    /// Whether the node needs per-frame ticking while visible.
    pub live: bool,
    /// Number of live, visible nodes in this subtree (self included).
    pub(crate) live_count: u32,
    /// Set when this node needs a redraw.
    pub dirty: bool,
    /// Terminal state; operations on destroyed nodes are no-ops.
    pub(crate) destroyed: bool,
    /// Whether the node owns a private framebuffer.
    pub buffered: bool,
    /// The private framebuffer when `buffered`.
    pub(crate) frame: Option<CellBuffer>,
    /// Computed absolute box from the last layout pass, clamped to the
    /// visible quadrant.
    pub(crate) rect: Rect,
    /// Precise absolute origin (may be negative when translated off-screen).
    pub(crate) abs_x: i32,
    /// Precise absolute origin (may be negative when translated off-screen).
    pub(crate) abs_y: i32,
    /// Post-layout translation offset (cheap scrolling).
    pub translate: (i32, i32),
}

impl NodeState {
    pub(crate) fn new(num: NodeNum, opts: NodeOptions) -> Self {
        Self {
            num,
            id: opts.id,
            style: opts.style,
            visible: opts.visible,
            focusable: opts.focusable,
            focused: false,
            selectable: opts.selectable,
            live: opts.live,
            live_count: 0,
            dirty: true,
            destroyed: false,
            buffered: opts.buffered,
            frame: None,
            rect: Rect::default(),
            abs_x: 0,
            abs_y: 0,
            translate: (0, 0),
        }
    }

    /// The absolute box computed by the last layout pass.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Where `render_self` should draw: the origin of the private
    /// framebuffer for buffered nodes, the absolute origin otherwise.
    pub fn draw_origin(&self) -> (i32, i32) {
        if self.buffered {
            (0, 0)
        } else {
            (self.abs_x, self.abs_y)
        }
    }

    /// Precise absolute origin (may be negative when translated off-screen).
    pub fn position(&self) -> (i32, i32) {
        (self.abs_x, self.abs_y)
    }

    /// Live, visible nodes in this subtree (self included).
    pub fn live_count(&self) -> u32 {
        self.live_count
    }

    /// Whether this node has been destroyed.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Mark this node as needing a redraw.
    pub fn request_render(&mut self) {
        self.dirty = true;
    }
}
