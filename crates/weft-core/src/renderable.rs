//! The Renderable capability trait.
//!
//! Every node kind implements this one trait; the engine never needs more
//! than these hooks. Concrete kinds are flat (no deep inheritance): a kind
//! either implements a hook or inherits the no-op default.

use std::time::Duration;

use crate::buffer::CellBuffer;
use crate::events::{MouseEvent, ParsedKey};
use crate::node::NodeState;
use crate::selection::Selection;

/// Behavior of one node kind.
pub trait Renderable {
    /// Draw this node into `buf`. For buffered nodes `buf` is the node's
    /// private framebuffer with origin (0, 0); otherwise it is the main
    /// buffer and the node draws at its absolute rect.
    fn render_self(&mut self, state: &NodeState, buf: &mut CellBuffer, dt: Duration) {
        let _ = (state, buf, dt);
    }

    /// Whether this node takes part in the lifecycle pass at the start of
    /// every frame.
    fn wants_lifecycle_pass(&self) -> bool {
        false
    }

    /// Frame lifecycle hook (pass 0), in insertion order.
    fn on_lifecycle_pass(&mut self, state: &mut NodeState) {
        let _ = state;
    }

    /// Per-frame update hook, before drawing.
    fn on_update(&mut self, state: &mut NodeState, dt: Duration) {
        let _ = (state, dt);
    }

    /// The node's computed size changed during layout.
    fn on_layout_resize(&mut self, state: &mut NodeState, width: u16, height: u16) {
        let _ = (state, width, height);
    }

    /// A routed mouse event reached this node (target or ancestor).
    /// Call [`MouseEvent::stop_propagation`] to stop bubbling.
    fn on_mouse_event(&mut self, state: &mut NodeState, event: &mut MouseEvent) {
        let _ = (state, event);
    }

    /// A key event was delivered (the node is focused). Return true when
    /// consumed.
    fn handle_key_press(&mut self, state: &mut NodeState, key: &ParsedKey) -> bool {
        let _ = (state, key);
        false
    }

    /// Pasted text was delivered (the node is focused). Return true when
    /// consumed.
    fn handle_paste(&mut self, state: &mut NodeState, text: &str) -> bool {
        let _ = (state, text);
        false
    }

    /// The node gained keyboard focus.
    fn on_focused(&mut self, state: &mut NodeState) {
        let _ = state;
    }

    /// The node lost keyboard focus.
    fn on_blurred(&mut self, state: &mut NodeState) {
        let _ = state;
    }

    /// Whether a left-button press at the absolute cell (x, y) should start
    /// a text selection instead of a click/drag.
    fn should_start_selection(&self, state: &NodeState, x: u16, y: u16) -> bool {
        let _ = (state, x, y);
        false
    }

    /// The engine-wide selection changed. Return true when this node now
    /// contains selected content.
    fn on_selection_changed(&mut self, state: &mut NodeState, selection: &Selection) -> bool {
        let _ = (state, selection);
        false
    }

    /// The node's currently selected text, if any.
    fn selected_text(&self) -> Option<String> {
        None
    }

    /// Intrinsic content size at a proposed width, for layout measurement.
    /// Return `None` for nodes without intrinsic content.
    fn measure(&self, proposed_width: Option<u16>) -> Option<(u16, u16)> {
        let _ = proposed_width;
        None
    }
}

/// A renderable that draws nothing: a pure layout container.
#[derive(Clone, Copy, Debug, Default)]
pub struct Blank;

impl Renderable for Blank {}
