//! Event routing: hit resolution, hover synthesis, capture, bubbling,
//! focus, and text selection tracking.

use crate::events::{MouseEvent, MouseEventKind, MouseInput, MouseInputKind, MouseButton, ParsedKey};
use crate::geometry::Position;
use crate::hit_grid::HitGrid;
use crate::node::NodeNum;
use crate::selection::Selection;
use crate::tree::Tree;

/// Routes parsed input to the tree.
///
/// Owns the transient interaction state: the hovered node, the captured
/// node during a drag, the keyboard focus singleton, and the in-progress
/// text selection.
#[derive(Default)]
pub struct EventRouter {
    hover: Option<NodeNum>,
    pressed: Option<NodeNum>,
    captured: Option<NodeNum>,
    focused: Option<NodeNum>,
    selection: Option<Selection>,
}

impl EventRouter {
    /// Create a router with no interaction state.
    pub fn new() -> Self {
        Self::default()
    }

    /// The node currently holding pointer capture.
    pub fn captured(&self) -> Option<NodeNum> {
        self.captured
    }

    /// The node currently holding keyboard focus.
    pub fn focused(&self) -> Option<NodeNum> {
        self.focused
    }

    /// The in-progress or finished selection, if any.
    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Drop any references to a node that left the tree.
    pub fn forget(&mut self, num: NodeNum) {
        if self.hover == Some(num) {
            self.hover = None;
        }
        if self.pressed == Some(num) {
            self.pressed = None;
        }
        if self.captured == Some(num) {
            self.captured = None;
        }
        if self.focused == Some(num) {
            self.focused = None;
        }
    }

    /// Move keyboard focus to `num`. Unfocusable or unknown nodes are
    /// ignored. The previous holder gets `on_blurred`, the new one
    /// `on_focused`.
    pub fn focus(&mut self, tree: &mut Tree, num: NodeNum) {
        if self.focused == Some(num) {
            return;
        }
        let focusable = tree.state(num).map(|s| s.focusable).unwrap_or(false);
        if !focusable {
            return;
        }
        self.blur(tree);
        if let Some(node) = tree.node_mut(num) {
            node.state.focused = true;
            node.behavior.on_focused(&mut node.state);
        }
        self.focused = Some(num);
        tree.request_render(num);
    }

    /// Clear keyboard focus, if any.
    pub fn blur(&mut self, tree: &mut Tree) {
        if let Some(prev) = self.focused.take() {
            if let Some(node) = tree.node_mut(prev) {
                node.state.focused = false;
                node.behavior.on_blurred(&mut node.state);
            }
            tree.request_render(prev);
        }
    }

    /// Deliver a key to the focused node. Returns whether it was consumed.
    pub fn dispatch_key(&mut self, tree: &mut Tree, key: &ParsedKey) -> bool {
        let Some(focused) = self.focused else {
            return false;
        };
        match tree.node_mut(focused) {
            Some(node) => node.behavior.handle_key_press(&mut node.state, key),
            None => {
                self.focused = None;
                false
            }
        }
    }

    /// Route one decoded mouse report through the tree.
    ///
    /// Returns the finalized selection when a selection drag ends on this
    /// event.
    pub fn dispatch_mouse(
        &mut self,
        tree: &mut Tree,
        hits: &HitGrid,
        input: MouseInput,
    ) -> Option<Selection> {
        // Scroll is resolved directly against the hit grid and bubbles from
        // the hit node; no hover or capture involvement.
        if input.kind == MouseInputKind::Scroll {
            if let Some(target) = hits.hit_test(input.x, input.y) {
                let ev = MouseEvent::from_input(&input, MouseEventKind::Scroll);
                self.bubble(tree, target, ev);
            }
            return None;
        }

        let target = hits.hit_test(input.x, input.y);

        if input.kind == MouseInputKind::Down {
            self.pressed = target;
        }

        // A left-button drag captures the node the press landed on.
        let selecting = self
            .selection
            .as_ref()
            .is_some_and(|sel| sel.is_selecting);
        if input.kind == MouseInputKind::Drag
            && input.button == Some(MouseButton::Left)
            && self.captured.is_none()
            && !selecting
        {
            self.captured = self.pressed.or(target);
        }

        // Hover synthesis: a changed target on motion produces Out then Over.
        if matches!(input.kind, MouseInputKind::Move | MouseInputKind::Drag)
            && target != self.hover
        {
            if let Some(prev) = self.hover {
                let mut out = MouseEvent::from_input(&input, MouseEventKind::Out);
                out.source = self.captured;
                self.bubble(tree, prev, out);
            }
            if let Some(now) = target {
                let mut over = MouseEvent::from_input(&input, MouseEventKind::Over);
                over.source = self.captured;
                self.bubble(tree, now, over);
            }
            self.hover = target;
        }

        // An in-progress selection consumes drags and finishes on release.
        if self
            .selection
            .as_ref()
            .is_some_and(|sel| sel.is_selecting)
        {
            match input.kind {
                MouseInputKind::Drag => {
                    self.update_selection(tree, target, Position::new(input.x, input.y));
                    return None;
                }
                MouseInputKind::Up => {
                    self.pressed = None;
                    if let Some(sel) = self.selection.as_mut() {
                        sel.is_selecting = false;
                    }
                    return self.selection.clone();
                }
                _ => {}
            }
        }

        // Left press: either start a selection or clear the previous one.
        if input.kind == MouseInputKind::Down && input.button == Some(MouseButton::Left) {
            if let Some(hit) = target {
                let wants = tree.node(hit).is_some_and(|node| {
                    node.behavior
                        .should_start_selection(&node.state, input.x, input.y)
                });
                if wants {
                    self.start_selection(tree, hit, Position::new(input.x, input.y));
                    return None;
                }
            }
            self.clear_selection(tree);
        }

        // A captured node receives everything but the release directly.
        if let Some(captured) = self.captured
            && input.kind != MouseInputKind::Up
        {
            let kind = match input.kind {
                MouseInputKind::Drag => MouseEventKind::Drag,
                MouseInputKind::Down => MouseEventKind::Down,
                _ => MouseEventKind::Move,
            };
            let ev = MouseEvent::from_input(&input, kind);
            self.deliver(tree, captured, ev);
            return None;
        }

        if input.kind == MouseInputKind::Up {
            self.pressed = None;
        }

        // Release with capture: drag-end and up to the captured node, drop
        // to whatever is under the pointer.
        if input.kind == MouseInputKind::Up
            && let Some(captured) = self.captured.take()
        {
            let ev = MouseEvent::from_input(&input, MouseEventKind::DragEnd);
            self.deliver(tree, captured, ev);
            let ev = MouseEvent::from_input(&input, MouseEventKind::Up);
            self.deliver(tree, captured, ev);
            if let Some(drop_target) = target {
                let mut drop = MouseEvent::from_input(&input, MouseEventKind::Drop);
                drop.source = Some(captured);
                self.bubble(tree, drop_target, drop);
            }
            return None;
        }

        let Some(target) = target else {
            return None;
        };

        let kind = match input.kind {
            MouseInputKind::Down => MouseEventKind::Down,
            MouseInputKind::Up => MouseEventKind::Up,
            MouseInputKind::Drag => MouseEventKind::Drag,
            MouseInputKind::Move => MouseEventKind::Move,
            MouseInputKind::Scroll => MouseEventKind::Scroll,
        };
        let ev = MouseEvent::from_input(&input, kind);
        self.bubble(tree, target, ev);
        None
    }

    /// Walk from `target` up the parent chain until a handler stops
    /// propagation.
    fn bubble(&mut self, tree: &mut Tree, target: NodeNum, mut ev: MouseEvent) {
        let mut chain = vec![target];
        chain.extend(tree.ancestors(target));
        for num in chain {
            let Some(node) = tree.node_mut(num) else {
                continue;
            };
            node.behavior.on_mouse_event(&mut node.state, &mut ev);
            if ev.propagation_stopped() {
                break;
            }
        }
    }

    /// Deliver to exactly one node, no bubbling (capture path).
    fn deliver(&mut self, tree: &mut Tree, target: NodeNum, mut ev: MouseEvent) {
        if let Some(node) = tree.node_mut(target) {
            node.behavior.on_mouse_event(&mut node.state, &mut ev);
        }
    }

    fn start_selection(&mut self, tree: &mut Tree, start_node: NodeNum, at: Position) {
        let mut sel = Selection::begin(at);
        let container = tree.parent(start_node).unwrap_or(start_node);
        sel.containers.push(container);
        self.selection = Some(sel);
        self.redistribute_selection(tree);
    }

    fn update_selection(&mut self, tree: &mut Tree, hit: Option<NodeNum>, at: Position) {
        let Some(sel) = self.selection.as_mut() else {
            return;
        };
        sel.focus = at;

        if let Some(hit) = hit {
            // The stack is innermost-first. If some entry already contains
            // the hit node, shrink back to it; otherwise grow outward until
            // one does.
            let containing = sel
                .containers
                .iter()
                .position(|&c| tree.is_ancestor(c, hit));
            match containing {
                Some(i) => sel.containers.truncate(i + 1),
                None => {
                    while let Some(&outer) = sel.containers.last() {
                        if tree.is_ancestor(outer, hit) {
                            break;
                        }
                        match tree.parent(outer) {
                            Some(p) => sel.containers.push(p),
                            None => break,
                        }
                    }
                }
            }
        }
        self.redistribute_selection(tree);
    }

    /// Clear any active selection, notifying participants.
    pub fn clear_selection(&mut self, tree: &mut Tree) {
        if let Some(mut sel) = self.selection.take() {
            sel.is_active = false;
            sel.is_selecting = false;
            let inactive = sel.as_inactive();
            let mut nums = tree.node_nums();
            nums.sort();
            for num in nums {
                let Some(node) = tree.node_mut(num) else {
                    continue;
                };
                if !node.state.selectable {
                    continue;
                }
                let _ = node
                    .behavior
                    .on_selection_changed(&mut node.state, &inactive);
            }
        }
    }

    /// Pass the current selection to every visible selectable: the real
    /// payload inside the scoping container, an inactive copy outside it.
    /// Nodes that report selected content are collected on the selection.
    fn redistribute_selection(&mut self, tree: &mut Tree) {
        let Some(mut sel) = self.selection.take() else {
            return;
        };
        sel.selected.clear();
        let container = sel.current_container();
        let inactive = sel.as_inactive();
        let mut nums = tree.node_nums();
        nums.sort();
        for num in nums {
            if !tree.is_effectively_visible(num) {
                continue;
            }
            let in_scope = container.is_some_and(|c| tree.is_ancestor(c, num));
            let Some(node) = tree.node_mut(num) else {
                continue;
            };
            if !node.state.selectable {
                continue;
            }
            let payload = if in_scope { &sel } else { &inactive };
            let has = node
                .behavior
                .on_selection_changed(&mut node.state, payload);
            if has && in_scope {
                sel.selected.push(num);
            }
        }
        self.selection = Some(sel);
    }
}
