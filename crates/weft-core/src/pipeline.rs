//! The per-frame render pipeline.
//!
//! A frame runs in passes: lifecycle hooks, a single layout solve when
//! dirty, a pre-order z-ordered walk that refreshes computed geometry and
//! builds the render list, and a draw pass that executes the list into the
//! frame buffer while filling the hit grid.

use std::time::Duration;

use crate::buffer::CellBuffer;
use crate::color::Rgba;
use crate::error::Result;
use crate::geometry::Rect;
use crate::hit_grid::HitGrid;
use crate::layout::Overflow;
use crate::node::NodeNum;
use crate::tree::Tree;

/// One entry of the frame's render list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderCommand {
    /// Draw a node (its `render_self`, then its hit-grid footprint).
    Draw(NodeNum),
    /// Push a scissor rectangle before walking a clipping node's children.
    PushScissor(Rect),
    /// Pop the matching scissor rectangle.
    PopScissor,
}

/// Pass 0: lifecycle hooks, in creation order, for nodes that opted in.
pub fn lifecycle_pass(tree: &mut Tree) {
    let mut nums = tree.node_nums();
    nums.sort();
    for num in nums {
        if let Some(node) = tree.node_mut(num)
            && node.behavior.wants_lifecycle_pass()
        {
            node.behavior.on_lifecycle_pass(&mut node.state);
        }
    }
}

/// Pass 2: walk the tree pre-order (z-order at each level), refresh each
/// visible node's computed geometry, and build the render list.
///
/// Pass 1 (the layout solve) must have run first; see [`Tree::solve_layout`].
pub fn build_render_list(tree: &mut Tree, dt: Duration) -> Result<Vec<RenderCommand>> {
    let mut out = Vec::new();
    let root = tree.root();
    walk(tree, root, (0, 0), dt, &mut out)?;
    Ok(out)
}

fn walk(
    tree: &mut Tree,
    num: NodeNum,
    parent_origin: (i32, i32),
    dt: Duration,
    out: &mut Vec<RenderCommand>,
) -> Result<()> {
    {
        let Some(node) = tree.node_mut(num) else {
            return Ok(());
        };
        if !node.state.visible {
            return Ok(());
        }
        node.behavior.on_update(&mut node.state, dt);
    }

    let cbox = tree.layout.computed_box(num)?;

    let (abs_x, abs_y, size_changed, overflow, w, h) = {
        let Some(node) = tree.node_mut(num) else {
            return Ok(());
        };
        let (tx, ty) = node.state.translate;
        let abs_x = parent_origin.0 + cbox.x + tx;
        let abs_y = parent_origin.1 + cbox.y + ty;
        let old = node.state.rect;
        let size_changed = old.width() != cbox.width || old.height() != cbox.height;
        node.state.abs_x = abs_x;
        node.state.abs_y = abs_y;
        node.state.rect = Rect::from_signed(abs_x, abs_y, cbox.width, cbox.height)
            .unwrap_or(Rect::new(0, 0, 0, 0));
        (
            abs_x,
            abs_y,
            size_changed,
            node.state.style.overflow,
            cbox.width,
            cbox.height,
        )
    };

    if size_changed {
        resize_node(tree, num, w, h);
    }

    out.push(RenderCommand::Draw(num));

    let children = tree.z_children(num);
    let clips = overflow != Overflow::Visible && w > 0 && h > 0;
    if clips {
        let clip = Rect::from_signed(abs_x, abs_y, w, h).unwrap_or(Rect::new(0, 0, 0, 0));
        out.push(RenderCommand::PushScissor(clip));
        for child in children {
            walk(tree, child, (abs_x, abs_y), dt, out)?;
        }
        out.push(RenderCommand::PopScissor);
    } else {
        for child in children {
            walk(tree, child, (abs_x, abs_y), dt, out)?;
        }
    }
    Ok(())
}

fn resize_node(tree: &mut Tree, num: NodeNum, width: u16, height: u16) {
    let Some(node) = tree.node_mut(num) else {
        return;
    };
    // An owned framebuffer follows the node's size; creation is lazy in the
    // draw pass, which knows the width method in effect.
    if let Some(frame) = node.state.frame.as_mut() {
        frame.resize(width, height);
    }
    node.state.dirty = true;
    node.behavior.on_layout_resize(&mut node.state, width, height);
}

/// Pass 3: execute the render list into `buf`, filling `hits` with each
/// node's clipped footprint (last writer wins). The captured node, if any,
/// is skipped during hit-grid fill so it only receives events through the
/// capture path.
pub fn execute_render_list(
    tree: &mut Tree,
    list: &[RenderCommand],
    buf: &mut CellBuffer,
    mut hits: Option<&mut HitGrid>,
    dt: Duration,
    captured: Option<NodeNum>,
) {
    for cmd in list {
        match cmd {
            RenderCommand::PushScissor(rect) => {
                buf.push_scissor_rect(
                    i32::from(rect.x()),
                    i32::from(rect.y()),
                    rect.width(),
                    rect.height(),
                );
            }
            RenderCommand::PopScissor => buf.pop_scissor_rect(),
            RenderCommand::Draw(num) => {
                draw_node(tree, *num, buf, dt);
                if let Some(hits) = hits.as_deref_mut()
                    && captured != Some(*num)
                    && let Some(node) = tree.node(*num)
                {
                    let footprint = node.state.rect;
                    if let Some(clipped) = buf.clip().intersection(&footprint) {
                        hits.fill_rect(clipped, *num);
                    }
                }
            }
        }
    }
}

fn draw_node(tree: &mut Tree, num: NodeNum, buf: &mut CellBuffer, dt: Duration) {
    let Some(node) = tree.node_mut(num) else {
        return;
    };
    if node.state.buffered {
        // Cached subtree: re-render the private buffer only when dirty,
        // then blit it in at the node's origin.
        if node.state.frame.is_none() {
            let rect = node.state.rect;
            let mut frame = CellBuffer::new(
                rect.width(),
                rect.height(),
                Rgba::TRANSPARENT,
                buf.width_method(),
            );
            frame.set_respect_alpha(true);
            node.state.frame = Some(frame);
            node.state.dirty = true;
        }
        if node.state.dirty
            && let Some(mut frame) = node.state.frame.take()
        {
            frame.clear(Rgba::TRANSPARENT);
            node.behavior.render_self(&node.state, &mut frame, dt);
            node.state.frame = Some(frame);
        }
        let (x, y) = (node.state.abs_x, node.state.abs_y);
        if let Some(frame) = node.state.frame.as_ref() {
            buf.draw_frame_buffer(x, y, frame);
        }
    } else {
        node.behavior.render_self(&node.state, buf, dt);
    }
    node.state.dirty = false;
}
