#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

//! Property tests for the engine's universal invariants.

use std::time::Duration;

use proptest::prelude::*;

use weft_core::layout::{Dimension, NodeStyle, Overflow};
use weft_core::node::{NodeNum, NodeOptions};
use weft_core::pipeline::{self, RenderCommand};
use weft_core::renderable::Blank;
use weft_core::segment::{self, WidthMethod};
use weft_core::style::Attributes;
use weft_core::terminal::ColorSupport;
use weft_core::{Cell, CellBuffer, HitGrid, Rect, Renderer, Rgba, Tree};

fn new_tree() -> Tree {
    Tree::new(
        NodeOptions {
            id: "root".into(),
            style: NodeStyle {
                width: Dimension::Cells(40),
                height: Dimension::Cells(20),
                ..NodeStyle::default()
            },
            visible: true,
            ..NodeOptions::default()
        },
        Box::new(Blank),
    )
    .unwrap()
}

/// Tree mutations used by the structural properties.
#[derive(Clone, Debug)]
enum TreeOp {
    Add { parent: usize, index: usize },
    Remove { node: usize },
    InsertBefore { parent: usize, anchor: usize },
    SetLive { node: usize, live: bool },
    SetVisible { node: usize, visible: bool },
    Destroy { node: usize },
}

fn tree_op() -> impl Strategy<Value = TreeOp> {
    prop_oneof![
        (0..8usize, 0..8usize).prop_map(|(parent, index)| TreeOp::Add { parent, index }),
        (0..8usize).prop_map(|node| TreeOp::Remove { node }),
        (0..8usize, 0..8usize).prop_map(|(parent, anchor)| TreeOp::InsertBefore { parent, anchor }),
        (0..8usize, any::<bool>()).prop_map(|(node, live)| TreeOp::SetLive { node, live }),
        (0..8usize, any::<bool>()).prop_map(|(node, visible)| TreeOp::SetVisible { node, visible }),
        (0..8usize).prop_map(|node| TreeOp::Destroy { node }),
    ]
}

/// Apply an op stream to a tree over a fixed pool of created nodes.
fn apply_ops(tree: &mut Tree, ops: &[TreeOp]) -> Vec<NodeNum> {
    let root = tree.root();
    let mut pool = vec![root];
    for i in 0..7 {
        let num = tree
            .create_node(NodeOptions::with_id(format!("n{i}")), Box::new(Blank))
            .unwrap();
        pool.push(num);
    }
    for op in ops {
        match *op {
            TreeOp::Add { parent, index } => {
                let p = pool[parent % pool.len()];
                let c = pool[(parent + 1) % pool.len()];
                if tree.contains(p) && tree.contains(c) {
                    let _ = tree.add(p, c, Some(index));
                }
            }
            TreeOp::Remove { node } => {
                let n = pool[node % pool.len()];
                if let Some(parent) = tree.parent(n) {
                    let id = tree.state(n).map(|s| s.id.clone()).unwrap_or_default();
                    let _ = tree.remove(parent, &id);
                }
            }
            TreeOp::InsertBefore { parent, anchor } => {
                let p = pool[parent % pool.len()];
                let a = pool[anchor % pool.len()];
                let c = pool[(anchor + 2) % pool.len()];
                if tree.contains(p) && tree.contains(a) && tree.contains(c) {
                    let _ = tree.insert_before(p, c, a);
                }
            }
            TreeOp::SetLive { node, live } => {
                let n = pool[node % pool.len()];
                if tree.contains(n) {
                    let _ = tree.set_live(n, live);
                }
            }
            TreeOp::SetVisible { node, visible } => {
                let n = pool[node % pool.len()];
                if tree.contains(n) && n != root {
                    let _ = tree.set_visible(n, visible);
                }
            }
            TreeOp::Destroy { node } => {
                let n = pool[node % pool.len()];
                if n != root {
                    tree.destroy(n);
                }
            }
        }
    }
    pool
}

/// Brute-force live count: live and visible along the whole path.
fn expected_live(tree: &Tree, num: NodeNum) -> u32 {
    if !tree.state(num).map(|s| s.visible).unwrap_or(false) {
        return 0;
    }
    let own = u32::from(tree.state(num).map(|s| s.live).unwrap_or(false));
    own + tree
        .children(num)
        .to_vec()
        .into_iter()
        .map(|c| expected_live(tree, c))
        .sum::<u32>()
}

proptest! {
    /// Invariant 1: the tree's layout-order child lists and the solver's
    /// child lists agree after any mutation sequence.
    #[test]
    fn layout_child_lists_agree(ops in prop::collection::vec(tree_op(), 0..40)) {
        let mut tree = new_tree();
        let pool = apply_ops(&mut tree, &ops);
        for num in pool {
            if !tree.contains(num) {
                continue;
            }
            let tree_children = tree.children(num).to_vec();
            let solver_children = tree.solver_children(num).unwrap();
            prop_assert_eq!(tree_children, solver_children);
        }
    }

    /// Invariant 3: every node's live count equals the brute-force count
    /// of live nodes visible on their path.
    #[test]
    fn live_counts_match_brute_force(ops in prop::collection::vec(tree_op(), 0..40)) {
        let mut tree = new_tree();
        let pool = apply_ops(&mut tree, &ops);
        for num in pool {
            if !tree.contains(num) {
                continue;
            }
            prop_assert_eq!(tree.live_count(num), expected_live(&tree, num));
        }
    }

    /// Invariant 2: push/pop scissor commands balance in every render list
    /// and never go negative.
    #[test]
    fn scissors_balance(ops in prop::collection::vec(tree_op(), 0..40), clip_mask in any::<u8>()) {
        let mut tree = new_tree();
        let pool = apply_ops(&mut tree, &ops);
        for (i, num) in pool.iter().enumerate() {
            if i % 2 == usize::from(clip_mask % 2) && tree.contains(*num) {
                let _ = tree.set_style(*num, |s| {
                    s.overflow = Overflow::Hidden;
                    s.width = Dimension::Cells(10);
                    s.height = Dimension::Cells(5);
                });
            }
        }
        tree.solve_layout(40, 20).unwrap();
        let list = pipeline::build_render_list(&mut tree, Duration::ZERO).unwrap();
        let mut depth: i64 = 0;
        for cmd in &list {
            match cmd {
                RenderCommand::PushScissor(_) => depth += 1,
                RenderCommand::PopScissor => {
                    depth -= 1;
                    prop_assert!(depth >= 0);
                }
                RenderCommand::Draw(_) => {}
            }
        }
        prop_assert_eq!(depth, 0);

        // Executing the list leaves the buffer's stack empty too.
        let mut buf = CellBuffer::new(40, 20, Rgba::BLACK, WidthMethod::WcWidth);
        let mut hits = HitGrid::new(40, 20);
        pipeline::execute_render_list(&mut tree, &list, &mut buf, Some(&mut hits), Duration::ZERO, None);
        prop_assert_eq!(buf.scissor_depth(), 0);
    }
}

// --- Encode/decode round trip (invariant 5) ---

/// A minimal terminal interpreter: applies cursor moves, SGR color and
/// attribute codes, and graphemes to a cell buffer.
struct Vt {
    buf: CellBuffer,
    x: u16,
    y: u16,
    fg: Rgba,
    bg: Rgba,
    attrs: Attributes,
}

impl Vt {
    fn new(width: u16, height: u16, bg0: Rgba) -> Self {
        Self {
            buf: CellBuffer::new(width, height, bg0, WidthMethod::WcWidth),
            x: 0,
            y: 0,
            fg: Rgba::WHITE,
            bg: Rgba::BLACK,
            attrs: Attributes::empty(),
        }
    }

    fn run(&mut self, bytes: &str) {
        let mut chars = bytes.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\x1b' {
                assert_eq!(chars.next(), Some('['));
                let mut params = String::new();
                let mut final_byte = ' ';
                for c in chars.by_ref() {
                    if c.is_ascii_alphabetic() {
                        final_byte = c;
                        break;
                    }
                    params.push(c);
                }
                self.apply_csi(&params, final_byte);
            } else {
                let width = segment::grapheme_width(&c.to_string(), WidthMethod::WcWidth);
                self.buf.set_cell(
                    i32::from(self.x),
                    i32::from(self.y),
                    Cell::new(c.to_string(), width, self.fg, self.bg, self.attrs),
                );
                self.x += u16::from(width);
            }
        }
    }

    fn apply_csi(&mut self, params: &str, final_byte: char) {
        match final_byte {
            'H' => {
                let mut fields = params.split(';');
                let row: u16 = fields.next().unwrap_or("1").parse().unwrap_or(1);
                let col: u16 = fields.next().unwrap_or("1").parse().unwrap_or(1);
                self.y = row - 1;
                self.x = col - 1;
            }
            'h' | 'l' => {} // mode toggles (synchronized update)
            'm' => self.apply_sgr(params),
            other => panic!("unexpected CSI final {other:?}"),
        }
    }

    fn apply_sgr(&mut self, params: &str) {
        let fields: Vec<u8> = params
            .split(';')
            .map(|f| f.parse().unwrap_or(0))
            .collect();
        let mut i = 0;
        while i < fields.len() {
            match fields[i] {
                0 => {
                    self.fg = Rgba::WHITE;
                    self.bg = Rgba::BLACK;
                    self.attrs = Attributes::empty();
                }
                1 => self.attrs |= Attributes::BOLD,
                2 => self.attrs |= Attributes::DIM,
                3 => self.attrs |= Attributes::ITALIC,
                4 => self.attrs |= Attributes::UNDERLINE,
                5 => self.attrs |= Attributes::BLINK,
                7 => self.attrs |= Attributes::INVERSE,
                8 => self.attrs |= Attributes::HIDDEN,
                9 => self.attrs |= Attributes::STRIKETHROUGH,
                38 => {
                    assert_eq!(fields[i + 1], 2);
                    self.fg = Rgba::from_rgb8(fields[i + 2], fields[i + 3], fields[i + 4]);
                    i += 4;
                }
                48 => {
                    assert_eq!(fields[i + 1], 2);
                    self.bg = Rgba::from_rgb8(fields[i + 2], fields[i + 3], fields[i + 4]);
                    i += 4;
                }
                other => panic!("unexpected SGR code {other}"),
            }
            i += 1;
        }
    }
}

/// Strategy: a buffer of random opaque-colored cells, including wide
/// graphemes, drawn at random positions.
fn cell_writes() -> impl Strategy<Value = Vec<(u16, u16, char, (u8, u8, u8), (u8, u8, u8), u8)>> {
    let glyph = prop_oneof![
        prop::char::range('a', 'z'),
        prop::char::range('A', 'Z'),
        prop::char::range('\u{4e00}', '\u{4e2f}'), // CJK, width 2
    ];
    let channel = prop_oneof![Just(0u8), Just(64), Just(128), Just(255)];
    let color = (channel.clone(), channel.clone(), channel);
    prop::collection::vec(
        (0..12u16, 0..4u16, glyph, color.clone(), color, 0..=255u8),
        0..40,
    )
}

proptest! {
    /// Invariant 5: serializing a buffer and replaying the bytes into a
    /// fresh buffer reproduces the cell grid exactly.
    #[test]
    fn encode_decode_round_trip(writes in cell_writes()) {
        let bg0 = Rgba::BLACK;
        let mut source = CellBuffer::new(12, 4, bg0, WidthMethod::WcWidth);
        for (x, y, glyph, fg, bg, attr_bits) in writes {
            let text = glyph.to_string();
            let width = segment::grapheme_width(&text, WidthMethod::WcWidth);
            let cell = Cell::new(
                text,
                width,
                Rgba::from_rgb8(fg.0, fg.1, fg.2),
                Rgba::from_rgb8(bg.0, bg.1, bg.2),
                Attributes::from_bits_truncate(attr_bits),
            );
            source.set_cell(i32::from(x), i32::from(y), cell);
        }

        let renderer = Renderer::new(ColorSupport::TrueColor, false);
        let bytes = renderer.render(&source.full_diff());

        let mut vt = Vt::new(12, 4, bg0);
        vt.run(&bytes);

        for y in 0..4u16 {
            for x in 0..12u16 {
                let want = source.get(x, y).unwrap();
                let got = vt.buf.get(x, y).unwrap();
                prop_assert_eq!(
                    (&want.grapheme, want.width, want.attrs),
                    (&got.grapheme, got.width, got.attrs),
                    "cell ({}, {})", x, y
                );
                prop_assert_eq!(want.fg.to_rgb8(), got.fg.to_rgb8(), "fg ({}, {})", x, y);
                prop_assert_eq!(want.bg.to_rgb8(), got.bg.to_rgb8(), "bg ({}, {})", x, y);
            }
        }
    }
}

// --- Plain invariant checks (6 and 7) ---

#[test]
fn destroy_twice_is_noop() {
    let mut tree = new_tree();
    let root = tree.root();
    let child = tree
        .create_node(NodeOptions::with_id("c"), Box::new(Blank))
        .unwrap();
    tree.add(root, child, None).unwrap();
    tree.destroy(child);
    let len = tree.len();
    tree.destroy(child);
    assert_eq!(tree.len(), len);
}

#[test]
fn hit_test_is_inside_last_drawn_rect() {
    let mut hits = HitGrid::new(20, 10);
    let rects = [
        (Rect::new(0, 0, 20, 10), NodeNum::from_raw(1)),
        (Rect::new(2, 2, 6, 3), NodeNum::from_raw(2)),
        (Rect::new(4, 3, 8, 4), NodeNum::from_raw(3)),
    ];
    for (rect, num) in rects {
        hits.fill_rect(rect, num);
    }
    for y in 0..10 {
        for x in 0..20 {
            let hit = hits.hit_test(x, y).unwrap();
            // The hit node's rect contains the point, and no later-drawn
            // rect covers it.
            let idx = rects.iter().position(|(_, n)| *n == hit).unwrap();
            assert!(rects[idx].0.contains(weft_core::Position::new(x, y)));
            for (later_rect, _) in rects.iter().skip(idx + 1) {
                assert!(!later_rect.contains(weft_core::Position::new(x, y)));
            }
        }
    }
}
