#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

//! End-to-end scenarios driven headlessly against the test backend.

use std::cell::RefCell;
use std::rc::Rc;

use weft_core::engine::Engine;
use weft_core::events::{MouseEvent, ParsedKey};
use weft_core::layout::{Dimension, Edges, FlexDirection, NodeStyle, Overflow, PositionKind};
use weft_core::node::{NodeOptions, NodeState};
use weft_core::renderable::Renderable;
use weft_core::segment::WidthMethod;
use weft_core::style::Attributes;
use weft_core::terminal::{ColorSupport, TestBackend};
use weft_core::{
    Cell, CellBuffer, Compositor, ControlState, EngineConfig, Renderer, Rgba, TextElement,
};

fn sized(w: u16, h: u16) -> NodeStyle {
    NodeStyle {
        width: Dimension::Cells(w),
        height: Dimension::Cells(h),
        ..NodeStyle::default()
    }
}

fn engine(w: u16, h: u16) -> Engine<TestBackend> {
    Engine::new(TestBackend::new(w, h), EngineConfig::default()).unwrap()
}

/// S1 — a one-cell change between frames emits one cursor move and one
/// grapheme, nothing else.
#[test]
fn s1_minimal_diff() {
    let red = Rgba::rgb(1.0, 0.0, 0.0);
    let mut comp = Compositor::new(
        4,
        2,
        Rgba::BLACK,
        WidthMethod::WcWidth,
        Renderer::new(ColorSupport::TrueColor, false),
    );
    let mut term = TestBackend::new(4, 2);

    let buf = comp.begin_frame();
    buf.draw_text("AB", 0, 0, red, Some(Rgba::BLACK), Attributes::empty());
    comp.end_frame(&mut term).unwrap();
    term.clear_output();

    let buf = comp.begin_frame();
    buf.draw_text("AX", 0, 0, red, Some(Rgba::BLACK), Attributes::empty());
    comp.end_frame(&mut term).unwrap();

    let out = term.output_string();
    assert!(out.contains("\x1b[1;2H"), "cursor moves to (1,0): {out:?}");
    assert!(out.contains('X'));
    // No other grapheme bytes.
    assert!(!out.contains('A'));
    assert!(!out.contains('B'));
}

/// S2 — a row container with two grow children splits the width evenly.
#[test]
fn s2_flexbox_row() {
    let mut e = engine(10, 3);
    let root = e.root();
    e.tree_mut()
        .set_style(root, |s| s.flex_direction = FlexDirection::Row)
        .unwrap();
    let child = |e: &mut Engine<TestBackend>, id: &str| {
        let num = e
            .tree_mut()
            .create_node(
                NodeOptions {
                    id: id.into(),
                    style: NodeStyle {
                        flex_grow: 1.0,
                        ..NodeStyle::default()
                    },
                    visible: true,
                    ..NodeOptions::default()
                },
                Box::new(weft_core::Blank),
            )
            .unwrap();
        e.tree_mut().add(root, num, None).unwrap();
        num
    };
    let a = child(&mut e, "a");
    let b = child(&mut e, "b");

    e.step_frame().unwrap();

    let ra = e.tree().state(a).unwrap().rect();
    let rb = e.tree().state(b).unwrap().rect();
    assert_eq!((ra.x(), ra.y(), ra.width(), ra.height()), (0, 0, 5, 3));
    assert_eq!((rb.x(), rb.y(), rb.width(), rb.height()), (5, 0, 5, 3));
}

/// S3 — overflow:hidden clips a child's drawing to the parent box.
#[test]
fn s3_scissor_clip() {
    let mut e = engine(10, 2);
    let root = e.root();
    let clip = e
        .tree_mut()
        .create_node(
            NodeOptions {
                id: "clip".into(),
                style: NodeStyle {
                    overflow: Overflow::Hidden,
                    ..sized(6, 2)
                },
                visible: true,
                ..NodeOptions::default()
            },
            Box::new(weft_core::Blank),
        )
        .unwrap();
    let text = e
        .tree_mut()
        .create_node(
            NodeOptions {
                id: "text".into(),
                style: sized(10, 1),
                visible: true,
                ..NodeOptions::default()
            },
            Box::new(TextElement::from_text("HELLOWORLD", WidthMethod::WcWidth)),
        )
        .unwrap();
    e.tree_mut().add(root, clip, None).unwrap();
    e.tree_mut().add(clip, text, None).unwrap();

    e.step_frame().unwrap();

    let buf = e.frame_buffer();
    let row: String = (0..10)
        .map(|x| buf.get(x, 0).map(|c| c.grapheme.clone()).unwrap_or_default())
        .collect();
    assert!(row.starts_with("HELLO"));
    for x in 6..10 {
        assert_eq!(buf.get(x, 0).map(|c| c.grapheme.as_str()), Some(" "));
    }
}

#[derive(Clone, Default)]
struct EventLog(Rc<RefCell<Vec<String>>>);

/// S4 — a left drag captures the pressed node; release delivers drag-end
/// and up to the captured node, drop to the node under the pointer.
#[test]
fn s4_mouse_capture_drag() {
    let log = EventLog::default();

    struct Rec {
        log: EventLog,
        name: &'static str,
    }
    impl Renderable for Rec {
        fn on_mouse_event(&mut self, _state: &mut NodeState, event: &mut MouseEvent) {
            let source = event.source.map(|s| format!("+src{}", s.raw())).unwrap_or_default();
            self.log
                .0
                .borrow_mut()
                .push(format!("{}:{:?}{}", self.name, event.kind, source));
            event.stop_propagation();
        }
    }

    let mut e = engine(30, 30);
    let root = e.root();
    let abs = |x: u16, y: u16, w: u16, h: u16| NodeStyle {
        position: PositionKind::Absolute,
        inset: Edges {
            top: Dimension::Cells(y),
            left: Dimension::Cells(x),
            right: Dimension::Auto,
            bottom: Dimension::Auto,
        },
        ..sized(w, h)
    };
    let n = e
        .tree_mut()
        .create_node(
            NodeOptions {
                id: "n".into(),
                style: abs(2, 2, 3, 3),
                visible: true,
                focusable: true,
                ..NodeOptions::default()
            },
            Box::new(Rec {
                log: log.clone(),
                name: "n",
            }),
        )
        .unwrap();
    let under = e
        .tree_mut()
        .create_node(
            NodeOptions {
                id: "under".into(),
                style: abs(18, 18, 6, 6),
                visible: true,
                ..NodeOptions::default()
            },
            Box::new(Rec {
                log: log.clone(),
                name: "under",
            }),
        )
        .unwrap();
    e.tree_mut().add(root, n, None).unwrap();
    e.tree_mut().add(root, under, None).unwrap();
    e.step_frame().unwrap();

    // down at (3,3), drag to (20,20), up at (20,20) — SGR is 1-based.
    e.feed_input(b"\x1b[<0;4;4M");
    e.feed_input(b"\x1b[<32;21;21M");
    e.feed_input(b"\x1b[<0;21;21m");

    let events = std::mem::take(&mut *log.0.borrow_mut());
    let n_raw = n.raw();
    assert_eq!(
        events,
        vec![
            "n:Down".to_string(),
            format!("under:Over+src{n_raw}"),
            "n:Drag".to_string(),
            "n:DragEnd".to_string(),
            "n:Up".to_string(),
            format!("under:Drop+src{n_raw}"),
        ]
    );
}

/// S5 — a selection drag across two sibling text nodes scopes to their
/// shared container and reports both as selected.
#[test]
fn s5_selection_across_containers() {
    let mut e = engine(10, 2);
    let root = e.root();
    let c = e
        .tree_mut()
        .create_node(
            NodeOptions {
                id: "c".into(),
                style: sized(10, 2),
                visible: true,
                ..NodeOptions::default()
            },
            Box::new(weft_core::Blank),
        )
        .unwrap();
    let text_node = |e: &mut Engine<TestBackend>, id: &str, content: &str| {
        e.tree_mut()
            .create_node(
                NodeOptions {
                    id: id.into(),
                    style: sized(10, 1),
                    visible: true,
                    selectable: true,
                    ..NodeOptions::default()
                },
                Box::new(TextElement::from_text(content, WidthMethod::WcWidth)),
            )
            .unwrap()
    };
    let a = text_node(&mut e, "a", "0123456789");
    let b = text_node(&mut e, "b", "abcdefghij");
    e.tree_mut().add(root, c, None).unwrap();
    e.tree_mut().add(c, a, None).unwrap();
    e.tree_mut().add(c, b, None).unwrap();
    e.step_frame().unwrap();

    // Drag from (2,0) to (5,1), then release.
    e.feed_input(b"\x1b[<0;3;1M");
    e.feed_input(b"\x1b[<32;6;2M");
    e.feed_input(b"\x1b[<0;6;2m");

    let sel = e.take_selection_event().expect("selection event");
    assert!(!sel.is_selecting);
    assert!(sel.is_active);
    let (start, end) = sel.normalized();
    assert_eq!((start.x, start.y), (2, 0));
    assert_eq!((end.x, end.y), (5, 1));
    assert!(sel.containers.contains(&c));
    assert_eq!(sel.selected, vec![a, b]);

    assert_eq!(e.tree().selected_text(a).as_deref(), Some("23456789"));
    assert_eq!(e.tree().selected_text(b).as_deref(), Some("abcde"));
    assert_eq!(
        e.tree().collect_selected_text(&sel.selected),
        "23456789\nabcde"
    );
}

/// S6 — the live refcount follows visibility and drives the scheduler's
/// auto start/stop edges.
#[test]
fn s6_live_refcount() {
    let mut e = engine(10, 3);
    let root = e.root();
    let x = e
        .tree_mut()
        .create_node(
            NodeOptions {
                id: "x".into(),
                style: sized(5, 1),
                visible: true,
                live: true,
                ..NodeOptions::default()
            },
            Box::new(weft_core::Blank),
        )
        .unwrap();
    e.tree_mut().add(root, x, None).unwrap();
    e.update_live_state();

    assert_eq!(e.tree().live_count(root), 1);
    assert_eq!(e.scheduler().state(), ControlState::AutoStarted);

    e.tree_mut().set_visible(x, false).unwrap();
    e.update_live_state();
    assert_eq!(e.tree().live_count(root), 0);
    assert_eq!(e.scheduler().state(), ControlState::Idle);

    e.tree_mut().set_visible(x, true).unwrap();
    e.update_live_state();
    assert_eq!(e.tree().live_count(root), 1);
    assert_eq!(e.scheduler().state(), ControlState::AutoStarted);
}

/// Buffered subtrees keep compositing through their private buffer.
#[test]
fn buffered_node_end_to_end() {
    let mut e = engine(8, 2);
    let root = e.root();
    let boxed = e
        .tree_mut()
        .create_node(
            NodeOptions {
                id: "boxed".into(),
                style: sized(4, 1),
                visible: true,
                buffered: true,
                ..NodeOptions::default()
            },
            Box::new(TextElement::from_text("cach", WidthMethod::WcWidth)),
        )
        .unwrap();
    e.tree_mut().add(root, boxed, None).unwrap();
    e.step_frame().unwrap();
    assert!(e.terminal().output_string().contains("cach"));
}

/// Wide graphemes occupy two cells and survive the diff round trip.
#[test]
fn wide_grapheme_rendering() {
    let mut e = engine(8, 1);
    let root = e.root();
    let text = e
        .tree_mut()
        .create_node(
            NodeOptions {
                id: "t".into(),
                style: sized(8, 1),
                visible: true,
                ..NodeOptions::default()
            },
            Box::new(TextElement::from_text("a\u{4e16}b", WidthMethod::WcWidth)),
        )
        .unwrap();
    e.tree_mut().add(root, text, None).unwrap();
    e.step_frame().unwrap();

    let buf = e.frame_buffer();
    assert_eq!(buf.get(0, 0).map(|c| c.grapheme.as_str()), Some("a"));
    assert_eq!(buf.get(1, 0).map(|c| c.grapheme.as_str()), Some("\u{4e16}"));
    assert!(buf.get(2, 0).map(Cell::is_continuation).unwrap_or(false));
    assert_eq!(buf.get(3, 0).map(|c| c.grapheme.as_str()), Some("b"));
}

/// Keyboard events land on the focused node only.
#[test]
fn key_routing_to_focused() {
    struct KeySink {
        seen: Rc<RefCell<Vec<ParsedKey>>>,
    }
    impl Renderable for KeySink {
        fn handle_key_press(&mut self, _state: &mut NodeState, key: &ParsedKey) -> bool {
            self.seen.borrow_mut().push(key.clone());
            true
        }
    }

    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut e = engine(10, 2);
    let root = e.root();
    let field = e
        .tree_mut()
        .create_node(
            NodeOptions {
                id: "field".into(),
                style: sized(10, 1),
                visible: true,
                focusable: true,
                ..NodeOptions::default()
            },
            Box::new(KeySink { seen: seen.clone() }),
        )
        .unwrap();
    e.tree_mut().add(root, field, None).unwrap();

    // No focus: keystrokes go nowhere.
    e.feed_input(b"x");
    assert!(seen.borrow().is_empty());

    e.focus(field);
    e.feed_input(b"x\x1b[A");
    let got = seen.borrow();
    assert_eq!(got.len(), 2);
    assert_eq!(got[0].code, weft_core::KeyCode::Char('x'));
    assert_eq!(got[1].code, weft_core::KeyCode::Up);
}

#[test]
fn cell_buffer_standalone_round_trip() {
    let mut buf = CellBuffer::new(4, 1, Rgba::BLACK, WidthMethod::WcWidth);
    buf.draw_text("test", 0, 0, Rgba::WHITE, None, Attributes::empty());
    let row: String = (0..4)
        .map(|x| buf.get(x, 0).map(|c| c.grapheme.clone()).unwrap_or_default())
        .collect();
    assert_eq!(row, "test");
}
