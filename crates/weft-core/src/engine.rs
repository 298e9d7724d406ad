//! The engine: one object owning the tree, scheduler, input pipeline,
//! compositor, and terminal, driven by a cooperative single-threaded loop.

use std::io::Read;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crate::ansi;
use crate::compositor::Compositor;
use crate::context::{EngineConfig, EngineContext};
use crate::error::{Result, WeftError};
use crate::events::{InputEvent, MouseInput};
use crate::geometry::Size;
use crate::hit_grid::HitGrid;
use crate::input::InputParser;
use crate::layout::{Dimension, NodeStyle};
use crate::node::{NodeNum, NodeOptions};
use crate::pipeline;
use crate::renderable::{Blank, Renderable};
use crate::renderer::Renderer;
use crate::routing::EventRouter;
use crate::scheduler::{ControlState, FrameScheduler};
use crate::selection::Selection;
use crate::terminal::{CrosstermBackend, MouseMode, Terminal};
use crate::tree::Tree;

/// How long to wait for the rest of an escape sequence before flushing.
const ESC_FLUSH_TIMEOUT: Duration = Duration::from_millis(10);
/// Poll interval while fully idle (waiting on input only).
const IDLE_POLL: Duration = Duration::from_millis(50);

/// Raw input bytes delivered to the engine loop.
///
/// Reading stdin blocks, so a dedicated reader thread forwards byte
/// bursts over a channel; parsing and dispatch stay on the engine task.
pub struct InputSource {
    rx: mpsc::Receiver<Vec<u8>>,
}

impl InputSource {
    /// Spawn a reader thread over process stdin.
    pub fn stdin() -> Self {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let mut stdin = std::io::stdin();
            let mut buf = [0u8; 4096];
            loop {
                match stdin.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(err) if err.kind() == std::io::ErrorKind::Interrupted => {}
                    Err(_) => break,
                }
            }
        });
        Self { rx }
    }

    /// Build a source from an existing channel (tests, embedders).
    pub fn from_receiver(rx: mpsc::Receiver<Vec<u8>>) -> Self {
        Self { rx }
    }

    fn recv_timeout(&self, timeout: Duration) -> Option<Vec<u8>> {
        self.rx.recv_timeout(timeout).ok()
    }
}

/// The terminal UI engine.
pub struct Engine<T: Terminal = CrosstermBackend> {
    tree: Tree,
    scheduler: FrameScheduler,
    router: EventRouter,
    parser: InputParser,
    compositor: Compositor,
    hits: HitGrid,
    terminal: T,
    ctx: EngineContext,
    render_size: Size,
    terminal_size: Size,
    was_live: bool,
    pending_resize: Option<(Size, Instant)>,
    last_selection: Option<Selection>,
}

impl<T: Terminal> Engine<T> {
    /// Create an engine over the given terminal with a blank root node.
    pub fn new(terminal: T, config: EngineConfig) -> Result<Self> {
        Self::with_root(terminal, config, Box::new(Blank))
    }

    /// Create an engine whose root uses a custom behavior.
    pub fn with_root(
        terminal: T,
        config: EngineConfig,
        root_behavior: Box<dyn Renderable>,
    ) -> Result<Self> {
        let terminal_size = terminal.size()?;
        let capabilities = terminal.capabilities().clone();
        let ctx = EngineContext::new(config, capabilities);

        let (render_size, row_offset) = layout_region(terminal_size, ctx.config.split_height);

        let tree = Tree::new(
            NodeOptions {
                id: "root".into(),
                style: root_style(render_size),
                visible: true,
                ..NodeOptions::default()
            },
            root_behavior,
        )?;

        let renderer = Renderer::new(
            ctx.capabilities.color,
            ctx.capabilities.synchronized_output,
        );
        let mut compositor = Compositor::new(
            render_size.width,
            render_size.height,
            ctx.config.background,
            ctx.config.width_method,
            renderer,
        );
        compositor.set_row_offset(row_offset);

        Ok(Self {
            tree,
            scheduler: FrameScheduler::new(ctx.config.target_fps),
            router: EventRouter::new(),
            parser: InputParser::new(),
            compositor,
            hits: HitGrid::new(render_size.width, render_size.height),
            terminal,
            ctx,
            render_size,
            terminal_size,
            was_live: false,
            pending_resize: None,
            last_selection: None,
        })
    }

    /// The renderable tree.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// The renderable tree, mutable.
    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    /// The root node.
    pub fn root(&self) -> NodeNum {
        self.tree.root()
    }

    /// The frame scheduler.
    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    /// The frame scheduler, mutable (start/pause/stop, callbacks).
    pub fn scheduler_mut(&mut self) -> &mut FrameScheduler {
        &mut self.scheduler
    }

    /// The event router (focus, capture, selection state).
    pub fn router(&self) -> &EventRouter {
        &self.router
    }

    /// Move keyboard focus to a node.
    pub fn focus(&mut self, num: NodeNum) {
        self.router.focus(&mut self.tree, num);
    }

    /// The runtime context (config, capabilities, console, pixel size).
    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    /// The attached terminal.
    pub fn terminal(&self) -> &T {
        &self.terminal
    }

    /// The attached terminal, mutable.
    pub fn terminal_mut(&mut self) -> &mut T {
        &mut self.terminal
    }

    /// The hit grid of the last drawn frame.
    pub fn hit_grid(&self) -> &HitGrid {
        &self.hits
    }

    /// The cell buffer composed by the last frame.
    pub fn frame_buffer(&self) -> &crate::buffer::CellBuffer {
        self.compositor.buffer()
    }

    /// The render area size (differs from the terminal size in split mode).
    pub fn render_size(&self) -> Size {
        self.render_size
    }

    /// Destroy a subtree and drop any router references to it.
    pub fn destroy_node(&mut self, num: NodeNum) {
        self.router.forget(num);
        self.tree.destroy(num);
    }

    /// Take the selection finalized by the most recent mouse release.
    pub fn take_selection_event(&mut self) -> Option<Selection> {
        self.last_selection.take()
    }

    /// Prepare the terminal: raw mode, screen buffer, reporting modes,
    /// and the pixel-size query.
    pub fn setup(&mut self) -> Result<()> {
        self.terminal.enter_raw_mode()?;
        if self.ctx.config.split_height.is_none() && self.ctx.config.use_alternate_screen {
            self.terminal.enter_alternate_screen()?;
        }
        let mut seq = String::from(ansi::CURSOR_HIDE);
        match self.ctx.config.mouse {
            MouseMode::Off => {}
            MouseMode::Buttons => seq.push_str(ansi::MOUSE_BUTTONS_ON),
            MouseMode::Motion => seq.push_str(ansi::MOUSE_MOTION_ON),
        }
        if self.ctx.config.bracketed_paste {
            seq.push_str(ansi::PASTE_ON);
        }
        if let Some(flags) = self.ctx.config.kitty_keyboard_flags {
            seq.push_str(&ansi::kitty_push(flags));
        }
        seq.push_str(ansi::PIXEL_SIZE_QUERY);
        if self.ctx.config.split_height.is_some() {
            // Reserve the bottom rows: push existing content into the
            // scrollback so the UI region starts clean.
            for _ in 0..self.render_size.height {
                seq.push_str("\r\n");
            }
        }
        self.terminal.write_raw(seq.as_bytes())?;
        self.terminal.flush()?;
        Ok(())
    }

    /// Restore the terminal: reporting modes off, cooked mode, screen
    /// buffer back. Safe to call more than once.
    pub fn teardown(&mut self) {
        let mut seq = String::new();
        if self.ctx.config.mouse != MouseMode::Off {
            seq.push_str(ansi::MOUSE_OFF);
        }
        if self.ctx.config.kitty_keyboard_flags.is_some() {
            seq.push_str(ansi::KITTY_POP);
        }
        if self.ctx.config.bracketed_paste {
            seq.push_str(ansi::PASTE_OFF);
        }
        if self.ctx.config.split_height.is_some() {
            seq.push_str(ansi::SCROLL_REGION_RESET);
        }
        seq.push_str(ansi::CURSOR_SHOW);
        let _ = self.terminal.write_raw(seq.as_bytes());
        let _ = self.terminal.flush();
        let _ = self.terminal.leave_alternate_screen();
        let _ = self.terminal.exit_raw_mode();
    }

    /// Run the engine until it is stopped, reading input from stdin.
    pub fn run(&mut self) -> Result<()> {
        let input = InputSource::stdin();
        self.run_with_input(input)
    }

    /// Run the engine until it is stopped with an explicit input source.
    pub fn run_with_input(&mut self, input: InputSource) -> Result<()> {
        self.setup()?;
        self.scheduler.request_render();
        let result = self.run_loop(&input);
        self.teardown();
        if let Err(err) = &result {
            self.dump_console_tail(Some(err));
        }
        result
    }

    fn run_loop(&mut self, input: &InputSource) -> Result<()> {
        loop {
            if self.scheduler.state() == ControlState::ExplicitStopped {
                return Ok(());
            }
            let now = Instant::now();
            self.poll_resize(now);
            if self.tree.take_frame_request() {
                self.scheduler.request_render();
            }
            self.sync_live();

            let now = Instant::now();
            if self.scheduler.frame_due(now) {
                match self.render_frame(now) {
                    Ok(()) => {}
                    Err(err @ WeftError::Io(_)) => return Err(err),
                    Err(err) => {
                        // Contained to this frame: log and try again.
                        tracing::error!(%err, "frame failed; continuing");
                        self.tree.request_render(self.tree.root());
                    }
                }
                continue;
            }

            let mut timeout = match self.scheduler.next_deadline(now) {
                Some(deadline) => deadline.saturating_duration_since(now),
                None => IDLE_POLL,
            };
            if self.parser.has_pending() {
                timeout = timeout.min(ESC_FLUSH_TIMEOUT);
            }
            match input.recv_timeout(timeout.max(Duration::from_millis(1))) {
                Some(bytes) => self.feed_input(&bytes),
                None => {
                    if self.parser.has_pending() {
                        let events = self.parser.flush_pending();
                        self.dispatch_events(events);
                    }
                }
            }
        }
    }

    /// Feed raw input bytes through the parser and dispatch the events.
    pub fn feed_input(&mut self, bytes: &[u8]) {
        let events = self.parser.feed(bytes);
        self.dispatch_events(events);
    }

    /// Render one frame immediately (test and embedder hook).
    pub fn step_frame(&mut self) -> Result<()> {
        self.render_frame(Instant::now())
    }

    fn dispatch_events(&mut self, events: Vec<InputEvent>) {
        for event in events {
            match event {
                InputEvent::Key(key) => {
                    let _ = self.router.dispatch_key(&mut self.tree, &key);
                }
                InputEvent::Paste(text) => {
                    if let Some(focused) = self.router.focused()
                        && let Some(node) = self.tree.node_mut(focused)
                    {
                        let _ = node.behavior.handle_paste(&mut node.state, &text);
                    }
                }
                InputEvent::Mouse(input) => self.dispatch_mouse(input),
                InputEvent::PixelResolution { width, height } => {
                    self.ctx.pixel_size = Some((width, height));
                }
                InputEvent::FocusGained | InputEvent::FocusLost => {
                    tracing::trace!(?event, "terminal focus report");
                }
            }
        }
    }

    fn dispatch_mouse(&mut self, mut input: MouseInput) {
        // Split mode: the UI owns only the bottom rows.
        let offset = self.compositor.row_offset();
        if offset > 0 {
            if input.y < offset {
                return;
            }
            input.y -= offset;
        }
        if let Some(selection) = self.router.dispatch_mouse(&mut self.tree, &self.hits, input) {
            self.last_selection = Some(selection);
        }
    }

    fn render_frame(&mut self, now: Instant) -> Result<()> {
        let dt = self.scheduler.begin_frame(now)?;
        let result = self.render_frame_inner(dt);
        self.scheduler.end_frame(Instant::now());
        result
    }

    fn render_frame_inner(&mut self, dt: Duration) -> Result<()> {
        self.scheduler.run_frame_hooks(&mut self.tree, dt);

        pipeline::lifecycle_pass(&mut self.tree);
        self.tree
            .solve_layout(self.render_size.width, self.render_size.height)?;
        let list = pipeline::build_render_list(&mut self.tree, dt)?;

        if self.compositor.row_offset() > 0 {
            self.flush_console()?;
        }

        self.hits.clear();
        let captured = self.router.captured();
        let buf = self.compositor.begin_frame();
        pipeline::execute_render_list(&mut self.tree, &list, buf, Some(&mut self.hits), dt, captured);
        self.compositor.end_frame(&mut self.terminal)?;
        Ok(())
    }

    /// Write captured console lines into the scrollback region above a
    /// split-mode UI.
    fn flush_console(&mut self) -> Result<()> {
        if !self.ctx.console.has_pending() {
            return Ok(());
        }
        let lines = self.ctx.console.drain();
        let offset = self.compositor.row_offset();
        if offset == 0 {
            return Ok(());
        }
        let mut out = String::new();
        out.push_str(&ansi::scroll_region(0, offset - 1));
        out.push_str(&ansi::cursor_move(0, offset - 1));
        for line in &lines {
            out.push_str("\r\n");
            out.push_str(line);
        }
        out.push_str(ansi::SCROLL_REGION_RESET);
        self.terminal.write_raw(out.as_bytes())?;
        Ok(())
    }

    /// Print the most recent captured console lines to the restored
    /// terminal (after teardown), with the failure if there was one.
    pub fn dump_console_tail(&mut self, error: Option<&WeftError>) {
        let tail = self.ctx.console.tail(self.ctx.config.console_lines);
        let mut out = String::new();
        for line in &tail {
            out.push_str(line);
            out.push('\n');
        }
        if let Some(err) = error {
            out.push_str(&format!("error: {err}\n"));
        }
        if !out.is_empty() {
            let _ = self.terminal.write_raw(out.as_bytes());
            let _ = self.terminal.flush();
        }
    }

    /// Detect and debounce terminal resizes.
    pub fn poll_resize(&mut self, now: Instant) {
        let Ok(current) = self.terminal.size() else {
            return;
        };
        if current != self.terminal_size {
            self.terminal_size = current;
            self.pending_resize = Some((current, now));
        }
        let debounce = self.ctx.config.effective_resize_debounce();
        if let Some((size, at)) = self.pending_resize
            && now.saturating_duration_since(at) >= debounce
        {
            self.pending_resize = None;
            self.apply_resize(size);
        }
    }

    fn apply_resize(&mut self, terminal_size: Size) {
        let (render_size, row_offset) = layout_region(terminal_size, self.ctx.config.split_height);
        self.render_size = render_size;
        self.compositor.resize(render_size.width, render_size.height);
        self.compositor.set_row_offset(row_offset);
        self.hits.resize(render_size.width, render_size.height);
        self.parser.reset_mouse();
        let root = self.tree.root();
        if let Err(err) = self.tree.set_style(root, |style| {
            style.width = Dimension::Cells(render_size.width);
            style.height = Dimension::Cells(render_size.height);
        }) {
            tracing::error!(%err, "failed to resize root");
        }
        // Ask again for the pixel size; it changes with the cell grid.
        let _ = self.terminal.write_raw(ansi::PIXEL_SIZE_QUERY.as_bytes());
        self.tree.request_render(root);
    }

    /// Propagate the tree's live count edges to the scheduler.
    fn sync_live(&mut self) {
        let live = self.tree.live_count(self.tree.root()) > 0;
        if live != self.was_live {
            if live {
                self.scheduler.request_live();
            } else {
                self.scheduler.drop_live();
            }
            self.was_live = live;
        }
    }

    /// Re-evaluate live state immediately (tests and embedders).
    pub fn update_live_state(&mut self) {
        self.sync_live();
    }
}

fn root_style(size: Size) -> NodeStyle {
    NodeStyle {
        width: Dimension::Cells(size.width),
        height: Dimension::Cells(size.height),
        ..NodeStyle::default()
    }
}

fn layout_region(terminal: Size, split_height: Option<u16>) -> (Size, u16) {
    match split_height {
        Some(split) => {
            let height = split.min(terminal.height).max(1);
            (
                Size::new(terminal.width, height),
                terminal.height - height,
            )
        }
        None => (terminal, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;
    use crate::segment::WidthMethod;
    use crate::terminal::TestBackend;

    fn engine(width: u16, height: u16) -> Engine<TestBackend> {
        let backend = TestBackend::new(width, height);
        match Engine::new(backend, EngineConfig::default()) {
            Ok(e) => e,
            Err(_) => unreachable!(),
        }
    }

    fn text_node(
        engine: &mut Engine<TestBackend>,
        id: &str,
        text: &str,
        w: u16,
        h: u16,
    ) -> NodeNum {
        let root = engine.root();
        let style = NodeStyle {
            width: Dimension::Cells(w),
            height: Dimension::Cells(h),
            ..NodeStyle::default()
        };
        let num = engine
            .tree_mut()
            .create_node(
                NodeOptions {
                    id: id.into(),
                    style,
                    visible: true,
                    ..NodeOptions::default()
                },
                Box::new(crate::elements::TextElement::from_text(
                    text,
                    WidthMethod::WcWidth,
                )),
            )
            .unwrap_or(root);
        assert!(engine.tree_mut().add(root, num, None).is_ok());
        num
    }

    #[test]
    fn renders_text_to_backend() {
        let mut e = engine(10, 3);
        let _ = text_node(&mut e, "t", "hi", 5, 1);
        assert!(e.step_frame().is_ok());
        assert!(e.terminal().output_string().contains("hi"));
    }

    #[test]
    fn second_identical_frame_is_empty() {
        let mut e = engine(10, 3);
        let _ = text_node(&mut e, "t", "hi", 5, 1);
        assert!(e.step_frame().is_ok());
        e.terminal_mut().clear_output();
        assert!(e.step_frame().is_ok());
        assert!(e.terminal().output().is_empty());
    }

    #[test]
    fn setup_and_teardown_sequences() {
        let mut e = engine(10, 3);
        assert!(e.setup().is_ok());
        assert!(e.terminal().is_raw_mode());
        assert!(e.terminal().is_alternate_screen());
        let out = e.terminal().output_string();
        assert!(out.contains(ansi::CURSOR_HIDE));
        assert!(out.contains(ansi::PASTE_ON));
        assert!(out.contains(ansi::PIXEL_SIZE_QUERY));
        e.terminal_mut().clear_output();
        e.teardown();
        assert!(!e.terminal().is_raw_mode());
        let out = e.terminal().output_string();
        assert!(out.contains(ansi::CURSOR_SHOW));
        assert!(out.contains(ansi::PASTE_OFF));
    }

    #[test]
    fn split_mode_skips_alternate_screen_and_offsets_rows() {
        let backend = TestBackend::new(10, 10);
        let config = EngineConfig {
            split_height: Some(3),
            ..EngineConfig::default()
        };
        let mut e = match Engine::new(backend, config) {
            Ok(e) => e,
            Err(_) => unreachable!(),
        };
        assert!(e.setup().is_ok());
        assert!(!e.terminal().is_alternate_screen());
        assert_eq!(e.render_size(), Size::new(10, 3));
        let _ = text_node(&mut e, "t", "hi", 5, 1);
        e.terminal_mut().clear_output();
        assert!(e.step_frame().is_ok());
        // Row 0 of the UI is terminal row 8 (offset 7), 1-based row 8.
        assert!(e.terminal().output_string().contains("\x1b[8;1H"));
    }

    #[test]
    fn split_mode_flushes_console_above() {
        let backend = TestBackend::new(10, 10);
        let config = EngineConfig {
            split_height: Some(3),
            ..EngineConfig::default()
        };
        let mut e = match Engine::new(backend, config) {
            Ok(e) => e,
            Err(_) => unreachable!(),
        };
        let mut w = e.context().console.writer();
        use std::io::Write;
        assert!(w.write_all(b"logged\n").is_ok());
        assert!(e.step_frame().is_ok());
        let out = e.terminal().output_string();
        // Scroll region covers the rows above the UI.
        assert!(out.contains("\x1b[1;7r"));
        assert!(out.contains("logged"));
        assert!(out.contains(ansi::SCROLL_REGION_RESET));
    }

    #[test]
    fn mouse_above_split_region_is_ignored() {
        let backend = TestBackend::new(10, 10);
        let config = EngineConfig {
            split_height: Some(3),
            ..EngineConfig::default()
        };
        let mut e = match Engine::new(backend, config) {
            Ok(e) => e,
            Err(_) => unreachable!(),
        };
        let n = text_node(&mut e, "t", "hi", 10, 3);
        assert!(e.tree_mut().state_mut(n).is_ok_and(|s| {
            s.focusable = true;
            true
        }));
        assert!(e.step_frame().is_ok());
        // Click at terminal row 2 (above the UI region at rows 7..10).
        e.feed_input(b"\x1b[<0;1;2M");
        assert_eq!(e.router().focused(), None);
    }

    #[test]
    fn pixel_resolution_response_updates_context() {
        let mut e = engine(10, 3);
        e.feed_input(b"\x1b[4;480;640t");
        assert_eq!(e.context().pixel_size, Some((640, 480)));
    }

    #[test]
    fn live_nodes_autostart_scheduler() {
        let mut e = engine(10, 3);
        let n = text_node(&mut e, "t", "hi", 5, 1);
        assert!(e.tree_mut().set_live(n, true).is_ok());
        e.update_live_state();
        assert_eq!(e.scheduler().state(), ControlState::AutoStarted);
        assert!(e.tree_mut().set_visible(n, false).is_ok());
        e.update_live_state();
        assert_eq!(e.scheduler().state(), ControlState::Idle);
        assert!(e.tree_mut().set_visible(n, true).is_ok());
        e.update_live_state();
        assert_eq!(e.scheduler().state(), ControlState::AutoStarted);
    }

    #[test]
    fn resize_is_debounced() {
        let mut e = engine(10, 3);
        let t0 = Instant::now();
        e.terminal_mut().set_size(20, 6);
        e.poll_resize(t0);
        // Still the old render size inside the debounce window.
        assert_eq!(e.render_size(), Size::new(10, 3));
        e.poll_resize(t0 + Duration::from_millis(150));
        assert_eq!(e.render_size(), Size::new(20, 6));
    }

    #[test]
    fn stopped_engine_leaves_run_loop() {
        let mut e = engine(10, 3);
        e.scheduler_mut().stop();
        let (_tx, rx) = mpsc::channel::<Vec<u8>>();
        let input = InputSource::from_receiver(rx);
        assert!(e.run_with_input(input).is_ok());
    }

    #[test]
    fn background_color_fills_first_frame() {
        let backend = TestBackend::new(4, 2);
        let config = EngineConfig {
            background: Rgba::from_rgb8(0, 0, 60),
            ..EngineConfig::default()
        };
        let mut e = match Engine::new(backend, config) {
            Ok(e) => e,
            Err(_) => unreachable!(),
        };
        assert!(e.step_frame().is_ok());
        assert!(e.terminal().output_string().contains("48;2;0;0;60"));
    }
}
