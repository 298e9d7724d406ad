//! Byte-level input parsing: keystrokes, mouse reports, bracketed paste,
//! and terminal responses.
//!
//! Bytes are fed in as they arrive; complete sequences become
//! [`InputEvent`]s, incomplete tails are kept for the next read, and a
//! timeout flush resolves the bare-ESC ambiguity. Malformed sequences are
//! dropped with a diagnostic counter.

mod keyboard;
mod mouse;

use crate::events::{InputEvent, KeyCode, KeyEventKind, ParsedKey};

const PASTE_END: &[u8] = b"\x1b[201~";
const MAX_SEQUENCE: usize = 64;

enum Step {
    Event(InputEvent),
    Consumed,
    Incomplete,
    Invalid,
}

/// Incremental parser for the terminal input byte stream.
pub struct InputParser {
    buf: Vec<u8>,
    in_paste: bool,
    paste_buf: Vec<u8>,
    warnings: u64,
    mouse: mouse::MouseState,
}

impl InputParser {
    /// Create an empty parser.
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(64),
            in_paste: false,
            paste_buf: Vec::new(),
            warnings: 0,
            mouse: mouse::MouseState::default(),
        }
    }

    /// Feed a burst of bytes, returning every completed event.
    pub fn feed(&mut self, data: &[u8]) -> Vec<InputEvent> {
        self.buf.extend_from_slice(data);
        let mut out = Vec::new();
        loop {
            if self.in_paste {
                if !self.drain_paste(&mut out) {
                    break;
                }
                continue;
            }
            if self.buf.is_empty() {
                break;
            }
            match self.try_parse_one() {
                Step::Event(ev) => out.push(ev),
                Step::Consumed => {}
                Step::Incomplete => break,
                Step::Invalid => {
                    self.warnings += 1;
                    tracing::warn!(byte = self.buf[0], "dropping malformed input byte");
                    self.buf.remove(0);
                }
            }
        }
        out
    }

    /// Whether an incomplete sequence is waiting for more bytes.
    pub fn has_pending(&self) -> bool {
        !self.buf.is_empty()
    }

    /// Resolve pending bytes after a read timeout: a bare ESC becomes the
    /// Escape key, anything else is parsed or dropped.
    pub fn flush_pending(&mut self) -> Vec<InputEvent> {
        let mut out = Vec::new();
        while !self.buf.is_empty() {
            if self.in_paste {
                // A paste that never terminates is flushed as-is.
                self.paste_buf.append(&mut self.buf);
                continue;
            }
            match self.try_parse_one() {
                Step::Event(ev) => out.push(ev),
                Step::Consumed => {}
                Step::Incomplete | Step::Invalid => {
                    if self.buf.first() == Some(&0x1b) {
                        out.push(InputEvent::Key(ParsedKey {
                            code: KeyCode::Escape,
                            modifiers: crate::events::Modifiers::empty(),
                            kind: KeyEventKind::Press,
                            raw: vec![0x1b],
                        }));
                    } else {
                        self.warnings += 1;
                    }
                    self.buf.remove(0);
                }
            }
        }
        out
    }

    /// Count of malformed sequences dropped so far.
    pub fn warning_count(&self) -> u64 {
        self.warnings
    }

    /// Reset the mouse drag state (on disable or terminal resize).
    pub fn reset_mouse(&mut self) {
        self.mouse.reset();
    }

    /// Accumulate paste bytes until the end marker; true when the paste
    /// completed and parsing may continue.
    fn drain_paste(&mut self, out: &mut Vec<InputEvent>) -> bool {
        if let Some(pos) = find(&self.buf, PASTE_END) {
            self.paste_buf.extend_from_slice(&self.buf[..pos]);
            self.buf.drain(..pos + PASTE_END.len());
            self.in_paste = false;
            let text = strip_escapes(&self.paste_buf);
            self.paste_buf.clear();
            out.push(InputEvent::Paste(text));
            return true;
        }
        // Keep any tail that could be the start of the end marker.
        let keep = longest_suffix_prefix(&self.buf, PASTE_END);
        let take = self.buf.len() - keep;
        self.paste_buf.extend_from_slice(&self.buf[..take]);
        self.buf.drain(..take);
        false
    }

    fn consume(&mut self, n: usize) {
        self.buf.drain(..n);
    }

    fn try_parse_one(&mut self) -> Step {
        let first = self.buf[0];
        match first {
            0x1b => self.parse_escape(),
            0x20..=0x7E => {
                self.consume(1);
                Step::Event(InputEvent::Key(ParsedKey {
                    code: KeyCode::Char(first as char),
                    modifiers: crate::events::Modifiers::empty(),
                    kind: KeyEventKind::Press,
                    raw: vec![first],
                }))
            }
            0x80..=0xFF => self.parse_utf8(),
            byte => match keyboard::control_byte(byte) {
                Some((code, modifiers)) => {
                    self.consume(1);
                    Step::Event(InputEvent::Key(ParsedKey {
                        code,
                        modifiers,
                        kind: KeyEventKind::Press,
                        raw: vec![byte],
                    }))
                }
                None => Step::Invalid,
            },
        }
    }

    fn parse_escape(&mut self) -> Step {
        if self.buf.len() < 2 {
            return Step::Incomplete;
        }
        match self.buf[1] {
            b'[' => self.parse_csi(),
            b'O' => {
                if self.buf.len() < 3 {
                    return Step::Incomplete;
                }
                let raw: Vec<u8> = self.buf[..3].to_vec();
                let key = keyboard::ss3_key(self.buf[2], &raw);
                self.consume(3);
                match key {
                    Some(k) => Step::Event(InputEvent::Key(k)),
                    None => {
                        self.warnings += 1;
                        tracing::warn!("unrecognized SS3 sequence");
                        Step::Consumed
                    }
                }
            }
            0x1b => {
                self.consume(2);
                Step::Event(InputEvent::Key(ParsedKey {
                    code: KeyCode::Escape,
                    modifiers: crate::events::Modifiers::ALT,
                    kind: KeyEventKind::Press,
                    raw: vec![0x1b, 0x1b],
                }))
            }
            ch @ 0x20..=0x7E => {
                self.consume(2);
                Step::Event(InputEvent::Key(ParsedKey {
                    code: KeyCode::Char(ch as char),
                    modifiers: crate::events::Modifiers::ALT,
                    kind: KeyEventKind::Press,
                    raw: vec![0x1b, ch],
                }))
            }
            _ => {
                // Lone ESC followed by an unrelated control byte.
                self.consume(1);
                Step::Event(InputEvent::Key(ParsedKey {
                    code: KeyCode::Escape,
                    modifiers: crate::events::Modifiers::empty(),
                    kind: KeyEventKind::Press,
                    raw: vec![0x1b],
                }))
            }
        }
    }

    fn parse_csi(&mut self) -> Step {
        if self.buf.len() < 3 {
            return Step::Incomplete;
        }
        // Legacy X10 mouse: ESC [ M Cb Cx Cy.
        if self.buf[2] == b'M' {
            if self.buf.len() < 6 {
                return Step::Incomplete;
            }
            let (cb, cx, cy) = (self.buf[3], self.buf[4], self.buf[5]);
            self.consume(6);
            return match self.mouse.x10(cb, cx, cy) {
                Some(ev) => Step::Event(InputEvent::Mouse(ev)),
                None => Step::Consumed,
            };
        }

        let mut i = 2;
        while i < self.buf.len() && !(0x40..=0x7E).contains(&self.buf[i]) {
            if i > MAX_SEQUENCE {
                return Step::Invalid;
            }
            i += 1;
        }
        if i >= self.buf.len() {
            return Step::Incomplete;
        }
        let final_byte = self.buf[i];
        let params: Vec<u8> = self.buf[2..i].to_vec();
        let raw: Vec<u8> = self.buf[..=i].to_vec();
        self.consume(i + 1);

        // SGR mouse: ESC [ < b ; x ; y (M|m).
        if params.first() == Some(&b'<') && matches!(final_byte, b'M' | b'm') {
            return match self.parse_sgr(&params[1..], final_byte == b'm') {
                Some(ev) => Step::Event(InputEvent::Mouse(ev)),
                None => {
                    self.warnings += 1;
                    tracing::warn!("malformed SGR mouse report");
                    Step::Consumed
                }
            };
        }

        match final_byte {
            b'~' if leading_param(&params) == Some(200) => {
                self.in_paste = true;
                Step::Consumed
            }
            b'~' if leading_param(&params) == Some(201) => {
                tracing::debug!("stray bracketed paste end");
                Step::Consumed
            }
            b't' => match parse_pixel_size(&params) {
                Some((width, height)) => {
                    Step::Event(InputEvent::PixelResolution { width, height })
                }
                None => Step::Consumed,
            },
            b'I' if params.is_empty() => Step::Event(InputEvent::FocusGained),
            b'O' if params.is_empty() => Step::Event(InputEvent::FocusLost),
            _ => match keyboard::csi_key(&params, final_byte, &raw) {
                Some(key) => Step::Event(InputEvent::Key(key)),
                None => {
                    // Terminal responses (DA1, DECRPM, cursor reports) are
                    // consumed silently; anything else counts as malformed.
                    if !matches!(final_byte, b'c' | b'y' | b'n' | b'R') {
                        self.warnings += 1;
                        tracing::warn!(final_byte, "unrecognized CSI sequence");
                    }
                    Step::Consumed
                }
            },
        }
    }

    fn parse_sgr(&mut self, params: &[u8], release: bool) -> Option<crate::events::MouseInput> {
        let text = std::str::from_utf8(params).ok()?;
        let mut fields = text.split(';');
        let cb: u32 = fields.next()?.parse().ok()?;
        let x: u16 = fields.next()?.parse().ok()?;
        let y: u16 = fields.next()?.parse().ok()?;
        self.mouse
            .sgr(cb, x.saturating_sub(1), y.saturating_sub(1), release)
    }

    fn parse_utf8(&mut self) -> Step {
        let first = self.buf[0];
        let len = match first {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => return Step::Invalid,
        };
        if self.buf.len() < len {
            return Step::Incomplete;
        }
        let raw: Vec<u8> = self.buf[..len].to_vec();
        match std::str::from_utf8(&raw) {
            Ok(s) => match s.chars().next() {
                Some(c) => {
                    self.consume(len);
                    Step::Event(InputEvent::Key(ParsedKey {
                        code: KeyCode::Char(c),
                        modifiers: crate::events::Modifiers::empty(),
                        kind: KeyEventKind::Press,
                        raw,
                    }))
                }
                None => Step::Invalid,
            },
            Err(_) => Step::Invalid,
        }
    }
}

impl Default for InputParser {
    fn default() -> Self {
        Self::new()
    }
}

fn leading_param(params: &[u8]) -> Option<u32> {
    std::str::from_utf8(params)
        .ok()?
        .split(';')
        .next()?
        .parse()
        .ok()
}

/// Parse a `CSI 4 ; height ; width t` pixel size report.
fn parse_pixel_size(params: &[u8]) -> Option<(u32, u32)> {
    let text = std::str::from_utf8(params).ok()?;
    let mut fields = text.split(';');
    if fields.next()? != "4" {
        return None;
    }
    let height: u32 = fields.next()?.parse().ok()?;
    let width: u32 = fields.next()?.parse().ok()?;
    Some((width, height))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Longest suffix of `buf` that is a proper prefix of `pattern`.
fn longest_suffix_prefix(buf: &[u8], pattern: &[u8]) -> usize {
    let max = buf.len().min(pattern.len() - 1);
    for keep in (1..=max).rev() {
        if buf[buf.len() - keep..] == pattern[..keep] {
            return keep;
        }
    }
    0
}

/// Remove escape sequences from pasted bytes, keeping printable text.
fn strip_escapes(data: &[u8]) -> String {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        if data[i] == 0x1b {
            i += 1;
            if data.get(i) == Some(&b'[') {
                i += 1;
                while i < data.len() && !(0x40..=0x7E).contains(&data[i]) {
                    i += 1;
                }
                i += 1; // final byte
            } else {
                i += 1; // two-byte escape
            }
            continue;
        }
        out.push(data[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
