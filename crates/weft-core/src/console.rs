//! Captured application output.
//!
//! The engine owns the terminal while it runs; application logging goes
//! through a [`ConsoleCapture`] handle instead of raw stdout. In split
//! mode the captured lines are flushed into the scrollback region above
//! the UI between frames; after a crash the most recent lines are dumped
//! so diagnostics are not lost with the alternate screen.
//!
//! The writer handle implements [`std::io::Write`], so it plugs into
//! anything that takes a writer (including `tracing` subscribers).

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct ConsoleInner {
    pending: VecDeque<String>,
    recent: VecDeque<String>,
    partial: String,
    max_recent: usize,
}

/// Shared buffer of captured output lines.
#[derive(Clone, Debug)]
pub struct ConsoleCapture {
    inner: Arc<Mutex<ConsoleInner>>,
}

impl ConsoleCapture {
    /// Create a capture keeping at most `max_recent` lines for dumps.
    pub fn new(max_recent: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ConsoleInner {
                max_recent: max_recent.max(1),
                ..ConsoleInner::default()
            })),
        }
    }

    /// A clonable writer feeding this capture.
    pub fn writer(&self) -> ConsoleWriter {
        ConsoleWriter {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Take every complete line captured since the last drain.
    pub fn drain(&self) -> Vec<String> {
        match self.inner.lock() {
            Ok(mut inner) => inner.pending.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// The most recent lines (kept across drains), oldest first.
    pub fn tail(&self, n: usize) -> Vec<String> {
        match self.inner.lock() {
            Ok(inner) => {
                let skip = inner.recent.len().saturating_sub(n);
                inner.recent.iter().skip(skip).cloned().collect()
            }
            Err(_) => Vec::new(),
        }
    }

    /// Whether any complete lines are waiting to be drained.
    pub fn has_pending(&self) -> bool {
        self.inner.lock().map(|i| !i.pending.is_empty()).unwrap_or(false)
    }
}

impl Default for ConsoleCapture {
    fn default() -> Self {
        Self::new(200)
    }
}

/// Writer half of a [`ConsoleCapture`].
#[derive(Clone, Debug)]
pub struct ConsoleWriter {
    inner: Arc<Mutex<ConsoleInner>>,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        if let Ok(mut inner) = self.inner.lock() {
            inner.partial.push_str(&text);
            while let Some(pos) = inner.partial.find('\n') {
                let mut line: String = inner.partial.drain(..=pos).collect();
                line.truncate(line.trim_end_matches(['\n', '\r']).len());
                inner.pending.push_back(line.clone());
                inner.recent.push_back(line);
                let max = inner.max_recent;
                while inner.recent.len() > max {
                    inner.recent.pop_front();
                }
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn captures_complete_lines() {
        let capture = ConsoleCapture::new(10);
        let mut w = capture.writer();
        assert!(w.write_all(b"hello\nworld\n").is_ok());
        assert_eq!(capture.drain(), vec!["hello", "world"]);
        assert!(!capture.has_pending());
    }

    #[test]
    fn partial_lines_wait_for_newline() {
        let capture = ConsoleCapture::new(10);
        let mut w = capture.writer();
        assert!(w.write_all(b"par").is_ok());
        assert!(capture.drain().is_empty());
        assert!(w.write_all(b"tial\n").is_ok());
        assert_eq!(capture.drain(), vec!["partial"]);
    }

    #[test]
    fn tail_survives_drain() {
        let capture = ConsoleCapture::new(10);
        let mut w = capture.writer();
        assert!(w.write_all(b"one\ntwo\nthree\n").is_ok());
        let _ = capture.drain();
        assert_eq!(capture.tail(2), vec!["two", "three"]);
    }

    #[test]
    fn recent_ring_is_bounded() {
        let capture = ConsoleCapture::new(2);
        let mut w = capture.writer();
        assert!(w.write_all(b"a\nb\nc\n").is_ok());
        assert_eq!(capture.tail(10), vec!["b", "c"]);
    }

    #[test]
    fn crlf_is_stripped() {
        let capture = ConsoleCapture::new(10);
        let mut w = capture.writer();
        assert!(w.write_all(b"line\r\n").is_ok());
        assert_eq!(capture.drain(), vec!["line"]);
    }

    #[test]
    fn clones_share_the_buffer() {
        let capture = ConsoleCapture::new(10);
        let mut w1 = capture.writer();
        let mut w2 = w1.clone();
        assert!(w1.write_all(b"a\n").is_ok());
        assert!(w2.write_all(b"b\n").is_ok());
        assert_eq!(capture.drain(), vec!["a", "b"]);
    }
}
