// SPDX-License-Identifier: MIT
//
// Output buffering and resilient writes.
//
// Two pieces keep terminal I/O cheap and robust:
//
//   OutputBuffer: accumulates all ANSI bytes of one operation (a single
//   print, or a whole batch replay) in memory so it reaches the terminal
//   in one write.
//
//   write_with_retry: pushes those bytes to the real writer. A terminal
//   that can't keep up reports "would block"; we back off exponentially
//   (2 ms, 4 ms, 8 ms, ...) and try again, giving up after the configured
//   number of consecutive refusals. Partial writes resume where they
//   stopped and interrupted calls are simply repeated.

use std::io::{self, ErrorKind, Write};
use std::thread;

use log::{error, warn};

use crate::config::RenderConfig;
use crate::error::{Error, Result};

// ─── OutputBuffer ────────────────────────────────────────────────────────────

/// A byte buffer that accumulates ANSI output for a single write.
///
/// Default capacity: 16 KB, enough for most frames without reallocation.
pub struct OutputBuffer {
    buf: Vec<u8>,
}

const DEFAULT_CAPACITY: usize = 16_384;

impl OutputBuffer {
    /// Create an empty buffer with default capacity (16 KB).
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(DEFAULT_CAPACITY),
        }
    }

    /// Number of bytes accumulated.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The accumulated bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Append a character as UTF-8.
    pub fn write_char(&mut self, ch: char) {
        let mut enc = [0u8; 4];
        self.buf.extend_from_slice(ch.encode_utf8(&mut enc).as_bytes());
    }

    /// Clear the buffer for reuse (keeps allocated capacity).
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Write accumulated output to `w` with retries, then clear the buffer.
    /// The buffer is kept when the write fails.
    ///
    /// # Errors
    ///
    /// See [`write_with_retry`].
    pub fn flush_to(&mut self, w: &mut impl Write, config: &RenderConfig) -> Result<()> {
        if !self.buf.is_empty() {
            write_with_retry(w, &self.buf, config)?;
            self.buf.clear();
        }
        Ok(())
    }
}

impl Write for OutputBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Real flushing goes through `flush_to`.
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Retrying writes ─────────────────────────────────────────────────────────

/// Write all of `bytes` to `w` and flush it.
///
/// # Errors
///
/// [`Error::OutputBlocked`] after `config.retry_attempts` consecutive
/// "would block" results; [`Error::Io`] for any other failure, including a
/// writer that accepts zero bytes.
pub fn write_with_retry(w: &mut impl Write, bytes: &[u8], config: &RenderConfig) -> Result<()> {
    let mut rest = bytes;
    while !rest.is_empty() {
        let n = retry(config, || w.write(rest))?;
        if n == 0 {
            return Err(io::Error::from(ErrorKind::WriteZero).into());
        }
        rest = &rest[n..];
    }
    retry(config, || w.flush())
}

/// Run `op` until it stops reporting "would block" or "interrupted".
fn retry<T>(config: &RenderConfig, mut op: impl FnMut() -> io::Result<T>) -> Result<T> {
    let mut blocked: u32 = 0;
    loop {
        match op() {
            Ok(v) => return Ok(v),
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                blocked += 1;
                if blocked >= config.retry_attempts {
                    error!("output still blocked after {blocked} attempts, giving up");
                    return Err(Error::OutputBlocked { attempts: blocked });
                }
                let delay = config
                    .retry_base_delay
                    .saturating_mul(2u32.saturating_pow(blocked - 1));
                warn!("output would block (attempt {blocked}), retrying in {delay:?}");
                thread::sleep(delay);
            }
            Err(e) => return Err(e.into()),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn fast(attempts: u32) -> RenderConfig {
        RenderConfig::default()
            .with_retry_attempts(attempts)
            .with_retry_base_delay(Duration::ZERO)
    }

    /// A writer that misbehaves according to a script, then accepts at most
    /// `chunk` bytes per call.
    struct Flaky {
        script: Vec<ErrorKind>,
        chunk: usize,
        data: Vec<u8>,
        flushed: bool,
    }

    impl Flaky {
        fn new(script: &[ErrorKind], chunk: usize) -> Self {
            Self {
                script: script.iter().rev().copied().collect(),
                chunk,
                data: Vec::new(),
                flushed: false,
            }
        }
    }

    impl Write for Flaky {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if let Some(kind) = self.script.pop() {
                return Err(io::Error::from(kind));
            }
            let n = buf.len().min(self.chunk);
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushed = true;
            Ok(())
        }
    }

    // ── OutputBuffer ────────────────────────────────────────────────────

    #[test]
    fn output_buffer_new_is_empty() {
        let buf = OutputBuffer::new();
        assert!(buf.is_empty());
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn output_buffer_write_trait() {
        let mut buf = OutputBuffer::new();
        write!(buf, "hello {}", 42).unwrap();
        assert_eq!(buf.as_bytes(), b"hello 42");
        assert_eq!(buf.len(), 8);
    }

    #[test]
    fn output_buffer_write_char_encodes_utf8() {
        let mut buf = OutputBuffer::new();
        buf.write_char('A');
        buf.write_char('中');
        buf.write_char('\u{2588}');
        assert_eq!(buf.as_bytes(), "A中█".as_bytes());
    }

    #[test]
    fn output_buffer_clear_keeps_capacity() {
        let mut buf = OutputBuffer::new();
        buf.write_char('x');
        let cap = buf.buf.capacity();
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.buf.capacity(), cap);
    }

    #[test]
    fn output_buffer_flush_to() {
        let mut buf = OutputBuffer::new();
        write!(buf, "frame").unwrap();
        let mut out = Vec::new();
        buf.flush_to(&mut out, &fast(3)).unwrap();
        assert_eq!(out, b"frame");
        assert!(buf.is_empty());
    }

    #[test]
    fn output_buffer_flush_to_empty_is_noop() {
        let mut buf = OutputBuffer::new();
        let mut w = Flaky::new(&[], 8);
        buf.flush_to(&mut w, &fast(3)).unwrap();
        assert!(!w.flushed);
    }

    // ── Retries ─────────────────────────────────────────────────────────

    #[test_log::test]
    fn partial_writes_are_resumed() {
        let mut w = Flaky::new(&[], 3);
        write_with_retry(&mut w, b"0123456789", &fast(3)).unwrap();
        assert_eq!(w.data, b"0123456789");
        assert!(w.flushed);
    }

    #[test_log::test]
    fn would_block_and_interrupted_are_retried() {
        let script = [
            ErrorKind::WouldBlock,
            ErrorKind::Interrupted,
            ErrorKind::WouldBlock,
        ];
        let mut w = Flaky::new(&script, 4);
        write_with_retry(&mut w, b"abcdef", &fast(3)).unwrap();
        assert_eq!(w.data, b"abcdef");
    }

    #[test_log::test]
    fn persistent_blocking_gives_up() {
        let mut w = Flaky::new(&[ErrorKind::WouldBlock; 5], 4);
        let err = write_with_retry(&mut w, b"abc", &fast(3)).unwrap_err();
        assert!(matches!(err, Error::OutputBlocked { attempts: 3 }));
        assert!(w.data.is_empty());
    }

    #[test_log::test]
    fn other_errors_propagate() {
        let mut w = Flaky::new(&[ErrorKind::BrokenPipe], 4);
        let err = write_with_retry(&mut w, b"abc", &fast(3)).unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == ErrorKind::BrokenPipe));
    }

    #[test]
    fn zero_length_write_is_an_error() {
        let mut w = Flaky::new(&[], 0);
        assert!(matches!(
            write_with_retry(&mut w, b"abc", &fast(3)),
            Err(Error::Io(ref e)) if e.kind() == ErrorKind::WriteZero
        ));
    }
}
