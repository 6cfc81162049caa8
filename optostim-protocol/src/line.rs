//! Byte-at-a-time line assembly for the command link

use heapless::{String, Vec};

use crate::command::CommandError;

/// Longest accepted command line, excluding the terminator
pub const MAX_LINE_LEN: usize = 32;

/// A complete, trimmed input line
pub type Line = String<MAX_LINE_LEN>;

/// Collects serial bytes into lines
///
/// `\n` ends a line and `\r` is dropped, so both LF and CRLF hosts work.
/// A line that outgrows the buffer is discarded up to its terminator.
#[derive(Debug, Clone, Default)]
pub struct LineBuffer {
    buffer: Vec<u8, MAX_LINE_LEN>,
    overflowed: bool,
}

impl LineBuffer {
    /// Create an empty line buffer
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            overflowed: false,
        }
    }

    /// Drop any partial line
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.overflowed = false;
    }

    /// Feed a single byte
    ///
    /// Returns `Ok(Some(line))` when a non-empty line is complete,
    /// `Ok(None)` when more bytes are needed, or `Err` when the finished
    /// line could not be kept.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Line>, CommandError> {
        match byte {
            b'\r' => Ok(None),
            b'\n' => {
                let result = self.take_line();
                self.reset();
                result
            }
            _ => {
                if !self.overflowed && self.buffer.push(byte).is_err() {
                    self.overflowed = true;
                }
                Ok(None)
            }
        }
    }

    fn take_line(&self) -> Result<Option<Line>, CommandError> {
        if self.overflowed {
            return Err(CommandError::LineTooLong);
        }

        let text = core::str::from_utf8(&self.buffer).map_err(|_| CommandError::Malformed)?;
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let mut line = Line::new();
        // Never longer than the buffer it came from
        let _ = line.push_str(text);
        Ok(Some(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(lines: &mut LineBuffer, bytes: &[u8]) -> Result<Option<Line>, CommandError> {
        let mut last = Ok(None);
        for &byte in bytes {
            last = lines.feed(byte);
            if !matches!(last, Ok(None)) {
                return last;
            }
        }
        last
    }

    #[test]
    fn test_line_complete_on_newline() {
        let mut lines = LineBuffer::new();
        assert_eq!(lines.feed(b'S'), Ok(None));
        assert_eq!(lines.feed(b'\n').unwrap().as_deref(), Some("S"));
    }

    #[test]
    fn test_crlf_and_whitespace_trimmed() {
        let mut lines = LineBuffer::new();
        let line = feed_all(&mut lines, b"  B:2 \r\n").unwrap().unwrap();
        assert_eq!(line.as_str(), "B:2");
    }

    #[test]
    fn test_blank_lines_ignored() {
        let mut lines = LineBuffer::new();
        assert_eq!(feed_all(&mut lines, b"\r\n"), Ok(None));
        assert_eq!(feed_all(&mut lines, b"   \n"), Ok(None));
    }

    #[test]
    fn test_overlong_line_discarded() {
        let mut lines = LineBuffer::new();
        let mut long = [b'A'; MAX_LINE_LEN + 8];
        long[MAX_LINE_LEN + 7] = b'\n';
        assert_eq!(feed_all(&mut lines, &long), Err(CommandError::LineTooLong));

        // Buffer recovers for the next line
        let line = feed_all(&mut lines, b"X\n").unwrap().unwrap();
        assert_eq!(line.as_str(), "X");
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let mut lines = LineBuffer::new();
        assert_eq!(
            feed_all(&mut lines, &[0xFF, 0xFE, b'\n']),
            Err(CommandError::Malformed)
        );
    }
}
