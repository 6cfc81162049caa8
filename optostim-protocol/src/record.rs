//! Device-to-host text lines
//!
//! Data records are tab-delimited so they can be loaded straight into a
//! spreadsheet; channel records carry the channel number in the label
//! (`led3`, `burst0`). Messages use the bracketed log format.

use core::fmt::Write;

use heapless::String;
use optostim_core::{Level, MsInstant, Record};

/// Longest line sent to the host, including the newline
pub const MAX_OUTPUT_LEN: usize = 96;

/// One outgoing line, newline-terminated
pub type OutputLine = String<MAX_OUTPUT_LEN>;

/// `data\t<ms>\t<label>\t<value>\n`
pub fn format_record(at: MsInstant, record: &Record) -> OutputLine {
    let mut line = OutputLine::new();
    // Fits: the longest record is well under the line length
    let _ = match record.channel() {
        Some(channel) => writeln!(
            line,
            "data\t{}\t{}{}\t{}",
            at.0,
            record.label(),
            channel,
            record.value()
        ),
        None => writeln!(line, "data\t{}\t{}\t{}", at.0, record.label(), record.value()),
    };
    line
}

/// `[TIME]: <ms> [<LEVEL>]: <text>\n`
///
/// Text that does not fit is truncated; the line always ends in a newline.
pub fn format_message(at: MsInstant, level: Level, text: &str) -> OutputLine {
    let mut line = OutputLine::new();
    let _ = write!(line, "[TIME]: {} [{}]: ", at.0, level.tag());

    let room = MAX_OUTPUT_LEN - 1 - line.len();
    let _ = line.push_str(truncate(text, room));
    let _ = line.push('\n');
    line
}

/// Longest prefix of `text` that fits in `max` bytes on a char boundary
fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use optostim_core::Millis;

    #[test]
    fn test_led_record_line() {
        let line = format_record(MsInstant(1234), &Record::Led { channel: 3, on: true });
        assert_eq!(line.as_str(), "data\t1234\tled3\t1\n");
    }

    #[test]
    fn test_block_record_line() {
        let record = Record::BlockStart {
            index: 2,
            duration: Millis(60_000),
        };
        let line = format_record(MsInstant(0), &record);
        assert_eq!(line.as_str(), "data\t0\tblock\t2\n");
    }

    #[test]
    fn test_burst_record_line() {
        let line = format_record(MsInstant(10_000), &Record::BurstStop { channel: 0 });
        assert_eq!(line.as_str(), "data\t10000\tburst0\t0\n");
    }

    #[test]
    fn test_message_line() {
        let line = format_message(MsInstant(42), Level::Error, "block 3 out of range");
        assert_eq!(line.as_str(), "[TIME]: 42 [ERROR]: block 3 out of range\n");

        let line = format_message(MsInstant(7), Level::Debug, "starting stimulation");
        assert_eq!(line.as_str(), "[TIME]: 7 [DEBUG]: starting stimulation\n");
    }

    #[test]
    fn test_long_message_truncated() {
        let text = "x".repeat(200);
        let line = format_message(MsInstant(u32::MAX), Level::Log, &text);
        assert_eq!(line.len(), MAX_OUTPUT_LEN);
        assert!(line.ends_with('\n'));
        assert!(line.starts_with("[TIME]: 4294967295 [LOG]: xxx"));
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        assert_eq!(truncate("héllo", 2), "h");
        assert_eq!(truncate("héllo", 3), "hé");
        assert_eq!(truncate("abc", 10), "abc");
    }
}
