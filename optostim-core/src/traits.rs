//! Collaborator traits
//!
//! These traits define the boundary between the scheduling core and the
//! board: where time comes from, where LED levels go, and where records
//! are written.

use crate::record::{Level, Record};
use crate::time::{MsInstant, Timestamp, UsInstant};

/// Monotonic elapsed-time source
///
/// Both readings count from the same origin and never go backwards
/// except by wrapping at 32 bits. Reads must not block.
pub trait Clock {
    /// Coarse reading (milliseconds)
    fn now_ms(&self) -> MsInstant;

    /// Fine reading (microseconds)
    fn now_us(&self) -> UsInstant;

    /// Read both clocks
    ///
    /// Implementations backed by a single counter should override this so
    /// the two readings agree.
    fn now(&self) -> Timestamp {
        Timestamp {
            coarse: self.now_ms(),
            fine: self.now_us(),
        }
    }
}

/// Physical LED gate outputs
///
/// Calling with the level a channel already has must be harmless.
pub trait LedOutput {
    /// Drive channel `channel` on or off
    fn set_level(&mut self, channel: usize, on: bool);

    /// Current level of channel `channel`
    fn level(&self, channel: usize) -> bool;
}

/// Sink for scheduler records and diagnostics
///
/// Fire-and-forget: implementations must not block and must drop rather
/// than fail when they cannot keep up.
pub trait EventRecorder {
    /// Record a structured event
    fn record_event(&mut self, at: MsInstant, record: Record);

    /// Record a free-text message
    fn record_message(&mut self, at: MsInstant, level: Level, text: &str);
}

/// Recorder that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRecorder;

impl EventRecorder for NullRecorder {
    fn record_event(&mut self, _at: MsInstant, _record: Record) {}

    fn record_message(&mut self, _at: MsInstant, _level: Level, _text: &str) {}
}
