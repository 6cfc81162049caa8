//! Event records emitted by the scheduler
//!
//! Every observable state change is reported to the [`EventRecorder`]
//! as a [`Record`]. The `(label, value)` pair is what ends up in the
//! tab-delimited data stream.
//!
//! [`EventRecorder`]: crate::traits::EventRecorder

use crate::time::Millis;

/// Scheduler events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Record {
    /// A channel's LED changed level
    Led { channel: u8, on: bool },
    /// A channel entered a burst
    BurstStart { channel: u8 },
    /// A channel entered the inter-burst gap
    BurstStop { channel: u8 },
    /// A block began
    BlockStart { index: u8, duration: Millis },
    /// `run_stimulation` was accepted
    ExperimentStart,
    /// The experiment went from active to inactive
    ExperimentStop,
    /// Manual mode was entered
    ManualMode,
}

impl Record {
    /// Short label for the data stream
    pub const fn label(&self) -> &'static str {
        match self {
            Record::Led { .. } => "led",
            Record::BurstStart { .. } => "burst",
            Record::BurstStop { .. } => "burst",
            Record::BlockStart { .. } => "block",
            Record::ExperimentStart => "start",
            Record::ExperimentStop => "stop",
            Record::ManualMode => "manual",
        }
    }

    /// Numeric value paired with the label
    ///
    /// Binary states are 0/1, a block start carries its index.
    pub const fn value(&self) -> u32 {
        match self {
            Record::Led { on, .. } => *on as u32,
            Record::BurstStart { .. } => 1,
            Record::BurstStop { .. } => 0,
            Record::BlockStart { index, .. } => *index as u32,
            Record::ExperimentStart | Record::ExperimentStop | Record::ManualMode => 0,
        }
    }

    /// Channel the record belongs to, if any
    pub const fn channel(&self) -> Option<u8> {
        match self {
            Record::Led { channel, .. }
            | Record::BurstStart { channel }
            | Record::BurstStop { channel } => Some(*channel),
            _ => None,
        }
    }
}

/// Severity of a free-text message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Debug,
    Log,
    Error,
}

impl Level {
    /// Tag used in the text log
    pub const fn tag(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Log => "LOG",
            Level::Error => "ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_led_record() {
        let on = Record::Led { channel: 3, on: true };
        let off = Record::Led { channel: 3, on: false };
        assert_eq!(on.label(), "led");
        assert_eq!(on.value(), 1);
        assert_eq!(off.value(), 0);
        assert_eq!(on.channel(), Some(3));
    }

    #[test]
    fn test_block_record() {
        let rec = Record::BlockStart {
            index: 2,
            duration: Millis(60_000),
        };
        assert_eq!(rec.label(), "block");
        assert_eq!(rec.value(), 2);
        assert_eq!(rec.channel(), None);
    }
}
