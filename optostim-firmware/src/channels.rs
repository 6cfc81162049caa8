//! Inter-task communication channels
//!
//! Commands flow from the serial receiver to the stimulation loop; reports
//! flow from the stimulation loop (and the receiver's own diagnostics) to
//! the serial transmitter.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::String;

use optostim_core::{Level, MsInstant, Record};
use optostim_protocol::Command;

/// Channel capacity for parsed host commands
const COMMAND_CHANNEL_SIZE: usize = 4;

/// Channel capacity for outgoing reports
const REPORT_CHANNEL_SIZE: usize = 32;

/// Longest diagnostic text carried in a report
pub const REPORT_TEXT_LEN: usize = 64;

/// Something to tell the host
#[derive(Debug, Clone)]
pub enum Report {
    /// Structured data record
    Event { at: MsInstant, record: Record },
    /// Free-text log line
    Message {
        at: MsInstant,
        level: Level,
        text: String<REPORT_TEXT_LEN>,
    },
}

/// Commands parsed from the host link
pub static COMMAND_CHANNEL: Channel<CriticalSectionRawMutex, Command, COMMAND_CHANNEL_SIZE> =
    Channel::new();

/// Records and messages waiting to go out over the host link
pub static REPORT_CHANNEL: Channel<CriticalSectionRawMutex, Report, REPORT_CHANNEL_SIZE> =
    Channel::new();
