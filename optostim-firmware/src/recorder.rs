//! Event recorder that forwards to the serial transmitter

use defmt::*;
use heapless::String;

use optostim_core::{EventRecorder, Level, MsInstant, Record};

use crate::channels::{Report, REPORT_CHANNEL, REPORT_TEXT_LEN};

/// Queues reports for the host without ever blocking the poll loop
///
/// When the transmitter falls behind, reports are dropped and counted;
/// the count is logged once the queue drains.
#[derive(Debug, Default)]
pub struct ChannelRecorder {
    dropped: u32,
}

impl ChannelRecorder {
    pub const fn new() -> Self {
        Self { dropped: 0 }
    }

    fn send(&mut self, report: Report) {
        if REPORT_CHANNEL.try_send(report).is_err() {
            self.dropped = self.dropped.saturating_add(1);
            return;
        }

        if self.dropped > 0 {
            warn!("Report channel full, dropped {} reports", self.dropped);
            self.dropped = 0;
        }
    }
}

impl EventRecorder for ChannelRecorder {
    fn record_event(&mut self, at: MsInstant, record: Record) {
        trace!("{} {}", at.0, record);
        self.send(Report::Event { at, record });
    }

    fn record_message(&mut self, at: MsInstant, level: Level, text: &str) {
        match level {
            Level::Debug => debug!("{}", text),
            Level::Log => info!("{}", text),
            Level::Error => error!("{}", text),
        }

        let mut buf: String<REPORT_TEXT_LEN> = String::new();
        for c in text.chars() {
            if buf.push(c).is_err() {
                break;
            }
        }
        self.send(Report::Message {
            at,
            level,
            text: buf,
        });
    }
}
