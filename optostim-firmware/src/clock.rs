//! Embassy-backed scheduler clock

use embassy_time::Instant;
use optostim_core::{Clock, MsInstant, Timestamp, UsInstant};

/// Both scheduler clocks read from the embassy time driver
///
/// A single 64-bit reading feeds both counters so they never disagree.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> MsInstant {
        self.now().coarse
    }

    fn now_us(&self) -> UsInstant {
        self.now().fine
    }

    fn now(&self) -> Timestamp {
        Timestamp::from_micros(Instant::now().as_micros())
    }
}
