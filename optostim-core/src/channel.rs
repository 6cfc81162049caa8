//! Channel aggregate
//!
//! One [`Channel`] per LED output. It owns both timers:
//!
//! ```text
//! Pulse:  OFF --(pulse width)--> ON --(trigger delay)--> OFF ...
//! Burst:  IDLE --(burst interim)--> ACTIVE --(burst duration)--> IDLE ...
//! ```
//!
//! The two machines are coupled: entering a burst forces the pulse ON,
//! leaving a burst forces it OFF and holds the pulse timer for the whole
//! interim. Pulse deadlines live on the fine clock, burst deadlines on
//! the coarse clock.
//!
//! Both `schedule_*` operations look at the state the channel is about to
//! *leave* and pick the duration of the state it is about to *enter*, so
//! they must run before the flip.

use crate::config::ChannelTiming;
use crate::record::Record;
use crate::time::{MsInstant, Timestamp, UsInstant};
use crate::traits::{EventRecorder, LedOutput};

/// Scheduling state for one LED channel
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Channel {
    index: u8,
    /// LED energized
    is_on: bool,
    /// Inside a burst (as opposed to the inter-burst gap)
    is_bursting: bool,
    next_pulse_event: UsInstant,
    next_burst_event: MsInstant,
    /// None until the first block configures the channel
    timing: Option<ChannelTiming>,
}

impl Channel {
    /// Create an unconfigured, idle channel
    pub const fn new(index: u8) -> Self {
        Self {
            index,
            is_on: false,
            is_bursting: false,
            next_pulse_event: UsInstant(0),
            next_burst_event: MsInstant(0),
            timing: None,
        }
    }

    /// Output index
    pub fn index(&self) -> usize {
        self.index as usize
    }

    /// LED currently energized
    pub fn is_on(&self) -> bool {
        self.is_on
    }

    /// Currently inside a burst
    pub fn is_bursting(&self) -> bool {
        self.is_bursting
    }

    /// Deadline for the next pulse flip
    pub fn next_pulse_event(&self) -> UsInstant {
        self.next_pulse_event
    }

    /// Deadline for the next burst flip
    pub fn next_burst_event(&self) -> MsInstant {
        self.next_burst_event
    }

    /// Timing the channel is running on
    pub fn timing(&self) -> Option<&ChannelTiming> {
        self.timing.as_ref()
    }

    /// Load new timing constants
    ///
    /// Leaves the channel outside any burst; the caller starts the first
    /// burst. The LED level is not touched.
    pub fn configure(&mut self, timing: ChannelTiming) {
        self.timing = Some(timing);
        self.is_bursting = false;
    }

    /// Pulse deadline has passed and the channel can act on it
    pub fn pulse_due(&self, now: UsInstant) -> bool {
        self.timing.is_some() && now.has_reached(self.next_pulse_event)
    }

    /// Burst deadline has passed and the channel can act on it
    pub fn burst_due(&self, now: MsInstant) -> bool {
        self.timing.is_some() && now.has_reached(self.next_burst_event)
    }

    /// Set the next pulse deadline for the state about to be entered
    ///
    /// ON now means OFF next, so the off-time (trigger delay) applies;
    /// OFF now means the pulse width applies.
    pub fn schedule_next_pulse_event(&mut self, now: UsInstant) {
        let Some(timing) = self.timing else {
            return;
        };

        let delay = if self.is_on {
            timing.trigger_delay
        } else {
            timing.pulse_width
        };
        self.next_pulse_event = now.after(delay);
    }

    /// Flip the pulse state
    pub fn toggle_pulse<O, R>(&mut self, now: Timestamp, output: &mut O, recorder: &mut R)
    where
        O: LedOutput,
        R: EventRecorder,
    {
        if self.timing.is_none() {
            return;
        }

        self.schedule_next_pulse_event(now.fine);
        self.drive(!self.is_on, now.coarse, output, recorder);
    }

    /// Set the next burst deadline for the state about to be entered
    ///
    /// Bursting now means the gap comes next, so the interim applies;
    /// idle now means the burst duration applies.
    pub fn schedule_next_burst_event(&mut self, now: MsInstant) {
        let Some(timing) = self.timing else {
            return;
        };

        let delay = if self.is_bursting {
            timing.burst_interim
        } else {
            timing.burst_duration
        };
        self.next_burst_event = now.after(delay);
    }

    /// Flip the burst state
    pub fn toggle_burst_state<O, R>(&mut self, now: Timestamp, output: &mut O, recorder: &mut R)
    where
        O: LedOutput,
        R: EventRecorder,
    {
        if self.timing.is_none() {
            return;
        }

        self.schedule_next_burst_event(now.coarse);
        if self.is_bursting {
            self.stop_bursting(now, output, recorder);
        } else {
            self.start_bursting(now, output, recorder);
        }
    }

    /// Enter a burst: the first pulse goes ON immediately
    ///
    /// Does not schedule the burst deadline; callers schedule it first.
    pub fn start_bursting<O, R>(&mut self, now: Timestamp, output: &mut O, recorder: &mut R)
    where
        O: LedOutput,
        R: EventRecorder,
    {
        let Some(timing) = self.timing else {
            return;
        };

        self.is_bursting = true;
        recorder.record_event(now.coarse, Record::BurstStart { channel: self.index });

        self.next_pulse_event = now.fine.after(timing.pulse_width);
        self.drive(true, now.coarse, output, recorder);
    }

    /// Leave a burst: LED OFF and the pulse timer held for the interim
    ///
    /// The pulse deadline is pushed out by the burst interim instead of
    /// the trigger delay, so the pulse train stays silent for the whole
    /// gap even when it is not gated by the burst state.
    pub fn stop_bursting<O, R>(&mut self, now: Timestamp, output: &mut O, recorder: &mut R)
    where
        O: LedOutput,
        R: EventRecorder,
    {
        let Some(timing) = self.timing else {
            return;
        };

        self.next_pulse_event = now.fine.after(timing.burst_interim_us);
        self.drive(false, now.coarse, output, recorder);

        self.is_bursting = false;
        recorder.record_event(now.coarse, Record::BurstStop { channel: self.index });
    }

    /// Stop all activity: LED OFF, no burst
    pub fn halt<O, R>(&mut self, at: MsInstant, output: &mut O, recorder: &mut R)
    where
        O: LedOutput,
        R: EventRecorder,
    {
        self.is_bursting = false;
        self.drive(false, at, output, recorder);
    }

    /// Drive the LED to a fixed level outside of any schedule
    pub fn force<O, R>(&mut self, on: bool, at: MsInstant, output: &mut O, recorder: &mut R)
    where
        O: LedOutput,
        R: EventRecorder,
    {
        self.is_bursting = false;
        self.drive(on, at, output, recorder);
    }

    /// Write the level and record it if it changed
    ///
    /// The output is always written so a forced level is re-asserted.
    fn drive<O, R>(&mut self, on: bool, at: MsInstant, output: &mut O, recorder: &mut R)
    where
        O: LedOutput,
        R: EventRecorder,
    {
        let changed = self.is_on != on;
        self.is_on = on;
        output.set_level(self.index(), on);

        if changed {
            recorder.record_event(at, Record::Led { channel: self.index, on });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChannelParams;
    use crate::record::Level;
    use crate::time::{Micros, Millis};
    use heapless::Vec;

    struct MockOutput {
        levels: [bool; 1],
        writes: usize,
    }

    impl LedOutput for MockOutput {
        fn set_level(&mut self, channel: usize, on: bool) {
            self.levels[channel] = on;
            self.writes += 1;
        }

        fn level(&self, channel: usize) -> bool {
            self.levels[channel]
        }
    }

    #[derive(Default)]
    struct MockRecorder {
        events: Vec<(MsInstant, Record), 64>,
    }

    impl EventRecorder for MockRecorder {
        fn record_event(&mut self, at: MsInstant, record: Record) {
            let _ = self.events.push((at, record));
        }

        fn record_message(&mut self, _at: MsInstant, _level: Level, _text: &str) {}
    }

    impl MockRecorder {
        fn led_events(&self) -> Vec<(u32, bool), 64> {
            self.events
                .iter()
                .filter_map(|(at, rec)| match rec {
                    Record::Led { on, .. } => Some((at.0, *on)),
                    _ => None,
                })
                .collect()
        }
    }

    fn at_ms(ms: u64) -> Timestamp {
        Timestamp::from_micros(ms * 1_000)
    }

    fn timing_10hz() -> ChannelTiming {
        ChannelTiming::derive(&ChannelParams {
            pulse_frequency_hz: 10.0,
            pulse_width: Micros(5_000),
            burst_frequency_hz: 0.1,
            burst_duration: Millis(1_000),
        })
        .unwrap()
    }

    fn started_channel(
        output: &mut MockOutput,
        recorder: &mut MockRecorder,
    ) -> Channel {
        let mut channel = Channel::new(0);
        channel.configure(timing_10hz());
        channel.schedule_next_burst_event(at_ms(0).coarse);
        channel.start_bursting(at_ms(0), output, recorder);
        channel
    }

    #[test]
    fn test_unconfigured_channel_is_inert() {
        let mut output = MockOutput {
            levels: [false],
            writes: 0,
        };
        let mut recorder = MockRecorder::default();
        let mut channel = Channel::new(0);

        assert!(!channel.pulse_due(UsInstant(1_000_000)));
        assert!(!channel.burst_due(MsInstant(1_000)));

        channel.toggle_pulse(at_ms(10), &mut output, &mut recorder);
        channel.toggle_burst_state(at_ms(10), &mut output, &mut recorder);

        assert!(!channel.is_on());
        assert_eq!(output.writes, 0);
        assert!(recorder.events.is_empty());
    }

    #[test]
    fn test_start_bursting_forces_pulse_on() {
        let mut output = MockOutput {
            levels: [false],
            writes: 0,
        };
        let mut recorder = MockRecorder::default();
        let channel = started_channel(&mut output, &mut recorder);

        assert!(channel.is_bursting());
        assert!(channel.is_on());
        assert!(output.levels[0]);
        assert_eq!(channel.next_pulse_event(), UsInstant(5_000));
        assert_eq!(channel.next_burst_event(), MsInstant(1_000));
    }

    #[test]
    fn test_pulse_train_10hz_5ms() {
        let mut output = MockOutput {
            levels: [false],
            writes: 0,
        };
        let mut recorder = MockRecorder::default();
        let mut channel = started_channel(&mut output, &mut recorder);

        for ms in [5, 50, 100] {
            let now = at_ms(ms);
            if channel.pulse_due(now.fine) {
                channel.toggle_pulse(now, &mut output, &mut recorder);
            }
        }

        assert_eq!(
            recorder.led_events().as_slice(),
            &[(0, true), (5, false), (100, true)]
        );
        assert_eq!(channel.next_pulse_event(), UsInstant(105_000));
    }

    #[test]
    fn test_stop_bursting_holds_pulse_for_interim() {
        let mut output = MockOutput {
            levels: [false],
            writes: 0,
        };
        let mut recorder = MockRecorder::default();
        let mut channel = started_channel(&mut output, &mut recorder);

        let now = at_ms(1_000);
        assert!(channel.burst_due(now.coarse));
        channel.toggle_burst_state(now, &mut output, &mut recorder);

        assert!(!channel.is_bursting());
        assert!(!channel.is_on());
        assert!(!output.levels[0]);
        // Re-armed for the end of the gap, not the next pulse cycle
        assert_eq!(channel.next_pulse_event(), UsInstant(10_000_000));
        assert_eq!(channel.next_burst_event(), MsInstant(10_000));

        let now = at_ms(10_000);
        channel.toggle_burst_state(now, &mut output, &mut recorder);
        assert!(channel.is_bursting());
        assert!(channel.is_on());
        assert_eq!(channel.next_burst_event(), MsInstant(11_000));
        assert_eq!(channel.next_pulse_event(), UsInstant(10_005_000));
    }

    #[test]
    fn test_halt_is_idempotent() {
        let mut output = MockOutput {
            levels: [false],
            writes: 0,
        };
        let mut recorder = MockRecorder::default();
        let mut channel = started_channel(&mut output, &mut recorder);

        channel.halt(MsInstant(3), &mut output, &mut recorder);
        channel.halt(MsInstant(4), &mut output, &mut recorder);

        assert!(!channel.is_on());
        assert!(!channel.is_bursting());
        // Only the first halt changed the level
        assert_eq!(recorder.led_events().as_slice(), &[(0, true), (3, false)]);
    }

    #[test]
    fn test_pulse_deadline_across_fine_wrap() {
        let mut output = MockOutput {
            levels: [false],
            writes: 0,
        };
        let mut recorder = MockRecorder::default();
        let mut channel = Channel::new(0);
        channel.configure(timing_10hz());

        // 2 ms before the microsecond counter wraps
        let start = Timestamp::from_micros(u32::MAX as u64 + 1 - 2_000);
        channel.schedule_next_burst_event(start.coarse);
        channel.start_bursting(start, &mut output, &mut recorder);
        assert_eq!(channel.next_pulse_event(), UsInstant(3_000));

        let before = Timestamp::from_micros(u32::MAX as u64);
        assert!(!channel.pulse_due(before.fine));

        let after = Timestamp::from_micros(u32::MAX as u64 + 1 + 3_000);
        assert!(channel.pulse_due(after.fine));
        channel.toggle_pulse(after, &mut output, &mut recorder);
        assert!(!channel.is_on());
    }
}
