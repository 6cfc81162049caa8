//! Block sequencer and poll loop
//!
//! [`Stimulator`] owns every channel plus the experiment timeline. The
//! host calls [`Stimulator::tick`] on every pass of its main loop; each
//! tick takes one clock snapshot and then, in this order:
//!
//! 1. burst checks for all channels
//! 2. pulse checks for all channels
//! 3. the end-of-block check
//!
//! Burst checks run first so a burst starting on this tick has its first
//! pulse out in the same tick, and a burst ending on this tick silences
//! the channel before its pulse timer is looked at.

use core::fmt::Write;

use heapless::String;

use crate::channel::Channel;
use crate::config::{ChannelTiming, ExperimentPlan, PlanError};
use crate::record::{Level, Record};
use crate::time::{MsInstant, Timestamp};
use crate::traits::{Clock, EventRecorder, LedOutput};

/// Maximum diagnostic message length
const MESSAGE_LEN: usize = 64;

/// Sequencing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequenceError {
    /// Requested block does not exist
    BlockOutOfRange { index: usize, count: usize },
    /// Block parameters could not be turned into timing
    Config(PlanError),
    /// Operation not allowed while an experiment is running
    ExperimentActive,
}

impl From<PlanError> for SequenceError {
    fn from(e: PlanError) -> Self {
        SequenceError::Config(e)
    }
}

/// Experiment-wide state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ExperimentState {
    /// Block timeline is running
    pub active: bool,
    /// Channels run their timers without a block timeline
    pub manual_mode: bool,
    /// Current block; None before the first start. Equal to the block
    /// count once the experiment has run to completion.
    pub block_index: Option<usize>,
    /// When the current block ends
    pub block_end: MsInstant,
}

/// Coarse view of where the experiment is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExperimentPhase {
    /// Nothing running
    Idle,
    /// Block timeline running
    Running { block: usize },
    /// Manual mode
    Manual,
    /// Every block has run
    Finished,
}

/// Experiment driver for `N` LED channels
pub struct Stimulator<C, O, R, const N: usize> {
    clock: C,
    output: O,
    recorder: R,
    plan: ExperimentPlan<N>,
    channels: [Channel; N],
    state: ExperimentState,
}

impl<C, O, R, const N: usize> Stimulator<C, O, R, N>
where
    C: Clock,
    O: LedOutput,
    R: EventRecorder,
{
    /// Create a stimulator with all channels off
    pub fn new(clock: C, output: O, recorder: R, plan: ExperimentPlan<N>) -> Self {
        let mut stimulator = Self {
            clock,
            output,
            recorder,
            plan,
            channels: core::array::from_fn(|i| Channel::new(i as u8)),
            state: ExperimentState::default(),
        };

        let at = stimulator.clock.now_ms();
        for channel in stimulator.channels.iter_mut() {
            channel.halt(at, &mut stimulator.output, &mut stimulator.recorder);
        }
        stimulator
    }

    /// Experiment state
    pub fn state(&self) -> &ExperimentState {
        &self.state
    }

    /// Where the experiment is
    pub fn phase(&self) -> ExperimentPhase {
        if self.state.manual_mode {
            return ExperimentPhase::Manual;
        }
        if self.state.active {
            return ExperimentPhase::Running {
                block: self.state.block_index.unwrap_or(0),
            };
        }
        match self.state.block_index {
            Some(index) if index >= self.plan.len() => ExperimentPhase::Finished,
            _ => ExperimentPhase::Idle,
        }
    }

    /// Loaded block table
    pub fn plan(&self) -> &ExperimentPlan<N> {
        &self.plan
    }

    /// All channels
    pub fn channels(&self) -> &[Channel; N] {
        &self.channels
    }

    /// One channel
    pub fn channel(&self, index: usize) -> Option<&Channel> {
        self.channels.get(index)
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn recorder(&self) -> &R {
        &self.recorder
    }

    pub fn recorder_mut(&mut self) -> &mut R {
        &mut self.recorder
    }

    /// Start the experiment from the first block
    pub fn run_stimulation(&mut self) {
        let now = self.clock.now();

        self.message(now.coarse, Level::Debug, "starting stimulation");
        self.state.active = true;
        self.state.manual_mode = false;
        self.state.block_index = None;
        self.recorder.record_event(now.coarse, Record::ExperimentStart);

        self.advance_block(now);
    }

    /// Stop everything and switch all channels off
    ///
    /// Safe to call repeatedly. The block index is kept so the final
    /// position stays inspectable.
    pub fn stop_stimulation(&mut self) {
        let now = self.clock.now();
        self.stop_at(now.coarse);
    }

    /// Move to the block after the current one, or finish
    pub fn start_next_block(&mut self) {
        let now = self.clock.now();
        self.advance_block(now);
    }

    /// Start a specific block
    ///
    /// An out-of-range index is a no-op with a diagnostic. Outside manual
    /// mode this also makes the experiment active, so the block timeline
    /// runs from here.
    pub fn start_block(&mut self, index: usize) -> Result<(), SequenceError> {
        let now = self.clock.now();
        self.start_block_at(index, now)
    }

    /// Run every channel's timers without a block timeline
    ///
    /// Uses the first block's parameters. Rejected while an experiment is
    /// running.
    pub fn enter_manual_mode(&mut self) -> Result<(), SequenceError> {
        let now = self.clock.now();

        if self.state.active {
            self.message(now.coarse, Level::Error, "manual mode refused: experiment running");
            return Err(SequenceError::ExperimentActive);
        }

        self.state.manual_mode = true;
        self.recorder.record_event(now.coarse, Record::ManualMode);

        if let Err(e) = self.start_block_at(0, now) {
            self.state.manual_mode = false;
            return Err(e);
        }
        Ok(())
    }

    /// Switch every LED on, outside of any schedule
    pub fn all_on(&mut self) -> Result<(), SequenceError> {
        self.force_all(true)
    }

    /// Switch every LED off, outside of any schedule
    pub fn all_off(&mut self) -> Result<(), SequenceError> {
        self.force_all(false)
    }

    /// Poll entry point
    ///
    /// Reads the clock once and processes every due event. Never blocks.
    pub fn tick(&mut self) {
        let now = self.clock.now();
        self.check_burst_events(now);
        self.check_pulse_events(now);
        self.check_block_end(now);
    }

    /// Flip every channel whose burst deadline has passed
    pub fn check_burst_events(&mut self, now: Timestamp) {
        if !(self.state.active || self.state.manual_mode) {
            return;
        }

        for channel in self.channels.iter_mut() {
            if channel.burst_due(now.coarse) {
                channel.toggle_burst_state(now, &mut self.output, &mut self.recorder);
            }
        }
    }

    /// Flip every eligible channel whose pulse deadline has passed
    ///
    /// A channel's pulse train only advances inside a burst. Manual mode
    /// overrides the burst gate.
    pub fn check_pulse_events(&mut self, now: Timestamp) {
        let manual = self.state.manual_mode;
        let active = self.state.active;

        for channel in self.channels.iter_mut() {
            let eligible = manual || (active && channel.is_bursting());
            if eligible && channel.pulse_due(now.fine) {
                channel.toggle_pulse(now, &mut self.output, &mut self.recorder);
            }
        }
    }

    /// Advance the timeline if the current block has run out
    pub fn check_block_end(&mut self, now: Timestamp) {
        if !self.state.active || self.state.block_index.is_none() {
            return;
        }

        if now.coarse.has_reached(self.state.block_end) {
            self.advance_block(now);
        }
    }

    fn advance_block(&mut self, now: Timestamp) {
        let next = self.state.block_index.map_or(0, |i| i + 1);
        self.state.block_index = Some(next);

        if next >= self.plan.len() {
            self.message(now.coarse, Level::Log, "all blocks complete");
            self.stop_at(now.coarse);
            return;
        }

        if self.start_block_at(next, now).is_err() {
            self.stop_at(now.coarse);
        }
    }

    fn start_block_at(&mut self, index: usize, now: Timestamp) -> Result<(), SequenceError> {
        let count = self.plan.len();
        let Some(block) = self.plan.block(index).copied() else {
            let mut msg: String<MESSAGE_LEN> = String::new();
            let _ = write!(msg, "block {} out of range ({} blocks)", index, count);
            self.message(now.coarse, Level::Error, &msg);
            return Err(SequenceError::BlockOutOfRange { index, count });
        };

        // Derive everything before touching any channel
        let mut timings: [Option<ChannelTiming>; N] = [None; N];
        for (channel, (slot, params)) in timings.iter_mut().zip(block.channels.iter()).enumerate()
        {
            match ChannelTiming::derive(params) {
                Ok(timing) => *slot = Some(timing),
                Err(error) => {
                    let mut msg: String<MESSAGE_LEN> = String::new();
                    let _ = write!(
                        msg,
                        "block {} channel {}: {}",
                        index,
                        channel,
                        error.message()
                    );
                    self.message(now.coarse, Level::Error, &msg);
                    return Err(PlanError {
                        block: index,
                        channel: Some(channel),
                        error,
                    }
                    .into());
                }
            }
        }

        if !self.state.manual_mode {
            self.state.active = true;
        }
        self.state.block_index = Some(index);
        self.state.block_end = now.coarse.after(block.duration);
        self.recorder.record_event(
            now.coarse,
            Record::BlockStart {
                index: index as u8,
                duration: block.duration,
            },
        );

        for (channel, timing) in self.channels.iter_mut().zip(timings) {
            let Some(timing) = timing else {
                continue;
            };
            channel.configure(timing);
            channel.schedule_next_burst_event(now.coarse);
            channel.start_bursting(now, &mut self.output, &mut self.recorder);
        }

        Ok(())
    }

    fn stop_at(&mut self, at: MsInstant) {
        let was_running = self.state.active || self.state.manual_mode;
        self.state.active = false;
        self.state.manual_mode = false;

        for channel in self.channels.iter_mut() {
            channel.halt(at, &mut self.output, &mut self.recorder);
        }

        if was_running {
            self.recorder.record_event(at, Record::ExperimentStop);
            self.message(at, Level::Log, "stimulation stopped");
        }
    }

    fn force_all(&mut self, on: bool) -> Result<(), SequenceError> {
        let at = self.clock.now_ms();

        if self.state.active {
            self.message(at, Level::Error, "refused: experiment running");
            return Err(SequenceError::ExperimentActive);
        }

        // A static level replaces any manual-mode timers
        self.state.manual_mode = false;
        for channel in self.channels.iter_mut() {
            channel.force(on, at, &mut self.output, &mut self.recorder);
        }
        Ok(())
    }

    fn message(&mut self, at: MsInstant, level: Level, text: &str) {
        self.recorder.record_message(at, level, text);
    }
}
