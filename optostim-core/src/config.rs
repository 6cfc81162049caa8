//! Experiment parameter table
//!
//! An experiment is a fixed, ordered list of blocks. Each block carries a
//! duration and one [`ChannelParams`] per LED channel. The raw parameters
//! are what the experimenter writes; [`ChannelTiming`] is what the
//! scheduler actually runs on, derived once per block start.

use heapless::Vec;

use crate::time::{Micros, Millis, MAX_DEADLINE_MS, MAX_DEADLINE_US};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum blocks per experiment
pub const MAX_BLOCKS: usize = 16;

/// Fine clock units per second
const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// Coarse clock units per second
const MILLIS_PER_SECOND: f64 = 1_000.0;

/// Configuration errors
///
/// Raised when the parameter table is loaded and again if a block start
/// derives timing that cannot be scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Frequency is zero, negative or NaN
    NonPositiveFrequency,
    /// Period rounds to zero or exceeds the schedulable range
    PeriodOutOfRange,
    /// Pulse width is not shorter than the pulse period
    PulseWidthExceedsPeriod,
    /// Burst duration is not shorter than the burst period
    BurstDurationExceedsPeriod,
    /// Interval does not fit the clock's schedulable range
    IntervalTooLong,
    /// Block has zero duration
    ZeroBlockDuration,
    /// More blocks than [`MAX_BLOCKS`]
    TooManyBlocks,
}

impl ConfigError {
    /// Human-readable diagnostic
    pub const fn message(&self) -> &'static str {
        match self {
            ConfigError::NonPositiveFrequency => "frequency must be positive",
            ConfigError::PeriodOutOfRange => "period out of schedulable range",
            ConfigError::PulseWidthExceedsPeriod => "pulse width must be shorter than pulse period",
            ConfigError::BurstDurationExceedsPeriod => {
                "burst duration must be shorter than burst period"
            }
            ConfigError::IntervalTooLong => "interval too long to schedule",
            ConfigError::ZeroBlockDuration => "block duration must be non-zero",
            ConfigError::TooManyBlocks => "too many blocks",
        }
    }
}

/// A configuration error with the table position it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlanError {
    /// Block index
    pub block: usize,
    /// Channel index, if the error is channel-specific
    pub channel: Option<usize>,
    /// What was wrong
    pub error: ConfigError,
}

/// Per-block, per-channel stimulation parameters
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChannelParams {
    /// Pulse frequency inside a burst (Hz)
    pub pulse_frequency_hz: f32,
    /// LED on-time per pulse
    #[cfg_attr(feature = "serde", serde(rename = "pulse_width_us"))]
    pub pulse_width: Micros,
    /// Burst repetition frequency (Hz)
    pub burst_frequency_hz: f32,
    /// Length of each burst
    #[cfg_attr(feature = "serde", serde(rename = "burst_duration_ms"))]
    pub burst_duration: Millis,
}

/// One experiment block
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Block<const N: usize> {
    /// How long the block runs
    pub duration: Millis,
    /// Parameters for each channel
    pub channels: [ChannelParams; N],
}

/// Timing constants a channel runs on, derived from [`ChannelParams`]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelTiming {
    pub pulse_frequency_hz: f32,
    /// On-time per pulse
    pub pulse_width: Micros,
    /// Off-time per pulse (pulse period − pulse width)
    pub trigger_delay: Micros,
    pub burst_frequency_hz: f32,
    /// Active part of the burst cycle
    pub burst_duration: Millis,
    /// Silent gap between bursts (burst period − burst duration)
    pub burst_interim: Millis,
    /// `burst_interim` on the fine clock, for holding the pulse timer
    pub burst_interim_us: Micros,
}

impl ChannelTiming {
    /// Derive timing from raw parameters
    ///
    /// Pulse fields are derived before burst fields.
    pub fn derive(params: &ChannelParams) -> Result<Self, ConfigError> {
        let trigger_delay = calculate_trigger_delay(params.pulse_frequency_hz, params.pulse_width)?;
        let burst_interim =
            calculate_burst_interim(params.burst_frequency_hz, params.burst_duration)?;

        let burst_interim_us = burst_interim
            .to_micros()
            .filter(|us| us.as_u32() <= MAX_DEADLINE_US)
            .ok_or(ConfigError::IntervalTooLong)?;

        Ok(Self {
            pulse_frequency_hz: params.pulse_frequency_hz,
            pulse_width: params.pulse_width,
            trigger_delay,
            burst_frequency_hz: params.burst_frequency_hz,
            burst_duration: params.burst_duration,
            burst_interim,
            burst_interim_us,
        })
    }

    /// Full pulse period
    pub fn pulse_period(&self) -> Micros {
        Micros(self.pulse_width.as_u32() + self.trigger_delay.as_u32())
    }

    /// Full burst period
    pub fn burst_period(&self) -> Millis {
        Millis(self.burst_duration.as_u32() + self.burst_interim.as_u32())
    }
}

/// Round `units_per_second / freq_hz` to the nearest whole unit
fn period_in_units(freq_hz: f32, units_per_second: f64, max: u32) -> Result<u32, ConfigError> {
    // Written this way so NaN is rejected too
    if !(freq_hz > 0.0) {
        return Err(ConfigError::NonPositiveFrequency);
    }

    let period = units_per_second / freq_hz as f64 + 0.5;
    if !(period >= 1.0) || period > max as f64 {
        return Err(ConfigError::PeriodOutOfRange);
    }

    Ok(period as u32)
}

/// Pulse period for a frequency, in microseconds
pub fn pulse_period(freq_hz: f32) -> Result<Micros, ConfigError> {
    period_in_units(freq_hz, MICROS_PER_SECOND, MAX_DEADLINE_US).map(Micros)
}

/// Burst period for a frequency, in milliseconds
pub fn burst_period(freq_hz: f32) -> Result<Millis, ConfigError> {
    period_in_units(freq_hz, MILLIS_PER_SECOND, MAX_DEADLINE_MS).map(Millis)
}

/// Off-time of one pulse cycle
///
/// `trigger_delay = round(1 / freq in µs) − pulse_width`. Rejects
/// frequencies that cannot produce a period and widths that would leave
/// no (or negative) off-time.
pub fn calculate_trigger_delay(freq_hz: f32, pulse_width: Micros) -> Result<Micros, ConfigError> {
    let period = pulse_period(freq_hz)?;
    if pulse_width >= period {
        return Err(ConfigError::PulseWidthExceedsPeriod);
    }
    Ok(Micros(period.as_u32() - pulse_width.as_u32()))
}

/// Silent gap between bursts
pub fn calculate_burst_interim(
    freq_hz: f32,
    burst_duration: Millis,
) -> Result<Millis, ConfigError> {
    let period = burst_period(freq_hz)?;
    if burst_duration >= period {
        return Err(ConfigError::BurstDurationExceedsPeriod);
    }
    Ok(Millis(period.as_u32() - burst_duration.as_u32()))
}

/// Validated, immutable block sequence
#[derive(Debug, Clone)]
pub struct ExperimentPlan<const N: usize> {
    blocks: Vec<Block<N>, MAX_BLOCKS>,
}

impl<const N: usize> ExperimentPlan<N> {
    /// Load and validate a block table
    ///
    /// Every block must have a non-zero duration and every channel's
    /// parameters must derive. The first failure is returned with its
    /// position.
    pub fn new(blocks: &[Block<N>]) -> Result<Self, PlanError> {
        if blocks.len() > MAX_BLOCKS {
            return Err(PlanError {
                block: MAX_BLOCKS,
                channel: None,
                error: ConfigError::TooManyBlocks,
            });
        }

        let mut plan = Vec::new();
        for (block_index, block) in blocks.iter().enumerate() {
            validate_block(block_index, block)?;
            // Length checked above
            let _ = plan.push(*block);
        }

        Ok(Self { blocks: plan })
    }

    /// Number of blocks
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// True if the plan has no blocks
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Block at `index`
    pub fn block(&self, index: usize) -> Option<&Block<N>> {
        self.blocks.get(index)
    }

    /// Raw parameters for one channel in one block
    pub fn get(&self, block: usize, channel: usize) -> Option<&ChannelParams> {
        self.blocks.get(block)?.channels.get(channel)
    }

    /// Total planned duration of all blocks
    pub fn total_duration(&self) -> Millis {
        Millis(
            self.blocks
                .iter()
                .fold(0u32, |acc, b| acc.saturating_add(b.duration.as_u32())),
        )
    }
}

impl<const N: usize> Default for ExperimentPlan<N> {
    fn default() -> Self {
        Self { blocks: Vec::new() }
    }
}

fn validate_block<const N: usize>(index: usize, block: &Block<N>) -> Result<(), PlanError> {
    let duration_error = if block.duration == Millis::ZERO {
        Some(ConfigError::ZeroBlockDuration)
    } else if block.duration.as_u32() > MAX_DEADLINE_MS {
        Some(ConfigError::IntervalTooLong)
    } else {
        None
    };
    if let Some(error) = duration_error {
        return Err(PlanError {
            block: index,
            channel: None,
            error,
        });
    }

    for (channel, params) in block.channels.iter().enumerate() {
        ChannelTiming::derive(params).map_err(|error| PlanError {
            block: index,
            channel: Some(channel),
            error,
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn params(pulse_hz: f32, width_us: u32, burst_hz: f32, burst_ms: u32) -> ChannelParams {
        ChannelParams {
            pulse_frequency_hz: pulse_hz,
            pulse_width: Micros(width_us),
            burst_frequency_hz: burst_hz,
            burst_duration: Millis(burst_ms),
        }
    }

    #[test]
    fn test_trigger_delay_10hz_5ms() {
        assert_eq!(calculate_trigger_delay(10.0, Micros(5_000)), Ok(Micros(95_000)));
    }

    #[test]
    fn test_trigger_delay_rejects_bad_frequency() {
        assert_eq!(
            calculate_trigger_delay(0.0, Micros(5_000)),
            Err(ConfigError::NonPositiveFrequency)
        );
        assert_eq!(
            calculate_trigger_delay(-10.0, Micros(5_000)),
            Err(ConfigError::NonPositiveFrequency)
        );
        assert_eq!(
            calculate_trigger_delay(f32::NAN, Micros(5_000)),
            Err(ConfigError::NonPositiveFrequency)
        );
        assert_eq!(
            calculate_trigger_delay(f32::INFINITY, Micros(0)),
            Err(ConfigError::PeriodOutOfRange)
        );
    }

    #[test]
    fn test_trigger_delay_rejects_wide_pulse() {
        // 10 Hz = 100 ms period
        assert_eq!(
            calculate_trigger_delay(10.0, Micros(100_000)),
            Err(ConfigError::PulseWidthExceedsPeriod)
        );
        assert_eq!(
            calculate_trigger_delay(10.0, Micros(150_000)),
            Err(ConfigError::PulseWidthExceedsPeriod)
        );
    }

    #[test]
    fn test_burst_interim() {
        assert_eq!(calculate_burst_interim(0.1, Millis(1_000)), Ok(Millis(9_000)));
        assert_eq!(
            calculate_burst_interim(0.1, Millis(10_000)),
            Err(ConfigError::BurstDurationExceedsPeriod)
        );
    }

    #[test]
    fn test_slow_burst_rounds_to_nearest_ms() {
        // 1 / 0.0033 Hz = 303030.3 ms
        assert_eq!(burst_period(0.0033), Ok(Millis(303_030)));
        assert_eq!(
            calculate_burst_interim(0.0033, Millis(300_000)),
            Ok(Millis(3_030))
        );
    }

    #[test]
    fn test_derive_timing() {
        let timing = ChannelTiming::derive(&params(10.0, 5_000, 0.1, 1_000)).unwrap();
        assert_eq!(timing.trigger_delay, Micros(95_000));
        assert_eq!(timing.burst_interim, Millis(9_000));
        assert_eq!(timing.burst_interim_us, Micros(9_000_000));
        assert_eq!(timing.pulse_period(), Micros(100_000));
        assert_eq!(timing.burst_period(), Millis(10_000));
    }

    #[test]
    fn test_derive_rejects_interim_beyond_fine_clock() {
        // One burst an hour leaves ~3599 s of interim, past the ~2147 s limit
        let result = ChannelTiming::derive(&params(10.0, 5_000, 1.0 / 3600.0, 1_000));
        assert_eq!(result, Err(ConfigError::IntervalTooLong));
    }

    #[test]
    fn test_plan_reports_position() {
        let good = params(10.0, 5_000, 0.1, 1_000);
        let bad = params(10.0, 200_000, 0.1, 1_000);
        let blocks = [
            Block {
                duration: Millis(60_000),
                channels: [good, good],
            },
            Block {
                duration: Millis(60_000),
                channels: [good, bad],
            },
        ];

        let err = ExperimentPlan::new(&blocks).unwrap_err();
        assert_eq!(err.block, 1);
        assert_eq!(err.channel, Some(1));
        assert_eq!(err.error, ConfigError::PulseWidthExceedsPeriod);
    }

    #[test]
    fn test_plan_rejects_zero_duration() {
        let blocks = [Block {
            duration: Millis(0),
            channels: [params(10.0, 5_000, 0.1, 1_000)],
        }];
        let err = ExperimentPlan::new(&blocks).unwrap_err();
        assert_eq!(err.error, ConfigError::ZeroBlockDuration);
        assert_eq!(err.channel, None);
    }

    #[test]
    fn test_plan_too_many_blocks() {
        let block = Block {
            duration: Millis(1_000),
            channels: [params(10.0, 5_000, 0.1, 1_000)],
        };
        let blocks = [block; MAX_BLOCKS + 1];
        let err = ExperimentPlan::new(&blocks).unwrap_err();
        assert_eq!(err.error, ConfigError::TooManyBlocks);
    }

    #[test]
    fn test_plan_lookup() {
        let a = params(10.0, 5_000, 0.1, 1_000);
        let b = params(20.0, 2_000, 0.5, 500);
        let blocks = [
            Block {
                duration: Millis(1_000),
                channels: [a, b],
            },
            Block {
                duration: Millis(2_500),
                channels: [b, a],
            },
        ];
        let plan = ExperimentPlan::new(&blocks).unwrap();

        assert_eq!(plan.len(), 2);
        assert_eq!(plan.get(0, 1), Some(&b));
        assert_eq!(plan.get(1, 1), Some(&a));
        assert_eq!(plan.get(2, 0), None);
        assert_eq!(plan.get(0, 2), None);
        assert_eq!(plan.total_duration(), Millis(3_500));
    }

    proptest! {
        #[test]
        fn prop_trigger_delay_round_trip(freq in 0.5f32..5_000.0, fraction in 0.0f64..1.0) {
            let period = pulse_period(freq).unwrap();
            let expected = (1_000_000.0 / freq as f64 + 0.5) as u32;
            prop_assert_eq!(period.as_u32(), expected);

            let width = Micros((period.as_u32() as f64 * fraction) as u32);
            prop_assume!(width < period);

            let delay = calculate_trigger_delay(freq, width).unwrap();
            prop_assert_eq!(delay.as_u32() + width.as_u32(), period.as_u32());
        }

        #[test]
        fn prop_burst_interim_round_trip(freq in 0.001f32..50.0, fraction in 0.0f64..1.0) {
            let period = burst_period(freq).unwrap();
            let duration = Millis((period.as_u32() as f64 * fraction) as u32);
            prop_assume!(duration < period);

            let interim = calculate_burst_interim(freq, duration).unwrap();
            prop_assert_eq!(interim.as_u32() + duration.as_u32(), period.as_u32());
        }
    }
}
