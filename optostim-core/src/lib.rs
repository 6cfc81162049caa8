//! Board-agnostic core logic for the optostim LED array
//!
//! This crate contains everything that decides *when* an LED channel
//! changes level, without touching hardware:
//!
//! - Wrapping time types and the clock abstraction
//! - Experiment parameter table (blocks × channels) and derived timing
//! - Channel aggregate owning the pulse timer and the burst timer
//! - Block sequencer driving the experiment timeline
//! - Collaborator traits for LED output and event recording

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod channel;
pub mod config;
pub mod record;
pub mod sequencer;
pub mod time;
pub mod traits;

pub use channel::Channel;
pub use config::{Block, ChannelParams, ChannelTiming, ConfigError, ExperimentPlan, PlanError};
pub use record::{Level, Record};
pub use sequencer::{ExperimentPhase, ExperimentState, SequenceError, Stimulator};
pub use time::{Micros, Millis, MsInstant, Timestamp, UsInstant};
pub use traits::{Clock, EventRecorder, LedOutput, NullRecorder};
