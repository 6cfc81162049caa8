//! Experiment table compiled in from experiment.toml

use optostim_core::{Block, ChannelParams, Micros, Millis};

include!(concat!(env!("OUT_DIR"), "/experiment.rs"));
