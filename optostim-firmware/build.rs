//! Build script for optostim-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates experiment.toml and compiles it into the firmware

use std::env;
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use optostim_core::config::MAX_BLOCKS;
use optostim_core::time::MAX_DEADLINE_MS;
use optostim_core::{ChannelParams, ChannelTiming};
use serde::Deserialize;

/// Gate pins available on the board
const MAX_CHANNELS: usize = 12;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExperimentFile {
    channels: usize,
    #[serde(default)]
    block: Vec<BlockFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BlockFile {
    duration_ms: u32,
    channel: Vec<ChannelParams>,
}

fn main() {
    setup_linker();
    let experiment = load_experiment();
    validate_experiment(&experiment);
    generate_experiment(&experiment);
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = out_dir();

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).expect("create memory.x");
    f.write_all(memory_x).expect("write memory.x");

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

fn out_dir() -> PathBuf {
    PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"))
}

/// Read and parse experiment.toml
fn load_experiment() -> ExperimentFile {
    println!("cargo:rerun-if-changed=experiment.toml");

    let path = Path::new("experiment.toml");
    if !path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: experiment.toml not found!                               ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires an experiment.toml parameter table.       ║\n\
            ║  Please create one in the optostim-firmware directory.           ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read experiment.toml                           ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    match toml::from_str(&content) {
        Ok(experiment) => experiment,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid experiment.toml                                  ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&e.to_string())
            );
        }
    }
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.chars().count() > 64 {
                format!("{}...", line.chars().take(61).collect::<String>())
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Check the table against everything the scheduler will need at runtime
fn validate_experiment(experiment: &ExperimentFile) {
    let mut errors = Vec::new();

    if experiment.channels == 0 || experiment.channels > MAX_CHANNELS {
        errors.push(format!("channels must be 1-{}", MAX_CHANNELS));
    }
    if experiment.block.len() > MAX_BLOCKS {
        errors.push(format!("at most {} blocks are supported", MAX_BLOCKS));
    }
    if experiment.block.is_empty() {
        println!("cargo:warning=experiment.toml has no [[block]] entries");
    }

    for (index, block) in experiment.block.iter().enumerate() {
        if block.duration_ms == 0 {
            errors.push(format!("block {}: duration_ms must be non-zero", index));
        } else if block.duration_ms > MAX_DEADLINE_MS {
            errors.push(format!(
                "block {}: duration_ms must be at most {}",
                index, MAX_DEADLINE_MS
            ));
        }

        if block.channel.len() != experiment.channels {
            errors.push(format!(
                "block {}: has {} channel entries, expected {}",
                index,
                block.channel.len(),
                experiment.channels
            ));
        }

        for (channel, params) in block.channel.iter().enumerate() {
            if let Err(e) = ChannelTiming::derive(params) {
                errors.push(format!(
                    "block {} channel {}: {}",
                    index,
                    channel,
                    e.message()
                ));
            }
        }
    }

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid experiment configuration                         ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!(
        "cargo:warning=experiment.toml validated: {} channels, {} blocks",
        experiment.channels,
        experiment.block.len()
    );
}

/// Write `experiment.rs` into OUT_DIR
fn generate_experiment(experiment: &ExperimentFile) {
    let mut code = String::new();
    code.push_str("// Generated from experiment.toml by build.rs\n\n");
    let _ = writeln!(code, "pub const NUM_CHANNELS: usize = {};", experiment.channels);
    let _ = writeln!(
        code,
        "pub static BLOCKS: [Block<NUM_CHANNELS>; {}] = [",
        experiment.block.len()
    );

    for block in &experiment.block {
        let _ = writeln!(code, "    Block {{");
        let _ = writeln!(code, "        duration: Millis({}),", block.duration_ms);
        let _ = writeln!(code, "        channels: [");
        for params in &block.channel {
            let _ = writeln!(
                code,
                "            ChannelParams {{ \
                 pulse_frequency_hz: {:?}_f32, \
                 pulse_width: Micros({}), \
                 burst_frequency_hz: {:?}_f32, \
                 burst_duration: Millis({}) }},",
                params.pulse_frequency_hz,
                params.pulse_width.as_u32(),
                params.burst_frequency_hz,
                params.burst_duration.as_u32()
            );
        }
        let _ = writeln!(code, "        ],");
        let _ = writeln!(code, "    }},");
    }
    code.push_str("];\n");

    let path = out_dir().join("experiment.rs");
    fs::write(&path, code).expect("write experiment.rs");
}
