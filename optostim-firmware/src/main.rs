//! Optostim - LED Array Stimulation Firmware
//!
//! Drives an array of LEDs with per-channel pulse trains grouped into
//! bursts, stepping through a fixed table of experiment blocks. The host
//! controls the run over a line-based UART link and receives a
//! timestamped record of every state change.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::Output;
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use optostim_core::{ExperimentPlan, Stimulator};
use optostim_drivers::led::LedBank;

use crate::boards::GatePins;
use crate::clock::EmbassyClock;
use crate::experiment::{BLOCKS, NUM_CHANNELS};
use crate::recorder::ChannelRecorder;

mod boards;
mod channels;
mod clock;
mod experiment;
mod recorder;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 512]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Optostim firmware starting...");

    // Initialize RP2040 peripherals
    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Experiment table was checked at build time; this re-derives the
    // timing the scheduler runs on
    let plan = match ExperimentPlan::new(&BLOCKS) {
        Ok(plan) => plan,
        Err(e) => defmt::panic!("Invalid experiment table: {:?}", e),
    };
    info!(
        "Experiment loaded: {} channels, {} blocks, {} ms total",
        NUM_CHANNELS,
        plan.len(),
        plan.total_duration().as_u32()
    );

    // LED gates, all off
    let gates = GatePins {
        pin_4: p.PIN_4,
        pin_5: p.PIN_5,
        pin_6: p.PIN_6,
        pin_7: p.PIN_7,
        pin_8: p.PIN_8,
        pin_9: p.PIN_9,
        pin_10: p.PIN_10,
        pin_11: p.PIN_11,
        pin_12: p.PIN_12,
        pin_13: p.PIN_13,
        pin_14: p.PIN_14,
        pin_15: p.PIN_15,
    }
    .into_outputs(NUM_CHANNELS);
    let gates: [Output<'static>; NUM_CHANNELS] = unwrap!(gates.into_array().ok());
    let bank = LedBank::active_low(gates);
    if bank.faults().next().is_some() {
        defmt::panic!("LED gate initialization failed");
    }
    info!("LED gates initialized");

    let stimulator: tasks::FirmwareStimulator =
        Stimulator::new(EmbassyClock, bank, ChannelRecorder::new(), plan);

    // Setup UART for the host link
    let uart_config = UartConfig::default(); // 115200 baud default

    let tx_buf = TX_BUF.init([0u8; 512]);
    let rx_buf = RX_BUF.init([0u8; 64]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();

    info!("UART initialized for host communication");

    spawner.spawn(tasks::serial_tx_task(tx)).unwrap();
    spawner.spawn(tasks::serial_rx_task(rx)).unwrap();
    spawner.spawn(tasks::stimulation_task(stimulator)).unwrap();

    info!("All tasks spawned, waiting for commands");
}
