//! Stimulation poll loop
//!
//! Pulse edges are scheduled in microseconds, so the loop never sleeps on
//! a timer: it applies pending commands, ticks the stimulator and yields
//! so the serial tasks can run between passes.

use defmt::*;
use embassy_futures::yield_now;
use embassy_rp::gpio::Output;

use optostim_core::Stimulator;
use optostim_drivers::led::LedBank;

use crate::channels::COMMAND_CHANNEL;
use crate::clock::EmbassyClock;
use crate::experiment::NUM_CHANNELS;
use crate::recorder::ChannelRecorder;

/// Gate outputs for the configured channels
pub type Gates = LedBank<Output<'static>, NUM_CHANNELS>;

/// The stimulator as wired on this board
pub type FirmwareStimulator = Stimulator<EmbassyClock, Gates, ChannelRecorder, NUM_CHANNELS>;

/// Stimulation task - owns the stimulator and polls it forever
#[embassy_executor::task]
pub async fn stimulation_task(mut stimulator: FirmwareStimulator) {
    info!("Stimulation task started");

    loop {
        while let Ok(command) = COMMAND_CHANNEL.try_receive() {
            debug!("Command: {:?}", command);
            if let Err(e) = command.apply(&mut stimulator) {
                warn!("Command {:?} rejected: {:?}", command, e);
            }
        }

        stimulator.tick();
        yield_now().await;
    }
}
