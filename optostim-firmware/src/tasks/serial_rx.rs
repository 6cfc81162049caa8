//! Host UART receive task
//!
//! Assembles command lines, parses them and hands them to the
//! stimulation loop. Rejected input is reported back to the host.

use core::fmt::Write;

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;
use heapless::String;

use optostim_core::{Clock, Level};
use optostim_protocol::{Command, CommandError, LineBuffer};

use crate::channels::{Report, COMMAND_CHANNEL, REPORT_CHANNEL, REPORT_TEXT_LEN};
use crate::clock::EmbassyClock;

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

/// Serial RX task - receives and parses host commands
#[embassy_executor::task]
pub async fn serial_rx_task(mut rx: BufferedUartRx) {
    info!("Serial RX task started");

    let mut lines = LineBuffer::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) => {
                for &byte in &buf[..n] {
                    match lines.feed(byte) {
                        Ok(Some(line)) => handle_line(&line),
                        Ok(None) => {}
                        Err(e) => reject(e, ""),
                    }
                }
            }
            Err(e) => {
                warn!("UART read error: {:?}", e);
            }
        }
    }
}

/// Parse one line and queue the command
fn handle_line(line: &str) {
    match Command::parse(line) {
        Ok(command) => {
            if COMMAND_CHANNEL.try_send(command).is_err() {
                warn!("Command channel full, dropping {:?}", command);
                report_error(format_args!("busy, dropped \"{}\"", line));
            }
        }
        Err(e) => reject(e, line),
    }
}

fn reject(error: CommandError, line: &str) {
    warn!("Rejected input: {:?}", error);
    if line.is_empty() {
        report_error(format_args!("{}", error.message()));
    } else {
        report_error(format_args!("{}: \"{}\"", error.message(), line));
    }
}

fn report_error(args: core::fmt::Arguments<'_>) {
    let mut text: String<REPORT_TEXT_LEN> = String::new();
    // Truncated if too long
    let _ = text.write_fmt(args);

    let report = Report::Message {
        at: EmbassyClock.now_ms(),
        level: Level::Error,
        text,
    };
    if REPORT_CHANNEL.try_send(report).is_err() {
        warn!("Report channel full, dropping error report");
    }
}
