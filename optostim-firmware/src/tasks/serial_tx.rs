//! Host UART transmit task
//!
//! Formats queued reports into text lines and writes them out.

use defmt::*;
use embassy_rp::uart::BufferedUartTx;
use embedded_io_async::Write;

use optostim_protocol::{format_message, format_record};

use crate::channels::{Report, REPORT_CHANNEL};

/// Serial TX task - sends data records and log lines to the host
#[embassy_executor::task]
pub async fn serial_tx_task(mut tx: BufferedUartTx) {
    info!("Serial TX task started");

    loop {
        let line = match REPORT_CHANNEL.receive().await {
            Report::Event { at, record } => format_record(at, &record),
            Report::Message { at, level, text } => format_message(at, level, &text),
        };

        if let Err(e) = tx.write_all(line.as_bytes()).await {
            warn!("UART write error: {:?}", e);
        }
    }
}
