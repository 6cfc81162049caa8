//! Board pin map
//!
//! LED gates sit on consecutive GPIOs starting at GPIO4 and are driven
//! active-low, so every gate starts with its pin HIGH (LED off).

use embassy_rp::gpio::{Level, Output};
use embassy_rp::Peri;
use embassy_rp::peripherals::{
    PIN_10, PIN_11, PIN_12, PIN_13, PIN_14, PIN_15, PIN_4, PIN_5, PIN_6, PIN_7, PIN_8, PIN_9,
};
use heapless::Vec;

/// Gate pins available on the board
pub const MAX_GATES: usize = 12;

/// The board's gate pins, in channel order
pub struct GatePins {
    pub pin_4: Peri<'static, PIN_4>,
    pub pin_5: Peri<'static, PIN_5>,
    pub pin_6: Peri<'static, PIN_6>,
    pub pin_7: Peri<'static, PIN_7>,
    pub pin_8: Peri<'static, PIN_8>,
    pub pin_9: Peri<'static, PIN_9>,
    pub pin_10: Peri<'static, PIN_10>,
    pub pin_11: Peri<'static, PIN_11>,
    pub pin_12: Peri<'static, PIN_12>,
    pub pin_13: Peri<'static, PIN_13>,
    pub pin_14: Peri<'static, PIN_14>,
    pub pin_15: Peri<'static, PIN_15>,
}

impl GatePins {
    /// Configure the first `count` gates as outputs, LED off
    ///
    /// Gates past `count` are released again when their outputs drop.
    pub fn into_outputs(self, count: usize) -> Vec<Output<'static>, MAX_GATES> {
        let off = Level::High;
        let all = [
            Output::new(self.pin_4, off),
            Output::new(self.pin_5, off),
            Output::new(self.pin_6, off),
            Output::new(self.pin_7, off),
            Output::new(self.pin_8, off),
            Output::new(self.pin_9, off),
            Output::new(self.pin_10, off),
            Output::new(self.pin_11, off),
            Output::new(self.pin_12, off),
            Output::new(self.pin_13, off),
            Output::new(self.pin_14, off),
            Output::new(self.pin_15, off),
        ];
        all.into_iter().take(count).collect()
    }
}
