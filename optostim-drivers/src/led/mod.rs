//! LED gate outputs

pub mod bank;
pub mod gpio;

pub use bank::LedBank;
pub use gpio::GpioLed;
