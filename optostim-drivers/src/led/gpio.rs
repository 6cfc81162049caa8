//! GPIO LED gate
//!
//! Each LED driver stage is switched by one GPIO pin. The array boards
//! gate the drivers active-low, so that is the default.

use embedded_hal::digital::OutputPin;

/// One LED gate on a GPIO pin
pub struct GpioLed<P> {
    pin: P,
    /// If true, LED ON = pin LOW
    active_low: bool,
    /// Current logical state (true = LED on)
    on: bool,
    /// Latched once a pin write fails
    fault: bool,
}

impl<P: OutputPin> GpioLed<P> {
    /// Create a gate and drive it to OFF
    pub fn new(pin: P, active_low: bool) -> Self {
        let mut led = Self {
            pin,
            active_low,
            on: false,
            fault: false,
        };
        led.set_on(false);
        led
    }

    /// Gate that is ON when the pin is LOW
    pub fn new_active_low(pin: P) -> Self {
        Self::new(pin, true)
    }

    /// Gate that is ON when the pin is HIGH
    pub fn new_active_high(pin: P) -> Self {
        Self::new(pin, false)
    }

    /// Drive the gate
    ///
    /// Writes the pin every time, so repeating a level re-asserts it.
    pub fn set_on(&mut self, on: bool) {
        self.on = on;

        let result = if on != self.active_low {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        if result.is_err() {
            self.fault = true;
        }
    }

    /// Logical LED state
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// A pin write has failed since creation
    pub fn has_fault(&self) -> bool {
        self.fault
    }

    /// Release the pin
    pub fn into_inner(self) -> P {
        self.pin
    }
}
