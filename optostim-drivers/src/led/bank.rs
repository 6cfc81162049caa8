//! Fixed bank of LED gates

use embedded_hal::digital::OutputPin;
use optostim_core::LedOutput;

use super::gpio::GpioLed;

/// `N` LED gates addressed by channel index
pub struct LedBank<P, const N: usize> {
    leds: [GpioLed<P>; N],
}

impl<P: OutputPin, const N: usize> LedBank<P, N> {
    /// Wrap already-initialized gates; channel `i` is `leds[i]`
    pub fn new(leds: [GpioLed<P>; N]) -> Self {
        Self { leds }
    }

    /// Build a bank of active-low gates, all OFF
    pub fn active_low(pins: [P; N]) -> Self {
        Self::new(pins.map(GpioLed::new_active_low))
    }

    /// Number of channels
    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Channels whose pin writes have failed
    pub fn faults(&self) -> impl Iterator<Item = usize> + '_ {
        self.leds
            .iter()
            .enumerate()
            .filter(|(_, led)| led.has_fault())
            .map(|(i, _)| i)
    }
}

impl<P: OutputPin, const N: usize> LedOutput for LedBank<P, N> {
    fn set_level(&mut self, channel: usize, on: bool) {
        // Unknown channels have no gate to drive
        if let Some(led) = self.leds.get_mut(channel) {
            led.set_on(on);
        }
    }

    fn level(&self, channel: usize) -> bool {
        self.leds.get(channel).is_some_and(|led| led.is_on())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;

    struct MockPin {
        high: bool,
    }

    impl ErrorType for MockPin {
        type Error = Infallible;
    }

    impl OutputPin for MockPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.high = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.high = true;
            Ok(())
        }
    }

    fn bank() -> LedBank<MockPin, 3> {
        LedBank::active_low([
            MockPin { high: false },
            MockPin { high: false },
            MockPin { high: false },
        ])
    }

    #[test]
    fn test_bank_starts_off() {
        let bank = bank();
        assert_eq!(bank.len(), 3);
        assert!((0..3).all(|i| !bank.level(i)));

        // Active-low: OFF means the pin is high
        let leds = bank.leds;
        assert!(leds.into_iter().all(|led| led.into_inner().high));
    }

    #[test]
    fn test_bank_drives_one_channel() {
        let mut bank = bank();
        bank.set_level(1, true);

        assert!(!bank.level(0));
        assert!(bank.level(1));
        assert!(!bank.level(2));
        assert_eq!(bank.faults().count(), 0);
    }

    #[test]
    fn test_bank_ignores_unknown_channel() {
        let mut bank = bank();
        bank.set_level(7, true);
        assert!(!bank.level(7));
        assert!((0..3).all(|i| !bank.level(i)));
    }

    #[test]
    fn test_bank_as_led_output() {
        fn flash<O: LedOutput>(output: &mut O) {
            output.set_level(0, true);
            output.set_level(0, false);
            output.set_level(2, true);
        }

        let mut bank = bank();
        flash(&mut bank);
        assert!(!bank.level(0));
        assert!(bank.level(2));
    }
}
