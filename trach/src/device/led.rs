use std::time::{Duration, Instant};

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::digital::v2::OutputPin;

use crate::Error;

/// An active high LED. The driver remembers what it last wrote instead of
/// reading the line back.
pub struct Led<P> {
    pin: P,
    lit: bool,
}

impl<P, E> Led<P>
where
    P: OutputPin<Error = E>,
{
    /// Drives the line low so the LED starts dark.
    pub fn new(pin: P) -> Result<Self, Error<E>> {
        let mut led = Self { pin, lit: false };
        led.off()?;
        Ok(led)
    }

    pub fn on(&mut self) -> Result<(), Error<E>> {
        self.pin.set_high()?;
        self.lit = true;
        Ok(())
    }

    pub fn off(&mut self) -> Result<(), Error<E>> {
        self.pin.set_low()?;
        self.lit = false;
        Ok(())
    }

    pub fn toggle(&mut self) -> Result<(), Error<E>> {
        if self.lit {
            self.off()
        } else {
            self.on()
        }
    }

    pub fn is_on(&self) -> bool {
        self.lit
    }

    /// On for `rate`, off for `rate`, until `duration` has passed. Always
    /// finishes a started cycle, so the LED ends dark.
    pub fn blink<D: DelayMs<u32>>(
        &mut self,
        delay: &mut D,
        duration: Duration,
        rate: Duration,
    ) -> Result<(), Error<E>> {
        let rate_ms = rate.as_millis().min(u32::MAX as u128) as u32;
        let start = Instant::now();
        while start.elapsed() < duration {
            self.on()?;
            delay.delay_ms(rate_ms);
            self.off()?;
            delay.delay_ms(rate_ms);
        }
        Ok(())
    }

    pub fn release(self) -> P {
        self.pin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::delay::MockNoop;
    use embedded_hal_mock::pin::{Mock as PinMock, State, Transaction};

    #[test]
    fn starts_off_and_toggles() {
        let mut led = Led::new(PinMock::new(&[
            Transaction::set(State::Low),
            Transaction::set(State::High),
            Transaction::set(State::Low),
        ]))
        .unwrap();
        assert!(!led.is_on());
        led.toggle().unwrap();
        assert!(led.is_on());
        led.toggle().unwrap();
        assert!(!led.is_on());
        led.release().done();
    }

    #[test]
    fn zero_duration_blink_does_nothing() {
        let mut led = Led::new(PinMock::new(&[Transaction::set(State::Low)])).unwrap();
        led.blink(&mut MockNoop::new(), Duration::ZERO, Duration::from_millis(100))
            .unwrap();
        assert!(!led.is_on());
        led.release().done();
    }

    /// Keeps every level driven, in order.
    #[derive(Default)]
    struct Levels(Vec<bool>);

    impl OutputPin for Levels {
        type Error = core::convert::Infallible;

        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.0.push(false);
            Ok(())
        }
        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.0.push(true);
            Ok(())
        }
    }

    struct Sleep;

    impl DelayMs<u32> for Sleep {
        fn delay_ms(&mut self, ms: u32) {
            std::thread::sleep(Duration::from_millis(ms.into()));
        }
    }

    #[test]
    fn blink_alternates_and_ends_dark() {
        let mut led = Led::new(Levels::default()).unwrap();
        led.blink(&mut Sleep, Duration::from_millis(30), Duration::from_millis(5))
            .unwrap();
        assert!(!led.is_on());

        let levels = led.release().0;
        assert!(levels.len() >= 3);
        assert_eq!(levels.last(), Some(&false));
        for (i, level) in levels.iter().enumerate() {
            // off from new(), then on/off pairs
            assert_eq!(*level, i % 2 == 1, "level {}", i);
        }
    }
}
