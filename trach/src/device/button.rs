use std::time::{Duration, Instant};

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::digital::v2::InputPin;

use crate::poll::{poll_until, PollPolicy, Polled};
use crate::Error;

/// A momentary switch on one GPIO line. Also fits a hall switch, which is
/// "pressed" while the magnet is near.
pub struct Button<P> {
    pin: P,
    active_low: bool,
    last_press: Option<Duration>,
}

impl<P, E> Button<P>
where
    P: InputPin<Error = E>,
{
    /// Active low: pulled up, shorts to ground when pressed.
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            active_low: true,
            last_press: None,
        }
    }

    pub fn active_high(mut self) -> Self {
        self.active_low = false;
        self
    }

    pub fn is_pressed(&self) -> Result<bool, Error<E>> {
        Ok(if self.active_low {
            self.pin.is_low()?
        } else {
            self.pin.is_high()?
        })
    }

    /// Returns at once if already pressed.
    pub fn wait_for_press<D: DelayMs<u32>>(
        &self,
        delay: &mut D,
        policy: PollPolicy,
    ) -> Result<Polled, Error<E>> {
        poll_until(delay, policy, || self.is_pressed())
    }

    /// Returns at once if already released.
    pub fn wait_for_release<D: DelayMs<u32>>(
        &self,
        delay: &mut D,
        policy: PollPolicy,
    ) -> Result<Polled, Error<E>> {
        poll_until(delay, policy, || Ok(!self.is_pressed()?))
    }

    /// Wait for a press and the following release, each bounded by `policy`.
    /// Returns how long the button was held, `None` if either wait ran out.
    pub fn wait_for_click<D: DelayMs<u32>>(
        &mut self,
        delay: &mut D,
        policy: PollPolicy,
    ) -> Result<Option<Duration>, Error<E>> {
        if !self.wait_for_press(delay, policy)?.is_ready() {
            return Ok(None);
        }
        let pressed_at = Instant::now();
        if !self.wait_for_release(delay, policy)?.is_ready() {
            return Ok(None);
        }
        let held = pressed_at.elapsed();
        self.last_press = Some(held);
        Ok(Some(held))
    }

    pub fn last_press_duration(&self) -> Option<Duration> {
        self.last_press
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

    fn reads(states: &[State]) -> Vec<Transaction> {
        states.iter().map(|s| Transaction::get(s.clone())).collect()
    }

    #[test]
    fn active_low_by_default() {
        let button = Button::new(PinMock::new(&reads(&[State::Low, State::High])));
        assert!(button.is_pressed().unwrap());
        assert!(!button.is_pressed().unwrap());
        button.release().done();
    }

    #[test]
    fn active_high_inverts() {
        let button = Button::new(PinMock::new(&reads(&[State::High]))).active_high();
        assert!(button.is_pressed().unwrap());
        button.release().done();
    }

    #[test]
    fn press_already_held_returns_immediately() {
        let button = Button::new(PinMock::new(&reads(&[State::Low])));
        let polled = button
            .wait_for_press(&mut MockNoop::new(), PollPolicy::new(10, 1))
            .unwrap();
        assert_eq!(polled, Polled::Ready { attempt: 0 });
        button.release().done();
    }

    #[test]
    fn press_wait_is_bounded() {
        let button = Button::new(PinMock::new(&reads(&vec![State::High; 5])));
        let polled = button
            .wait_for_press(&mut MockNoop::new(), PollPolicy::new(5, 1))
            .unwrap();
        assert_eq!(polled, Polled::TimedOut);
        button.release().done();
    }

    #[test]
    fn click_records_duration() {
        let mut button = Button::new(PinMock::new(&reads(&[
            State::High,
            State::Low,
            State::Low,
            State::High,
        ])));
        let held = button
            .wait_for_click(&mut MockNoop::new(), PollPolicy::new(10, 1))
            .unwrap();
        assert!(held.is_some());
        assert_eq!(button.last_press_duration(), held);
        button.release().done();
    }

    #[test]
    fn click_without_release_is_none() {
        let mut button = Button::new(PinMock::new(&reads(&[State::Low, State::Low, State::Low])));
        let held = button
            .wait_for_click(&mut MockNoop::new(), PollPolicy::new(2, 1))
            .unwrap();
        assert_eq!(held, None);
        assert_eq!(button.last_press_duration(), None);
        button.release().done();
    }
}
