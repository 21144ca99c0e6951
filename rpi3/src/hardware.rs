use rppal::gpio::{Gpio, InputPin, OutputPin};

use crate::error::BenchError;

pub mod pwm;
pub use pwm::PwmChannel;

/// Buttons and the hall switch pull to ground when active.
pub fn input(gpio: &Gpio, pin: u8) -> Result<InputPin, BenchError> {
    Ok(gpio.get(pin)?.into_input_pullup())
}

pub fn output(gpio: &Gpio, pin: u8) -> Result<OutputPin, BenchError> {
    Ok(gpio.get(pin)?.into_output())
}
