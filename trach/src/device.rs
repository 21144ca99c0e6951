/// I2C -> 4 digit 7-segment display
pub mod ht16k33;
/// I2C -> Time-of-flight range sensor
pub mod vl6180x;
pub mod distance;

/// GPIO momentary buttons and hall switches
pub mod button;
/// GPIO indicator LEDs
pub mod led;

/// PWM piezo buzzer
pub mod buzzer;
/// PWM hobby servo
pub mod servo;

use core::fmt::Debug;

/// A PWM channel as the buzzer and servo drivers see it.
///
/// Implemented by the board crate for whatever the platform offers
/// (hardware channel, software PWM on a GPIO line).
pub trait PwmOutput {
    type Error: Debug;

    fn set_frequency(&mut self, hz: f64) -> Result<(), Self::Error>;
    /// Duty cycle as a fraction, 0.0 ..= 1.0.
    fn set_duty_cycle(&mut self, duty: f64) -> Result<(), Self::Error>;
    fn disable(&mut self) -> Result<(), Self::Error>;
}
