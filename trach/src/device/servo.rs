use super::PwmOutput;
use crate::Error;

// SG90
const FREQ_HZ: f64 = 50.0;
/// Fully clockwise.
const MIN_DUTY: f64 = 0.05;
/// Fully anti-clockwise.
const MAX_DUTY: f64 = 0.10;
pub const MAX_POSITION: u8 = 100;

/// Hobby servo positioned by percentage of its travel, 0 = fully clockwise,
/// 100 = fully anti-clockwise.
pub struct Servo<P> {
    pwm: P,
    position: u8,
}

fn duty_from_position(position: u8) -> f64 {
    (MAX_DUTY - MIN_DUTY) * (position as f64 / 100.0) + MIN_DUTY
}

impl<P> Servo<P>
where
    P: PwmOutput,
{
    pub fn new(mut pwm: P, position: u8) -> Result<Self, Error<P::Error>> {
        if position > MAX_POSITION {
            return Err(Error::ServoOutOfRange(position));
        }
        pwm.set_frequency(FREQ_HZ)?;
        pwm.set_duty_cycle(duty_from_position(position))?;
        Ok(Self { pwm, position })
    }

    pub fn turn(&mut self, position: u8) -> Result<(), Error<P::Error>> {
        if position > MAX_POSITION {
            return Err(Error::ServoOutOfRange(position));
        }
        self.pwm.set_duty_cycle(duty_from_position(position))?;
        self.position = position;
        Ok(())
    }

    /// Last commanded position.
    pub fn position(&self) -> u8 {
        self.position
    }

    /// Parks the signal at minimum duty so the servo stops buzzing. The
    /// remembered position is left alone.
    pub fn stop(&mut self) -> Result<(), Error<P::Error>> {
        Ok(self.pwm.set_duty_cycle(MIN_DUTY)?)
    }

    pub fn release(mut self) -> Result<P, Error<P::Error>> {
        self.pwm.disable()?;
        Ok(self.pwm)
    }
}
