use embedded_hal::blocking::delay::DelayMs;

use super::PwmOutput;
use crate::Error;

const IDLE_HZ: f64 = 2000.0;
/// Square wave, loudest for a piezo.
const TONE_DUTY: f64 = 0.5;

pub struct Buzzer<P> {
    pwm: P,
}

impl<P> Buzzer<P>
where
    P: PwmOutput,
{
    /// Silent at 2 kHz.
    pub fn new(mut pwm: P) -> Result<Self, Error<P::Error>> {
        pwm.set_frequency(IDLE_HZ)?;
        pwm.set_duty_cycle(0.0)?;
        Ok(Self { pwm })
    }

    /// Starts a tone. With `duration_ms` it blocks that long and goes quiet,
    /// without it the tone keeps playing.
    pub fn tone<D: DelayMs<u32>>(
        &mut self,
        delay: &mut D,
        hz: f64,
        duration_ms: Option<u32>,
    ) -> Result<(), Error<P::Error>> {
        self.pwm.set_frequency(hz)?;
        self.pwm.set_duty_cycle(TONE_DUTY)?;
        if let Some(ms) = duration_ms {
            delay.delay_ms(ms);
            self.off()?;
        }
        Ok(())
    }

    pub fn off(&mut self) -> Result<(), Error<P::Error>> {
        Ok(self.pwm.set_duty_cycle(0.0)?)
    }

    /// Lub-dub.
    pub fn heartbeat<D: DelayMs<u32>>(&mut self, delay: &mut D) -> Result<(), Error<P::Error>> {
        self.tone(delay, 1000.0, Some(100))?;
        delay.delay_ms(100);
        self.tone(delay, 1000.0, Some(100))
    }

    pub fn alarm<D: DelayMs<u32>>(&mut self, delay: &mut D) -> Result<(), Error<P::Error>> {
        self.tone(delay, 3000.0, Some(200))
    }

    /// Stops the channel and hands it back.
    pub fn release(mut self) -> Result<P, Error<P::Error>> {
        self.pwm.disable()?;
        Ok(self.pwm)
    }
}
