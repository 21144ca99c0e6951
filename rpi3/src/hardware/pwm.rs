use rppal::gpio::{Gpio, OutputPin};
use rppal::pwm::{Channel, Polarity, Pwm};
use trach::conf::PwmConf;
use trach::device::PwmOutput;

use crate::error::BenchError;

/// Either of the SoC's two PWM channels, or software PWM on any GPIO line.
pub enum PwmChannel {
    Hardware(Pwm),
    Software { pin: OutputPin, hz: f64, duty: f64 },
}

impl PwmChannel {
    /// Opened enabled, at 0 % duty.
    pub fn open(conf: PwmConf, gpio: &Gpio) -> Result<Self, BenchError> {
        match conf {
            PwmConf::Hardware { channel } => {
                let channel = match channel {
                    0 => Channel::Pwm0,
                    1 => Channel::Pwm1,
                    n => return Err(BenchError::new(&format!("no PWM channel {}", n))),
                };
                let pwm = Pwm::with_frequency(channel, 50.0, 0.0, Polarity::Normal, true)?;
                Ok(PwmChannel::Hardware(pwm))
            }
            PwmConf::Software { pin } => {
                let mut pin = gpio.get(pin)?.into_output();
                pin.set_low();
                Ok(PwmChannel::Software {
                    pin,
                    hz: 0.0,
                    duty: 0.0,
                })
            }
        }
    }
}

fn apply_software(pin: &mut OutputPin, hz: f64, duty: f64) -> Result<(), BenchError> {
    if hz > 0.0 && duty > 0.0 {
        pin.set_pwm_frequency(hz, duty)?;
    } else {
        pin.clear_pwm()?;
        pin.set_low();
    }
    Ok(())
}

impl PwmOutput for PwmChannel {
    type Error = BenchError;

    fn set_frequency(&mut self, freq: f64) -> Result<(), BenchError> {
        match self {
            PwmChannel::Hardware(pwm) => {
                // rppal sets both at once
                let duty = pwm.duty_cycle()?;
                Ok(pwm.set_frequency(freq, duty)?)
            }
            PwmChannel::Software { pin, hz, duty } => {
                *hz = freq;
                apply_software(pin, *hz, *duty)
            }
        }
    }

    fn set_duty_cycle(&mut self, fraction: f64) -> Result<(), BenchError> {
        let fraction = fraction.clamp(0.0, 1.0);
        match self {
            PwmChannel::Hardware(pwm) => Ok(pwm.set_duty_cycle(fraction)?),
            PwmChannel::Software { pin, hz, duty } => {
                *duty = fraction;
                apply_software(pin, *hz, *duty)
            }
        }
    }

    fn disable(&mut self) -> Result<(), BenchError> {
        match self {
            PwmChannel::Hardware(pwm) => Ok(pwm.disable()?),
            PwmChannel::Software { pin, duty, .. } => {
                *duty = 0.0;
                pin.clear_pwm()?;
                pin.set_low();
                Ok(())
            }
        }
    }
}
