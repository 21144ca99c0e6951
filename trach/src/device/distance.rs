use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c::{Read, Write};

use super::vl6180x::{InitReport, Range, Vl6180x};
use crate::Error;

/// Anything closer than this counts as blocked.
pub const DEFAULT_THRESHOLD_MM: u8 = 40;

/// An initialised VL6180X used as an obstruction detector.
pub struct DistanceSensor<I2C, D> {
    sensor: Vl6180x<I2C, D>,
    report: InitReport,
}

impl<I2C, D, E> DistanceSensor<I2C, D>
where
    I2C: Write<Error = E> + Read<Error = E>,
    D: DelayMs<u32>,
{
    /// Runs [`Vl6180x::init`]; the sensor is handed back only once it is
    /// tuned and ready to range.
    pub fn new(mut sensor: Vl6180x<I2C, D>) -> Result<Self, Error<E>> {
        let report = sensor.init()?;
        Ok(Self { sensor, report })
    }

    pub fn report(&self) -> InitReport {
        self.report
    }

    pub fn distance(&mut self) -> Result<Range, Error<E>> {
        self.sensor.poll_range()
    }

    /// A timed-out reading is not trusted and never counts as blocked.
    pub fn is_blocked(&mut self, threshold_mm: u8) -> Result<bool, Error<E>> {
        Ok(self.distance()?.within(threshold_mm))
    }

    pub fn release(self) -> Vl6180x<I2C, D> {
        self.sensor
    }
}
