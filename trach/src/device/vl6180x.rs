//! VL6180X proximity / time-of-flight sensor, single-shot ranging.
//!
//! Registers are 16 bits wide and sent high byte first. A read is two bus
//! transactions: a write that selects the register, then a one-byte read.
//! They must not be merged into a repeated-start write-read.

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c::{Read, Write};
use log::{debug, warn};

use crate::poll::{poll_until, PollPolicy, Polled};
use crate::Error;

pub const DEFAULT_ADDRESS: u8 = 0x29;
pub const MODEL_ID: u8 = 0xB4;

const START_SINGLE_SHOT: u8 = 0x01;
const RANGE_READY: u8 = 0x04;
const CLEAR_ALL_INTERRUPTS: u8 = 0x07;

#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    IdentificationModelId = 0x000,
    SystemInterruptClear = 0x015,
    SystemFreshOutOfReset = 0x016,
    SysrangeStart = 0x018,
    SysalsStart = 0x038,
    ResultRangeStatus = 0x04D,
    ResultInterruptStatusGpio = 0x04F,
    ResultRangeVal = 0x062,
}

impl Register {
    pub const ALL: [Register; 8] = [
        Register::IdentificationModelId,
        Register::SystemInterruptClear,
        Register::SystemFreshOutOfReset,
        Register::SysrangeStart,
        Register::SysalsStart,
        Register::ResultRangeStatus,
        Register::ResultInterruptStatusGpio,
        Register::ResultRangeVal,
    ];
}

impl From<Register> for u16 {
    fn from(r: Register) -> Self {
        r as u16
    }
}

/// Mandatory private register settings from the datasheet (AN4545 section 9).
/// Order matters; apply verbatim.
pub const TUNING: [(u16, u8); 30] = [
    (0x0207, 0x01),
    (0x0208, 0x01),
    (0x0096, 0x00),
    (0x0097, 0xfd),
    (0x00e3, 0x00),
    (0x00e4, 0x04),
    (0x00e5, 0x02),
    (0x00e6, 0x01),
    (0x00e7, 0x03),
    (0x00f5, 0x02),
    (0x00d9, 0x05),
    (0x00db, 0xce),
    (0x00dc, 0x03),
    (0x00dd, 0xf8),
    (0x009f, 0x00),
    (0x00a3, 0x3c),
    (0x00b7, 0x00),
    (0x00bb, 0x3c),
    (0x00b2, 0x09),
    (0x00ca, 0x09),
    (0x0198, 0x01),
    (0x01b0, 0x17),
    (0x01ad, 0x00),
    (0x00ff, 0x05),
    (0x0100, 0x05),
    (0x0199, 0x05),
    (0x01a6, 0x1b),
    (0x01ac, 0x3e),
    (0x01a7, 0x1f),
    (0x0030, 0x00),
];

/// Outcome of one single-shot measurement, in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Range {
    /// The ready bit was seen before reading the result.
    Ready(u8),
    /// The ready bit never showed up; the value is whatever the result
    /// register held and may be stale.
    TimedOut(u8),
}

impl Range {
    pub fn mm(&self) -> u8 {
        match *self {
            Range::Ready(mm) | Range::TimedOut(mm) => mm,
        }
    }

    pub fn ready(&self) -> Option<u8> {
        match *self {
            Range::Ready(mm) => Some(mm),
            Range::TimedOut(_) => None,
        }
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, Range::TimedOut(_))
    }

    /// Closer than `threshold_mm`. A timed-out reading is never trusted to
    /// be close.
    pub fn within(&self, threshold_mm: u8) -> bool {
        matches!(*self, Range::Ready(mm) if mm < threshold_mm)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitReport {
    pub model_id: u8,
    /// The tuning sequence was written during this init.
    pub tuned: bool,
}

impl InitReport {
    pub fn model_matches(&self) -> bool {
        self.model_id == MODEL_ID
    }
}

pub struct Vl6180x<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
    policy: PollPolicy,
}

impl<I2C, D> Vl6180x<I2C, D> {
    /// Sensor at the default address polling 100 times, 1 ms apart.
    /// Nothing is sent until [`init`](Self::init).
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self {
            i2c,
            delay,
            address: DEFAULT_ADDRESS,
            policy: PollPolicy::default(),
        }
    }

    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn poll_policy(&self) -> PollPolicy {
        self.policy
    }

    /// Give back the bus and delay.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }
}

impl<I2C, D, E> Vl6180x<I2C, D>
where
    I2C: Write<Error = E> + Read<Error = E>,
    D: DelayMs<u32>,
{
    pub fn write_register(
        &mut self,
        register: impl Into<u16>,
        value: u8,
    ) -> Result<(), Error<E>> {
        Ok(write_reg(&mut self.i2c, self.address, register.into(), value)?)
    }

    pub fn read_register(&mut self, register: impl Into<u16>) -> Result<u8, Error<E>> {
        Ok(read_reg(&mut self.i2c, self.address, register.into())?)
    }

    /// Check the model id and, on the first init after power-up, load the
    /// tuning settings and clear the fresh-out-of-reset flag.
    ///
    /// An unexpected model id is only logged.
    pub fn init(&mut self) -> Result<InitReport, Error<E>> {
        let model_id = self.read_register(Register::IdentificationModelId)?;
        if model_id != MODEL_ID {
            warn!("VL6180X at {:#04x}: strange model id {:#04x}", self.address, model_id);
        }

        let fresh = self.read_register(Register::SystemFreshOutOfReset)?;
        let tuned = fresh != 0;
        if tuned {
            self.load_settings()?;
            self.write_register(Register::SystemFreshOutOfReset, 0x00)?;
            debug!("VL6180X at {:#04x}: tuning settings loaded", self.address);
        }

        Ok(InitReport { model_id, tuned })
    }

    /// Start one measurement, wait for it, read it, clear the interrupt.
    ///
    /// The clear is written whether or not the ready bit was seen; without it
    /// every later poll would find the status already set.
    pub fn poll_range(&mut self) -> Result<Range, Error<E>> {
        self.write_register(Register::SysrangeStart, START_SINGLE_SHOT)?;

        let Self {
            i2c,
            delay,
            address,
            policy,
        } = self;
        let polled = poll_until(delay, *policy, || {
            let status = read_reg(i2c, *address, Register::ResultInterruptStatusGpio.into())?;
            Ok::<_, E>(status & RANGE_READY != 0)
        })?;

        let mm = self.read_register(Register::ResultRangeVal)?;
        self.write_register(Register::SystemInterruptClear, CLEAR_ALL_INTERRUPTS)?;

        Ok(match polled {
            Polled::Ready { .. } => Range::Ready(mm),
            Polled::TimedOut => {
                warn!(
                    "VL6180X at {:#04x}: range not ready after {} ms, reading {} mm",
                    self.address,
                    self.policy.budget_ms(),
                    mm
                );
                Range::TimedOut(mm)
            }
        })
    }

    fn load_settings(&mut self) -> Result<(), Error<E>> {
        for (register, value) in TUNING {
            self.write_register(register, value)?;
        }
        Ok(())
    }
}

fn write_reg<I2C, E>(i2c: &mut I2C, address: u8, register: u16, value: u8) -> Result<(), E>
where
    I2C: Write<Error = E>,
{
    let [hi, lo] = register.to_be_bytes();
    i2c.write(address, &[hi, lo, value])
}

fn read_reg<I2C, E>(i2c: &mut I2C, address: u8, register: u16) -> Result<u8, E>
where
    I2C: Write<Error = E> + Read<Error = E>,
{
    let mut buf = [0u8; 1];
    i2c.write(address, &register.to_be_bytes())?;
    i2c.read(address, &mut buf)?;
    Ok(buf[0])
}
