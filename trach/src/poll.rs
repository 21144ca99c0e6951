//! Bounded busy-wait with a fixed sleep between attempts.
//!
//! Shared by the range sensor's ready-bit wait and the button edge waits.
//! There is no cancellation: the only way out early is a hit or an error.

use embedded_hal::blocking::delay::DelayMs;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollPolicy {
    pub attempts: u32,
    pub interval_ms: u32,
}

impl PollPolicy {
    pub const fn new(attempts: u32, interval_ms: u32) -> Self {
        Self {
            attempts,
            interval_ms,
        }
    }

    /// Worst-case time spent sleeping before giving up.
    pub const fn budget_ms(&self) -> u64 {
        self.attempts as u64 * self.interval_ms as u64
    }
}

impl Default for PollPolicy {
    /// 100 attempts, 1 ms apart.
    fn default() -> Self {
        Self::new(100, 1)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Polled {
    /// The probe reported ready on the given attempt (0-based).
    Ready { attempt: u32 },
    /// Every attempt missed.
    TimedOut,
}

impl Polled {
    pub fn is_ready(&self) -> bool {
        matches!(self, Polled::Ready { .. })
    }
}

/// Call `probe` until it returns `true` or `policy.attempts` runs out,
/// sleeping `policy.interval_ms` after every miss.
pub fn poll_until<D, E, F>(
    delay: &mut D,
    policy: PollPolicy,
    mut probe: F,
) -> Result<Polled, E>
where
    D: DelayMs<u32>,
    F: FnMut() -> Result<bool, E>,
{
    for attempt in 0..policy.attempts {
        if probe()? {
            return Ok(Polled::Ready { attempt });
        }
        delay.delay_ms(policy.interval_ms);
    }
    Ok(Polled::TimedOut)
}
