//! Peripheral drivers for the trach trainer board.
//!
//! Everything here is generic over `embedded-hal` 0.2 traits, so the same
//! drivers run on the board binary and against mocks in tests. PWM channels go
//! through the crate's own [`device::PwmOutput`] seam since `embedded-hal`
//! has no stable PWM trait.

mod error;
pub use error::Error;

pub mod conf;
pub mod device;
pub mod poll;

pub use poll::{PollPolicy, Polled};
