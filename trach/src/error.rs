use std::error;
use std::fmt;

/// Driver error, generic over the error type of the underlying bus, pin or
/// PWM channel.
///
/// Everything except `Io` is raised before the first hardware write, so a
/// rejected request never leaves the device half updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error<E> {
    /// The hardware transaction itself failed.
    Io(E),
    /// Digit value outside 0..=15.
    DigitOutOfRange(u8),
    /// Number outside 0..=9999.
    NumberOutOfRange(i64),
    /// Text must be 1 to 4 characters.
    TextLength(usize),
    /// Display position outside 0..=3.
    PositionOutOfRange(usize),
    /// Brightness outside 0..=15.
    BrightnessOutOfRange(u8),
    /// Servo position outside 0..=100.
    ServoOutOfRange(u8),
}

impl<E> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Error::Io(e)
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "hardware communication failed: {:?}", e),
            Error::DigitOutOfRange(v) => {
                write!(f, "digit value must be between 0 and 15, got {}", v)
            }
            Error::NumberOutOfRange(v) => {
                write!(f, "value is not between 0 and 9999: {}", v)
            }
            Error::TextLength(n) => {
                write!(f, "must have between 1 and 4 characters, got {}", n)
            }
            Error::PositionOutOfRange(p) => {
                write!(f, "display position must be between 0 and 3, got {}", p)
            }
            Error::BrightnessOutOfRange(b) => {
                write!(f, "brightness must be between 0 and 15, got {}", b)
            }
            Error::ServoOutOfRange(p) => {
                write!(f, "servo position must be between 0 and 100, got {}", p)
            }
        }
    }
}

impl<E: fmt::Debug> error::Error for Error<E> {}
