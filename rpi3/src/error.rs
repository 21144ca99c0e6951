use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub struct BenchError {
    details: String,
}

impl BenchError {
    pub fn new(msg: &str) -> BenchError {
        BenchError {
            details: msg.to_string(),
        }
    }
}

impl fmt::Display for BenchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.details)
    }
}

impl Error for BenchError {}

impl From<rppal::gpio::Error> for BenchError {
    fn from(e: rppal::gpio::Error) -> Self {
        BenchError::new(&format!("gpio: {}", e))
    }
}

impl From<rppal::pwm::Error> for BenchError {
    fn from(e: rppal::pwm::Error) -> Self {
        BenchError::new(&format!("pwm: {}", e))
    }
}

impl From<rppal::i2c::Error> for BenchError {
    fn from(e: rppal::i2c::Error) -> Self {
        BenchError::new(&format!("i2c: {}", e))
    }
}

impl<E: fmt::Debug> From<trach::Error<E>> for BenchError {
    fn from(e: trach::Error<E>) -> Self {
        BenchError::new(&e.to_string())
    }
}
