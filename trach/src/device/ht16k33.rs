//! HT16K33 backpack driving a 4 digit 7-segment display with a center colon.
//!
//! Every call is its own set of bus writes; there is no frame buffer.

use embedded_hal::blocking::i2c::Write;

use crate::Error;

pub const DEFAULT_ADDRESS: u8 = 0x70;

/// Segment patterns for 0-9, A, b, C, d, E, F.
pub const HEX_DIGITS: [u8; 16] = [
    0x3f, 0x06, 0x5b, 0x4f, // 0 1 2 3
    0x66, 0x6d, 0x7d, 0x07, // 4 5 6 7
    0x7f, 0x6f, 0x77, 0x7c, // 8 9 A b
    0x39, 0x5e, 0x79, 0x71, // C d E F
];

pub const DECIMAL_POINT: u8 = 0x80;
/// Digit RAM addresses, leftmost first. 0x04 in between is the colon.
pub const DIGIT_ADDR: [u8; 4] = [0x00, 0x02, 0x06, 0x08];
pub const COLON_ADDR: u8 = 0x04;
const COLON_ON: u8 = 0x02;
const COLON_OFF: u8 = 0x00;

const SYSTEM_SETUP: u8 = 0x20;
const OSCILLATOR: u8 = 0x01;
const BLINK_CMD: u8 = 0x80;
const BLINK_DISPLAYON: u8 = 0x01;
const BRIGHTNESS_CMD: u8 = 0xE0;
pub const BRIGHTNESS_HIGHEST: u8 = 0x0F;
pub const MAX_VALUE: i64 = 9999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Blink {
    #[default]
    Off,
    TwoHz,
    OneHz,
    HalfHz,
}

impl From<Blink> for u8 {
    fn from(b: Blink) -> Self {
        match b {
            Blink::Off => 0x00,
            Blink::TwoHz => 0x02,
            Blink::OneHz => 0x04,
            Blink::HalfHz => 0x06,
        }
    }
}

/// Segment pattern for a hex digit, optionally with the decimal point lit.
pub fn encode_digit<E>(value: u8, decimal_point: bool) -> Result<u8, Error<E>> {
    let pattern = *HEX_DIGITS
        .get(value as usize)
        .ok_or(Error::DigitOutOfRange(value))?;
    Ok(if decimal_point {
        pattern | DECIMAL_POINT
    } else {
        pattern
    })
}

/// Segment pattern for a printable character, `None` if there is no glyph
/// for it. Some letters only exist in one case (`c` vs `C`, `h` vs `H`).
pub fn glyph(c: char) -> Option<u8> {
    let pattern = match c {
        'a' | 'A' => 0x77,
        'b' | 'B' => 0x7c,
        'c' => 0x58,
        'C' => 0x39,
        'd' | 'D' => 0x5e,
        'e' | 'E' => 0x79,
        'f' | 'F' => 0x71,
        'g' | 'G' => 0x6f,
        'h' => 0x74,
        'H' => 0x76,
        'i' => 0x04,
        'I' => 0x30,
        'j' | 'J' => 0x0e,
        'l' | 'L' => 0x38,
        'n' | 'N' => 0x54,
        'o' => 0x5c,
        'O' => 0x3f,
        'p' | 'P' => 0x73,
        'q' | 'Q' => 0x67,
        'r' | 'R' => 0x50,
        's' | 'S' => 0x6d,
        't' | 'T' => 0x78,
        'u' => 0x1c,
        'U' => 0x3e,
        'y' | 'Y' => 0x6e,
        ' ' => 0x00,
        '-' => 0x40,
        '?' => 0x53,
        '0'..='9' => HEX_DIGITS[c as usize - '0' as usize],
        _ => return None,
    };
    Some(pattern)
}

/// Split 0..=9999 into four decimal digits, leftmost first.
fn decimal_digits(value: u16) -> [u8; 4] {
    [
        (value / 1000 % 10) as u8,
        (value / 100 % 10) as u8,
        (value / 10 % 10) as u8,
        (value % 10) as u8,
    ]
}

pub struct Ht16k33<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C, E> Ht16k33<I2C>
where
    I2C: Write<Error = E>,
{
    /// Start the oscillator, display on without blinking at full brightness,
    /// then blank everything.
    pub fn new(i2c: I2C, address: u8) -> Result<Self, Error<E>> {
        let mut display = Self { i2c, address };
        display.setup(Blink::Off, BRIGHTNESS_HIGHEST)?;
        display.blank()?;
        Ok(display)
    }

    pub fn setup(&mut self, blink: Blink, brightness: u8) -> Result<(), Error<E>> {
        if brightness > BRIGHTNESS_HIGHEST {
            return Err(Error::BrightnessOutOfRange(brightness));
        }
        self.command(SYSTEM_SETUP | OSCILLATOR)?;
        self.set_blink(blink)?;
        self.set_brightness(brightness)
    }

    pub fn set_blink(&mut self, blink: Blink) -> Result<(), Error<E>> {
        self.command(BLINK_CMD | u8::from(blink) | BLINK_DISPLAYON)
    }

    pub fn set_brightness(&mut self, brightness: u8) -> Result<(), Error<E>> {
        if brightness > BRIGHTNESS_HIGHEST {
            return Err(Error::BrightnessOutOfRange(brightness));
        }
        self.command(BRIGHTNESS_CMD | brightness)
    }

    pub fn set_digit(
        &mut self,
        position: usize,
        value: u8,
        decimal_point: bool,
    ) -> Result<(), Error<E>> {
        let pattern = encode_digit(value, decimal_point)?;
        self.set_digit_raw(position, pattern)
    }

    pub fn set_digit_raw(&mut self, position: usize, pattern: u8) -> Result<(), Error<E>> {
        let addr = *DIGIT_ADDR
            .get(position)
            .ok_or(Error::PositionOutOfRange(position))?;
        self.write(addr, pattern)
    }

    pub fn set_colon(&mut self, enabled: bool) -> Result<(), Error<E>> {
        self.write(COLON_ADDR, if enabled { COLON_ON } else { COLON_OFF })
    }

    /// Colon off, all segments dark.
    pub fn blank(&mut self) -> Result<(), Error<E>> {
        self.set_colon(false)?;
        for position in 0..DIGIT_ADDR.len() {
            self.set_digit_raw(position, 0x00)?;
        }
        Ok(())
    }

    /// Colon off, shows `0000`.
    pub fn clear(&mut self) -> Result<(), Error<E>> {
        self.set_colon(false)?;
        self.show_number(0)
    }

    /// Shows 0..=9999 with leading zeros. Out of range values are rejected
    /// before anything is written.
    pub fn show_number(&mut self, value: impl Into<i64>) -> Result<(), Error<E>> {
        let value = value.into();
        if !(0..=MAX_VALUE).contains(&value) {
            return Err(Error::NumberOutOfRange(value));
        }
        let digits = decimal_digits(value as u16);
        for position in (0..digits.len()).rev() {
            self.set_digit(position, digits[position], false)?;
        }
        Ok(())
    }

    /// Shows up to four characters, left aligned. Characters without a glyph
    /// are left dark.
    pub fn show_text(&mut self, text: &str) -> Result<(), Error<E>> {
        let len = text.chars().count();
        if !(1..=DIGIT_ADDR.len()).contains(&len) {
            return Err(Error::TextLength(len));
        }
        self.blank()?;
        for (position, c) in text.chars().enumerate() {
            if let Some(pattern) = glyph(c) {
                self.set_digit_raw(position, pattern)?;
            }
        }
        Ok(())
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    fn command(&mut self, cmd: u8) -> Result<(), Error<E>> {
        Ok(self.i2c.write(self.address, &[cmd])?)
    }

    fn write(&mut self, register: u8, value: u8) -> Result<(), Error<E>> {
        Ok(self.i2c.write(self.address, &[register, value])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::i2c::{Mock as I2cMock, Transaction};
    use embedded_hal_mock::MockError;

    const ADDR: u8 = DEFAULT_ADDRESS;

    fn reg(register: u8, value: u8) -> Transaction {
        Transaction::write(ADDR, vec![register, value])
    }

    fn cmd(value: u8) -> Transaction {
        Transaction::write(ADDR, vec![value])
    }

    fn blank() -> Vec<Transaction> {
        vec![
            reg(0x04, 0x00),
            reg(0x00, 0x00),
            reg(0x02, 0x00),
            reg(0x06, 0x00),
            reg(0x08, 0x00),
        ]
    }

    /// A display past `new`, with only `expectations` left to see.
    fn display(expectations: &[Transaction]) -> Ht16k33<I2cMock> {
        let mut all = vec![cmd(0x21), cmd(0x81), cmd(0xEF)];
        all.extend(blank());
        all.extend_from_slice(expectations);
        Ht16k33::new(I2cMock::new(&all), ADDR).unwrap()
    }

    fn number(digits: [u8; 4]) -> Vec<Transaction> {
        vec![
            reg(0x08, HEX_DIGITS[digits[3] as usize]),
            reg(0x06, HEX_DIGITS[digits[2] as usize]),
            reg(0x02, HEX_DIGITS[digits[1] as usize]),
            reg(0x00, HEX_DIGITS[digits[0] as usize]),
        ]
    }

    #[test]
    fn encode_matches_table() {
        for v in 0..16u8 {
            assert_eq!(encode_digit::<()>(v, false), Ok(HEX_DIGITS[v as usize]));
            assert_eq!(encode_digit::<()>(v, true), Ok(HEX_DIGITS[v as usize] | 0x80));
        }
        assert_eq!(encode_digit::<()>(16, false), Err(Error::DigitOutOfRange(16)));
    }

    #[test]
    fn new_sets_up_and_blanks() {
        let mut d = display(&[]);
        d.i2c.done();
    }

    #[test]
    fn setup_with_blink_and_dim() {
        let mut d = display(&[cmd(0x21), cmd(0x80 | 0x04 | 0x01), cmd(0xE3)]);
        d.setup(Blink::OneHz, 3).unwrap();
        d.i2c.done();
    }

    #[test]
    fn brightness_out_of_range_writes_nothing() {
        let mut d = display(&[]);
        assert!(matches!(d.set_brightness(16), Err(Error::BrightnessOutOfRange(16))));
        assert!(matches!(d.setup(Blink::Off, 200), Err(Error::BrightnessOutOfRange(200))));
        d.i2c.done();
    }

    #[test]
    fn show_number_writes_ones_first() {
        let mut d = display(&number([1, 2, 3, 4]));
        d.show_number(1234).unwrap();
        d.i2c.done();
    }

    #[test]
    fn show_number_pads_with_zeros() {
        let mut d = display(&number([0, 0, 0, 7]));
        d.show_number(7u8).unwrap();
        d.i2c.done();
    }

    #[test]
    fn show_number_out_of_range_writes_nothing() {
        let mut d = display(&[]);
        assert!(matches!(d.show_number(10000), Err(Error::NumberOutOfRange(10000))));
        assert!(matches!(d.show_number(-1), Err(Error::NumberOutOfRange(-1))));
        d.i2c.done();
    }

    /// Display RAM that keeps the last value written to each address.
    #[derive(Default)]
    struct Ram([u8; 16]);

    impl Write for Ram {
        type Error = ();

        fn write(&mut self, _address: u8, bytes: &[u8]) -> Result<(), ()> {
            if let [register, value] = *bytes {
                self.0[register as usize] = value;
            }
            Ok(())
        }
    }

    #[test]
    fn show_number_reads_back_from_digit_ram() {
        let mut d = Ht16k33::new(Ram::default(), ADDR).unwrap();
        for n in 0..=9999i64 {
            d.show_number(n).unwrap();
            let shown = DIGIT_ADDR
                .iter()
                .map(|a| d.i2c.0[*a as usize])
                .map(|p| HEX_DIGITS.iter().position(|h| *h == p).unwrap() as i64)
                .fold(0, |acc, digit| acc * 10 + digit);
            assert_eq!(shown, n);
            assert_eq!(d.i2c.0[COLON_ADDR as usize], 0x00);
        }
    }

    #[test]
    fn show_text_blanks_then_writes_known_glyphs() {
        let mut expected = blank();
        expected.push(reg(0x00, 0x73));
        expected.push(reg(0x02, 0x38));
        expected.push(reg(0x06, 0x77));
        expected.push(reg(0x08, 0x6e));
        let mut d = display(&expected);
        d.show_text("PLAY").unwrap();
        d.i2c.done();
    }

    #[test]
    fn show_text_skips_unknown_glyphs() {
        let mut expected = blank();
        expected.push(reg(0x00, 0x79));
        expected.push(reg(0x06, 0x50));
        let mut d = display(&expected);
        d.show_text("E!r").unwrap();
        d.i2c.done();
    }

    #[test]
    fn show_text_length_checked_first() {
        let mut d = display(&[]);
        assert!(matches!(d.show_text(""), Err(Error::TextLength(0))));
        assert!(matches!(d.show_text("READY"), Err(Error::TextLength(5))));
        d.i2c.done();
    }

    #[test]
    fn colon_on_and_off() {
        let mut d = display(&[reg(0x04, 0x02), reg(0x04, 0x00)]);
        d.set_colon(true).unwrap();
        d.set_colon(false).unwrap();
        d.i2c.done();
    }

    #[test]
    fn digit_with_decimal_point() {
        let mut d = display(&[reg(0x06, 0x7d | 0x80)]);
        d.set_digit(2, 6, true).unwrap();
        assert!(matches!(d.set_digit(4, 1, false), Err(Error::PositionOutOfRange(4))));
        assert!(matches!(d.set_digit(0, 20, false), Err(Error::DigitOutOfRange(20))));
        d.i2c.done();
    }

    #[test]
    fn clear_shows_zeros() {
        let mut expected = vec![reg(0x04, 0x00)];
        expected.extend(number([0, 0, 0, 0]));
        let mut d = display(&expected);
        d.clear().unwrap();
        d.i2c.done();
    }

    #[test]
    fn glyphs_cover_digits_and_punctuation() {
        for (i, c) in ('0'..='9').enumerate() {
            assert_eq!(glyph(c), Some(HEX_DIGITS[i]));
        }
        assert_eq!(glyph('-'), Some(0x40));
        assert_eq!(glyph(' '), Some(0x00));
        assert_eq!(glyph('h'), Some(0x74));
        assert_eq!(glyph('H'), Some(0x76));
        assert_eq!(glyph('k'), None);
        assert_eq!(glyph('!'), None);
    }

    #[test]
    fn bus_error_propagates() {
        let mut d = display(&[reg(0x04, 0x02).with_error(MockError::Io(std::io::ErrorKind::Other))]);
        assert!(matches!(d.set_colon(true), Err(Error::Io(_))));
        d.i2c.done();
    }
}
