//! PIN credential value types
//!
//! PIN digits are kept in zeroizing buffers and never printed by `Debug`.

use std::fmt;

use zeroize::Zeroizing;

use super::result::{Error, Result};

/// Number of digits in a PIN
pub const PIN_LENGTH: usize = 4;

/// A complete, well-formed 4-digit PIN
#[derive(Clone, PartialEq, Eq)]
pub struct Pin(Zeroizing<String>);

impl Pin {
    /// Parse a PIN, rejecting anything that is not exactly four ASCII digits
    pub fn parse(value: &str) -> Result<Self> {
        if value.len() == PIN_LENGTH && value.chars().all(|c| c.is_ascii_digit()) {
            Ok(Self(Zeroizing::new(value.to_string())))
        } else {
            Err(Error::InvalidPin)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time comparison against a stored credential
    pub fn matches(&self, stored: &str) -> bool {
        let a = self.0.as_bytes();
        let b = stored.as_bytes();
        if a.len() != b.len() {
            return false;
        }
        a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pin(****)")
    }
}

/// Digits typed so far on the keypad
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PinBuffer(Zeroizing<String>);

impl PinBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.0.len() >= PIN_LENGTH
    }

    /// Append a digit; returns a new buffer, leaving `self` untouched
    pub fn push(&self, digit: char) -> Self {
        let mut next = self.clone();
        if digit.is_ascii_digit() && !next.is_full() {
            next.0.push(digit);
        }
        next
    }

    /// Remove the last digit; returns a new buffer
    pub fn pop(&self) -> Self {
        let mut next = self.clone();
        next.0.pop();
        next
    }

    /// The completed PIN, if four digits have been entered
    pub fn to_pin(&self) -> Option<Pin> {
        if self.is_full() {
            Pin::parse(&self.0).ok()
        } else {
            None
        }
    }
}

impl fmt::Debug for PinBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PinBuffer({} digits)", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_parse() {
        assert!(Pin::parse("1234").is_ok());
        assert!(matches!(Pin::parse("123"), Err(Error::InvalidPin)));
        assert!(matches!(Pin::parse("12a4"), Err(Error::InvalidPin)));
        assert!(matches!(Pin::parse("12345"), Err(Error::InvalidPin)));
    }

    #[test]
    fn test_pin_debug_is_redacted() {
        let pin = Pin::parse("4321").unwrap();
        assert!(!format!("{:?}", pin).contains("4321"));
        let buffer = PinBuffer::new().push('4').push('3');
        assert_eq!(format!("{:?}", buffer), "PinBuffer(2 digits)");
    }

    #[test]
    fn test_buffer_ignores_non_digits_and_overflow() {
        let buffer = "12345"
            .chars()
            .chain(['x'])
            .fold(PinBuffer::new(), |b, c| b.push(c));
        assert_eq!(buffer.len(), 4);
        assert_eq!(buffer.to_pin().unwrap().as_str(), "1234");
    }

    #[test]
    fn test_matches() {
        let pin = Pin::parse("1234").unwrap();
        assert!(pin.matches("1234"));
        assert!(!pin.matches("4321"));
        assert!(!pin.matches("12345"));
    }
}
