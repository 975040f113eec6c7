//! Digit triplets — the stimulus labels and listener responses.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Every stimulus is a spoken triplet, so labels and scored responses are
/// exactly this long.
pub const TRIPLET_LEN: usize = 3;

/// Errors from parsing digit strings at the entry boundary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DigitsError {
    #[error("expected exactly {TRIPLET_LEN} digits, got {0}")]
    WrongLength(usize),

    #[error("'{0}' is not a digit")]
    NotADigit(char),

    #[error("partial response already holds {TRIPLET_LEN} digits")]
    Full,
}

/// A validated string of exactly three ASCII digits.
///
/// Used for ground-truth stimulus labels and for complete responses.
/// Invalid input is rejected at parse time so nothing downstream has to
/// re-check lengths or character classes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digits([u8; TRIPLET_LEN]);

impl Digits {
    /// Parse a triplet label, rejecting wrong lengths and non-digits.
    pub fn parse(s: &str) -> Result<Self, DigitsError> {
        let bytes = s.as_bytes();
        if bytes.len() != TRIPLET_LEN {
            return Err(DigitsError::WrongLength(s.chars().count()));
        }
        let mut out = [0u8; TRIPLET_LEN];
        for (i, &b) in bytes.iter().enumerate() {
            if !b.is_ascii_digit() {
                return Err(DigitsError::NotADigit(bytes[i] as char));
            }
            out[i] = b;
        }
        Ok(Self(out))
    }

    pub fn as_str(&self) -> &str {
        // Invariant: only ASCII digits are stored.
        std::str::from_utf8(&self.0).unwrap_or("???")
    }

    /// Positionwise match count against another triplet (0..=3).
    ///
    /// This is the partial-credit score: each position contributes one
    /// point, independent of the others.
    pub fn matching_positions(&self, other: &Digits) -> u8 {
        self.0
            .iter()
            .zip(other.0.iter())
            .filter(|(a, b)| a == b)
            .count() as u8
    }
}

impl fmt::Display for Digits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for Digits {
    type Error = DigitsError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Digits::parse(&s)
    }
}

impl From<Digits> for String {
    fn from(d: Digits) -> String {
        d.as_str().to_string()
    }
}

/// An in-flight response: zero to three digits entered so far.
///
/// Models keypad entry one digit at a time. Rejecting a digit leaves the
/// buffer untouched, so a malformed keystroke can never corrupt a trial.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialDigits {
    buf: [u8; TRIPLET_LEN],
    len: usize,
}

impl PartialDigits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one digit. Errors if `c` is not an ASCII digit or the buffer
    /// is already complete.
    pub fn push(&mut self, c: char) -> Result<(), DigitsError> {
        if !c.is_ascii_digit() {
            return Err(DigitsError::NotADigit(c));
        }
        if self.len >= TRIPLET_LEN {
            return Err(DigitsError::Full);
        }
        self.buf[self.len] = c as u8;
        self.len += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_complete(&self) -> bool {
        self.len == TRIPLET_LEN
    }

    /// The keypad's "clear" key.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Convert a complete buffer into a validated triplet.
    pub fn complete(&self) -> Result<Digits, DigitsError> {
        if !self.is_complete() {
            return Err(DigitsError::WrongLength(self.len));
        }
        Ok(Digits(self.buf))
    }
}

impl fmt::Display for PartialDigits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.buf[..self.len] {
            write!(f, "{}", b as char)?;
        }
        Ok(())
    }
}
