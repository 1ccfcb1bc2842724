//! US ZIP code type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ZipCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ZipCodeError {
    /// The input string is empty.
    #[error("ZIP code cannot be empty")]
    Empty,
    /// The input is not `NNNNN` or `NNNNN-NNNN`.
    #[error("ZIP code must be five digits, optionally followed by a dash and four digits")]
    InvalidFormat,
}

/// A five-digit US ZIP code with an optional ZIP+4 suffix.
///
/// ```
/// use cardshop_core::ZipCode;
///
/// assert!(ZipCode::parse("12345").is_ok());
/// assert!(ZipCode::parse("12345-6789").is_ok());
/// assert!(ZipCode::parse("1234").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ZipCode(String);

impl ZipCode {
    /// Parse a `ZipCode` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or not of the form `NNNNN` or
    /// `NNNNN-NNNN`.
    pub fn parse(s: &str) -> Result<Self, ZipCodeError> {
        if s.is_empty() {
            return Err(ZipCodeError::Empty);
        }

        let all_digits = |part: &str, len: usize| {
            part.len() == len && part.bytes().all(|b| b.is_ascii_digit())
        };

        let valid = match s.split_once('-') {
            Some((base, plus4)) => all_digits(base, 5) && all_digits(plus4, 4),
            None => all_digits(s, 5),
        };

        if valid {
            Ok(Self(s.to_owned()))
        } else {
            Err(ZipCodeError::InvalidFormat)
        }
    }

    /// Returns the ZIP code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the five-digit base code.
    #[must_use]
    pub fn base(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for ZipCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ZipCode {
    type Err = ZipCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
