//! Caller identity as issued by the identity provider.
//!
//! A principal is an opaque byte string (at most 29 bytes). Its textual form
//! is the lowercase base32 encoding of a big-endian CRC-32 checksum followed
//! by the bytes, split into dash-separated groups of five characters.

use core::fmt;

use data_encoding::BASE32_NOPAD;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha224};

/// Errors that can occur when parsing a [`Principal`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PrincipalError {
    /// The input string is empty.
    #[error("principal text cannot be empty")]
    Empty,
    /// The input contains characters outside the base32 alphabet.
    #[error("principal text is not valid base32")]
    InvalidBase32,
    /// The decoded value is too short to carry a checksum.
    #[error("principal text is too short")]
    TooShort,
    /// The decoded value exceeds the maximum principal length.
    #[error("principal must be at most {max} bytes")]
    TooLong {
        /// Maximum allowed length in bytes.
        max: usize,
    },
    /// The embedded checksum does not match the bytes.
    #[error("principal checksum mismatch")]
    ChecksumMismatch,
    /// The text decodes but is not in canonical grouped form.
    #[error("principal text is not in canonical form (expected {expected})")]
    NotCanonical {
        /// The canonical spelling of the decoded principal.
        expected: String,
    },
}

/// A caller identity.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Principal(Vec<u8>);

impl Principal {
    /// Maximum length of a principal in bytes.
    pub const MAX_LENGTH: usize = 29;

    const CHECKSUM_LENGTH: usize = 4;
    const ANONYMOUS_TAG: u8 = 0x04;
    const SELF_AUTHENTICATING_TAG: u8 = 0x02;

    /// The anonymous principal (`2vxsx-fae`), used by callers without identity.
    #[must_use]
    pub fn anonymous() -> Self {
        Self(vec![Self::ANONYMOUS_TAG])
    }

    /// Derive the principal owned by a public key.
    #[must_use]
    pub fn self_authenticating(public_key: &[u8]) -> Self {
        let mut bytes = Sha224::digest(public_key).to_vec();
        bytes.push(Self::SELF_AUTHENTICATING_TAG);
        Self(bytes)
    }

    /// Build a principal from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the slice is longer than [`Principal::MAX_LENGTH`].
    pub fn from_slice(bytes: &[u8]) -> Result<Self, PrincipalError> {
        if bytes.len() > Self::MAX_LENGTH {
            return Err(PrincipalError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(bytes.to_vec()))
    }

    /// Parse a principal from its textual form.
    ///
    /// Input is matched case-insensitively and surrounding whitespace is
    /// ignored, but the dash grouping must be canonical.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is empty, not base32, has a bad checksum,
    /// or is not in canonical grouped form.
    pub fn parse(text: &str) -> Result<Self, PrincipalError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PrincipalError::Empty);
        }

        let compact: String = text
            .chars()
            .filter(|c| *c != '-')
            .map(|c| c.to_ascii_uppercase())
            .collect();

        let decoded = BASE32_NOPAD
            .decode(compact.as_bytes())
            .map_err(|_| PrincipalError::InvalidBase32)?;

        if decoded.len() < Self::CHECKSUM_LENGTH {
            return Err(PrincipalError::TooShort);
        }

        let (checksum, bytes) = decoded.split_at(Self::CHECKSUM_LENGTH);
        if bytes.len() > Self::MAX_LENGTH {
            return Err(PrincipalError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if checksum != crc32fast::hash(bytes).to_be_bytes() {
            return Err(PrincipalError::ChecksumMismatch);
        }

        let principal = Self(bytes.to_vec());
        let expected = principal.to_text();
        if !expected.eq_ignore_ascii_case(text) {
            return Err(PrincipalError::NotCanonical { expected });
        }

        Ok(principal)
    }

    /// Returns the raw bytes of the principal.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Whether this is the anonymous principal.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.0.as_slice() == [Self::ANONYMOUS_TAG]
    }

    /// Render the canonical textual form.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut payload = Vec::with_capacity(Self::CHECKSUM_LENGTH + self.0.len());
        payload.extend_from_slice(&crc32fast::hash(&self.0).to_be_bytes());
        payload.extend_from_slice(&self.0);

        let encoded = BASE32_NOPAD.encode(&payload).to_ascii_lowercase();
        let mut text = String::with_capacity(encoded.len() + encoded.len() / 5);
        for (i, c) in encoded.chars().enumerate() {
            if i > 0 && i % 5 == 0 {
                text.push('-');
            }
            text.push(c);
        }
        text
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Principal({})", self.to_text())
    }
}

impl std::str::FromStr for Principal {
    type Err = PrincipalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Principal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_text())
    }
}

impl<'de> Deserialize<'de> for Principal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_text() {
        let anon = Principal::anonymous();
        assert_eq!(anon.to_text(), "2vxsx-fae");
        assert!(anon.is_anonymous());
        assert_eq!(Principal::parse("2vxsx-fae").unwrap(), anon);
    }

    #[test]
    fn test_management_canister_text() {
        let empty = Principal::from_slice(&[]).unwrap();
        assert_eq!(empty.to_text(), "aaaaa-aa");
    }

    #[test]
    fn test_known_text_vector() {
        let p = Principal::from_slice(&[0, 0, 0, 0, 0, 0, 0, 1, 1, 1]).unwrap();
        assert_eq!(p.to_text(), "rrkah-fqaaa-aaaaa-aaaaq-cai");
        assert_eq!(Principal::parse("rrkah-fqaaa-aaaaa-aaaaq-cai").unwrap(), p);
    }

    #[test]
    fn test_self_authenticating() {
        let key: Vec<u8> = (0u8..32).collect();
        let p = Principal::self_authenticating(&key);
        assert_eq!(p.as_slice().len(), 29);
        assert_eq!(p.as_slice().last(), Some(&0x02));
        assert_eq!(
            p.to_text(),
            "b3dwh-xdrir-xksm4-bxier-7ffpz-xc3so-bsgki-kdibh-yivhl-2ekat-iae"
        );
        assert!(!p.is_anonymous());
    }

    #[test]
    fn test_parse_is_case_insensitive_and_trims() {
        let p = Principal::parse("  2VXSX-FAE ").unwrap();
        assert!(p.is_anonymous());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Principal::parse(""), Err(PrincipalError::Empty));
        assert_eq!(
            Principal::parse("not a principal!"),
            Err(PrincipalError::InvalidBase32)
        );
        assert!(matches!(
            Principal::parse("2vxsxfae"),
            Err(PrincipalError::NotCanonical { .. })
        ));
    }

    #[test]
    fn test_checksum_mismatch() {
        // Valid base32, wrong checksum.
        assert_eq!(
            Principal::parse("aaaaa-ai"),
            Err(PrincipalError::ChecksumMismatch)
        );
        // The anonymous principal with its first checksum character changed.
        assert_eq!(
            Principal::parse("3vxsx-fae"),
            Err(PrincipalError::ChecksumMismatch)
        );
    }

    #[test]
    fn test_from_slice_too_long() {
        assert!(matches!(
            Principal::from_slice(&[0u8; 30]),
            Err(PrincipalError::TooLong { max: 29 })
        ));
    }

    #[test]
    fn test_serde_as_text() {
        let json = serde_json::to_string(&Principal::anonymous()).unwrap();
        assert_eq!(json, "\"2vxsx-fae\"");
        let parsed: Principal = serde_json::from_str(&json).unwrap();
        assert!(parsed.is_anonymous());
        assert!(serde_json::from_str::<Principal>("\"bogus\"").is_err());
    }
}
