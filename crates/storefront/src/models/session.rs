//! Session-related types.
//!
//! Types stored in the session for identity state.

use std::fmt;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use cardshop_core::Principal;
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Length of a device key in bytes.
pub const DEVICE_KEY_LEN: usize = 32;

/// Errors that can occur when restoring an identity from a recovery key.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Recovery key is not valid base64")]
    InvalidEncoding,
    #[error("Recovery key must be {DEVICE_KEY_LEN} bytes")]
    InvalidLength,
}

/// Session-stored caller identity.
///
/// The principal is derived from a random device key, so the same key always
/// yields the same principal. The key doubles as the recovery key shown on
/// the profile page.
#[derive(Clone, Serialize, Deserialize)]
pub struct Identity {
    /// The caller's principal.
    pub principal: Principal,
    /// Base64url device key.
    device_key: String,
    /// When the identity was established in this session.
    pub issued_at: DateTime<Utc>,
}

impl Identity {
    /// Generate a fresh identity with a new random device key.
    #[must_use]
    pub fn generate() -> Self {
        let mut key = [0u8; DEVICE_KEY_LEN];
        rand::rng().fill_bytes(&mut key);
        Self::from_device_key(&key)
    }

    /// Identity for an existing device key.
    #[must_use]
    pub fn from_device_key(key: &[u8; DEVICE_KEY_LEN]) -> Self {
        Self {
            principal: Principal::self_authenticating(key),
            device_key: URL_SAFE_NO_PAD.encode(key),
            issued_at: Utc::now(),
        }
    }

    /// Restore an identity from its recovery key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is not base64url or has the wrong length.
    pub fn from_recovery_key(recovery_key: &str) -> Result<Self, IdentityError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(recovery_key.trim())
            .map_err(|_| IdentityError::InvalidEncoding)?;
        let key: [u8; DEVICE_KEY_LEN] = bytes
            .try_into()
            .map_err(|_| IdentityError::InvalidLength)?;
        Ok(Self::from_device_key(&key))
    }

    /// Key that restores this identity on another device.
    #[must_use]
    pub fn recovery_key(&self) -> &str {
        &self.device_key
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("principal", &self.principal)
            .field("device_key", &"[REDACTED]")
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// Session keys for identity data.
pub mod keys {
    /// Key for storing the current identity.
    pub const IDENTITY: &str = "identity";

    /// Prefix of per-principal admin panel session flags.
    pub const ADMIN_PANEL_SESSION_PREFIX: &str = "admin_panel_session_";

    /// Key for the flash message shown after a redirect.
    pub const FLASH: &str = "flash";
}
