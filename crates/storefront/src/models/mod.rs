//! Domain models for storefront.

pub mod session;

pub use session::{DEVICE_KEY_LEN, Identity, IdentityError, keys as session_keys};
