//! Core types for Cardshop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod blob;
pub mod email;
pub mod id;
pub mod order;
pub mod price;
pub mod principal;
pub mod status;
pub mod zip;

pub use blob::{BlobError, ExternalBlob};
pub use email::{Email, EmailError};
pub use id::*;
pub use order::{
    Address, IdInformation, NewOrder, Order, OrderUpdate, Time, UserProfile, format_order_date,
    from_datetime, to_datetime,
};
pub use price::{CurrencyCode, Price, PricingTier};
pub use principal::{Principal, PrincipalError};
pub use status::*;
pub use zip::{ZipCode, ZipCodeError};
