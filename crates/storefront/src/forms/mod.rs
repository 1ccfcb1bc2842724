//! Form parsing and field validation.
//!
//! Every form reports failures as [`FieldErrors`]: at most one message per
//! field, keyed by the field's form name so templates can render the message
//! next to the input that caused it.
//!
//! # Forms
//!
//! - `order` - The multi-step order form, including blur validation
//! - `upload` - Photo and signature uploads
//! - `profile` - Caller profile setup
//! - `admin` - Admin edit of customer and shipping details
//! - `generators` - Random card name and address

pub mod admin;
pub mod generators;
pub mod order;
pub mod profile;
pub mod upload;

use std::collections::BTreeMap;

use serde::Serialize;

pub use admin::OrderEditForm;
pub use generators::{GeneratedAddress, generate_address, generate_full_name};
pub use order::{GENERAL_ERROR_MESSAGE, LOGIN_REQUIRED_MESSAGE, OrderField, OrderForm};
pub use profile::ProfileForm;
pub use upload::{ALLOWED_IMAGE_TYPES, MAX_UPLOAD_BYTES, Upload};

/// Validation messages keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` for `field`, keeping the first message if one exists.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    /// Record the result of a single-field check.
    pub fn check(&mut self, field: &str, result: Option<&'static str>) {
        if let Some(message) = result {
            self.add(field, message);
        }
    }

    /// Message for `field`, if it failed.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(value)` when no field failed.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field failed.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

/// Two-letter codes and names for the state selects.
pub const US_STATES: [(&str, &str); 51] = [
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("DC", "District of Columbia"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VA", "Virginia"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
];

/// Shared field rules.
pub(crate) mod rules {
    use cardshop_core::{Email, ZipCode};

    /// Trimmed value, or `None` when blank.
    pub fn present(value: &str) -> Option<&str> {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    pub fn min_chars(value: &str, min: usize) -> bool {
        value.trim().chars().count() >= min
    }

    /// Checked as typed; surrounding whitespace fails.
    pub fn valid_email(value: &str) -> bool {
        Email::parse(value).is_ok()
    }

    pub fn valid_zip(value: &str) -> bool {
        ZipCode::parse(value.trim()).is_ok()
    }
}
