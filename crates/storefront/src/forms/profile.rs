//! Caller profile form.

use cardshop_core::UserProfile;
use serde::Deserialize;

use super::FieldErrors;
use super::rules::{present, valid_email};

pub const ALL_FIELDS_REQUIRED_MESSAGE: &str = "All fields are required";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

impl ProfileForm {
    /// Trimmed profile, or the field errors.
    ///
    /// # Errors
    ///
    /// Every field is required and the email must look like an address.
    pub fn validate(&self) -> Result<UserProfile, FieldErrors> {
        let mut errors = FieldErrors::new();
        for (field, value) in [("name", &self.name), ("email", &self.email), ("phone", &self.phone)] {
            if present(value).is_none() {
                errors.add(field, ALL_FIELDS_REQUIRED_MESSAGE);
            }
        }
        if !errors.has("email") && !valid_email(&self.email) {
            errors.add("email", "Please enter a valid email address");
        }

        errors.into_result(UserProfile {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
        })
    }
}

impl From<&UserProfile> for ProfileForm {
    fn from(profile: &UserProfile) -> Self {
        Self {
            name: profile.name.clone(),
            email: profile.email.clone(),
            phone: profile.phone.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_fields() {
        let errors = ProfileForm::default().validate().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors.get("phone"), Some(ALL_FIELDS_REQUIRED_MESSAGE));
    }

    #[test]
    fn test_invalid_email() {
        let form = ProfileForm {
            name: "Jane".to_string(),
            email: "jane".to_string(),
            phone: "555".to_string(),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("email"), Some("Please enter a valid email address"));

        let padded = ProfileForm {
            email: " jane@example.com ".to_string(),
            ..form
        };
        let errors = padded.validate().unwrap_err();
        assert_eq!(errors.get("email"), Some("Please enter a valid email address"));
    }

    #[test]
    fn test_trims_values() {
        let form = ProfileForm {
            name: " Jane Doe ".to_string(),
            email: "jane@example.com".to_string(),
            phone: " 5551234567".to_string(),
        };
        let profile = form.validate().unwrap();
        assert_eq!(profile.name, "Jane Doe");
        assert_eq!(profile.email, "jane@example.com");
        assert_eq!(profile.phone, "5551234567");
    }
}
