//! The order form.
//!
//! Fields are validated one at a time when the customer leaves an input
//! (`POST /order/validate/{field}`) and all together on submit. Submission is
//! blocked while any field has an error.

use std::fmt;
use std::str::FromStr;

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use cardshop_core::{Address, IdInformation, NewOrder};

use super::generators::{generate_address, generate_full_name};
use super::rules::{min_chars, present, valid_email, valid_zip};
use super::upload::{self, Upload};
use super::FieldErrors;

/// Shown above the form when any field failed.
pub const GENERAL_ERROR_MESSAGE: &str = "Please fix the errors above before submitting";

/// Shown when the session has no identity at submit time.
pub const LOGIN_REQUIRED_MESSAGE: &str =
    "You must be logged in to place an order. Please log in and try again.";

const NAME_TOO_SHORT: &str = "Name must be at least 2 characters";
const INVALID_ZIP: &str = "Please enter a valid ZIP code";

/// A validated text field of the order form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderField {
    CustomerName,
    Email,
    Phone,
    Street,
    City,
    State,
    Zip,
    IdName,
    IdDateOfBirth,
    IdSex,
    IdHeight,
    IdHairColor,
    IdEyeColor,
    IdStreet,
    IdCity,
    IdState,
    IdZip,
}

impl OrderField {
    /// Every validated text field, in form order.
    pub const ALL: [Self; 17] = [
        Self::CustomerName,
        Self::Email,
        Self::Phone,
        Self::Street,
        Self::City,
        Self::State,
        Self::Zip,
        Self::IdName,
        Self::IdDateOfBirth,
        Self::IdSex,
        Self::IdHeight,
        Self::IdHairColor,
        Self::IdEyeColor,
        Self::IdStreet,
        Self::IdCity,
        Self::IdState,
        Self::IdZip,
    ];

    /// Form field name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CustomerName => "customer_name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Street => "street",
            Self::City => "city",
            Self::State => "state",
            Self::Zip => "zip",
            Self::IdName => "id_name",
            Self::IdDateOfBirth => "id_date_of_birth",
            Self::IdSex => "id_sex",
            Self::IdHeight => "id_height",
            Self::IdHairColor => "id_hair_color",
            Self::IdEyeColor => "id_eye_color",
            Self::IdStreet => "id_street",
            Self::IdCity => "id_city",
            Self::IdState => "id_state",
            Self::IdZip => "id_zip",
        }
    }

    const fn required_message(self) -> &'static str {
        match self {
            Self::CustomerName => "Full name is required",
            Self::Email => "Email address is required",
            Self::Phone => "Phone number is required",
            Self::Street => "Street address is required",
            Self::City => "City is required",
            Self::State => "State is required",
            Self::Zip => "ZIP code is required",
            Self::IdName => "Name on ID is required",
            Self::IdDateOfBirth => "Date of birth is required",
            Self::IdSex => "Sex/Gender is required",
            Self::IdHeight => "Height is required",
            Self::IdHairColor => "Hair color is required",
            Self::IdEyeColor => "Eye color is required",
            Self::IdStreet => "ID address street is required",
            Self::IdCity => "ID address city is required",
            Self::IdState => "ID address state is required",
            Self::IdZip => "ID address ZIP is required",
        }
    }

    /// Error for `value`, or `None` when it passes.
    #[must_use]
    pub fn validate(self, value: &str) -> Option<&'static str> {
        let Some(value) = present(value) else {
            return Some(self.required_message());
        };

        match self {
            Self::CustomerName | Self::IdName if !min_chars(value, 2) => Some(NAME_TOO_SHORT),
            Self::Email if !valid_email(value) => Some("Please enter a valid email address"),
            Self::Phone if !min_chars(value, 10) => Some("Please enter a valid phone number"),
            Self::Street if !min_chars(value, 5) => Some("Please enter a complete street address"),
            Self::City if !min_chars(value, 2) => Some("Please enter a valid city name"),
            Self::Zip | Self::IdZip if !valid_zip(value) => Some(INVALID_ZIP),
            _ => None,
        }
    }
}

impl fmt::Display for OrderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned for a field name the order form does not validate.
#[derive(Debug, thiserror::Error)]
#[error("unknown order field: {0}")]
pub struct UnknownField(String);

impl FromStr for OrderField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.name() == s)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

/// Text values of the order form.
#[derive(Debug, Clone, Default)]
pub struct OrderForm {
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub id_name: String,
    pub id_date_of_birth: String,
    pub id_sex: String,
    pub id_height: String,
    pub id_weight: String,
    pub id_hair_color: String,
    pub id_eye_color: String,
    pub id_street: String,
    pub id_city: String,
    pub id_state: String,
    pub id_zip: String,
    /// Fill the card name from the generator.
    pub generate_name: bool,
    /// Fill the card address from the generator.
    pub generate_id_address: bool,
}

impl OrderForm {
    /// Current value of a validated field.
    #[must_use]
    pub fn value(&self, field: OrderField) -> &str {
        match field {
            OrderField::CustomerName => &self.customer_name,
            OrderField::Email => &self.email,
            OrderField::Phone => &self.phone,
            OrderField::Street => &self.street,
            OrderField::City => &self.city,
            OrderField::State => &self.state,
            OrderField::Zip => &self.zip,
            OrderField::IdName => &self.id_name,
            OrderField::IdDateOfBirth => &self.id_date_of_birth,
            OrderField::IdSex => &self.id_sex,
            OrderField::IdHeight => &self.id_height,
            OrderField::IdHairColor => &self.id_hair_color,
            OrderField::IdEyeColor => &self.id_eye_color,
            OrderField::IdStreet => &self.id_street,
            OrderField::IdCity => &self.id_city,
            OrderField::IdState => &self.id_state,
            OrderField::IdZip => &self.id_zip,
        }
    }

    fn set(&mut self, name: &str, value: String) {
        match name {
            "customer_name" => self.customer_name = value,
            "email" => self.email = value,
            "phone" => self.phone = value,
            "street" => self.street = value,
            "city" => self.city = value,
            "state" => self.state = value,
            "zip" => self.zip = value,
            "id_name" => self.id_name = value,
            "id_date_of_birth" => self.id_date_of_birth = value,
            "id_sex" => self.id_sex = value,
            "id_height" => self.id_height = value,
            "id_weight" => self.id_weight = value,
            "id_hair_color" => self.id_hair_color = value,
            "id_eye_color" => self.id_eye_color = value,
            "id_street" => self.id_street = value,
            "id_city" => self.id_city = value,
            "id_state" => self.id_state = value,
            "id_zip" => self.id_zip = value,
            "generate_name" => self.generate_name = is_checked(&value),
            "generate_id_address" => self.generate_id_address = is_checked(&value),
            _ => {}
        }
    }

    /// Fill blank card name and address when the generator boxes are ticked.
    pub fn apply_generators(&mut self) {
        if self.generate_name && self.id_name.trim().is_empty() {
            self.id_name = generate_full_name();
        }
        if self.generate_id_address
            && [&self.id_street, &self.id_city, &self.id_state, &self.id_zip]
                .iter()
                .all(|v| v.trim().is_empty())
        {
            let address = generate_address();
            self.id_street = address.street;
            self.id_city = address.city;
            self.id_state = address.state;
            self.id_zip = address.zip;
        }
    }

    /// Check every text field.
    #[must_use]
    pub fn field_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for field in OrderField::ALL {
            errors.check(field.name(), field.validate(self.value(field)));
        }
        errors
    }

    fn shipping_address(&self) -> Address {
        Address {
            street: self.street.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            zip: self.zip.trim().to_string(),
        }
    }

    fn id_address(&self) -> Address {
        Address {
            street: self.id_street.trim().to_string(),
            city: self.id_city.trim().to_string(),
            state: self.id_state.trim().to_string(),
            zip: self.id_zip.trim().to_string(),
        }
    }
}

fn is_checked(value: &str) -> bool {
    matches!(value, "on" | "true" | "1")
}

/// A complete multipart order submission.
#[derive(Debug, Clone, Default)]
pub struct OrderSubmission {
    pub form: OrderForm,
    pub photo: Option<Upload>,
    /// PNG data URL drawn on the signature pad.
    pub signature_data: Option<String>,
    /// Uploaded signature image, used when the pad is unavailable.
    pub signature_file: Option<Upload>,
}

impl OrderSubmission {
    /// Read every part of the multipart body.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid multipart.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, MultipartError> {
        let mut submission = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "photo" | "signature_file" => {
                    let upload = Upload {
                        file_name: field.file_name().map(String::from),
                        content_type: field.content_type().map(String::from),
                        bytes: field.bytes().await?,
                    };
                    if name == "photo" {
                        submission.photo = Some(upload);
                    } else {
                        submission.signature_file = Some(upload);
                    }
                }
                "signature_data" => submission.signature_data = Some(field.text().await?),
                _ => {
                    let value = field.text().await?;
                    submission.form.set(&name, value);
                }
            }
        }

        Ok(submission)
    }

    /// Validate every field and build the backend payload.
    ///
    /// # Errors
    ///
    /// Returns one message per failing field, including photo and signature.
    pub fn validate(&self) -> Result<NewOrder, FieldErrors> {
        let form = &self.form;
        let mut errors = form.field_errors();

        let photo = upload::photo_blob(self.photo.clone())
            .map_err(|message| errors.add("photo", message))
            .ok();
        let signature =
            upload::signature_blob(self.signature_data.as_deref(), self.signature_file.clone())
                .map_err(|message| errors.add("signature", message))
                .ok();

        errors.into_result(NewOrder {
            customer_name: form.customer_name.trim().to_string(),
            email: form.email.trim().to_string(),
            phone: form.phone.trim().to_string(),
            shipping_address: form.shipping_address(),
            id_info: IdInformation {
                name: form.id_name.trim().to_string(),
                date_of_birth: form.id_date_of_birth.trim().to_string(),
                sex: form.id_sex.trim().to_string(),
                height: form.id_height.trim().to_string(),
                weight: form.id_weight.trim().to_string(),
                hair_color: form.id_hair_color.trim().to_string(),
                eye_color: form.id_eye_color.trim().to_string(),
                address: form.id_address(),
                photo,
                signature,
            },
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Bytes;

    use super::*;

    const PNG_HEADER: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn filled_form() -> OrderForm {
        OrderForm {
            customer_name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            phone: "555-123-4567".to_string(),
            street: "123 Main St".to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            zip: "62701".to_string(),
            id_name: "Jane Q Doe".to_string(),
            id_date_of_birth: "1990-04-01".to_string(),
            id_sex: "F".to_string(),
            id_height: "5'6\"".to_string(),
            id_weight: String::new(),
            id_hair_color: "Brown".to_string(),
            id_eye_color: "Green".to_string(),
            id_street: "9 Elm Ct".to_string(),
            id_city: "Salem".to_string(),
            id_state: "OR".to_string(),
            id_zip: "97301-1234".to_string(),
            generate_name: false,
            generate_id_address: false,
        }
    }

    fn complete_submission() -> OrderSubmission {
        OrderSubmission {
            form: filled_form(),
            photo: Some(Upload {
                file_name: Some("me.png".to_string()),
                content_type: Some("image/png".to_string()),
                bytes: Bytes::from_static(&PNG_HEADER),
            }),
            signature_data: Some("data:image/png;base64,iVBORw0KGgo=".to_string()),
            signature_file: None,
        }
    }

    #[test]
    fn test_field_names_round_trip() {
        for field in OrderField::ALL {
            assert_eq!(field.name().parse::<OrderField>().unwrap(), field);
        }
        assert!("photo".parse::<OrderField>().is_err());
    }

    #[test]
    fn test_required_messages() {
        assert_eq!(
            OrderField::CustomerName.validate("   "),
            Some("Full name is required")
        );
        assert_eq!(OrderField::IdSex.validate(""), Some("Sex/Gender is required"));
        assert_eq!(
            OrderField::IdZip.validate(""),
            Some("ID address ZIP is required")
        );
    }

    #[test]
    fn test_length_and_format_rules() {
        assert_eq!(OrderField::CustomerName.validate("J"), Some(NAME_TOO_SHORT));
        assert_eq!(OrderField::IdName.validate(" J "), Some(NAME_TOO_SHORT));
        assert_eq!(
            OrderField::Email.validate("abc"),
            Some("Please enter a valid email address")
        );
        assert_eq!(OrderField::Email.validate("a@b.co"), None);
        assert_eq!(
            OrderField::Email.validate(" a@b.co "),
            Some("Please enter a valid email address")
        );
        assert_eq!(
            OrderField::Phone.validate("555-1234"),
            Some("Please enter a valid phone number")
        );
        assert_eq!(
            OrderField::Street.validate("1 A"),
            Some("Please enter a complete street address")
        );
        assert_eq!(
            OrderField::City.validate("X"),
            Some("Please enter a valid city name")
        );
        assert_eq!(OrderField::Zip.validate("1234"), Some(INVALID_ZIP));
        assert_eq!(OrderField::Zip.validate("12345"), None);
        assert_eq!(OrderField::IdZip.validate("12345-6789"), None);
        assert_eq!(OrderField::IdHeight.validate("6'1\""), None);
    }

    #[test]
    fn test_empty_submission_reports_every_field() {
        let errors = OrderSubmission::default().validate().unwrap_err();
        assert_eq!(errors.len(), OrderField::ALL.len() + 2);
        assert_eq!(errors.get("customer_name"), Some("Full name is required"));
        assert_eq!(errors.get("photo"), Some(upload::PHOTO_REQUIRED_MESSAGE));
        assert_eq!(
            errors.get("signature"),
            Some(upload::SIGNATURE_REQUIRED_MESSAGE)
        );
        assert!(!errors.has("id_weight"));
    }

    #[test]
    fn test_complete_submission_builds_payload() {
        let order = complete_submission().validate().unwrap();
        assert_eq!(order.customer_name, "Jane Doe");
        assert_eq!(order.shipping_address.zip, "62701");
        assert_eq!(order.id_info.address.city, "Salem");
        assert_eq!(order.id_info.weight, "");
        assert_eq!(
            order.id_info.photo.as_ref().unwrap().bytes().unwrap(),
            PNG_HEADER
        );
        assert!(order.id_info.signature.is_some());
    }

    #[test]
    fn test_bad_photo_blocks_submission() {
        let mut submission = complete_submission();
        submission.photo = Some(Upload {
            file_name: Some("scan.pdf".to_string()),
            content_type: Some("application/pdf".to_string()),
            bytes: Bytes::from_static(b"%PDF"),
        });
        let errors = submission.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("photo"), Some(upload::INVALID_IMAGE_MESSAGE));
    }

    #[test]
    fn test_generators_fill_blank_card_fields() {
        let mut form = OrderForm {
            generate_name: true,
            generate_id_address: true,
            ..OrderForm::default()
        };
        form.apply_generators();
        assert_eq!(OrderField::IdName.validate(&form.id_name), None);
        assert_eq!(OrderField::IdZip.validate(&form.id_zip), None);

        let mut typed = filled_form();
        typed.generate_name = true;
        typed.apply_generators();
        assert_eq!(typed.id_name, "Jane Q Doe");
    }

    #[test]
    fn test_set_checkbox_values() {
        let mut form = OrderForm::default();
        form.set("generate_name", "on".to_string());
        form.set("unknown", "ignored".to_string());
        form.set("id_weight", "150 lbs".to_string());
        assert!(form.generate_name);
        assert!(!form.generate_id_address);
        assert_eq!(form.id_weight, "150 lbs");
    }
}
