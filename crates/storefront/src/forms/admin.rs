//! Admin edit of customer contact details and shipping address.

use cardshop_core::{Address, Order, OrderUpdate};
use serde::Deserialize;

use super::FieldErrors;
use super::rules::{present, valid_email};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrderEditForm {
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl OrderEditForm {
    /// Trimmed update, or the field errors.
    ///
    /// # Errors
    ///
    /// Every field is required and the email must look like an address.
    pub fn validate(&self) -> Result<OrderUpdate, FieldErrors> {
        let mut errors = FieldErrors::new();
        let required = [
            ("customer_name", &self.customer_name, "Customer name is required"),
            ("email", &self.email, "Email is required"),
            ("phone", &self.phone, "Phone is required"),
            ("street", &self.street, "Street address is required"),
            ("city", &self.city, "City is required"),
            ("state", &self.state, "State is required"),
            ("zip", &self.zip, "ZIP code is required"),
        ];
        for (field, value, message) in required {
            if present(value).is_none() {
                errors.add(field, message);
            }
        }
        if !errors.has("email") && !valid_email(&self.email) {
            errors.add("email", "Invalid email format");
        }

        errors.into_result(OrderUpdate {
            customer_name: self.customer_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            shipping_address: Address {
                street: self.street.trim().to_string(),
                city: self.city.trim().to_string(),
                state: self.state.trim().to_string(),
                zip: self.zip.trim().to_string(),
            },
        })
    }
}

impl From<&Order> for OrderEditForm {
    fn from(order: &Order) -> Self {
        Self {
            customer_name: order.customer_name.clone(),
            email: order.email.clone(),
            phone: order.phone.clone(),
            street: order.shipping_address.street.clone(),
            city: order.shipping_address.city.clone(),
            state: order.shipping_address.state.clone(),
            zip: order.shipping_address.zip.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_required_fields() {
        let errors = OrderEditForm::default().validate().unwrap_err();
        assert_eq!(errors.len(), 7);
        assert_eq!(errors.get("customer_name"), Some("Customer name is required"));
        assert_eq!(errors.get("email"), Some("Email is required"));
    }

    #[test]
    fn test_email_format() {
        let form = OrderEditForm {
            customer_name: "Jane".to_string(),
            email: "jane at example".to_string(),
            phone: "1".to_string(),
            street: "1".to_string(),
            city: "X".to_string(),
            state: "IL".to_string(),
            zip: "1".to_string(),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("email"), Some("Invalid email format"));
    }

    #[test]
    fn test_valid_update_is_trimmed() {
        let form = OrderEditForm {
            customer_name: " Jane ".to_string(),
            email: "jane@example.com".to_string(),
            phone: "5551234567".to_string(),
            street: " 1 Main St ".to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            zip: "62701".to_string(),
        };
        let update = form.validate().unwrap();
        assert_eq!(update.customer_name, "Jane");
        assert_eq!(update.shipping_address.street, "1 Main St");
    }
}
