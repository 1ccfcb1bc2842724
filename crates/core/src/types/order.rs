//! Order records exchanged with the order backend.
//!
//! Field names serialize in camelCase to match the backend's wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::blob::ExternalBlob;
use super::id::OrderId;
use super::principal::Principal;
use super::status::{OrderStatus, PaymentContactStatus};

/// Backend timestamp: nanoseconds since the Unix epoch.
pub type Time = i64;

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Format a backend timestamp as `January 5, 2026, 03:04 PM` (UTC).
///
/// Timestamps outside chrono's representable range render as an empty string.
#[must_use]
pub fn format_order_date(time: Time) -> String {
    to_datetime(time)
        .map(|dt| dt.format("%B %-d, %Y, %I:%M %p").to_string())
        .unwrap_or_default()
}

/// Convert a backend timestamp to a UTC datetime.
#[must_use]
pub fn to_datetime(time: Time) -> Option<DateTime<Utc>> {
    let secs = time.div_euclid(NANOS_PER_SECOND);
    let nanos = u32::try_from(time.rem_euclid(NANOS_PER_SECOND)).ok()?;
    DateTime::from_timestamp(secs, nanos)
}

/// Convert a UTC datetime into a backend timestamp.
#[must_use]
pub fn from_datetime(dt: DateTime<Utc>) -> Time {
    dt.timestamp()
        .saturating_mul(NANOS_PER_SECOND)
        .saturating_add(i64::from(dt.timestamp_subsec_nanos()))
}

/// A postal address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl Address {
    /// Single-line rendering: `street, city, state zip`.
    #[must_use]
    pub fn one_line(&self) -> String {
        format!("{}, {}, {} {}", self.street, self.city, self.state, self.zip)
    }
}

/// Details printed on the card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdInformation {
    /// Name printed on the card.
    #[serde(default)]
    pub name: String,
    pub date_of_birth: String,
    pub sex: String,
    pub height: String,
    /// Optional; empty when not supplied.
    pub weight: String,
    pub hair_color: String,
    pub eye_color: String,
    /// Address printed on the card.
    #[serde(default)]
    pub address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<ExternalBlob>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<ExternalBlob>,
}

/// A customer order as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub shipping_address: Address,
    pub id_info: IdInformation,
    pub status: OrderStatus,
    pub payment_contact_status: PaymentContactStatus,
    #[serde(default)]
    pub contact_notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    pub created_time: Time,
    pub owner: Principal,
}

impl Order {
    /// Creation time formatted for display.
    #[must_use]
    pub fn created_display(&self) -> String {
        format_order_date(self.created_time)
    }

    /// Case-insensitive match against customer name and email, or a
    /// substring match on the order number.
    #[must_use]
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim();
        if term.is_empty() {
            return true;
        }
        let needle = term.to_lowercase();
        self.customer_name.to_lowercase().contains(&needle)
            || self.email.to_lowercase().contains(&needle)
            || self.id.to_string().contains(term)
    }
}

/// Payload for submitting a new order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub shipping_address: Address,
    pub id_info: IdInformation,
}

/// Admin edit of customer contact details and shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub shipping_address: Address,
}

/// Contact details a signed-in user keeps on file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_order() -> Order {
        Order {
            id: OrderId::new(1042),
            customer_name: "Jane Doe".to_string(),
            email: "Jane@Example.com".to_string(),
            phone: "5551234567".to_string(),
            shipping_address: Address {
                street: "123 Main St".to_string(),
                city: "Springfield".to_string(),
                state: "IL".to_string(),
                zip: "62701".to_string(),
            },
            id_info: IdInformation::default(),
            status: OrderStatus::Pending,
            payment_contact_status: PaymentContactStatus::NotContacted,
            contact_notes: String::new(),
            tracking_number: None,
            created_time: 0,
            owner: Principal::anonymous(),
        }
    }

    #[test]
    fn test_format_order_date() {
        let dt = Utc.with_ymd_and_hms(2026, 1, 5, 15, 4, 0).unwrap();
        let time = from_datetime(dt);
        assert_eq!(time, 1_767_625_440_000_000_000);
        assert_eq!(format_order_date(time), "January 5, 2026, 03:04 PM");
    }

    #[test]
    fn test_datetime_round_trip_preserves_nanos() {
        let time: Time = 1_767_625_440_123_456_789;
        assert_eq!(from_datetime(to_datetime(time).unwrap()), time);
    }

    #[test]
    fn test_matches_search() {
        let order = sample_order();
        assert!(order.matches_search(""));
        assert!(order.matches_search("jane"));
        assert!(order.matches_search("EXAMPLE.COM"));
        assert!(order.matches_search("104"));
        assert!(!order.matches_search("bob"));
    }

    #[test]
    fn test_order_wire_format() {
        let json = serde_json::to_value(sample_order()).unwrap();
        assert_eq!(json["id"], 1042);
        assert_eq!(json["customerName"], "Jane Doe");
        assert_eq!(json["paymentContactStatus"], "notContacted");
        assert_eq!(json["shippingAddress"]["zip"], "62701");
        assert_eq!(json["owner"], "2vxsx-fae");
        assert!(json.get("trackingNumber").is_none());
        assert!(json["idInfo"].get("photo").is_none());
    }

    #[test]
    fn test_address_one_line() {
        assert_eq!(
            sample_order().shipping_address.one_line(),
            "123 Main St, Springfield, IL 62701"
        );
    }
}
