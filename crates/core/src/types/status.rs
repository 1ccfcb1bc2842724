//! Status enums for orders and users.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a status string is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct UnknownStatus {
    kind: &'static str,
    value: String,
}

/// Order fulfillment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Shipped,
}

impl OrderStatus {
    /// All statuses, in display order.
    pub const ALL: [Self; 2] = [Self::Pending, Self::Shipped];

    /// Wire value (`pending`, `shipped`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Shipped => "shipped",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Shipped => "Shipped",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus {
                kind: "order status",
                value: s.to_string(),
            })
    }
}

/// Whether the customer has been contacted about payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum PaymentContactStatus {
    #[default]
    NotContacted,
    Contacted,
    PaymentReceived,
}

impl PaymentContactStatus {
    /// All statuses, in workflow order.
    pub const ALL: [Self; 3] = [Self::NotContacted, Self::Contacted, Self::PaymentReceived];

    /// Wire value (`notContacted`, `contacted`, `paymentReceived`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotContacted => "notContacted",
            Self::Contacted => "contacted",
            Self::PaymentReceived => "paymentReceived",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotContacted => "Not Contacted",
            Self::Contacted => "Contacted",
            Self::PaymentReceived => "Payment Received",
        }
    }
}

impl fmt::Display for PaymentContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PaymentContactStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus {
                kind: "payment contact status",
                value: s.to_string(),
            })
    }
}

/// Role of a caller as tracked by the backend's access control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum UserRole {
    Admin,
    User,
    #[default]
    Guest,
}

impl UserRole {
    /// Wire value (`admin`, `user`, `guest`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
            Self::Guest => "guest",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::Admin, Self::User, Self::Guest]
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownStatus {
                kind: "user role",
                value: s.to_string(),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_labels() {
        assert_eq!(OrderStatus::Pending.label(), "Pending");
        assert_eq!(OrderStatus::Shipped.to_string(), "Shipped");
    }

    #[test]
    fn test_payment_contact_labels() {
        assert_eq!(PaymentContactStatus::NotContacted.label(), "Not Contacted");
        assert_eq!(PaymentContactStatus::Contacted.label(), "Contacted");
        assert_eq!(
            PaymentContactStatus::PaymentReceived.label(),
            "Payment Received"
        );
    }

    #[test]
    fn test_serde_wire_values() {
        assert_eq!(
            serde_json::to_string(&PaymentContactStatus::PaymentReceived).unwrap(),
            "\"paymentReceived\""
        );
        let status: OrderStatus = serde_json::from_str("\"shipped\"").unwrap();
        assert_eq!(status, OrderStatus::Shipped);
        let role: UserRole = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, UserRole::Admin);
    }

    #[test]
    fn test_from_str_matches_wire_values() {
        assert_eq!(
            "notContacted".parse::<PaymentContactStatus>().unwrap(),
            PaymentContactStatus::NotContacted
        );
        assert_eq!("pending".parse::<OrderStatus>().unwrap(), OrderStatus::Pending);
        assert_eq!("guest".parse::<UserRole>().unwrap(), UserRole::Guest);

        let err = "Pending".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.to_string(), "unknown order status: Pending");
    }
}
