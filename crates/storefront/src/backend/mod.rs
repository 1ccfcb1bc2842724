//! Order backend clients.
//!
//! # Architecture
//!
//! - The backend owns all persistent state: roles, profiles, orders, bans
//! - Every call carries the caller's principal; authorization happens remotely
//! - [`RemoteBackend`] talks JSON over HTTP with `reqwest`
//! - [`InMemoryBackend`] enforces the same rules locally for development and tests
//!
//! # Example
//!
//! ```rust,ignore
//! use cardshop_storefront::backend::{Backend, InMemoryBackend};
//!
//! let backend = InMemoryBackend::new(None);
//! backend.ensure_user_role(&caller).await?;
//! let orders = backend.get_my_orders(&caller).await?;
//! ```

mod blob;
mod memory;
mod remote;

pub use blob::{BlobResolver, MAX_BLOB_BYTES, ResolvedBlob};
pub use memory::InMemoryBackend;
pub use remote::{CALLER_HEADER, RemoteBackend};

use async_trait::async_trait;
use cardshop_core::{
    NewOrder, Order, OrderId, OrderStatus, OrderUpdate, PaymentContactStatus, Principal,
    UserProfile, UserRole,
};
use thiserror::Error;

/// Errors that can occur when calling the order backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend refused the call for this caller.
    #[error("{0}")]
    Unauthorized(String),

    /// The backend rejected the call (trap or business rule).
    #[error("{0}")]
    Rejected(String),

    /// The connection handle is not ready yet.
    #[error("Backend not ready")]
    NotReady,

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("Backend returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Truncated response body.
        body: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl BackendError {
    /// Build a rejection from a backend message, classifying authorization
    /// failures by their `Unauthorized` prefix.
    #[must_use]
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.contains("Unauthorized") {
            Self::Unauthorized(message)
        } else {
            Self::Rejected(message)
        }
    }

    /// Whether this is an authorization failure or a trap; role checks treat
    /// these as a negative answer rather than an error.
    #[must_use]
    pub fn is_access_rejection(&self) -> bool {
        match self {
            Self::Unauthorized(_) => true,
            Self::Rejected(message) | Self::Status { body: message, .. } => {
                message.contains("Unauthorized") || message.contains("trap")
            }
            _ => false,
        }
    }

    /// Whether retrying the call could succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Status { .. } | Self::NotReady)
    }
}

/// Result type alias for backend calls.
pub type BackendResult<T> = Result<T, BackendError>;

/// Operations exposed by the order backend.
///
/// Every method takes the calling principal. Implementations must apply the
/// backend's authorization rules for that caller.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Whether the connection handle is ready to serve calls.
    fn is_ready(&self) -> bool;

    // =========================================================================
    // Identity and roles
    // =========================================================================

    /// Register the caller as a user if it has no role yet.
    async fn ensure_user_role(&self, caller: &Principal) -> BackendResult<()>;

    /// Role of the caller (`guest` when unknown).
    async fn get_caller_user_role(&self, caller: &Principal) -> BackendResult<UserRole>;

    /// Whether the caller holds the admin role.
    async fn is_caller_admin(&self, caller: &Principal) -> BackendResult<bool>;

    /// Assign `role` to `user` (admin only).
    async fn assign_caller_user_role(
        &self,
        caller: &Principal,
        user: &Principal,
        role: UserRole,
    ) -> BackendResult<()>;

    /// Grant the admin role to the designated bootstrap caller.
    async fn assign_admin_role_to_caller(&self, caller: &Principal) -> BackendResult<()>;

    /// Check admin panel credentials for the caller.
    async fn admin_login(
        &self,
        caller: &Principal,
        username: &str,
        password: &str,
    ) -> BackendResult<bool>;

    // =========================================================================
    // Profiles
    // =========================================================================

    /// Profile of the caller, if one was saved.
    async fn get_caller_user_profile(&self, caller: &Principal)
    -> BackendResult<Option<UserProfile>>;

    /// Profile of another user (self or admin only).
    async fn get_user_profile(
        &self,
        caller: &Principal,
        user: &Principal,
    ) -> BackendResult<Option<UserProfile>>;

    /// Create or replace the caller's profile.
    async fn save_caller_user_profile(
        &self,
        caller: &Principal,
        profile: &UserProfile,
    ) -> BackendResult<()>;

    // =========================================================================
    // Orders
    // =========================================================================

    /// Place an order owned by the caller.
    async fn submit_order(&self, caller: &Principal, order: &NewOrder) -> BackendResult<OrderId>;

    /// Alias of [`Backend::submit_order`].
    async fn create_order(&self, caller: &Principal, order: &NewOrder) -> BackendResult<OrderId> {
        self.submit_order(caller, order).await
    }

    /// Every order (admin only).
    async fn get_all_orders(&self, caller: &Principal) -> BackendResult<Vec<Order>>;

    /// Orders owned by the caller.
    async fn get_my_orders(&self, caller: &Principal) -> BackendResult<Vec<Order>>;

    /// A single order (owner or admin).
    async fn get_order(&self, caller: &Principal, id: OrderId) -> BackendResult<Option<Order>>;

    /// Fulfillment status of a single order (owner or admin).
    async fn get_order_status(
        &self,
        caller: &Principal,
        id: OrderId,
    ) -> BackendResult<Option<OrderStatus>>;

    /// Set fulfillment status (admin only).
    async fn update_order_status(
        &self,
        caller: &Principal,
        id: OrderId,
        status: OrderStatus,
    ) -> BackendResult<()>;

    /// Set payment-contact status and notes (admin only).
    async fn update_payment_contact_status(
        &self,
        caller: &Principal,
        id: OrderId,
        status: PaymentContactStatus,
        notes: &str,
    ) -> BackendResult<()>;

    /// Edit customer contact details and shipping address (admin only).
    async fn update_order(
        &self,
        caller: &Principal,
        id: OrderId,
        update: &OrderUpdate,
    ) -> BackendResult<()>;

    /// Remove an order (admin only).
    async fn delete_order(&self, caller: &Principal, id: OrderId) -> BackendResult<()>;

    /// Attach or replace a shipment tracking number (admin only).
    async fn add_or_update_tracking_number(
        &self,
        caller: &Principal,
        id: OrderId,
        tracking_number: &str,
    ) -> BackendResult<()>;

    // =========================================================================
    // Bans
    // =========================================================================

    /// Every banned principal (admin only).
    async fn get_banned_users(&self, caller: &Principal) -> BackendResult<Vec<Principal>>;

    /// Whether `user` is banned (self or admin only).
    async fn is_banned_user(&self, caller: &Principal, user: &Principal) -> BackendResult<bool>;

    /// Ban `user` (admin only).
    async fn ban_user(&self, caller: &Principal, user: &Principal) -> BackendResult<()>;

    /// Lift a ban (admin only).
    async fn unban_user(&self, caller: &Principal, user: &Principal) -> BackendResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_message_classifies_unauthorized() {
        assert!(matches!(
            BackendError::from_message("Unauthorized: Only admins can view all orders"),
            BackendError::Unauthorized(_)
        ));
        assert!(matches!(
            BackendError::from_message("Order not found"),
            BackendError::Rejected(_)
        ));
    }

    #[test]
    fn test_is_access_rejection() {
        assert!(BackendError::Unauthorized("Unauthorized".to_string()).is_access_rejection());
        assert!(BackendError::Rejected("canister trap: boom".to_string()).is_access_rejection());
        assert!(!BackendError::Rejected("Order not found".to_string()).is_access_rejection());
        assert!(!BackendError::NotReady.is_access_rejection());
    }

    #[test]
    fn test_is_transient() {
        assert!(BackendError::NotReady.is_transient());
        assert!(
            BackendError::Status {
                status: 503,
                body: String::new()
            }
            .is_transient()
        );
        assert!(!BackendError::Rejected("no".to_string()).is_transient());
    }

    #[test]
    fn test_display_is_backend_message() {
        let err = BackendError::from_message("Unauthorized: Banned users cannot place orders");
        assert_eq!(
            err.to_string(),
            "Unauthorized: Banned users cannot place orders"
        );
    }
}
