//! Cache keys for backend queries.

use std::fmt;

use cardshop_core::{OrderId, Principal};

/// Ordered list of key parts, e.g. `["myOrders", "<principal>"]`.
///
/// Identity-scoped keys end with the caller's principal so cached data is
/// never shared between callers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    /// Key with a single root part.
    #[must_use]
    pub fn new(root: impl Into<String>) -> Self {
        Self(vec![root.into()])
    }

    /// Append a part.
    #[must_use]
    pub fn with(mut self, part: impl ToString) -> Self {
        self.0.push(part.to_string());
        self
    }

    /// Key parts in order.
    #[must_use]
    pub fn parts(&self) -> &[String] {
        &self.0
    }

    /// Whether `prefix` matches the leading parts of this key.
    #[must_use]
    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Whether any part equals `part`.
    #[must_use]
    pub fn mentions(&self, part: &str) -> bool {
        self.0.iter().any(|p| p == part)
    }

    // =========================================================================
    // Roots used for invalidation
    // =========================================================================

    pub const ORDERS: &'static str = "orders";
    pub const ORDER: &'static str = "order";
    pub const MY_ORDERS: &'static str = "myOrders";
    pub const CURRENT_USER_PROFILE: &'static str = "currentUserProfile";
    pub const IS_ADMIN: &'static str = "isAdmin";
    pub const BANNED_USERS: &'static str = "bannedUsers";
    pub const IS_BANNED: &'static str = "isBanned";

    // =========================================================================
    // Identity-scoped keys
    // =========================================================================

    /// Every order, as seen by an admin.
    #[must_use]
    pub fn orders(caller: &Principal) -> Self {
        Self::new(Self::ORDERS).with(caller)
    }

    /// One order.
    #[must_use]
    pub fn order(id: OrderId, caller: &Principal) -> Self {
        Self::new(Self::ORDER).with(id).with(caller)
    }

    /// The caller's own orders.
    #[must_use]
    pub fn my_orders(caller: &Principal) -> Self {
        Self::new(Self::MY_ORDERS).with(caller)
    }

    /// The caller's profile.
    #[must_use]
    pub fn current_user_profile(caller: &Principal) -> Self {
        Self::new(Self::CURRENT_USER_PROFILE).with(caller)
    }

    /// The caller's admin flag.
    #[must_use]
    pub fn is_admin(caller: &Principal) -> Self {
        Self::new(Self::IS_ADMIN).with(caller)
    }

    /// The ban list, as seen by an admin.
    #[must_use]
    pub fn banned_users(caller: &Principal) -> Self {
        Self::new(Self::BANNED_USERS).with(caller)
    }

    /// Whether the caller is banned.
    #[must_use]
    pub fn is_banned(caller: &Principal) -> Self {
        Self::new(Self::IS_BANNED).with(caller)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}
