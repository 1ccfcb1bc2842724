//! User bans and the admin users overview.

use std::collections::HashSet;

use cardshop_core::{Order, Principal};
use tracing::{info, instrument};

use crate::backend::{Backend, BackendResult};
use crate::query::{QueryClient, QueryError, QueryKey, QueryOptions};

/// Shown when ban-by-principal input does not parse.
pub const INVALID_PRINCIPAL_MESSAGE: &str = "Invalid principal ID format";

/// Shown when ban-by-principal input is blank.
pub const MISSING_PRINCIPAL_MESSAGE: &str = "Please enter a principal ID";

/// Ban operations with cache invalidation on writes.
pub struct BanService<'a> {
    backend: &'a dyn Backend,
    queries: &'a QueryClient,
}

impl<'a> BanService<'a> {
    #[must_use]
    pub const fn new(backend: &'a dyn Backend, queries: &'a QueryClient) -> Self {
        Self { backend, queries }
    }

    /// Every banned principal (admin only).
    ///
    /// # Errors
    ///
    /// Returns an error if the query is disabled or the backend fails.
    pub async fn banned_users(&self, caller: &Principal) -> Result<Vec<Principal>, QueryError> {
        self.queries
            .fetch(
                &QueryKey::banned_users(caller),
                QueryOptions::enabled_if(self.backend.is_ready()),
                || self.backend.get_banned_users(caller),
            )
            .await
    }

    /// Whether the caller is banned.
    ///
    /// # Errors
    ///
    /// Returns an error if the query is disabled or the backend fails.
    pub async fn is_banned(&self, caller: &Principal) -> Result<bool, QueryError> {
        self.queries
            .fetch(
                &QueryKey::is_banned(caller),
                QueryOptions::enabled_if(self.backend.is_ready()),
                || self.backend.is_banned_user(caller, caller),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns the backend's rejection.
    #[instrument(skip(self), fields(caller = %caller, user = %user))]
    pub async fn ban(&self, caller: &Principal, user: &Principal) -> BackendResult<()> {
        self.backend.ban_user(caller, user).await?;
        self.invalidate().await;
        info!("User banned");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns the backend's rejection.
    #[instrument(skip(self), fields(caller = %caller, user = %user))]
    pub async fn unban(&self, caller: &Principal, user: &Principal) -> BackendResult<()> {
        self.backend.unban_user(caller, user).await?;
        self.invalidate().await;
        info!("User unbanned");
        Ok(())
    }

    async fn invalidate(&self) {
        self.queries
            .invalidate(&[QueryKey::BANNED_USERS, QueryKey::IS_BANNED])
            .await;
    }
}

/// Parse principal text typed into the ban form.
///
/// # Errors
///
/// Returns the message to show next to the input.
pub fn parse_principal_input(input: &str) -> Result<Principal, &'static str> {
    let input = input.trim();
    if input.is_empty() {
        return Err(MISSING_PRINCIPAL_MESSAGE);
    }
    Principal::parse(input).map_err(|_| INVALID_PRINCIPAL_MESSAGE)
}

/// A customer seen on at least one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownUser {
    pub principal: Principal,
    pub customer_name: String,
    pub email: String,
    pub banned: bool,
}

/// Users overview for the admin users page.
#[derive(Debug, Clone, Default)]
pub struct UsersOverview {
    /// Order owners, in order of first appearance.
    pub known: Vec<KnownUser>,
    pub banned: Vec<Principal>,
}

impl UsersOverview {
    /// Collect unique order owners (name and email from their first order)
    /// and flag the banned ones.
    #[must_use]
    pub fn build(orders: &[Order], banned: Vec<Principal>) -> Self {
        let banned_set: HashSet<&Principal> = banned.iter().collect();
        let mut seen = HashSet::new();
        let known = orders
            .iter()
            .filter(|order| seen.insert(&order.owner))
            .map(|order| KnownUser {
                principal: order.owner.clone(),
                customer_name: order.customer_name.clone(),
                email: order.email.clone(),
                banned: banned_set.contains(&order.owner),
            })
            .collect();

        Self { known, banned }
    }

    /// Known users who are not banned.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.known.iter().filter(|u| !u.banned).count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use cardshop_core::{
        Address, IdInformation, OrderId, OrderStatus, PaymentContactStatus, UserRole,
    };

    use super::*;
    use crate::backend::InMemoryBackend;

    fn principal(seed: u8) -> Principal {
        Principal::self_authenticating(&[seed; 32])
    }

    fn order(id: u64, owner: &Principal, name: &str) -> Order {
        Order {
            id: OrderId::new(id),
            customer_name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: "5551234567".to_string(),
            shipping_address: Address::default(),
            id_info: IdInformation::default(),
            status: OrderStatus::Pending,
            payment_contact_status: PaymentContactStatus::NotContacted,
            contact_notes: String::new(),
            tracking_number: None,
            created_time: 0,
            owner: owner.clone(),
        }
    }

    #[test]
    fn test_parse_principal_input() {
        assert_eq!(
            parse_principal_input("  2vxsx-fae ").unwrap(),
            Principal::anonymous()
        );
        assert_eq!(parse_principal_input("   ").unwrap_err(), MISSING_PRINCIPAL_MESSAGE);
        assert_eq!(
            parse_principal_input("not a principal").unwrap_err(),
            INVALID_PRINCIPAL_MESSAGE
        );
    }

    #[test]
    fn test_overview_deduplicates_owners() {
        let alice = principal(1);
        let bob = principal(2);
        let orders = vec![
            order(1, &alice, "Alice"),
            order(2, &bob, "Bob"),
            order(3, &alice, "Alicia"),
        ];

        let overview = UsersOverview::build(&orders, vec![bob.clone()]);
        assert_eq!(overview.known.len(), 2);
        assert_eq!(overview.known[0].customer_name, "Alice");
        assert!(!overview.known[0].banned);
        assert!(overview.known[1].banned);
        assert_eq!(overview.active_count(), 1);
        assert_eq!(overview.banned, vec![bob]);
    }

    #[tokio::test]
    async fn test_ban_invalidates_ban_state() {
        let backend = InMemoryBackend::new(None);
        let queries = QueryClient::new(Duration::from_secs(60));
        let service = BanService::new(&backend, &queries);
        let admin = principal(1);
        let user = principal(2);
        backend.grant_role(&admin, UserRole::Admin).await;

        assert!(!service.is_banned(&user).await.unwrap());
        assert!(service.banned_users(&admin).await.unwrap().is_empty());

        service.ban(&admin, &user).await.unwrap();
        assert!(!queries.contains(&QueryKey::is_banned(&user)));
        assert!(service.is_banned(&user).await.unwrap());
        assert_eq!(service.banned_users(&admin).await.unwrap(), vec![user.clone()]);

        service.unban(&admin, &user).await.unwrap();
        assert!(!service.is_banned(&user).await.unwrap());
    }
}
