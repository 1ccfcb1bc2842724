//! In-process order backend.
//!
//! Mirrors the remote backend's access rules so the storefront can run
//! without a network dependency (local development, integration tests).

use std::collections::{BTreeMap, BTreeSet, HashMap};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use cardshop_core::{
    NewOrder, Order, OrderId, OrderStatus, OrderUpdate, PaymentContactStatus, Principal,
    UserProfile, UserRole, from_datetime,
};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{Backend, BackendError, BackendResult};

const ANONYMOUS_CALLER: &str = "Unauthorized: Anonymous callers are not allowed";
const ADMIN_ONLY: &str = "Unauthorized: Only admins can perform this action";
const OWNER_OR_ADMIN: &str = "Unauthorized: Only the owner or an admin can view this order";
const BANNED_CALLER: &str = "Unauthorized: Banned users cannot place orders";
const NOT_BOOTSTRAP: &str =
    "Unauthorized: Only the designated bootstrap principal can claim the admin role";
const ALREADY_ADMIN: &str = "Caller is already an admin";
const ORDER_NOT_FOUND: &str = "Order not found";

#[derive(Default)]
struct MemoryState {
    roles: HashMap<Principal, UserRole>,
    profiles: HashMap<Principal, UserProfile>,
    orders: BTreeMap<OrderId, Order>,
    next_order_id: u64,
    banned: BTreeSet<Principal>,
}

impl MemoryState {
    fn role_of(&self, principal: &Principal) -> UserRole {
        self.roles.get(principal).copied().unwrap_or_default()
    }

    fn is_admin(&self, principal: &Principal) -> bool {
        self.role_of(principal) == UserRole::Admin
    }

    fn require_admin(&self, caller: &Principal) -> BackendResult<()> {
        if self.is_admin(caller) {
            Ok(())
        } else {
            Err(BackendError::Unauthorized(ADMIN_ONLY.to_string()))
        }
    }

    fn order_mut(&mut self, id: OrderId) -> BackendResult<&mut Order> {
        self.orders
            .get_mut(&id)
            .ok_or_else(|| BackendError::Rejected(ORDER_NOT_FOUND.to_string()))
    }

    fn visible_order(&self, caller: &Principal, id: OrderId) -> BackendResult<Option<&Order>> {
        match self.orders.get(&id) {
            Some(order) if order.owner == *caller || self.is_admin(caller) => Ok(Some(order)),
            Some(_) => Err(BackendError::Unauthorized(OWNER_OR_ADMIN.to_string())),
            None => Ok(None),
        }
    }
}

struct PanelCredentials {
    username: String,
    password_hash: String,
}

/// Order backend held entirely in memory.
pub struct InMemoryBackend {
    state: RwLock<MemoryState>,
    bootstrap_admin: Option<Principal>,
    panel: Option<PanelCredentials>,
}

impl InMemoryBackend {
    /// Create an empty backend. `bootstrap_admin` may later claim the admin role.
    #[must_use]
    pub fn new(bootstrap_admin: Option<Principal>) -> Self {
        Self {
            state: RwLock::new(MemoryState {
                next_order_id: 1,
                ..MemoryState::default()
            }),
            bootstrap_admin,
            panel: None,
        }
    }

    /// Enable admin panel login with the given credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the password cannot be hashed.
    pub fn with_panel_credentials(
        mut self,
        username: impl Into<String>,
        password: &str,
    ) -> BackendResult<Self> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|_| BackendError::Rejected("Failed to hash admin panel password".to_string()))?
            .to_string();

        self.panel = Some(PanelCredentials {
            username: username.into(),
            password_hash,
        });
        Ok(self)
    }

    /// Seed a role directly, bypassing authorization.
    pub async fn grant_role(&self, principal: &Principal, role: UserRole) {
        self.state.write().await.roles.insert(principal.clone(), role);
    }
}

fn require_identified(caller: &Principal) -> BackendResult<()> {
    if caller.is_anonymous() {
        Err(BackendError::Unauthorized(ANONYMOUS_CALLER.to_string()))
    } else {
        Ok(())
    }
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

#[async_trait]
impl Backend for InMemoryBackend {
    fn is_ready(&self) -> bool {
        true
    }

    async fn ensure_user_role(&self, caller: &Principal) -> BackendResult<()> {
        require_identified(caller)?;
        let mut state = self.state.write().await;
        state
            .roles
            .entry(caller.clone())
            .or_insert(UserRole::User);
        Ok(())
    }

    async fn get_caller_user_role(&self, caller: &Principal) -> BackendResult<UserRole> {
        Ok(self.state.read().await.role_of(caller))
    }

    async fn is_caller_admin(&self, caller: &Principal) -> BackendResult<bool> {
        Ok(self.state.read().await.is_admin(caller))
    }

    async fn assign_caller_user_role(
        &self,
        caller: &Principal,
        user: &Principal,
        role: UserRole,
    ) -> BackendResult<()> {
        let mut state = self.state.write().await;
        state.require_admin(caller)?;
        state.roles.insert(user.clone(), role);
        info!(user = %user, role = %role, "Role assigned");
        Ok(())
    }

    async fn assign_admin_role_to_caller(&self, caller: &Principal) -> BackendResult<()> {
        require_identified(caller)?;
        if self.bootstrap_admin.as_ref() != Some(caller) {
            return Err(BackendError::Unauthorized(NOT_BOOTSTRAP.to_string()));
        }

        let mut state = self.state.write().await;
        if state.is_admin(caller) {
            return Err(BackendError::Rejected(ALREADY_ADMIN.to_string()));
        }
        state.roles.insert(caller.clone(), UserRole::Admin);
        info!(principal = %caller, "Bootstrap admin role assigned");
        Ok(())
    }

    async fn admin_login(
        &self,
        caller: &Principal,
        username: &str,
        password: &str,
    ) -> BackendResult<bool> {
        require_identified(caller)?;
        let Some(panel) = &self.panel else {
            debug!("Admin panel login attempted but no credentials are configured");
            return Ok(false);
        };

        let valid = panel.username == username && verify_password(password, &panel.password_hash);
        if valid {
            self.state
                .write()
                .await
                .roles
                .insert(caller.clone(), UserRole::Admin);
        }
        Ok(valid)
    }

    async fn get_caller_user_profile(
        &self,
        caller: &Principal,
    ) -> BackendResult<Option<UserProfile>> {
        require_identified(caller)?;
        Ok(self.state.read().await.profiles.get(caller).cloned())
    }

    async fn get_user_profile(
        &self,
        caller: &Principal,
        user: &Principal,
    ) -> BackendResult<Option<UserProfile>> {
        let state = self.state.read().await;
        if caller != user {
            state.require_admin(caller)?;
        }
        Ok(state.profiles.get(user).cloned())
    }

    async fn save_caller_user_profile(
        &self,
        caller: &Principal,
        profile: &UserProfile,
    ) -> BackendResult<()> {
        require_identified(caller)?;
        self.state
            .write()
            .await
            .profiles
            .insert(caller.clone(), profile.clone());
        Ok(())
    }

    async fn submit_order(&self, caller: &Principal, order: &NewOrder) -> BackendResult<OrderId> {
        require_identified(caller)?;
        let mut state = self.state.write().await;
        if state.banned.contains(caller) {
            return Err(BackendError::Unauthorized(BANNED_CALLER.to_string()));
        }

        let id = OrderId::new(state.next_order_id);
        state.next_order_id += 1;
        state.orders.insert(
            id,
            Order {
                id,
                customer_name: order.customer_name.clone(),
                email: order.email.clone(),
                phone: order.phone.clone(),
                shipping_address: order.shipping_address.clone(),
                id_info: order.id_info.clone(),
                status: OrderStatus::Pending,
                payment_contact_status: PaymentContactStatus::NotContacted,
                contact_notes: String::new(),
                tracking_number: None,
                created_time: from_datetime(chrono::Utc::now()),
                owner: caller.clone(),
            },
        );
        info!(order_id = %id, owner = %caller, "Order submitted");
        Ok(id)
    }

    async fn get_all_orders(&self, caller: &Principal) -> BackendResult<Vec<Order>> {
        let state = self.state.read().await;
        state.require_admin(caller)?;
        Ok(state.orders.values().cloned().collect())
    }

    async fn get_my_orders(&self, caller: &Principal) -> BackendResult<Vec<Order>> {
        require_identified(caller)?;
        let state = self.state.read().await;
        Ok(state
            .orders
            .values()
            .filter(|order| order.owner == *caller)
            .cloned()
            .collect())
    }

    async fn get_order(&self, caller: &Principal, id: OrderId) -> BackendResult<Option<Order>> {
        let state = self.state.read().await;
        Ok(state.visible_order(caller, id)?.cloned())
    }

    async fn get_order_status(
        &self,
        caller: &Principal,
        id: OrderId,
    ) -> BackendResult<Option<OrderStatus>> {
        let state = self.state.read().await;
        Ok(state.visible_order(caller, id)?.map(|order| order.status))
    }

    async fn update_order_status(
        &self,
        caller: &Principal,
        id: OrderId,
        status: OrderStatus,
    ) -> BackendResult<()> {
        let mut state = self.state.write().await;
        state.require_admin(caller)?;
        state.order_mut(id)?.status = status;
        Ok(())
    }

    async fn update_payment_contact_status(
        &self,
        caller: &Principal,
        id: OrderId,
        status: PaymentContactStatus,
        notes: &str,
    ) -> BackendResult<()> {
        let mut state = self.state.write().await;
        state.require_admin(caller)?;
        let order = state.order_mut(id)?;
        order.payment_contact_status = status;
        order.contact_notes = notes.to_string();
        Ok(())
    }

    async fn update_order(
        &self,
        caller: &Principal,
        id: OrderId,
        update: &OrderUpdate,
    ) -> BackendResult<()> {
        let mut state = self.state.write().await;
        state.require_admin(caller)?;
        let order = state.order_mut(id)?;
        order.customer_name.clone_from(&update.customer_name);
        order.email.clone_from(&update.email);
        order.phone.clone_from(&update.phone);
        order.shipping_address = update.shipping_address.clone();
        Ok(())
    }

    async fn delete_order(&self, caller: &Principal, id: OrderId) -> BackendResult<()> {
        let mut state = self.state.write().await;
        state.require_admin(caller)?;
        state
            .orders
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| BackendError::Rejected(ORDER_NOT_FOUND.to_string()))
    }

    async fn add_or_update_tracking_number(
        &self,
        caller: &Principal,
        id: OrderId,
        tracking_number: &str,
    ) -> BackendResult<()> {
        let mut state = self.state.write().await;
        state.require_admin(caller)?;
        state.order_mut(id)?.tracking_number = Some(tracking_number.to_string());
        Ok(())
    }

    async fn get_banned_users(&self, caller: &Principal) -> BackendResult<Vec<Principal>> {
        let state = self.state.read().await;
        state.require_admin(caller)?;
        Ok(state.banned.iter().cloned().collect())
    }

    async fn is_banned_user(&self, caller: &Principal, user: &Principal) -> BackendResult<bool> {
        let state = self.state.read().await;
        if caller != user {
            state.require_admin(caller)?;
        }
        Ok(state.banned.contains(user))
    }

    async fn ban_user(&self, caller: &Principal, user: &Principal) -> BackendResult<()> {
        let mut state = self.state.write().await;
        state.require_admin(caller)?;
        state.banned.insert(user.clone());
        info!(user = %user, "User banned");
        Ok(())
    }

    async fn unban_user(&self, caller: &Principal, user: &Principal) -> BackendResult<()> {
        let mut state = self.state.write().await;
        state.require_admin(caller)?;
        state.banned.remove(user);
        info!(user = %user, "User unbanned");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cardshop_core::{Address, IdInformation};

    use super::*;

    fn principal(seed: u8) -> Principal {
        Principal::self_authenticating(&[seed; 32])
    }

    fn new_order(name: &str) -> NewOrder {
        NewOrder {
            customer_name: name.to_string(),
            email: "jane@example.com".to_string(),
            phone: "5551234567".to_string(),
            shipping_address: Address {
                street: "123 Main St".to_string(),
                city: "Springfield".to_string(),
                state: "IL".to_string(),
                zip: "62701".to_string(),
            },
            id_info: IdInformation::default(),
        }
    }

    async fn backend_with_admin() -> (InMemoryBackend, Principal) {
        let admin = principal(1);
        let backend = InMemoryBackend::new(None);
        backend.grant_role(&admin, UserRole::Admin).await;
        (backend, admin)
    }

    #[tokio::test]
    async fn test_ensure_user_role_assigns_user_once() {
        let backend = InMemoryBackend::new(None);
        let caller = principal(2);
        assert_eq!(
            backend.get_caller_user_role(&caller).await.unwrap(),
            UserRole::Guest
        );
        backend.ensure_user_role(&caller).await.unwrap();
        backend.ensure_user_role(&caller).await.unwrap();
        assert_eq!(
            backend.get_caller_user_role(&caller).await.unwrap(),
            UserRole::User
        );
    }

    #[tokio::test]
    async fn test_anonymous_cannot_submit() {
        let backend = InMemoryBackend::new(None);
        let err = backend
            .submit_order(&Principal::anonymous(), &new_order("Jane"))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_submit_and_read_own_orders() {
        let backend = InMemoryBackend::new(None);
        let owner = principal(2);
        let other = principal(3);

        let id = backend.submit_order(&owner, &new_order("Jane")).await.unwrap();
        assert_eq!(id, OrderId::new(1));
        let second = backend.submit_order(&owner, &new_order("Jane")).await.unwrap();
        assert_eq!(second, OrderId::new(2));

        let mine = backend.get_my_orders(&owner).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].status, OrderStatus::Pending);
        assert_eq!(
            mine[0].payment_contact_status,
            PaymentContactStatus::NotContacted
        );
        assert!(backend.get_my_orders(&other).await.unwrap().is_empty());

        assert!(backend.get_order(&owner, id).await.unwrap().is_some());
        assert!(matches!(
            backend.get_order(&other, id).await,
            Err(BackendError::Unauthorized(_))
        ));
        assert!(backend.get_order(&owner, OrderId::new(99)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_admin_only_operations() {
        let (backend, admin) = backend_with_admin().await;
        let customer = principal(2);
        let id = backend.submit_order(&customer, &new_order("Jane")).await.unwrap();

        assert!(matches!(
            backend.get_all_orders(&customer).await,
            Err(BackendError::Unauthorized(_))
        ));
        assert!(matches!(
            backend
                .update_order_status(&customer, id, OrderStatus::Shipped)
                .await,
            Err(BackendError::Unauthorized(_))
        ));

        backend
            .update_order_status(&admin, id, OrderStatus::Shipped)
            .await
            .unwrap();
        backend
            .update_payment_contact_status(&admin, id, PaymentContactStatus::Contacted, "left voicemail")
            .await
            .unwrap();
        backend
            .add_or_update_tracking_number(&admin, id, "1Z999")
            .await
            .unwrap();

        let order = backend.get_order(&admin, id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.payment_contact_status, PaymentContactStatus::Contacted);
        assert_eq!(order.contact_notes, "left voicemail");
        assert_eq!(order.tracking_number.as_deref(), Some("1Z999"));
        assert_eq!(
            backend.get_order_status(&customer, id).await.unwrap(),
            Some(OrderStatus::Shipped)
        );

        backend.delete_order(&admin, id).await.unwrap();
        assert!(backend.get_all_orders(&admin).await.unwrap().is_empty());
        assert!(matches!(
            backend.delete_order(&admin, id).await,
            Err(BackendError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_update_order_edits_contact_fields() {
        let (backend, admin) = backend_with_admin().await;
        let id = backend
            .submit_order(&principal(2), &new_order("Jane"))
            .await
            .unwrap();

        let mut address = new_order("x").shipping_address;
        address.city = "Chicago".to_string();
        backend
            .update_order(
                &admin,
                id,
                &OrderUpdate {
                    customer_name: "Janet Doe".to_string(),
                    email: "janet@example.com".to_string(),
                    phone: "5559876543".to_string(),
                    shipping_address: address,
                },
            )
            .await
            .unwrap();

        let order = backend.get_order(&admin, id).await.unwrap().unwrap();
        assert_eq!(order.customer_name, "Janet Doe");
        assert_eq!(order.shipping_address.city, "Chicago");
    }

    #[tokio::test]
    async fn test_bans_block_orders() {
        let (backend, admin) = backend_with_admin().await;
        let customer = principal(2);

        backend.ban_user(&admin, &customer).await.unwrap();
        assert!(backend.is_banned_user(&customer, &customer).await.unwrap());
        assert_eq!(backend.get_banned_users(&admin).await.unwrap(), vec![customer.clone()]);
        assert!(matches!(
            backend.submit_order(&customer, &new_order("Jane")).await,
            Err(BackendError::Unauthorized(_))
        ));
        assert!(matches!(
            backend.is_banned_user(&customer, &admin).await,
            Err(BackendError::Unauthorized(_))
        ));

        backend.unban_user(&admin, &customer).await.unwrap();
        assert!(!backend.is_banned_user(&customer, &customer).await.unwrap());
        assert!(backend.submit_order(&customer, &new_order("Jane")).await.is_ok());
    }

    #[tokio::test]
    async fn test_bootstrap_admin() {
        let bootstrap = principal(9);
        let backend = InMemoryBackend::new(Some(bootstrap.clone()));

        let err = backend
            .assign_admin_role_to_caller(&principal(2))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Only the designated bootstrap principal"));

        backend.assign_admin_role_to_caller(&bootstrap).await.unwrap();
        assert!(backend.is_caller_admin(&bootstrap).await.unwrap());

        let err = backend
            .assign_admin_role_to_caller(&bootstrap)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Caller is already an admin");
    }

    #[tokio::test]
    async fn test_admin_login_grants_role() {
        let backend = InMemoryBackend::new(None)
            .with_panel_credentials("ops", "c0rrect-H0rse!")
            .unwrap();
        let caller = principal(4);

        assert!(!backend.admin_login(&caller, "ops", "wrong").await.unwrap());
        assert!(!backend.admin_login(&caller, "nope", "c0rrect-H0rse!").await.unwrap());
        assert!(!backend.is_caller_admin(&caller).await.unwrap());

        assert!(backend.admin_login(&caller, "ops", "c0rrect-H0rse!").await.unwrap());
        assert!(backend.is_caller_admin(&caller).await.unwrap());
    }

    #[tokio::test]
    async fn test_admin_login_without_credentials() {
        let backend = InMemoryBackend::new(None);
        assert!(!backend.admin_login(&principal(4), "admin", "x").await.unwrap());
    }

    #[tokio::test]
    async fn test_profiles() {
        let (backend, admin) = backend_with_admin().await;
        let caller = principal(2);
        assert!(backend.get_caller_user_profile(&caller).await.unwrap().is_none());

        let profile = UserProfile {
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            phone: "5551234567".to_string(),
        };
        backend.save_caller_user_profile(&caller, &profile).await.unwrap();
        assert_eq!(
            backend.get_caller_user_profile(&caller).await.unwrap(),
            Some(profile.clone())
        );
        assert_eq!(
            backend.get_user_profile(&admin, &caller).await.unwrap(),
            Some(profile)
        );
        assert!(matches!(
            backend.get_user_profile(&principal(3), &caller).await,
            Err(BackendError::Unauthorized(_))
        ));
    }
}
