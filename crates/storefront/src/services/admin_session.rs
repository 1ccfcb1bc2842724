//! Admin panel session flags.
//!
//! A flag records that a principal passed the admin panel login in this
//! browser. Only a boolean marker is kept, never credentials. Flags live
//! under `admin_panel_session_<principal>` keys.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use cardshop_core::Principal;
use tokio::sync::RwLock;
use tower_sessions::Session;

use crate::models::session_keys;

/// Error type shared by flag stores.
pub type AdminSessionError = tower_sessions::session::Error;

/// Storage key for a principal's flag.
#[must_use]
pub fn admin_panel_session_key(principal: &Principal) -> String {
    format!("{}{principal}", session_keys::ADMIN_PANEL_SESSION_PREFIX)
}

/// Key-value store for admin panel session flags.
#[async_trait]
pub trait AdminPanelSessionStore: Send + Sync {
    /// Whether `principal` has an active panel session.
    async fn get(&self, principal: &Principal) -> Result<bool, AdminSessionError>;

    /// Mark `principal` as logged into the panel.
    async fn set(&self, principal: &Principal) -> Result<(), AdminSessionError>;

    /// Remove the flag for `principal`.
    async fn clear(&self, principal: &Principal) -> Result<(), AdminSessionError>;

    /// Remove every flag.
    async fn clear_all(&self) -> Result<(), AdminSessionError>;
}

/// Hands out the flag store used for a request.
///
/// Handlers never build a store themselves; [`AppState`](crate::state::AppState)
/// holds one provider and every read and write goes through it.
pub trait AdminPanelStoreProvider: Send + Sync {
    /// Store for the request carrying `session`.
    fn for_session(&self, session: &Session) -> Box<dyn AdminPanelSessionStore>;
}

/// Provider keeping flags in each visitor's session.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionAdminPanelProvider;

impl AdminPanelStoreProvider for SessionAdminPanelProvider {
    fn for_session(&self, session: &Session) -> Box<dyn AdminPanelSessionStore> {
        Box::new(SessionAdminPanelStore::new(session.clone()))
    }
}

/// Index of flag keys held in the session, so they can all be cleared.
const FLAG_INDEX_KEY: &str = "admin_panel_session_keys";

/// Flags stored in the visitor's tower-sessions session.
pub struct SessionAdminPanelStore {
    session: Session,
}

impl SessionAdminPanelStore {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    async fn index(&self) -> Result<BTreeSet<String>, AdminSessionError> {
        Ok(self
            .session
            .get::<BTreeSet<String>>(FLAG_INDEX_KEY)
            .await?
            .unwrap_or_default())
    }
}

#[async_trait]
impl AdminPanelSessionStore for SessionAdminPanelStore {
    async fn get(&self, principal: &Principal) -> Result<bool, AdminSessionError> {
        Ok(self
            .session
            .get::<bool>(&admin_panel_session_key(principal))
            .await?
            .unwrap_or(false))
    }

    async fn set(&self, principal: &Principal) -> Result<(), AdminSessionError> {
        let key = admin_panel_session_key(principal);
        self.session.insert(&key, true).await?;

        let mut index = self.index().await?;
        index.insert(key);
        self.session.insert(FLAG_INDEX_KEY, index).await
    }

    async fn clear(&self, principal: &Principal) -> Result<(), AdminSessionError> {
        let key = admin_panel_session_key(principal);
        self.session.remove::<bool>(&key).await?;

        let mut index = self.index().await?;
        if index.remove(&key) {
            self.session.insert(FLAG_INDEX_KEY, index).await?;
        }
        Ok(())
    }

    async fn clear_all(&self) -> Result<(), AdminSessionError> {
        for key in self.index().await? {
            self.session.remove::<bool>(&key).await?;
        }
        self.session
            .remove::<BTreeSet<String>>(FLAG_INDEX_KEY)
            .await?;
        Ok(())
    }
}

/// Flags held in process memory.
#[derive(Clone, Default)]
pub struct MemoryAdminPanelStore {
    flags: Arc<RwLock<HashSet<String>>>,
}

impl MemoryAdminPanelStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored keys, for inspection.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.flags.read().await.iter().cloned().collect();
        keys.sort();
        keys
    }
}

/// Every request shares the same flags.
impl AdminPanelStoreProvider for MemoryAdminPanelStore {
    fn for_session(&self, _session: &Session) -> Box<dyn AdminPanelSessionStore> {
        Box::new(self.clone())
    }
}

#[async_trait]
impl AdminPanelSessionStore for MemoryAdminPanelStore {
    async fn get(&self, principal: &Principal) -> Result<bool, AdminSessionError> {
        Ok(self
            .flags
            .read()
            .await
            .contains(&admin_panel_session_key(principal)))
    }

    async fn set(&self, principal: &Principal) -> Result<(), AdminSessionError> {
        self.flags
            .write()
            .await
            .insert(admin_panel_session_key(principal));
        Ok(())
    }

    async fn clear(&self, principal: &Principal) -> Result<(), AdminSessionError> {
        self.flags
            .write()
            .await
            .remove(&admin_panel_session_key(principal));
        Ok(())
    }

    async fn clear_all(&self) -> Result<(), AdminSessionError> {
        self.flags
            .write()
            .await
            .retain(|key| !key.starts_with(session_keys::ADMIN_PANEL_SESSION_PREFIX));
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn principal(seed: u8) -> Principal {
        Principal::self_authenticating(&[seed; 32])
    }

    #[test]
    fn test_key_format() {
        assert_eq!(
            admin_panel_session_key(&Principal::anonymous()),
            "admin_panel_session_2vxsx-fae"
        );
    }

    #[tokio::test]
    async fn test_memory_store_is_keyed_by_principal() {
        let store = MemoryAdminPanelStore::new();
        let a = principal(1);
        let b = principal(2);

        store.set(&a).await.unwrap();
        assert!(store.get(&a).await.unwrap());
        assert!(!store.get(&b).await.unwrap());
        assert_eq!(store.keys().await, vec![admin_panel_session_key(&a)]);

        store.set(&b).await.unwrap();
        store.clear(&a).await.unwrap();
        assert!(!store.get(&a).await.unwrap());
        assert!(store.get(&b).await.unwrap());

        store.clear_all().await.unwrap();
        assert!(store.keys().await.is_empty());
    }

    #[tokio::test]
    async fn test_session_store() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let store = SessionAdminPanelStore::new(session.clone());
        let a = principal(1);
        let b = principal(2);

        assert!(!store.get(&a).await.unwrap());
        store.set(&a).await.unwrap();
        store.set(&b).await.unwrap();
        assert!(store.get(&a).await.unwrap());
        assert_eq!(
            session
                .get::<bool>(&admin_panel_session_key(&a))
                .await
                .unwrap(),
            Some(true)
        );

        store.clear(&a).await.unwrap();
        assert!(!store.get(&a).await.unwrap());
        assert!(store.get(&b).await.unwrap());

        store.clear_all().await.unwrap();
        assert!(!store.get(&b).await.unwrap());
    }

    #[tokio::test]
    async fn test_providers() {
        let a = principal(1);
        let first = Session::new(None, Arc::new(MemoryStore::default()), None);
        let second = Session::new(None, Arc::new(MemoryStore::default()), None);

        let per_session = SessionAdminPanelProvider;
        per_session.for_session(&first).set(&a).await.unwrap();
        assert!(per_session.for_session(&first).get(&a).await.unwrap());
        assert!(!per_session.for_session(&second).get(&a).await.unwrap());

        let shared = MemoryAdminPanelStore::new();
        shared.for_session(&first).set(&a).await.unwrap();
        assert!(shared.for_session(&second).get(&a).await.unwrap());
        assert_eq!(shared.keys().await, vec![admin_panel_session_key(&a)]);
    }
}
