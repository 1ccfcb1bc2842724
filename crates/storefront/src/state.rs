//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tower_sessions::Session;

use crate::backend::{Backend, BackendError, BlobResolver, InMemoryBackend, RemoteBackend};
use crate::config::StorefrontConfig;
use crate::query::QueryClient;
use crate::services::{
    AccessService, AdminPanelSessionStore, AdminPanelStoreProvider, BanService, OrderService,
    SessionAdminPanelProvider,
};

/// How often the remote backend's health endpoint is polled.
const READINESS_PROBE_INTERVAL: Duration = Duration::from_secs(15);

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// order backend, the query cache and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    admin_panel: Arc<dyn AdminPanelStoreProvider>,
}

struct AppStateInner {
    config: StorefrontConfig,
    backend: Arc<dyn Backend>,
    queries: QueryClient,
    blobs: BlobResolver,
    pool: Option<PgPool>,
    probe: Option<JoinHandle<()>>,
}

impl Drop for AppStateInner {
    fn drop(&mut self) {
        if let Some(probe) = self.probe.take() {
            probe.abort();
        }
    }
}

impl AppState {
    /// Create state around an existing backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob HTTP client cannot be built.
    pub fn new(
        config: StorefrontConfig,
        backend: Arc<dyn Backend>,
        pool: Option<PgPool>,
    ) -> Result<Self, BackendError> {
        Self::build(config, backend, pool, None)
    }

    /// Create state with the backend selected by configuration.
    ///
    /// With `BACKEND_URL` set, a [`RemoteBackend`] is probed once and then
    /// polled in the background. Without it, an [`InMemoryBackend`] seeded
    /// with the bootstrap principal and admin panel credentials is used.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built or the admin panel
    /// password cannot be hashed.
    pub async fn from_config(
        config: StorefrontConfig,
        pool: Option<PgPool>,
    ) -> Result<Self, BackendError> {
        match config.backend.url.clone() {
            Some(url) => {
                let remote = RemoteBackend::new(
                    url,
                    config.backend.api_key.clone(),
                    config.backend.timeout,
                )?;
                remote.probe().await;
                let probe = remote.spawn_readiness_probe(READINESS_PROBE_INTERVAL);
                tracing::info!(backend = %remote.base_url(), "Using remote order backend");
                Self::build(config, Arc::new(remote), pool, Some(probe))
            }
            None => {
                let mut memory = InMemoryBackend::new(config.admin.bootstrap_principal.clone());
                if let Some(password) = &config.admin.panel_password {
                    memory = memory.with_panel_credentials(
                        config.admin.panel_username.clone(),
                        password.expose_secret(),
                    )?;
                }
                tracing::warn!("BACKEND_URL not set, using in-memory order backend");
                Self::build(config, Arc::new(memory), pool, None)
            }
        }
    }

    fn build(
        config: StorefrontConfig,
        backend: Arc<dyn Backend>,
        pool: Option<PgPool>,
        probe: Option<JoinHandle<()>>,
    ) -> Result<Self, BackendError> {
        let queries = QueryClient::new(config.query_cache_ttl);
        let blobs = BlobResolver::new(config.backend.timeout)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                queries,
                blobs,
                pool,
                probe,
            }),
            admin_panel: Arc::new(SessionAdminPanelProvider),
        })
    }

    /// Replace where admin panel flags are kept (per session by default).
    #[must_use]
    pub fn with_admin_panel_store(
        mut self,
        provider: impl AdminPanelStoreProvider + 'static,
    ) -> Self {
        self.admin_panel = Arc::new(provider);
        self
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the order backend.
    #[must_use]
    pub fn backend(&self) -> &dyn Backend {
        self.inner.backend.as_ref()
    }

    /// Get a reference to the query cache.
    #[must_use]
    pub fn queries(&self) -> &QueryClient {
        &self.inner.queries
    }

    /// Get a reference to the blob resolver.
    #[must_use]
    pub fn blobs(&self) -> &BlobResolver {
        &self.inner.blobs
    }

    /// Session database pool, when sessions are stored in `PostgreSQL`.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// Admin panel flag store for the request carrying `session`.
    #[must_use]
    pub fn admin_panel(&self, session: &Session) -> Box<dyn AdminPanelSessionStore> {
        self.admin_panel.for_session(session)
    }

    #[must_use]
    pub fn access(&self) -> AccessService<'_> {
        AccessService::new(self.backend(), self.queries())
    }

    #[must_use]
    pub fn orders(&self) -> OrderService<'_> {
        OrderService::new(self.backend(), self.queries())
    }

    #[must_use]
    pub fn bans(&self) -> BanService<'_> {
        BanService::new(self.backend(), self.queries())
    }
}
