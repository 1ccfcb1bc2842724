//! Identity and admin access state.
//!
//! Role checks, profile gating, role bootstrap and the post-login role
//! assignment all live here so the gates and pages share one contract.

use cardshop_core::{Principal, UserProfile};
use tracing::{debug, info, instrument, warn};

use crate::backend::{Backend, BackendError, BackendResult};
use crate::error_format::user_message;
use crate::models::Identity;
use crate::query::{QueryClient, QueryError, QueryKey, QueryOptions, RetryPolicy};

/// Outcome of the admin role check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminAccess {
    /// The caller holds the admin role.
    pub is_admin: bool,
    /// The check could not run yet (backend not ready).
    pub is_loading: bool,
    /// The check ran to completion, successfully or not.
    pub is_fetched: bool,
    /// Display message if the check failed.
    pub error: Option<String>,
}

/// Messages from [`Backend::assign_admin_role_to_caller`] that mean the role
/// is already settled.
const EXPECTED_BOOTSTRAP_REJECTIONS: [&str; 3] = [
    "Bootstrap admin has already been assigned",
    "Caller is already an admin",
    "Only the designated bootstrap principal",
];

/// Role and profile checks for the current caller.
pub struct AccessService<'a> {
    backend: &'a dyn Backend,
    queries: &'a QueryClient,
}

impl<'a> AccessService<'a> {
    #[must_use]
    pub const fn new(backend: &'a dyn Backend, queries: &'a QueryClient) -> Self {
        Self { backend, queries }
    }

    /// Whether the caller is an admin.
    ///
    /// Authorization rejections and traps count as "not an admin". Other
    /// failures are retried twice, 500 ms apart, and then reported in
    /// [`AdminAccess::error`]. The result is never cached.
    #[instrument(skip(self, identity))]
    pub async fn check_admin_access(&self, identity: Option<&Identity>) -> AdminAccess {
        let Some(identity) = identity else {
            return AdminAccess::default();
        };

        if !self.backend.is_ready() {
            return AdminAccess {
                is_loading: true,
                ..AdminAccess::default()
            };
        }

        let caller = &identity.principal;
        let options = QueryOptions::default()
            .uncached()
            .with_retry(RetryPolicy::admin_check());
        let result = self
            .queries
            .fetch(&QueryKey::is_admin(caller), options, || async move {
                match self.backend.is_caller_admin(caller).await {
                    Err(e) if e.is_access_rejection() => Ok(false),
                    other => other,
                }
            })
            .await;

        match result {
            Ok(is_admin) => AdminAccess {
                is_admin,
                is_fetched: true,
                ..AdminAccess::default()
            },
            Err(QueryError::Disabled) => AdminAccess {
                is_loading: true,
                ..AdminAccess::default()
            },
            Err(QueryError::Backend(e)) => {
                warn!(error = %e, principal = %caller, "Admin check failed");
                AdminAccess {
                    is_fetched: true,
                    error: Some(user_message(&e)),
                    ..AdminAccess::default()
                }
            }
        }
    }

    /// The caller's saved profile, cached per principal.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is not ready or the lookup fails.
    pub async fn current_profile(&self, caller: &Principal) -> Result<Option<UserProfile>, QueryError> {
        let options = QueryOptions::enabled_if(self.backend.is_ready())
            .with_retry(RetryPolicy::none());
        self.queries
            .fetch(&QueryKey::current_user_profile(caller), options, || {
                self.backend.get_caller_user_profile(caller)
            })
            .await
    }

    /// Whether the caller must create a profile before continuing.
    ///
    /// Only true once the lookup has completed and found nothing; a failed
    /// lookup does not block the caller.
    pub async fn must_setup_profile(&self, caller: &Principal) -> bool {
        matches!(self.current_profile(caller).await, Ok(None))
    }

    /// Register the caller as a user after login.
    ///
    /// Failures are logged and swallowed. Profile and admin entries for the
    /// caller are always dropped so the next read is fresh.
    pub async fn ensure_user_role(&self, caller: &Principal) {
        if let Err(e) = self.backend.ensure_user_role(caller).await {
            debug!(error = %e, principal = %caller, "ensure_user_role failed");
        }
        self.queries
            .invalidate(&[QueryKey::CURRENT_USER_PROFILE, QueryKey::IS_ADMIN])
            .await;
    }

    /// Claim the admin role if `caller` is the configured bootstrap principal.
    ///
    /// Returns whether the role was newly assigned. Expected rejections
    /// (already bootstrapped, already admin) are logged and suppressed.
    pub async fn bootstrap_admin(&self, caller: &Principal, bootstrap: Option<&Principal>) -> bool {
        if bootstrap != Some(caller) {
            return false;
        }

        match self.backend.assign_admin_role_to_caller(caller).await {
            Ok(()) => {
                info!(principal = %caller, "Admin bootstrap successful");
                self.invalidate_admin_state().await;
                true
            }
            Err(e) => {
                let message = e.to_string();
                if EXPECTED_BOOTSTRAP_REJECTIONS
                    .iter()
                    .any(|expected| message.contains(expected))
                {
                    debug!(principal = %caller, reason = %message, "Admin bootstrap not needed");
                } else {
                    warn!(principal = %caller, error = %e, "Admin bootstrap failed");
                }
                self.invalidate_admin_state().await;
                false
            }
        }
    }

    /// Re-assign the admin role to the caller on request.
    ///
    /// # Errors
    ///
    /// Returns the backend's rejection.
    pub async fn restore_admin(&self, caller: &Principal) -> BackendResult<()> {
        self.backend.assign_admin_role_to_caller(caller).await?;
        self.invalidate_admin_state().await;
        Ok(())
    }

    /// Check admin panel credentials.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Rejected`] with "Invalid credentials" when the
    /// backend refuses them.
    pub async fn admin_login(
        &self,
        caller: &Principal,
        username: &str,
        password: &str,
    ) -> BackendResult<()> {
        if self.backend.admin_login(caller, username, password).await? {
            self.invalidate_admin_state().await;
            Ok(())
        } else {
            Err(BackendError::Rejected("Invalid credentials".to_string()))
        }
    }

    async fn invalidate_admin_state(&self) {
        self.queries
            .invalidate(&[QueryKey::IS_ADMIN, QueryKey::CURRENT_USER_PROFILE])
            .await;
    }
}
