//! Caller profile writes.

use cardshop_core::{Principal, UserProfile};
use tracing::instrument;

use crate::backend::{Backend, BackendResult};
use crate::query::{QueryClient, QueryKey};

/// Save the caller's profile and drop cached profile and admin state.
///
/// # Errors
///
/// Returns the backend's rejection.
#[instrument(skip(backend, queries, profile), fields(caller = %caller))]
pub async fn save_profile(
    backend: &dyn Backend,
    queries: &QueryClient,
    caller: &Principal,
    profile: &UserProfile,
) -> BackendResult<()> {
    backend.save_caller_user_profile(caller, profile).await?;
    queries
        .invalidate(&[QueryKey::CURRENT_USER_PROFILE, QueryKey::IS_ADMIN])
        .await;
    Ok(())
}
