//! Role management commands.

use cardshop_core::{Principal, UserRole};
use cardshop_storefront::backend::Backend;

use super::{AdminClient, CliError};

/// Assign `role` to `principal`.
///
/// # Errors
///
/// Returns an error if the principal or role is invalid, or the backend
/// rejects the assignment.
pub async fn assign(admin: &AdminClient, principal: &str, role: &str) -> Result<(), CliError> {
    let user = Principal::parse(principal.trim())?;
    let role: UserRole = role.trim().parse()?;

    admin
        .backend
        .assign_caller_user_role(&admin.caller, &user, role)
        .await?;

    tracing::info!(user = %user, role = %role, "Role assigned");
    Ok(())
}
