//! Ban management commands.

use cardshop_core::Principal;
use cardshop_storefront::backend::Backend;

use super::{AdminClient, CliError};

/// Print every banned principal, one per line.
///
/// # Errors
///
/// Returns an error if the backend call fails.
pub async fn list(admin: &AdminClient) -> Result<(), CliError> {
    let banned = admin.backend.get_banned_users(&admin.caller).await?;

    #[allow(clippy::print_stdout)]
    {
        if banned.is_empty() {
            println!("No banned users");
        }
        for principal in &banned {
            println!("{principal}");
        }
    }
    Ok(())
}

/// Ban `principal`.
///
/// # Errors
///
/// Returns an error if the principal is invalid or the backend rejects it.
pub async fn add(admin: &AdminClient, principal: &str) -> Result<(), CliError> {
    let user = Principal::parse(principal.trim())?;
    admin.backend.ban_user(&admin.caller, &user).await?;
    tracing::info!(user = %user, "User banned");
    Ok(())
}

/// Lift the ban on `principal`.
///
/// # Errors
///
/// Returns an error if the principal is invalid or the backend rejects it.
pub async fn remove(admin: &AdminClient, principal: &str) -> Result<(), CliError> {
    let user = Principal::parse(principal.trim())?;
    admin.backend.unban_user(&admin.caller, &user).await?;
    tracing::info!(user = %user, "User unbanned");
    Ok(())
}
