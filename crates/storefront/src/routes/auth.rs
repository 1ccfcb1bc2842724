//! Identity login and logout.
//!
//! Logging in creates a fresh device identity, or restores one from its
//! recovery key. After login the caller is registered as a user and, when it
//! is the configured bootstrap principal, granted the admin role.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{AdminPanel, clear_identity, current_identity, set_flash, set_identity};
use crate::models::Identity;
use crate::routes::page::PageNav;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    /// Restore an earlier identity instead of creating one.
    #[serde(default)]
    pub recovery_key: String,
    /// Page to return to after login.
    #[serde(default)]
    pub next: Option<String>,
}

/// Query parameters for the login page.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub nav: PageNav,
    pub error: Option<String>,
    pub next: String,
}

/// Local path to continue to after login; anything else goes home.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => "/",
    }
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(nav: PageNav, Query(query): Query<LoginQuery>) -> impl IntoResponse {
    LoginTemplate {
        nav,
        error: None,
        next: safe_next(query.next.as_deref()).to_string(),
    }
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    nav: PageNav,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let next = safe_next(form.next.as_deref()).to_string();

    let identity = if form.recovery_key.trim().is_empty() {
        Identity::generate()
    } else {
        match Identity::from_recovery_key(&form.recovery_key) {
            Ok(identity) => identity,
            Err(e) => {
                warn!(error = %e, "Identity restore failed");
                let page = LoginTemplate {
                    nav,
                    error: Some(e.to_string()),
                    next,
                };
                return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
            }
        }
    };

    set_identity(&session, &identity).await?;
    set_sentry_user(&identity.principal);

    let access = state.access();
    access.ensure_user_role(&identity.principal).await;
    if access
        .bootstrap_admin(
            &identity.principal,
            state.config().admin.bootstrap_principal.as_ref(),
        )
        .await
    {
        set_flash(&session, "Admin access granted").await?;
    }

    info!(principal = %identity.principal, "Logged in");
    Ok(Redirect::to(&next).into_response())
}

/// Handle logout.
///
/// Drops the identity, its admin panel flag and the cached reads of the
/// departing principal.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    AdminPanel(panel): AdminPanel,
) -> Result<Redirect, AppError> {
    if let Some(identity) = current_identity(&session).await {
        panel.clear(&identity.principal).await?;
        state.queries().invalidate_principal(&identity.principal).await;
        info!(principal = %identity.principal, "Logged out");
    }

    clear_identity(&session).await?;
    clear_sentry_user();

    Ok(Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/order")), "/order");
        assert_eq!(safe_next(Some("//evil.example")), "/");
        assert_eq!(safe_next(Some("https://evil.example")), "/");
        assert_eq!(safe_next(None), "/");
    }
}
