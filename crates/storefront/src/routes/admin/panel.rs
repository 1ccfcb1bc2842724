//! Admin panel login, logout and admin role restore.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use crate::backend::BackendError;
use crate::error::AppError;
use crate::error_format::user_message;
use crate::filters;
use crate::middleware::{AdminPanel, RequireIdentity, set_flash};
use crate::routes::page::PageNav;
use crate::state::AppState;

const MISSING_CREDENTIALS_MESSAGE: &str = "Please enter both username and password";

/// Admin panel login form data.
#[derive(Debug, Default, Deserialize)]
pub struct AdminLoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Admin panel login template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/login.html")]
pub struct AdminLoginTemplate {
    pub nav: PageNav,
    pub username: String,
    pub error: Option<String>,
}

/// GET /admin/login
pub async fn login_page(
    nav: PageNav,
    AdminPanel(panel): AdminPanel,
    RequireIdentity(identity): RequireIdentity,
) -> Result<Response, AppError> {
    if panel.get(&identity.principal).await? {
        return Ok(Redirect::to("/admin").into_response());
    }

    Ok(AdminLoginTemplate {
        nav,
        username: String::new(),
        error: None,
    }
    .into_response())
}

/// POST /admin/login
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    nav: PageNav,
    AdminPanel(panel): AdminPanel,
    RequireIdentity(identity): RequireIdentity,
    Form(form): Form<AdminLoginForm>,
) -> Result<Response, AppError> {
    let username = form.username.trim();
    let rejected = |status: StatusCode, message: String| {
        let page = AdminLoginTemplate {
            nav: nav.clone(),
            username: username.to_string(),
            error: Some(message),
        };
        Ok((status, page).into_response())
    };

    if username.is_empty() || form.password.is_empty() {
        return rejected(
            StatusCode::UNPROCESSABLE_ENTITY,
            MISSING_CREDENTIALS_MESSAGE.to_string(),
        );
    }

    match state
        .access()
        .admin_login(&identity.principal, username, &form.password)
        .await
    {
        Ok(()) => {
            panel.set(&identity.principal).await?;
            set_flash(&session, "Logged in to the admin panel").await?;
            info!(principal = %identity.principal, "Admin panel login");
            Ok(Redirect::to("/admin").into_response())
        }
        Err(e @ (BackendError::Rejected(_) | BackendError::Unauthorized(_))) => {
            warn!(principal = %identity.principal, "Admin panel login rejected");
            rejected(StatusCode::UNAUTHORIZED, user_message(&e))
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /admin/logout
#[instrument(skip_all)]
pub async fn logout(
    session: Session,
    AdminPanel(panel): AdminPanel,
    RequireIdentity(identity): RequireIdentity,
) -> Result<Redirect, AppError> {
    panel.clear(&identity.principal).await?;
    set_flash(&session, "Logged out of the admin panel").await?;
    Ok(Redirect::to("/"))
}

/// POST /admin/restore
///
/// Re-assigns the admin role to the caller; the backend decides whether the
/// caller is entitled to it.
#[instrument(skip_all)]
pub async fn restore(
    State(state): State<AppState>,
    session: Session,
    RequireIdentity(identity): RequireIdentity,
) -> Result<Redirect, AppError> {
    match state.access().restore_admin(&identity.principal).await {
        Ok(()) => {
            info!(principal = %identity.principal, "Admin access restored");
            set_flash(&session, "Admin access restored successfully").await?;
        }
        Err(e @ (BackendError::Rejected(_) | BackendError::Unauthorized(_))) => {
            set_flash(&session, user_message(&e)).await?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(Redirect::to("/profile"))
}
