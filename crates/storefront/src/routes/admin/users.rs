//! Admin users page: known customers and the ban list.

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
use tracing::{instrument, warn};

use crate::backend::BackendError;
use crate::error::AppError;
use crate::error_format::user_message;
use crate::filters;
use crate::middleware::{RequireAdmin, set_flash};
use crate::models::Identity;
use crate::routes::page::PageNav;
use crate::services::{UsersOverview, parse_principal_input};
use crate::state::AppState;

/// Ban or unban form data.
#[derive(Debug, Default, Deserialize)]
pub struct PrincipalForm {
    #[serde(default)]
    pub principal: String,
}

/// Users page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/users.html")]
pub struct UsersTemplate {
    pub nav: PageNav,
    pub overview: UsersOverview,
    /// Text of the manual ban input, kept after a failed attempt.
    pub principal_input: String,
    pub principal_error: Option<String>,
}

async fn load_overview(state: &AppState, identity: &Identity) -> Result<UsersOverview, AppError> {
    let orders = state.orders().all_orders(&identity.principal).await?;
    let banned = state.bans().banned_users(&identity.principal).await?;
    Ok(UsersOverview::build(&orders, banned))
}

/// GET /admin/users
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    nav: PageNav,
    RequireAdmin(identity): RequireAdmin,
) -> Result<UsersTemplate, AppError> {
    Ok(UsersTemplate {
        nav,
        overview: load_overview(&state, &identity).await?,
        principal_input: String::new(),
        principal_error: None,
    })
}

/// Which way a ban form goes.
#[derive(Debug, Clone, Copy)]
enum BanAction {
    Ban,
    Unban,
}

impl BanAction {
    const fn verb(self) -> &'static str {
        match self {
            Self::Ban => "ban",
            Self::Unban => "unban",
        }
    }

    const fn success(self) -> &'static str {
        match self {
            Self::Ban => "User banned successfully",
            Self::Unban => "User unbanned successfully",
        }
    }
}

async fn apply(
    state: AppState,
    session: Session,
    nav: PageNav,
    identity: Identity,
    form: PrincipalForm,
    action: BanAction,
) -> Result<Response, AppError> {
    let user = match parse_principal_input(&form.principal) {
        Ok(user) => user,
        Err(message) => {
            let page = UsersTemplate {
                nav,
                overview: load_overview(&state, &identity).await?,
                principal_input: form.principal,
                principal_error: Some(message.to_string()),
            };
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    let bans = state.bans();
    let result = match action {
        BanAction::Ban => bans.ban(&identity.principal, &user).await,
        BanAction::Unban => bans.unban(&identity.principal, &user).await,
    };

    match result {
        Ok(()) => set_flash(&session, action.success()).await?,
        Err(e @ (BackendError::Rejected(_) | BackendError::Unauthorized(_))) => {
            warn!(error = %e, user = %user, action = action.verb(), "Ban change rejected");
            let message = format!("Failed to {} user: {}", action.verb(), user_message(&e));
            set_flash(&session, message).await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Redirect::to("/admin/users").into_response())
}

/// POST /admin/users/ban
#[instrument(skip_all)]
pub async fn ban(
    State(state): State<AppState>,
    session: Session,
    nav: PageNav,
    RequireAdmin(identity): RequireAdmin,
    Form(form): Form<PrincipalForm>,
) -> Result<Response, AppError> {
    apply(state, session, nav, identity, form, BanAction::Ban).await
}

/// POST /admin/users/unban
#[instrument(skip_all)]
pub async fn unban(
    State(state): State<AppState>,
    session: Session,
    nav: PageNav,
    RequireAdmin(identity): RequireAdmin,
    Form(form): Form<PrincipalForm>,
) -> Result<Response, AppError> {
    apply(state, session, nav, identity, form, BanAction::Unban).await
}
