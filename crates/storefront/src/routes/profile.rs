//! Profile setup and editing.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use crate::backend::BackendError;
use crate::error::AppError;
use crate::error_format::user_message;
use crate::filters;
use crate::forms::{FieldErrors, ProfileForm};
use crate::middleware::{RequireIdentity, set_flash};
use crate::models::Identity;
use crate::routes::page::PageNav;
use crate::services::save_profile;
use crate::state::AppState;

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub nav: PageNav,
    pub form: ProfileForm,
    pub errors: FieldErrors,
    pub general_error: Option<String>,
    /// No profile saved yet.
    pub is_setup: bool,
    pub principal: String,
    /// Key that restores this identity on another device.
    pub recovery_key: String,
    pub is_admin: bool,
}

impl ProfileTemplate {
    async fn load(state: &AppState, nav: PageNav, identity: &Identity) -> Self {
        let profile = state
            .access()
            .current_profile(&identity.principal)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Profile lookup failed");
                None
            });
        let access = state.access().check_admin_access(Some(identity)).await;

        Self {
            nav,
            is_setup: profile.is_none(),
            form: profile.as_ref().map(ProfileForm::from).unwrap_or_default(),
            errors: FieldErrors::new(),
            general_error: None,
            principal: identity.principal.to_string(),
            recovery_key: identity.recovery_key().to_string(),
            is_admin: access.is_admin,
        }
    }
}

/// GET /profile
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    nav: PageNav,
    RequireIdentity(identity): RequireIdentity,
) -> ProfileTemplate {
    ProfileTemplate::load(&state, nav, &identity).await
}

/// POST /profile
///
/// First-time setup continues to the order form; later edits stay here.
#[instrument(skip_all)]
pub async fn save(
    State(state): State<AppState>,
    session: Session,
    nav: PageNav,
    RequireIdentity(identity): RequireIdentity,
    Form(form): Form<ProfileForm>,
) -> Result<Response, AppError> {
    let mut page = ProfileTemplate::load(&state, nav, &identity).await;

    let profile = match form.validate() {
        Ok(profile) => profile,
        Err(errors) => {
            page.form = form;
            page.errors = errors;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    match save_profile(state.backend(), state.queries(), &identity.principal, &profile).await {
        Ok(()) => {
            info!(principal = %identity.principal, "Profile saved");
            set_flash(&session, "Profile saved successfully").await?;
            let next = if page.is_setup { "/order" } else { "/profile" };
            Ok(Redirect::to(next).into_response())
        }
        Err(e @ (BackendError::Rejected(_) | BackendError::Unauthorized(_))) => {
            page.form = form;
            page.general_error = Some(user_message(&e));
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
        }
        Err(e) => Err(e.into()),
    }
}
