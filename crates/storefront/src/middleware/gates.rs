//! Access gates for customer and admin pages.
//!
//! Each gate either lets the handler run or produces a response: a loading
//! page while the backend is not ready, an error page with a retry link, a
//! denial, or a redirect. The admin role check and the admin panel session
//! are evaluated separately and combined per [`AdminGatePolicy`].

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::{debug, warn};

use crate::config::AdminGatePolicy;
use crate::models::Identity;
use crate::query::QueryError;
use crate::routes::page::{GateTemplate, PageNav};
use crate::services::{AdminAccess, AdminPanelSessionStore};
use crate::state::AppState;

use super::auth::current_identity;

/// Seconds a loading page waits before reloading itself.
const LOADING_REFRESH_SECONDS: u32 = 2;

/// Outcome of a single gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Render the page.
    Allow,
    /// The check cannot run yet.
    Loading,
    /// The check failed; the message is safe to display.
    Failed(String),
    /// The caller is not an admin.
    Denied,
    /// The caller has no admin panel session.
    NeedsPanelLogin,
}

/// Decision from the backend admin role check.
#[must_use]
pub fn evaluate_role_gate(access: &AdminAccess) -> GateDecision {
    if access.is_loading {
        GateDecision::Loading
    } else if let Some(error) = &access.error {
        GateDecision::Failed(error.clone())
    } else if access.is_admin {
        GateDecision::Allow
    } else {
        GateDecision::Denied
    }
}

/// Decision from the admin panel session flag.
#[must_use]
pub const fn evaluate_panel_gate(has_panel_session: bool) -> GateDecision {
    if has_panel_session {
        GateDecision::Allow
    } else {
        GateDecision::NeedsPanelLogin
    }
}

/// Combine both decisions under `policy`.
#[must_use]
pub fn combine(policy: AdminGatePolicy, role: GateDecision, panel: GateDecision) -> GateDecision {
    match policy {
        AdminGatePolicy::Role => role,
        AdminGatePolicy::Panel => panel,
        AdminGatePolicy::Both => {
            if role == GateDecision::Allow {
                panel
            } else {
                role
            }
        }
        AdminGatePolicy::Either => {
            if role == GateDecision::Allow || panel == GateDecision::Allow {
                GateDecision::Allow
            } else if role == GateDecision::Loading {
                GateDecision::Loading
            } else {
                panel
            }
        }
    }
}

/// Response produced when a gate does not let the handler run.
#[derive(Debug)]
pub enum GateRejection {
    /// Customer page without an identity.
    LoginRequired,
    /// Admin page without an identity.
    AdminLoginRequired,
    /// A check could not run yet; `nav` keeps the visitor's header.
    Loading(PageNav),
    /// A check failed.
    Failed(PageNav, String),
    /// The caller is not an admin.
    Denied(PageNav),
    /// The caller needs to pass the admin panel login.
    NeedsPanelLogin,
    /// The caller is banned.
    Banned(PageNav),
    /// The caller has not set up a profile.
    NeedsProfile,
    /// No session layer is installed.
    MissingSession,
}

impl GateRejection {
    fn from_decision(decision: GateDecision, nav: PageNav) -> Option<Self> {
        match decision {
            GateDecision::Allow => None,
            GateDecision::Loading => Some(Self::Loading(nav)),
            GateDecision::Failed(message) => Some(Self::Failed(nav, message)),
            GateDecision::Denied => Some(Self::Denied(nav)),
            GateDecision::NeedsPanelLogin => Some(Self::NeedsPanelLogin),
        }
    }
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        match self {
            Self::LoginRequired => (
                StatusCode::UNAUTHORIZED,
                GateTemplate::login_required(
                    "Login Required",
                    "You must be logged in to place an order",
                ),
            )
                .into_response(),
            Self::AdminLoginRequired => (
                StatusCode::UNAUTHORIZED,
                GateTemplate::login_required(
                    "Admin Access Required",
                    "Please log in with your admin account to access this area.",
                ),
            )
                .into_response(),
            Self::Loading(nav) => (
                StatusCode::SERVICE_UNAVAILABLE,
                [(header::RETRY_AFTER, LOADING_REFRESH_SECONDS.to_string())],
                GateTemplate::loading(nav, "Verifying access...", LOADING_REFRESH_SECONDS),
            )
                .into_response(),
            Self::Failed(nav, message) => (
                StatusCode::SERVICE_UNAVAILABLE,
                GateTemplate::failed(nav, "Unable to verify admin access", &message),
            )
                .into_response(),
            Self::Denied(nav) => (
                StatusCode::FORBIDDEN,
                GateTemplate::denied(
                    nav,
                    "Access Denied",
                    "You do not have permission to access the admin panel. If you believe this is an error, please contact support.",
                ),
            )
                .into_response(),
            Self::NeedsPanelLogin => Redirect::to("/admin/login").into_response(),
            Self::Banned(nav) => (
                StatusCode::FORBIDDEN,
                GateTemplate::denied(
                    nav,
                    "Access Restricted",
                    "Your account has been banned and you no longer have access to this feature. If you believe this is an error, please contact support.",
                ),
            )
                .into_response(),
            Self::NeedsProfile => Redirect::to("/profile").into_response(),
            Self::MissingSession => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

/// Admin panel flag store for the current request.
///
/// Handlers reach the flags only through this extractor, which asks
/// [`AppState::admin_panel`] for the configured store.
pub struct AdminPanel(pub Box<dyn AdminPanelSessionStore>);

impl FromRequestParts<AppState> for AdminPanel {
    type Rejection = GateRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(GateRejection::MissingSession)?;
        Ok(Self(state.admin_panel(session)))
    }
}

/// Extractor for admin pages.
///
/// Runs the role gate and the panel gate required by the configured policy.
/// Under `both` the panel gate is only consulted once the role check allows.
pub struct RequireAdmin(pub Identity);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = GateRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(GateRejection::MissingSession)?;
        let identity = current_identity(&session)
            .await
            .ok_or(GateRejection::AdminLoginRequired)?;

        let policy = state.config().admin.gate_policy;
        let role = if policy == AdminGatePolicy::Panel {
            GateDecision::Denied
        } else {
            let access = state.access().check_admin_access(Some(&identity)).await;
            evaluate_role_gate(&access)
        };

        let needs_panel = match policy {
            AdminGatePolicy::Role => false,
            AdminGatePolicy::Both => role == GateDecision::Allow,
            AdminGatePolicy::Panel => true,
            AdminGatePolicy::Either => role != GateDecision::Allow,
        };
        let panel = if needs_panel {
            let has_session = state
                .admin_panel(&session)
                .get(&identity.principal).await.unwrap_or_else(|e| {
                warn!(error = %e, "Failed to read admin panel session");
                false
            });
            evaluate_panel_gate(has_session)
        } else {
            GateDecision::NeedsPanelLogin
        };

        let decision = combine(policy, role, panel);
        debug!(principal = %identity.principal, ?decision, "Admin gate evaluated");

        match GateRejection::from_decision(decision, PageNav::for_identity(Some(&identity))) {
            None => Ok(Self(identity)),
            Some(rejection) => Err(rejection),
        }
    }
}

/// Block banned callers.
///
/// A failed ban lookup lets the caller through; the backend still refuses
/// orders from banned principals.
///
/// # Errors
///
/// Returns a rejection when the caller is banned or the check cannot run yet.
pub async fn banned_user_gate(state: &AppState, identity: &Identity) -> Result<(), GateRejection> {
    match state.bans().is_banned(&identity.principal).await {
        Ok(true) => Err(GateRejection::Banned(PageNav::for_identity(Some(identity)))),
        Ok(false) => Ok(()),
        Err(QueryError::Disabled) => {
            Err(GateRejection::Loading(PageNav::for_identity(Some(identity))))
        }
        Err(QueryError::Backend(e)) => {
            warn!(error = %e, principal = %identity.principal, "Ban check failed");
            Ok(())
        }
    }
}

/// Send callers without a profile to `/profile`.
///
/// # Errors
///
/// Returns [`GateRejection::NeedsProfile`] once the lookup finds no profile.
pub async fn profile_gate(state: &AppState, identity: &Identity) -> Result<(), GateRejection> {
    if state.access().must_setup_profile(&identity.principal).await {
        Err(GateRejection::NeedsProfile)
    } else {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn access(is_admin: bool, is_loading: bool, error: Option<&str>) -> AdminAccess {
        AdminAccess {
            is_admin,
            is_loading,
            is_fetched: !is_loading,
            error: error.map(String::from),
        }
    }

    #[test]
    fn test_role_gate() {
        assert_eq!(evaluate_role_gate(&access(true, false, None)), GateDecision::Allow);
        assert_eq!(evaluate_role_gate(&access(false, false, None)), GateDecision::Denied);
        assert_eq!(evaluate_role_gate(&access(false, true, None)), GateDecision::Loading);
        assert_eq!(
            evaluate_role_gate(&access(false, false, Some("Network timeout"))),
            GateDecision::Failed("Network timeout".to_string())
        );
    }

    #[test]
    fn test_panel_gate() {
        assert_eq!(evaluate_panel_gate(true), GateDecision::Allow);
        assert_eq!(evaluate_panel_gate(false), GateDecision::NeedsPanelLogin);
    }

    #[test]
    fn test_combine_matrix() {
        use GateDecision::{Allow, Denied, Failed, Loading, NeedsPanelLogin};
        let failed = || Failed("x".to_string());

        // (policy, role, panel, expected)
        let cases = [
            (AdminGatePolicy::Role, Allow, NeedsPanelLogin, Allow),
            (AdminGatePolicy::Role, Denied, Allow, Denied),
            (AdminGatePolicy::Panel, Denied, Allow, Allow),
            (AdminGatePolicy::Panel, Allow, NeedsPanelLogin, NeedsPanelLogin),
            (AdminGatePolicy::Both, Allow, Allow, Allow),
            (AdminGatePolicy::Both, Allow, NeedsPanelLogin, NeedsPanelLogin),
            (AdminGatePolicy::Both, Denied, Allow, Denied),
            (AdminGatePolicy::Both, Loading, Allow, Loading),
            (AdminGatePolicy::Both, failed(), Allow, failed()),
            (AdminGatePolicy::Either, Denied, Allow, Allow),
            (AdminGatePolicy::Either, Allow, NeedsPanelLogin, Allow),
            (AdminGatePolicy::Either, Loading, NeedsPanelLogin, Loading),
            (AdminGatePolicy::Either, Denied, NeedsPanelLogin, NeedsPanelLogin),
            (AdminGatePolicy::Either, failed(), NeedsPanelLogin, NeedsPanelLogin),
        ];

        for (policy, role, panel, expected) in cases {
            assert_eq!(
                combine(policy, role.clone(), panel.clone()),
                expected,
                "{policy:?} role={role:?} panel={panel:?}"
            );
        }
    }

    #[test]
    fn test_rejection_statuses() {
        let nav = PageNav::default;
        assert_eq!(
            GateRejection::LoginRequired.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            GateRejection::Denied(nav()).into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            GateRejection::Banned(nav()).into_response().status(),
            StatusCode::FORBIDDEN
        );
        let loading = GateRejection::Loading(nav()).into_response();
        assert_eq!(loading.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(loading.headers().get(header::RETRY_AFTER).unwrap(), "2");

        let panel = GateRejection::NeedsPanelLogin.into_response();
        assert_eq!(panel.headers().get(header::LOCATION).unwrap(), "/admin/login");
        let profile = GateRejection::NeedsProfile.into_response();
        assert_eq!(profile.headers().get(header::LOCATION).unwrap(), "/profile");
    }
}
