//! Page chrome shared by every template, plus gate and error pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::FromRequestParts,
    http::{StatusCode, Uri, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::filters;
use crate::middleware::auth::{current_identity, take_flash};
use crate::models::Identity;
use crate::nav::Route;

/// Header state: who is logged in and any pending flash message.
#[derive(Debug, Clone, Default)]
pub struct PageNav {
    /// Principal text of the logged-in identity.
    pub principal: Option<String>,
    /// One-shot message from the previous request.
    pub flash: Option<String>,
}

impl PageNav {
    #[must_use]
    pub fn for_identity(identity: Option<&Identity>) -> Self {
        Self {
            principal: identity.map(|i| i.principal.to_string()),
            flash: None,
        }
    }

    #[must_use]
    pub const fn logged_in(&self) -> bool {
        self.principal.is_some()
    }
}

impl<S> FromRequestParts<S> for PageNav
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>() else {
            return Ok(Self::default());
        };

        let identity = current_identity(session).await;
        Ok(Self {
            principal: identity.map(|i| i.principal.to_string()),
            flash: take_flash(session).await,
        })
    }
}

/// Loading, denial and login-prompt pages.
#[derive(Template, WebTemplate)]
#[template(path = "gate.html")]
pub struct GateTemplate {
    pub nav: PageNav,
    pub title: String,
    pub message: String,
    /// Show the login button.
    pub show_login: bool,
    /// Show a retry link back to the same page.
    pub show_retry: bool,
    /// Render as an error alert.
    pub is_error: bool,
    /// Reload the page after this many seconds.
    pub refresh_seconds: Option<u32>,
}

impl GateTemplate {
    #[must_use]
    pub fn login_required(title: &str, message: &str) -> Self {
        Self {
            nav: PageNav::default(),
            title: title.to_string(),
            message: message.to_string(),
            show_login: true,
            show_retry: false,
            is_error: false,
            refresh_seconds: None,
        }
    }

    #[must_use]
    pub fn loading(nav: PageNav, message: &str, refresh_seconds: u32) -> Self {
        Self {
            nav,
            title: "Loading...".to_string(),
            message: message.to_string(),
            show_login: false,
            show_retry: false,
            is_error: false,
            refresh_seconds: Some(refresh_seconds),
        }
    }

    #[must_use]
    pub fn failed(nav: PageNav, title: &str, message: &str) -> Self {
        Self {
            nav,
            title: title.to_string(),
            message: message.to_string(),
            show_login: false,
            show_retry: true,
            is_error: true,
            refresh_seconds: None,
        }
    }

    #[must_use]
    pub fn denied(nav: PageNav, title: &str, message: &str) -> Self {
        Self {
            nav,
            title: title.to_string(),
            message: message.to_string(),
            show_login: false,
            show_retry: false,
            is_error: true,
            refresh_seconds: None,
        }
    }
}

/// Full-page error.
#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub nav: PageNav,
    pub status: u16,
    pub title: String,
    pub message: String,
}

impl ErrorTemplate {
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            nav: PageNav::default(),
            status: status.as_u16(),
            title: status
                .canonical_reason()
                .unwrap_or("Something went wrong")
                .to_string(),
            message: message.into(),
        }
    }
}

/// Unknown paths, including `#/...` links rewritten by the client script.
///
/// Known page shapes redirect to their canonical path; anything else lands
/// on the home page.
pub async fn fallback(uri: Uri) -> Response {
    let path = uri.path();
    let route = Route::parse(path);
    let href = route.href();

    if href == path {
        return (
            StatusCode::NOT_FOUND,
            ErrorTemplate::new(StatusCode::NOT_FOUND, "Page not found"),
        )
            .into_response();
    }

    Redirect::to(&href).into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::header;

    use super::*;

    #[tokio::test]
    async fn test_fallback_redirects_known_shapes() {
        let response = fallback(Uri::from_static("/admin/orders/42/extra")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/admin/orders/42"
        );
    }

    #[tokio::test]
    async fn test_fallback_unknown_goes_home() {
        let response = fallback(Uri::from_static("/no/such/page")).await;
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");
    }

    #[tokio::test]
    async fn test_fallback_avoids_redirect_loop() {
        let response = fallback(Uri::from_static("/")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_nav_for_identity() {
        let identity = Identity::generate();
        let nav = PageNav::for_identity(Some(&identity));
        assert!(nav.logged_in());
        assert_eq!(nav.principal.unwrap(), identity.principal.to_string());
        assert!(!PageNav::default().logged_in());
    }
}
