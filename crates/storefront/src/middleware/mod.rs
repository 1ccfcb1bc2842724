//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions, signed cookies)
//! 5. Security headers (CSP, frame and referrer policy)
//! 6. Rate limiting on login and order form routes (governor)
//!
//! Access gates are extractors and helper functions rather than layers; see
//! [`gates`].

pub mod auth;
pub mod gates;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    OptionalIdentity, RequireIdentity, clear_identity, current_identity, set_flash, set_identity,
    take_flash,
};
pub use gates::{
    AdminPanel, GateDecision, GateRejection, RequireAdmin, banned_user_gate, combine,
    evaluate_panel_gate, evaluate_role_gate, profile_gate,
};
pub use rate_limit::{form_rate_limiter, login_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
