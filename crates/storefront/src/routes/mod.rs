//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /prices                 - Pricing tiers
//! GET  /health                 - Health check
//! GET  /health/ready           - Readiness check
//!
//! # Ordering (requires identity)
//! GET  /order                  - Order form
//! POST /order                  - Submit order (multipart)
//! POST /order/validate/:field  - Blur validation (fragment)
//! GET  /order/generate/name    - Random full name (JSON)
//! GET  /order/generate/address - Random address (JSON)
//! GET  /confirmation/:id       - Order confirmation
//! GET  /my-orders              - Caller's orders
//! GET  /my-orders/:id          - Caller's orders, one highlighted
//! GET  /profile                - Profile page
//! POST /profile                - Save profile
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Create or restore identity
//! POST /auth/logout            - Logout action
//!
//! # Admin (requires admin role and panel login)
//! GET  /admin                  - Orders dashboard
//! GET  /admin/orders/:id       - Order details
//! POST /admin/orders/:id/status    - Update order status
//! POST /admin/orders/:id/payment   - Update payment contact status
//! POST /admin/orders/:id/edit      - Edit order fields
//! POST /admin/orders/:id/tracking  - Set tracking number
//! POST /admin/orders/:id/delete    - Delete order
//! GET  /admin/orders/:id/photo     - ID photo
//! GET  /admin/orders/:id/signature - Signature image
//! GET  /admin/users            - Known users and bans
//! POST /admin/users/ban        - Ban a user
//! POST /admin/users/unban      - Unban a user
//! GET  /admin/login            - Admin panel login page
//! POST /admin/login            - Admin panel login action
//! POST /admin/logout           - Admin panel logout
//! POST /admin/restore          - Restore admin role
//! ```
//!
//! Any other path, including legacy `#/...` links, goes to [`page::fallback`].

pub mod admin;
pub mod auth;
pub mod home;
pub mod my_orders;
pub mod order;
pub mod page;
pub mod profile;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::forms::upload::MAX_UPLOAD_BYTES;
use crate::middleware::{form_rate_limiter, login_rate_limiter};
use crate::state::AppState;

/// Largest order submission: photo, signature file, the base64 signature
/// pad image and the text fields.
const ORDER_BODY_LIMIT: usize = 4 * MAX_UPLOAD_BYTES;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(auth::login_page).post(auth::login).layer(login_rate_limiter()),
        )
        .route("/logout", post(auth::logout))
}

/// Create the order form routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(order::order_page).post(order::submit_order))
        .route("/validate/{field}", post(order::validate_field))
        .route("/generate/name", get(order::generate_name))
        .route("/generate/address", get(order::generate_card_address))
        .layer(DefaultBodyLimit::max(ORDER_BODY_LIMIT))
        .layer(form_rate_limiter())
}

/// Create the caller's order routes router.
pub fn my_order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(my_orders::index))
        .route("/{id}", get(my_orders::show))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::orders::dashboard))
        .route("/orders/{id}", get(admin::orders::show))
        .route("/orders/{id}/status", post(admin::orders::update_status))
        .route("/orders/{id}/payment", post(admin::orders::update_payment))
        .route("/orders/{id}/edit", post(admin::orders::edit))
        .route("/orders/{id}/tracking", post(admin::orders::update_tracking))
        .route("/orders/{id}/delete", post(admin::orders::delete))
        .route("/orders/{id}/photo", get(admin::orders::photo))
        .route("/orders/{id}/signature", get(admin::orders::signature))
        .route("/users", get(admin::users::index))
        .route("/users/ban", post(admin::users::ban))
        .route("/users/unban", post(admin::users::unban))
        .route(
            "/login",
            get(admin::panel::login_page)
                .post(admin::panel::login)
                .layer(login_rate_limiter()),
        )
        .route("/logout", post(admin::panel::logout))
        .route("/restore", post(admin::panel::restore))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Public pages
        .route("/", get(home::home))
        .route("/prices", get(home::prices))
        // Ordering
        .nest("/order", order_routes())
        .route("/confirmation/{id}", get(order::confirmation))
        .nest("/my-orders", my_order_routes())
        .route("/profile", get(profile::show).post(profile::save))
        // Auth routes
        .nest("/auth", auth_routes())
        // Admin routes
        .nest("/admin", admin_routes())
}
