//! Admin dashboard, order management, bans and the admin panel login.
//!
//! Every handler except the panel login goes through
//! [`RequireAdmin`](crate::middleware::RequireAdmin).

pub mod orders;
pub mod panel;
pub mod users;
