//! Business logic services for storefront.
//!
//! # Services
//!
//! - `access` - Admin role checks, profile gating, role bootstrap
//! - `admin_session` - Admin panel session flags
//! - `bans` - User bans and the users overview
//! - `orders` - Order reads, mutations and dashboard filtering
//! - `profile` - Caller profile writes
//!
//! Services borrow the backend and query cache from
//! [`AppState`](crate::state::AppState) and invalidate cached queries after
//! every successful write.

pub mod access;
pub mod admin_session;
pub mod bans;
pub mod orders;
pub mod profile;

pub use access::{AccessService, AdminAccess};
pub use admin_session::{
    AdminPanelSessionStore, AdminPanelStoreProvider, MemoryAdminPanelStore,
    SessionAdminPanelProvider, SessionAdminPanelStore, admin_panel_session_key,
};
pub use bans::{BanService, KnownUser, UsersOverview, parse_principal_input};
pub use orders::{OrderFilter, OrderService, OrderStats};
pub use profile::save_profile;
