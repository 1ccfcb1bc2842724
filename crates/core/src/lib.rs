//! Cardshop Core - Shared types library.
//!
//! This crate provides common types used across all Cardshop components:
//! - `storefront` - Customer-facing order site and admin dashboard
//! - `cli` - Command-line tools for migrations and backend management
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no database
//! access, no HTTP clients. Orders, profiles and bans are owned by the remote
//! order backend; the types here mirror its records.
//!
//! # Modules
//!
//! - [`types`] - Principals, emails, ZIP codes, order records, statuses and pricing

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
