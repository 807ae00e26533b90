//! NearU Core - Shared domain types.
//!
//! This crate provides the types used across the NearU components:
//! - `server` - The marketplace REST API
//! - `cli` - Command-line tools for migrations and owner management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, shop types and login IDs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
