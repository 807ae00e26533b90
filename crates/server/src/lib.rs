//! NearU Server - REST API for the local marketplace.
//!
//! Shop owners register, manage a product catalog and open or close their
//! shop; users register and browse the public catalog of live products in
//! open shops.
//!
//! The binary in `main.rs` wires configuration, tracing, Sentry and the
//! store together; everything else lives here so tests can drive the
//! router in-process.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use routes::build_app;
pub use state::AppState;
