//! calmirror keeps a PostgreSQL table in line with the events of a Google
//! account's calendars.
//!
//! The reconciler lives in [`sync`]; [`routes::app`] exposes it over HTTP
//! together with Google login and read access to the stored events.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod pollers;
pub mod provider;
pub mod repository;
pub mod routes;
pub mod schema;
pub mod state;
pub mod sync;

pub use state::AppState;
