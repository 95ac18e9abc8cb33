//! HTTP handlers for the API routes.

pub mod events;
pub mod health;
pub mod sync;
