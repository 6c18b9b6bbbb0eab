//! Axum HTTP server, routing, and middleware.
//!
//! # Responsibilities
//! - Define the Axum router with all routes and shared middleware.
//! - Evaluate the protected/excluded path-prefix rules.
//! - Inject shared application state (`AppState`) into handlers.

pub mod guard;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;
