//! API Module
//!
//! HTTP handlers and routing for the replay server.
//!
//! # Endpoints
//! - `POST /files` - Create a file
//! - `POST /files/rename` - Rename a file
//! - `GET /stats` - Replay cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
