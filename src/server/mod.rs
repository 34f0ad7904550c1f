//! Server core functionality
//!
//! This module contains the HTTP server, its routes and page rendering.

pub mod core;
pub mod render;
pub mod routes;

pub use self::core::Server;
pub use routes::{AppState, router};
