//! clinical-intake HTTP server.
//!
//! Exposes form extraction and recommendations over two GET endpoints:
//! `/get_form?text=...` and `/get_recommendation?text=...`.

pub mod app;
pub mod config;
pub mod error;
pub mod routes;

pub use app::{AppState, router};
pub use config::ServerConfig;
pub use error::{ApiError, StartupError};
