//! # HTTP Server Module
//!
//! JSON API over the record store.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check
//! - `GET|POST /api/students` - List and create
//! - `GET|PUT|DELETE /api/students/{id}` - Fetch, update, delete
//! - `GET /api/majors` - Major catalog

pub mod config;
pub mod errors;
pub mod observability_routes;
pub mod server;
pub mod student_routes;

pub use config::HttpServerConfig;
pub use errors::{ApiError, ApiResult};
pub use server::{shutdown_signal, HttpServer};
pub use student_routes::AppState;
