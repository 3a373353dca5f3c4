//! Vector Search Service
//!
//! HTTP service that builds the `colors` (and optionally `images`) similarity-search
//! collections at startup and serves free-text search over them.
//!
//! ## Startup
//!
//! ```text
//! AppConfig::from_env
//!   ↓
//! index (Qdrant | in-memory) + embedding providers + item sources
//!   ↓
//! InitializationSupervisor::spawn_all  (background, one task per collection)
//!   ↓
//! axum server (status, readiness, search, rebuild)
//! ```
//!
//! ## Modules
//!
//! - `config`: environment-driven configuration
//! - `server`: wiring, HTTP server lifecycle
//! - `shutdown`: SIGINT/SIGTERM handling

pub mod config;
pub mod server;
pub mod shutdown;

pub use config::{AppConfig, HttpConfig, ImagesConfig, IndexBackend};
pub use server::{app_router, build_state, run};
