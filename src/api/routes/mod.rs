//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`pictures`] - Picture URL collection
//! - [`config`] - Configuration
//! - [`system`] - Health, OpenAPI, fallback

mod config;
mod pictures;
mod system;

// Re-export all handlers so `routes::function_name` continues to work
pub use config::*;
pub use pictures::*;
pub use system::*;
