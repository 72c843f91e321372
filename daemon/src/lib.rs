//! progeny_daemon - HTTP server for the plant disease service
//!
//! This crate provides the daemon server that:
//! - Loads one classifier per crop at start-up
//! - Serves predictions, remedy lookups and the static pages
//! - Bridges voice and text questions to the chat assistant

pub mod api;
pub mod error;
pub mod registry;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use registry::{ClassifierLoader, ModelEntry, ModelRegistry, TractLoader};
pub use server::run_server;
pub use state::{AppState, Assistant};
