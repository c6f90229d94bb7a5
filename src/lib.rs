//! Portcullis Core - request identity resolution
//!
//! Resolves every HTTP request to at most one user, trying an API access
//! token, the signed-in session, a trusted reverse-proxy header and finally
//! HTTP Basic credentials. Also binds, validates and projects the user
//! forms (sign-in, sign-up, access tokens) served next to it.

pub mod api;
pub mod config;
pub mod crypto;
pub mod domain;
pub mod error;
pub mod form;
pub mod middleware;
pub mod migration;
pub mod repository;
pub mod server;
pub mod service;
pub mod session;
pub mod state;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
