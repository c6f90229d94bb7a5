//! HTTP middleware for Portcullis Core
//!
//! - Session cookie binding
//! - Identity resolution and the `CurrentUser` / `OptionalUser` extractors
//! - Request metrics and log-safe tracing spans

pub mod auth;
pub mod metrics;
pub mod session;
pub mod trace;

pub use auth::{identity_middleware, AuthError, CurrentUser, OptionalUser};
pub use metrics::HttpMetricsLayer;
pub use session::{expired_session_cookie, session_cookie, session_middleware};
pub use trace::SanitizedMakeSpan;
