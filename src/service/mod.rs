//! Business logic layer

pub mod identity;

pub use identity::{AuthMethod, IdentityResolver, RequestInfo, Resolution, ANONYMOUS_ID};
