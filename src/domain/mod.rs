//! Domain models for Portcullis Core

pub mod access_token;
pub mod user;

pub use access_token::*;
pub use user::*;
