//! Data access layer (Repository pattern)

pub mod access_token;
pub mod user;

pub use access_token::AccessTokenRepository;
pub use user::UserRepository;
