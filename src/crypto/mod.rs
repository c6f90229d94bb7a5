//! Credential hashing and decoding utilities

pub mod basic;
pub mod password;

pub use basic::{decode_basic_credentials, BasicAuthError};
pub use password::{generate_token_sha, hash_password, verify_password};
