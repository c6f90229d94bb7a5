//! HTTP Basic credential decoding

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use thiserror::Error;

/// Basic credential decoding errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BasicAuthError {
    #[error("Invalid base64 encoding: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Credentials are not valid UTF-8")]
    InvalidUtf8,

    #[error("Credentials are missing the ':' separator")]
    MissingSeparator,
}

/// Decode the payload of `Authorization: Basic <payload>` into
/// `(username, password)`.
///
/// The password may itself contain ':'; only the first one separates.
pub fn decode_basic_credentials(encoded: &str) -> Result<(String, String), BasicAuthError> {
    let bytes = BASE64.decode(encoded)?;
    let decoded = String::from_utf8(bytes).map_err(|_| BasicAuthError::InvalidUtf8)?;

    let (username, password) = decoded
        .split_once(':')
        .ok_or(BasicAuthError::MissingSeparator)?;

    Ok((username.to_string(), password.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_decode_valid_credentials() {
        let encoded = BASE64.encode("alice:wonderland");
        let (user, pass) = decode_basic_credentials(&encoded).unwrap();
        assert_eq!(user, "alice");
        assert_eq!(pass, "wonderland");
    }

    #[test]
    fn test_decode_password_with_colon() {
        let encoded = BASE64.encode("bob:a:b:c");
        let (user, pass) = decode_basic_credentials(&encoded).unwrap();
        assert_eq!(user, "bob");
        assert_eq!(pass, "a:b:c");
    }

    #[test]
    fn test_decode_empty_password() {
        let encoded = BASE64.encode("carol:");
        let (user, pass) = decode_basic_credentials(&encoded).unwrap();
        assert_eq!(user, "carol");
        assert!(pass.is_empty());
    }

    #[rstest]
    #[case::not_base64("%%%not-base64%%%")]
    #[case::no_separator("YWxpY2U=")]
    #[case::invalid_utf8("/w==")]
    fn test_decode_invalid(#[case] encoded: &str) {
        assert!(decode_basic_credentials(encoded).is_err());
    }

    #[test]
    fn test_decode_error_kinds() {
        assert_eq!(
            decode_basic_credentials("YWxpY2U="),
            Err(BasicAuthError::MissingSeparator)
        );
        assert_eq!(
            decode_basic_credentials("/w=="),
            Err(BasicAuthError::InvalidUtf8)
        );
    }
}
