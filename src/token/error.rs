//! Token Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Invalid key size: must be at least {min} bytes, got {actual}")]
    InvalidKeySize { min: usize, actual: usize },

    #[error("Token is invalid")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Token encoding failed: {0}")]
    Encoding(String),
}

impl TokenError {
    pub fn code(&self) -> &'static str {
        match self {
            TokenError::InvalidKeySize { .. } => "INVALID_KEY_SIZE",
            TokenError::InvalidToken => "INVALID_TOKEN",
            TokenError::ExpiredToken => "EXPIRED_TOKEN",
            TokenError::Encoding(_) => "TOKEN_ENCODING_FAILED",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            TokenError::InvalidToken | TokenError::ExpiredToken => 401,
            TokenError::InvalidKeySize { .. } | TokenError::Encoding(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_failures_are_unauthorized() {
        assert_eq!(TokenError::InvalidToken.http_status(), 401);
        assert_eq!(TokenError::ExpiredToken.http_status(), 401);
        assert_eq!(TokenError::Encoding("x".into()).http_status(), 500);
    }

    #[test]
    fn test_key_size_message() {
        let err = TokenError::InvalidKeySize { min: 32, actual: 5 };
        assert_eq!(err.code(), "INVALID_KEY_SIZE");
        assert_eq!(
            err.to_string(),
            "Invalid key size: must be at least 32 bytes, got 5"
        );
    }
}
