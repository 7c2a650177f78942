//! Symmetric token maker (HS256 JWS)

use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use super::error::TokenError;
use super::payload::Payload;

/// Shortest accepted symmetric key, in bytes.
pub const MIN_SECRET_KEY_SIZE: usize = 32;

/// Issues and verifies access tokens with one symmetric key.
///
/// Immutable after construction; share it behind an `Arc`.
#[derive(Clone)]
pub struct TokenMaker {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenMaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenMaker").finish_non_exhaustive()
    }
}

impl TokenMaker {
    pub fn new(symmetric_key: &str) -> Result<Self, TokenError> {
        let key = symmetric_key.as_bytes();
        if key.len() < MIN_SECRET_KEY_SIZE {
            return Err(TokenError::InvalidKeySize {
                min: MIN_SECRET_KEY_SIZE,
                actual: key.len(),
            });
        }

        // Expiry lives in the payload and is checked after decoding.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Ok(Self {
            encoding_key: EncodingKey::from_secret(key),
            decoding_key: DecodingKey::from_secret(key),
            validation,
        })
    }

    /// Issue a token for `username` that lives for `duration`.
    pub fn create_token(
        &self,
        username: &str,
        duration: Duration,
    ) -> Result<(String, Payload), TokenError> {
        let payload = Payload::new(username, duration)?;
        let token = encode(&Header::new(Algorithm::HS256), &payload, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))?;
        Ok((token, payload))
    }

    /// Check signature and structure, then expiry.
    pub fn verify_token(&self, token: &str) -> Result<Payload, TokenError> {
        let data = decode::<Payload>(token, &self.decoding_key, &self.validation)
            .map_err(|_| TokenError::InvalidToken)?;
        data.claims.valid()?;
        Ok(data.claims)
    }
}
