//! Password hashing (argon2, PHC string format)

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("Password does not match")]
    Mismatch,

    #[error("Hashing failed: {0}")]
    Hashing(String),
}

/// Hash `password` with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hashing(e.to_string()))
}

/// Verify `password` against a stored PHC hash.
pub fn check_password(password: &str, hashed_password: &str) -> Result<(), PasswordError> {
    let parsed =
        PasswordHash::new(hashed_password).map_err(|e| PasswordError::Hashing(e.to_string()))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| PasswordError::Mismatch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_check() {
        let hashed = hash_password("secret123").unwrap();
        assert!(hashed.starts_with("$argon2"));
        assert!(check_password("secret123", &hashed).is_ok());
        assert_eq!(
            check_password("wrong", &hashed),
            Err(PasswordError::Mismatch)
        );
    }

    #[test]
    fn test_same_password_different_salt() {
        let a = hash_password("secret123").unwrap();
        let b = hash_password("secret123").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash() {
        assert!(matches!(
            check_password("secret123", "plain-text"),
            Err(PasswordError::Hashing(_))
        ));
    }
}
