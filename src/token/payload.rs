//! Token payload

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::error::TokenError;

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Payload {
    /// Unique per issued token.
    pub id: Uuid,
    pub username: String,
    pub issued_at: DateTime<Utc>,
    pub expired_at: DateTime<Utc>,
}

impl Payload {
    pub fn new(username: &str, duration: Duration) -> Result<Self, TokenError> {
        let issued_at = Utc::now();
        let lifetime = chrono::Duration::from_std(duration)
            .map_err(|_| TokenError::Encoding(format!("duration out of range: {:?}", duration)))?;
        let expired_at = issued_at
            .checked_add_signed(lifetime)
            .ok_or_else(|| TokenError::Encoding("expiry overflows timestamp".to_string()))?;

        Ok(Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            issued_at,
            expired_at,
        })
    }

    pub fn valid(&self) -> Result<(), TokenError> {
        self.valid_at(Utc::now())
    }

    /// Expiry is inclusive: a token is dead at `expired_at` itself.
    pub fn valid_at(&self, now: DateTime<Utc>) -> Result<(), TokenError> {
        if now >= self.expired_at {
            return Err(TokenError::ExpiredToken);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_payload() {
        let payload = Payload::new("alice", Duration::from_secs(60)).unwrap();
        assert_eq!(payload.username, "alice");
        assert_eq!(
            payload.expired_at - payload.issued_at,
            chrono::Duration::seconds(60)
        );
        assert!(payload.valid().is_ok());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Payload::new("alice", Duration::from_secs(60)).unwrap();
        let b = Payload::new("alice", Duration::from_secs(60)).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_expiry_boundary() {
        let payload = Payload::new("alice", Duration::from_secs(60)).unwrap();
        let just_before = payload.expired_at - chrono::Duration::milliseconds(1);
        assert!(payload.valid_at(just_before).is_ok());
        assert_eq!(
            payload.valid_at(payload.expired_at),
            Err(TokenError::ExpiredToken)
        );
    }

    #[test]
    fn test_zero_duration_is_never_valid() {
        let payload = Payload::new("alice", Duration::ZERO).unwrap();
        assert_eq!(payload.valid(), Err(TokenError::ExpiredToken));
    }

    #[test]
    fn test_serializes_rfc3339() {
        let payload = Payload::new("alice", Duration::from_secs(1)).unwrap();
        let json = serde_json::to_value(&payload).unwrap();
        let issued = json["issued_at"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(issued).is_ok());
    }
}
