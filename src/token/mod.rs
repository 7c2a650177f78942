//! Access tokens
//!
//! Stateless bearer tokens signed with a symmetric key. A token carries a
//! [`Payload`] naming the user and its validity window.

pub mod error;
pub mod maker;
pub mod payload;

pub use error::TokenError;
pub use maker::{MIN_SECRET_KEY_SIZE, TokenMaker};
pub use payload::Payload;
