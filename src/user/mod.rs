//! User credentials

pub mod password;

pub use password::{PasswordError, check_password, hash_password};
