//! Account-to-account transfers
//!
//! A transfer is recorded as:
//! - one `transfers` row
//! - a negative entry on the source and a positive entry on the destination
//! - the matching balance updates on both accounts
//!
//! # Concurrency
//!
//! Balance rows are locked in ascending account id order, whatever the
//! direction of the transfer. Opposite-direction transfers between the same
//! pair therefore cannot deadlock.

pub mod engine;
pub mod error;
pub mod types;

pub use engine::TransferEngine;
pub use error::TransferError;
pub use types::{TransferParams, TransferResult, ensure_currency};
