//! Demo Bank - accounts, ledger entries and atomic transfers
//!
//! # Modules
//!
//! - [`models`] - Account, Entry, Transfer, User, Currency
//! - [`store`] - Persistence capability (`Store`, `UnitOfWork`) with PostgreSQL and in-memory backends
//! - [`transfer`] - Transfer engine: all-or-nothing money movement with ordered row locking
//! - [`token`] - Signed, expiring access tokens
//! - [`user`] - Password hashing
//! - [`gateway`] - axum HTTP surface
//! - [`db`] - PostgreSQL pool and schema bootstrap
//! - [`config`] / [`logging`] - Process setup
//! - [`util`] - Test fixture helpers

pub mod config;
pub mod db;
pub mod gateway;
pub mod logging;
pub mod models;
pub mod store;
pub mod token;
pub mod transfer;
pub mod user;
pub mod util;

// Convenient re-exports at crate root
pub use models::{Account, Currency, Entry, Transfer, User};
pub use store::{MemStore, PgStore, Store, StoreError, UnitOfWork, execute_atomically};
pub use token::{Payload, TokenError, TokenMaker};
pub use transfer::{TransferEngine, TransferError, TransferParams, TransferResult};
