//! Persistence capability consumed by the transfer engine and the gateway.
//!
//! Two layers:
//! - [`Store`]: pool-level, auto-commit operations (plain CRUD)
//! - [`UnitOfWork`]: operations scoped to one database transaction
//!
//! [`execute_atomically`] runs a closure against a fresh unit of work and
//! commits only if the closure succeeds.

pub mod error;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::models::{Account, Entry, NewAccount, NewUser, Transfer, User};

pub use error::StoreError;
pub use memory::MemStore;
pub use postgres::PgStore;

/// Operations executed inside a single transaction.
///
/// Dropping a unit of work without calling [`UnitOfWork::commit`] discards
/// every write it made and releases its row locks.
#[async_trait]
pub trait UnitOfWork: Send {
    async fn get_account(&mut self, id: i64) -> Result<Account, StoreError>;

    /// Atomically add `delta` to the account balance and return the updated row.
    ///
    /// Locks the row until the unit of work ends.
    async fn add_account_balance(&mut self, id: i64, delta: i64) -> Result<Account, StoreError>;

    async fn create_entry(&mut self, account_id: i64, amount: i64) -> Result<Entry, StoreError>;

    async fn create_transfer(
        &mut self,
        from_account_id: i64,
        to_account_id: i64,
        amount: i64,
    ) -> Result<Transfer, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

/// Pool-level store operations.
#[async_trait]
pub trait Store: Send + Sync {
    /// Open a new unit of work.
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError>;

    /// Cheap liveness probe used by the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;

    // === Users ===

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn get_user(&self, username: &str) -> Result<User, StoreError>;

    // === Accounts ===

    async fn create_account(&self, account: NewAccount) -> Result<Account, StoreError>;

    async fn get_account(&self, id: i64) -> Result<Account, StoreError>;

    async fn list_accounts(
        &self,
        owner: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Account>, StoreError>;

    /// Overwrite the balance of one account.
    ///
    /// Not coordinated with in-flight transfers on the same account.
    async fn update_account(&self, id: i64, balance: i64) -> Result<Account, StoreError>;

    async fn delete_account(&self, id: i64) -> Result<(), StoreError>;

    // === Entries ===

    async fn get_entry(&self, id: i64) -> Result<Entry, StoreError>;

    async fn list_entries(
        &self,
        account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Entry>, StoreError>;

    // === Transfers ===

    async fn get_transfer(&self, id: i64) -> Result<Transfer, StoreError>;

    /// Transfers where `account_id` is either the source or the destination.
    async fn list_transfers(
        &self,
        account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transfer>, StoreError>;
}

/// Run `work` inside one unit of work: commit on `Ok`, roll back on `Err`.
///
/// No retries happen here; a failed unit of work is reported as is.
pub async fn execute_atomically<T, E, F>(store: &dyn Store, work: F) -> Result<T, E>
where
    E: From<StoreError>,
    F: for<'t> FnOnce(&'t mut dyn UnitOfWork) -> BoxFuture<'t, Result<T, E>>,
{
    let mut uow = store.begin().await?;

    let outcome = work(uow.as_mut()).await;

    match outcome {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = uow.rollback().await {
                tracing::warn!(error = %rollback_err, "Rollback failed after unit of work error");
            }
            Err(e)
        }
    }
}
