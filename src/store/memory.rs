//! In-memory store
//!
//! A [`Store`] that mimics the transactional behavior the transfer engine
//! relies on, without a database:
//! - per-account row locks, taken by the first balance adjustment and held
//!   until the unit of work ends
//! - writes staged in the unit of work and applied only on commit
//! - ID sequences that are not rolled back
//! - foreign-key checks on entries and transfers
//!
//! Used by unit and integration tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex as RowLock, OwnedMutexGuard};

use super::{Store, StoreError, UnitOfWork};
use crate::models::{Account, Entry, NewAccount, NewUser, Transfer, User};

#[derive(Default)]
struct Tables {
    users: BTreeMap<String, User>,
    accounts: BTreeMap<i64, Account>,
    entries: BTreeMap<i64, Entry>,
    transfers: BTreeMap<i64, Transfer>,
    account_seq: i64,
    entry_seq: i64,
    transfer_seq: i64,
}

impl Tables {
    fn account(&self, id: i64) -> Result<&Account, StoreError> {
        self.accounts
            .get(&id)
            .ok_or_else(|| StoreError::NotFound(format!("account {}", id)))
    }
}

#[derive(Default)]
struct Inner {
    tables: Mutex<Tables>,
    row_locks: Mutex<HashMap<i64, Arc<RowLock<()>>>>,
    unavailable: AtomicBool,
}

impl Inner {
    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Database("connection refused".to_string()));
        }
        self.tables
            .lock()
            .map_err(|_| StoreError::Database("store state poisoned".to_string()))
    }

    fn row_lock(&self, account_id: i64) -> Result<Arc<RowLock<()>>, StoreError> {
        let mut locks = self
            .row_locks
            .lock()
            .map_err(|_| StoreError::Database("lock table poisoned".to_string()))?;
        Ok(locks.entry(account_id).or_default().clone())
    }
}

/// In-memory [`Store`]. Cheap to clone; clones share the same tables.
#[derive(Clone, Default)]
pub struct MemStore {
    inner: Arc<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with [`StoreError::Database`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Total number of committed entries.
    pub fn entry_count(&self) -> usize {
        self.inner.tables().map(|t| t.entries.len()).unwrap_or(0)
    }

    /// Total number of committed transfers.
    pub fn transfer_count(&self) -> usize {
        self.inner.tables().map(|t| t.transfers.len()).unwrap_or(0)
    }
}

/// Staged writes of one in-memory unit of work.
pub struct MemUnitOfWork {
    inner: Arc<Inner>,
    held: HashMap<i64, OwnedMutexGuard<()>>,
    deltas: BTreeMap<i64, i64>,
    entries: Vec<Entry>,
    transfers: Vec<Transfer>,
}

impl MemUnitOfWork {
    fn snapshot(&self, tables: &Tables, id: i64) -> Result<Account, StoreError> {
        let mut account = tables.account(id)?.clone();
        if let Some(delta) = self.deltas.get(&id) {
            account.balance += delta;
        }
        Ok(account)
    }
}

#[async_trait]
impl UnitOfWork for MemUnitOfWork {
    async fn get_account(&mut self, id: i64) -> Result<Account, StoreError> {
        let tables = self.inner.tables()?;
        self.snapshot(&tables, id)
    }

    async fn add_account_balance(&mut self, id: i64, delta: i64) -> Result<Account, StoreError> {
        // Existence check first: an UPDATE on a missing row locks nothing.
        self.inner.tables()?.account(id)?;

        if !self.held.contains_key(&id) {
            let lock = self.inner.row_lock(id)?;
            let guard = lock.lock_owned().await;
            self.held.insert(id, guard);
        }

        let tables = self.inner.tables()?;
        let current = self.snapshot(&tables, id)?;
        let balance = current
            .balance
            .checked_add(delta)
            .ok_or_else(|| StoreError::Database("bigint out of range".to_string()))?;

        *self.deltas.entry(id).or_insert(0) += delta;
        Ok(Account { balance, ..current })
    }

    async fn create_entry(&mut self, account_id: i64, amount: i64) -> Result<Entry, StoreError> {
        let mut tables = self.inner.tables()?;
        tables.account(account_id)?;

        tables.entry_seq += 1;
        let entry = Entry {
            id: tables.entry_seq,
            account_id,
            amount,
            created_at: Utc::now(),
        };
        self.entries.push(entry.clone());
        Ok(entry)
    }

    async fn create_transfer(
        &mut self,
        from_account_id: i64,
        to_account_id: i64,
        amount: i64,
    ) -> Result<Transfer, StoreError> {
        let mut tables = self.inner.tables()?;
        tables.account(from_account_id)?;
        tables.account(to_account_id)?;

        tables.transfer_seq += 1;
        let transfer = Transfer {
            id: tables.transfer_seq,
            from_account_id,
            to_account_id,
            amount,
            created_at: Utc::now(),
        };
        self.transfers.push(transfer.clone());
        Ok(transfer)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let this = *self;
        let mut tables = this.inner.tables()?;

        // Check every referenced row before touching any of them.
        let referenced = this
            .deltas
            .keys()
            .copied()
            .chain(this.entries.iter().map(|e| e.account_id))
            .chain(
                this.transfers
                    .iter()
                    .flat_map(|t| [t.from_account_id, t.to_account_id]),
            );
        for id in referenced {
            if !tables.accounts.contains_key(&id) {
                return Err(StoreError::Conflict(format!("account {} deleted", id)));
            }
        }
        let mut balances = Vec::with_capacity(this.deltas.len());
        for (&id, &delta) in &this.deltas {
            let balance = tables
                .account(id)?
                .balance
                .checked_add(delta)
                .ok_or_else(|| StoreError::Database("bigint out of range".to_string()))?;
            balances.push((id, balance));
        }

        for (id, balance) in balances {
            if let Some(account) = tables.accounts.get_mut(&id) {
                account.balance = balance;
            }
        }
        for entry in this.entries {
            tables.entries.insert(entry.id, entry);
        }
        for transfer in this.transfers {
            tables.transfers.insert(transfer.id, transfer);
        }

        drop(tables);
        drop(this.held);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl Store for MemStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        self.ping().await?;
        Ok(Box::new(MemUnitOfWork {
            inner: self.inner.clone(),
            held: HashMap::new(),
            deltas: BTreeMap::new(),
            entries: Vec::new(),
            transfers: Vec::new(),
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.tables().map(|_| ())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.inner.tables()?;
        if tables.users.contains_key(&user.username) {
            return Err(StoreError::Conflict(format!(
                "username {} already exists",
                user.username
            )));
        }
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!(
                "email {} already exists",
                user.email
            )));
        }

        let now = Utc::now();
        let created = User {
            username: user.username,
            hashed_password: user.hashed_password,
            full_name: user.full_name,
            email: user.email,
            password_changed_at: now,
            created_at: now,
        };
        tables
            .users
            .insert(created.username.clone(), created.clone());
        Ok(created)
    }

    async fn get_user(&self, username: &str) -> Result<User, StoreError> {
        self.inner
            .tables()?
            .users
            .get(username)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user {}", username)))
    }

    async fn create_account(&self, account: NewAccount) -> Result<Account, StoreError> {
        let mut tables = self.inner.tables()?;
        if !tables.users.contains_key(&account.owner) {
            return Err(StoreError::Conflict(format!(
                "owner {} does not exist",
                account.owner
            )));
        }
        if tables
            .accounts
            .values()
            .any(|a| a.owner == account.owner && a.currency == account.currency)
        {
            return Err(StoreError::Conflict(format!(
                "{} already has a {} account",
                account.owner, account.currency
            )));
        }

        tables.account_seq += 1;
        let created = Account {
            id: tables.account_seq,
            owner: account.owner,
            balance: account.balance,
            currency: account.currency,
            created_at: Utc::now(),
        };
        tables.accounts.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_account(&self, id: i64) -> Result<Account, StoreError> {
        self.inner.tables()?.account(id).cloned()
    }

    async fn list_accounts(
        &self,
        owner: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Account>, StoreError> {
        let tables = self.inner.tables()?;
        Ok(tables
            .accounts
            .values()
            .filter(|a| a.owner == owner)
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn update_account(&self, id: i64, balance: i64) -> Result<Account, StoreError> {
        let mut tables = self.inner.tables()?;
        let account = tables
            .accounts
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("account {}", id)))?;
        account.balance = balance;
        Ok(account.clone())
    }

    async fn delete_account(&self, id: i64) -> Result<(), StoreError> {
        let lock = self.inner.row_lock(id)?;
        let _row = lock.try_lock().map_err(|_| {
            StoreError::Conflict(format!("account {} is locked by an open transaction", id))
        })?;

        let mut tables = self.inner.tables()?;
        tables.account(id)?;

        let referenced = tables.entries.values().any(|e| e.account_id == id)
            || tables
                .transfers
                .values()
                .any(|t| t.from_account_id == id || t.to_account_id == id);
        if referenced {
            return Err(StoreError::Conflict(format!(
                "account {} is referenced by ledger records",
                id
            )));
        }

        tables.accounts.remove(&id);
        Ok(())
    }

    async fn get_entry(&self, id: i64) -> Result<Entry, StoreError> {
        self.inner
            .tables()?
            .entries
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("entry {}", id)))
    }

    async fn list_entries(
        &self,
        account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Entry>, StoreError> {
        let tables = self.inner.tables()?;
        Ok(tables
            .entries
            .values()
            .filter(|e| e.account_id == account_id)
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn get_transfer(&self, id: i64) -> Result<Transfer, StoreError> {
        self.inner
            .tables()?
            .transfers
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("transfer {}", id)))
    }

    async fn list_transfers(
        &self,
        account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transfer>, StoreError> {
        let tables = self.inner.tables()?;
        Ok(tables
            .transfers
            .values()
            .filter(|t| t.from_account_id == account_id || t.to_account_id == account_id)
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Currency;
    use std::time::Duration;

    async fn store_with_accounts(balances: &[i64]) -> (MemStore, Vec<Account>) {
        let store = MemStore::new();
        let mut accounts = Vec::new();
        for (i, balance) in balances.iter().enumerate() {
            let username = format!("user{}", i);
            store
                .create_user(NewUser {
                    username: username.clone(),
                    hashed_password: "hash".to_string(),
                    full_name: username.clone(),
                    email: format!("{}@example.com", username),
                })
                .await
                .unwrap();
            let account = store
                .create_account(NewAccount {
                    owner: username,
                    balance: *balance,
                    currency: Currency::Usd,
                })
                .await
                .unwrap();
            accounts.push(account);
        }
        (store, accounts)
    }

    #[tokio::test]
    async fn test_uncommitted_writes_are_invisible() {
        let (store, accounts) = store_with_accounts(&[100]).await;
        let id = accounts[0].id;

        let mut uow = store.begin().await.unwrap();
        let staged = uow.add_account_balance(id, -30).await.unwrap();
        assert_eq!(staged.balance, 70);
        uow.create_entry(id, -30).await.unwrap();

        assert_eq!(store.get_account(id).await.unwrap().balance, 100);
        assert_eq!(store.entry_count(), 0);

        uow.commit().await.unwrap();
        assert_eq!(store.get_account(id).await.unwrap().balance, 70);
        assert_eq!(store.entry_count(), 1);
    }

    #[tokio::test]
    async fn test_dropped_unit_of_work_rolls_back_and_unlocks() {
        let (store, accounts) = store_with_accounts(&[100]).await;
        let id = accounts[0].id;

        {
            let mut uow = store.begin().await.unwrap();
            uow.add_account_balance(id, 50).await.unwrap();
        }

        let mut uow = store.begin().await.unwrap();
        let account = tokio::time::timeout(Duration::from_secs(1), uow.add_account_balance(id, 1))
            .await
            .expect("row lock should be released on drop")
            .unwrap();
        assert_eq!(account.balance, 101);
    }

    #[tokio::test]
    async fn test_row_lock_blocks_second_writer() {
        let (store, accounts) = store_with_accounts(&[100]).await;
        let id = accounts[0].id;

        let mut first = store.begin().await.unwrap();
        first.add_account_balance(id, 10).await.unwrap();

        let mut second = store.begin().await.unwrap();
        let blocked =
            tokio::time::timeout(Duration::from_millis(50), second.add_account_balance(id, 5)).await;
        assert!(blocked.is_err(), "second writer must wait for the row lock");

        first.commit().await.unwrap();
        let account = second.add_account_balance(id, 5).await.unwrap();
        assert_eq!(account.balance, 115);
    }

    #[tokio::test]
    async fn test_same_row_is_locked_once_per_unit_of_work() {
        let (store, accounts) = store_with_accounts(&[100]).await;
        let id = accounts[0].id;

        let mut uow = store.begin().await.unwrap();
        uow.add_account_balance(id, -10).await.unwrap();
        let account = tokio::time::timeout(Duration::from_secs(1), uow.add_account_balance(id, 10))
            .await
            .expect("re-adjusting a held row must not wait")
            .unwrap();
        assert_eq!(account.balance, 100);
    }

    #[tokio::test]
    async fn test_foreign_keys_checked_on_insert() {
        let (store, accounts) = store_with_accounts(&[0]).await;

        let mut uow = store.begin().await.unwrap();
        assert!(matches!(
            uow.create_entry(999, 1).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            uow.create_transfer(accounts[0].id, 999, 1).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_sequences_survive_rollback() {
        let (store, accounts) = store_with_accounts(&[0]).await;
        let id = accounts[0].id;

        let mut uow = store.begin().await.unwrap();
        let first = uow.create_entry(id, 1).await.unwrap();
        uow.rollback().await.unwrap();

        let mut uow = store.begin().await.unwrap();
        let second = uow.create_entry(id, 1).await.unwrap();
        uow.commit().await.unwrap();

        assert!(second.id > first.id);
        assert!(store.get_entry(first.id).await.is_err());
        assert!(store.get_entry(second.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_account_constraints() {
        let (store, accounts) = store_with_accounts(&[0]).await;

        let dup = store
            .create_account(NewAccount {
                owner: accounts[0].owner.clone(),
                balance: 0,
                currency: Currency::Usd,
            })
            .await;
        assert!(matches!(dup, Err(StoreError::Conflict(_))));

        let orphan = store
            .create_account(NewAccount {
                owner: "nobody".to_string(),
                balance: 0,
                currency: Currency::Eur,
            })
            .await;
        assert!(matches!(orphan, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_delete_account_with_history_is_refused() {
        let (store, accounts) = store_with_accounts(&[0]).await;
        let id = accounts[0].id;

        let mut uow = store.begin().await.unwrap();
        uow.create_entry(id, 5).await.unwrap();
        uow.commit().await.unwrap();

        assert!(matches!(
            store.delete_account(id).await,
            Err(StoreError::Conflict(_))
        ));
        assert!(matches!(
            store.delete_account(id + 1).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_refused_while_row_is_locked() {
        let (store, accounts) = store_with_accounts(&[100, 0]).await;
        let (a, b) = (accounts[0].id, accounts[1].id);

        let mut uow = store.begin().await.unwrap();
        uow.create_entry(a, -10).await.unwrap();
        uow.add_account_balance(a, -10).await.unwrap();
        uow.add_account_balance(b, 10).await.unwrap();

        assert!(matches!(
            store.delete_account(b).await,
            Err(StoreError::Conflict(_))
        ));

        uow.commit().await.unwrap();
        assert_eq!(store.get_account(a).await.unwrap().balance, 90);
        assert_eq!(store.get_account(b).await.unwrap().balance, 10);
        assert_eq!(store.entry_count(), 1);
    }

    #[tokio::test]
    async fn test_commit_is_all_or_nothing_when_a_row_vanished() {
        let (store, accounts) = store_with_accounts(&[100, 0]).await;
        let (a, b) = (accounts[0].id, accounts[1].id);

        // b is referenced by a staged entry but not yet locked.
        let mut uow = store.begin().await.unwrap();
        uow.add_account_balance(a, -10).await.unwrap();
        uow.create_entry(a, -10).await.unwrap();
        uow.create_entry(b, 10).await.unwrap();
        store.delete_account(b).await.unwrap();

        assert!(matches!(uow.commit().await, Err(StoreError::Conflict(_))));
        assert_eq!(store.get_account(a).await.unwrap().balance, 100);
        assert_eq!(store.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_call() {
        let (store, accounts) = store_with_accounts(&[0]).await;
        store.set_unavailable(true);

        assert!(matches!(store.ping().await, Err(StoreError::Database(_))));
        assert!(matches!(
            store.get_account(accounts[0].id).await,
            Err(StoreError::Database(_))
        ));
        assert!(store.begin().await.is_err());

        store.set_unavailable(false);
        assert!(store.ping().await.is_ok());
    }
}
