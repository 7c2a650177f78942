//! PostgreSQL store
//!
//! Every unit of work is one `sqlx` transaction. Balance adjustments are a
//! single `UPDATE ... RETURNING`, so the row lock is taken by the update itself
//! and held until commit or rollback.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::{Store, StoreError, UnitOfWork};
use crate::models::{Account, Entry, NewAccount, NewUser, Transfer, User};

const ACCOUNT_COLUMNS: &str = "id, owner, balance, currency, created_at";
const ENTRY_COLUMNS: &str = "id, account_id, amount, created_at";
const TRANSFER_COLUMNS: &str = "id, from_account_id, to_account_id, amount, created_at";
const USER_COLUMNS: &str =
    "username, hashed_password, full_name, email, password_changed_at, created_at";

/// [`Store`] backed by a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn not_found(entity: &str, id: impl std::fmt::Display) -> StoreError {
    StoreError::NotFound(format!("{} {}", entity, id))
}

/// Unit of work over one open PostgreSQL transaction.
///
/// `sqlx` rolls the transaction back when it is dropped uncommitted.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn get_account(&mut self, id: i64) -> Result<Account, StoreError> {
        let sql = format!("SELECT {} FROM accounts WHERE id = $1", ACCOUNT_COLUMNS);
        sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| not_found("account", id))
    }

    async fn add_account_balance(&mut self, id: i64, delta: i64) -> Result<Account, StoreError> {
        let sql = format!(
            "UPDATE accounts SET balance = balance + $1 WHERE id = $2 RETURNING {}",
            ACCOUNT_COLUMNS
        );
        sqlx::query_as::<_, Account>(&sql)
            .bind(delta)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| not_found("account", id))
    }

    async fn create_entry(&mut self, account_id: i64, amount: i64) -> Result<Entry, StoreError> {
        let sql = format!(
            "INSERT INTO entries (account_id, amount) VALUES ($1, $2) RETURNING {}",
            ENTRY_COLUMNS
        );
        let entry = sqlx::query_as::<_, Entry>(&sql)
            .bind(account_id)
            .bind(amount)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(entry)
    }

    async fn create_transfer(
        &mut self,
        from_account_id: i64,
        to_account_id: i64,
        amount: i64,
    ) -> Result<Transfer, StoreError> {
        let sql = format!(
            r#"INSERT INTO transfers (from_account_id, to_account_id, amount)
               VALUES ($1, $2, $3)
               RETURNING {}"#,
            TRANSFER_COLUMNS
        );
        let transfer = sqlx::query_as::<_, Transfer>(&sql)
            .bind(from_account_id)
            .bind(to_account_id)
            .bind(amount)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(transfer)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            r#"INSERT INTO users (username, hashed_password, full_name, email)
               VALUES ($1, $2, $3, $4)
               RETURNING {}"#,
            USER_COLUMNS
        );
        let created = sqlx::query_as::<_, User>(&sql)
            .bind(&user.username)
            .bind(&user.hashed_password)
            .bind(&user.full_name)
            .bind(&user.email)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn get_user(&self, username: &str) -> Result<User, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found("user", username))
    }

    async fn create_account(&self, account: NewAccount) -> Result<Account, StoreError> {
        let sql = format!(
            "INSERT INTO accounts (owner, balance, currency) VALUES ($1, $2, $3) RETURNING {}",
            ACCOUNT_COLUMNS
        );
        sqlx::query_as::<_, Account>(&sql)
            .bind(&account.owner)
            .bind(account.balance)
            .bind(account.currency.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match StoreError::from(e) {
                // Unknown owner is a refused creation, not a missing account.
                StoreError::NotFound(msg) => StoreError::Conflict(msg),
                other => other,
            })
    }

    async fn get_account(&self, id: i64) -> Result<Account, StoreError> {
        let sql = format!("SELECT {} FROM accounts WHERE id = $1", ACCOUNT_COLUMNS);
        sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found("account", id))
    }

    async fn list_accounts(
        &self,
        owner: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Account>, StoreError> {
        let sql = format!(
            "SELECT {} FROM accounts WHERE owner = $1 ORDER BY id LIMIT $2 OFFSET $3",
            ACCOUNT_COLUMNS
        );
        let rows = sqlx::query_as::<_, Account>(&sql)
            .bind(owner)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn update_account(&self, id: i64, balance: i64) -> Result<Account, StoreError> {
        let sql = format!(
            "UPDATE accounts SET balance = $2 WHERE id = $1 RETURNING {}",
            ACCOUNT_COLUMNS
        );
        sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .bind(balance)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found("account", id))
    }

    async fn delete_account(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match StoreError::from(e) {
                // Entries/transfers still reference this account.
                StoreError::NotFound(msg) => StoreError::Conflict(msg),
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(not_found("account", id));
        }
        Ok(())
    }

    async fn get_entry(&self, id: i64) -> Result<Entry, StoreError> {
        let sql = format!("SELECT {} FROM entries WHERE id = $1", ENTRY_COLUMNS);
        sqlx::query_as::<_, Entry>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found("entry", id))
    }

    async fn list_entries(
        &self,
        account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Entry>, StoreError> {
        let sql = format!(
            "SELECT {} FROM entries WHERE account_id = $1 ORDER BY id LIMIT $2 OFFSET $3",
            ENTRY_COLUMNS
        );
        let rows = sqlx::query_as::<_, Entry>(&sql)
            .bind(account_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_transfer(&self, id: i64) -> Result<Transfer, StoreError> {
        let sql = format!("SELECT {} FROM transfers WHERE id = $1", TRANSFER_COLUMNS);
        sqlx::query_as::<_, Transfer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found("transfer", id))
    }

    async fn list_transfers(
        &self,
        account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transfer>, StoreError> {
        let sql = format!(
            r#"SELECT {} FROM transfers
               WHERE from_account_id = $1 OR to_account_id = $1
               ORDER BY id LIMIT $2 OFFSET $3"#,
            TRANSFER_COLUMNS
        );
        let rows = sqlx::query_as::<_, Transfer>(&sql)
            .bind(account_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
