//! Transfer Engine
//!
//! Moves money between two accounts in one unit of work: one transfer record,
//! two entries, two balance adjustments. Either all five writes commit or none.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tracing::{debug, info, warn};

use super::error::TransferError;
use super::types::{TransferParams, TransferResult};
use crate::models::Account;
use crate::store::{Store, UnitOfWork, execute_atomically};

/// Executes transfers against a [`Store`].
///
/// Cheap to clone; every clone shares the same store.
#[derive(Clone)]
pub struct TransferEngine {
    store: Arc<dyn Store>,
    timeout: Option<Duration>,
}

impl TransferEngine {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            timeout: None,
        }
    }

    /// Default deadline applied by [`TransferEngine::transfer`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Execute one transfer under the engine's default deadline, if any.
    pub async fn transfer(&self, params: TransferParams) -> Result<TransferResult, TransferError> {
        match self.timeout {
            Some(deadline) => self.transfer_with_deadline(params, deadline).await,
            None => self.execute(params).await,
        }
    }

    /// Execute one transfer, giving up after `deadline`.
    ///
    /// On expiry the in-flight unit of work is dropped, which rolls it back
    /// and releases its row locks.
    pub async fn transfer_with_deadline(
        &self,
        params: TransferParams,
        deadline: Duration,
    ) -> Result<TransferResult, TransferError> {
        match tokio::time::timeout(deadline, self.execute(params)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    from_account_id = params.from_account_id,
                    to_account_id = params.to_account_id,
                    amount = params.amount,
                    deadline_ms = deadline.as_millis() as u64,
                    "Transfer deadline exceeded, rolled back"
                );
                Err(TransferError::Timeout(deadline))
            }
        }
    }

    async fn execute(&self, params: TransferParams) -> Result<TransferResult, TransferError> {
        if params.amount <= 0 {
            return Err(TransferError::InvalidAmount);
        }

        debug!(
            from_account_id = params.from_account_id,
            to_account_id = params.to_account_id,
            amount = params.amount,
            "Transfer started"
        );

        let result = execute_atomically(self.store.as_ref(), move |tx| {
            run_transfer(tx, params).boxed()
        })
        .await;

        match &result {
            Ok(done) => info!(
                transfer_id = done.transfer.id,
                from_account_id = params.from_account_id,
                to_account_id = params.to_account_id,
                amount = params.amount,
                from_balance = done.from_account.balance,
                to_balance = done.to_account.balance,
                "Transfer committed"
            ),
            Err(e) => warn!(
                from_account_id = params.from_account_id,
                to_account_id = params.to_account_id,
                amount = params.amount,
                code = e.code(),
                error = %e,
                "Transfer failed"
            ),
        }

        result
    }
}

/// Body of the unit of work.
async fn run_transfer(
    tx: &mut dyn UnitOfWork,
    params: TransferParams,
) -> Result<TransferResult, TransferError> {
    let TransferParams {
        from_account_id,
        to_account_id,
        amount,
    } = params;

    // Existence checks first so a missing account is named precisely.
    let (low, high) = if from_account_id <= to_account_id {
        (from_account_id, to_account_id)
    } else {
        (to_account_id, from_account_id)
    };
    tx.get_account(low).await?;
    if !params.is_self_transfer() {
        tx.get_account(high).await?;
    }

    let transfer = tx
        .create_transfer(from_account_id, to_account_id, amount)
        .await?;
    let from_entry = tx.create_entry(from_account_id, -amount).await?;
    let to_entry = tx.create_entry(to_account_id, amount).await?;

    // Smaller id is always locked first, so two opposite transfers can never
    // wait on each other.
    let (from_account, to_account) = if from_account_id <= to_account_id {
        adjust_pair(tx, (from_account_id, -amount), (to_account_id, amount)).await?
    } else {
        let (to_account, from_account) =
            adjust_pair(tx, (to_account_id, amount), (from_account_id, -amount)).await?;
        (from_account, to_account)
    };

    Ok(TransferResult {
        transfer,
        from_account,
        to_account,
        from_entry,
        to_entry,
    })
}

/// Apply two balance deltas in the given order.
async fn adjust_pair(
    tx: &mut dyn UnitOfWork,
    (first_id, first_delta): (i64, i64),
    (second_id, second_delta): (i64, i64),
) -> Result<(Account, Account), TransferError> {
    let first = tx.add_account_balance(first_id, first_delta).await?;
    let second = tx.add_account_balance(second_id, second_delta).await?;
    Ok((first, second))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Currency, NewAccount, NewUser};
    use crate::store::MemStore;

    async fn setup(balances: &[i64]) -> (Arc<MemStore>, TransferEngine, Vec<Account>) {
        let store = Arc::new(MemStore::new());
        let mut accounts = Vec::new();
        for (i, balance) in balances.iter().enumerate() {
            // (owner, currency) is unique; spread accounts over owners.
            let owner = format!("owner{}", i);
            store
                .create_user(NewUser {
                    username: owner.clone(),
                    hashed_password: "x".to_string(),
                    full_name: owner.clone(),
                    email: format!("{}@example.com", owner),
                })
                .await
                .unwrap();
            let account = store
                .create_account(NewAccount {
                    owner,
                    balance: *balance,
                    currency: Currency::Usd,
                })
                .await
                .unwrap();
            accounts.push(account);
        }

        let engine = TransferEngine::new(store.clone());
        (store, engine, accounts)
    }

    #[tokio::test]
    async fn test_basic_transfer() {
        let (store, engine, accounts) = setup(&[100, 50]).await;
        let (a, b) = (&accounts[0], &accounts[1]);

        let result = engine
            .transfer(TransferParams::new(a.id, b.id, 30))
            .await
            .unwrap();

        assert_eq!(result.transfer.from_account_id, a.id);
        assert_eq!(result.transfer.to_account_id, b.id);
        assert_eq!(result.transfer.amount, 30);
        assert_eq!(result.from_entry.account_id, a.id);
        assert_eq!(result.from_entry.amount, -30);
        assert_eq!(result.to_entry.account_id, b.id);
        assert_eq!(result.to_entry.amount, 30);
        assert_eq!(result.from_account.balance, 70);
        assert_eq!(result.to_account.balance, 80);

        assert_eq!(store.get_account(a.id).await.unwrap().balance, 70);
        assert_eq!(store.get_account(b.id).await.unwrap().balance, 80);
    }

    #[tokio::test]
    async fn test_reverse_direction_reports_accounts_correctly() {
        let (_store, engine, accounts) = setup(&[100, 50]).await;
        let (a, b) = (&accounts[0], &accounts[1]);

        // from has the larger id, so the destination is adjusted first.
        let result = engine
            .transfer(TransferParams::new(b.id, a.id, 20))
            .await
            .unwrap();

        assert_eq!(result.from_account.id, b.id);
        assert_eq!(result.from_account.balance, 30);
        assert_eq!(result.to_account.id, a.id);
        assert_eq!(result.to_account.balance, 120);
    }

    #[tokio::test]
    async fn test_non_positive_amount_rejected_without_writes() {
        let (store, engine, accounts) = setup(&[100, 50]).await;
        let (a, b) = (&accounts[0], &accounts[1]);

        for amount in [0, -5] {
            let err = engine
                .transfer(TransferParams::new(a.id, b.id, amount))
                .await
                .unwrap_err();
            assert_eq!(err, TransferError::InvalidAmount);
        }
        assert_eq!(store.transfer_count(), 0);
        assert_eq!(store.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_destination_leaves_no_trace() {
        let (store, engine, accounts) = setup(&[100]).await;
        let a = &accounts[0];

        let err = engine
            .transfer(TransferParams::new(a.id, a.id + 99, 10))
            .await
            .unwrap_err();

        assert!(matches!(err, TransferError::AccountNotFound(_)));
        assert_eq!(store.get_account(a.id).await.unwrap().balance, 100);
        assert_eq!(store.transfer_count(), 0);
        assert_eq!(store.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_self_transfer_keeps_balance() {
        let (store, engine, accounts) = setup(&[100]).await;
        let a = &accounts[0];

        let result = engine
            .transfer(TransferParams::new(a.id, a.id, 10))
            .await
            .unwrap();

        assert_eq!(result.from_account.balance, 90);
        assert_eq!(result.to_account.balance, 100);
        assert_eq!(store.get_account(a.id).await.unwrap().balance, 100);
        assert_eq!(store.transfer_count(), 1);
        assert_eq!(store.entry_count(), 2);
    }

    #[tokio::test]
    async fn test_storage_unavailable() {
        let (store, engine, accounts) = setup(&[100, 50]).await;
        store.set_unavailable(true);

        let err = engine
            .transfer(TransferParams::new(accounts[0].id, accounts[1].id, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::Storage(_)));
    }

    #[tokio::test]
    async fn test_default_timeout_is_applied() {
        let (_store, engine, _accounts) = setup(&[]).await;
        let engine = engine.with_timeout(Duration::from_millis(250));
        assert_eq!(engine.timeout(), Some(Duration::from_millis(250)));
    }
}
