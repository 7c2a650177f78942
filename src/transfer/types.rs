//! Transfer input/output types

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::TransferError;
use crate::models::{Account, Currency, Entry, Transfer};

/// Arguments of one transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferParams {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: i64,
}

impl TransferParams {
    pub fn new(from_account_id: i64, to_account_id: i64, amount: i64) -> Self {
        Self {
            from_account_id,
            to_account_id,
            amount,
        }
    }

    pub fn is_self_transfer(&self) -> bool {
        self.from_account_id == self.to_account_id
    }
}

/// Everything a committed transfer produced.
///
/// Account snapshots are taken right after each balance update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TransferResult {
    pub transfer: Transfer,
    pub from_account: Account,
    pub to_account: Account,
    pub from_entry: Entry,
    pub to_entry: Entry,
}

/// Reject an account whose currency differs from the requested one.
pub fn ensure_currency(account: &Account, currency: Currency) -> Result<(), TransferError> {
    if account.currency != currency {
        return Err(TransferError::CurrencyMismatch {
            account_id: account.id,
            expected: currency,
            actual: account.currency,
        });
    }
    Ok(())
}
