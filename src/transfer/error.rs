//! Transfer Error Types

use std::time::Duration;

use thiserror::Error;

use crate::models::Currency;
use crate::store::StoreError;

/// Errors surfaced by the transfer engine and the checks its callers run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Raised by callers before invoking the engine.
    #[error("Account [{account_id}] currency mismatch: {actual} vs {expected}")]
    CurrencyMismatch {
        account_id: i64,
        expected: Currency,
        actual: Currency,
    },

    #[error("Transfer did not complete within {0:?}")]
    Timeout(Duration),

    #[error("Storage failure: {0}")]
    Storage(String),
}

impl TransferError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::InvalidAmount => "INVALID_AMOUNT",
            TransferError::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            TransferError::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            TransferError::Timeout(_) => "TIMEOUT",
            TransferError::Storage(_) => "STORAGE_FAILURE",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            TransferError::InvalidAmount | TransferError::CurrencyMismatch { .. } => 400,
            TransferError::AccountNotFound(_) => 404,
            TransferError::Timeout(_) => 504,
            TransferError::Storage(_) => 500,
        }
    }
}

impl From<StoreError> for TransferError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => TransferError::AccountNotFound(what),
            StoreError::Conflict(msg) | StoreError::Database(msg) => TransferError::Storage(msg),
        }
    }
}
