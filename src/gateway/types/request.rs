//! Request DTOs with their field rules

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::models::Currency;

/// Usernames are ASCII letters and digits only.
fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() || !username.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::new("alphanumeric"));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(custom(function = "validate_username"))]
    #[schema(example = "alice")]
    pub username: String,
    #[validate(length(min = 6))]
    #[schema(example = "secret123")]
    pub password: String,
    #[validate(length(min = 1))]
    #[schema(example = "Alice Liddell")]
    pub full_name: String,
    #[validate(email)]
    #[schema(example = "alice@example.com")]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginUserRequest {
    #[validate(custom(function = "validate_username"))]
    #[schema(example = "alice")]
    pub username: String,
    #[validate(length(min = 6))]
    #[schema(example = "secret123")]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAccountRequest {
    #[schema(example = "USD")]
    pub currency: Currency,
}

#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListAccountsQuery {
    /// 1-based page number
    #[validate(range(min = 1))]
    pub page_id: i64,
    #[validate(range(min = 5, max = 10))]
    pub page_size: i64,
}

impl ListAccountsQuery {
    /// Row offset of the page; `None` when it does not fit in an `i64`.
    pub fn offset(&self) -> Option<i64> {
        (self.page_id - 1).checked_mul(self.page_size)
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateAccountRequest {
    #[validate(range(min = 1))]
    pub id: i64,
    pub balance: i64,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTransferRequest {
    #[validate(range(min = 1))]
    pub from_account_id: i64,
    #[validate(range(min = 1))]
    pub to_account_id: i64,
    #[validate(range(min = 1))]
    pub amount: i64,
    #[schema(example = "USD")]
    pub currency: Currency,
}
