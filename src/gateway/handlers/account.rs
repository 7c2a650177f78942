//! Account handlers
//!
//! Every route here sits behind the auth middleware and only ever touches
//! accounts owned by the token's subject.

use std::sync::Arc;

use axum::{
    Extension,
    extract::{Path, State},
};

use super::super::state::AppState;
use super::super::types::{
    ApiError, ApiResult, CreateAccountRequest, ListAccountsQuery, UpdateAccountRequest,
    ValidatedJson, ValidatedQuery, ok,
};
use crate::models::{Account, NewAccount};
use crate::token::Payload;

/// Load an account and check it belongs to `payload.username`.
async fn owned_account(state: &AppState, id: i64, payload: &Payload) -> Result<Account, ApiError> {
    if id < 1 {
        return Err(ApiError::bad_request("id must be at least 1"));
    }
    let account = state.store.get_account(id).await?;
    if account.owner != payload.username {
        return Err(ApiError::not_owner());
    }
    Ok(account)
}

/// Open an account for the authenticated user
#[utoipa::path(
    post,
    path = "/accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 200, description = "Account created", body = Account),
        (status = 400, description = "Invalid currency"),
        (status = 401, description = "Authentication failed"),
        (status = 403, description = "Account for this currency already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Accounts"
)]
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Extension(payload): Extension<Payload>,
    ValidatedJson(req): ValidatedJson<CreateAccountRequest>,
) -> ApiResult<Account> {
    let account = state
        .store
        .create_account(NewAccount {
            owner: payload.username,
            balance: 0,
            currency: req.currency,
        })
        .await?;

    tracing::info!(account_id = account.id, owner = %account.owner, currency = %account.currency, "Account created");
    ok(account)
}

#[utoipa::path(
    get,
    path = "/accounts/{id}",
    params(("id" = i64, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account", body = Account),
        (status = 401, description = "Not the owner"),
        (status = 404, description = "Account not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Accounts"
)]
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Extension(payload): Extension<Payload>,
    Path(id): Path<i64>,
) -> ApiResult<Account> {
    ok(owned_account(&state, id, &payload).await?)
}

/// List the authenticated user's accounts, one page at a time
#[utoipa::path(
    get,
    path = "/accounts",
    params(ListAccountsQuery),
    responses(
        (status = 200, description = "Accounts", body = Vec<Account>),
        (status = 400, description = "Invalid paging parameters")
    ),
    security(("bearer_auth" = [])),
    tag = "Accounts"
)]
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    Extension(payload): Extension<Payload>,
    ValidatedQuery(query): ValidatedQuery<ListAccountsQuery>,
) -> ApiResult<Vec<Account>> {
    let offset = query
        .offset()
        .ok_or_else(|| ApiError::bad_request("page_id is out of range"))?;
    let accounts = state
        .store
        .list_accounts(&payload.username, query.page_size, offset)
        .await?;
    ok(accounts)
}

/// Overwrite an account balance
///
/// Plain write, not coordinated with in-flight transfers.
#[utoipa::path(
    put,
    path = "/accounts",
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Updated account", body = Account),
        (status = 401, description = "Not the owner"),
        (status = 404, description = "Account not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Accounts"
)]
pub async fn update_account(
    State(state): State<Arc<AppState>>,
    Extension(payload): Extension<Payload>,
    ValidatedJson(req): ValidatedJson<UpdateAccountRequest>,
) -> ApiResult<Account> {
    owned_account(&state, req.id, &payload).await?;
    let account = state.store.update_account(req.id, req.balance).await?;
    tracing::info!(account_id = account.id, balance = account.balance, "Account balance overwritten");
    ok(account)
}

#[utoipa::path(
    delete,
    path = "/accounts/{id}",
    params(("id" = i64, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account deleted"),
        (status = 401, description = "Not the owner"),
        (status = 403, description = "Account has ledger history"),
        (status = 404, description = "Account not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Accounts"
)]
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(payload): Extension<Payload>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    owned_account(&state, id, &payload).await?;
    state.store.delete_account(id).await?;
    tracing::info!(account_id = id, "Account deleted");
    ok(())
}
