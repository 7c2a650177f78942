//! Transfer handler

use std::sync::Arc;

use axum::{Extension, extract::State};

use super::super::state::AppState;
use super::super::types::{
    ApiError, ApiResult, CreateTransferRequest, ValidatedJson, error_codes, ok,
};
use crate::models::{Account, Currency};
use crate::token::Payload;
use crate::transfer::{TransferParams, TransferResult, ensure_currency};

/// Account must exist and hold `currency`.
async fn valid_account(state: &AppState, id: i64, currency: Currency) -> Result<Account, ApiError> {
    let account = state.store.get_account(id).await?;
    ensure_currency(&account, currency)?;
    Ok(account)
}

/// Move money between two accounts
///
/// The source account must belong to the authenticated user.
#[utoipa::path(
    post,
    path = "/transfers",
    request_body = CreateTransferRequest,
    responses(
        (status = 200, description = "Transfer committed", body = TransferResult),
        (status = 400, description = "Invalid parameters or currency mismatch"),
        (status = 401, description = "Source account not owned by caller"),
        (status = 404, description = "Account not found"),
        (status = 500, description = "Internal error"),
        (status = 504, description = "Transfer timed out")
    ),
    security(("bearer_auth" = [])),
    tag = "Transfers"
)]
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    Extension(payload): Extension<Payload>,
    ValidatedJson(req): ValidatedJson<CreateTransferRequest>,
) -> ApiResult<TransferResult> {
    let from_account = valid_account(&state, req.from_account_id, req.currency).await?;
    if from_account.owner != payload.username {
        return ApiError::unauthorized(
            error_codes::NOT_OWNER,
            "from account doesn't belong to the authenticated user",
        )
        .into_err();
    }
    valid_account(&state, req.to_account_id, req.currency).await?;

    let result = state
        .engine
        .transfer(TransferParams::new(
            req.from_account_id,
            req.to_account_id,
            req.amount,
        ))
        .await?;

    ok(result)
}
