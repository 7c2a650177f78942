//! `ApiError`: the single error type returned by handlers and middleware.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::response::{ApiResponse, error_codes};
use crate::store::StoreError;
use crate::token::TokenError;
use crate::transfer::TransferError;
use crate::user::PasswordError;

/// Message used for every failure whose detail must stay server-side.
pub const INTERNAL_ERROR_MSG: &str = "internal error";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub msg: String,
}

pub type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

/// 200 with `data`.
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok((StatusCode::OK, Json(ApiResponse::success(data))))
}

/// 201 with `data`.
pub fn created<T>(data: T) -> ApiResult<T> {
    Ok((StatusCode::CREATED, Json(ApiResponse::success(data))))
}

fn status_of(http_status: u16) -> StatusCode {
    StatusCode::from_u16(http_status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl ApiError {
    pub fn new(status: StatusCode, code: i32, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER, msg)
    }

    pub fn unauthorized(code: i32, msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, code, msg)
    }

    pub fn not_owner() -> Self {
        Self::unauthorized(
            error_codes::NOT_OWNER,
            "account doesn't belong to the authenticated user",
        )
    }

    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            error_codes::INTERNAL_ERROR,
            INTERNAL_ERROR_MSG,
        )
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            error_codes::SERVICE_UNAVAILABLE,
            msg,
        )
    }

    pub fn into_err<T>(self) -> ApiResult<T> {
        Err(self)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ApiResponse::<()>::error(self.code, self.msg)),
        )
            .into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match &e {
            StoreError::NotFound(what) => Self::new(
                status_of(e.http_status()),
                error_codes::NOT_FOUND,
                format!("{} not found", what),
            ),
            StoreError::Conflict(_) => {
                Self::new(status_of(e.http_status()), error_codes::ALREADY_EXISTS, e.to_string())
            }
            StoreError::Database(_) => {
                tracing::error!(error = %e, "Storage failure");
                Self::internal()
            }
        }
    }
}

impl From<TransferError> for ApiError {
    fn from(e: TransferError) -> Self {
        let status = status_of(e.http_status());
        match &e {
            TransferError::InvalidAmount => Self::new(status, error_codes::INVALID_AMOUNT, e.to_string()),
            TransferError::AccountNotFound(_) => Self::new(status, error_codes::NOT_FOUND, e.to_string()),
            TransferError::CurrencyMismatch { .. } => {
                Self::new(status, error_codes::CURRENCY_MISMATCH, e.to_string())
            }
            TransferError::Timeout(_) => Self::new(status, error_codes::TIMEOUT, e.to_string()),
            TransferError::Storage(_) => {
                tracing::error!(error = %e, "Transfer storage failure");
                Self::internal()
            }
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        match &e {
            TokenError::InvalidToken => Self::unauthorized(error_codes::AUTH_FAILED, e.to_string()),
            TokenError::ExpiredToken => Self::unauthorized(error_codes::TOKEN_EXPIRED, e.to_string()),
            TokenError::InvalidKeySize { .. } | TokenError::Encoding(_) => {
                tracing::error!(error = %e, code = e.code(), "Token failure");
                Self::internal()
            }
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(e: PasswordError) -> Self {
        match &e {
            PasswordError::Mismatch => Self::unauthorized(error_codes::WRONG_PASSWORD, e.to_string()),
            PasswordError::Hashing(_) => {
                tracing::error!(error = %e, "Password hashing failure");
                Self::internal()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_store_errors() {
        let e = ApiError::from(StoreError::NotFound("account 3".into()));
        assert_eq!(e.status, StatusCode::NOT_FOUND);
        assert_eq!(e.msg, "account 3 not found");

        let e = ApiError::from(StoreError::Conflict("dup".into()));
        assert_eq!(e.status, StatusCode::FORBIDDEN);
        assert_eq!(e.code, error_codes::ALREADY_EXISTS);
    }

    #[test]
    fn test_storage_failure_hides_detail() {
        let e = ApiError::from(StoreError::Database("password=hunter2".into()));
        assert_eq!(e.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.msg, INTERNAL_ERROR_MSG);

        let e = ApiError::from(TransferError::Storage("deadlock detected".into()));
        assert_eq!(e.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.msg, INTERNAL_ERROR_MSG);
    }

    #[test]
    fn test_transfer_errors_map_to_distinct_statuses() {
        let cases = [
            (TransferError::InvalidAmount, StatusCode::BAD_REQUEST),
            (
                TransferError::AccountNotFound("account 1".into()),
                StatusCode::NOT_FOUND,
            ),
            (
                TransferError::Timeout(Duration::from_millis(5)),
                StatusCode::GATEWAY_TIMEOUT,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_token_errors_are_unauthorized() {
        assert_eq!(
            ApiError::from(TokenError::InvalidToken).status,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(TokenError::ExpiredToken).code,
            error_codes::TOKEN_EXPIRED
        );
    }

    #[test]
    fn test_wrong_password_is_unauthorized() {
        let e = ApiError::from(PasswordError::Mismatch);
        assert_eq!(e.status, StatusCode::UNAUTHORIZED);
    }
}
