//! Extractors that deserialize and then run `validator` rules.
//!
//! Handlers only ever see input that passed both steps; failures become a
//! 400 in the standard envelope.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use super::error::ApiError;

/// JSON body that passed its `Validate` rules.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value): Json<T> = Json::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON: {}", e.body_text())))?;

        value
            .validate()
            .map_err(|e| ApiError::bad_request(e.to_string()))?;

        Ok(ValidatedJson(value))
    }
}

/// Query string that passed its `Validate` rules.
#[derive(Debug)]
pub struct ValidatedQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value): Query<T> = Query::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid query: {}", e.body_text())))?;

        value
            .validate()
            .map_err(|e| ApiError::bad_request(e.to_string()))?;

        Ok(ValidatedQuery(value))
    }
}
