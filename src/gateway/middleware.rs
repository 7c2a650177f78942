//! Bearer-token authentication

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};

use super::state::AppState;
use super::types::{ApiError, error_codes};

const BEARER: &str = "bearer";

/// Pull the token out of `Authorization: Bearer <token>`.
///
/// The scheme is matched case-insensitively.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| {
            ApiError::unauthorized(error_codes::MISSING_AUTH, "authorization header is not provided")
        })?
        .to_str()
        .map_err(|_| {
            ApiError::unauthorized(error_codes::AUTH_FAILED, "invalid authorization header format")
        })?;

    let fields: Vec<&str> = value.split_whitespace().collect();
    let [scheme, token] = fields.as_slice() else {
        return Err(ApiError::unauthorized(
            error_codes::AUTH_FAILED,
            "invalid authorization header format",
        ));
    };

    if !scheme.eq_ignore_ascii_case(BEARER) {
        return Err(ApiError::unauthorized(
            error_codes::AUTH_FAILED,
            format!("unsupported authorization type {}", scheme),
        ));
    }

    Ok(*token)
}

/// Verify the bearer token and inject its [`crate::token::Payload`].
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers())?;

    let payload = state.token_maker.verify_token(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        ApiError::from(e)
    })?;

    request.extensions_mut().insert(payload);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        map
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token(&headers("Bearer abc")).unwrap(), "abc");
        assert_eq!(extract_bearer_token(&headers("bearer abc")).unwrap(), "abc");
        assert_eq!(extract_bearer_token(&headers("BEARER abc")).unwrap(), "abc");
    }

    #[test]
    fn test_missing_header() {
        let err = extract_bearer_token(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.code, error_codes::MISSING_AUTH);
    }

    #[test]
    fn test_malformed_headers() {
        for value in ["Bearer", "abc", "Bearer a b", "Basic abc"] {
            let err = extract_bearer_token(&headers(value)).unwrap_err();
            assert_eq!(err.status, axum::http::StatusCode::UNAUTHORIZED, "{}", value);
        }
    }
}
