//! User registration and login

use std::sync::Arc;

use axum::extract::State;

use super::super::state::AppState;
use super::super::types::{
    ApiResult, CreateUserRequest, LoginUserRequest, LoginUserResponse, UserResponse,
    ValidatedJson, created, ok,
};
use crate::models::NewUser;
use crate::user::{check_password, hash_password};

/// Register a new user
#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid parameters"),
        (status = 403, description = "Username or email already taken")
    ),
    tag = "Users"
)]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> ApiResult<UserResponse> {
    let hashed_password = hash_password(&req.password)?;

    let user = state
        .store
        .create_user(NewUser {
            username: req.username,
            hashed_password,
            full_name: req.full_name,
            email: req.email,
        })
        .await?;

    tracing::info!(username = %user.username, "User created");
    created(UserResponse::from(user))
}

/// Log in and receive an access token
#[utoipa::path(
    post,
    path = "/users/login",
    request_body = LoginUserRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginUserResponse),
        (status = 400, description = "Invalid parameters"),
        (status = 401, description = "Wrong password"),
        (status = 404, description = "Unknown user")
    ),
    tag = "Users"
)]
pub async fn login_user(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginUserRequest>,
) -> ApiResult<LoginUserResponse> {
    let user = state.store.get_user(&req.username).await?;

    check_password(&req.password, &user.hashed_password)?;

    let (access_token, payload) = state
        .token_maker
        .create_token(&user.username, state.access_token_duration)?;

    tracing::info!(username = %user.username, token_id = %payload.id, "User logged in");
    ok(LoginUserResponse {
        access_token,
        access_token_expires_at: payload.expired_at,
        user: UserResponse::from(user),
    })
}
