//! OpenAPI / Swagger UI Documentation
//!
//! - Swagger UI: `http://localhost:8080/docs`
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::gateway::handlers::HealthResponse;
use crate::gateway::types::{
    CreateAccountRequest, CreateTransferRequest, CreateUserRequest, LoginUserRequest,
    LoginUserResponse, UpdateAccountRequest, UserResponse,
};
use crate::models::{Account, Currency, Entry, Transfer};
use crate::transfer::TransferResult;

/// Bearer access token issued by `POST /users/login`
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Access token from POST /users/login"))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Demo Bank API",
        version = "0.1.0",
        description = "Accounts, ledger entries and atomic transfers between accounts."
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health::health_check,
        crate::gateway::handlers::user::create_user,
        crate::gateway::handlers::user::login_user,
        crate::gateway::handlers::account::create_account,
        crate::gateway::handlers::account::get_account,
        crate::gateway::handlers::account::list_accounts,
        crate::gateway::handlers::account::update_account,
        crate::gateway::handlers::account::delete_account,
        crate::gateway::handlers::transfer::create_transfer,
    ),
    components(
        schemas(
            HealthResponse,
            Currency,
            Account,
            Entry,
            Transfer,
            TransferResult,
            CreateUserRequest,
            LoginUserRequest,
            UserResponse,
            LoginUserResponse,
            CreateAccountRequest,
            UpdateAccountRequest,
            CreateTransferRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Users", description = "Registration and login"),
        (name = "Accounts", description = "Account management (auth required)"),
        (name = "Transfers", description = "Money transfers between accounts (auth required)"),
        (name = "System", description = "Health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_generates() {
        let doc = ApiDoc::openapi();
        assert_eq!(doc.info.title, "Demo Bank API");
        assert!(doc.to_json().is_ok());
    }

    #[test]
    fn test_endpoints_registered() {
        let paths = ApiDoc::openapi().paths.paths;
        for path in [
            "/api/v1/health",
            "/users",
            "/users/login",
            "/accounts",
            "/accounts/{id}",
            "/transfers",
        ] {
            assert!(paths.contains_key(path), "missing {}", path);
        }
    }

    #[test]
    fn test_security_scheme_registered() {
        let components = ApiDoc::openapi().components.expect("should have components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
