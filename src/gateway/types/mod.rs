//! Gateway types module
//!
//! ## Input Types
//! - [`request`]: request DTOs with `validator` rules
//! - [`ValidatedJson`] / [`ValidatedQuery`]: extractors enforcing those rules
//!
//! ## Output Types
//! - [`ApiResponse<T>`]: Unified API response wrapper
//! - [`ApiError`]: error envelope with HTTP status

pub mod error;
pub mod extract;
pub mod request;
pub mod response;

pub use error::{ApiError, ApiResult, INTERNAL_ERROR_MSG, created, ok};
pub use extract::{ValidatedJson, ValidatedQuery};
pub use request::{
    CreateAccountRequest, CreateTransferRequest, CreateUserRequest, ListAccountsQuery,
    LoginUserRequest, UpdateAccountRequest,
};
pub use response::{ApiResponse, LoginUserResponse, UserResponse, error_codes};
