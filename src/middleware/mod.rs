pub mod auth;
pub mod extract;
pub mod response;

pub use auth::{jwt_auth_middleware, optional_auth_middleware, AuthUser};
pub use extract::{extract_json, extract_query};
pub use response::{ApiResponse, ApiResult};
