pub mod auth;
pub mod response;
pub mod trace;

pub use auth::{jwt_auth_middleware, optional_user, AuthUser};
pub use response::{ApiResponse, ApiResult};
pub use trace::trace_id_middleware;
