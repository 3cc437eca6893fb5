use axum::{extract::State, http::HeaderMap};

use crate::database::models::User;
use crate::handlers::ApiJson;
use crate::middleware::{optional_user, ApiResponse, ApiResult};
use crate::services::accounts::{self, RegistrationRequest};
use crate::AppState;

/// POST /api/register - Create an account
///
/// Expected Input:
/// ```json
/// {
///   "username": "alice",
///   "email": "alice@example.com",
///   "password": "...",
///   "password2": "...",
///   "first_name": "Alice",     // optional
///   "last_name": "Liddell",    // optional
///   "role": "user"             // optional, defaults to "user"
/// }
/// ```
///
/// Anonymous callers may only create `admin` accounts (first-run bootstrap).
/// With a bearer token, the caller must be an admin.
pub async fn register_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<RegistrationRequest>,
) -> ApiResult<User> {
    let caller = optional_user(&state, &headers).await?;
    let user = accounts::register(state.store.as_ref(), caller.as_ref(), payload).await?;
    Ok(ApiResponse::created(user))
}
