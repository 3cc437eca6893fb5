use axum::extract::State;
use serde::Deserialize;
use tracing::info;

use crate::auth::{issue_pair, TokenPair};
use crate::handlers::ApiJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::accounts;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// POST /api/login - Authenticate user and receive JWT tokens
///
/// Expected Input:
/// ```json
/// { "username": "alice", "password": "..." }
/// ```
///
/// Expected Output (Success):
/// ```json
/// { "success": true, "data": { "access": "eyJ...", "refresh": "eyJ..." } }
/// ```
///
/// Unknown users and wrong passwords are both answered with 401.
pub async fn login_post(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<TokenPair> {
    let user = accounts::authenticate(state.store.as_ref(), &payload.username, &payload.password).await?;
    let pair = issue_pair(&user)?;
    info!("User '{}' logged in", user.username);
    Ok(ApiResponse::success(pair))
}
