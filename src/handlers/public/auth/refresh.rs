use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::auth::{generate_jwt, validate_jwt, Claims, TokenType};
use crate::error::ApiError;
use crate::handlers::ApiJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct AccessToken {
    pub access: String,
}

/// POST /api/token/refresh - Exchange a refresh token for a new access token
///
/// Expected Input:
/// ```json
/// { "refresh": "eyJ..." }
/// ```
///
/// Access tokens are not accepted here, and the account must still exist.
pub async fn refresh_post(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> ApiResult<AccessToken> {
    let claims = validate_jwt(&payload.refresh, TokenType::Refresh)?;
    let user = state
        .store
        .get_user(claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

    let access = generate_jwt(&Claims::new(&user, TokenType::Access))?;
    Ok(ApiResponse::success(AccessToken { access }))
}
