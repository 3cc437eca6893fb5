use axum::{extract::State, Extension};

use crate::database::models::{Task, User};
use crate::handlers::ApiJson;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::accounts::{self, RegistrationRequest};
use crate::AppState;

/// POST /api/users/create - Admin-driven account creation
///
/// Same body as /api/register. Only admins may create accounts here; any
/// other caller gets 403.
pub async fn user_create_post(
    State(state): State<AppState>,
    Extension(AuthUser(caller)): Extension<AuthUser>,
    ApiJson(payload): ApiJson<RegistrationRequest>,
) -> ApiResult<User> {
    let user = accounts::register(state.store.as_ref(), Some(&caller), payload).await?;
    Ok(ApiResponse::created(user))
}

/// GET /api/user/tasks - Tasks assigned to the caller
///
/// Only plain users have personal task lists; staff get an empty list.
pub async fn user_tasks_get(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> ApiResult<Vec<Task>> {
    if !user.is_user() {
        return Ok(ApiResponse::success(Vec::new()));
    }
    let tasks = state.store.list_assigned_tasks(user.id).await?;
    Ok(ApiResponse::success(tasks))
}
