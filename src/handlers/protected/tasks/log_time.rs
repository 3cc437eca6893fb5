use axum::{extract::State, Extension};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::handlers::{ApiJson, ApiPath};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::policy::Policy;
use crate::services::access;
use crate::services::time_tracking::{parse_hours, LoggedTime};
use crate::AppState;

/// POST /api/tasks/:id/log_time - Add hours to a task
///
/// Expected Input:
/// ```json
/// { "hours": 2.5 }
/// ```
///
/// Expected Output (Success):
/// ```json
/// { "success": true, "data": { "task_id": "...", "logged_hours": 3.5 } }
/// ```
///
/// Zero, negative, missing or non-numeric hours are rejected with 400, as are
/// values with more than two decimal places and a total above 999.99.
pub async fn log_time_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<LoggedTime> {
    let task = access::task(state.store.as_ref(), &user, id, Policy::Participation).await?;
    let hours = parse_hours(body.get("hours"))?;

    let logged_hours = state.store.log_time(task.id, hours).await?;
    info!("{} logged {} hours on task {}", user.username, hours, task.id);

    Ok(ApiResponse::success(LoggedTime {
        task_id: task.id,
        logged_hours,
    }))
}
