use axum::{extract::State, Extension};
use uuid::Uuid;

use crate::database::models::{NewTask, Task, TaskPatch, User};
use crate::database::ListScope;
use crate::error::ApiError;
use crate::handlers::protected::parent_reference;
use crate::handlers::{ApiJson, ApiPath};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::policy::Policy;
use crate::services::access;
use crate::AppState;

/// Assigning a task to somebody else needs the assign capability, and the
/// assignee has to exist
async fn check_assignee(state: &AppState, actor: &User, assignee: Option<Uuid>) -> Result<(), ApiError> {
    let Some(assignee) = assignee else {
        return Ok(());
    };
    if assignee != actor.id && !actor.can_assign_tasks() {
        return Err(ApiError::permission_denied(
            "Only admins and managers can assign tasks to other users.",
        ));
    }
    if state.store.get_user(assignee).await?.is_none() {
        return Err(ApiError::field("assignee", "Invalid pk - object does not exist."));
    }
    Ok(())
}

/// GET /api/tasks
pub async fn tasks_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<Task>> {
    let tasks = state.store.list_tasks(ListScope::for_user(&user)).await?;
    Ok(ApiResponse::success(tasks))
}

/// POST /api/tasks
///
/// Expected Input:
/// ```json
/// {
///   "title": "Write copy",
///   "milestone": "...",
///   "status": "todo",          // optional
///   "priority": "medium",      // optional
///   "assignee": "..."          // optional
/// }
/// ```
///
/// `logged_hours` always starts at 0 and only changes through log_time.
pub async fn tasks_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<NewTask>,
) -> ApiResult<Task> {
    let milestone = state
        .store
        .get_milestone(payload.milestone_id)
        .await?
        .ok_or_else(|| ApiError::field("milestone", "Invalid pk - object does not exist."))?;
    access::project(state.store.as_ref(), &user, milestone.project_id, Policy::Participation)
        .await
        .map_err(|e| parent_reference("milestone", e))?;

    check_assignee(&state, &user, payload.assignee_id).await?;

    let task = payload.into_task();
    task.validate().map_err(ApiError::invalid_fields)?;

    let task = state.store.create_task(task).await?;
    Ok(ApiResponse::created(task))
}

/// GET /api/tasks/:id
pub async fn task_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Task> {
    let task = access::task(state.store.as_ref(), &user, id, Policy::Participation).await?;
    Ok(ApiResponse::success(task))
}

/// PUT|PATCH /api/tasks/:id - Partial update; `logged_hours` is ignored
pub async fn task_update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<TaskPatch>,
) -> ApiResult<Task> {
    let mut task = access::task(state.store.as_ref(), &user, id, Policy::Participation).await?;

    if let Some(assignee) = patch.assignee_id {
        if assignee != task.assignee_id {
            check_assignee(&state, &user, assignee).await?;
        }
    }

    patch.apply(&mut task);
    task.validate().map_err(ApiError::invalid_fields)?;

    let task = state.store.update_task(&task).await?;
    Ok(ApiResponse::success(task))
}

/// DELETE /api/tasks/:id
pub async fn task_delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<()> {
    access::task(state.store.as_ref(), &user, id, Policy::Participation).await?;
    state.store.delete_task(id).await?;
    Ok(ApiResponse::no_content())
}
