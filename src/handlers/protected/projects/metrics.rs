use axum::{extract::State, Extension};
use uuid::Uuid;

use crate::handlers::ApiPath;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::policy::Policy;
use crate::services::access;
use crate::services::time_tracking::{ProjectHours, ProjectProgress};
use crate::AppState;

/// GET /api/projects/:id/total_hours - Sum of logged hours over every task
pub async fn total_hours_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ProjectHours> {
    let project = access::project(state.store.as_ref(), &user, id, Policy::Participation).await?;
    let stats = state.store.task_stats(project.id).await?;
    Ok(ApiResponse::success(ProjectHours {
        project_id: project.id,
        total_hours: stats.logged_hours,
    }))
}

/// GET /api/projects/:id/progress - Share of done tasks, in percent
pub async fn progress_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ProjectProgress> {
    let project = access::project(state.store.as_ref(), &user, id, Policy::Participation).await?;
    let stats = state.store.task_stats(project.id).await?;
    Ok(ApiResponse::success(ProjectProgress {
        project_id: project.id,
        progress_percent: stats.progress_percent(),
    }))
}
