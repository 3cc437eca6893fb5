use axum::{extract::State, Extension};
use uuid::Uuid;

use crate::database::models::{NewProject, Project, ProjectPatch};
use crate::database::ListScope;
use crate::error::ApiError;
use crate::handlers::{ApiJson, ApiPath};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::policy::Policy;
use crate::services::access;
use crate::AppState;

/// GET /api/projects - Projects visible to the caller
///
/// Staff see every project; users see the ones they own or are members of.
pub async fn projects_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<Project>> {
    let projects = state.store.list_projects(ListScope::for_user(&user)).await?;
    Ok(ApiResponse::success(projects))
}

/// POST /api/projects - Create a project owned by the caller
pub async fn projects_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<NewProject>,
) -> ApiResult<Project> {
    if !user.can_create_projects() {
        return Err(ApiError::permission_denied("You cannot create projects."));
    }
    let project = payload.into_project(user.id);
    project.validate().map_err(ApiError::invalid_fields)?;

    let project = state.store.create_project(project).await?;
    Ok(ApiResponse::created(project))
}

/// GET /api/projects/:id - Owner or staff only; members get 403
pub async fn project_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Project> {
    let project = access::project(state.store.as_ref(), &user, id, Policy::Ownership).await?;
    Ok(ApiResponse::success(project))
}

/// PUT|PATCH /api/projects/:id - Partial update; owner or staff only
pub async fn project_update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<ProjectPatch>,
) -> ApiResult<Project> {
    let mut project = access::project(state.store.as_ref(), &user, id, Policy::Ownership).await?;
    patch.apply(&mut project);
    project.validate().map_err(ApiError::invalid_fields)?;

    let project = state.store.update_project(&project).await?;
    Ok(ApiResponse::success(project))
}

/// DELETE /api/projects/:id - Removes the project and everything under it
pub async fn project_delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<()> {
    access::project(state.store.as_ref(), &user, id, Policy::Ownership).await?;
    state.store.delete_project(id).await?;
    Ok(ApiResponse::no_content())
}
