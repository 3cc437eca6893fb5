// handlers/protected/milestones.rs - /api/milestones
//
// Every single-object operation (including create and get) needs Ownership
// of the parent project. The list view is scoped like the project list.

use axum::{extract::State, Extension};
use uuid::Uuid;

use crate::database::models::{Milestone, MilestonePatch, NewMilestone};
use crate::database::ListScope;
use crate::error::ApiError;
use crate::handlers::{ApiJson, ApiPath};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::policy::Policy;
use crate::services::access;
use crate::AppState;

use super::parent_reference;

/// GET /api/milestones
pub async fn milestones_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<Milestone>> {
    let milestones = state.store.list_milestones(ListScope::for_user(&user)).await?;
    Ok(ApiResponse::success(milestones))
}

/// POST /api/milestones
///
/// Expected Input:
/// ```json
/// { "title": "Beta", "description": "", "due_date": "2025-09-01", "project": "..." }
/// ```
pub async fn milestones_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<NewMilestone>,
) -> ApiResult<Milestone> {
    access::project(state.store.as_ref(), &user, payload.project_id, Policy::Ownership)
        .await
        .map_err(|e| parent_reference("project", e))?;

    let milestone = payload.into_milestone();
    milestone.validate().map_err(ApiError::invalid_fields)?;

    let milestone = state.store.create_milestone(milestone).await?;
    Ok(ApiResponse::created(milestone))
}

/// GET /api/milestones/:id
pub async fn milestone_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Milestone> {
    let milestone = access::milestone(state.store.as_ref(), &user, id, Policy::Ownership).await?;
    Ok(ApiResponse::success(milestone))
}

/// PUT|PATCH /api/milestones/:id - A milestone cannot be moved to another project
pub async fn milestone_update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<MilestonePatch>,
) -> ApiResult<Milestone> {
    let mut milestone = access::milestone(state.store.as_ref(), &user, id, Policy::Ownership).await?;
    patch.apply(&mut milestone);
    milestone.validate().map_err(ApiError::invalid_fields)?;

    let milestone = state.store.update_milestone(&milestone).await?;
    Ok(ApiResponse::success(milestone))
}

/// DELETE /api/milestones/:id - Cascades to tasks, comments and attachments
pub async fn milestone_delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<()> {
    access::milestone(state.store.as_ref(), &user, id, Policy::Ownership).await?;
    state.store.delete_milestone(id).await?;
    Ok(ApiResponse::no_content())
}
