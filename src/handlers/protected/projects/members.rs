use axum::{extract::State, Extension};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::database::models::{MemberDetail, Project, ProjectMember, User};
use crate::database::StoreError;
use crate::error::ApiError;
use crate::handlers::{ApiJson, ApiPath};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: Uuid,
}

/// Membership management is a staff capability, checked before the project lookup
async fn managed_project(state: &AppState, user: &AuthUser, project_id: Uuid) -> Result<Project, ApiError> {
    if !user.can_manage_project_members() {
        return Err(ApiError::permission_denied(
            "Only admins and managers can manage project members.",
        ));
    }
    state
        .store
        .get_project(project_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found."))
}

/// GET /api/projects/:id/members
pub async fn members_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(project_id): ApiPath<Uuid>,
) -> ApiResult<Vec<MemberDetail>> {
    let project = managed_project(&state, &user, project_id).await?;
    let members = state.store.list_members(project.id).await?;
    Ok(ApiResponse::success(members))
}

/// POST /api/projects/:id/members - Add a user to the project
///
/// Expected Input:
/// ```json
/// { "user_id": "..." }
/// ```
///
/// Rejected with 400 when the candidate is not a plain user, is already a
/// member, already belongs to the maximum number of projects, or owns the
/// project.
pub async fn members_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(project_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<AddMemberRequest>,
) -> ApiResult<ProjectMember> {
    let project = managed_project(&state, &user, project_id).await?;
    let max_projects = state.config.membership.max_projects_per_user;

    let member = match state.store.add_member(project.id, payload.user_id, max_projects).await {
        Ok(member) => member,
        Err(StoreError::NotFound("User")) => {
            return Err(ApiError::field("user_id", "User not found."));
        }
        Err(e) => return Err(e.into()),
    };

    info!("User {} added to project {} by {}", payload.user_id, project.id, user.username);
    Ok(ApiResponse::created(member))
}

/// DELETE /api/projects/:id/members/:user_id
pub async fn member_delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath((project_id, member_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<()> {
    let project = managed_project(&state, &user, project_id).await?;
    if !state.store.remove_member(project.id, member_id).await? {
        return Err(ApiError::not_found("Membership not found."));
    }
    info!("User {} removed from project {} by {}", member_id, project.id, user.username);
    Ok(ApiResponse::no_content())
}

/// GET /api/projects/:id/available-users - Users that could be added right now
pub async fn available_users_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(project_id): ApiPath<Uuid>,
) -> ApiResult<Vec<User>> {
    let project = managed_project(&state, &user, project_id).await?;
    let max_projects = state.config.membership.max_projects_per_user;
    let users = state.store.available_users(project.id, max_projects).await?;
    Ok(ApiResponse::success(users))
}
