// handlers/protected/comments.rs - /api/comments
//
// Every operation runs the Participation policy against the comment's task.
// The author is always the caller.

use axum::{extract::State, Extension};
use uuid::Uuid;

use crate::database::models::{Comment, CommentPatch, NewComment};
use crate::database::ListScope;
use crate::error::ApiError;
use crate::handlers::{ApiJson, ApiPath};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::policy::Policy;
use crate::services::access;
use crate::AppState;

use super::parent_reference;

/// GET /api/comments
pub async fn comments_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<Comment>> {
    let comments = state.store.list_comments(ListScope::for_user(&user)).await?;
    Ok(ApiResponse::success(comments))
}

/// POST /api/comments
///
/// Expected Input:
/// ```json
/// { "task": "...", "content": "Looks good" }
/// ```
pub async fn comments_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<NewComment>,
) -> ApiResult<Comment> {
    access::task(state.store.as_ref(), &user, payload.task_id, Policy::Participation)
        .await
        .map_err(|e| parent_reference("task", e))?;

    let comment = payload.into_comment(user.id);
    comment.validate().map_err(ApiError::invalid_fields)?;

    let comment = state.store.create_comment(comment).await?;
    Ok(ApiResponse::created(comment))
}

/// GET /api/comments/:id
pub async fn comment_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Comment> {
    let comment = access::comment(state.store.as_ref(), &user, id, Policy::Participation).await?;
    Ok(ApiResponse::success(comment))
}

/// PUT|PATCH /api/comments/:id
pub async fn comment_update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<CommentPatch>,
) -> ApiResult<Comment> {
    let mut comment = access::comment(state.store.as_ref(), &user, id, Policy::Participation).await?;
    patch.apply(&mut comment);
    comment.validate().map_err(ApiError::invalid_fields)?;

    let comment = state.store.update_comment(&comment).await?;
    Ok(ApiResponse::success(comment))
}

/// DELETE /api/comments/:id
pub async fn comment_delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<()> {
    access::comment(state.store.as_ref(), &user, id, Policy::Participation).await?;
    state.store.delete_comment(id).await?;
    Ok(ApiResponse::no_content())
}
