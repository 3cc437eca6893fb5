// handlers/protected/attachments.rs - /api/attachments
//
// Attachments are metadata records (name, URL, content type); file bytes
// live wherever `file_url` points. The uploader is always the caller.

use axum::{extract::State, Extension};
use uuid::Uuid;

use crate::database::models::{Attachment, AttachmentPatch, NewAttachment};
use crate::database::ListScope;
use crate::error::ApiError;
use crate::handlers::{ApiJson, ApiPath};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::policy::Policy;
use crate::services::access;
use crate::AppState;

use super::parent_reference;

/// GET /api/attachments
pub async fn attachments_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<Attachment>> {
    let attachments = state.store.list_attachments(ListScope::for_user(&user)).await?;
    Ok(ApiResponse::success(attachments))
}

/// POST /api/attachments
///
/// Expected Input:
/// ```json
/// { "task": "...", "file_name": "brief.pdf", "file_url": "https://...", "content_type": "application/pdf" }
/// ```
pub async fn attachments_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<NewAttachment>,
) -> ApiResult<Attachment> {
    access::task(state.store.as_ref(), &user, payload.task_id, Policy::Participation)
        .await
        .map_err(|e| parent_reference("task", e))?;

    let attachment = payload.into_attachment(user.id);
    attachment.validate().map_err(ApiError::invalid_fields)?;

    let attachment = state.store.create_attachment(attachment).await?;
    Ok(ApiResponse::created(attachment))
}

/// GET /api/attachments/:id
pub async fn attachment_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Attachment> {
    let attachment = access::attachment(state.store.as_ref(), &user, id, Policy::Participation).await?;
    Ok(ApiResponse::success(attachment))
}

/// PUT|PATCH /api/attachments/:id
pub async fn attachment_update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<AttachmentPatch>,
) -> ApiResult<Attachment> {
    let mut attachment = access::attachment(state.store.as_ref(), &user, id, Policy::Participation).await?;
    patch.apply(&mut attachment);
    attachment.validate().map_err(ApiError::invalid_fields)?;

    let attachment = state.store.update_attachment(&attachment).await?;
    Ok(ApiResponse::success(attachment))
}

/// DELETE /api/attachments/:id
pub async fn attachment_delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<()> {
    access::attachment(state.store.as_ref(), &user, id, Policy::Participation).await?;
    state.store.delete_attachment(id).await?;
    Ok(ApiResponse::no_content())
}
