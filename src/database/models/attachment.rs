use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{check_title, FieldErrors};

/// File metadata attached to a task. The bytes live wherever `file_url` points.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Attachment {
    pub id: Uuid,
    #[serde(rename = "task")]
    pub task_id: Uuid,
    pub uploaded_by: Uuid,
    pub file_name: String,
    pub file_url: String,
    pub content_type: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl Attachment {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_title(&mut errors, "file_name", &self.file_name);
        if self.file_url.trim().is_empty() {
            errors.insert("file_url".to_string(), "This field may not be blank.".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAttachment {
    #[serde(rename = "task")]
    pub task_id: Uuid,
    pub file_name: String,
    pub file_url: String,
    #[serde(default)]
    pub content_type: Option<String>,
}

impl NewAttachment {
    pub fn into_attachment(self, uploaded_by: Uuid) -> Attachment {
        Attachment {
            id: Uuid::new_v4(),
            task_id: self.task_id,
            uploaded_by,
            file_name: self.file_name,
            file_url: self.file_url,
            content_type: self.content_type,
            uploaded_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttachmentPatch {
    pub file_name: Option<String>,
    pub file_url: Option<String>,
    pub content_type: Option<String>,
}

impl AttachmentPatch {
    pub fn apply(self, attachment: &mut Attachment) {
        if let Some(file_name) = self.file_name {
            attachment.file_name = file_name;
        }
        if let Some(file_url) = self.file_url {
            attachment.file_url = file_url;
        }
        if let Some(content_type) = self.content_type {
            attachment.content_type = Some(content_type);
        }
    }
}
