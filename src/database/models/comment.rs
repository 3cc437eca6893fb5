use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::FieldErrors;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: Uuid,
    #[serde(rename = "task")]
    pub task_id: Uuid,
    /// Author; always the caller that created the comment
    #[serde(rename = "user")]
    pub user_id: Uuid,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Comment {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.content.trim().is_empty() {
            errors.insert("content".to_string(), "This field may not be blank.".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewComment {
    #[serde(rename = "task")]
    pub task_id: Uuid,
    pub content: String,
}

impl NewComment {
    pub fn into_comment(self, user_id: Uuid) -> Comment {
        Comment {
            id: Uuid::new_v4(),
            task_id: self.task_id,
            user_id,
            content: self.content,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentPatch {
    pub content: Option<String>,
}

impl CommentPatch {
    pub fn apply(self, comment: &mut Comment) {
        if let Some(content) = self.content {
            comment.content = content;
        }
    }
}
