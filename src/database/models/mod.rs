pub mod attachment;
pub mod comment;
pub mod member;
pub mod milestone;
pub mod project;
pub mod task;
pub mod user;

pub use attachment::{Attachment, AttachmentPatch, NewAttachment};
pub use comment::{Comment, CommentPatch, NewComment};
pub use member::{MemberDetail, ProjectMember};
pub use milestone::{Milestone, MilestonePatch, NewMilestone};
pub use project::{NewProject, Project, ProjectPatch};
pub use task::{NewTask, Task, TaskPatch, TaskPriority, TaskStatus};
pub use user::{NewUser, Role, User};

use sqlx::{postgres::PgRow, Row};
use std::str::FromStr;

/// A text column held a value outside of its enum
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self { kind, value: value.into() }
    }
}

/// Decode a TEXT column into one of the closed enums (role, status, priority)
pub(crate) fn decode_enum<T>(row: &PgRow, column: &str) -> Result<T, sqlx::Error>
where
    T: FromStr<Err = ParseEnumError>,
{
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(|e: ParseEnumError| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

/// Field name -> message, rendered as `field_errors` in validation responses
pub type FieldErrors = std::collections::HashMap<String, String>;

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`) in patches
pub(crate) fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

pub(crate) fn check_title(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.insert(field.to_string(), "This field may not be blank.".to_string());
    } else if value.chars().count() > 255 {
        errors.insert(
            field.to_string(),
            "Ensure this field has no more than 255 characters.".to_string(),
        );
    }
}
