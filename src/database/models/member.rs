use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::user::User;

/// Join row between a project and a `role = user` account
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProjectMember {
    pub id: Uuid,
    #[serde(rename = "project")]
    pub project_id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    pub joined_at: DateTime<Utc>,
}

impl ProjectMember {
    pub fn new(project_id: Uuid, user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            user_id,
            joined_at: Utc::now(),
        }
    }
}

/// Membership row joined with the member's account, for member listings
#[derive(Debug, Clone, Serialize)]
pub struct MemberDetail {
    pub id: Uuid,
    pub project: Uuid,
    pub user: User,
    pub joined_at: DateTime<Utc>,
}

impl MemberDetail {
    pub fn new(member: ProjectMember, user: User) -> Self {
        Self {
            id: member.id,
            project: member.project_id,
            user,
            joined_at: member.joined_at,
        }
    }
}
