use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Attachment, Comment, MemberDetail, Milestone, NewUser, Project, ProjectMember, Task, User,
};
use crate::policy::MembershipError;
use crate::services::time_tracking::{TaskStats, TimeLogError};

/// Errors surfaced by a `Store` implementation
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Membership(#[from] MembershipError),

    #[error(transparent)]
    TimeLog(#[from] TimeLogError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(DatabaseError::Sqlx(err))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Which rows a list operation returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    /// Admins and managers see everything
    All,
    /// Plain users see what they own, are assigned to, or are a member of
    Participant(Uuid),
}

impl ListScope {
    pub fn for_user(user: &User) -> Self {
        if user.role.is_staff() {
            ListScope::All
        } else {
            ListScope::Participant(user.id)
        }
    }
}

/// Persistence collaborator. Implementations must run `add_member` and
/// `log_time` as atomic check-then-write sequences.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> StoreResult<()>;

    // Users
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User>;
    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    // Projects
    async fn create_project(&self, project: Project) -> StoreResult<Project>;
    async fn get_project(&self, id: Uuid) -> StoreResult<Option<Project>>;
    async fn list_projects(&self, scope: ListScope) -> StoreResult<Vec<Project>>;
    async fn update_project(&self, project: &Project) -> StoreResult<Project>;
    /// Cascades to milestones, tasks, comments, attachments and memberships
    async fn delete_project(&self, id: Uuid) -> StoreResult<bool>;

    // Memberships
    async fn is_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool>;
    async fn add_member(&self, project_id: Uuid, user_id: Uuid, max_projects: i64) -> StoreResult<ProjectMember>;
    async fn remove_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool>;
    async fn list_members(&self, project_id: Uuid) -> StoreResult<Vec<MemberDetail>>;
    async fn available_users(&self, project_id: Uuid, max_projects: i64) -> StoreResult<Vec<User>>;

    // Milestones
    async fn create_milestone(&self, milestone: Milestone) -> StoreResult<Milestone>;
    async fn get_milestone(&self, id: Uuid) -> StoreResult<Option<Milestone>>;
    async fn list_milestones(&self, scope: ListScope) -> StoreResult<Vec<Milestone>>;
    async fn update_milestone(&self, milestone: &Milestone) -> StoreResult<Milestone>;
    async fn delete_milestone(&self, id: Uuid) -> StoreResult<bool>;

    // Tasks
    async fn create_task(&self, task: Task) -> StoreResult<Task>;
    async fn get_task(&self, id: Uuid) -> StoreResult<Option<Task>>;
    async fn list_tasks(&self, scope: ListScope) -> StoreResult<Vec<Task>>;
    async fn list_assigned_tasks(&self, user_id: Uuid) -> StoreResult<Vec<Task>>;
    /// Writes everything except `logged_hours`
    async fn update_task(&self, task: &Task) -> StoreResult<Task>;
    async fn delete_task(&self, id: Uuid) -> StoreResult<bool>;
    /// Adds `hours` to the task and returns the new cumulative value
    async fn log_time(&self, task_id: Uuid, hours: Decimal) -> StoreResult<Decimal>;
    async fn task_stats(&self, project_id: Uuid) -> StoreResult<TaskStats>;

    // Comments
    async fn create_comment(&self, comment: Comment) -> StoreResult<Comment>;
    async fn get_comment(&self, id: Uuid) -> StoreResult<Option<Comment>>;
    async fn list_comments(&self, scope: ListScope) -> StoreResult<Vec<Comment>>;
    async fn update_comment(&self, comment: &Comment) -> StoreResult<Comment>;
    async fn delete_comment(&self, id: Uuid) -> StoreResult<bool>;

    // Attachments
    async fn create_attachment(&self, attachment: Attachment) -> StoreResult<Attachment>;
    async fn get_attachment(&self, id: Uuid) -> StoreResult<Option<Attachment>>;
    async fn list_attachments(&self, scope: ListScope) -> StoreResult<Vec<Attachment>>;
    async fn update_attachment(&self, attachment: &Attachment) -> StoreResult<Attachment>;
    async fn delete_attachment(&self, id: Uuid) -> StoreResult<bool>;
}
