use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use crate::database::models::{
    Attachment, Comment, MemberDetail, Milestone, NewUser, Project, ProjectMember, Task, User,
};
use crate::database::store::{ListScope, Store, StoreError, StoreResult};
use crate::policy::{check_candidate, MembershipError, MembershipSnapshot};
use crate::services::time_tracking::{accumulate, TaskStats};

const USER_COLUMNS: &str =
    "id, username, email, first_name, last_name, password_hash, role, date_joined";
const PROJECT_COLUMNS: &str = "id, name, description, start_date, end_date, owner_id, created_at";
const MILESTONE_COLUMNS: &str = "id, title, description, due_date, project_id";
const TASK_COLUMNS: &str =
    "id, title, description, status, priority, assignee_id, milestone_id, logged_hours";
const COMMENT_COLUMNS: &str = "id, task_id, user_id, content, timestamp";
const ATTACHMENT_COLUMNS: &str =
    "id, task_id, uploaded_by, file_name, file_url, content_type, uploaded_at";

/// Projects the user ($1) owns or is a member of
const PARTICIPANT_PROJECTS: &str = "SELECT id FROM projects WHERE owner_id = $1 \
     UNION SELECT project_id FROM project_members WHERE user_id = $1";

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23505"),
        _ => false,
    }
}

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn visible_tasks_sql() -> String {
        format!(
            "SELECT id FROM tasks WHERE assignee_id = $1 OR milestone_id IN \
             (SELECT id FROM milestones WHERE project_id IN ({PARTICIPANT_PROJECTS}))"
        )
    }

    async fn delete_by_id(&self, table: &'static str, id: Uuid) -> StoreResult<bool> {
        let sql = format!("DELETE FROM {table} WHERE id = $1");
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let user = new_user.into_user();
        let sql = format!(
            "INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(user.date_joined)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Conflict("A user with that username already exists.".to_string())
                } else {
                    e.into()
                }
            })
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_project(&self, project: Project) -> StoreResult<Project> {
        let sql = format!(
            "INSERT INTO projects ({PROJECT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {PROJECT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(project.id)
            .bind(&project.name)
            .bind(&project.description)
            .bind(project.start_date)
            .bind(project.end_date)
            .bind(project.owner_id)
            .bind(project.created_at)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn get_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1");
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_projects(&self, scope: ListScope) -> StoreResult<Vec<Project>> {
        let rows = match scope {
            ListScope::All => {
                let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects ORDER BY created_at");
                sqlx::query_as::<_, Project>(&sql).fetch_all(&self.pool).await?
            }
            ListScope::Participant(user_id) => {
                let sql = format!(
                    "SELECT {PROJECT_COLUMNS} FROM projects WHERE id IN ({PARTICIPANT_PROJECTS}) \
                     ORDER BY created_at"
                );
                sqlx::query_as::<_, Project>(&sql)
                    .bind(user_id)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows)
    }

    async fn update_project(&self, project: &Project) -> StoreResult<Project> {
        let sql = format!(
            "UPDATE projects SET name = $2, description = $3, start_date = $4, end_date = $5 \
             WHERE id = $1 RETURNING {PROJECT_COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&sql)
            .bind(project.id)
            .bind(&project.name)
            .bind(&project.description)
            .bind(project.start_date)
            .bind(project.end_date)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound("Project"))
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<bool> {
        // ON DELETE CASCADE takes care of the hierarchy
        self.delete_by_id("projects", id).await
    }

    async fn is_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM project_members WHERE project_id = $1 AND user_id = $2)",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn add_member(&self, project_id: Uuid, user_id: Uuid, max_projects: i64) -> StoreResult<ProjectMember> {
        let mut tx = self.pool.begin().await?;

        // Lock the candidate's row so concurrent additions of the same user serialize
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 FOR UPDATE");
        let candidate = sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NotFound("User"))?;

        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1");
        let project = sqlx::query_as::<_, Project>(&sql)
            .bind(project_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NotFound("Project"))?;

        let already_member: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM project_members WHERE project_id = $1 AND user_id = $2)",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let membership_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM project_members WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await?;

        check_candidate(
            &candidate,
            &project,
            MembershipSnapshot { already_member, membership_count },
            max_projects,
        )?;

        let member = ProjectMember::new(project_id, user_id);
        sqlx::query(
            "INSERT INTO project_members (id, project_id, user_id, joined_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(member.id)
        .bind(member.project_id)
        .bind(member.user_id)
        .bind(member.joined_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Membership(MembershipError::AlreadyMember)
            } else {
                e.into()
            }
        })?;

        tx.commit().await?;
        debug!("Added user {} to project {}", user_id, project_id);
        Ok(member)
    }

    async fn remove_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM project_members WHERE project_id = $1 AND user_id = $2")
            .bind(project_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_members(&self, project_id: Uuid) -> StoreResult<Vec<MemberDetail>> {
        let rows = sqlx::query(
            "SELECT pm.id AS member_id, pm.project_id, pm.joined_at, \
                    u.id, u.username, u.email, u.first_name, u.last_name, u.password_hash, \
                    u.role, u.date_joined \
             FROM project_members pm JOIN users u ON u.id = pm.user_id \
             WHERE pm.project_id = $1 ORDER BY pm.joined_at",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let user = User::from_row(row)?;
                let member = ProjectMember {
                    id: row.try_get("member_id")?,
                    project_id: row.try_get("project_id")?,
                    user_id: user.id,
                    joined_at: row.try_get("joined_at")?,
                };
                Ok(MemberDetail::new(member, user))
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(StoreError::from)
    }

    async fn available_users(&self, project_id: Uuid, max_projects: i64) -> StoreResult<Vec<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE role = 'user' \
               AND id <> (SELECT owner_id FROM projects WHERE id = $1) \
               AND id NOT IN (SELECT user_id FROM project_members WHERE project_id = $1) \
               AND id NOT IN (SELECT user_id FROM project_members GROUP BY user_id HAVING COUNT(*) >= $2) \
             ORDER BY username"
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(project_id)
            .bind(max_projects)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn create_milestone(&self, milestone: Milestone) -> StoreResult<Milestone> {
        let sql = format!(
            "INSERT INTO milestones ({MILESTONE_COLUMNS}) VALUES ($1, $2, $3, $4, $5) \
             RETURNING {MILESTONE_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Milestone>(&sql)
            .bind(milestone.id)
            .bind(&milestone.title)
            .bind(&milestone.description)
            .bind(milestone.due_date)
            .bind(milestone.project_id)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn get_milestone(&self, id: Uuid) -> StoreResult<Option<Milestone>> {
        let sql = format!("SELECT {MILESTONE_COLUMNS} FROM milestones WHERE id = $1");
        Ok(sqlx::query_as::<_, Milestone>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_milestones(&self, scope: ListScope) -> StoreResult<Vec<Milestone>> {
        let rows = match scope {
            ListScope::All => {
                let sql = format!("SELECT {MILESTONE_COLUMNS} FROM milestones ORDER BY due_date, title");
                sqlx::query_as::<_, Milestone>(&sql).fetch_all(&self.pool).await?
            }
            ListScope::Participant(user_id) => {
                let sql = format!(
                    "SELECT {MILESTONE_COLUMNS} FROM milestones \
                     WHERE project_id IN ({PARTICIPANT_PROJECTS}) ORDER BY due_date, title"
                );
                sqlx::query_as::<_, Milestone>(&sql)
                    .bind(user_id)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows)
    }

    async fn update_milestone(&self, milestone: &Milestone) -> StoreResult<Milestone> {
        let sql = format!(
            "UPDATE milestones SET title = $2, description = $3, due_date = $4 \
             WHERE id = $1 RETURNING {MILESTONE_COLUMNS}"
        );
        sqlx::query_as::<_, Milestone>(&sql)
            .bind(milestone.id)
            .bind(&milestone.title)
            .bind(&milestone.description)
            .bind(milestone.due_date)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound("Milestone"))
    }

    async fn delete_milestone(&self, id: Uuid) -> StoreResult<bool> {
        self.delete_by_id("milestones", id).await
    }

    async fn create_task(&self, task: Task) -> StoreResult<Task> {
        let sql = format!(
            "INSERT INTO tasks ({TASK_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {TASK_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Task>(&sql)
            .bind(task.id)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.status.as_str())
            .bind(task.priority.as_str())
            .bind(task.assignee_id)
            .bind(task.milestone_id)
            .bind(task.logged_hours)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn get_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");
        Ok(sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_tasks(&self, scope: ListScope) -> StoreResult<Vec<Task>> {
        let rows = match scope {
            ListScope::All => {
                let sql = format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY title");
                sqlx::query_as::<_, Task>(&sql).fetch_all(&self.pool).await?
            }
            ListScope::Participant(user_id) => {
                let sql = format!(
                    "SELECT {TASK_COLUMNS} FROM tasks WHERE id IN ({}) ORDER BY title",
                    Self::visible_tasks_sql()
                );
                sqlx::query_as::<_, Task>(&sql)
                    .bind(user_id)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows)
    }

    async fn list_assigned_tasks(&self, user_id: Uuid) -> StoreResult<Vec<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE assignee_id = $1 ORDER BY title");
        Ok(sqlx::query_as::<_, Task>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update_task(&self, task: &Task) -> StoreResult<Task> {
        let sql = format!(
            "UPDATE tasks SET title = $2, description = $3, status = $4, priority = $5, assignee_id = $6 \
             WHERE id = $1 RETURNING {TASK_COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&sql)
            .bind(task.id)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.status.as_str())
            .bind(task.priority.as_str())
            .bind(task.assignee_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound("Task"))
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        self.delete_by_id("tasks", id).await
    }

    async fn log_time(&self, task_id: Uuid, hours: Decimal) -> StoreResult<Decimal> {
        let mut tx = self.pool.begin().await?;

        let current: Decimal =
            sqlx::query_scalar("SELECT logged_hours FROM tasks WHERE id = $1 FOR UPDATE")
                .bind(task_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(StoreError::NotFound("Task"))?;

        let total = accumulate(current, hours)?;

        sqlx::query("UPDATE tasks SET logged_hours = $2 WHERE id = $1")
            .bind(task_id)
            .bind(total)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(total)
    }

    async fn task_stats(&self, project_id: Uuid) -> StoreResult<TaskStats> {
        let (total, done, logged_hours): (i64, i64, Decimal) = sqlx::query_as(
            "SELECT COUNT(t.id), \
                    COUNT(t.id) FILTER (WHERE t.status = 'done'), \
                    COALESCE(SUM(t.logged_hours), 0) \
             FROM tasks t JOIN milestones m ON m.id = t.milestone_id \
             WHERE m.project_id = $1",
        )
        .bind(project_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(TaskStats { total, done, logged_hours })
    }

    async fn create_comment(&self, comment: Comment) -> StoreResult<Comment> {
        let sql = format!(
            "INSERT INTO comments ({COMMENT_COLUMNS}) VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COMMENT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Comment>(&sql)
            .bind(comment.id)
            .bind(comment.task_id)
            .bind(comment.user_id)
            .bind(&comment.content)
            .bind(comment.timestamp)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn get_comment(&self, id: Uuid) -> StoreResult<Option<Comment>> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1");
        Ok(sqlx::query_as::<_, Comment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_comments(&self, scope: ListScope) -> StoreResult<Vec<Comment>> {
        let rows = match scope {
            ListScope::All => {
                let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments ORDER BY timestamp");
                sqlx::query_as::<_, Comment>(&sql).fetch_all(&self.pool).await?
            }
            ListScope::Participant(user_id) => {
                let sql = format!(
                    "SELECT {COMMENT_COLUMNS} FROM comments WHERE task_id IN ({}) ORDER BY timestamp",
                    Self::visible_tasks_sql()
                );
                sqlx::query_as::<_, Comment>(&sql)
                    .bind(user_id)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows)
    }

    async fn update_comment(&self, comment: &Comment) -> StoreResult<Comment> {
        let sql = format!(
            "UPDATE comments SET content = $2 WHERE id = $1 RETURNING {COMMENT_COLUMNS}"
        );
        sqlx::query_as::<_, Comment>(&sql)
            .bind(comment.id)
            .bind(&comment.content)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound("Comment"))
    }

    async fn delete_comment(&self, id: Uuid) -> StoreResult<bool> {
        self.delete_by_id("comments", id).await
    }

    async fn create_attachment(&self, attachment: Attachment) -> StoreResult<Attachment> {
        let sql = format!(
            "INSERT INTO attachments ({ATTACHMENT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {ATTACHMENT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Attachment>(&sql)
            .bind(attachment.id)
            .bind(attachment.task_id)
            .bind(attachment.uploaded_by)
            .bind(&attachment.file_name)
            .bind(&attachment.file_url)
            .bind(&attachment.content_type)
            .bind(attachment.uploaded_at)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn get_attachment(&self, id: Uuid) -> StoreResult<Option<Attachment>> {
        let sql = format!("SELECT {ATTACHMENT_COLUMNS} FROM attachments WHERE id = $1");
        Ok(sqlx::query_as::<_, Attachment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_attachments(&self, scope: ListScope) -> StoreResult<Vec<Attachment>> {
        let rows = match scope {
            ListScope::All => {
                let sql = format!("SELECT {ATTACHMENT_COLUMNS} FROM attachments ORDER BY uploaded_at");
                sqlx::query_as::<_, Attachment>(&sql).fetch_all(&self.pool).await?
            }
            ListScope::Participant(user_id) => {
                let sql = format!(
                    "SELECT {ATTACHMENT_COLUMNS} FROM attachments WHERE task_id IN ({}) \
                     ORDER BY uploaded_at",
                    Self::visible_tasks_sql()
                );
                sqlx::query_as::<_, Attachment>(&sql)
                    .bind(user_id)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows)
    }

    async fn update_attachment(&self, attachment: &Attachment) -> StoreResult<Attachment> {
        let sql = format!(
            "UPDATE attachments SET file_name = $2, file_url = $3, content_type = $4 \
             WHERE id = $1 RETURNING {ATTACHMENT_COLUMNS}"
        );
        sqlx::query_as::<_, Attachment>(&sql)
            .bind(attachment.id)
            .bind(&attachment.file_name)
            .bind(&attachment.file_url)
            .bind(&attachment.content_type)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound("Attachment"))
    }

    async fn delete_attachment(&self, id: Uuid) -> StoreResult<bool> {
        self.delete_by_id("attachments", id).await
    }
}
