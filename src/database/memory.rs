use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashSet;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::models::{
    Attachment, Comment, MemberDetail, Milestone, NewUser, Project, ProjectMember, Task, User,
};
use crate::database::store::{ListScope, Store, StoreError, StoreResult};
use crate::policy::membership::available_users;
use crate::policy::{check_candidate, MembershipSnapshot};
use crate::services::time_tracking::{accumulate, TaskStats};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    projects: Vec<Project>,
    members: Vec<ProjectMember>,
    milestones: Vec<Milestone>,
    tasks: Vec<Task>,
    comments: Vec<Comment>,
    attachments: Vec<Attachment>,
}

impl Tables {
    fn participant_projects(&self, user_id: Uuid) -> HashSet<Uuid> {
        self.projects
            .iter()
            .filter(|p| p.owner_id == user_id)
            .map(|p| p.id)
            .chain(
                self.members
                    .iter()
                    .filter(|m| m.user_id == user_id)
                    .map(|m| m.project_id),
            )
            .collect()
    }

    fn milestones_in(&self, projects: &HashSet<Uuid>) -> HashSet<Uuid> {
        self.milestones
            .iter()
            .filter(|m| projects.contains(&m.project_id))
            .map(|m| m.id)
            .collect()
    }

    /// Tasks assigned to the user, plus every task under their projects
    fn visible_tasks(&self, user_id: Uuid) -> HashSet<Uuid> {
        let milestones = self.milestones_in(&self.participant_projects(user_id));
        self.tasks
            .iter()
            .filter(|t| t.assignee_id == Some(user_id) || milestones.contains(&t.milestone_id))
            .map(|t| t.id)
            .collect()
    }

    fn membership_count(&self, user_id: Uuid) -> i64 {
        self.members.iter().filter(|m| m.user_id == user_id).count() as i64
    }

    fn drop_tasks(&mut self, task_ids: &HashSet<Uuid>) {
        self.tasks.retain(|t| !task_ids.contains(&t.id));
        self.comments.retain(|c| !task_ids.contains(&c.task_id));
        self.attachments.retain(|a| !task_ids.contains(&a.task_id));
    }

    fn drop_milestones(&mut self, milestone_ids: &HashSet<Uuid>) {
        let task_ids: HashSet<Uuid> = self
            .tasks
            .iter()
            .filter(|t| milestone_ids.contains(&t.milestone_id))
            .map(|t| t.id)
            .collect();
        self.milestones.retain(|m| !milestone_ids.contains(&m.id));
        self.drop_tasks(&task_ids);
    }
}

/// Process-local store used for development and tests.
///
/// A single `RwLock` guards every table, so multi-step writes such as
/// `add_member` hold the write lock from the first check to the insert.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn replace<T: Clone>(rows: &mut [T], id_of: impl Fn(&T) -> Uuid, row: &T, kind: &'static str) -> StoreResult<T> {
    let id = id_of(row);
    let slot = rows
        .iter_mut()
        .find(|r| id_of(&**r) == id)
        .ok_or(StoreError::NotFound(kind))?;
    *slot = row.clone();
    Ok(row.clone())
}

fn remove<T>(rows: &mut Vec<T>, id_of: impl Fn(&T) -> Uuid, id: Uuid) -> bool {
    let before = rows.len();
    rows.retain(|r| id_of(r) != id);
    rows.len() != before
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.username == new_user.username) {
            return Err(StoreError::Conflict(
                "A user with that username already exists.".to_string(),
            ));
        }
        let user = new_user.into_user();
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn create_project(&self, project: Project) -> StoreResult<Project> {
        let mut tables = self.tables.write().await;
        if !tables.users.iter().any(|u| u.id == project.owner_id) {
            return Err(StoreError::NotFound("User"));
        }
        tables.projects.push(project.clone());
        Ok(project)
    }

    async fn get_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        let tables = self.tables.read().await;
        Ok(tables.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn list_projects(&self, scope: ListScope) -> StoreResult<Vec<Project>> {
        let tables = self.tables.read().await;
        let rows = match scope {
            ListScope::All => tables.projects.clone(),
            ListScope::Participant(user_id) => {
                let visible = tables.participant_projects(user_id);
                tables
                    .projects
                    .iter()
                    .filter(|p| visible.contains(&p.id))
                    .cloned()
                    .collect()
            }
        };
        Ok(rows)
    }

    async fn update_project(&self, project: &Project) -> StoreResult<Project> {
        let mut tables = self.tables.write().await;
        replace(&mut tables.projects, |p| p.id, project, "Project")
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        if !remove(&mut tables.projects, |p| p.id, id) {
            return Ok(false);
        }
        tables.members.retain(|m| m.project_id != id);
        let project_ids: HashSet<Uuid> = [id].into_iter().collect();
        let milestone_ids = tables.milestones_in(&project_ids);
        tables.drop_milestones(&milestone_ids);
        Ok(true)
    }

    async fn is_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .members
            .iter()
            .any(|m| m.project_id == project_id && m.user_id == user_id))
    }

    async fn add_member(&self, project_id: Uuid, user_id: Uuid, max_projects: i64) -> StoreResult<ProjectMember> {
        let mut tables = self.tables.write().await;

        let candidate = tables
            .users
            .iter()
            .find(|u| u.id == user_id)
            .ok_or(StoreError::NotFound("User"))?;
        let project = tables
            .projects
            .iter()
            .find(|p| p.id == project_id)
            .ok_or(StoreError::NotFound("Project"))?;

        let snapshot = MembershipSnapshot {
            already_member: tables
                .members
                .iter()
                .any(|m| m.project_id == project_id && m.user_id == user_id),
            membership_count: tables.membership_count(user_id),
        };
        check_candidate(candidate, project, snapshot, max_projects)?;

        let member = ProjectMember::new(project_id, user_id);
        tables.members.push(member.clone());
        Ok(member)
    }

    async fn remove_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.members.len();
        tables
            .members
            .retain(|m| !(m.project_id == project_id && m.user_id == user_id));
        Ok(tables.members.len() != before)
    }

    async fn list_members(&self, project_id: Uuid) -> StoreResult<Vec<MemberDetail>> {
        let tables = self.tables.read().await;
        Ok(tables
            .members
            .iter()
            .filter(|m| m.project_id == project_id)
            .filter_map(|m| {
                let user = tables.users.iter().find(|u| u.id == m.user_id)?;
                Some(MemberDetail::new(m.clone(), user.clone()))
            })
            .collect())
    }

    async fn available_users(&self, project_id: Uuid, max_projects: i64) -> StoreResult<Vec<User>> {
        let tables = self.tables.read().await;
        let project = tables
            .projects
            .iter()
            .find(|p| p.id == project_id)
            .ok_or(StoreError::NotFound("Project"))?;

        let members: HashSet<Uuid> = tables
            .members
            .iter()
            .filter(|m| m.project_id == project_id)
            .map(|m| m.user_id)
            .collect();
        let at_cap: HashSet<Uuid> = tables
            .users
            .iter()
            .filter(|u| tables.membership_count(u.id) >= max_projects)
            .map(|u| u.id)
            .collect();

        Ok(available_users(&tables.users, project, &members, &at_cap))
    }

    async fn create_milestone(&self, milestone: Milestone) -> StoreResult<Milestone> {
        let mut tables = self.tables.write().await;
        if !tables.projects.iter().any(|p| p.id == milestone.project_id) {
            return Err(StoreError::NotFound("Project"));
        }
        tables.milestones.push(milestone.clone());
        Ok(milestone)
    }

    async fn get_milestone(&self, id: Uuid) -> StoreResult<Option<Milestone>> {
        let tables = self.tables.read().await;
        Ok(tables.milestones.iter().find(|m| m.id == id).cloned())
    }

    async fn list_milestones(&self, scope: ListScope) -> StoreResult<Vec<Milestone>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Milestone> = match scope {
            ListScope::All => tables.milestones.clone(),
            ListScope::Participant(user_id) => {
                let projects = tables.participant_projects(user_id);
                tables
                    .milestones
                    .iter()
                    .filter(|m| projects.contains(&m.project_id))
                    .cloned()
                    .collect()
            }
        };
        rows.sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.title.cmp(&b.title)));
        Ok(rows)
    }

    async fn update_milestone(&self, milestone: &Milestone) -> StoreResult<Milestone> {
        let mut tables = self.tables.write().await;
        replace(&mut tables.milestones, |m| m.id, milestone, "Milestone")
    }

    async fn delete_milestone(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        if !tables.milestones.iter().any(|m| m.id == id) {
            return Ok(false);
        }
        let ids: HashSet<Uuid> = [id].into_iter().collect();
        tables.drop_milestones(&ids);
        Ok(true)
    }

    async fn create_task(&self, task: Task) -> StoreResult<Task> {
        let mut tables = self.tables.write().await;
        if !tables.milestones.iter().any(|m| m.id == task.milestone_id) {
            return Err(StoreError::NotFound("Milestone"));
        }
        tables.tasks.push(task.clone());
        Ok(task)
    }

    async fn get_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let tables = self.tables.read().await;
        Ok(tables.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn list_tasks(&self, scope: ListScope) -> StoreResult<Vec<Task>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Task> = match scope {
            ListScope::All => tables.tasks.clone(),
            ListScope::Participant(user_id) => {
                let visible = tables.visible_tasks(user_id);
                tables
                    .tasks
                    .iter()
                    .filter(|t| visible.contains(&t.id))
                    .cloned()
                    .collect()
            }
        };
        rows.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(rows)
    }

    async fn list_assigned_tasks(&self, user_id: Uuid) -> StoreResult<Vec<Task>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Task> = tables
            .tasks
            .iter()
            .filter(|t| t.assignee_id == Some(user_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(rows)
    }

    async fn update_task(&self, task: &Task) -> StoreResult<Task> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .tasks
            .iter_mut()
            .find(|t| t.id == task.id)
            .ok_or(StoreError::NotFound("Task"))?;
        let logged_hours = slot.logged_hours;
        *slot = Task { logged_hours, ..task.clone() };
        Ok(slot.clone())
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        if !tables.tasks.iter().any(|t| t.id == id) {
            return Ok(false);
        }
        let ids: HashSet<Uuid> = [id].into_iter().collect();
        tables.drop_tasks(&ids);
        Ok(true)
    }

    async fn log_time(&self, task_id: Uuid, hours: Decimal) -> StoreResult<Decimal> {
        let mut tables = self.tables.write().await;
        let task = tables
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or(StoreError::NotFound("Task"))?;
        task.logged_hours = accumulate(task.logged_hours, hours)?;
        Ok(task.logged_hours)
    }

    async fn task_stats(&self, project_id: Uuid) -> StoreResult<TaskStats> {
        let tables = self.tables.read().await;
        let projects: HashSet<Uuid> = [project_id].into_iter().collect();
        let milestones = tables.milestones_in(&projects);
        Ok(TaskStats::from_tasks(
            tables.tasks.iter().filter(|t| milestones.contains(&t.milestone_id)),
        ))
    }

    async fn create_comment(&self, comment: Comment) -> StoreResult<Comment> {
        let mut tables = self.tables.write().await;
        if !tables.tasks.iter().any(|t| t.id == comment.task_id) {
            return Err(StoreError::NotFound("Task"));
        }
        tables.comments.push(comment.clone());
        Ok(comment)
    }

    async fn get_comment(&self, id: Uuid) -> StoreResult<Option<Comment>> {
        let tables = self.tables.read().await;
        Ok(tables.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn list_comments(&self, scope: ListScope) -> StoreResult<Vec<Comment>> {
        let tables = self.tables.read().await;
        let rows = match scope {
            ListScope::All => tables.comments.clone(),
            ListScope::Participant(user_id) => {
                let visible = tables.visible_tasks(user_id);
                tables
                    .comments
                    .iter()
                    .filter(|c| visible.contains(&c.task_id))
                    .cloned()
                    .collect()
            }
        };
        Ok(rows)
    }

    async fn update_comment(&self, comment: &Comment) -> StoreResult<Comment> {
        let mut tables = self.tables.write().await;
        replace(&mut tables.comments, |c| c.id, comment, "Comment")
    }

    async fn delete_comment(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(remove(&mut tables.comments, |c| c.id, id))
    }

    async fn create_attachment(&self, attachment: Attachment) -> StoreResult<Attachment> {
        let mut tables = self.tables.write().await;
        if !tables.tasks.iter().any(|t| t.id == attachment.task_id) {
            return Err(StoreError::NotFound("Task"));
        }
        tables.attachments.push(attachment.clone());
        Ok(attachment)
    }

    async fn get_attachment(&self, id: Uuid) -> StoreResult<Option<Attachment>> {
        let tables = self.tables.read().await;
        Ok(tables.attachments.iter().find(|a| a.id == id).cloned())
    }

    async fn list_attachments(&self, scope: ListScope) -> StoreResult<Vec<Attachment>> {
        let tables = self.tables.read().await;
        let rows = match scope {
            ListScope::All => tables.attachments.clone(),
            ListScope::Participant(user_id) => {
                let visible = tables.visible_tasks(user_id);
                tables
                    .attachments
                    .iter()
                    .filter(|a| visible.contains(&a.task_id))
                    .cloned()
                    .collect()
            }
        };
        Ok(rows)
    }

    async fn update_attachment(&self, attachment: &Attachment) -> StoreResult<Attachment> {
        let mut tables = self.tables.write().await;
        replace(&mut tables.attachments, |a| a.id, attachment, "Attachment")
    }

    async fn delete_attachment(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(remove(&mut tables.attachments, |a| a.id, id))
    }
}
