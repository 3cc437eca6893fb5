//! Guarded loads: fetch an object, resolve the project it belongs to, and run
//! the requested policy for the acting user.

use thiserror::Error;
use uuid::Uuid;

use crate::database::models::{Attachment, Comment, Milestone, Project, Task, User};
use crate::database::{Store, StoreError};
use crate::policy::{authorize, AccessDenied, Policy, ProjectScope, Resource};

#[derive(Debug, Error)]
pub enum GuardError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Denied(#[from] AccessDenied),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl GuardError {
    /// True when the caller must be told the object does not exist
    pub fn is_not_visible(&self) -> bool {
        matches!(self, GuardError::NotFound(_) | GuardError::Denied(AccessDenied::Hidden))
    }
}

pub type GuardResult<T> = Result<T, GuardError>;

/// Project-level facts for `actor`
pub async fn project_scope(store: &dyn Store, actor: &User, project: &Project) -> GuardResult<ProjectScope> {
    let actor_is_member = if actor.role.is_staff() || project.owner_id == actor.id {
        false
    } else {
        store.is_member(project.id, actor.id).await?
    };
    Ok(ProjectScope {
        project_id: project.id,
        owner_id: project.owner_id,
        actor_is_member,
    })
}

async fn require_project(store: &dyn Store, id: Uuid) -> GuardResult<Project> {
    store.get_project(id).await?.ok_or(GuardError::NotFound("Project"))
}

async fn require_milestone(store: &dyn Store, id: Uuid) -> GuardResult<Milestone> {
    store.get_milestone(id).await?.ok_or(GuardError::NotFound("Milestone"))
}

async fn require_task(store: &dyn Store, id: Uuid) -> GuardResult<Task> {
    store.get_task(id).await?.ok_or(GuardError::NotFound("Task"))
}

async fn check<R: Resource>(
    store: &dyn Store,
    actor: &User,
    resource: &R,
    project_id: Uuid,
    policy: Policy,
) -> GuardResult<()> {
    let project = require_project(store, project_id).await?;
    let scope = project_scope(store, actor, &project).await?;
    authorize(policy, actor, resource, &scope)?;
    Ok(())
}

pub async fn project(store: &dyn Store, actor: &User, id: Uuid, policy: Policy) -> GuardResult<Project> {
    let project = require_project(store, id).await?;
    let scope = project_scope(store, actor, &project).await?;
    authorize(policy, actor, &project, &scope)?;
    Ok(project)
}

pub async fn milestone(store: &dyn Store, actor: &User, id: Uuid, policy: Policy) -> GuardResult<Milestone> {
    let milestone = require_milestone(store, id).await?;
    check(store, actor, &milestone, milestone.project_id, policy).await?;
    Ok(milestone)
}

/// Project id a task belongs to, through its milestone
pub async fn task_project_id(store: &dyn Store, task: &Task) -> GuardResult<Uuid> {
    Ok(require_milestone(store, task.milestone_id).await?.project_id)
}

pub async fn task(store: &dyn Store, actor: &User, id: Uuid, policy: Policy) -> GuardResult<Task> {
    let task = require_task(store, id).await?;
    let project_id = task_project_id(store, &task).await?;
    check(store, actor, &task, project_id, policy).await?;
    Ok(task)
}

pub async fn comment(store: &dyn Store, actor: &User, id: Uuid, policy: Policy) -> GuardResult<Comment> {
    let comment = store
        .get_comment(id)
        .await?
        .ok_or(GuardError::NotFound("Comment"))?;
    let task = require_task(store, comment.task_id).await?;
    let project_id = task_project_id(store, &task).await?;
    check(store, actor, &comment, project_id, policy).await?;
    Ok(comment)
}

pub async fn attachment(store: &dyn Store, actor: &User, id: Uuid, policy: Policy) -> GuardResult<Attachment> {
    let attachment = store
        .get_attachment(id)
        .await?
        .ok_or(GuardError::NotFound("Attachment"))?;
    let task = require_task(store, attachment.task_id).await?;
    let project_id = task_project_id(store, &task).await?;
    check(store, actor, &attachment, project_id, policy).await?;
    Ok(attachment)
}
