//! Object-level access predicates.
//!
//! Every guarded entity exposes the user it "belongs" to through [`Resource`];
//! the project-level facts (owner, caller membership) are resolved once per
//! request into a [`ProjectScope`]. Operations pass the [`Policy`] they need
//! explicitly, so the same object can be readable by members but writable
//! only by its owner.

use uuid::Uuid;

use crate::database::models::{Attachment, Comment, Milestone, Project, Task, User};

/// An entity that can be the target of an access check
pub trait Resource {
    /// The user directly attached to the object (assignee, author, owner), if any
    fn owner_candidate(&self) -> Option<Uuid>;
}

impl Resource for Project {
    fn owner_candidate(&self) -> Option<Uuid> {
        Some(self.owner_id)
    }
}

impl Resource for Milestone {
    fn owner_candidate(&self) -> Option<Uuid> {
        None
    }
}

impl Resource for Task {
    fn owner_candidate(&self) -> Option<Uuid> {
        self.assignee_id
    }
}

impl Resource for Comment {
    fn owner_candidate(&self) -> Option<Uuid> {
        Some(self.user_id)
    }
}

impl Resource for Attachment {
    fn owner_candidate(&self) -> Option<Uuid> {
        Some(self.uploaded_by)
    }
}

/// Facts about the project an object transitively belongs to, as seen by one actor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectScope {
    pub project_id: Uuid,
    pub owner_id: Uuid,
    /// Whether the actor holds a ProjectMember row for this project
    pub actor_is_member: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Staff, or the (transitive) project owner
    Ownership,
    /// Staff, the object's owner candidate, the project owner, or a project member
    Participation,
}

impl Policy {
    pub fn allows<R: Resource + ?Sized>(self, actor: &User, resource: &R, scope: &ProjectScope) -> bool {
        if actor.role.is_staff() {
            return true;
        }

        match self {
            Policy::Ownership => scope.owner_id == actor.id,
            Policy::Participation => {
                resource.owner_candidate() == Some(actor.id)
                    || scope.owner_id == actor.id
                    || scope.actor_is_member
            }
        }
    }
}

/// Why an access check failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AccessDenied {
    /// The actor can see the object but the operation needs more
    #[error("You do not have permission to perform this action.")]
    Forbidden,
    /// The actor cannot see the object at all; reported exactly like absence
    #[error("Not found.")]
    Hidden,
}

/// Evaluate `policy`, distinguishing "visible but not allowed" from "not visible"
pub fn authorize<R: Resource + ?Sized>(
    policy: Policy,
    actor: &User,
    resource: &R,
    scope: &ProjectScope,
) -> Result<(), AccessDenied> {
    if policy.allows(actor, resource, scope) {
        Ok(())
    } else if Policy::Participation.allows(actor, resource, scope) {
        Err(AccessDenied::Forbidden)
    } else {
        Err(AccessDenied::Hidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{NewTask, NewUser, Role};

    fn user(role: Role) -> User {
        NewUser {
            username: "someone".to_string(),
            email: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: String::new(),
            role,
        }
        .into_user()
    }

    fn task(assignee: Option<Uuid>) -> Task {
        NewTask {
            title: "Write tests".to_string(),
            description: String::new(),
            status: Default::default(),
            priority: Default::default(),
            assignee_id: assignee,
            milestone_id: Uuid::new_v4(),
        }
        .into_task()
    }

    fn scope(owner_id: Uuid, actor_is_member: bool) -> ProjectScope {
        ProjectScope {
            project_id: Uuid::new_v4(),
            owner_id,
            actor_is_member,
        }
    }

    #[test]
    fn staff_pass_every_policy() {
        let stranger_project = scope(Uuid::new_v4(), false);
        for role in [Role::Admin, Role::Manager] {
            let actor = user(role);
            assert!(Policy::Ownership.allows(&actor, &task(None), &stranger_project));
            assert!(Policy::Participation.allows(&actor, &task(None), &stranger_project));
        }
    }

    #[test]
    fn ownership_requires_project_owner() {
        let actor = user(Role::User);
        assert!(Policy::Ownership.allows(&actor, &task(None), &scope(actor.id, false)));
        // membership or assignment is not ownership
        assert!(!Policy::Ownership.allows(&actor, &task(Some(actor.id)), &scope(Uuid::new_v4(), true)));
    }

    #[test]
    fn participation_falls_through_assignee_owner_member() {
        let actor = user(Role::User);
        let foreign = scope(Uuid::new_v4(), false);

        assert!(Policy::Participation.allows(&actor, &task(Some(actor.id)), &foreign));
        assert!(Policy::Participation.allows(&actor, &task(None), &scope(actor.id, false)));
        assert!(Policy::Participation.allows(&actor, &task(None), &scope(Uuid::new_v4(), true)));
        assert!(!Policy::Participation.allows(&actor, &task(Some(Uuid::new_v4())), &foreign));
    }

    #[test]
    fn authorize_hides_invisible_objects() {
        let actor = user(Role::User);
        let member_scope = scope(Uuid::new_v4(), true);
        let foreign = scope(Uuid::new_v4(), false);

        assert_eq!(
            authorize(Policy::Ownership, &actor, &task(None), &member_scope),
            Err(AccessDenied::Forbidden)
        );
        assert_eq!(
            authorize(Policy::Ownership, &actor, &task(None), &foreign),
            Err(AccessDenied::Hidden)
        );
        assert_eq!(authorize(Policy::Participation, &actor, &task(None), &member_scope), Ok(()));
    }
}
