//! Project-membership constraints.
//!
//! Stores call [`check_candidate`] inside the same transaction (or lock) as the
//! insert, after reading the candidate's current memberships, so the checks and
//! the write cannot interleave with a concurrent request for the same user.

use std::collections::HashSet;
use uuid::Uuid;

use crate::database::models::{Project, Role, User};

/// Default member cap; overridable through `MEMBERSHIP_MAX_PROJECTS`
pub const DEFAULT_MAX_PROJECTS_PER_USER: i64 = 2;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MembershipError {
    #[error("Only users with the 'user' role can be added to projects (got '{0}').")]
    RoleNotAllowed(Role),
    #[error("User is already a member of this project.")]
    AlreadyMember,
    #[error("User is already a member of {limit} projects, the maximum allowed.")]
    CapReached { limit: i64 },
    #[error("The project owner cannot be added as a member.")]
    CandidateIsOwner,
}

/// What the store knows about the candidate at the time of the check
#[derive(Debug, Clone, Copy)]
pub struct MembershipSnapshot {
    pub already_member: bool,
    pub membership_count: i64,
}

/// Hard preconditions for a new ProjectMember row, checked in order
pub fn check_candidate(
    candidate: &User,
    project: &Project,
    snapshot: MembershipSnapshot,
    max_projects: i64,
) -> Result<(), MembershipError> {
    if !candidate.is_user() {
        return Err(MembershipError::RoleNotAllowed(candidate.role));
    }
    if snapshot.already_member {
        return Err(MembershipError::AlreadyMember);
    }
    if snapshot.membership_count >= max_projects {
        return Err(MembershipError::CapReached { limit: max_projects });
    }
    if candidate.id == project.owner_id {
        return Err(MembershipError::CandidateIsOwner);
    }
    Ok(())
}

/// Users that could be added to `project` right now.
///
/// `members` are the project's current members and `at_cap` the users already
/// holding the maximum number of memberships. Both exclusions are set
/// lookups; callers backed by SQL express the same thing as sub-queries.
pub fn available_users<'a>(
    users: impl IntoIterator<Item = &'a User>,
    project: &Project,
    members: &HashSet<Uuid>,
    at_cap: &HashSet<Uuid>,
) -> Vec<User> {
    let mut available: Vec<User> = users
        .into_iter()
        .filter(|u| u.is_user())
        .filter(|u| u.id != project.owner_id)
        .filter(|u| !members.contains(&u.id))
        .filter(|u| !at_cap.contains(&u.id))
        .cloned()
        .collect();
    available.sort_by(|a, b| a.username.cmp(&b.username));
    available
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{NewProject, NewUser};
    use chrono::NaiveDate;

    fn account(name: &str, role: Role) -> User {
        NewUser {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: String::new(),
            role,
        }
        .into_user()
    }

    fn project_owned_by(owner: &User) -> Project {
        NewProject {
            name: "Launch".to_string(),
            description: String::new(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        }
        .into_project(owner.id)
    }

    fn fresh() -> MembershipSnapshot {
        MembershipSnapshot { already_member: false, membership_count: 0 }
    }

    #[test]
    fn non_user_roles_are_always_rejected() {
        let owner = account("owner", Role::Admin);
        let project = project_owned_by(&owner);
        for role in [Role::Admin, Role::Manager] {
            let candidate = account("staff", role);
            assert_eq!(
                check_candidate(&candidate, &project, fresh(), 2),
                Err(MembershipError::RoleNotAllowed(role))
            );
        }
    }

    #[test]
    fn rejects_duplicates_then_cap_then_owner() {
        let owner = account("owner", Role::User);
        let project = project_owned_by(&owner);
        let candidate = account("alice", Role::User);

        let duplicate = MembershipSnapshot { already_member: true, membership_count: 1 };
        assert_eq!(
            check_candidate(&candidate, &project, duplicate, 2),
            Err(MembershipError::AlreadyMember)
        );

        let capped = MembershipSnapshot { already_member: false, membership_count: 2 };
        assert_eq!(
            check_candidate(&candidate, &project, capped, 2),
            Err(MembershipError::CapReached { limit: 2 })
        );

        assert_eq!(
            check_candidate(&owner, &project, fresh(), 2),
            Err(MembershipError::CandidateIsOwner)
        );

        assert_eq!(check_candidate(&candidate, &project, fresh(), 2), Ok(()));
        let one = MembershipSnapshot { already_member: false, membership_count: 1 };
        assert_eq!(check_candidate(&candidate, &project, one, 2), Ok(()));
    }

    #[test]
    fn available_users_excludes_owner_members_capped_and_staff() {
        let owner = account("owner", Role::User);
        let member = account("member", Role::User);
        let capped = account("capped", Role::User);
        let free = account("free", Role::User);
        let manager = account("manager", Role::Manager);
        let project = project_owned_by(&owner);

        let members: HashSet<Uuid> = [member.id].into_iter().collect();
        let at_cap: HashSet<Uuid> = [capped.id].into_iter().collect();
        let everyone = vec![owner, member, capped, free.clone(), manager];

        let available = available_users(&everyone, &project, &members, &at_cap);
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, free.id);
    }
}
