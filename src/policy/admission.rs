//! Who may create an account with which role.

use crate::database::models::{Role, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AdmissionError {
    /// Anonymous callers may only bootstrap admin accounts
    #[error("Public registration is only available for the 'admin' role; '{0}' accounts must be created by an admin.")]
    PublicRoleNotAllowed(Role),
    /// Authenticated, but not allowed to create accounts of this role
    #[error("Only admins can create '{0}' accounts.")]
    NotPermitted(Role),
}

/// Decide whether `caller` (None = unauthenticated) may create an account with `requested` role
pub fn admit(caller: Option<&User>, requested: Role) -> Result<(), AdmissionError> {
    match caller {
        None if requested == Role::Admin => Ok(()),
        None => Err(AdmissionError::PublicRoleNotAllowed(requested)),
        Some(caller) => {
            let allowed = match requested {
                Role::Admin | Role::Manager => caller.can_create_managers(),
                Role::User => caller.can_create_users(),
            };
            if allowed {
                Ok(())
            } else {
                Err(AdmissionError::NotPermitted(requested))
            }
        }
    }
}
