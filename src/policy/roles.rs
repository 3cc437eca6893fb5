//! Role capability predicates. Pure reads of the role field.

use crate::database::models::{Role, User};

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn is_manager(&self) -> bool {
        matches!(self, Role::Manager)
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Role::User)
    }

    /// Admins and managers bypass object-level ownership checks
    pub fn is_staff(&self) -> bool {
        self.is_admin() || self.is_manager()
    }
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn is_manager(&self) -> bool {
        self.role.is_manager()
    }

    pub fn is_user(&self) -> bool {
        self.role.is_user()
    }

    pub fn can_create_users(&self) -> bool {
        self.is_admin()
    }

    pub fn can_create_managers(&self) -> bool {
        self.is_admin()
    }

    pub fn can_create_projects(&self) -> bool {
        true
    }

    pub fn can_assign_users(&self) -> bool {
        self.role.is_staff()
    }

    pub fn can_assign_tasks(&self) -> bool {
        self.role.is_staff()
    }

    pub fn can_manage_project_members(&self) -> bool {
        self.role.is_staff()
    }
}
