pub mod members;
pub mod metrics;
pub mod project;

pub use members::{available_users_get, member_delete, members_get, members_post};
pub use metrics::{progress_get, total_hours_get};
pub use project::{project_delete, project_get, project_update, projects_get, projects_post};
