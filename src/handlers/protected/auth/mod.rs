pub mod session;
pub mod users;

pub use session::me_get;
pub use users::{user_create_post, user_tasks_get};
