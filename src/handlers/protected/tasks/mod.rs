pub mod log_time;
pub mod task;

pub use log_time::log_time_post;
pub use task::{task_delete, task_get, task_update, tasks_get, tasks_post};
