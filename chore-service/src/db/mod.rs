/// Database operations for chore-service
pub mod categories;
pub mod task_feed;
pub mod tasks;
pub mod users;
