//! Data models for chore-service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Family member account.
///
/// The two digest fields are PHC strings produced by Argon2id; plaintext
/// secrets never touch this struct and the digests never leave the
/// process.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub is_parent: bool,
    pub avatar: String,
    pub points: i32,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub pin_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a user insert; secrets arrive already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub is_parent: bool,
    pub avatar: String,
    pub password_hash: String,
    pub pin_hash: String,
}

/// Grouping for tasks (e.g. "Kitchen", "Garden").
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: String,
    pub color: String,
}

/// A chore definition with its point value.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub category_id: Uuid,
    pub assignee_id: Uuid,
    pub name: String,
    pub description: String,
    pub points: i32,
    pub is_repeatable: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub category_id: Uuid,
    pub assignee_id: Uuid,
    pub name: String,
    pub description: String,
    pub points: i32,
    pub is_repeatable: bool,
}

/// One instance of a task being picked up, completed, or approved.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TaskFeedEntry {
    pub id: Uuid,
    pub task_id: Uuid,
    pub assignee_id: Uuid,
    pub is_complete: bool,
    pub is_approved: bool,
    pub points: i32,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTaskFeedEntry {
    pub task_id: Uuid,
    pub assignee_id: Uuid,
    pub is_complete: bool,
    pub is_approved: bool,
    pub points: i32,
}
