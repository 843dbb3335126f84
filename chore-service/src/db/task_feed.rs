/// Task feed repository
use crate::error::Result;
use crate::models::{NewTaskFeedEntry, TaskFeedEntry};
use sqlx::PgPool;

pub async fn add_entry(pool: &PgPool, entry: NewTaskFeedEntry) -> Result<TaskFeedEntry> {
    let created = sqlx::query_as::<_, TaskFeedEntry>(
        r#"
        INSERT INTO tasks_feed (task_id, assignee_id, is_complete, is_approved, points)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(entry.task_id)
    .bind(entry.assignee_id)
    .bind(entry.is_complete)
    .bind(entry.is_approved)
    .bind(entry.points)
    .fetch_one(pool)
    .await?;

    Ok(created)
}

pub async fn list_entries(pool: &PgPool) -> Result<Vec<TaskFeedEntry>> {
    let entries =
        sqlx::query_as::<_, TaskFeedEntry>("SELECT * FROM tasks_feed ORDER BY created_at")
            .fetch_all(pool)
            .await?;

    Ok(entries)
}
