/// Task repository
use crate::error::Result;
use crate::models::{NewTask, Task};
use sqlx::PgPool;

pub async fn create_task(pool: &PgPool, task: NewTask) -> Result<Task> {
    let created = sqlx::query_as::<_, Task>(
        r#"
        INSERT INTO tasks (category_id, assignee_id, name, description, points, is_repeatable)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(task.category_id)
    .bind(task.assignee_id)
    .bind(&task.name)
    .bind(&task.description)
    .bind(task.points)
    .bind(task.is_repeatable)
    .fetch_one(pool)
    .await?;

    Ok(created)
}

pub async fn list_tasks(pool: &PgPool) -> Result<Vec<Task>> {
    let tasks = sqlx::query_as::<_, Task>("SELECT * FROM tasks ORDER BY created_at")
        .fetch_all(pool)
        .await?;

    Ok(tasks)
}
