/// User repository
use crate::error::Result;
use crate::models::{NewUser, User};
use sqlx::PgPool;

pub async fn create_user(pool: &PgPool, user: NewUser) -> Result<User> {
    let created = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, email, is_admin, is_parent, avatar, password_hash, pin_hash)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(user.is_admin)
    .bind(user.is_parent)
    .bind(&user.avatar)
    .bind(&user.password_hash)
    .bind(&user.pin_hash)
    .fetch_one(pool)
    .await?;

    Ok(created)
}

/// Find a user by username. `None` is the distinct not-found signal;
/// `Err` means the lookup itself failed.
pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn list_users(pool: &PgPool) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY username")
        .fetch_all(pool)
        .await?;

    Ok(users)
}
