/// Category repository
use crate::error::Result;
use crate::models::{Category, NewCategory};
use sqlx::PgPool;

pub async fn create_category(pool: &PgPool, category: NewCategory) -> Result<Category> {
    let created = sqlx::query_as::<_, Category>(
        r#"
        INSERT INTO categories (name, description, color)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(&category.name)
    .bind(&category.description)
    .bind(&category.color)
    .fetch_one(pool)
    .await?;

    Ok(created)
}

pub async fn list_categories(pool: &PgPool) -> Result<Vec<Category>> {
    let categories = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name")
        .fetch_all(pool)
        .await?;

    Ok(categories)
}
