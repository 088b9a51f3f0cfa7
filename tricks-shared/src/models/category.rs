/// Category model
///
/// Categories are curated groupings; tricks link to them through
/// `category_trick`.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::trick::generate_slug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl Category {
    /// Inserts a category, deriving its slug from the name
    pub async fn create(pool: &PgPool, name: &str) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, slug) VALUES ($1, $2) RETURNING id, name, slug",
        )
        .bind(name)
        .bind(generate_slug(name))
        .fetch_one(pool)
        .await
    }

    /// Every category, ordered by name
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Category>("SELECT id, name, slug FROM categories ORDER BY name")
            .fetch_all(pool)
            .await
    }
}
