/// Trick model and database operations
///
/// A trick belongs to one user and is linked to tags and categories through
/// the `tag_trick` and `category_trick` join tables. Creating and updating a
/// trick writes the row and its join rows in one transaction; detaching and
/// deleting are separate statements so callers control the order.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tricks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL UNIQUE,
///     slug VARCHAR(255) NOT NULL UNIQUE,
///     description TEXT NOT NULL,
///     code TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

const TRICK_COLUMNS: &str =
    "id, user_id, title, slug, description, code, created_at, updated_at";

/// A shared trick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Trick {
    pub id: Uuid,

    /// Owner; only this user may edit or delete the trick
    pub user_id: Uuid,

    pub title: String,

    /// URL identifier derived from the title
    pub slug: String,

    pub description: String,

    pub code: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a trick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTrick {
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub code: String,
    pub tags: Vec<Uuid>,
    pub categories: Vec<Uuid>,
}

/// Input for editing a trick
///
/// Every field replaces the stored value; `tags` and `categories` replace the
/// whole association set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTrick {
    pub title: String,
    pub description: String,
    pub code: String,
    pub tags: Vec<Uuid>,
    pub categories: Vec<Uuid>,
}

/// Generates a URL-safe slug from a title
///
/// Lowercases ASCII letters, keeps ASCII digits, turns every other run of
/// characters into a single hyphen, and trims hyphens at both ends.
///
/// ```
/// use tricks_shared::models::trick::generate_slug;
///
/// assert_eq!(generate_slug("Eager-load  *counts*"), "eager-load-counts");
/// ```
pub fn generate_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

impl Trick {
    /// Inserts a trick together with its tag and category links
    pub async fn create(pool: &PgPool, data: CreateTrick) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let trick = sqlx::query_as::<_, Trick>(&format!(
            r#"
            INSERT INTO tricks (user_id, title, slug, description, code)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {TRICK_COLUMNS}
            "#
        ))
        .bind(data.user_id)
        .bind(&data.title)
        .bind(generate_slug(&data.title))
        .bind(&data.description)
        .bind(&data.code)
        .fetch_one(&mut *tx)
        .await?;

        attach_tags(&mut tx, trick.id, &data.tags).await?;
        attach_categories(&mut tx, trick.id, &data.categories).await?;

        tx.commit().await?;
        Ok(trick)
    }

    /// Finds a trick by its slug
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Trick>(&format!(
            "SELECT {TRICK_COLUMNS} FROM tricks WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(pool)
        .await
    }

    /// Lists a user's tricks, newest first
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Trick>(&format!(
            "SELECT {TRICK_COLUMNS} FROM tricks WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Applies an edit and re-syncs the tag and category links
    ///
    /// The slug is regenerated from the new title.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error::RowNotFound` when the trick no longer exists.
    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateTrick) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let trick = sqlx::query_as::<_, Trick>(&format!(
            r#"
            UPDATE tricks
            SET title = $2, slug = $3, description = $4, code = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING {TRICK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&data.title)
        .bind(generate_slug(&data.title))
        .bind(&data.description)
        .bind(&data.code)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM tag_trick WHERE trick_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM category_trick WHERE trick_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        attach_tags(&mut tx, id, &data.tags).await?;
        attach_categories(&mut tx, id, &data.categories).await?;

        tx.commit().await?;
        Ok(trick)
    }

    /// Deletes the trick row
    ///
    /// Join rows must be detached first; the foreign keys do not cascade.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tricks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Removes every tag link of a trick, returning how many were removed
    pub async fn detach_tags(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tag_trick WHERE trick_id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Removes every category link of a trick, returning how many were removed
    pub async fn detach_categories(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM category_trick WHERE trick_id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// IDs of the tags linked to a trick
    pub async fn tag_ids(pool: &PgPool, id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar("SELECT tag_id FROM tag_trick WHERE trick_id = $1 ORDER BY tag_id")
            .bind(id)
            .fetch_all(pool)
            .await
    }

    /// IDs of the categories linked to a trick
    pub async fn category_ids(pool: &PgPool, id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT category_id FROM category_trick WHERE trick_id = $1 ORDER BY category_id",
        )
        .bind(id)
        .fetch_all(pool)
        .await
    }

    /// Whether another trick already uses `title`
    ///
    /// `except` excludes the trick being edited from the check.
    pub async fn title_exists(
        pool: &PgPool,
        title: &str,
        except: Option<Uuid>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM tricks
                WHERE LOWER(title) = LOWER($1)
                  AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(title)
        .bind(except)
        .fetch_one(pool)
        .await
    }

    /// Whether another trick already uses `slug`
    ///
    /// Distinct titles can share a slug ("Eager load" and "Eager-load").
    pub async fn slug_exists(
        pool: &PgPool,
        slug: &str,
        except: Option<Uuid>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM tricks
                WHERE slug = $1
                  AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(slug)
        .bind(except)
        .fetch_one(pool)
        .await
    }
}

async fn attach_tags(
    tx: &mut Transaction<'_, Postgres>,
    trick_id: Uuid,
    tags: &[Uuid],
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO tag_trick (trick_id, tag_id) SELECT $1, UNNEST($2::uuid[]) ON CONFLICT DO NOTHING",
    )
    .bind(trick_id)
    .bind(tags)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn attach_categories(
    tx: &mut Transaction<'_, Postgres>,
    trick_id: Uuid,
    categories: &[Uuid],
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO category_trick (trick_id, category_id) SELECT $1, UNNEST($2::uuid[]) ON CONFLICT DO NOTHING",
    )
    .bind(trick_id)
    .bind(categories)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
