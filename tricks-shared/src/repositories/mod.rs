/// Repository traits over the trick, tag and category models
///
/// Handlers depend on these traits rather than on `PgPool` directly, so the
/// API can be exercised against in-memory doubles. The Postgres
/// implementations in [`postgres`] delegate to the model functions.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tricks_shared::repositories::{postgres::PgTrickRepository, TrickRepository};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let tricks: Arc<dyn TrickRepository> = Arc::new(PgTrickRepository::new(pool));
/// if let Some(trick) = tricks.find_by_slug("eager-load-counts").await? {
///     let tag_ids = tricks.list_tag_ids_for_trick(&trick).await?;
///     println!("{} has {} tags", trick.title, tag_ids.len());
/// }
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    category::Category,
    tag::Tag,
    trick::{CreateTrick, Trick, UpdateTrick},
};

pub mod postgres;

/// Persistence operations on tricks
#[async_trait]
pub trait TrickRepository: Send + Sync {
    /// Looks a trick up by slug
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Trick>, sqlx::Error>;

    /// Tricks owned by a user, newest first
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Trick>, sqlx::Error>;

    /// Persists a new trick with its tag and category links
    async fn create(&self, data: CreateTrick) -> Result<Trick, sqlx::Error>;

    /// Applies an edit, returning the updated trick (its slug may change)
    async fn edit(&self, trick: &Trick, data: UpdateTrick) -> Result<Trick, sqlx::Error>;

    /// Deletes the trick row
    async fn delete(&self, trick: &Trick) -> Result<bool, sqlx::Error>;

    /// Removes all tag links of the trick
    async fn detach_tags(&self, trick: &Trick) -> Result<u64, sqlx::Error>;

    /// Removes all category links of the trick
    async fn detach_categories(&self, trick: &Trick) -> Result<u64, sqlx::Error>;

    async fn list_tag_ids_for_trick(&self, trick: &Trick) -> Result<Vec<Uuid>, sqlx::Error>;

    async fn list_category_ids_for_trick(&self, trick: &Trick) -> Result<Vec<Uuid>, sqlx::Error>;

    /// Whether a trick other than `except` already uses `title`
    async fn title_exists(&self, title: &str, except: Option<Uuid>) -> Result<bool, sqlx::Error>;

    /// Whether a trick other than `except` already uses `slug`
    async fn slug_exists(&self, slug: &str, except: Option<Uuid>) -> Result<bool, sqlx::Error>;
}

/// Read access to tags
#[async_trait]
pub trait TagRepository: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Tag>, sqlx::Error>;
}

/// Read access to categories
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Category>, sqlx::Error>;
}
