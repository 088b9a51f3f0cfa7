/// Database models for Tricks
///
/// Each model owns its SQL: the functions take a `&PgPool` and return
/// `sqlx::Error` so callers can map failures uniformly.
///
/// # Models
///
/// - `user`: accounts that own tricks
/// - `trick`: shared tricks with their tag/category join rows
/// - `tag`: free-form labels attached to tricks
/// - `category`: curated groupings attached to tricks
///
/// # Example
///
/// ```no_run
/// use tricks_shared::models::trick::{CreateTrick, Trick};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, owner: Uuid, tag: Uuid, category: Uuid) -> Result<(), sqlx::Error> {
/// let trick = Trick::create(
///     &pool,
///     CreateTrick {
///         user_id: owner,
///         title: "Eager load counts".to_string(),
///         description: "Use withCount to avoid N+1 queries".to_string(),
///         code: "Post::withCount('comments')->get();".to_string(),
///         tags: vec![tag],
///         categories: vec![category],
///     },
/// )
/// .await?;
/// assert_eq!(trick.slug, "eager-load-counts");
/// # Ok(())
/// # }
/// ```

pub mod category;
pub mod tag;
pub mod trick;
pub mod user;
