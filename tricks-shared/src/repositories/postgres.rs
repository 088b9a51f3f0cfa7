/// PostgreSQL-backed repositories

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{CategoryRepository, TagRepository, TrickRepository};
use crate::models::{
    category::Category,
    tag::Tag,
    trick::{CreateTrick, Trick, UpdateTrick},
};

#[derive(Debug, Clone)]
pub struct PgTrickRepository {
    pool: PgPool,
}

impl PgTrickRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TrickRepository for PgTrickRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Trick>, sqlx::Error> {
        Trick::find_by_slug(&self.pool, slug).await
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Trick>, sqlx::Error> {
        Trick::list_by_user(&self.pool, user_id).await
    }

    async fn create(&self, data: CreateTrick) -> Result<Trick, sqlx::Error> {
        Trick::create(&self.pool, data).await
    }

    async fn edit(&self, trick: &Trick, data: UpdateTrick) -> Result<Trick, sqlx::Error> {
        Trick::update(&self.pool, trick.id, data).await
    }

    async fn delete(&self, trick: &Trick) -> Result<bool, sqlx::Error> {
        Trick::delete(&self.pool, trick.id).await
    }

    async fn detach_tags(&self, trick: &Trick) -> Result<u64, sqlx::Error> {
        Trick::detach_tags(&self.pool, trick.id).await
    }

    async fn detach_categories(&self, trick: &Trick) -> Result<u64, sqlx::Error> {
        Trick::detach_categories(&self.pool, trick.id).await
    }

    async fn list_tag_ids_for_trick(&self, trick: &Trick) -> Result<Vec<Uuid>, sqlx::Error> {
        Trick::tag_ids(&self.pool, trick.id).await
    }

    async fn list_category_ids_for_trick(&self, trick: &Trick) -> Result<Vec<Uuid>, sqlx::Error> {
        Trick::category_ids(&self.pool, trick.id).await
    }

    async fn title_exists(&self, title: &str, except: Option<Uuid>) -> Result<bool, sqlx::Error> {
        Trick::title_exists(&self.pool, title, except).await
    }

    async fn slug_exists(&self, slug: &str, except: Option<Uuid>) -> Result<bool, sqlx::Error> {
        Trick::slug_exists(&self.pool, slug, except).await
    }
}

#[derive(Debug, Clone)]
pub struct PgTagRepository {
    pool: PgPool,
}

impl PgTagRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TagRepository for PgTagRepository {
    async fn list_all(&self) -> Result<Vec<Tag>, sqlx::Error> {
        Tag::list_all(&self.pool).await
    }
}

#[derive(Debug, Clone)]
pub struct PgCategoryRepository {
    pool: PgPool,
}

impl PgCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn list_all(&self) -> Result<Vec<Category>, sqlx::Error> {
        Category::list_all(&self.pool).await
    }
}
