//! Shared fixtures for the API integration tests
//!
//! The router runs against in-memory repositories so the trick pages can be
//! exercised without PostgreSQL:
//! - `MemoryTricks` stores tricks and their links and records the order of
//!   mutating calls
//! - archives go to a temporary directory
//! - the pool is lazy and never connects; only `/health` and the auth routes
//!   would touch it
//! - `MultipartBody` builds `multipart/form-data` request bodies

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use chrono::{Duration, Utc};
use sqlx::postgres::PgPoolOptions;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;
use tricks_api::{
    app::{build_router, AppState},
    config::Config,
};
use tricks_shared::{
    auth::jwt::{create_token, Claims, TokenType},
    models::{
        category::Category,
        tag::Tag,
        trick::{generate_slug, CreateTrick, Trick, UpdateTrick},
    },
    repositories::{CategoryRepository, TagRepository, TrickRepository},
};
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Mutating repository calls, in the order they happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Create,
    Edit,
    DetachTags,
    DetachCategories,
    Delete,
}

#[derive(Default)]
struct TrickState {
    tricks: Vec<Trick>,
    tag_links: HashMap<Uuid, Vec<Uuid>>,
    category_links: HashMap<Uuid, Vec<Uuid>>,
    calls: Vec<Call>,
    folder_present_at_delete: Option<bool>,
}

/// In-memory `TrickRepository`
pub struct MemoryTricks {
    archive_root: PathBuf,
    state: Mutex<TrickState>,
}

impl MemoryTricks {
    fn new(archive_root: PathBuf) -> Self {
        Self {
            archive_root,
            state: Mutex::new(TrickState::default()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Whether the trick's archive folder still existed when `delete` ran
    pub fn folder_present_at_delete(&self) -> Option<bool> {
        self.state.lock().unwrap().folder_present_at_delete
    }

    pub fn all(&self) -> Vec<Trick> {
        self.state.lock().unwrap().tricks.clone()
    }

    pub fn get(&self, id: Uuid) -> Option<Trick> {
        self.all().into_iter().find(|t| t.id == id)
    }

    pub fn tag_links(&self, id: Uuid) -> Vec<Uuid> {
        self.state.lock().unwrap().tag_links.get(&id).cloned().unwrap_or_default()
    }

    pub fn category_links(&self, id: Uuid) -> Vec<Uuid> {
        self.state
            .lock()
            .unwrap()
            .category_links
            .get(&id)
            .cloned()
            .unwrap_or_default()
    }

    /// Inserts a trick without recording a call
    pub fn seed(&self, user_id: Uuid, title: &str, tags: Vec<Uuid>, categories: Vec<Uuid>) -> Trick {
        let mut state = self.state.lock().unwrap();
        let created_at = Utc::now() + Duration::seconds(state.tricks.len() as i64);
        let trick = Trick {
            id: Uuid::new_v4(),
            user_id,
            title: title.to_string(),
            slug: generate_slug(title),
            description: "A trick seeded for tests".to_string(),
            code: "echo 'seeded';".to_string(),
            created_at,
            updated_at: created_at,
        };

        state.tag_links.insert(trick.id, tags);
        state.category_links.insert(trick.id, categories);
        state.tricks.push(trick.clone());
        trick
    }
}

#[async_trait]
impl TrickRepository for MemoryTricks {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Trick>, sqlx::Error> {
        Ok(self.all().into_iter().find(|t| t.slug == slug))
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Trick>, sqlx::Error> {
        let mut tricks: Vec<Trick> = self
            .all()
            .into_iter()
            .filter(|t| t.user_id == user_id)
            .collect();
        tricks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tricks)
    }

    async fn create(&self, data: CreateTrick) -> Result<Trick, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let now = Utc::now() + Duration::seconds(state.tricks.len() as i64);
        let trick = Trick {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            slug: generate_slug(&data.title),
            title: data.title,
            description: data.description,
            code: data.code,
            created_at: now,
            updated_at: now,
        };

        state.tag_links.insert(trick.id, data.tags);
        state.category_links.insert(trick.id, data.categories);
        state.tricks.push(trick.clone());
        state.calls.push(Call::Create);
        Ok(trick)
    }

    async fn edit(&self, trick: &Trick, data: UpdateTrick) -> Result<Trick, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Edit);

        let stored = state
            .tricks
            .iter_mut()
            .find(|t| t.id == trick.id)
            .ok_or(sqlx::Error::RowNotFound)?;
        stored.slug = generate_slug(&data.title);
        stored.title = data.title;
        stored.description = data.description;
        stored.code = data.code;
        stored.updated_at = Utc::now();
        let updated = stored.clone();

        state.tag_links.insert(trick.id, data.tags);
        state.category_links.insert(trick.id, data.categories);
        Ok(updated)
    }

    async fn delete(&self, trick: &Trick) -> Result<bool, sqlx::Error> {
        let folder_present = self.archive_root.join(trick.id.to_string()).exists();

        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Delete);
        state.folder_present_at_delete = Some(folder_present);

        let before = state.tricks.len();
        state.tricks.retain(|t| t.id != trick.id);
        Ok(state.tricks.len() < before)
    }

    async fn detach_tags(&self, trick: &Trick) -> Result<u64, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::DetachTags);
        Ok(state.tag_links.remove(&trick.id).map_or(0, |ids| ids.len() as u64))
    }

    async fn detach_categories(&self, trick: &Trick) -> Result<u64, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::DetachCategories);
        Ok(state
            .category_links
            .remove(&trick.id)
            .map_or(0, |ids| ids.len() as u64))
    }

    async fn list_tag_ids_for_trick(&self, trick: &Trick) -> Result<Vec<Uuid>, sqlx::Error> {
        Ok(self.tag_links(trick.id))
    }

    async fn list_category_ids_for_trick(&self, trick: &Trick) -> Result<Vec<Uuid>, sqlx::Error> {
        Ok(self.category_links(trick.id))
    }

    async fn title_exists(&self, title: &str, except: Option<Uuid>) -> Result<bool, sqlx::Error> {
        Ok(self
            .all()
            .iter()
            .any(|t| t.title.eq_ignore_ascii_case(title) && Some(t.id) != except))
    }

    async fn slug_exists(&self, slug: &str, except: Option<Uuid>) -> Result<bool, sqlx::Error> {
        Ok(self
            .all()
            .iter()
            .any(|t| t.slug == slug && Some(t.id) != except))
    }
}

pub struct MemoryTags(pub Vec<Tag>);

#[async_trait]
impl TagRepository for MemoryTags {
    async fn list_all(&self) -> Result<Vec<Tag>, sqlx::Error> {
        Ok(self.0.clone())
    }
}

pub struct MemoryCategories(pub Vec<Category>);

#[async_trait]
impl CategoryRepository for MemoryCategories {
    async fn list_all(&self) -> Result<Vec<Category>, sqlx::Error> {
        Ok(self.0.clone())
    }
}

/// Router plus handles on everything behind it
pub struct TestContext {
    pub app: Router,
    pub tricks: Arc<MemoryTricks>,
    pub tags: Vec<Tag>,
    pub categories: Vec<Category>,
    pub archive_dir: TempDir,

    /// The user most tests act as
    pub user_id: Uuid,
}

impl TestContext {
    /// Must be called inside a Tokio runtime
    pub fn new() -> Self {
        let archive_dir = tempfile::tempdir().expect("temp dir");
        let archive_root = archive_dir.path().to_path_buf();

        let vars: HashMap<&str, String> = HashMap::from([
            ("DATABASE_URL", "postgresql://localhost/tricks_test".to_string()),
            ("JWT_SECRET", JWT_SECRET.to_string()),
            ("ARCHIVE_ROOT", archive_root.display().to_string()),
            ("UPLOAD_MAX_BYTES", (1024 * 1024).to_string()),
        ]);
        let config = Config::from_lookup(|key| vars.get(key).cloned()).expect("test config");

        let db = PgPoolOptions::new()
            .connect_lazy(&config.database.url)
            .expect("lazy pool");

        let tags = vec![named_tag("Eloquent"), named_tag("Routing")];
        let categories = vec![named_category("Database"), named_category("Views")];
        let tricks = Arc::new(MemoryTricks::new(archive_root));

        let state = AppState::with_repositories(
            db,
            config,
            tricks.clone(),
            Arc::new(MemoryTags(tags.clone())),
            Arc::new(MemoryCategories(categories.clone())),
        );

        Self {
            app: build_router(state),
            tricks,
            tags,
            categories,
            archive_dir,
            user_id: Uuid::new_v4(),
        }
    }

    pub fn token_for(&self, user_id: Uuid) -> String {
        create_token(&Claims::new(user_id, TokenType::Access), JWT_SECRET).expect("token")
    }

    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.token_for(self.user_id))
    }

    pub fn archive_folder(&self, trick_id: Uuid) -> PathBuf {
        self.archive_dir.path().join(trick_id.to_string())
    }

    /// File names in a trick's archive folder, sorted
    pub fn archive_files(&self, trick_id: Uuid) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(self.archive_folder(trick_id)) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Seeds a trick owned by `user_id`, linked to the first tag and category
    pub fn seed_trick(&self, user_id: Uuid, title: &str) -> Trick {
        self.tricks
            .seed(user_id, title, vec![self.tags[0].id], vec![self.categories[0].id])
    }

    /// A form body that passes validation
    pub fn valid_form(&self, title: &str) -> MultipartBody {
        MultipartBody::new()
            .text("title", title)
            .text("description", "Count related rows without loading them")
            .text("code", "Post::withCount('comments')->get();")
            .text("tags[]", &self.tags[0].id.to_string())
            .text("tags[]", &self.tags[1].id.to_string())
            .text("categories[]", &self.categories[0].id.to_string())
    }

    pub async fn get(&self, uri: &str, auth: Option<String>) -> Response<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(
        &self,
        uri: &str,
        auth: Option<String>,
        referer: Option<&str>,
        form: MultipartBody,
    ) -> Response<Body> {
        let (content_type, body) = form.finish();
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type);
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        if let Some(referer) = referer {
            builder = builder.header(header::REFERER, referer);
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }
}

pub fn named_tag(name: &str) -> Tag {
    Tag {
        id: Uuid::new_v4(),
        name: name.to_string(),
        slug: generate_slug(name),
    }
}

pub fn named_category(name: &str) -> Category {
    Category {
        id: Uuid::new_v4(),
        name: name.to_string(),
        slug: generate_slug(name),
    }
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

/// Builder for `multipart/form-data` bodies
pub struct MultipartBody {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self {
            boundary: format!("tricks-boundary-{}", Uuid::new_v4().simple()),
            body: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                self.boundary, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                self.boundary, name, file_name
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(content);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Returns the `Content-Type` header value and the encoded body
    pub fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (
            format!("multipart/form-data; boundary={}", self.boundary),
            self.body,
        )
    }
}
