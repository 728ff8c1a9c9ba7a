#![allow(dead_code)]

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum_test::TestServer;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode, jwk::Jwk};
use mongodb::bson;
use serde_json::json;
use tempfile::TempDir;

use myblog_core::{
    BlogError, Category, Comment, DbRef, File, ObjectId, Post, Repositories, Tag,
    database::ports::{
        CategoryRepository, CommentRepository, FileRepository, PostRepository, TagRepository,
    },
    domain::collections,
    image::LanczosResizer,
    query::{CommentQuery, PostQuery},
    storage::{DiskCache, Storage},
};
use myblog_server::{
    AppState,
    auth::{JwtVerifier, StaticKeySource},
    create_app,
    infra::{
        app_state::AppParts,
        config::{ConfigLoader, models::sources::EnvConfig},
    },
};

pub const AUDIENCE: &str = "https://www.example.com";
pub const ISSUER: &str = "https://example.auth0.com/";
pub const BASE_URL: &str = "http://localhost";
pub const KEY_ID: &str = "test-key";
const SECRET: &[u8] = b"integration-test-secret";

type Shared<T> = Arc<Mutex<Vec<T>>>;

#[derive(Debug, Default, Clone)]
pub struct InMemoryPosts {
    pub items: Shared<Post>,
}

fn apply(post: &mut Post, query: &PostQuery) {
    if let Some(title) = &query.title {
        post.title = title.clone();
    }
    if let Some(slug) = &query.slug {
        post.slug = slug.clone();
    }
    if let Some(status) = query.status {
        post.status = status;
    }
    if let Some(markdown) = &query.markdown {
        post.markdown = markdown.clone();
    }
    if let Some(html) = &query.html {
        post.html = html.clone();
    }
    if let Some(published_at) = query.published_at {
        post.published_at = Some(published_at);
    }
    if let Some(categories) = &query.categories {
        post.categories = categories
            .iter()
            .map(|c| DbRef::new(collections::CATEGORIES, c.id))
            .collect();
    }
    if let Some(tags) = &query.tags {
        post.tags = tags
            .iter()
            .map(|t| DbRef::new(collections::TAGS, t.id))
            .collect();
    }
    if let Some(featured_image) = &query.featured_image {
        post.featured_image = featured_image
            .as_ref()
            .map(|f| DbRef::new(collections::FILES, f.id));
    }
    if let Some(attachments) = &query.attachments {
        post.attachments = attachments
            .iter()
            .map(|f| DbRef::new(collections::FILES, f.id))
            .collect();
    }
    post.updated_at = Some(bson::DateTime::now());
}

fn matches(post: &Post, query: &PostQuery) -> bool {
    query.status.is_none_or(|status| post.status == status)
        && query
            .author_id
            .as_ref()
            .is_none_or(|author| &post.author_id == author)
        && query
            .category
            .as_ref()
            .is_none_or(|c| post.categories.iter().any(|r| r.id == c.id))
        && query
            .tag
            .as_ref()
            .is_none_or(|t| post.tags.iter().any(|r| r.id == t.id))
}

#[async_trait]
impl PostRepository for InMemoryPosts {
    async fn create(&self, author_id: &str) -> myblog_core::Result<Post> {
        let post = Post::draft(author_id);
        self.items.lock().expect("posts lock").push(post.clone());
        Ok(post)
    }

    async fn find_all(&self, query: &PostQuery) -> myblog_core::Result<Vec<Post>> {
        let items = self.items.lock().expect("posts lock");
        let mut found: Vec<Post> = items.iter().filter(|p| matches(p, query)).cloned().collect();
        found.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        Ok(found
            .into_iter()
            .skip(query.pagination.offset as usize)
            .take(query.pagination.limit as usize)
            .collect())
    }

    async fn find_by_id(&self, id: &ObjectId) -> myblog_core::Result<Post> {
        self.items
            .lock()
            .expect("posts lock")
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or_else(|| BlogError::NotFound(format!("post {id}")))
    }

    async fn save(&self, id: &ObjectId, query: &PostQuery) -> myblog_core::Result<Post> {
        let mut items = self.items.lock().expect("posts lock");
        let post = items
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| BlogError::NotFound(format!("post {id}")))?;
        apply(post, query);
        Ok(post.clone())
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryCategories {
    pub items: Shared<Category>,
}

#[async_trait]
impl CategoryRepository for InMemoryCategories {
    async fn find_all(&self) -> myblog_core::Result<Vec<Category>> {
        Ok(self.items.lock().expect("categories lock").clone())
    }

    async fn find_all_by_ids(&self, ids: &[ObjectId]) -> myblog_core::Result<Vec<Category>> {
        let items = self.items.lock().expect("categories lock");
        Ok(items.iter().filter(|c| ids.contains(&c.id)).cloned().collect())
    }

    async fn find_by_id(&self, id: &ObjectId) -> myblog_core::Result<Category> {
        self.items
            .lock()
            .expect("categories lock")
            .iter()
            .find(|c| &c.id == id)
            .cloned()
            .ok_or_else(|| BlogError::NotFound(format!("category {id}")))
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryTags {
    pub items: Shared<Tag>,
}

#[async_trait]
impl TagRepository for InMemoryTags {
    async fn find_all(&self) -> myblog_core::Result<Vec<Tag>> {
        Ok(self.items.lock().expect("tags lock").clone())
    }

    async fn find_all_by_ids(&self, ids: &[ObjectId]) -> myblog_core::Result<Vec<Tag>> {
        let items = self.items.lock().expect("tags lock");
        Ok(items.iter().filter(|t| ids.contains(&t.id)).cloned().collect())
    }

    async fn find_by_id(&self, id: &ObjectId) -> myblog_core::Result<Tag> {
        self.items
            .lock()
            .expect("tags lock")
            .iter()
            .find(|t| &t.id == id)
            .cloned()
            .ok_or_else(|| BlogError::NotFound(format!("tag {id}")))
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryComments {
    pub items: Shared<Comment>,
}

#[async_trait]
impl CommentRepository for InMemoryComments {
    async fn create(&self, author_id: &str) -> myblog_core::Result<Comment> {
        let comment = Comment::new(author_id);
        self.items.lock().expect("comments lock").push(comment.clone());
        Ok(comment)
    }

    async fn find_all_by_ids(&self, ids: &[ObjectId]) -> myblog_core::Result<Vec<Comment>> {
        let items = self.items.lock().expect("comments lock");
        Ok(items.iter().filter(|c| ids.contains(&c.id)).cloned().collect())
    }

    async fn find_by_id(&self, id: &ObjectId) -> myblog_core::Result<Comment> {
        self.items
            .lock()
            .expect("comments lock")
            .iter()
            .find(|c| &c.id == id)
            .cloned()
            .ok_or_else(|| BlogError::NotFound(format!("comment {id}")))
    }

    async fn save(&self, id: &ObjectId, query: &CommentQuery) -> myblog_core::Result<Comment> {
        let mut items = self.items.lock().expect("comments lock");
        let comment = items
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| BlogError::NotFound(format!("comment {id}")))?;
        if let Some(text) = &query.text {
            comment.text = text.clone();
        }
        comment.updated_at = Some(bson::DateTime::now());
        Ok(comment.clone())
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryFiles {
    pub items: Shared<File>,
}

#[async_trait]
impl FileRepository for InMemoryFiles {
    async fn create(&self, file: File) -> myblog_core::Result<File> {
        self.items.lock().expect("files lock").push(file.clone());
        Ok(file)
    }

    async fn delete(&self, id: &ObjectId) -> myblog_core::Result<()> {
        self.items.lock().expect("files lock").retain(|f| &f.id != id);
        Ok(())
    }

    async fn find_all_by_ids(&self, ids: &[ObjectId]) -> myblog_core::Result<Vec<File>> {
        let items = self.items.lock().expect("files lock");
        Ok(items.iter().filter(|f| ids.contains(&f.id)).cloned().collect())
    }

    async fn find_by_id(&self, id: &ObjectId) -> myblog_core::Result<File> {
        self.items
            .lock()
            .expect("files lock")
            .iter()
            .find(|f| &f.id == id)
            .cloned()
            .ok_or_else(|| BlogError::NotFound(format!("file {id}")))
    }
}

/// Blob store kept in memory, keyed by path.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStorage {
    pub blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn upload(&self, body: Vec<u8>, path: &str) -> myblog_core::Result<()> {
        self.blobs.lock().expect("blobs lock").insert(path.to_string(), body);
        Ok(())
    }

    async fn download(&self, path: &str) -> myblog_core::Result<Vec<u8>> {
        self.blobs
            .lock()
            .expect("blobs lock")
            .get(path)
            .cloned()
            .ok_or_else(|| BlogError::NotFound(path.to_string()))
    }

    async fn delete(&self, path: &str) -> myblog_core::Result<()> {
        self.blobs.lock().expect("blobs lock").remove(path);
        Ok(())
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub posts: InMemoryPosts,
    pub categories: InMemoryCategories,
    pub tags: InMemoryTags,
    pub files: InMemoryFiles,
    pub storage: InMemoryStorage,
    pub cache: DiskCache,
    pub tempdir: TempDir,
}

impl TestApp {
    pub fn seed_post(&self, post: Post) -> Post {
        self.posts.items.lock().expect("posts lock").push(post.clone());
        post
    }

    pub fn seed_file(&self, file: File) -> File {
        self.files.items.lock().expect("files lock").push(file.clone());
        file
    }

    pub fn seed_category(&self, category: Category) -> Category {
        self.categories
            .items
            .lock()
            .expect("categories lock")
            .push(category.clone());
        category
    }

    pub fn post(&self, id: &ObjectId) -> Option<Post> {
        self.posts
            .items
            .lock()
            .expect("posts lock")
            .iter()
            .find(|p| &p.id == id)
            .cloned()
    }
}

fn signing_jwk() -> Result<Jwk> {
    serde_json::from_value(json!({
        "kty": "oct",
        "kid": KEY_ID,
        "k": URL_SAFE_NO_PAD.encode(SECRET),
    }))
    .context("invalid test jwk")
}

/// A bearer token for `subject` accepted by the test verifier.
pub fn token_for(subject: &str) -> String {
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(KEY_ID.to_string());
    let claims = json!({
        "sub": subject,
        "aud": AUDIENCE,
        "iss": ISSUER,
        "exp": chrono::Utc::now().timestamp() + 3600,
    });
    encode(&header, &claims, &EncodingKey::from_secret(SECRET)).expect("encode test token")
}

pub fn bearer(subject: &str) -> String {
    format!("Bearer {}", token_for(subject))
}

pub fn published_post(author_id: &str, title: &str) -> Post {
    let mut post = Post::draft(author_id);
    post.title = title.to_string();
    post.slug = myblog_core::slug::compose(title, &post.id);
    post.status = myblog_core::Status::Published;
    post.markdown = format!("{title} summary line.\nSecond line.");
    // 2019-12-31T20:00:00Z is 1 January 2020 in Bangkok.
    post.published_at = Some(bson::DateTime::from_millis(1_577_822_400_000));
    post
}

pub async fn build_test_app() -> Result<TestApp> {
    let tempdir = tempfile::tempdir().context("failed to create temporary directory")?;
    let cache_root = tempdir.path().join("cache");
    let web_root = tempdir.path().join("web");
    std::fs::create_dir_all(&web_root).context("failed to create web root")?;
    std::fs::write(web_root.join("index.html"), "<html><body>spa</body></html>")
        .context("failed to write index.html")?;

    let config_path = tempdir.path().join("myblog.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
[server]
base_url = "{BASE_URL}/"
static_file_path = "{web}"

[cache]
root = "{cache}"

[auth]
audience = "{AUDIENCE}"
issuer = "{ISSUER}"
"#,
            web = web_root.display(),
            cache = cache_root.display(),
        ),
    )
    .context("failed to write config")?;

    let config = ConfigLoader::new()
        .with_config_path(&config_path)
        .load_with_env(EnvConfig::default(), false)
        .context("failed to load test config")?
        .config;

    let posts = InMemoryPosts::default();
    let categories = InMemoryCategories::default();
    let tags = InMemoryTags::default();
    let files = InMemoryFiles::default();
    let storage = InMemoryStorage::default();
    let cache = DiskCache::new(&cache_root);
    cache.ensure_root().await.context("failed to create cache root")?;

    let repositories = Repositories {
        posts: Arc::new(posts.clone()),
        categories: Arc::new(categories.clone()),
        tags: Arc::new(tags.clone()),
        comments: Arc::new(InMemoryComments::default()),
        files: Arc::new(files.clone()),
    };

    let keys = Arc::new(StaticKeySource::new([signing_jwk()?]));
    let state = AppState::new(AppParts {
        config,
        repositories,
        storage: Arc::new(storage.clone()),
        cache: Arc::new(cache.clone()),
        resizer: Arc::new(LanczosResizer::new()),
        keys: keys.clone(),
        http: myblog_server::infra::http::upstream_client()?,
    })
    .with_verifier(
        JwtVerifier::new(AUDIENCE, ISSUER, keys).with_algorithms(vec![Algorithm::HS256]),
    );

    let make_service =
        create_app(state.clone()).into_make_service_with_connect_info::<SocketAddr>();
    let server = TestServer::builder()
        .http_transport()
        .build(make_service)
        .map_err(|err| anyhow::anyhow!(err.to_string()))?;

    Ok(TestApp {
        server,
        state,
        posts,
        categories,
        tags,
        files,
        storage,
        cache,
        tempdir,
    })
}
