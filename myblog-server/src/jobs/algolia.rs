//! Rebuild of the Algolia search index from the blog content.
//!
//! Talks to the Algolia REST API directly: clear the index, push categories,
//! tags and the latest published posts in batches, and wait for every task
//! to be published before moving on.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

use myblog_core::{BlogError, ObjectId, Repositories, Result, Status, query::PostQueryBuilder};

pub const INDEX_NAME: &str = "prod_www-nomkhonwaan-com";

const MAX_POSTS: i64 = 99;
const TASK_POLL_INTERVAL: Duration = Duration::from_millis(500);
const MAX_TASK_POLLS: u32 = 240;

#[derive(Debug, Deserialize)]
struct TaskResponse {
    #[serde(rename = "taskID")]
    task_id: u64,
}

#[derive(Debug, Deserialize)]
struct TaskStatus {
    status: String,
}

pub struct AlgoliaClient {
    http: reqwest::Client,
    base_url: String,
    app_id: String,
    api_key: String,
}

impl fmt::Debug for AlgoliaClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlgoliaClient")
            .field("base_url", &self.base_url)
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}

impl AlgoliaClient {
    pub fn new(http: reqwest::Client, app_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        let app_id = app_id.into();
        Self {
            http,
            base_url: format!("https://{app_id}.algolia.net"),
            app_id,
            api_key: api_key.into(),
        }
    }

    /// Point the client at another host, e.g. a local stand-in.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn index_url(&self, index: &str, suffix: &str) -> String {
        format!("{}/1/indexes/{index}/{suffix}", self.base_url)
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("X-Algolia-Application-Id", &self.app_id)
            .header("X-Algolia-API-Key", &self.api_key)
    }

    async fn send<T: serde::de::DeserializeOwned>(&self, builder: reqwest::RequestBuilder) -> Result<T> {
        let response = builder
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|err| BlogError::Upstream(err.to_string()))?;
        response
            .json::<T>()
            .await
            .map_err(|err| BlogError::Upstream(err.to_string()))
    }

    pub async fn clear_objects(&self, index: &str) -> Result<u64> {
        let builder = self.request(reqwest::Method::POST, self.index_url(index, "clear"));
        let task: TaskResponse = self.send(builder).await?;
        Ok(task.task_id)
    }

    pub async fn save_objects(&self, index: &str, objects: Vec<Value>) -> Result<u64> {
        let builder = self
            .request(reqwest::Method::POST, self.index_url(index, "batch"))
            .json(&batch_body(objects));
        let task: TaskResponse = self.send(builder).await?;
        Ok(task.task_id)
    }

    pub async fn wait_task(&self, index: &str, task_id: u64) -> Result<()> {
        for _ in 0..MAX_TASK_POLLS {
            let builder = self.request(
                reqwest::Method::GET,
                self.index_url(index, &format!("task/{task_id}")),
            );
            let task: TaskStatus = self.send(builder).await?;
            if task.status == "published" {
                return Ok(());
            }
            debug!(task_id, status = %task.status, "waiting for algolia task");
            tokio::time::sleep(TASK_POLL_INTERVAL).await;
        }
        Err(BlogError::Upstream(format!("algolia task {task_id} was not published in time")))
    }
}

/// Searchable record: the serialized document plus its hex id as `objectID`.
pub fn index_object<T: Serialize>(item: &T, id: &ObjectId) -> Result<Value> {
    let mut value = serde_json::to_value(item)?;
    if let Value::Object(map) = &mut value {
        map.insert("objectID".into(), Value::String(id.to_hex()));
    }
    Ok(value)
}

pub fn batch_body(objects: Vec<Value>) -> Value {
    let requests: Vec<Value> = objects
        .into_iter()
        .map(|body| json!({ "action": "updateObject", "body": body }))
        .collect();
    json!({ "requests": requests })
}

/// Clear `index` and refill it with categories, tags and published posts.
pub async fn generate_indices(
    client: &AlgoliaClient,
    repositories: &Repositories,
    index: &str,
) -> Result<()> {
    let task = client.clear_objects(index).await?;
    client.wait_task(index, task).await?;
    info!("cleared algolia index {index}");

    let categories = repositories
        .categories
        .find_all()
        .await?
        .iter()
        .map(|category| index_object(category, &category.id))
        .collect::<Result<Vec<_>>>()?;
    save_and_wait(client, index, "categories", categories).await?;

    let tags = repositories
        .tags
        .find_all()
        .await?
        .iter()
        .map(|tag| index_object(tag, &tag.id))
        .collect::<Result<Vec<_>>>()?;
    save_and_wait(client, index, "tags", tags).await?;

    let query = PostQueryBuilder::new()
        .with_status(Status::Published)
        .with_offset(0)
        .with_limit(MAX_POSTS)
        .build();
    let posts = repositories
        .posts
        .find_all(&query)
        .await?
        .iter()
        .map(|post| index_object(post, &post.id))
        .collect::<Result<Vec<_>>>()?;
    save_and_wait(client, index, "posts", posts).await?;

    Ok(())
}

async fn save_and_wait(
    client: &AlgoliaClient,
    index: &str,
    kind: &str,
    objects: Vec<Value>,
) -> Result<()> {
    if objects.is_empty() {
        info!("no {kind} to index");
        return Ok(());
    }
    let count = objects.len();
    let task = client.save_objects(index, objects).await?;
    client.wait_task(index, task).await?;
    info!("indexed {count} {kind}");
    Ok(())
}
