use std::path::Path as FsPath;

use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use myblog_core::{File, ObjectId, slug, storage::ResizeRequest};

use crate::{
    AppState,
    auth::AuthUser,
    infra::errors::{AppError, AppResult},
};

/// `width`/`height` are lenient: anything that is not a non-negative
/// integer counts as zero.
#[derive(Debug, Default, Deserialize)]
pub struct SizeParams {
    pub width: Option<String>,
    pub height: Option<String>,
}

impl SizeParams {
    fn resize_request(&self) -> ResizeRequest {
        let parse = |raw: &Option<String>| {
            raw.as_deref()
                .and_then(|value| value.trim().parse::<u32>().ok())
                .unwrap_or(0)
        };
        ResizeRequest::new(parse(&self.width), parse(&self.height))
    }
}

pub async fn download_handler(
    State(state): State<AppState>,
    Path(file_slug): Path<String>,
    Query(params): Query<SizeParams>,
) -> AppResult<Response> {
    let id = slug::id_from_storage_slug(&file_slug)?;
    let file = state.repositories.files.find_by_id(&id).await?;

    let download = state
        .pipeline
        .fetch(&file, params.resize_request())
        .await
        .map_err(|err| AppError::not_found(err.to_string()))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, download.content_type.to_string()),
            (header::CONTENT_LENGTH, download.body.len().to_string()),
        ],
        download.body,
    )
        .into_response())
}

/// Slug of an uploaded file: `{slugified stem}-{id}{.ext}`.
pub fn upload_slug(file_name: &str, id: &ObjectId) -> String {
    let path = FsPath::new(file_name);
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();
    let stem = &file_name[..file_name.len() - ext.len()];
    format!("{}{ext}", slug::compose(stem, id))
}

pub async fn upload_handler(
    State(state): State<AppState>,
    user: Option<Extension<AuthUser>>,
    mut multipart: Multipart,
) -> AppResult<Json<File>> {
    let Some(Extension(user)) = user else {
        return Err(AppError::unauthorized("Unauthorized"));
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(err.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let body = field
            .bytes()
            .await
            .map_err(|err| AppError::bad_request(err.to_string()))?;

        let id = ObjectId::new();
        let file_slug = upload_slug(&file_name, &id);
        let path = format!("{}/{file_slug}", user.subject);

        info!("uploading file {path} with size {} to the storage server", body.len());
        state
            .storage
            .upload(body.to_vec(), &path)
            .await
            .map_err(|err| AppError::internal(err.to_string()))?;

        let file = state
            .repositories
            .files
            .create(File::new(id, path, file_name, file_slug))
            .await?;
        return Ok(Json(file));
    }

    Err(AppError::bad_request("file field is missing"))
}

pub async fn delete_handler(
    State(state): State<AppState>,
    user: Option<Extension<AuthUser>>,
    Path(file_slug): Path<String>,
) -> AppResult<Json<Value>> {
    if user.is_none() {
        return Err(AppError::unauthorized("Unauthorized"));
    }

    let id = slug::id_from_storage_slug(&file_slug)?;
    let file = state
        .repositories
        .files
        .find_by_id(&id)
        .await
        .map_err(|err| AppError::not_found(err.to_string()))?;

    info!("deleting file {} from the storage server", file.path);
    state
        .storage
        .delete(&file.path)
        .await
        .map_err(|err| AppError::internal(err.to_string()))?;
    state
        .repositories
        .files
        .delete(&id)
        .await
        .map_err(|err| AppError::internal(err.to_string()))?;

    Ok(Json(json!({})))
}
