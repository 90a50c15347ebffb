//! Media library
//!
//! POST /api/admin/media: multipart upload -> validate -> variants -> bucket
//! -> `media_assets` row. Identical bytes map to the same asset.

use axum::Json;
use axum::extract::{Multipart, Path, State};
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::media::{ImageSet, ImageVariant, variant_path};
use shared::models::MediaAsset;
use shared::util::{new_id, now_millis};

use super::ApiResult;
use crate::db;
use crate::media::{content_hash, process_upload};
use crate::state::AppState;

/// Asset with its public URLs
#[derive(Debug, Serialize)]
pub struct MediaView {
    #[serde(flatten)]
    pub asset: MediaAsset,
    pub urls: Option<ImageSet>,
}

impl MediaView {
    fn new(asset: MediaAsset, state: &AppState) -> Self {
        let urls = state.media.image_set(&asset.path);
        Self { asset, urls }
    }
}

/// GET /api/admin/media
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<MediaView>> {
    let assets = db::media::list(&state.pool).await?;
    Ok(Json(
        assets
            .into_iter()
            .map(|a| MediaView::new(a, &state))
            .collect(),
    ))
}

/// POST /api/admin/media
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<MediaView> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut original_filename: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::with_message(ErrorCode::InvalidRequest, format!("Multipart error: {e}"))
    })? {
        if field.name() == Some("file") {
            original_filename = field.file_name().map(str::to_string);
            let bytes = field.bytes().await.map_err(|e| {
                AppError::with_message(ErrorCode::InvalidRequest, format!("Read error: {e}"))
            })?;
            file_data = Some(bytes.to_vec());
            break;
        }
    }

    let data = file_data.ok_or_else(|| {
        AppError::with_message(ErrorCode::NoFileProvided, "No 'file' field in upload")
    })?;
    let filename = original_filename.unwrap_or_default();

    let hash = content_hash(&data);
    if let Some(existing) = db::media::find_by_hash(&state.pool, &hash).await? {
        tracing::info!(media_id = %existing.id, "Duplicate upload, returning existing asset");
        return Ok(Json(MediaView::new(existing, &state)));
    }

    let max_bytes = state.max_upload_bytes;
    let name = filename.clone();
    let processed = tokio::task::spawn_blocking(move || process_upload(data, &name, max_bytes))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Image processing task failed");
            AppError::new(ErrorCode::ImageProcessingFailed)
        })??;

    for object in processed.objects() {
        state
            .media
            .put(&object.key, object.bytes.clone(), &object.content_type)
            .await
            .map_err(|e| {
                tracing::error!(key = %object.key, error = %e, "Object store upload failed");
                AppError::with_message(ErrorCode::FileStorageFailed, "Image upload failed")
            })?;
    }

    let asset = MediaAsset {
        id: new_id(),
        hash: processed.hash.clone(),
        path: processed.original.key.clone(),
        original_filename: Some(filename).filter(|f| !f.is_empty()),
        content_type: processed.original.content_type.clone(),
        width: processed.width as i32,
        height: processed.height as i32,
        size_bytes: processed.original.bytes.len() as i64,
        created_at: now_millis(),
    };
    let stored = db::media::register(&state.pool, &asset).await?;

    tracing::info!(
        media_id = %stored.id,
        hash = %stored.hash,
        width = stored.width,
        height = stored.height,
        "Image uploaded"
    );
    Ok(Json(MediaView::new(stored, &state)))
}

/// DELETE /api/admin/media/{id}
///
/// Stored objects are removed best-effort; the row goes regardless.
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<bool> {
    let asset = db::media::find_by_id(&state.pool, &id).await?.ok_or_else(|| {
        AppError::with_message(ErrorCode::MediaNotFound, format!("Media {id} not found"))
    })?;

    let mut keys = vec![asset.path.clone()];
    keys.extend(
        ImageVariant::GENERATED
            .iter()
            .filter_map(|v| variant_path(&asset.path, *v)),
    );
    for key in &keys {
        if let Err(e) = state.media.delete(key).await {
            tracing::warn!(key = %key, error = %e, "Failed to delete stored object");
        }
    }

    db::media::delete(&state.pool, &id).await?;
    tracing::info!(media_id = %id, "Media deleted");
    Ok(Json(true))
}
