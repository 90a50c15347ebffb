//! Media asset database operations

use shared::models::MediaAsset;
use sqlx::PgPool;

use super::BoxError;

pub async fn list(pool: &PgPool) -> Result<Vec<MediaAsset>, BoxError> {
    let assets: Vec<MediaAsset> = sqlx::query_as(
        r#"
        SELECT id, hash, path, original_filename, content_type, width, height, size_bytes,
               created_at
        FROM media_assets
        ORDER BY created_at DESC, id
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(assets)
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<MediaAsset>, BoxError> {
    let asset: Option<MediaAsset> = sqlx::query_as(
        r#"
        SELECT id, hash, path, original_filename, content_type, width, height, size_bytes,
               created_at
        FROM media_assets
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(asset)
}

pub async fn find_by_hash(pool: &PgPool, hash: &str) -> Result<Option<MediaAsset>, BoxError> {
    let asset: Option<MediaAsset> = sqlx::query_as(
        r#"
        SELECT id, hash, path, original_filename, content_type, width, height, size_bytes,
               created_at
        FROM media_assets
        WHERE hash = $1
        "#,
    )
    .bind(hash)
    .fetch_optional(pool)
    .await?;
    Ok(asset)
}

/// Register an upload (idempotent on hash). Returns the stored row, which is
/// the earlier one when the same bytes were uploaded before.
pub async fn register(pool: &PgPool, asset: &MediaAsset) -> Result<MediaAsset, BoxError> {
    sqlx::query(
        r#"
        INSERT INTO media_assets (
            id, hash, path, original_filename, content_type, width, height, size_bytes, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (hash) DO NOTHING
        "#,
    )
    .bind(&asset.id)
    .bind(&asset.hash)
    .bind(&asset.path)
    .bind(&asset.original_filename)
    .bind(&asset.content_type)
    .bind(asset.width)
    .bind(asset.height)
    .bind(asset.size_bytes)
    .bind(asset.created_at)
    .execute(pool)
    .await?;

    find_by_hash(pool, &asset.hash)
        .await?
        .ok_or_else(|| "media asset vanished after insert".into())
}

pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, BoxError> {
    let result = sqlx::query("DELETE FROM media_assets WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
