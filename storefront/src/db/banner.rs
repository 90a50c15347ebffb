//! Banner database operations

use shared::models::Banner;
use sqlx::PgPool;

use super::BoxError;

pub async fn list_all(pool: &PgPool) -> Result<Vec<Banner>, BoxError> {
    let banners: Vec<Banner> = sqlx::query_as(
        r#"
        SELECT id, title, subtitle, image_path, link_url, sort_order, is_active, starts_at, ends_at
        FROM banners
        ORDER BY sort_order, created_at, id
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(banners)
}

/// Active banners in display order; schedule windows are checked by the caller.
pub async fn list_active(pool: &PgPool) -> Result<Vec<Banner>, BoxError> {
    let banners: Vec<Banner> = sqlx::query_as(
        r#"
        SELECT id, title, subtitle, image_path, link_url, sort_order, is_active, starts_at, ends_at
        FROM banners
        WHERE is_active
        ORDER BY sort_order, created_at, id
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(banners)
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Banner>, BoxError> {
    let banner: Option<Banner> = sqlx::query_as(
        r#"
        SELECT id, title, subtitle, image_path, link_url, sort_order, is_active, starts_at, ends_at
        FROM banners
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(banner)
}

pub async fn insert(pool: &PgPool, banner: &Banner) -> Result<(), BoxError> {
    let now = shared::util::now_millis();
    sqlx::query(
        r#"
        INSERT INTO banners (
            id, title, subtitle, image_path, link_url, sort_order, is_active,
            starts_at, ends_at, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
        "#,
    )
    .bind(&banner.id)
    .bind(&banner.title)
    .bind(&banner.subtitle)
    .bind(&banner.image_path)
    .bind(&banner.link_url)
    .bind(banner.sort_order)
    .bind(banner.is_active)
    .bind(banner.starts_at)
    .bind(banner.ends_at)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update(pool: &PgPool, banner: &Banner) -> Result<bool, BoxError> {
    let now = shared::util::now_millis();
    let result = sqlx::query(
        r#"
        UPDATE banners SET
            title = $2, subtitle = $3, image_path = $4, link_url = $5, sort_order = $6,
            is_active = $7, starts_at = $8, ends_at = $9, updated_at = $10
        WHERE id = $1
        "#,
    )
    .bind(&banner.id)
    .bind(&banner.title)
    .bind(&banner.subtitle)
    .bind(&banner.image_path)
    .bind(&banner.link_url)
    .bind(banner.sort_order)
    .bind(banner.is_active)
    .bind(banner.starts_at)
    .bind(banner.ends_at)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, BoxError> {
    let result = sqlx::query("DELETE FROM banners WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
