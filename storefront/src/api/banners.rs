//! Homepage banners

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::media::ImageSet;
use shared::models::{Banner, BannerCreate, BannerUpdate};
use shared::util::{new_id, now_millis};

use super::{ApiResult, non_blank, required_text};
use crate::db;
use crate::state::{AppState, MediaStore};

fn not_found(id: &str) -> AppError {
    AppError::with_message(ErrorCode::BannerNotFound, format!("Banner {id} not found"))
        .with_detail("id", id)
}

fn check_schedule(starts_at: Option<i64>, ends_at: Option<i64>) -> AppResult<()> {
    if let (Some(start), Some(end)) = (starts_at, ends_at) {
        if start >= end {
            return Err(AppError::with_message(
                ErrorCode::BannerScheduleInvalid,
                "Banner must start before it ends",
            )
            .with_detail("starts_at", start)
            .with_detail("ends_at", end));
        }
    }
    Ok(())
}

/// Banner as shown on the homepage
#[derive(Debug, Serialize)]
pub struct LiveBanner {
    pub id: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub link_url: Option<String>,
    pub image: Option<ImageSet>,
}

/// Banners live at `now`, keeping the stored order.
fn live_banners(banners: Vec<Banner>, now: i64, media: &MediaStore) -> Vec<LiveBanner> {
    banners
        .into_iter()
        .filter(|b| b.is_live(now))
        .map(|b| LiveBanner {
            image: media.image_set(&b.image_path),
            id: b.id,
            title: b.title,
            subtitle: b.subtitle,
            link_url: b.link_url,
        })
        .collect()
}

/// GET /api/banners
pub async fn list_live(State(state): State<AppState>) -> ApiResult<Vec<LiveBanner>> {
    let banners = db::banner::list_active(&state.pool).await?;
    Ok(Json(live_banners(banners, now_millis(), &state.media)))
}

/// GET /api/admin/banners
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Banner>> {
    let banners = db::banner::list_all(&state.pool).await?;
    Ok(Json(banners))
}

/// GET /api/admin/banners/{id}
pub async fn get_by_id(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Banner> {
    let banner = db::banner::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| not_found(&id))?;
    Ok(Json(banner))
}

/// POST /api/admin/banners
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<BannerCreate>,
) -> ApiResult<Banner> {
    let banner = Banner {
        id: new_id(),
        title: required_text(&payload.title, "title")?,
        subtitle: non_blank(payload.subtitle),
        image_path: required_text(&payload.image_path, "image_path")?,
        link_url: non_blank(payload.link_url),
        sort_order: payload.sort_order.unwrap_or(0),
        is_active: payload.is_active.unwrap_or(true),
        starts_at: payload.starts_at,
        ends_at: payload.ends_at,
    };
    check_schedule(banner.starts_at, banner.ends_at)?;

    db::banner::insert(&state.pool, &banner).await?;
    tracing::info!(banner_id = %banner.id, "Banner created");
    Ok(Json(banner))
}

/// PUT /api/admin/banners/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<BannerUpdate>,
) -> ApiResult<Banner> {
    let mut banner = db::banner::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| not_found(&id))?;

    if let Some(title) = payload.title {
        banner.title = required_text(&title, "title")?;
    }
    if let Some(subtitle) = payload.subtitle {
        banner.subtitle = non_blank(subtitle);
    }
    if let Some(image_path) = payload.image_path {
        banner.image_path = required_text(&image_path, "image_path")?;
    }
    if let Some(link_url) = payload.link_url {
        banner.link_url = non_blank(link_url);
    }
    if let Some(sort_order) = payload.sort_order {
        banner.sort_order = sort_order;
    }
    if let Some(is_active) = payload.is_active {
        banner.is_active = is_active;
    }
    if let Some(starts_at) = payload.starts_at {
        banner.starts_at = starts_at;
    }
    if let Some(ends_at) = payload.ends_at {
        banner.ends_at = ends_at;
    }
    check_schedule(banner.starts_at, banner.ends_at)?;

    if !db::banner::update(&state.pool, &banner).await? {
        return Err(not_found(&id).into());
    }
    tracing::info!(banner_id = %banner.id, "Banner updated");
    Ok(Json(banner))
}

/// DELETE /api/admin/banners/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<bool> {
    if !db::banner::delete(&state.pool, &id).await? {
        return Err(not_found(&id).into());
    }
    tracing::info!(banner_id = %id, "Banner deleted");
    Ok(Json(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_schedule() {
        assert!(check_schedule(None, None).is_ok());
        assert!(check_schedule(Some(1), None).is_ok());
        assert!(check_schedule(Some(1), Some(2)).is_ok());
        assert_eq!(
            check_schedule(Some(2), Some(2)).unwrap_err().code,
            ErrorCode::BannerScheduleInvalid
        );
    }

    #[tokio::test]
    async fn test_live_banners_respect_window() {
        let media = AppState::for_tests().media;
        let banner = |id: &str, starts_at: Option<i64>, ends_at: Option<i64>| Banner {
            id: id.into(),
            title: id.to_uppercase(),
            subtitle: None,
            image_path: format!("banners/{id}.jpg"),
            link_url: None,
            sort_order: 0,
            is_active: true,
            starts_at,
            ends_at,
        };
        let banners = vec![
            banner("always", None, None),
            banner("expired", Some(0), Some(100)),
            banner("upcoming", Some(500), None),
            banner("now", Some(100), Some(500)),
        ];

        let live = live_banners(banners, 200, &media);
        let ids: Vec<&str> = live.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["always", "now"]);
        assert_eq!(
            live[0].image.as_ref().map(|i| i.thumb.as_str()),
            Some("https://media.test/banners/always_thumb.jpg")
        );
    }
}
