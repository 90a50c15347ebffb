//! Blog posts

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::media::ImageSet;
use shared::models::{Post, PostCreate, PostUpdate, clean_tags};
use shared::util::{new_id, now_millis};

use super::{ApiResult, non_blank, required_text, resolve_slug};
use crate::db;
use crate::error::ServiceResult;
use crate::state::{AppState, MediaStore};

fn not_found(key: &str) -> AppError {
    AppError::with_message(ErrorCode::PostNotFound, format!("Post '{key}' not found"))
}

fn slug_exists(slug: &str) -> AppError {
    AppError::with_message(ErrorCode::PostSlugExists, format!("Slug '{slug}' is already in use"))
        .with_detail("slug", slug)
}

/// Published post with resolved cover image
#[derive(Debug, Serialize)]
pub struct PublicPost {
    #[serde(flatten)]
    pub post: Post,
    pub cover: Option<ImageSet>,
}

impl PublicPost {
    fn new(post: Post, media: &MediaStore) -> Self {
        let cover = post.cover_image.as_deref().and_then(|p| media.image_set(p));
        Self { post, cover }
    }
}

async fn save(state: &AppState, post: &Post, is_new: bool) -> ServiceResult<()> {
    if db::post::slug_taken(&state.pool, &post.slug, (!is_new).then_some(post.id.as_str())).await? {
        return Err(slug_exists(&post.slug).into());
    }
    let result = if is_new {
        db::post::insert(&state.pool, post).await
    } else {
        match db::post::update(&state.pool, post).await {
            Ok(true) => Ok(()),
            Ok(false) => return Err(not_found(&post.id).into()),
            Err(e) => Err(e),
        }
    };
    match result {
        Ok(()) => Ok(()),
        Err(e) if db::is_unique_violation(&e) => Err(slug_exists(&post.slug).into()),
        Err(e) => Err(e.into()),
    }
}

/// GET /api/posts
pub async fn list_published(State(state): State<AppState>) -> ApiResult<Vec<PublicPost>> {
    let posts = db::post::list_published(&state.pool, now_millis()).await?;
    Ok(Json(
        posts
            .into_iter()
            .map(|p| PublicPost::new(p, &state.media))
            .collect(),
    ))
}

/// GET /api/posts/{slug}
///
/// Drafts and scheduled posts read as missing.
pub async fn get_published(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<PublicPost> {
    let post = db::post::find_by_slug(&state.pool, &slug)
        .await?
        .filter(|p| p.is_published(now_millis()))
        .ok_or_else(|| not_found(&slug))?;
    Ok(Json(PublicPost::new(post, &state.media)))
}

/// GET /api/admin/posts
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Post>> {
    let posts = db::post::list_all(&state.pool).await?;
    Ok(Json(posts))
}

/// GET /api/admin/posts/{id}
pub async fn get_by_id(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Post> {
    let post = db::post::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| not_found(&id))?;
    Ok(Json(post))
}

/// POST /api/admin/posts
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<PostCreate>,
) -> ApiResult<Post> {
    let title = required_text(&payload.title, "title")?;
    let slug = resolve_slug(payload.slug.as_deref(), &title)?;
    let now = now_millis();
    let post = Post {
        id: new_id(),
        slug,
        title,
        excerpt: non_blank(payload.excerpt),
        body: payload.body,
        cover_image: non_blank(payload.cover_image),
        tags: clean_tags(payload.tags),
        published_at: payload.published_at,
        created_at: now,
        updated_at: now,
    };
    save(&state, &post, true).await?;

    tracing::info!(post_id = %post.id, slug = %post.slug, "Post created");
    Ok(Json(post))
}

/// PUT /api/admin/posts/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<PostUpdate>,
) -> ApiResult<Post> {
    let mut post = db::post::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| not_found(&id))?;

    if let Some(title) = payload.title {
        post.title = required_text(&title, "title")?;
    }
    if let Some(slug) = payload.slug {
        post.slug = resolve_slug(Some(&slug), &post.title)?;
    }
    if let Some(excerpt) = payload.excerpt {
        post.excerpt = non_blank(excerpt);
    }
    if let Some(body) = payload.body {
        post.body = body;
    }
    if let Some(cover_image) = payload.cover_image {
        post.cover_image = non_blank(cover_image);
    }
    if let Some(tags) = payload.tags {
        post.tags = clean_tags(tags);
    }
    if let Some(published_at) = payload.published_at {
        post.published_at = published_at;
    }
    post.updated_at = now_millis();

    save(&state, &post, false).await?;

    tracing::info!(post_id = %post.id, "Post updated");
    Ok(Json(post))
}

/// DELETE /api/admin/posts/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<bool> {
    if !db::post::delete(&state.pool, &id).await? {
        return Err(not_found(&id).into());
    }
    tracing::info!(post_id = %id, "Post deleted");
    Ok(Json(true))
}
