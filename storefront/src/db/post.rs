//! Blog post database operations

use shared::models::Post;
use sqlx::PgPool;

use super::BoxError;

#[derive(sqlx::FromRow)]
struct PostRow {
    id: String,
    slug: String,
    title: String,
    excerpt: Option<String>,
    body: String,
    cover_image: Option<String>,
    tags: Vec<String>,
    published_at: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

impl From<PostRow> for Post {
    fn from(r: PostRow) -> Self {
        Post {
            id: r.id,
            slug: r.slug,
            title: r.title,
            excerpt: r.excerpt,
            body: r.body,
            cover_image: r.cover_image,
            tags: r.tags,
            published_at: r.published_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Posts published at or before `now`, newest first.
pub async fn list_published(pool: &PgPool, now: i64) -> Result<Vec<Post>, BoxError> {
    let rows: Vec<PostRow> = sqlx::query_as(
        r#"
        SELECT id, slug, title, excerpt, body, cover_image, tags, published_at,
               created_at, updated_at
        FROM posts
        WHERE published_at IS NOT NULL AND published_at <= $1
        ORDER BY published_at DESC, id
        "#,
    )
    .bind(now)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Post::from).collect())
}

/// Drafts included, most recently edited first.
pub async fn list_all(pool: &PgPool) -> Result<Vec<Post>, BoxError> {
    let rows: Vec<PostRow> = sqlx::query_as(
        r#"
        SELECT id, slug, title, excerpt, body, cover_image, tags, published_at,
               created_at, updated_at
        FROM posts
        ORDER BY updated_at DESC, id
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Post::from).collect())
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Post>, BoxError> {
    let row: Option<PostRow> = sqlx::query_as(
        r#"
        SELECT id, slug, title, excerpt, body, cover_image, tags, published_at,
               created_at, updated_at
        FROM posts
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(Post::from))
}

pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Post>, BoxError> {
    let row: Option<PostRow> = sqlx::query_as(
        r#"
        SELECT id, slug, title, excerpt, body, cover_image, tags, published_at,
               created_at, updated_at
        FROM posts
        WHERE slug = $1
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(Post::from))
}

pub async fn slug_taken(
    pool: &PgPool,
    slug: &str,
    except_id: Option<&str>,
) -> Result<bool, BoxError> {
    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM posts WHERE slug = $1 AND ($2::text IS NULL OR id <> $2))",
    )
    .bind(slug)
    .bind(except_id)
    .fetch_one(pool)
    .await?;
    Ok(taken)
}

pub async fn insert(pool: &PgPool, post: &Post) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO posts (
            id, slug, title, excerpt, body, cover_image, tags, published_at, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(&post.id)
    .bind(&post.slug)
    .bind(&post.title)
    .bind(&post.excerpt)
    .bind(&post.body)
    .bind(&post.cover_image)
    .bind(&post.tags)
    .bind(post.published_at)
    .bind(post.created_at)
    .bind(post.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update(pool: &PgPool, post: &Post) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE posts SET
            slug = $2, title = $3, excerpt = $4, body = $5, cover_image = $6,
            tags = $7, published_at = $8, updated_at = $9
        WHERE id = $1
        "#,
    )
    .bind(&post.id)
    .bind(&post.slug)
    .bind(&post.title)
    .bind(&post.excerpt)
    .bind(&post.body)
    .bind(&post.cover_image)
    .bind(&post.tags)
    .bind(post.published_at)
    .bind(post.updated_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, BoxError> {
    let result = sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
