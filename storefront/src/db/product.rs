//! Product database operations

use rust_decimal::Decimal;
use shared::models::{Availability, Product, ProductMetadata, ProductPriority};
use sqlx::{PgPool, Postgres};
use sqlx::types::Json;

use super::BoxError;

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    slug: String,
    description: Option<String>,
    price: Decimal,
    tags: Vec<String>,
    category: Option<String>,
    gallery: Vec<String>,
    availability: String,
    priority: i32,
    is_active: bool,
    metadata: Json<ProductMetadata>,
    created_at: i64,
    updated_at: i64,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        let availability = Availability::parse(&r.availability).unwrap_or_else(|| {
            tracing::warn!(product_id = %r.id, value = %r.availability, "Unknown availability");
            Availability::default()
        });
        Product {
            id: r.id,
            name: r.name,
            slug: r.slug,
            description: r.description,
            price: r.price,
            tags: r.tags,
            category: r.category,
            gallery: r.gallery,
            availability,
            priority: r.priority,
            is_active: r.is_active,
            metadata: r.metadata.0,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Active products in storefront order.
pub async fn list_active(pool: &PgPool) -> Result<Vec<Product>, BoxError> {
    let rows: Vec<ProductRow> = sqlx::query_as(
        r#"
        SELECT id, name, slug, description, price, tags, category, gallery,
               availability, priority, is_active, metadata, created_at, updated_at
        FROM products
        WHERE is_active
        ORDER BY priority DESC, name, id
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Product::from).collect())
}

/// Every product, including inactive ones.
pub async fn list_all(
    conn: impl sqlx::Executor<'_, Database = Postgres>,
) -> Result<Vec<Product>, BoxError> {
    let rows: Vec<ProductRow> = sqlx::query_as(
        r#"
        SELECT id, name, slug, description, price, tags, category, gallery,
               availability, priority, is_active, metadata, created_at, updated_at
        FROM products
        ORDER BY priority DESC, name, id
        "#,
    )
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().map(Product::from).collect())
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Product>, BoxError> {
    let row: Option<ProductRow> = sqlx::query_as(
        r#"
        SELECT id, name, slug, description, price, tags, category, gallery,
               availability, priority, is_active, metadata, created_at, updated_at
        FROM products
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(Product::from))
}

pub async fn find_active_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Product>, BoxError> {
    let row: Option<ProductRow> = sqlx::query_as(
        r#"
        SELECT id, name, slug, description, price, tags, category, gallery,
               availability, priority, is_active, metadata, created_at, updated_at
        FROM products
        WHERE slug = $1 AND is_active
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(Product::from))
}

/// Whether another product already uses `slug`.
pub async fn slug_taken(
    pool: &PgPool,
    slug: &str,
    except_id: Option<&str>,
) -> Result<bool, BoxError> {
    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM products WHERE slug = $1 AND ($2::text IS NULL OR id <> $2))",
    )
    .bind(slug)
    .bind(except_id)
    .fetch_one(pool)
    .await?;
    Ok(taken)
}

pub async fn insert(pool: &PgPool, product: &Product) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO products (
            id, name, slug, description, price, tags, category, gallery,
            availability, priority, is_active, metadata, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#,
    )
    .bind(&product.id)
    .bind(&product.name)
    .bind(&product.slug)
    .bind(&product.description)
    .bind(product.price)
    .bind(&product.tags)
    .bind(&product.category)
    .bind(&product.gallery)
    .bind(product.availability.as_str())
    .bind(product.priority)
    .bind(product.is_active)
    .bind(Json(&product.metadata))
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Overwrite every editable column. Returns false when the id is unknown.
pub async fn update(pool: &PgPool, product: &Product) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE products SET
            name = $2, slug = $3, description = $4, price = $5, tags = $6,
            category = $7, gallery = $8, availability = $9, priority = $10,
            is_active = $11, metadata = $12, updated_at = $13
        WHERE id = $1
        "#,
    )
    .bind(&product.id)
    .bind(&product.name)
    .bind(&product.slug)
    .bind(&product.description)
    .bind(product.price)
    .bind(&product.tags)
    .bind(&product.category)
    .bind(&product.gallery)
    .bind(product.availability.as_str())
    .bind(product.priority)
    .bind(product.is_active)
    .bind(Json(&product.metadata))
    .bind(product.updated_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, BoxError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Apply (id, priority) pairs in one statement. Returns the rows touched.
pub async fn batch_update_priority(
    pool: &PgPool,
    items: &[ProductPriority],
) -> Result<u64, BoxError> {
    if items.is_empty() {
        return Ok(0);
    }
    let now = shared::util::now_millis();
    let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
    let priorities: Vec<i32> = items.iter().map(|i| i.priority).collect();
    let result = sqlx::query(
        r#"UPDATE products SET priority = u.priority, updated_at = $3
        FROM (SELECT * FROM UNNEST($1::text[], $2::integer[])) AS u(id, priority)
        WHERE products.id = u.id"#,
    )
    .bind(&ids)
    .bind(&priorities)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
