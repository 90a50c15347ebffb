//! Sales order database operations

use rust_decimal::Decimal;
use shared::models::{OrderStatus, SalesChannel, SalesOrder, SalesOrderItem};
use sqlx::PgPool;
use sqlx::types::Json;

use super::BoxError;

#[derive(sqlx::FromRow)]
struct SalesOrderRow {
    id: String,
    order_number: String,
    customer_name: String,
    customer_email: Option<String>,
    channel: String,
    status: String,
    items: Json<Vec<SalesOrderItem>>,
    total: Decimal,
    placed_at: i64,
    notes: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl From<SalesOrderRow> for SalesOrder {
    fn from(r: SalesOrderRow) -> Self {
        SalesOrder {
            channel: SalesChannel::parse(&r.channel).unwrap_or_default(),
            status: OrderStatus::parse(&r.status).unwrap_or_default(),
            id: r.id,
            order_number: r.order_number,
            customer_name: r.customer_name,
            customer_email: r.customer_email,
            items: r.items.0,
            total: r.total,
            placed_at: r.placed_at,
            notes: r.notes,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Orders, newest sale first, optionally narrowed to one status.
pub async fn list(pool: &PgPool, status: Option<OrderStatus>) -> Result<Vec<SalesOrder>, BoxError> {
    let rows: Vec<SalesOrderRow> = sqlx::query_as(
        r#"
        SELECT id, order_number, customer_name, customer_email, channel, status,
               items, total, placed_at, notes, created_at, updated_at
        FROM sales_orders
        WHERE ($1::text IS NULL OR status = $1)
        ORDER BY placed_at DESC, id
        "#,
    )
    .bind(status.map(|s| s.as_str()))
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(SalesOrder::from).collect())
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<SalesOrder>, BoxError> {
    let row: Option<SalesOrderRow> = sqlx::query_as(
        r#"
        SELECT id, order_number, customer_name, customer_email, channel, status,
               items, total, placed_at, notes, created_at, updated_at
        FROM sales_orders
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(SalesOrder::from))
}

/// Insert an order. Returns false when the order number already exists.
pub async fn insert(pool: &PgPool, order: &SalesOrder) -> Result<bool, BoxError> {
    let result = sqlx::query(
        r#"
        INSERT INTO sales_orders (
            id, order_number, customer_name, customer_email, channel, status,
            items, total, placed_at, notes, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (order_number) DO NOTHING
        "#,
    )
    .bind(&order.id)
    .bind(&order.order_number)
    .bind(&order.customer_name)
    .bind(&order.customer_email)
    .bind(order.channel.as_str())
    .bind(order.status.as_str())
    .bind(Json(&order.items))
    .bind(order.total)
    .bind(order.placed_at)
    .bind(&order.notes)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn update(pool: &PgPool, order: &SalesOrder) -> Result<bool, BoxError> {
    let result = sqlx::query(
        r#"
        UPDATE sales_orders SET
            customer_name = $2, customer_email = $3, channel = $4, status = $5,
            items = $6, total = $7, placed_at = $8, notes = $9, updated_at = $10
        WHERE id = $1
        "#,
    )
    .bind(&order.id)
    .bind(&order.customer_name)
    .bind(&order.customer_email)
    .bind(order.channel.as_str())
    .bind(order.status.as_str())
    .bind(Json(&order.items))
    .bind(order.total)
    .bind(order.placed_at)
    .bind(&order.notes)
    .bind(order.updated_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, BoxError> {
    let result = sqlx::query("DELETE FROM sales_orders WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
