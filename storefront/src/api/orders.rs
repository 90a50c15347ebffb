//! Sales orders and historical imports

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult, ErrorCode};
use rust_decimal::Decimal;
use shared::models::{
    OrderStatus, SalesOrder, SalesOrderCreate, SalesOrderItem, SalesOrderUpdate, money_in_range,
};
use shared::util::{new_id, now_millis};

use super::{ApiResult, non_blank, required_text};
use crate::db;
use crate::sales::{SkippedRow, parse_orders_csv};
use crate::state::AppState;

fn not_found(id: &str) -> AppError {
    AppError::with_message(ErrorCode::OrderNotFound, format!("Order {id} not found"))
        .with_detail("id", id)
}

fn number_exists(order_number: &str) -> AppError {
    AppError::with_message(
        ErrorCode::OrderNumberExists,
        format!("Order number '{order_number}' already exists"),
    )
    .with_detail("order_number", order_number)
}

fn check_amount(amount: Decimal, field: &'static str) -> AppResult<()> {
    if !money_in_range(amount) {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("{field} {amount} is too large"),
        )
        .with_detail("field", field));
    }
    Ok(())
}

fn check_items(items: &[SalesOrderItem]) -> AppResult<()> {
    for (i, item) in items.iter().enumerate() {
        if item.quantity == 0 {
            return Err(AppError::with_message(
                ErrorCode::ValueOutOfRange,
                format!("Line {} has quantity 0", i + 1),
            )
            .with_detail("field", "quantity"));
        }
        if item.description.trim().is_empty() {
            return Err(AppError::validation(format!("Line {} has no description", i + 1))
                .with_detail("field", "description"));
        }
        check_amount(item.unit_price, "unit_price")?;
    }
    Ok(())
}

/// Turn a create payload into a stored order.
fn build_order(payload: SalesOrderCreate, now: i64) -> AppResult<SalesOrder> {
    check_items(&payload.items)?;
    let total = payload.effective_total();
    check_amount(total, "total")?;
    Ok(SalesOrder {
        id: new_id(),
        order_number: non_blank(payload.order_number).unwrap_or_else(|| format!("SO-{}", new_id())),
        customer_name: required_text(&payload.customer_name, "customer_name")?,
        customer_email: non_blank(payload.customer_email),
        channel: payload.channel.unwrap_or_default(),
        status: payload.status.unwrap_or_default(),
        items: payload.items,
        total,
        placed_at: payload.placed_at.unwrap_or(now),
        notes: non_blank(payload.notes),
        created_at: now,
        updated_at: now,
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<String>,
}

/// GET /api/admin/orders
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> ApiResult<Vec<SalesOrder>> {
    let status = match non_blank(query.status) {
        Some(raw) => Some(OrderStatus::parse(&raw).ok_or_else(|| {
            AppError::validation(format!("Unknown order status '{raw}'"))
                .with_detail("field", "status")
        })?),
        None => None,
    };
    let orders = db::sales_order::list(&state.pool, status).await?;
    Ok(Json(orders))
}

/// GET /api/admin/orders/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<SalesOrder> {
    let order = db::sales_order::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| not_found(&id))?;
    Ok(Json(order))
}

/// POST /api/admin/orders
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<SalesOrderCreate>,
) -> ApiResult<SalesOrder> {
    let order = build_order(payload, now_millis())?;
    if !db::sales_order::insert(&state.pool, &order).await? {
        return Err(number_exists(&order.order_number).into());
    }
    tracing::info!(
        order_id = %order.id,
        order_number = %order.order_number,
        total = %order.total,
        "Sales order created"
    );
    Ok(Json(order))
}

/// PUT /api/admin/orders/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<SalesOrderUpdate>,
) -> ApiResult<SalesOrder> {
    let mut order = db::sales_order::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| not_found(&id))?;

    if let Some(name) = payload.customer_name {
        order.customer_name = required_text(&name, "customer_name")?;
    }
    if let Some(email) = payload.customer_email {
        order.customer_email = non_blank(email);
    }
    if let Some(channel) = payload.channel {
        order.channel = channel;
    }
    if let Some(status) = payload.status {
        order.status = status;
    }
    if let Some(items) = payload.items {
        check_items(&items)?;
        order.items = items;
        // Lines changed without an explicit total: recompute
        if payload.total.is_none() {
            order.total = order.items.iter().map(SalesOrderItem::line_total).sum();
        }
    }
    if let Some(total) = payload.total {
        order.total = total;
    }
    check_amount(order.total, "total")?;
    if let Some(placed_at) = payload.placed_at {
        order.placed_at = placed_at;
    }
    if let Some(notes) = payload.notes {
        order.notes = non_blank(notes);
    }
    order.updated_at = now_millis();

    if !db::sales_order::update(&state.pool, &order).await? {
        return Err(not_found(&id).into());
    }
    tracing::info!(order_id = %order.id, status = order.status.as_str(), "Sales order updated");
    Ok(Json(order))
}

/// DELETE /api/admin/orders/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<bool> {
    if !db::sales_order::delete(&state.pool, &id).await? {
        return Err(not_found(&id).into());
    }
    tracing::info!(order_id = %id, "Sales order deleted");
    Ok(Json(true))
}

/// Result of a CSV import
#[derive(Debug, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    /// Orders whose number was already stored (earlier import of the same file)
    pub duplicates: usize,
    pub skipped: Vec<SkippedRow>,
}

/// POST /api/admin/orders/import
///
/// Body is the raw CSV text. Orders are stored one by one; an order that
/// cannot be built or stored is reported with the rows the parser left out.
pub async fn import(State(state): State<AppState>, body: String) -> ApiResult<ImportReport> {
    let outcome = parse_orders_csv(&body).map_err(AppError::from)?;
    let now = now_millis();

    let mut report = ImportReport {
        imported: 0,
        duplicates: 0,
        skipped: outcome.skipped,
    };
    for parsed in outcome.orders {
        let order = match build_order(parsed.order, now) {
            Ok(order) => order,
            Err(e) => {
                report.skipped.push(SkippedRow {
                    line: parsed.line,
                    reason: e.message,
                });
                continue;
            }
        };
        match db::sales_order::insert(&state.pool, &order).await {
            Ok(true) => report.imported += 1,
            Ok(false) => report.duplicates += 1,
            Err(e) => {
                tracing::warn!(
                    line = parsed.line,
                    order_number = %order.order_number,
                    error = %e,
                    "Imported order could not be stored"
                );
                report.skipped.push(SkippedRow {
                    line: parsed.line,
                    reason: format!("order {} could not be stored", order.order_number),
                });
            }
        }
    }
    report.skipped.sort_by_key(|row| row.line);

    tracing::info!(
        imported = report.imported,
        duplicates = report.duplicates,
        skipped = report.skipped.len(),
        "Sales import finished"
    );
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use shared::models::SalesChannel;

    fn payload() -> SalesOrderCreate {
        SalesOrderCreate {
            order_number: None,
            customer_name: "  Lucía ".into(),
            customer_email: Some("".into()),
            channel: Some(SalesChannel::Market),
            status: None,
            items: vec![SalesOrderItem {
                product_id: None,
                description: "Cojín".into(),
                quantity: 2,
                unit_price: Decimal::new(1250, 2),
            }],
            total: None,
            placed_at: None,
            notes: None,
        }
    }

    #[test]
    fn test_build_order_defaults() {
        let order = build_order(payload(), 1_000).unwrap();
        assert!(order.order_number.starts_with("SO-"));
        assert_eq!(order.customer_name, "Lucía");
        assert_eq!(order.customer_email, None);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total, Decimal::new(2500, 2));
        assert_eq!(order.placed_at, 1_000);
    }

    #[test]
    fn test_build_order_rejects_bad_lines() {
        let mut p = payload();
        p.items[0].quantity = 0;
        assert_eq!(build_order(p, 0).unwrap_err().code, ErrorCode::ValueOutOfRange);

        let mut p = payload();
        p.customer_name = " ".into();
        assert_eq!(build_order(p, 0).unwrap_err().code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn test_build_order_rejects_amounts_too_large_to_store() {
        let mut p = payload();
        p.total = Some(Decimal::from_str("123456789012.00").unwrap());
        let err = build_order(p, 0).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueOutOfRange);

        let mut p = payload();
        p.items[0].unit_price = Decimal::from_str("99999999999").unwrap();
        assert_eq!(build_order(p, 0).unwrap_err().code, ErrorCode::ValueOutOfRange);
    }

    #[test]
    fn test_imported_orders_keep_their_numbers() {
        let outcome = parse_orders_csv("pedido,fecha,total\nA-7,2024-01-02,10\n").unwrap();
        let order = build_order(outcome.orders[0].order.clone(), 0).unwrap();
        assert_eq!(order.order_number, "A-7");
        assert_eq!(order.customer_name, "Unknown");
    }
}
