//! Product administration

use axum::Json;
use axum::extract::{Path, State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    Product, ProductCreate, ProductPriority, ProductUpdate, clean_tags, money_in_range,
};
use shared::util::{new_id, now_millis};

use super::{ApiResult, non_blank, required_text, resolve_slug};
use crate::db;
use crate::error::ServiceResult;
use crate::state::AppState;

fn not_found(id: &str) -> AppError {
    AppError::with_message(ErrorCode::ProductNotFound, format!("Product {id} not found"))
        .with_detail("id", id)
}

fn slug_exists(slug: &str) -> AppError {
    AppError::with_message(
        ErrorCode::ProductSlugExists,
        format!("Slug '{slug}' is already in use"),
    )
    .with_detail("slug", slug)
}

fn check_price(price: Decimal) -> AppResult<()> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(AppError::with_message(
            ErrorCode::ProductInvalidPrice,
            format!("Price must not be negative, got {price}"),
        )
        .with_detail("field", "price"));
    }
    if !money_in_range(price) {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("Price {price} is too large"),
        )
        .with_detail("field", "price"));
    }
    Ok(())
}

fn clean_gallery(paths: Vec<String>) -> Vec<String> {
    paths
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

async fn save(state: &AppState, product: &Product, is_new: bool) -> ServiceResult<()> {
    let except_id = (!is_new).then_some(product.id.as_str());
    if db::product::slug_taken(&state.pool, &product.slug, except_id).await? {
        return Err(slug_exists(&product.slug).into());
    }
    let result = if is_new {
        db::product::insert(&state.pool, product).await
    } else {
        match db::product::update(&state.pool, product).await {
            Ok(true) => Ok(()),
            Ok(false) => return Err(not_found(&product.id).into()),
            Err(e) => Err(e),
        }
    };
    match result {
        Ok(()) => Ok(()),
        // Lost a race with a concurrent write of the same slug
        Err(e) if db::is_unique_violation(&e) => Err(slug_exists(&product.slug).into()),
        Err(e) => Err(e.into()),
    }
}

/// GET /api/admin/products
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Product>> {
    let products = db::product::list_all(&state.pool).await?;
    Ok(Json(products))
}

/// GET /api/admin/products/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Product> {
    let product = db::product::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| not_found(&id))?;
    Ok(Json(product))
}

/// POST /api/admin/products
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<ProductCreate>,
) -> ApiResult<Product> {
    let name = required_text(&payload.name, "name")?;
    check_price(payload.price)?;
    let slug = resolve_slug(payload.slug.as_deref(), &name)?;

    let now = now_millis();
    let product = Product {
        id: new_id(),
        name,
        slug,
        description: non_blank(payload.description),
        price: payload.price,
        tags: clean_tags(payload.tags),
        category: non_blank(payload.category),
        gallery: clean_gallery(payload.gallery),
        availability: payload.availability.unwrap_or_default(),
        priority: payload.priority.unwrap_or(0),
        is_active: payload.is_active.unwrap_or(true),
        metadata: payload.metadata.unwrap_or_default(),
        created_at: now,
        updated_at: now,
    };
    save(&state, &product, true).await?;

    tracing::info!(product_id = %product.id, slug = %product.slug, "Product created");
    Ok(Json(product))
}

/// PUT /api/admin/products/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ProductUpdate>,
) -> ApiResult<Product> {
    let mut product = db::product::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| not_found(&id))?;

    if let Some(name) = payload.name {
        product.name = required_text(&name, "name")?;
    }
    if let Some(slug) = payload.slug {
        product.slug = resolve_slug(Some(&slug), &product.name)?;
    }
    if let Some(price) = payload.price {
        check_price(price)?;
        product.price = price;
    }
    if let Some(description) = payload.description {
        product.description = non_blank(description);
    }
    if let Some(tags) = payload.tags {
        product.tags = clean_tags(tags);
    }
    if let Some(category) = payload.category {
        product.category = non_blank(category);
    }
    if let Some(gallery) = payload.gallery {
        product.gallery = clean_gallery(gallery);
    }
    if let Some(availability) = payload.availability {
        product.availability = availability;
    }
    if let Some(priority) = payload.priority {
        product.priority = priority;
    }
    if let Some(is_active) = payload.is_active {
        product.is_active = is_active;
    }
    if let Some(metadata) = payload.metadata {
        product.metadata = metadata;
    }
    product.updated_at = now_millis();

    save(&state, &product, false).await?;

    tracing::info!(product_id = %product.id, "Product updated");
    Ok(Json(product))
}

/// DELETE /api/admin/products/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<bool> {
    if !db::product::delete(&state.pool, &id).await? {
        return Err(not_found(&id).into());
    }
    tracing::info!(product_id = %id, "Product deleted");
    Ok(Json(true))
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub items: Vec<ProductPriority>,
}

#[derive(Debug, Serialize)]
pub struct ReorderResult {
    pub updated: u64,
}

/// PUT /api/admin/products/reorder
pub async fn reorder(
    State(state): State<AppState>,
    Json(req): Json<ReorderRequest>,
) -> ApiResult<ReorderResult> {
    let mut seen = std::collections::HashSet::new();
    if let Some(dup) = req.items.iter().find(|i| !seen.insert(i.id.as_str())) {
        return Err(
            AppError::validation(format!("Product {} appears more than once", dup.id)).into(),
        );
    }
    let updated = db::product::batch_update_priority(&state.pool, &req.items).await?;
    tracing::info!(requested = req.items.len(), updated, "Products reordered");
    Ok(Json(ReorderResult { updated }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_check_price() {
        assert!(check_price(Decimal::ZERO).is_ok());
        assert!(check_price(Decimal::from_str("24.90").unwrap()).is_ok());
        let err = check_price(Decimal::from_str("-0.01").unwrap()).unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductInvalidPrice);
        let err = check_price(Decimal::from_str("10000000000").unwrap()).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueOutOfRange);
    }

    #[test]
    fn test_clean_gallery() {
        let gallery = clean_gallery(vec![" a.jpg ".into(), "".into(), "b.png".into()]);
        assert_eq!(gallery, vec!["a.jpg", "b.png"]);
    }
}
