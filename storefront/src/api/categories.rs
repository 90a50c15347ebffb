//! Category administration
//!
//! Writes are checked against a snapshot of all categories read under the
//! category write lock, inside the transaction that applies them: the parent
//! must exist in the same scope, no cycles, and tag keys stay unique per
//! scope.

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use shared::catalog::validate::{validate_moves, validate_parent, validate_tag_key_unique};
use shared::catalog::{CategoryForest, MergePlan, build_category_tree, plan_merge};
use shared::error::{AppError, ErrorCode};
use shared::models::{Category, CategoryCreate, CategoryMerge, CategoryMove, CategoryUpdate};
use shared::util::new_id;

use super::{ApiResult, non_blank, required_text};
use crate::db;
use crate::error::ServiceError;
use crate::state::AppState;

fn not_found(id: &str) -> AppError {
    AppError::with_message(ErrorCode::CategoryNotFound, format!("Category {id} not found"))
        .with_detail("id", id)
}

fn tag_key_exists(category: &Category) -> AppError {
    AppError::with_message(
        ErrorCode::CategoryTagKeyExists,
        format!(
            "Tag key '{}' is already used in the {} scope",
            category.tag_key.as_deref().unwrap_or_default(),
            category.scope
        ),
    )
}

/// Map a unique-index violation on the tag key to its domain error.
fn write_error(e: sqlx::Error, category: &Category) -> ServiceError {
    if db::is_unique_violation(&e) {
        tag_key_exists(category).into()
    } else {
        e.into()
    }
}

/// GET /api/admin/categories
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Category>> {
    let categories = db::category::list_all(&state.pool).await?;
    Ok(Json(categories))
}

/// GET /api/admin/categories/tree
pub async fn tree(State(state): State<AppState>) -> ApiResult<CategoryForest> {
    let categories = db::category::list_all(&state.pool).await?;
    Ok(Json(build_category_tree(&categories)))
}

/// POST /api/admin/categories
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CategoryCreate>,
) -> ApiResult<Category> {
    let name = required_text(&payload.name, "name")?;
    let tag_key = non_blank(payload.tag_key);
    let parent_id = non_blank(payload.parent_id);

    let mut tx = state.pool.begin().await?;
    db::category::lock_for_write(&mut tx).await?;
    let categories = db::category::list_all(&mut *tx).await?;
    validate_parent(&categories, None, payload.scope, parent_id.as_deref())?;
    validate_tag_key_unique(&categories, None, payload.scope, tag_key.as_deref())?;

    // New categories go last among their siblings unless placed explicitly
    let sort_order = payload.sort_order.unwrap_or_else(|| {
        categories
            .iter()
            .filter(|c| c.scope == payload.scope && c.parent_id == parent_id)
            .map(|c| c.sort_order)
            .max()
            .map_or(0, |max| max + 1)
    });

    let category = Category {
        id: new_id(),
        scope: payload.scope,
        name,
        tag_key,
        parent_id,
        sort_order,
    };
    db::category::insert(&mut *tx, &category)
        .await
        .map_err(|e| write_error(e, &category))?;
    tx.commit().await?;

    tracing::info!(
        category_id = %category.id,
        scope = %category.scope,
        "Category created"
    );
    Ok(Json(category))
}

/// PUT /api/admin/categories/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<CategoryUpdate>,
) -> ApiResult<Category> {
    let mut tx = state.pool.begin().await?;
    db::category::lock_for_write(&mut tx).await?;
    let categories = db::category::list_all(&mut *tx).await?;
    let mut category = categories
        .iter()
        .find(|c| c.id == id)
        .cloned()
        .ok_or_else(|| not_found(&id))?;

    if let Some(name) = payload.name {
        category.name = required_text(&name, "name")?;
    }
    if let Some(tag_key) = payload.tag_key {
        category.tag_key = non_blank(tag_key);
    }
    if let Some(parent_id) = payload.parent_id {
        category.parent_id = non_blank(parent_id);
    }
    if let Some(sort_order) = payload.sort_order {
        category.sort_order = sort_order;
    }

    validate_parent(
        &categories,
        Some(category.id.as_str()),
        category.scope,
        category.parent_id.as_deref(),
    )?;
    validate_tag_key_unique(
        &categories,
        Some(category.id.as_str()),
        category.scope,
        category.tag_key.as_deref(),
    )?;

    let updated = db::category::update(&mut *tx, &category)
        .await
        .map_err(|e| write_error(e, &category))?;
    if !updated {
        return Err(not_found(&id).into());
    }
    tx.commit().await?;

    tracing::info!(category_id = %category.id, "Category updated");
    Ok(Json(category))
}

/// DELETE /api/admin/categories/{id}
///
/// Children move up to the deleted category's parent.
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<bool> {
    if !db::category::delete(&state.pool, &id).await? {
        return Err(not_found(&id).into());
    }
    tracing::info!(category_id = %id, "Category deleted");
    Ok(Json(true))
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub items: Vec<CategoryMove>,
}

/// PUT /api/admin/categories/reorder
///
/// Returns the forest as it looks after the moves.
pub async fn reorder(
    State(state): State<AppState>,
    Json(req): Json<ReorderRequest>,
) -> ApiResult<CategoryForest> {
    let moves: Vec<CategoryMove> = req
        .items
        .into_iter()
        .map(|m| CategoryMove {
            parent_id: non_blank(m.parent_id),
            ..m
        })
        .collect();

    let mut tx = state.pool.begin().await?;
    db::category::lock_for_write(&mut tx).await?;
    let categories = db::category::list_all(&mut *tx).await?;
    let moved = validate_moves(&categories, &moves)?;
    if !moves.is_empty() {
        db::category::batch_move(&mut *tx, &moves).await?;
        tracing::info!(count = moves.len(), "Categories reordered");
    }
    tx.commit().await?;
    Ok(Json(build_category_tree(&moved)))
}

/// POST /api/admin/categories/merge
pub async fn merge(
    State(state): State<AppState>,
    Json(req): Json<CategoryMerge>,
) -> ApiResult<MergePlan> {
    let mut tx = state.pool.begin().await?;
    db::category::lock_for_write(&mut tx).await?;
    let categories = db::category::list_all(&mut *tx).await?;
    let products = db::product::list_all(&mut *tx).await?;
    let plan = plan_merge(&categories, &products, &req)?;
    db::category::apply_merge(&mut tx, &plan).await?;
    tx.commit().await?;

    tracing::info!(
        target_id = %plan.target_id,
        merged = plan.delete.len(),
        reparented = plan.reparent.len(),
        retagged = plan.retag.len(),
        "Categories merged"
    );
    Ok(Json(plan))
}
