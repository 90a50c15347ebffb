//! Public catalog
//!
//! Every request loads its own product and category snapshot and derives
//! display categories, tag filters and search from it.

use axum::Json;
use axum::extract::{Path, Query, State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::catalog::{
    CategoryForest, SearchQuery, apply_display_categories, build_category_tree, expand_selection,
    filter_products_by_tags, resolve_display_category,
};
use shared::error::{AppError, ErrorCode};
use shared::media::ImageSet;
use shared::models::{Availability, Category, CategoryScope, Product, ProductMetadata};

use super::{ApiResult, split_list};
use crate::db;
use crate::state::{AppState, MediaStore};

#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    /// Comma-separated tag keys (any of them matches)
    pub tags: Option<String>,
    /// Comma-separated category ids; each selects its whole subtree
    pub category: Option<String>,
    /// Free-text search
    pub q: Option<String>,
}

/// Product as listed in the catalog grid
#[derive(Debug, Serialize)]
pub struct ProductCard {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub availability: Availability,
    pub image: Option<ImageSet>,
}

impl ProductCard {
    fn new(product: &Product, media: &MediaStore) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            slug: product.slug.clone(),
            price: product.price,
            category: product.category.clone(),
            tags: product.tags.clone(),
            availability: product.availability,
            image: product.gallery.first().and_then(|p| media.image_set(p)),
        }
    }
}

/// Product page payload
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub availability: Availability,
    pub metadata: ProductMetadata,
    pub images: Vec<ImageSet>,
}

fn split_scopes(categories: &[Category]) -> (Vec<Category>, Vec<Category>) {
    categories
        .iter()
        .cloned()
        .partition(|c| c.scope == CategoryScope::Header)
}

/// GET /api/catalog/products
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> ApiResult<Vec<ProductCard>> {
    let (mut products, categories) = tokio::try_join!(
        db::product::list_active(&state.pool),
        db::category::list_all(&state.pool),
    )?;

    let (header, filter) = split_scopes(&categories);
    apply_display_categories(&mut products, &header, &filter);

    let tags = split_list(query.tags.as_deref());
    let category_ids = split_list(query.category.as_deref());
    let forest = build_category_tree(&categories);
    let selection = expand_selection(&forest, &tags, &category_ids);

    // A category selection with no tag keys underneath matches nothing
    if selection.is_empty() && !category_ids.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let search = SearchQuery::parse(query.q.as_deref().unwrap_or(""));
    let cards: Vec<ProductCard> = filter_products_by_tags(&products, &selection)
        .into_iter()
        .filter(|p| search.matches(p))
        .map(|p| ProductCard::new(p, &state.media))
        .collect();

    tracing::debug!(
        total = products.len(),
        shown = cards.len(),
        selection = ?selection,
        "Catalog listing"
    );
    Ok(Json(cards))
}

/// GET /api/catalog/products/{slug}
pub async fn get_product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<ProductDetail> {
    let (product, categories) = tokio::try_join!(
        db::product::find_active_by_slug(&state.pool, &slug),
        db::category::list_all(&state.pool),
    )?;
    let product = product.ok_or_else(|| {
        AppError::with_message(ErrorCode::ProductNotFound, format!("Product '{slug}' not found"))
    })?;

    let (header, filter) = split_scopes(&categories);
    let category = resolve_display_category(&product, &header, &filter);
    let images = product
        .gallery
        .iter()
        .filter_map(|p| state.media.image_set(p))
        .collect();

    Ok(Json(ProductDetail {
        id: product.id,
        name: product.name,
        slug: product.slug,
        description: product.description,
        price: product.price,
        category,
        tags: product.tags,
        availability: product.availability,
        metadata: product.metadata,
        images,
    }))
}

/// GET /api/catalog/categories
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<CategoryForest> {
    let categories = db::category::list_all(&state.pool).await?;
    Ok(Json(build_category_tree(&categories)))
}
