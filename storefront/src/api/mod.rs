//! HTTP API for the storefront
//!
//! Public read routes for the shop front plus the `/api/admin` tree used by
//! the back office.

pub mod banners;
pub mod catalog;
pub mod categories;
pub mod health;
pub mod media;
pub mod orders;
pub mod posts;
pub mod products;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use http::HeaderValue;
use shared::error::AppError;
use shared::util::slugify;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::ServiceError;
use crate::state::AppState;

pub(crate) type ApiResult<T> = Result<Json<T>, ServiceError>;

/// Multipart framing on top of the largest accepted file
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/api/catalog/products", get(catalog::list_products))
        .route("/api/catalog/products/{slug}", get(catalog::get_product))
        .route("/api/catalog/categories", get(catalog::list_categories))
        .route("/api/banners", get(banners::list_live))
        .route("/api/posts", get(posts::list_published))
        .route("/api/posts/{slug}", get(posts::get_published));

    let admin = Router::new()
        .route("/products", get(products::list).post(products::create))
        .route("/products/reorder", put(products::reorder))
        .route(
            "/products/{id}",
            get(products::get_by_id)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/categories", get(categories::list).post(categories::create))
        .route("/categories/tree", get(categories::tree))
        .route("/categories/reorder", put(categories::reorder))
        .route("/categories/merge", post(categories::merge))
        .route(
            "/categories/{id}",
            put(categories::update).delete(categories::delete),
        )
        .route("/banners", get(banners::list).post(banners::create))
        .route(
            "/banners/{id}",
            get(banners::get_by_id)
                .put(banners::update)
                .delete(banners::delete),
        )
        .route("/posts", get(posts::list).post(posts::create))
        .route(
            "/posts/{id}",
            get(posts::get_by_id).put(posts::update).delete(posts::delete),
        )
        .route("/orders", get(orders::list).post(orders::create))
        .route("/orders/import", post(orders::import))
        .route(
            "/orders/{id}",
            get(orders::get_by_id)
                .put(orders::update)
                .delete(orders::delete),
        )
        .route(
            "/media",
            get(media::list).post(media::upload).layer(DefaultBodyLimit::max(
                state.max_upload_bytes + MULTIPART_OVERHEAD,
            )),
        )
        .route("/media/{id}", axum::routing::delete(media::delete));

    let cors = cors_layer(state.cors_allowed_origin.as_deref());

    Router::new()
        .route("/health", get(health::health_check))
        .merge(public)
        .nest("/api/admin", admin)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Exact origin when configured, anything otherwise.
fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match origin.and_then(|o| HeaderValue::from_str(o).ok()) {
        Some(origin) => layer.allow_origin(origin),
        None => layer.allow_origin(Any),
    }
}

/// Trimmed value, `None` when blank.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trimmed required text, or a validation error naming the field.
pub(crate) fn required_text(value: &str, field: &'static str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(
            AppError::validation(format!("{field} must not be empty")).with_detail("field", field)
        );
    }
    Ok(trimmed.to_string())
}

/// Explicit slug when given, otherwise derived from `fallback`.
pub(crate) fn resolve_slug(explicit: Option<&str>, fallback: &str) -> Result<String, AppError> {
    let slug = slugify(explicit.filter(|s| !s.trim().is_empty()).unwrap_or(fallback));
    if slug.is_empty() {
        return Err(AppError::validation("Slug must contain letters or digits")
            .with_detail("field", "slug"));
    }
    Ok(slug)
}

/// Comma-separated query values, blanks dropped.
pub(crate) fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use http::{Method, Request, StatusCode};
    use tower::ServiceExt;

    async fn send(
        method: Method,
        uri: &str,
        content_type: &str,
        body: &str,
    ) -> (StatusCode, serde_json::Value) {
        let router = create_router(AppState::for_tests());
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(http::header::CONTENT_TYPE, content_type)
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(Method::GET, "/health", "application/json", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "storefront");
    }

    #[tokio::test]
    async fn test_import_rejects_unusable_csv() {
        let (status, body) = send(
            Method::POST,
            "/api/admin/orders/import",
            "text/csv",
            "cliente;notas\nAna;hola\n",
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], 4003);
    }

    #[tokio::test]
    async fn test_import_reports_rows_instead_of_failing() {
        // No database behind the test state: storable rows are reported too
        let (status, body) = send(
            Method::POST,
            "/api/admin/orders/import",
            "text/csv",
            "Fecha;Importe\n06/03/2024;123.456.789.012,00\n07/03/2024;15,00\n",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["imported"], 0);
        let skipped = body["skipped"].as_array().unwrap();
        assert_eq!(skipped.len(), 2);
        assert_eq!(skipped[0]["line"], 2);
        assert_eq!(skipped[0]["reason"], "amount out of range '123.456.789.012,00'");
        assert_eq!(skipped[1]["line"], 3);
    }

    #[tokio::test]
    async fn test_product_price_too_large_is_rejected() {
        let (status, body) = send(
            Method::POST,
            "/api/admin/products",
            "application/json",
            r#"{"name": "Tapiz", "price": "123456789012.00"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 8);
    }

    #[tokio::test]
    async fn test_product_validation_runs_before_storage() {
        let (status, body) = send(
            Method::POST,
            "/api/admin/products",
            "application/json",
            r#"{"name": "Cojín", "price": "-1"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 1003);

        let (status, _) = send(
            Method::POST,
            "/api/admin/products",
            "application/json",
            r#"{"name": "   ", "price": "10"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_banner_schedule_checked() {
        let (status, body) = send(
            Method::POST,
            "/api/admin/banners",
            "application/json",
            r#"{"title": "Rebajas", "image_path": "banners/r.jpg",
                "starts_at": 200, "ends_at": 100}"#,
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], 2002);
    }

    #[tokio::test]
    async fn test_order_status_filter_validated() {
        let (status, _) = send(
            Method::GET,
            "/api/admin/orders?status=lost",
            "application/json",
            "",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (status, _) = send(Method::GET, "/api/nothing-here", "application/json", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(Some(" bordados, ,rayas ")), vec!["bordados", "rayas"]);
        assert!(split_list(None).is_empty());
    }

    #[test]
    fn test_resolve_slug() {
        assert_eq!(resolve_slug(None, "Cojín Añil").unwrap(), "cojin-anil");
        assert_eq!(resolve_slug(Some("  "), "Bolso").unwrap(), "bolso");
        assert_eq!(resolve_slug(Some("Mi Slug!"), "Bolso").unwrap(), "mi-slug");
        assert_eq!(
            resolve_slug(None, "¡¿?!").unwrap_err().code,
            shared::error::ErrorCode::ValidationFailed
        );
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  x ".into())).as_deref(), Some("x"));
        assert_eq!(non_blank(Some("   ".into())), None);
    }
}
