use crate::{AppState, handlers};
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any
/// client (anonymous or logged-in). These are the storefront's read paths:
/// the catalog, testimonials and page content, plus liveness endpoints for
/// monitoring and load balancer checks.
/// root_info
///
/// Service info for the API root. Also registered under `/api/` at the top
/// level, since nesting only exposes the slash-less form of the prefix.
pub async fn root_info() -> Json<Value> {
    Json(json!({ "message": "Zouqly API" }))
}

/// health
///
/// Returns immediately to verify the service is running and responsive.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /
        .route("/", get(root_info))
        // GET /health
        .route("/health", get(health))
        // GET /categories
        .route("/categories", get(handlers::list_categories))
        // GET /products?category_id=...
        // Supports an exact-equality category filter.
        .route("/products", get(handlers::list_products))
        // GET /products/{id}
        // 404 if the id is absent.
        .route("/products/{id}", get(handlers::get_product))
        // GET /testimonials
        .route("/testimonials", get(handlers::list_testimonials))
        // GET /content/{page}
        // Unknown pages respond 200 with empty content, never 404.
        .route("/content/{page}", get(handlers::get_content))
}
