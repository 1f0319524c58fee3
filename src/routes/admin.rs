use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, post, put},
};

/// Admin Router Module
///
/// Defines the write surface of the storefront: everything that mutates
/// categories, products, orders, testimonials, page content or uploaded
/// media is restricted to the 'admin' role (order creation being the one
/// exception, which lives in the authenticated group).
///
/// Access Control:
/// Every handler registered here takes the `AdminUser` extractor, which
/// first authenticates (401) and then checks the role (403). The routes are
/// merged with the public group per-method, so e.g. GET /categories stays
/// anonymous while POST /categories requires admin.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // POST /categories, PUT/DELETE /categories/{id}
        .route("/categories", post(handlers::create_category))
        .route(
            "/categories/{id}",
            put(handlers::update_category).delete(handlers::delete_category),
        )
        // POST /products, PUT/DELETE /products/{id}
        // Updates carry full-document replace semantics.
        .route("/products", post(handlers::create_product))
        .route(
            "/products/{id}",
            put(handlers::update_product).delete(handlers::delete_product),
        )
        // POST /upload
        // Multipart file upload into object storage; responds with the
        // public URL of the stored object.
        .route("/upload", post(handlers::upload_file))
        // PUT/DELETE /orders/{id}
        // PUT patches payment_status/delivery_status from query parameters,
        // each independently and only when present.
        .route(
            "/orders/{id}",
            put(handlers::update_order_status).delete(handlers::delete_order),
        )
        // POST /testimonials, DELETE /testimonials/{id}
        .route("/testimonials", post(handlers::create_testimonial))
        .route("/testimonials/{id}", delete(handlers::delete_testimonial))
        // PUT /content/{page}
        // Upsert keyed by page name.
        .route("/content/{page}", put(handlers::update_content))
}
