use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::util::ServiceExt;
use zouqly_api::{
    AppConfig, AppState, MockStorageService, MockVerifier, create_router,
    auth::{Identity, VerifierState},
    storage::StorageState,
    store::{MemoryStore, StoreState},
};

fn app() -> Router {
    let store = Arc::new(MemoryStore::new()) as StoreState;
    let verifier = Arc::new(
        MockVerifier::new()
            .with_user(
                "admin-token",
                Identity {
                    id: "admin-1".to_string(),
                    email: "admin@zouqly.test".to_string(),
                    role: "admin".to_string(),
                },
            )
            .with_user(
                "alice-token",
                Identity {
                    id: "user-alice".to_string(),
                    email: "alice@zouqly.test".to_string(),
                    role: "user".to_string(),
                },
            ),
    ) as VerifierState;
    let storage = Arc::new(MockStorageService::new()) as StorageState;

    create_router(AppState {
        store,
        verifier,
        storage,
        config: AppConfig::default(),
    })
}

/// Fires one request at the router and returns (status, parsed JSON body).
async fn send(
    app: Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

fn sample_product() -> Value {
    json!({
        "name": "Saffron Threads",
        "weight": "10g",
        "price": 24.5,
        "description": "Hand-picked premium saffron",
        "features": ["Grade A", "Harvested 2026"],
        "category_id": "cat-spices",
        "tags": ["premium", "gift"],
        "image_url": "http://cdn.zouqly.test/saffron.jpg",
        "stock": 12
    })
}

#[tokio::test]
async fn create_then_fetch_product_preserves_fields() {
    let app = app();

    let (status, created) = send(
        app.clone(),
        "POST",
        "/api/products",
        Some("admin-token"),
        Some(sample_product()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Server-assigned fields are present and non-empty.
    let id = created["id"].as_str().unwrap();
    assert!(!id.is_empty());
    assert!(!created["created_at"].as_str().unwrap().is_empty());

    let (status, fetched) = send(
        app.clone(),
        "GET",
        &format!("/api/products/{id}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn product_list_filters_by_category_exactly() {
    let app = app();

    let mut saffron = sample_product();
    saffron["category_id"] = json!("cat-spices");
    let mut teapot = sample_product();
    teapot["name"] = json!("Teapot");
    teapot["category_id"] = json!("cat-kitchen");

    for payload in [saffron, teapot] {
        let (status, _) = send(
            app.clone(),
            "POST",
            "/api/products",
            Some("admin-token"),
            Some(payload),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, filtered) = send(
        app.clone(),
        "GET",
        "/api/products?category_id=cat-kitchen",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let filtered = filtered.as_array().unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["name"], "Teapot");

    // No filter returns everything.
    let (_, all) = send(app.clone(), "GET", "/api/products", None, None).await;
    assert_eq!(all.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn product_update_is_full_replace() {
    let app = app();

    let (_, created) = send(
        app.clone(),
        "POST",
        "/api/products",
        Some("admin-token"),
        Some(sample_product()),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["stock"], 12);

    // Update omits tags, image_url and stock: defaults/nulls must win.
    let (status, updated) = send(
        app.clone(),
        "PUT",
        &format!("/api/products/{id}"),
        Some("admin-token"),
        Some(json!({
            "name": "Saffron Threads",
            "weight": "10g",
            "price": 19.0,
            "description": "Reduced to clear",
            "features": [],
            "category_id": "cat-spices"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["price"], 19.0);
    assert_eq!(updated["tags"], json!([]));
    assert_eq!(updated["image_url"], Value::Null);
    assert_eq!(updated["stock"], 0);
    // Server-assigned fields survive the replace.
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["created_at"], created["created_at"]);
}

#[tokio::test]
async fn order_status_fields_patch_independently() {
    let app = app();

    let (status, order) = send(
        app.clone(),
        "POST",
        "/api/orders",
        Some("alice-token"),
        Some(json!({
            "items": [
                { "product_id": "p-1", "product_name": "Saffron", "quantity": 2, "price": 24.5 }
            ],
            "total_amount": 49.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = order["id"].as_str().unwrap().to_string();
    assert_eq!(order["payment_status"], "Pending");
    assert_eq!(order["delivery_status"], "Order Placed");

    // Patch only delivery_status: payment_status must be untouched.
    let (status, patched) = send(
        app.clone(),
        "PUT",
        &format!("/api/orders/{id}?delivery_status=Shipped"),
        Some("admin-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["delivery_status"], "Shipped");
    assert_eq!(patched["payment_status"], "Pending");

    // Supplying neither leaves both unchanged (still 200).
    let (status, unchanged) = send(
        app.clone(),
        "PUT",
        &format!("/api/orders/{id}"),
        Some("admin-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unchanged["delivery_status"], "Shipped");
    assert_eq!(unchanged["payment_status"], "Pending");

    // Patch only payment_status.
    let (_, paid) = send(
        app.clone(),
        "PUT",
        &format!("/api/orders/{id}?payment_status=Paid"),
        Some("admin-token"),
        None,
    )
    .await;
    assert_eq!(paid["payment_status"], "Paid");
    assert_eq!(paid["delivery_status"], "Shipped");
}

#[tokio::test]
async fn blank_order_status_params_are_ignored() {
    let app = app();

    let (_, order) = send(
        app.clone(),
        "POST",
        "/api/orders",
        Some("alice-token"),
        Some(json!({
            "items": [
                { "product_id": "p-1", "product_name": "Saffron", "quantity": 1, "price": 24.5 }
            ],
            "total_amount": 24.5
        })),
    )
    .await;
    let id = order["id"].as_str().unwrap().to_string();

    // An empty value counts as absent, not as "set to empty string".
    let (status, unchanged) = send(
        app.clone(),
        "PUT",
        &format!("/api/orders/{id}?payment_status=&delivery_status=Shipped"),
        Some("admin-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unchanged["payment_status"], "Pending");
    assert_eq!(unchanged["delivery_status"], "Shipped");
}

#[tokio::test]
async fn deleting_nonexistent_ids_yields_not_found() {
    let app = app();

    for uri in [
        "/api/categories/missing",
        "/api/products/missing",
        "/api/orders/missing",
        "/api/testimonials/missing",
    ] {
        let (status, body) = send(app.clone(), "DELETE", uri, Some("admin-token"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "expected 404 for {uri}");
        assert!(body["detail"].as_str().unwrap().ends_with("not found"));
    }
}

#[tokio::test]
async fn testimonial_rating_out_of_range_is_rejected() {
    let app = app();

    let (status, body) = send(
        app.clone(),
        "POST",
        "/api/testimonials",
        Some("admin-token"),
        Some(json!({ "name": "Test", "rating": 10, "comment": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"], "rating must be between 1 and 5");

    // Nothing was stored.
    let (_, list) = send(app.clone(), "GET", "/api/testimonials", None, None).await;
    assert_eq!(list.as_array().unwrap().len(), 0);

    // The boundaries themselves are valid.
    for rating in [1, 5] {
        let (status, _) = send(
            app.clone(),
            "POST",
            "/api/testimonials",
            Some("admin-token"),
            Some(json!({ "name": "Test", "rating": rating, "comment": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn content_upsert_creates_then_rewrites() {
    let app = app();

    let (status, first) = send(
        app.clone(),
        "PUT",
        "/api/content/about",
        Some("admin-token"),
        Some(json!({ "page": "about", "content": "First draft" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["page"], "about");
    assert_eq!(first["content"], "First draft");

    let (status, second) = send(
        app.clone(),
        "PUT",
        "/api/content/about",
        Some("admin-token"),
        Some(json!({ "page": "about", "content": "Final copy" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Each write stamps a fresh id.
    assert_ne!(first["id"], second["id"]);

    let (status, fetched) = send(app.clone(), "GET", "/api/content/about", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["content"], "Final copy");
    assert_eq!(fetched["id"], second["id"]);
}

#[tokio::test]
async fn content_path_parameter_wins_over_body_page() {
    let app = app();

    let (_, written) = send(
        app.clone(),
        "PUT",
        "/api/content/faq",
        Some("admin-token"),
        Some(json!({ "page": "something-else", "content": "Q&A" })),
    )
    .await;
    assert_eq!(written["page"], "faq");

    let (_, fetched) = send(app.clone(), "GET", "/api/content/faq", None, None).await;
    assert_eq!(fetched["content"], "Q&A");
}

#[tokio::test]
async fn empty_order_is_rejected() {
    let app = app();

    let (status, body) = send(
        app.clone(),
        "POST",
        "/api/orders",
        Some("alice-token"),
        Some(json!({ "items": [], "total_amount": 0.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"], "items must not be empty");
}

#[tokio::test]
async fn nonpositive_product_price_is_rejected() {
    let app = app();

    let mut payload = sample_product();
    payload["price"] = json!(0.0);
    let (status, body) = send(
        app.clone(),
        "POST",
        "/api/products",
        Some("admin-token"),
        Some(payload),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"], "price must be a positive number");
}
