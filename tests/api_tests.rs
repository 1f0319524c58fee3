use std::sync::Arc;

use serde_json::{Value, json};
use tokio::net::TcpListener;
use zouqly_api::{
    AppConfig, AppState, MockStorageService, MockVerifier, create_router,
    auth::{Identity, VerifierState},
    models::Category,
    storage::StorageState,
    store::{MemoryStore, StoreState},
};

pub struct TestApp {
    pub address: String,
}

/// Spawns the full router on an ephemeral port, backed by the in-memory
/// store and a mock identity verifier, so these tests exercise the real
/// HTTP stack without any external services.
async fn spawn_app() -> TestApp {
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
                "customer-token",
                Identity {
                    id: "user-1".to_string(),
                    email: "customer@zouqly.test".to_string(),
                    role: "user".to_string(),
                },
            ),
    ) as VerifierState;
    let storage = Arc::new(MockStorageService::new()) as StorageState;

    let state = AppState {
        store,
        verifier,
        storage,
        config: AppConfig::default(),
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address }
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/api/health", app.address))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_root_info() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    // Both path forms of the API root must answer.
    for uri in [format!("{}/api", app.address), format!("{}/api/", app.address)] {
        let response = client.get(&uri).send().await.unwrap();
        assert!(response.status().is_success(), "expected 200 for {uri}");
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["message"], "Zouqly API");
    }
}

#[tokio::test]
async fn test_category_lifecycle() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    // Create
    let response = client
        .post(format!("{}/api/categories", app.address))
        .bearer_auth("admin-token")
        .json(&json!({ "name": "Spices", "description": "Whole and ground" }))
        .send()
        .await
        .expect("post fail");
    assert_eq!(response.status(), 200);
    let created: Category = response.json().await.unwrap();
    assert!(!created.id.is_empty());
    assert_eq!(created.name, "Spices");

    // Public listing includes it
    let list: Vec<Category> = client
        .get(format!("{}/api/categories", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(list.iter().any(|c| c.id == created.id));

    // Full-replace update: description omitted from the payload disappears.
    let updated: Category = client
        .put(format!("{}/api/categories/{}", app.address, created.id))
        .bearer_auth("admin-token")
        .json(&json!({ "name": "Spices & Herbs" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated.name, "Spices & Herbs");
    assert_eq!(updated.description, None);
    assert_eq!(updated.id, created.id);

    // Delete, then deleting again reports 404.
    let response = client
        .delete(format!("{}/api/categories/{}", app.address, created.id))
        .bearer_auth("admin-token")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = client
        .delete(format!("{}/api/categories/{}", app.address, created.id))
        .bearer_auth("admin-token")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "Category not found");
}

#[tokio::test]
async fn test_unknown_product_is_404() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/api/products/doesnotexist", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "Product not found");
}

#[tokio::test]
async fn test_unknown_content_page_is_empty_success() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/api/content/shipping-policy", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["page"], "shipping-policy");
    assert_eq!(body["content"], "");
}
