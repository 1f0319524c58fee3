use axum::{
    Router,
    extract::{FromRef, Request},
    http::{HeaderName, HeaderValue},
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod storage;
pub mod store;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::AuthUser; // The resolved authenticated user identity.
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the main application entry point (main.rs).
pub use auth::{MockVerifier, SupabaseVerifier, VerifierState};
pub use config::AppConfig;
pub use storage::{MockStorageService, S3StorageClient, StorageState};
pub use store::{MemoryStore, PostgresStore, StoreState};

/// ApiDoc
///
/// This struct auto-generates the OpenAPI documentation (Swagger JSON) for the
/// application. It aggregates all API paths and data schemas decorated with the
/// `#[utoipa::path]` and `#[derive(utoipa::ToSchema)]` macros.
/// The resulting JSON is served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_categories, handlers::create_category, handlers::update_category,
        handlers::delete_category, handlers::list_products, handlers::get_product,
        handlers::create_product, handlers::update_product, handlers::delete_product,
        handlers::upload_file, handlers::list_orders, handlers::create_order,
        handlers::update_order_status, handlers::delete_order, handlers::list_testimonials,
        handlers::create_testimonial, handlers::delete_testimonial, handlers::get_content,
        handlers::update_content
    ),
    components(
        schemas(
            models::Category, models::CategoryInput, models::Product, models::ProductInput,
            models::Order, models::OrderItem, models::OrderInput, models::Testimonial,
            models::TestimonialInput, models::Content, models::ContentInput,
            models::UploadResponse,
        )
    ),
    tags(
        (name = "zouqly", description = "Zouqly storefront API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Implements the **Unified State Pattern**. This is the single, thread-safe,
/// immutable container holding all essential application services and
/// configuration, shared across all incoming requests. Every external client
/// handle (database pool, identity verifier, object storage) is constructed
/// once at startup and injected here — no ambient globals.
#[derive(Clone)]
pub struct AppState {
    /// Store Layer: Abstracts the external document store.
    pub store: StoreState,
    /// Identity Layer: Abstracts bearer-token verification.
    pub verifier: VerifierState,
    /// Storage Layer: Abstracts S3/MinIO object uploads.
    pub storage: StorageState,
    /// Configuration: The loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// These implementations allow handlers and extractors to selectively pull
// components from the shared AppState.

impl FromRef<AppState> for StoreState {
    fn from_ref(app_state: &AppState) -> StoreState {
        app_state.store.clone()
    }
}

impl FromRef<AppState> for VerifierState {
    fn from_ref(app_state: &AppState) -> VerifierState {
        app_state.verifier.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// A middleware function that enforces authentication for the
/// `authenticated_routes` group.
///
/// *Mechanism*: It attempts to extract `AuthUser` from the request. Since
/// `AuthUser` implements `FromRequestParts`, if token verification against
/// the identity service fails, the extractor immediately rejects the request
/// with 401, preventing execution of the handler. If successful, it allows
/// the request to proceed.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the application's entire routing structure, applies global and
/// scoped middleware, and registers the application state. All resource
/// routes live under the `/api` prefix.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    // Origins come from deployment configuration; a single "*" allows any.
    let cors = if state.config.cors_origins.iter().any(|origin| origin == "*") {
        CorsLayer::new()
            .allow_methods(Any)
            .allow_origin(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_methods(Any)
            .allow_origin(origins)
            .allow_headers(Any)
    };

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. API Router Assembly
    // Public and admin groups share paths with disjoint methods (e.g. GET
    // /categories vs POST /categories), so they are merged rather than nested.
    let api_router = Router::new()
        // Public Routes: No middleware applied.
        .merge(public::public_routes())
        // Authenticated Routes: Protected by the `auth_middleware`.
        // First layer of Defense-in-Depth; handlers re-extract AuthUser.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        // Admin Routes: Each handler takes the AdminUser extractor, which
        // authenticates (401) and then checks the role (403).
        .merge(admin::admin_routes());

    let base_router = Router::new()
        // Documentation: Serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api_router)
        // Nesting serves the group root at `/api` only; alias the
        // trailing-slash form so both answer.
        .route("/api/", axum::routing::get(public::root_info))
        // Apply the Unified State to all routes.
        .with_state(state);

    // 3. Observability and Correlation Layers (Applied outermost/first)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: a unique UUID for every request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: wraps the request/response lifecycle in
                // a tracing span correlated by the generated request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: returns the x-request-id header
                // to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Helper function used by `TraceLayer` to customize the tracing span
/// creation. It extracts the `x-request-id` header (if present) and includes
/// it in the structured logging metadata alongside the HTTP method and URI,
/// so every log line for a single request is correlated by a unique ID.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
