use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zouqly_api::{
    AppState,
    auth::{SupabaseVerifier, VerifierState},
    config::{AppConfig, Env},
    create_router,
    storage::{S3StorageClient, StorageState},
    store::{PostgresStore, StoreState},
};

/// main
///
/// The asynchronous entry point for the application, responsible for
/// initializing all core components: Configuration, Logging, Store, Identity
/// Verifier, Object Storage, and the HTTP server.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    dotenv::dotenv().ok();
    // AppConfig::load() implements the fail-fast principle for missing Production secrets.
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    // Prioritizes the RUST_LOG environment variable, falling back to sensible
    // defaults for local development.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "zouqly_api=debug,tower_http=info,axum=trace".into());

    // 3. Initialize Logging based on Environment
    // The structured logging format is dynamically selected based on APP_ENV.
    match config.env {
        Env::Local => {
            // LOCAL: Pretty print output for human readability during debugging.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // PROD: JSON format output for ingestion by centralized log aggregators.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 4. Store Initialization (Postgres)
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    let postgres_store = PostgresStore::new(pool);

    // LOCAL-ONLY: Provision the documents table if running locally. Production
    // schemas are managed outside this service.
    if config.env == Env::Local {
        postgres_store
            .ensure_schema()
            .await
            .expect("FATAL: Failed to provision documents table");
    }

    let store = Arc::new(postgres_store) as StoreState;

    // 5. Identity Verifier Initialization (Supabase Auth)
    // Every authenticated request round-trips to this external service;
    // no verification results are cached locally.
    let verifier =
        Arc::new(SupabaseVerifier::new(&config.supabase_url, &config.supabase_key)) as VerifierState;

    // 6. Storage Initialization (S3/MinIO)
    let s3_client = S3StorageClient::new(
        &config.s3_endpoint,
        &config.s3_region,
        &config.s3_key,
        &config.s3_secret,
        &config.s3_bucket,
    )
    .await;

    // LOCAL-ONLY: Ensure the MinIO bucket is created if running locally.
    if config.env == Env::Local {
        use zouqly_api::storage::StorageService;
        s3_client.ensure_bucket_exists().await;
    }

    let storage = Arc::new(s3_client) as StorageState;

    // 7. Unified State Assembly
    let app_state = AppState {
        store,
        verifier,
        storage,
        config,
    };

    // 8. Router and Server Startup
    let app = create_router(app_state);

    let listener = TcpListener::bind("0.0.0.0:8000").await.unwrap();

    tracing::info!("HTTP server bound successfully.");
    tracing::info!("Listening on 0.0.0.0:8000");
    tracing::info!("API Documentation (Swagger UI) available at: http://localhost:8000/swagger-ui");

    axum::serve(listener, app).await.unwrap();
}
