use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Router,
};
use configuration::{ApiSettings, ServerSettings, Settings};
use database::{CustomizationStore, DbPool, DbRepository};
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod extractors;
pub mod handlers;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CustomizationStore>,
    pub api: ApiSettings,
}

impl AppState {
    pub fn new(store: Arc<dyn CustomizationStore>, api: ApiSettings) -> Self {
        Self { store, api }
    }
}

/// Builds the full router: every route nested under `server.mount_path`,
/// wrapped in CORS, request tracing and the body size limit.
pub fn build_router(state: AppState, server: &ServerSettings) -> Router {
    let routes = Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/ordercustomizations",
            get(handlers::list_customizations).post(handlers::create_customization),
        )
        .route(
            "/ordercustomizations/:id",
            axum::routing::put(handlers::update_customization)
                .delete(handlers::delete_customization),
        )
        .route("/customize-categories", get(handlers::list_customizable_categories))
        .route(
            "/customize-categories/:CategoryID",
            get(handlers::list_ingredients_by_category),
        )
        .with_state(Arc::new(state));

    // Axum cannot nest at the root, so `/` merges the routes directly.
    let app = if server.mount_path == "/" {
        routes
    } else {
        Router::new().nest(&server.mount_path, routes)
    };

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any());

    app.fallback(handlers::not_found)
        .layer(cors)
        // This middleware will automatically log information about every incoming request.
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(server.body_limit_bytes))
}

/// Connects the pool, serves until Ctrl-C (or SIGTERM), then closes the pool.
pub async fn run_server(settings: &Settings) -> anyhow::Result<()> {
    let pool = DbPool::connect(&settings.database).await?;
    let store: Arc<dyn CustomizationStore> = Arc::new(DbRepository::new(pool.clone()));
    let app = build_router(AppState::new(store, settings.api), &settings.server);

    let server = &settings.server;
    let listener = tokio::net::TcpListener::bind((server.host.as_str(), server.port)).await?;
    let addr = listener.local_addr()?;
    tracing::info!(
        mount_path = %server.mount_path,
        "Web server listening on http://{}",
        addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C.");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM.");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received, draining connections.");
}
