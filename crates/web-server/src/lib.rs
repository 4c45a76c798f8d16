use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use configuration::Settings;
use database::DbRepository;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// Request bodies larger than this are rejected before reaching a handler.
const BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub db_repo: DbRepository,
    /// Used by the payment analysis when the caller gives no `top_count`.
    pub default_top_count: usize,
}

/// Builds the router with every route and middleware layer attached.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any());

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/database/schema", get(handlers::get_schema))
        .route("/database/schema-diagram", get(handlers::get_schema_diagram))
        .route(
            "/analysis/customer-payments",
            get(handlers::get_customer_payment_analysis),
        )
        .route("/execute-query", post(handlers::execute_query))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
}

/// Connects the pool and serves until the process is stopped. Tracing must
/// already be initialized by the caller.
pub async fn run_server(settings: &Settings) -> anyhow::Result<()> {
    let addr = settings.server.socket_addr()?;

    let db_pool = database::connect(&settings.database).await?;
    let db_repo = DbRepository::new(db_pool, settings.database.schema.clone());

    let app_state = Arc::new(AppState {
        db_repo,
        default_top_count: settings.analysis.default_top_count,
    });
    let app = router(app_state);

    tracing::info!(%addr, "Web server started and listening.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
