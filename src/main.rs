use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use clap::Parser;
use fintrack_server::{
    auth::{auth_middleware, TokenCodec},
    cli::{Cli, Commands},
    config::ServerConfig,
    handlers::{
        check_session, delete_record, health_check, insert_record, list_records, login, not_found,
        register, update_record,
    },
    state::ServerState,
    storage::{SqliteRecordStore, SqliteUserStore},
};
use sqlx::sqlite::SqlitePoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const VERSION: &str = env!("CARGO_PKG_VERSION");

// Record payloads are small; anything larger is not a legitimate request
const MAX_BODY_SIZE: usize = 64 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fintrack_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = ServerConfig::from_env()?;

    // Connect to database
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    // Initialize storage layers
    let user_store = SqliteUserStore::new(pool.clone());
    user_store.initialize().await?;

    let record_store = SqliteRecordStore::new(pool.clone());
    record_store.initialize().await?;

    // Handle CLI commands
    match cli.command {
        Some(Commands::User(cmd)) => {
            return cmd.execute(pool, &config.hash_cost).await;
        }
        Some(Commands::Serve) | None => {
            // Continue to run server
        }
    }

    // The signing key is loaded once here; a missing or empty secret refuses
    // to start rather than serving unauthenticated traffic
    let codec = TokenCodec::new(&config.session_secret)?;

    info!("🚀 Starting fintrack-server v{}", VERSION);
    info!("📋 Configuration loaded:");
    info!("   Port: {}", config.port);
    info!("   Bind address: {}", config.bind_addr);
    info!("   CORS origins: {:?}", config.cors_origins);
    info!("✅ Database connected and schema initialized");

    // Create server state
    let state = Arc::new(ServerState::new(
        config.clone(),
        Arc::new(user_store),
        Arc::new(record_store),
        codec,
        pool,
    ));

    // Build router
    let public_routes = Router::new()
        .route("/healthcheck", get(health_check))
        .route("/login", post(login))
        .route("/api/user", put(register));

    let protected_routes = Router::new()
        .route("/api/check-session", get(check_session))
        .route(
            "/api/{kind}",
            put(insert_record)
                .get(list_records)
                .post(update_record)
                .delete(delete_record),
        )
        .layer(middleware::from_fn_with_state(
            state.auth_state.clone(),
            auth_middleware,
        ));

    // CORS configuration - configurable via CORS_ORIGINS env var
    let cors_origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(cors_origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
                .layer(cors),
        )
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.bind_address().parse()?;
    info!("🎧 Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
