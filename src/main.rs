use anyhow::Context;
use joke_of_the_day::{
    auth::UserDirectory,
    config::Config,
    domain::SystemClock,
    hal::JokeModelAssembler,
    repositories::SqliteJokeRepository,
    routes::create_router,
    service::JokeService,
    startup::{connect_pool, init_schema, shutdown_signal},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (logging)
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "joke_of_the_day=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = Config::load().context("Failed to load configuration")?;
    tracing::info!(
        bind_address = %config.bind_address,
        database_url = %config.database_url,
        demo = config.demo,
        "Configuration loaded"
    );

    // --- Storage ---
    let pool = connect_pool(&config.database_url, config.database_max_connections).await?;
    init_schema(&pool).await?;

    // --- Application State ---
    let repo = Arc::new(SqliteJokeRepository::new(pool.clone()));
    let state = Arc::new(AppState {
        service: JokeService::new(repo, Arc::new(SystemClock)),
        assembler: JokeModelAssembler::new(config.public_base_url.clone()),
        users: UserDirectory::new(config.users.clone()),
        demo: config.demo,
    });

    let app = create_router(state);

    // --- Server Startup ---
    let listener = tokio::net::TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;
    tracing::info!("Server listening on http://{}", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    pool.close().await;
    tracing::info!("Server stopped");
    Ok(())
}
