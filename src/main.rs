//! Quillpad backend entry point

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quillpad::config::Config;
use quillpad::db::Database;
use quillpad::graphql::build_schema;
use quillpad::server::build_router;
use quillpad::services::{ChangeNotifier, StorageService, TokenCodec};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quillpad=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    let db = Database::connect(&config.database_url).await?;
    db.ensure_schema().await?;
    tracing::info!("Database connected");

    let storage = StorageService::new(&config.uploads_path);
    storage.ensure_root().await?;

    let notifier = Arc::new(ChangeNotifier::default());
    let codec = TokenCodec::new(&config.jwt_secret);

    let schema = build_schema(db, notifier, codec.clone(), storage);
    tracing::info!("GraphQL schema built");

    let app = build_router(schema, codec, &config.uploads_path);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {addr}");
    tracing::info!("GraphQL playground: http://localhost:{}/graphql", config.port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
