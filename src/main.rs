use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use trips::config::AppConfig;
use trips::error::AppError;
use trips::routes::create_router;
use trips::services::{storage::FileStore, trips::TripStore};
use trips::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = AppConfig::from_env()?;

    let storage = FileStore::new(config.data_root.clone());
    storage.ensure_structure()?;
    info!("storing trips under {}", storage.root().display());

    let state = AppState::new(config.clone(), TripStore::new(Arc::new(storage)));
    let app = create_router(state);

    let listener = TcpListener::bind(config.listen_addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,trips=debug".into());

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
