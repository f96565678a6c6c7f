use dotenvy::dotenv;
use snafu::ResultExt;
use tokio::net::TcpListener;

use watch_progress::api::{create_app, create_router};
use watch_progress::config::Config;
use watch_progress::database::Database;
use watch_progress::error::{BindAddressSnafu, ConnectDatabaseSnafu, UploadDirectorySnafu, WebServerSnafu};
use watch_progress::logger;
use watch_progress::service::Uploads;
use watch_progress::InitError;

#[tokio::main]
async fn main() -> Result<(), InitError> {
    dotenv().ok();

    let config = Config::from_env()?;

    let _guard = logger::init(&config)?;

    let database = Database::connect(&config.surreal())
        .await
        .context(ConnectDatabaseSnafu)?;

    let uploads = Uploads::open(&config.upload_dir)
        .await
        .context(UploadDirectorySnafu {
            path: config.upload_dir.clone(),
        })?;

    let app = create_app(database.clone(), uploads);
    let router = create_router(app, config.upload_limit);

    let listener = TcpListener::bind(config.host)
        .await
        .context(BindAddressSnafu { address: config.host })?;

    tracing::info!(address = %config.host, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context(WebServerSnafu)?;

    database.close().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "could not listen for the shutdown signal");
        std::future::pending::<()>().await;
    }

    tracing::info!("shutting down");
}
