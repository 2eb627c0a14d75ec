use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use common::storage::filesystem::FilesystemObjectStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use portal_server::config::AppConfig;
use portal_server::state::AppState;
use portal_server::utils::rate_limit::{LoginRateLimiter, run_rate_limit_pruner};
use portal_server::{captcha, database, error, mail, otp, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    error::expose_internal_detail(!config.is_production());

    let db = database::init_db(&config.database.url)
        .await
        .context("Failed to initialize database")?;
    seed::ensure_indexes(&db).await?;
    seed::ensure_super_admin(&db, &config.admin).await?;

    let store = FilesystemObjectStore::new(PathBuf::from(&config.storage.base_path))
        .await
        .context("Failed to prepare upload storage")?;
    let mailer = mail::build_mailer(&config.mail)?;
    let captcha = captcha::build_verifier(&config.captcha)?;
    let login_limiter = Arc::new(LoginRateLimiter::new(
        config.rate_limit.login_max_attempts,
        Duration::from_secs(config.rate_limit.login_window_secs),
    ));

    tokio::spawn(otp::sweeper::run_otp_sweeper(
        db.clone(),
        config.otp.cleanup_interval_secs,
    ));
    tokio::spawn(run_rate_limit_pruner(
        login_limiter.clone(),
        config.rate_limit.cleanup_interval_secs,
    ));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let state = AppState {
        db,
        config: Arc::new(config),
        store: Arc::new(store),
        mailer,
        captcha,
        login_limiter,
    };
    let app = portal_server::build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running at http://{}", addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
