mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use fete_api::AppStateInner;
use fete_api::auth::hash_password;
use fete_api::cors::cors_layer;
use fete_api::media::{Cloudinary, MediaHost};
use fete_api::rate_limit::RateLimiter;
use fete_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "fete=debug,fete_api=debug,fete_db=info,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env().context("Invalid configuration")?;
    info!("Starting in {:?} mode", config.environment);

    let db = Database::connect(&config.database).await?;

    match &config.admin_password {
        Some(password) => {
            let hash = hash_password(password)
                .map_err(|e| anyhow!("Failed to hash admin password: {}", e))?;
            if !db.seed_admin(&config.admin_email, &hash).await? {
                info!("Admin {} already exists", config.admin_email);
            }
        }
        None => info!("FETE_ADMIN_PASSWORD not set, skipping admin seed"),
    }

    let media: Option<Arc<dyn MediaHost>> = match config.cloudinary.clone() {
        Some(cloudinary) => {
            let host = Cloudinary::new(cloudinary)?;
            info!("Media uploads go to Cloudinary cloud {}", host.cloud_name());
            Some(Arc::new(host))
        }
        None => {
            warn!("Cloudinary credentials missing: uploads disabled, media cleanup skipped");
            None
        }
    };

    let db = Arc::new(db);
    let state = Arc::new(AppStateInner {
        store: db.clone(),
        media,
        jwt_secret: config.jwt_secret.clone(),
    });

    let limiter = Arc::new(RateLimiter::new(
        config.rate_limit_max,
        config.rate_limit_window,
        config.trust_proxy,
    ));

    let app = fete_api::app(state, limiter, config.is_development())
        .layer(cors_layer(
            config.allowed_origins.clone(),
            config.is_development(),
        ))
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Fete API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    db.close().await;
    info!("Database pool closed");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => tokio::select! {
                _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
            },
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
