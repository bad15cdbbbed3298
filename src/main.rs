use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use secrecy::ExposeSecret;
use tokio::signal;
use tracing::{info, warn};

use studio_content_api::api::{RouterConfig, create_router_with_rate_limit};
use studio_content_api::app::{
    ApiKeyAuthProvider, AppState, DevAuthProvider, Repositories, SiteSettings,
};
use studio_content_api::config::{AppConfig, AuthMode};
use studio_content_api::domain::{AuthProvider, ConfigError};
use studio_content_api::infra::observability::{init_metrics_handle, init_tracing};
use studio_content_api::infra::{
    LocalBlobStore, PostgresClient, PostgresConfig, UploadTokenSigner,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let config = AppConfig::from_env().context("invalid configuration")?;
    init_tracing(config.log_format);

    let repos = match &config.database_url {
        Some(url) => {
            let pg_config = PostgresConfig {
                max_connections: config.db_max_connections,
                ..Default::default()
            };
            let client = PostgresClient::new(url.expose_secret(), pg_config).await?;
            if config.run_migrations {
                client.run_migrations().await?;
            }
            Repositories::postgres(Arc::new(client))
        }
        None => {
            warn!("DATABASE_URL not set, using the in-memory backend; content is lost on restart");
            Repositories::in_memory()
        }
    };

    let auth: Arc<dyn AuthProvider> = match config.auth_mode {
        AuthMode::ApiKey => {
            let key = config
                .admin_api_key
                .as_ref()
                .ok_or_else(|| ConfigError::MissingEnvVar("ADMIN_API_KEY".to_string()))?;
            Arc::new(ApiKeyAuthProvider::new(key))
        }
        AuthMode::Dev => {
            warn!("AUTH_MODE=dev: every request is treated as an admin");
            Arc::new(DevAuthProvider)
        }
    };

    let signer = match &config.upload_signing_key {
        Some(secret) => UploadTokenSigner::from_secret(secret)?,
        None => {
            warn!("UPLOAD_SIGNING_KEY not set, upload tokens will not survive a restart");
            UploadTokenSigner::generate()
        }
    };
    info!(public_key = %signer.public_key(), "upload token signer ready");

    let blob_store =
        Arc::new(LocalBlobStore::new(&config.upload_dir, &config.upload_public_path).await?);

    let mut state = AppState::new(
        repos,
        blob_store,
        auth,
        Arc::new(signer),
        SiteSettings {
            site_url: config.site_url.clone(),
            cache_ttl: config.cache_ttl,
        },
    );
    match init_metrics_handle() {
        Some(handle) => state = state.with_metrics(handle),
        None => warn!("metrics recorder could not be installed"),
    }

    let router_config = RouterConfig {
        upload_dir: config.upload_dir.clone(),
        upload_public_path: config.upload_public_path.clone(),
    };
    let router = create_router_with_rate_limit(
        Arc::new(state),
        &router_config,
        config.rate_limit.clone(),
    );

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "server listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}
