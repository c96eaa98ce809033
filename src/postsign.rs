pub mod clock;
pub mod credentials;
pub mod form_fields;
pub mod policy;
mod presign_form;
pub mod region;
pub mod s3_app_error;
pub mod signer;
pub mod signer_error;
pub mod signing_key;

use std::collections::HashMap;
use std::sync::Arc;

use axum::{routing::post, Extension, Router};
use serde::Deserialize;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;

use clock::{Clock, SystemClock};
use credentials::{
    CredentialSource, Credentials, EnvironmentCredentialSource, StaticCredentialSource,
};
use region::AwsRegionTable;
use signer::{AwsPostSigner, PostSigner};

pub use presign_form::{PresignFormRequest, PresignFormResponse};

#[derive(Deserialize, Clone)]
pub struct CredentialConfig {
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default)]
    pub session_token: Option<String>,
}

#[derive(Deserialize, Clone)]
pub struct Config {
    pub address: String,
    pub port: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    pub region: String,
    #[serde(default = "default_acl")]
    pub default_acl: String,
    // Static credentials; the environment is read per request when absent
    #[serde(default)]
    pub credentials: Option<CredentialConfig>,
    // Region to host overrides, e.g. for S3-compatible stores
    #[serde(default)]
    pub endpoints: HashMap<String, String>,
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_acl() -> String {
    "private".to_string()
}

/// Shared state handed to the HTTP handlers.
pub struct AppState {
    pub signer: Arc<dyn PostSigner>,
    pub clock: Arc<dyn Clock>,
    pub default_acl: String,
}

pub fn build_signer(config: &Config, clock: Arc<dyn Clock>) -> AwsPostSigner {
    let credentials: Arc<dyn CredentialSource> = match &config.credentials {
        Some(creds) => {
            info!(
                "Using static credentials for access key: {}",
                creds.access_key_id.trim()
            );
            let credentials = match &creds.session_token {
                Some(token) => Credentials::with_session_token(
                    creds.access_key_id.clone(),
                    creds.secret_access_key.clone(),
                    token.clone(),
                ),
                None => Credentials::new(
                    creds.access_key_id.clone(),
                    creds.secret_access_key.clone(),
                ),
            };
            Arc::new(StaticCredentialSource::new(credentials))
        }
        None => {
            info!("No static credentials configured - reading AWS_* environment per request");
            Arc::new(EnvironmentCredentialSource::new())
        }
    };

    AwsPostSigner::new(config.region.clone(), credentials)
        .with_region_table(Arc::new(AwsRegionTable::with_overrides(
            config.endpoints.clone(),
        )))
        .with_clock(clock)
}

/// Bucket name used to check the configured endpoint before serving.
pub const ENDPOINT_CHECK_BUCKET: &str = "startup-check";

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/_presign_form/{bucket}/{*key}", post(presign_form::handle))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let signer = build_signer(&config, clock.clone());

    // Fail at startup rather than on the first request
    signer.build_endpoint(ENDPOINT_CHECK_BUCKET)?;

    let state = Arc::new(AppState {
        signer: Arc::new(signer),
        clock,
        default_acl: config.default_acl.clone(),
    });

    let app = router(state);

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", &config.address, &config.port)).await?;

    info!(
        "running postsign server on {}:{} for region {}",
        &config.address, &config.port, &config.region
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install signal handler: {}", e);
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

    info!("shutdown signal received");
}
