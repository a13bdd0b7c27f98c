mod auth;
mod config;
mod db;
mod errors;
mod export;
mod form;
mod models;
mod resumes;
mod routes;
mod state;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::auth::PgAuthProvider;
use crate::config::{Config, DeliveryConfig};
use crate::db::create_pool;
use crate::export::{ExportDispatcher, FileDelivery, LocalDirDelivery, PageGeometry, S3Delivery};
use crate::resumes::store::PgResumeStore;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume API v{}", env!("CARGO_PKG_VERSION"));

    let db = create_pool(&config.database_url, config.db_max_connections).await?;

    let delivery: Arc<dyn FileDelivery> = match &config.delivery {
        DeliveryConfig::Local { dir } => {
            info!("Exports will be written to {}", dir.display());
            Arc::new(LocalDirDelivery::new(dir.clone()))
        }
        DeliveryConfig::S3 {
            bucket,
            endpoint,
            access_key_id,
            secret_access_key,
        } => {
            let client = build_s3_client(endpoint, access_key_id, secret_access_key).await;
            info!("Exports will be uploaded to bucket {bucket}");
            Arc::new(S3Delivery::new(client, bucket.clone()))
        }
    };

    let state = AppState {
        store: Arc::new(PgResumeStore::new(db.clone())),
        auth: Arc::new(PgAuthProvider::new(db)),
        dispatcher: Arc::new(ExportDispatcher::new(delivery, PageGeometry::A4)),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client for MinIO (local) or AWS (production).
async fn build_s3_client(
    endpoint: &str,
    access_key_id: &str,
    secret_access_key: &str,
) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        access_key_id,
        secret_access_key,
        None,
        None,
        "resume-api-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
