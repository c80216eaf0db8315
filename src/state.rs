use std::fmt;
use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;
use tracing::info;

use coursehub_config::{
    CorsConfig, EmailConfig, JwtConfig, PaymentConfig, StorageBackend, StorageConfig,
};
use coursehub_core::{FileStorage, HttpObjectStorage, LocalFileStorage};
use coursehub_db::{DatabaseConfig, init_db_pool, ping};

use crate::utils::payment::{PaymentGateway, StripeGateway};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_config: JwtConfig,
    pub email_config: EmailConfig,
    pub cors_config: CorsConfig,
    pub storage_config: StorageConfig,
    pub payment_config: PaymentConfig,
    pub file_storage: Arc<dyn FileStorage>,
    pub payment_gateway: Arc<dyn PaymentGateway>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("db", &self.db)
            .field("cors_config", &self.cors_config)
            .field("storage_backend", &self.storage_config.backend)
            .field("file_storage", &self.file_storage.base_url())
            .finish_non_exhaustive()
    }
}

pub fn build_file_storage(config: &StorageConfig) -> Arc<dyn FileStorage> {
    match config.backend {
        StorageBackend::Local => Arc::new(LocalFileStorage::new(
            config.local_dir.clone(),
            config.public_base_url.clone(),
            config.max_upload_bytes,
        )),
        StorageBackend::Http => Arc::new(HttpObjectStorage::new(
            config.endpoint.clone(),
            config.public_base_url.clone(),
            config.access_token.clone(),
            config.max_upload_bytes,
        )),
    }
}

/// Loads configuration and checks the database and file storage before the
/// listener is bound.
pub async fn init_app_state() -> anyhow::Result<AppState> {
    let database_config = DatabaseConfig::from_env().context("DATABASE_URL must be set")?;
    let db = init_db_pool(&database_config)
        .await
        .context("Failed to connect to database")?;
    ping(&db).await.context("Database is not answering")?;

    let storage_config = StorageConfig::from_env();
    let file_storage = build_file_storage(&storage_config);
    file_storage
        .check()
        .await
        .context("File storage is not reachable")?;
    info!(backend = ?storage_config.backend, "File storage ready");

    let payment_config = PaymentConfig::from_env();
    let payment_gateway: Arc<dyn PaymentGateway> = Arc::new(StripeGateway::new(&payment_config));

    Ok(AppState {
        db,
        jwt_config: JwtConfig::from_env(),
        email_config: EmailConfig::from_env(),
        cors_config: CorsConfig::from_env(),
        storage_config,
        payment_config,
        file_storage,
        payment_gateway,
    })
}
