use std::{sync::Arc, time::Duration};

use actix_web::cookie::Key;
use zeroize::Zeroizing;

mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;
pub mod telemetry;

pub use domain::{entities, use_cases};
pub use interfaces::{flash, handlers, middlewares, repositories, routes, views};
pub use infrastructure::{db, storage, utils};

use errors::StorageError;
use repositories::{project::ProjectRepository, sqlx_repo::SqlxProjectRepo};
use storage::{supabase::SupabaseStorage, MediaStorage};
use use_cases::projects::ProjectHandler;

pub struct AppState {
    pub project_handler: ProjectHandler,
    /// Signs flash cookies; derived from the configured secret key.
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(config: &settings::AppConfig, pool: sqlx::PgPool) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        let storage = SupabaseStorage::from_config(config, client)?;

        Ok(Self::with_services(
            config,
            Arc::new(SqlxProjectRepo::new(pool)),
            Arc::new(storage),
        ))
    }

    pub fn with_services(
        config: &settings::AppConfig,
        project_repo: Arc<dyn ProjectRepository>,
        storage: Arc<dyn MediaStorage>,
    ) -> Self {
        let secret = Zeroizing::new(config.secret_key.clone().into_bytes());
        let cookie_key = if secret.len() >= 32 {
            Key::derive_from(&secret)
        } else {
            tracing::warn!("Secret key shorter than 32 bytes; flash cookies use a random key");
            Key::generate()
        };

        AppState {
            project_handler: ProjectHandler::new(project_repo, storage),
            cookie_key,
        }
    }
}
