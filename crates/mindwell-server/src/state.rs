use std::sync::Arc;

use mindwell_auth::{ConfirmationNotifier, IdentityService, SessionManager, TracingNotifier};
use mindwell_db::repository::{SurrealAccountRepository, SurrealSubmissionRepository};
use mindwell_db::{DbManager, run_migrations};
use surrealdb::engine::any::Any;
use tracing::info;

use crate::{config::ServerConfig, error::StartupError};

pub type Identity = IdentityService<SurrealAccountRepository<Any>, Arc<dyn ConfirmationNotifier>>;
pub type SubmissionStore = SurrealSubmissionRepository<Any>;

/// Services shared by every request, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<Identity>,
    pub submissions: SubmissionStore,
    pub sessions: SessionManager,
    pub secure_cookies: bool,
}

impl AppState {
    pub async fn new(config: &ServerConfig) -> Result<Self, StartupError> {
        Self::with_notifier(config, Arc::new(TracingNotifier)).await
    }

    pub async fn with_notifier(
        config: &ServerConfig,
        notifier: Arc<dyn ConfirmationNotifier>,
    ) -> Result<Self, StartupError> {
        let db = DbManager::connect(&config.db).await?;
        run_migrations(db.client()).await?;

        let accounts = SurrealAccountRepository::new(db.client().clone());
        let identity = IdentityService::new(accounts, notifier, config.auth.clone());
        let sessions = SessionManager::new(&config.auth)?;

        info!("Application state ready");

        Ok(Self {
            identity: Arc::new(identity),
            submissions: SurrealSubmissionRepository::new(db.client().clone()),
            sessions,
            secure_cookies: config.secure_cookies,
        })
    }
}
