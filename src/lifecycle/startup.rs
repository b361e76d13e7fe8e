//! Startup wiring.
//!
//! # Responsibilities
//! - Open both stores and publish the stored proxy list to the live view
//! - Wire the admin gate, router and worker handle
//! - Hand everything to the orchestrator
//!
//! # Design Decisions
//! - Fail fast: startup errors are the only fatal errors
//! - Transport and worker are injected so they can be swapped in tests

use std::sync::Arc;
use thiserror::Error;

use crate::channel::{Channel, ChannelError};
use crate::config::{ControlSettings, CredentialsError, SettingsError};
use crate::lifecycle::orchestrator::Orchestrator;
use crate::routing::CommandRouter;
use crate::security::{AdminSet, AuthorizationGate};
use crate::store::{ConfigStore, ProxyStore};
use crate::worker::{LiveProxies, Worker, WorkerHandle};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    #[error("failed to initialize channel: {0}")]
    Channel(#[from] ChannelError),
}

/// Build the orchestrator from settings and the injected collaborators.
pub async fn assemble(
    settings: &ControlSettings,
    admins: AdminSet,
    channel: Arc<dyn Channel>,
    worker: Arc<dyn Worker>,
) -> Orchestrator {
    let live = LiveProxies::default();

    let config = Arc::new(ConfigStore::new(&settings.storage.config_path));
    let proxies = Arc::new(
        ProxyStore::new(&settings.storage.proxy_path).with_live(live.clone()),
    );

    let initial = config.load().await;
    let proxy_count = proxies.publish_stored().await;
    tracing::info!(
        config_path = %config.path().display(),
        user_ids = initial.user_id_count(),
        proxy_path = %proxies.path().display(),
        proxies = proxy_count,
        admins = admins.len(),
        "Stores loaded"
    );

    let (handle, requests) = WorkerHandle::new(worker.clone());
    let router = Arc::new(CommandRouter::new(
        AuthorizationGate::new(admins),
        config,
        proxies,
        handle,
    ));

    Orchestrator::new(
        channel,
        router,
        worker,
        requests,
        live,
        settings.worker.startup_delay(),
    )
}
