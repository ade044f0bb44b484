//! Shared application state handed to every Axum handler.

use std::sync::Arc;

use thumbcache_config::AppConfig;
use thumbcache_coordinator::{CoordinatorConfig, CoordinatorStore};
use thumbcache_storage::{ArtifactStore, ArtifactStoreConfig};

use crate::coordinator::RequestCoordinator;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub storage: ArtifactStore,
    pub coordinator: CoordinatorStore,
    pub request_coordinator: Arc<RequestCoordinator>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, thumbcache_coordinator::CoordinatorError> {
        let storage = ArtifactStore::new(ArtifactStoreConfig {
            root: config.cache_root(),
        });
        let coordinator = CoordinatorStore::new(&CoordinatorConfig {
            host: config.coordinator.host.clone(),
            port: config.coordinator.port,
        })?;
        let request_coordinator = Arc::new(RequestCoordinator::new(
            storage.clone(),
            coordinator.clone(),
            config.thumbnail_storage.clone(),
        ));

        Ok(Self {
            config: Arc::new(config),
            storage,
            coordinator,
            request_coordinator,
        })
    }
}
