pub mod algorithms;
pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use error::{EngineError, Result};
pub use models::*;

use services::{DiscoveryService, JsonFileRepository, PreferenceManager, VenueScoringService};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub preference_manager: Arc<PreferenceManager>,
    pub venue_scoring: Arc<VenueScoringService>,
    pub discovery: Arc<DiscoveryService>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);

        let mut preference_manager = PreferenceManager::new(config.learning.clone());
        if let Some(dir) = &config.storage.profile_dir {
            let repository = JsonFileRepository::new(dir)?;
            info!("Persisting profiles to {}", repository.dir().display());
            preference_manager = preference_manager.with_repository(Arc::new(repository));
        }
        preference_manager.hydrate()?;
        let preference_manager = Arc::new(preference_manager);

        let venue_scoring = Arc::new(VenueScoringService::new(config.scoring.clone())?);

        let discovery = Arc::new(DiscoveryService::new(
            preference_manager.clone(),
            venue_scoring.clone(),
        ));

        Ok(Self {
            config,
            preference_manager,
            venue_scoring,
            discovery,
        })
    }
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
