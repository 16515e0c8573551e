use crate::cache::CacheService;
use crate::config::Config;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub cache: CacheService,
    pub config: Arc<Config>,
}

#[cfg(test)]
impl AppState {
    /// State wired to a real pool for the given topology, for router tests.
    pub fn for_topology(
        topology: &crate::topology::ResolvedTopology,
        borrow_timeout: std::time::Duration,
    ) -> Self {
        use crate::store::{PoolSettings, StoreClient};

        let store = StoreClient::build(topology, &PoolSettings::with_borrow_timeout(borrow_timeout))
            .expect("Failed to build Redis pool");
        let config = Config::from_vars(|_| None).expect("Default config must load");

        AppState {
            cache: CacheService::new(store),
            config: Arc::new(config),
        }
    }
}
