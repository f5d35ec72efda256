use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::DocumentStore;

/// Shared per-process state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn DocumentStore>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn DocumentStore>) -> Self {
        Self { config: Arc::new(config), store }
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    pub fn max_limit(&self) -> Option<u64> {
        self.config.filter.max_limit
    }
}
