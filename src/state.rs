//! Shared application state for all routes. Built once at startup.

use crate::config::{AppConfig, ResourceRegistry};
use crate::store::RecordStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub registry: Arc<ResourceRegistry>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, registry: ResourceRegistry, config: AppConfig) -> Self {
        AppState {
            store,
            registry: Arc::new(registry),
            config: Arc::new(config),
        }
    }
}
