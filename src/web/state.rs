//! Application state shared across handlers

use crate::backend::SearchBackend;
use crate::config::Settings;
use crate::metrics::Metrics;
use crate::search::Dispatcher;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Query dispatcher bound to the backend
    pub dispatcher: Dispatcher,
    /// Counters served by the stats endpoint
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Create new application state
    pub fn new(settings: Settings, backend: Arc<dyn SearchBackend>) -> Self {
        let metrics = Arc::new(Metrics::new());
        let dispatcher =
            Dispatcher::with_settings(backend, &settings.search).with_metrics(metrics.clone());

        Self {
            settings: Arc::new(settings),
            dispatcher,
            metrics,
        }
    }

    /// Name of the configured backend
    pub fn backend_name(&self) -> &str {
        self.dispatcher.backend().name()
    }
}
