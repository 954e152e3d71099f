use std::sync::Arc;

use crate::config::Config;
use crate::observability::Metrics;
use crate::queue::JobQueue;
use crate::status::ResultStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub queue: JobQueue,
    pub results: Arc<ResultStore>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(config: Config, queue: JobQueue, metrics: Arc<Metrics>) -> Self {
        let results = ResultStore::new(&config.storage.results_dir);
        Self {
            config: Arc::new(config),
            queue,
            results: Arc::new(results),
            metrics,
        }
    }
}
