use munchies_core::MunchieAggregator;
use std::{sync::Arc, time::Duration};

#[derive(Debug, Clone)]
pub struct AppState {
    pub aggregator: Arc<MunchieAggregator>,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(aggregator: MunchieAggregator, request_timeout: Duration) -> Self {
        Self { aggregator: Arc::new(aggregator), request_timeout }
    }
}
