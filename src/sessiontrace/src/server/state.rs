use std::sync::Arc;
use std::time::Duration;

use super::request::Correlator;

#[derive(Clone)]
pub(super) struct ServerState {
    correlator: Arc<Correlator>,
    request_timeout: Duration,
}

impl ServerState {
    pub fn new(correlator: Correlator, request_timeout: Duration) -> Self {
        Self {
            correlator: Arc::new(correlator),
            request_timeout,
        }
    }

    pub fn correlator(&self) -> &Correlator {
        &self.correlator
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}
