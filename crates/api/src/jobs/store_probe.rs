//! Periodic store reachability probe.

use metrics::gauge;
use std::sync::Arc;
use std::time::Duration;

use super::scheduler::Job;
use domain::services::SyncService;

/// Publishes `store_up` (1 or 0) so alerts fire before agents start failing.
pub struct StoreProbeJob {
    service: Arc<SyncService>,
    interval: Duration,
}

impl StoreProbeJob {
    pub fn new(service: Arc<SyncService>, interval: Duration) -> Self {
        Self { service, interval }
    }
}

#[async_trait::async_trait]
impl Job for StoreProbeJob {
    fn name(&self) -> &'static str {
        "store_probe"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn execute(&self) -> Result<(), String> {
        match self.service.ping().await {
            Ok(()) => {
                gauge!("store_up").set(1.0);
                Ok(())
            }
            Err(e) => {
                gauge!("store_up").set(0.0);
                Err(e.to_string())
            }
        }
    }
}
