use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use super::registry::PluginEntry;

/// Spawn the periodic liveness prober for one registry entry.
///
/// Each probe outcome feeds the entry's circuit breaker: a passing probe
/// is a recorded success, a failing or erroring probe a recorded
/// failure. This is the only proactive signal into an Open breaker —
/// the time-based half-open path is still what admits the trial call.
/// The returned handle is aborted with unregistration.
pub(crate) fn spawn_prober(entry: Arc<PluginEntry>) -> JoinHandle<()> {
    let period = entry.metadata.health_check_interval();
    tokio::spawn(async move {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; a freshly-initialized
        // plugin is presumed live, so probing starts one period in.
        interval.tick().await;
        loop {
            interval.tick().await;
            let plugin_id = entry.plugin.id();
            match entry.plugin.health_check().await {
                Ok(true) => {
                    tracing::trace!(plugin_id, "Health probe passed");
                    entry.breaker.record_success();
                }
                Ok(false) => {
                    tracing::warn!(plugin_id, "Health probe reported unhealthy");
                    entry.breaker.record_failure();
                }
                Err(e) => {
                    tracing::warn!(plugin_id, "Health probe failed: {e:#}");
                    entry.breaker.record_failure();
                }
            }
        }
    })
}
