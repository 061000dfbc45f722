use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use super::circuit_breaker::{BreakerConfig, CircuitBreaker};
use super::rate_limit::RateLimiter;
use crate::plugins::{MethodSchema, Plugin};

fn default_retry_count() -> u32 {
    3
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_requests_per_window() -> u32 {
    100
}

fn default_window_ms() -> u64 {
    60_000
}

fn default_health_check_interval_ms() -> u64 {
    60_000
}

/// Sliding-window admission knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests admitted per trailing window.
    #[serde(default = "default_requests_per_window")]
    pub requests_per_window: u32,
    /// Trailing window length (ms).
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_window: default_requests_per_window(),
            window_ms: default_window_ms(),
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// Operating metadata supplied at registration. Partially-specified
/// values merge onto these defaults (serde field defaults, or struct
/// update syntax from `Default`). Immutable after registration — there
/// is no live reconfiguration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginMetadata {
    /// Relative scheduling weight; informational, exposed via introspection.
    #[serde(default)]
    pub priority: u32,
    /// Attempts per logical call before failover/exhaustion.
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    /// Per-attempt deadline (ms).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Backup plugin ids, walked in declaration order on exhaustion.
    #[serde(default)]
    pub failover_targets: Vec<String>,
    /// Liveness probe cadence (ms).
    #[serde(default = "default_health_check_interval_ms")]
    pub health_check_interval_ms: u64,
}

impl Default for PluginMetadata {
    fn default() -> Self {
        Self {
            priority: 0,
            retry_count: default_retry_count(),
            timeout_ms: default_timeout_ms(),
            rate_limit: RateLimitConfig::default(),
            failover_targets: Vec::new(),
            health_check_interval_ms: default_health_check_interval_ms(),
        }
    }
}

impl PluginMetadata {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn health_check_interval(&self) -> Duration {
        Duration::from_millis(self.health_check_interval_ms)
    }
}

/// One registered plugin: its instance, schema set, operating metadata,
/// and the admission/containment state that lives and dies with it.
pub struct PluginEntry {
    pub plugin: Arc<dyn Plugin>,
    pub schema: HashMap<String, MethodSchema>,
    pub metadata: PluginMetadata,
    pub limiter: RateLimiter,
    pub breaker: CircuitBreaker,
    health_task: Mutex<Option<JoinHandle<()>>>,
}

impl PluginEntry {
    pub(crate) fn new(
        plugin: Arc<dyn Plugin>,
        schema: HashMap<String, MethodSchema>,
        metadata: PluginMetadata,
    ) -> Self {
        let limiter = RateLimiter::new(
            metadata.rate_limit.requests_per_window,
            metadata.rate_limit.window(),
        );
        let breaker = CircuitBreaker::new(plugin.id(), BreakerConfig::default());
        Self {
            plugin,
            schema,
            metadata,
            limiter,
            breaker,
            health_task: Mutex::new(None),
        }
    }

    pub(crate) fn set_health_task(&self, handle: JoinHandle<()>) {
        *self.health_task.lock() = Some(handle);
    }

    /// Abort the health prober so no timer outlives this entry.
    pub(crate) fn abort_health_task(&self) {
        if let Some(handle) = self.health_task.lock().take() {
            handle.abort();
        }
    }
}

/// Id-keyed registry map, owned by the gateway for its whole lifetime.
#[derive(Default)]
pub(crate) struct Registry {
    entries: RwLock<HashMap<String, Arc<PluginEntry>>>,
}

impl Registry {
    pub fn get(&self, id: &str) -> Option<Arc<PluginEntry>> {
        self.entries.read().get(id).cloned()
    }

    /// Insert a new entry; refuses to replace a live one.
    pub fn insert(&self, id: String, entry: Arc<PluginEntry>) -> bool {
        let mut entries = self.entries.write();
        if entries.contains_key(&id) {
            return false;
        }
        entries.insert(id, entry);
        true
    }

    pub fn remove(&self, id: &str) -> Option<Arc<PluginEntry>> {
        self.entries.write().remove(id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    pub fn snapshot(&self) -> Vec<Arc<PluginEntry>> {
        self.entries.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }
}
