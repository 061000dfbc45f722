//! Plugin call gateway — one invocation surface over heterogeneous
//! external integrations, surviving partial failures of any of them.
//!
//! Per-plugin admission control ([`rate_limit`]), failure containment
//! ([`circuit_breaker`]), bounded retry with deadline enforcement
//! ([`invoker`]), ordered failover ([`failover`]), and periodic liveness
//! probing ([`health`]), all behind the [`Gateway`] facade.

pub mod circuit_breaker;
pub mod failover;
pub mod health;
pub mod invoker;
pub mod rate_limit;
pub mod registry;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::GatewayError;
use crate::plugins::{MethodSchema, Plugin, PluginCapability};

pub use invoker::{CallMetadata, CallOptions, CallResult};
pub use registry::{PluginMetadata, RateLimitConfig};

use registry::{PluginEntry, Registry};

/// One entry of a [`Gateway::batch_call`].
#[derive(Debug, Clone, Default)]
pub struct BatchEntry {
    pub plugin_id: String,
    pub method: String,
    pub params: Vec<Value>,
    pub options: CallOptions,
}

/// Introspection view of one registered plugin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginInfo {
    pub id: String,
    pub name: String,
    pub version: String,
    pub capabilities: Vec<PluginCapability>,
    pub methods: Vec<String>,
    /// Derived from the circuit breaker: closed or half-open (or open
    /// with its recovery window elapsed) reads as healthy.
    pub healthy: bool,
    pub priority: u32,
}

/// The gateway facade. Owns the registry map and every plugin's
/// admission/containment state for the life of the process — no
/// ambient globals.
#[derive(Default)]
pub struct Gateway {
    registry: Registry,
}

impl Gateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a plugin. The plugin's own `initialize`
    /// runs first; on any failure nothing is registered. On success the
    /// plugin is callable immediately and its liveness prober is live.
    pub async fn register_plugin(
        &self,
        plugin: Arc<dyn Plugin>,
        schema: HashMap<String, MethodSchema>,
        metadata: PluginMetadata,
    ) -> Result<(), GatewayError> {
        let id = plugin.id().trim().to_string();
        if id.is_empty() {
            return Err(GatewayError::InvalidPlugin {
                reason: "plugin requires a non-empty id".to_string(),
            });
        }
        if schema.is_empty() {
            return Err(GatewayError::InvalidPlugin {
                reason: format!("plugin '{id}' declares no methods"),
            });
        }
        if self.registry.get(&id).is_some() {
            return Err(GatewayError::InvalidPlugin {
                reason: format!("plugin '{id}' is already registered"),
            });
        }

        plugin
            .initialize()
            .await
            .map_err(|cause| GatewayError::PluginInit {
                id: id.clone(),
                cause,
            })?;

        let entry = Arc::new(PluginEntry::new(plugin, schema, metadata));
        if !self.registry.insert(id.clone(), Arc::clone(&entry)) {
            // Lost a registration race while initialize was in flight.
            return Err(GatewayError::InvalidPlugin {
                reason: format!("plugin '{id}' is already registered"),
            });
        }
        entry.set_health_task(health::spawn_prober(Arc::clone(&entry)));

        tracing::info!(plugin_id = %id, "Plugin registered");
        Ok(())
    }

    /// Tear down one plugin: prober aborted, entry (with its limiter and
    /// breaker) dropped, then the plugin's shutdown hook. A failing hook
    /// is reported but the entry is gone either way. Unregistering an
    /// unknown id is a no-op.
    pub async fn unregister_plugin(&self, id: &str) -> Result<(), GatewayError> {
        let Some(entry) = self.registry.remove(id) else {
            return Ok(());
        };
        entry.abort_health_task();
        let result = entry
            .plugin
            .shutdown()
            .await
            .map_err(|cause| GatewayError::PluginShutdown {
                id: id.to_string(),
                cause,
            });
        tracing::info!(plugin_id = id, "Plugin unregistered");
        result
    }

    /// One logical call. Never raises — the envelope's `success` flag
    /// and `error` string carry the outcome.
    pub async fn call(
        &self,
        plugin_id: &str,
        method: &str,
        params: Vec<Value>,
        options: CallOptions,
    ) -> CallResult {
        invoker::execute(&self.registry, plugin_id, method, &params, &options).await
    }

    /// Issue every call concurrently; outcomes are collected
    /// independently, in input order. One entry's failure never aborts
    /// or corrupts another's result.
    pub async fn batch_call(&self, calls: Vec<BatchEntry>) -> Vec<CallResult> {
        join_all(calls.iter().map(|entry| {
            invoker::execute(
                &self.registry,
                &entry.plugin_id,
                &entry.method,
                &entry.params,
                &entry.options,
            )
        }))
        .await
    }

    /// Best-effort shutdown: unregister every plugin concurrently,
    /// logging individual disposal failures without aborting the rest.
    pub async fn shutdown(&self) {
        let ids = self.registry.ids();
        let count = ids.len();
        let results = join_all(ids.iter().map(|id| self.unregister_plugin(id))).await;
        for (id, result) in ids.iter().zip(results) {
            if let Err(e) = result {
                tracing::warn!(plugin_id = %id, "Disposal failed during shutdown: {e}");
            }
        }
        tracing::info!(plugins = count, "Gateway shut down");
    }

    pub fn get_plugin_info(&self, id: &str) -> Option<PluginInfo> {
        self.registry.get(id).map(|entry| Self::info_for(&entry))
    }

    pub fn list_plugins(&self) -> Vec<PluginInfo> {
        let mut infos: Vec<PluginInfo> = self
            .registry
            .snapshot()
            .iter()
            .map(|entry| Self::info_for(entry))
            .collect();
        infos.sort_by(|a, b| a.id.cmp(&b.id));
        infos
    }

    fn info_for(entry: &PluginEntry) -> PluginInfo {
        let mut methods: Vec<String> = entry.schema.keys().cloned().collect();
        methods.sort();
        PluginInfo {
            id: entry.plugin.id().to_string(),
            name: entry.plugin.name().to_string(),
            version: entry.plugin.version().to_string(),
            capabilities: entry.plugin.capabilities(),
            methods,
            healthy: entry.breaker.is_healthy(),
            priority: entry.metadata.priority,
        }
    }
}
