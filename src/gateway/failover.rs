use serde_json::Value;

use super::invoker::{self, CallOptions, CallResult};
use super::registry::Registry;

/// Walk the failed plugin's configured backup targets in declaration
/// order, replaying the call against each with failover forced off — a
/// target can never fail over again, so cycles across a failover graph
/// are impossible. Returns the first success, or `None` when every
/// target fails (the caller then reports the original failure).
pub(crate) async fn run(
    registry: &Registry,
    plugin_id: &str,
    method: &str,
    params: &[Value],
    options: &CallOptions,
) -> Option<CallResult> {
    let targets = registry
        .get(plugin_id)
        .map(|entry| entry.metadata.failover_targets.clone())
        .unwrap_or_default();
    if targets.is_empty() {
        return None;
    }

    let sub_options = CallOptions {
        failover: false,
        ..options.clone()
    };

    for target in &targets {
        tracing::warn!(from = plugin_id, to = %target, method, "Failing over");
        let result =
            Box::pin(invoker::execute(registry, target, method, params, &sub_options)).await;
        if result.success {
            tracing::info!(from = plugin_id, to = %target, method, "Failover target succeeded");
            return Some(result);
        }
    }

    tracing::warn!(
        plugin_id,
        method,
        targets = targets.len(),
        "All failover targets failed"
    );
    None
}
