use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;

use super::failover;
use super::registry::Registry;
use crate::error::GatewayError;

/// Base delay before the first retry; doubles per attempt (1 s, 2 s, 4 s, …).
const BASE_BACKOFF_MS: u64 = 1000;

/// Per-call overrides. Anything left unset falls back to the plugin's
/// registered metadata.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Per-attempt deadline override.
    pub timeout: Option<Duration>,
    /// Attempts per logical call override.
    pub retries: Option<u32>,
    /// Walk the plugin's failover targets once retries are exhausted.
    pub failover: bool,
    /// Opaque caller context, passed through untouched — the gateway
    /// never interprets it.
    pub metadata: Option<Value>,
}

/// Per-call bookkeeping carried in every envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallMetadata {
    pub plugin_id: String,
    pub method: String,
    pub duration_ms: u64,
    pub attempts: u32,
    /// Reserved by the envelope contract; this core ships no response
    /// cache, so it is always false.
    pub cached: bool,
}

/// Outcome envelope for one logical call. `call` never raises — failure
/// is `success: false` plus a descriptive error string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallResult {
    pub success: bool,
    pub data: Option<Value>,
    pub error: Option<String>,
    pub metadata: CallMetadata,
}

impl CallResult {
    fn ok(plugin_id: &str, method: &str, data: Value, attempts: u32, elapsed: Duration) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            metadata: CallMetadata {
                plugin_id: plugin_id.to_string(),
                method: method.to_string(),
                duration_ms: elapsed.as_millis() as u64,
                attempts,
                cached: false,
            },
        }
    }

    fn err(
        plugin_id: &str,
        method: &str,
        error: &GatewayError,
        attempts: u32,
        elapsed: Duration,
    ) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
            metadata: CallMetadata {
                plugin_id: plugin_id.to_string(),
                method: method.to_string(),
                duration_ms: elapsed.as_millis() as u64,
                attempts,
                cached: false,
            },
        }
    }
}

/// Run one logical call: sequential attempts with exponential backoff,
/// permanent-error short-circuit, and an optional failover walk after
/// the final failure.
pub(crate) async fn execute(
    registry: &Registry,
    plugin_id: &str,
    method: &str,
    params: &[Value],
    options: &CallOptions,
) -> CallResult {
    let started = Instant::now();
    let max_attempts = options
        .retries
        .or_else(|| registry.get(plugin_id).map(|e| e.metadata.retry_count))
        .unwrap_or(1)
        .max(1);

    let mut attempts = 0;
    let mut backoff_ms = BASE_BACKOFF_MS;
    let mut last_error;

    loop {
        attempts += 1;
        match attempt_once(registry, plugin_id, method, params, options).await {
            Ok(data) => {
                if attempts > 1 {
                    tracing::info!(plugin_id, method, attempts, "Call recovered after retry");
                }
                return CallResult::ok(plugin_id, method, data, attempts, started.elapsed());
            }
            Err(err) if err.is_permanent() => {
                tracing::warn!(plugin_id, method, "Permanent call error: {err}");
                return CallResult::err(plugin_id, method, &err, attempts, started.elapsed());
            }
            Err(err) => {
                last_error = err;
                if attempts >= max_attempts {
                    break;
                }
                tracing::warn!(
                    plugin_id,
                    method,
                    attempt = attempts,
                    backoff_ms,
                    "Call attempt failed, retrying: {last_error}"
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms = backoff_ms.saturating_mul(2);
            }
        }
    }

    if options.failover {
        if let Some(result) = failover::run(registry, plugin_id, method, params, options).await {
            return result;
        }
        last_error = GatewayError::FailoverExhausted {
            plugin_id: plugin_id.to_string(),
            original: Box::new(last_error),
        };
    }

    tracing::warn!(plugin_id, method, attempts, "Call exhausted: {last_error}");
    CallResult::err(plugin_id, method, &last_error, attempts, started.elapsed())
}

/// One attempt: admission, breaker gate, schema validation, then the
/// dispatch racing its deadline. Only dispatch outcomes feed the
/// breaker — gateway-side rejections are not backend failures.
async fn attempt_once(
    registry: &Registry,
    plugin_id: &str,
    method: &str,
    params: &[Value],
    options: &CallOptions,
) -> Result<Value, GatewayError> {
    let entry = registry
        .get(plugin_id)
        .ok_or_else(|| GatewayError::PluginNotFound {
            id: plugin_id.to_string(),
        })?;

    if !entry.limiter.check() {
        return Err(GatewayError::RateLimitExceeded {
            plugin_id: plugin_id.to_string(),
        });
    }

    if !entry.breaker.is_healthy() {
        return Err(GatewayError::CircuitOpen {
            plugin_id: plugin_id.to_string(),
        });
    }

    let schema = entry
        .schema
        .get(method)
        .ok_or_else(|| GatewayError::MethodNotFound {
            plugin_id: plugin_id.to_string(),
            method: method.to_string(),
        })?;
    schema
        .validate_params(params)
        .map_err(|reason| GatewayError::InvalidParams {
            plugin_id: plugin_id.to_string(),
            method: method.to_string(),
            reason,
        })?;

    let timeout = options.timeout.unwrap_or_else(|| entry.metadata.timeout());
    match tokio::time::timeout(timeout, entry.plugin.invoke(method, params)).await {
        Ok(Ok(data)) => {
            entry.breaker.record_success();
            Ok(data)
        }
        Ok(Err(e)) => {
            entry.breaker.record_failure();
            Err(GatewayError::CallFailed {
                plugin_id: plugin_id.to_string(),
                method: method.to_string(),
                cause: e,
            })
        }
        Err(_) => {
            entry.breaker.record_failure();
            Err(GatewayError::CallTimeout {
                plugin_id: plugin_id.to_string(),
                method: method.to_string(),
                timeout,
            })
        }
    }
}
