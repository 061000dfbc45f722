use std::time::Duration;
use thiserror::Error;

/// Typed error for gateway operations, enabling callers to pattern-match
/// on variants and the retry loop to classify them.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No plugin registered under this id.
    #[error("plugin '{id}' not found")]
    PluginNotFound { id: String },

    /// The plugin's schema declares no such method.
    #[error("method '{method}' not found on plugin '{plugin_id}'")]
    MethodNotFound { plugin_id: String, method: String },

    /// Registration rejected before the plugin was touched.
    #[error("invalid plugin: {reason}")]
    InvalidPlugin { reason: String },

    /// The plugin's own initialize hook failed; nothing was registered.
    #[error("plugin '{id}' failed to initialize: {cause:#}")]
    PluginInit { id: String, cause: anyhow::Error },

    /// The plugin's shutdown hook failed during unregistration.
    #[error("plugin '{id}' failed to shut down: {cause:#}")]
    PluginShutdown { id: String, cause: anyhow::Error },

    /// Arguments do not match the method's declared parameters.
    #[error("invalid params for '{plugin_id}.{method}': {reason}")]
    InvalidParams {
        plugin_id: String,
        method: String,
        reason: String,
    },

    /// Sliding-window admission denied this attempt.
    #[error("rate limit exceeded for plugin '{plugin_id}'")]
    RateLimitExceeded { plugin_id: String },

    /// Circuit breaker is open; call rejected before dispatch.
    #[error("circuit open for plugin '{plugin_id}'")]
    CircuitOpen { plugin_id: String },

    /// The deadline won the race against the plugin call.
    #[error("call to '{plugin_id}.{method}' timed out after {timeout:?}")]
    CallTimeout {
        plugin_id: String,
        method: String,
        timeout: Duration,
    },

    /// The plugin's invoke hook returned an error.
    #[error("call to '{plugin_id}.{method}' failed: {cause:#}")]
    CallFailed {
        plugin_id: String,
        method: String,
        cause: anyhow::Error,
    },

    /// Retries and every configured failover target are exhausted.
    #[error("failover exhausted for plugin '{plugin_id}': {original}")]
    FailoverExhausted {
        plugin_id: String,
        original: Box<GatewayError>,
    },
}

impl GatewayError {
    /// Permanent errors are never retried: no amount of waiting fixes a
    /// missing registration, an unknown method, or mis-shaped arguments.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::PluginNotFound { .. }
                | Self::MethodNotFound { .. }
                | Self::InvalidPlugin { .. }
                | Self::InvalidParams { .. }
        )
    }
}
