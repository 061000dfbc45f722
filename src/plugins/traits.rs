use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Capability tags a plugin declares at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginCapability {
    /// Blockchain node access (RPC, tx submission, chain queries).
    Chain,
    /// Web or SaaS API integration.
    Web,
    /// Language-model provider.
    Llm,
    /// Anything else — free-form tag.
    Other(String),
}

/// Core plugin trait — implement for any external integration.
///
/// The gateway holds only an `Arc<dyn Plugin>`; all domain state belongs
/// to the adapter that constructed it.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Unique plugin identifier (e.g. `"eth-mainnet"`).
    fn id(&self) -> &str;

    /// Human-readable name.
    fn name(&self) -> &str;

    /// SemVer version string.
    fn version(&self) -> &str;

    /// Declared capability tags.
    fn capabilities(&self) -> Vec<PluginCapability> {
        Vec::new()
    }

    /// Called once at registration, before the plugin becomes callable.
    /// Failure aborts registration.
    async fn initialize(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Dispatch a named method with ordered arguments.
    async fn invoke(&self, method: &str, params: &[Value]) -> anyhow::Result<Value>;

    /// Liveness probe. `Ok(true)` is recorded as a breaker success,
    /// `Ok(false)` or `Err` as a breaker failure.
    /// Default implementation reports healthy; adapters with a real
    /// backend connection should override.
    async fn health_check(&self) -> anyhow::Result<bool> {
        Ok(true)
    }

    /// Called once at unregistration. Best-effort; the entry is removed
    /// whether or not this succeeds.
    async fn shutdown(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
