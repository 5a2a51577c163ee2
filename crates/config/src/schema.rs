/// Settings schema for the setup wizard (control endpoint, wizard defaults).
use serde::{Deserialize, Serialize};

/// Listen address of the config API collaborator when nothing is configured.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8188";

/// Provider selected when a session starts.
pub const DEFAULT_PROVIDER: &str = "openai";

/// Root settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupConfig {
    pub endpoint: EndpointConfig,
    pub wizard: WizardConfig,
}

/// Where the config API collaborator listens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Base URL; `/api/config` and `/api/models` are resolved against it.
    pub base_url: String,
    /// Optional client-side request timeout. Absent means requests wait until
    /// the transport gives up.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            timeout_secs: None,
        }
    }
}

impl EndpointConfig {
    pub fn timeout(&self) -> Option<std::time::Duration> {
        self.timeout_secs.map(std::time::Duration::from_secs)
    }
}

/// Initial values for a wizard session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardConfig {
    /// Provider id selected at session start.
    pub provider: String,
    /// Pre-filled credential variable name for the custom provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_env_key: Option<String>,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.into(),
            custom_env_key: None,
        }
    }
}
