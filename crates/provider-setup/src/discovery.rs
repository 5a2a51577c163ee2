//! Model discovery through the collaborator's `/api/models` route.

use {
    async_trait::async_trait,
    serde::Serialize,
    serde_json::Value,
    tracing::{info, warn},
};

use crate::endpoint::{Endpoint, MODELS_API_PATH};

/// Shown when the collaborator rejects the request without a message.
pub const DISCOVERY_FAILED_MESSAGE: &str = "获取模型失败";

/// Shown when the collaborator succeeds but returns no models.
pub const NO_MODELS_MESSAGE: &str = "未返回模型列表，可手动填写";

/// Shown when no usable reply arrives.
pub const UNREACHABLE_MESSAGE: &str = "获取模型失败，请检查网络或代理";

/// Request body for `/api/models`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelsRequest<'a> {
    pub provider: &'a str,
    pub api_key: &'a str,
}

/// Interpreted result of one discovery call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryOutcome {
    /// Success status. `message` is set when the list is empty.
    Listed {
        models: Vec<String>,
        message: Option<String>,
    },
    /// Non-success status reported by the collaborator.
    Failed { message: String },
    /// No usable reply (connection error, undecodable body).
    Unreachable { message: String, detail: String },
}

impl DiscoveryOutcome {
    pub fn unreachable(detail: impl Into<String>) -> Self {
        Self::Unreachable {
            message: UNREACHABLE_MESSAGE.to_string(),
            detail: detail.into(),
        }
    }

    /// Operator-facing message, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Listed { message, .. } => message.as_deref(),
            Self::Failed { message } | Self::Unreachable { message, .. } => Some(message),
        }
    }
}

/// Interpret a decoded `/api/models` reply.
pub fn interpret(success: bool, body: &Value) -> DiscoveryOutcome {
    let server_message = body
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(ToString::to_string);

    if !success {
        return DiscoveryOutcome::Failed {
            message: server_message.unwrap_or_else(|| DISCOVERY_FAILED_MESSAGE.to_string()),
        };
    }

    let models: Vec<String> = body
        .get("models")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default();

    let message = if models.is_empty() {
        Some(server_message.unwrap_or_else(|| NO_MODELS_MESSAGE.to_string()))
    } else {
        None
    };
    DiscoveryOutcome::Listed { models, message }
}

/// Something that can list models for a provider/credential pair.
#[async_trait]
pub trait ModelDiscovery: Send + Sync {
    async fn discover(&self, provider: &str, api_key: &str) -> DiscoveryOutcome;
}

/// [`ModelDiscovery`] backed by the collaborator's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpModelDiscovery {
    endpoint: Endpoint,
}

impl HttpModelDiscovery {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl ModelDiscovery for HttpModelDiscovery {
    async fn discover(&self, provider: &str, api_key: &str) -> DiscoveryOutcome {
        let request = ModelsRequest { provider, api_key };
        match self.endpoint.post_json(MODELS_API_PATH, &request).await {
            Ok(reply) => {
                let outcome = interpret(reply.is_success(), &reply.body);
                let listed = match &outcome {
                    DiscoveryOutcome::Listed { models, .. } => models.len(),
                    _ => 0,
                };
                info!(
                    provider,
                    status = reply.status.as_u16(),
                    models = listed,
                    "model discovery finished"
                );
                outcome
            },
            Err(e) => {
                warn!(provider, error = %e, "model discovery unreachable");
                DiscoveryOutcome::unreachable(e.to_string())
            },
        }
    }
}
