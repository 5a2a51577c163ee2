//! Building and sending the final configuration to the collaborator.

use {
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize, Serializer},
};

use clawsetup_provider_setup::{CONFIG_API_PATH, Endpoint};

use crate::{error::Result, state::ConfigurationState, token::TokenGenerator};

/// Shown when no decodable reply arrives.
pub const SAVE_FAILED_MESSAGE: &str = "保存失败，请检查服务日志";

/// Body of `/api/config`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    pub model: String,
    pub gateway_token: String,
    pub providers: Vec<ProviderCredential>,
}

/// One environment variable to persist, e.g. `OPENAI_API_KEY`.
#[derive(Clone, Serialize)]
pub struct ProviderCredential {
    pub key: String,
    #[serde(serialize_with = "serialize_exposed")]
    pub value: Secret<String>,
}

impl std::fmt::Debug for ProviderCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCredential")
            .field("key", &self.key)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

fn serialize_exposed<S: Serializer>(
    value: &Secret<String>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(value.expose_secret())
}

/// Reply of `/api/config`, kept verbatim whatever the HTTP status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub restarted: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart_error: Option<String>,
}

impl SaveResponse {
    /// Synthesized status when the collaborator could not be reached.
    pub fn transport_failure(detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            restarted: false,
            message: SAVE_FAILED_MESSAGE.to_string(),
            restart_error: Some(detail.into()),
        }
    }

    /// `重启失败：<detail>` when a restart error was reported.
    pub fn restart_detail(&self) -> Option<String> {
        self.restart_error
            .as_deref()
            .map(|detail| format!("重启失败：{detail}"))
    }

    /// Saved, but the gateway did not come back cleanly.
    pub fn is_partial_success(&self) -> bool {
        self.ok && (!self.restarted || self.restart_error.is_some())
    }
}

/// Why a submission was not attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitRejection {
    #[error("请先填写默认模型")]
    EmptyModel,
    #[error("正在保存，请稍候")]
    InFlight,
}

/// A request ready to send, plus the token generated for it if the field
/// was empty.
#[derive(Debug, Clone)]
pub struct SavePlan {
    pub request: SaveRequest,
    pub generated_token: Option<String>,
}

/// Derive the request body from the current state.
pub fn plan_submission(
    state: &ConfigurationState,
    tokens: &TokenGenerator,
) -> std::result::Result<SavePlan, SubmitRejection> {
    let model = state.model().trim();
    if model.is_empty() {
        return Err(SubmitRejection::EmptyModel);
    }

    let typed = state.gateway_token().trim();
    let (gateway_token, generated_token) = if typed.is_empty() {
        let token = tokens.generate();
        (token.clone(), Some(token))
    } else {
        (typed.to_string(), None)
    };

    let key = state.provider_env_key().trim();
    let value = state.api_key().expose_secret().trim();
    let providers = if key.is_empty() || value.is_empty() {
        Vec::new()
    } else {
        vec![ProviderCredential {
            key: key.to_string(),
            value: Secret::new(value.to_string()),
        }]
    };

    Ok(SavePlan {
        request: SaveRequest {
            model: model.to_string(),
            gateway_token,
            providers,
        },
        generated_token,
    })
}

/// Where a finished configuration is persisted.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn save(&self, request: &SaveRequest) -> Result<SaveResponse>;
}

/// [`ConfigStore`] backed by the collaborator's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpConfigStore {
    endpoint: Endpoint,
}

impl HttpConfigStore {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl ConfigStore for HttpConfigStore {
    async fn save(&self, request: &SaveRequest) -> Result<SaveResponse> {
        let reply = self.endpoint.post_json(CONFIG_API_PATH, request).await?;
        tracing::debug!(status = reply.status.as_u16(), "config save replied");
        Ok(serde_json::from_value(reply.body)?)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use {
        super::*,
        crate::{state::Action, token::testing::CountingSource},
        serde_json::{Value, json},
    };

    fn state(provider: &str) -> ConfigurationState {
        ConfigurationState::new(provider, "", "t".repeat(48))
    }

    fn tokens() -> TokenGenerator {
        TokenGenerator::new(Arc::new(CountingSource::default()))
    }

    #[test]
    fn request_trims_and_includes_credential() {
        let mut s = state("openai");
        s.apply(Action::EditApiKey {
            value: Secret::new("  sk-1  ".into()),
        });
        s.apply(Action::EditModel {
            value: " openai/gpt-4o ".into(),
        });
        s.apply(Action::EditToken {
            value: " abc ".into(),
        });
        let plan = plan_submission(&s, &tokens()).unwrap();
        assert!(plan.generated_token.is_none());
        assert_eq!(
            serde_json::to_value(&plan.request).unwrap(),
            json!({
                "model": "openai/gpt-4o",
                "gatewayToken": "abc",
                "providers": [{ "key": "OPENAI_API_KEY", "value": "sk-1" }],
            })
        );
    }

    #[test]
    fn blank_key_sends_no_credentials() {
        let mut s = state("openai");
        s.apply(Action::EditApiKey {
            value: Secret::new("   ".into()),
        });
        let plan = plan_submission(&s, &tokens()).unwrap();
        assert!(plan.request.providers.is_empty());
    }

    #[test]
    fn custom_without_env_key_sends_no_credentials() {
        let mut s = state("custom");
        s.apply(Action::EditApiKey {
            value: Secret::new("sk-1".into()),
        });
        s.apply(Action::EditModel {
            value: "my/model".into(),
        });
        let plan = plan_submission(&s, &tokens()).unwrap();
        assert!(plan.request.providers.is_empty());
    }

    #[test]
    fn empty_token_is_generated() {
        let mut s = state("qwen");
        s.apply(Action::EditToken {
            value: "  ".into(),
        });
        let plan = plan_submission(&s, &tokens()).unwrap();
        assert_eq!(plan.generated_token.as_deref(), Some("00".repeat(24).as_str()));
        assert_eq!(plan.request.gateway_token, "00".repeat(24));
    }

    #[test]
    fn blank_model_is_rejected() {
        let mut s = state("openai");
        s.apply(Action::EditModel {
            value: "  ".into(),
        });
        assert_eq!(
            plan_submission(&s, &tokens()).unwrap_err(),
            SubmitRejection::EmptyModel
        );
    }

    #[test]
    fn response_defaults_missing_fields() {
        let r: SaveResponse = serde_json::from_value(json!({ "ok": true })).unwrap();
        assert!(r.ok);
        assert!(!r.restarted);
        assert!(r.message.is_empty());
        assert!(r.is_partial_success());
    }

    #[test]
    fn restart_error_is_rendered_and_partial() {
        let r: SaveResponse = serde_json::from_value(json!({
            "ok": true,
            "restarted": true,
            "message": "saved",
            "restartError": "docker not found",
        }))
        .unwrap();
        assert!(r.is_partial_success());
        assert_eq!(r.restart_detail().as_deref(), Some("重启失败：docker not found"));
    }

    #[test]
    fn clean_success_is_not_partial() {
        let r = SaveResponse {
            ok: true,
            restarted: true,
            message: "done".into(),
            restart_error: None,
        };
        assert!(!r.is_partial_success());
        assert!(r.restart_detail().is_none());
        assert!(serde_json::to_value(&r).unwrap().get("restartError").is_none());
    }

    #[test]
    fn transport_failure_shape() {
        let r = SaveResponse::transport_failure("connection refused");
        assert!(!r.ok);
        assert!(!r.restarted);
        assert_eq!(r.message, SAVE_FAILED_MESSAGE);
        assert_eq!(r.restart_error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn credential_debug_is_redacted() {
        let c = ProviderCredential {
            key: "K".into(),
            value: Secret::new("sk-secret".into()),
        };
        assert!(!format!("{c:?}").contains("sk-secret"));
    }

    async fn serve(app: axum::Router) -> (String, tokio::task::JoinHandle<()>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        (format!("http://{addr}"), server)
    }

    #[tokio::test]
    async fn http_store_keeps_error_status_body() {
        use axum::{Json, Router, http::StatusCode, routing::post};

        let app = Router::new().route(
            "/api/config",
            post(|Json(body): Json<Value>| async move {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "ok": false,
                        "restarted": false,
                        "message": format!("write failed for {}", body["model"].as_str().unwrap_or("")),
                    })),
                )
            }),
        );
        let (base, server) = serve(app).await;

        let store = HttpConfigStore::new(Endpoint::new(&base, None).unwrap());
        let plan = plan_submission(&state("openai"), &tokens()).unwrap();
        let response = store.save(&plan.request).await.unwrap();
        server.abort();

        assert!(!response.ok);
        assert_eq!(response.message, "write failed for openai/gpt-4o-mini");
    }

    #[tokio::test]
    async fn http_store_errors_on_non_json_reply() {
        use axum::{Router, routing::post};

        let app = Router::new().route("/api/config", post(|| async { "<html>oops</html>" }));
        let (base, server) = serve(app).await;

        let store = HttpConfigStore::new(Endpoint::new(&base, None).unwrap());
        let plan = plan_submission(&state("openai"), &tokens()).unwrap();
        let result = store.save(&plan.request).await;
        server.abort();

        assert!(result.is_err());
    }
}
