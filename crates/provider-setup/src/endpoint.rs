//! JSON-over-HTTP transport to the config API collaborator.

use std::time::Duration;

use {
    reqwest::StatusCode,
    serde::Serialize,
    serde_json::Value,
    tracing::debug,
    url::Url,
};

use clawsetup_config::EndpointConfig;

use crate::error::Result;

/// Model-listing route.
pub const MODELS_API_PATH: &str = "/api/models";

/// Config-persistence route.
pub const CONFIG_API_PATH: &str = "/api/config";

/// A decoded response. Any status is a reply; only transport and decode
/// failures are errors.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
}

impl Reply {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Shared HTTP client bound to one collaborator base URL.
#[derive(Debug, Clone)]
pub struct Endpoint {
    http: reqwest::Client,
    base_url: Url,
}

impl Endpoint {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let base_url = Url::parse(base_url.trim())?;
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url,
        })
    }

    pub fn from_config(config: &EndpointConfig) -> Result<Self> {
        Self::new(&config.base_url, config.timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an absolute API path against the base URL, keeping any path
    /// prefix the base carries (e.g. a reverse-proxy mount point).
    pub fn url(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        url.set_query(None);
        url.set_fragment(None);
        let prefix = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{prefix}/{}", path.trim_start_matches('/')));
        url
    }

    /// POST `body` as JSON and decode the JSON reply.
    pub async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Reply> {
        let url = self.url(path);
        debug!(url = %url, "posting to config API");
        let response = self.http.post(url).json(body).send().await?;
        let status = response.status();
        let body = response.json::<Value>().await?;
        debug!(status = status.as_u16(), "config API replied");
        Ok(Reply { status, body })
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_double_slash() {
        let ep = Endpoint::new("http://127.0.0.1:8188/", None).unwrap();
        assert_eq!(
            ep.url(CONFIG_API_PATH).as_str(),
            "http://127.0.0.1:8188/api/config"
        );
    }

    #[test]
    fn url_keeps_base_path_prefix() {
        let ep = Endpoint::new("https://box.lan/setup", None).unwrap();
        assert_eq!(
            ep.url(MODELS_API_PATH).as_str(),
            "https://box.lan/setup/api/models"
        );
    }

    #[test]
    fn url_drops_query_and_fragment() {
        let ep = Endpoint::new("http://h:1/?x=1#frag", None).unwrap();
        assert_eq!(ep.url("api/models").as_str(), "http://h:1/api/models");
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(matches!(
            Endpoint::new("127.0.0.1 8188", None),
            Err(crate::Error::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn post_json_returns_error_status_as_reply() {
        use axum::{Json, Router, http::StatusCode as AxumStatus, routing::post};

        let app = Router::new().route(
            "/api/models",
            post(|Json(body): Json<Value>| async move {
                (
                    AxumStatus::BAD_REQUEST,
                    Json(serde_json::json!({ "echo": body })),
                )
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let ep = Endpoint::new(&format!("http://{addr}"), None).unwrap();
        let reply = ep
            .post_json(MODELS_API_PATH, &serde_json::json!({ "provider": "openai" }))
            .await
            .expect("reply");
        server.abort();

        assert!(!reply.is_success());
        assert_eq!(reply.status.as_u16(), 400);
        assert_eq!(reply.body["echo"]["provider"], "openai");
    }

    #[tokio::test]
    async fn post_json_fails_on_non_json_body() {
        use axum::{Router, routing::post};

        let app = Router::new().route("/api/config", post(|| async { "<html>oops</html>" }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let ep = Endpoint::new(&format!("http://{addr}"), None).unwrap();
        let result = ep.post_json(CONFIG_API_PATH, &serde_json::json!({})).await;
        server.abort();

        assert!(matches!(result, Err(crate::Error::Http(_))));
    }
}
