#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Mock config API for command handler tests.

use std::sync::{Arc, Mutex};

use {
    axum::{Json, Router, extract::State, http::StatusCode, routing::post},
    clawsetup_config::{EndpointConfig, SetupConfig},
    serde_json::Value,
};

#[derive(Clone)]
struct Replies {
    models: (StatusCode, Value),
    config: Value,
    saved: Arc<Mutex<Vec<Value>>>,
}

pub struct MockApi {
    pub config: SetupConfig,
    pub saved: Arc<Mutex<Vec<Value>>>,
    server: tokio::task::JoinHandle<()>,
}

impl Drop for MockApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// Serve fixed replies for `/api/models` and `/api/config`, recording every
/// config body.
pub async fn serve(models: (StatusCode, Value), config: Value) -> MockApi {
    let saved = Arc::new(Mutex::new(Vec::new()));
    let replies = Replies {
        models,
        config,
        saved: Arc::clone(&saved),
    };
    let app = Router::new()
        .route(
            "/api/models",
            post(|State(r): State<Replies>| async move { (r.models.0, Json(r.models.1)) }),
        )
        .route(
            "/api/config",
            post(
                |State(r): State<Replies>, Json(body): Json<Value>| async move {
                    r.saved.lock().unwrap().push(body);
                    Json(r.config)
                },
            ),
        )
        .with_state(replies);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockApi {
        config: SetupConfig {
            endpoint: EndpointConfig {
                base_url: format!("http://{addr}"),
                timeout_secs: Some(5),
            },
            ..SetupConfig::default()
        },
        saved,
        server,
    }
}
