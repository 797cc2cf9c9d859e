use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{RelayError, Result};

/// 上游模型服务的统一抽象：一次 POST，返回解码后的 JSON body。
///
/// 不做重试。非 2xx 以 `RelayError::Upstream` 返回，不会 panic。
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn invoke(&self, endpoint: &str, payload: &Value, timeout: Duration) -> Result<Value>;
}

/// 基于 reqwest 的实现
pub struct HttpModelClient {
    client: Client,
}

impl HttpModelClient {
    pub fn new() -> Result<Arc<Self>> {
        let client = Client::builder().build()?;
        Ok(Arc::new(Self { client }))
    }
}

#[async_trait]
impl ModelClient for HttpModelClient {
    async fn invoke(&self, endpoint: &str, payload: &Value, timeout: Duration) -> Result<Value> {
        info!(endpoint, "calling model service");

        let response = self
            .client
            .post(endpoint)
            .timeout(timeout)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        info!(endpoint, status = status.as_u16(), "model service responded");

        let body = response.text().await?;
        if !status.is_success() {
            return Err(RelayError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        debug!(bytes = body.len(), "decoding model service body");
        serde_json::from_str(&body).map_err(RelayError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;
    use tokio::net::TcpListener;

    async fn spawn_upstream(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/api/generate", addr)
    }

    #[tokio::test]
    async fn returns_decoded_body_on_success() {
        let app = Router::new().route(
            "/api/generate",
            post(|Json(body): Json<Value>| async move {
                Json(json!({ "response": "ok", "echo": body["prompt"] }))
            }),
        );
        let url = spawn_upstream(app).await;

        let client = HttpModelClient::new().unwrap();
        let value = client
            .invoke(&url, &json!({ "prompt": "hi" }), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(value["response"], "ok");
        assert_eq!(value["echo"], "hi");
    }

    #[tokio::test]
    async fn non_2xx_becomes_upstream_error() {
        let app = Router::new().route(
            "/api/generate",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "overloaded") }),
        );
        let url = spawn_upstream(app).await;

        let client = HttpModelClient::new().unwrap();
        let err = client
            .invoke(&url, &json!({}), Duration::from_secs(5))
            .await
            .unwrap_err();

        match err {
            RelayError::Upstream { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "overloaded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_body_is_a_decode_error() {
        let app = Router::new().route("/api/generate", post(|| async { "plain text" }));
        let url = spawn_upstream(app).await;

        let client = HttpModelClient::new().unwrap();
        let err = client
            .invoke(&url, &json!({}), Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::Decode(_)));
    }

    #[tokio::test]
    async fn slow_upstream_hits_the_timeout() {
        let app = Router::new().route(
            "/api/generate",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                "late"
            }),
        );
        let url = spawn_upstream(app).await;

        let client = HttpModelClient::new().unwrap();
        let err = client
            .invoke(&url, &json!({}), Duration::from_millis(100))
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::Transport(ref e) if e.is_timeout()));
    }

    #[tokio::test]
    async fn unreachable_upstream_is_a_transport_error() {
        // 绑定后立刻释放，拿到一个大概率没人监听的端口
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = HttpModelClient::new().unwrap();
        let err = client
            .invoke(&format!("http://{addr}/"), &json!({}), Duration::from_secs(2))
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::Transport(_)));
    }
}

/// 测试用的假上游：按预设返回，并记录每次调用
#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::*;

    pub enum Canned {
        Json(Value),
        Upstream(u16, &'static str),
        NotJson,
    }

    pub struct FakeModelClient {
        canned: Canned,
        pub calls: Mutex<Vec<(String, Value, Duration)>>,
    }

    impl FakeModelClient {
        pub fn new(canned: Canned) -> Arc<Self> {
            Arc::new(Self {
                canned,
                calls: Mutex::new(Vec::new()),
            })
        }

        /// 文本模型回复 `{"response": text}`
        pub fn text(text: &str) -> Arc<Self> {
            Self::new(Canned::Json(serde_json::json!({ "response": text })))
        }
    }

    #[async_trait]
    impl ModelClient for FakeModelClient {
        async fn invoke(&self, endpoint: &str, payload: &Value, timeout: Duration) -> Result<Value> {
            self.calls
                .lock()
                .unwrap()
                .push((endpoint.to_string(), payload.clone(), timeout));

            match &self.canned {
                Canned::Json(value) => Ok(value.clone()),
                Canned::Upstream(status, body) => Err(RelayError::Upstream {
                    status: *status,
                    body: body.to_string(),
                }),
                Canned::NotJson => {
                    Err(RelayError::Decode(serde_json::from_str::<Value>("<html>").unwrap_err()))
                }
            }
        }
    }
}
