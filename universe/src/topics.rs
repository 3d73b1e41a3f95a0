use async_trait::async_trait;
use http::StatusCode;
use serde_json::Value;

use crate::api::NormalizeError;

/// Resolves a forum topic's display title. The only external lookup in the
/// normalization core, so it sits behind a trait seam.
#[async_trait]
pub trait TopicResolver: Send + Sync {
    async fn resolve_title(&self, topic_id: u64) -> Result<String, NormalizeError>;
}

/// Production resolver: `GET <forum>/t/<topic-id>.json` against the live
/// forum. No retries here; resilience belongs to the caller.
pub struct HttpTopicResolver {
    client: reqwest::Client,
    forum_url: String,
}

impl HttpTopicResolver {
    pub fn new(forum_url: &str, request_timeout: std::time::Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("Universe Feed Ingest")
            .timeout(request_timeout)
            .build()
            .expect("failed to construct reqwest client for topic lookups");

        Self {
            client,
            forum_url: forum_url.trim_end_matches('/').to_owned(),
        }
    }
}

#[async_trait]
impl TopicResolver for HttpTopicResolver {
    async fn resolve_title(&self, topic_id: u64) -> Result<String, NormalizeError> {
        let url = format!("{}/t/{}.json", self.forum_url, topic_id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| NormalizeError::UpstreamFetchError(e.to_string()))?;

        match response.status() {
            // Locked or private topic, the post must not be surfaced.
            StatusCode::FORBIDDEN => Err(NormalizeError::PrivateSource),
            StatusCode::OK => {
                let body: Value = response
                    .json()
                    .await
                    .map_err(|e| NormalizeError::UpstreamFetchError(e.to_string()))?;

                Ok(body
                    .get("fancy_title")
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown")
                    .to_owned())
            }
            status => Err(NormalizeError::UpstreamFetchError(format!(
                "status {status}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::Router;
    use http::StatusCode;

    use super::{HttpTopicResolver, TopicResolver};
    use crate::api::NormalizeError;

    const TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

    async fn stub_forum(status: StatusCode, body: &'static str) -> SocketAddr {
        let app = Router::new().fallback(move || async move { (status, body) });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind stub forum");
        let addr = listener.local_addr().expect("failed to read stub addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("stub forum died");
        });

        addr
    }

    #[tokio::test]
    async fn forbidden_topic_is_a_private_source() {
        let addr = stub_forum(StatusCode::FORBIDDEN, "").await;
        let resolver = HttpTopicResolver::new(&format!("http://{addr}"), TIMEOUT);

        let err = resolver.resolve_title(5).await.unwrap_err();
        assert!(matches!(err, NormalizeError::PrivateSource));
    }

    #[tokio::test]
    async fn server_error_is_an_upstream_fetch_error() {
        let addr = stub_forum(StatusCode::INTERNAL_SERVER_ERROR, "").await;
        let resolver = HttpTopicResolver::new(&format!("http://{addr}"), TIMEOUT);

        let err = resolver.resolve_title(5).await.unwrap_err();
        assert!(matches!(err, NormalizeError::UpstreamFetchError(_)));
    }

    #[tokio::test]
    async fn missing_title_defaults_to_unknown() {
        let addr = stub_forum(StatusCode::OK, r#"{"id": 5}"#).await;
        let resolver = HttpTopicResolver::new(&format!("http://{addr}"), TIMEOUT);

        let title = resolver.resolve_title(5).await.unwrap();
        assert_eq!(title, "Unknown");
    }

    #[tokio::test]
    async fn resolves_fancy_title() {
        let addr = stub_forum(StatusCode::OK, r#"{"fancy_title": "Pyblish 1.1 released"}"#).await;
        let resolver = HttpTopicResolver::new(&format!("http://{addr}"), TIMEOUT);

        let title = resolver.resolve_title(5).await.unwrap();
        assert_eq!(title, "Pyblish 1.1 released");
    }
}
