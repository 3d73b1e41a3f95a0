use async_trait::async_trait;
use metrics::counter;

use crate::api::NormalizeError;
use crate::event::CanonicalEvent;

#[async_trait]
pub trait FeedSink {
    async fn send(&self, event: CanonicalEvent) -> Result<(), NormalizeError>;
}

/// Logs instead of forwarding. Useful during development.
pub struct PrintSink {}

#[async_trait]
impl FeedSink for PrintSink {
    async fn send(&self, event: CanonicalEvent) -> Result<(), NormalizeError> {
        tracing::info!("event: {:?}", event);
        counter!("universe_events_ingested_total").increment(1);

        Ok(())
    }
}

/// Forwards canonical events to the Firebase-style feed store with a plain
/// HTTP POST of the event JSON.
pub struct FirebaseSink {
    client: reqwest::Client,
    events_url: String,
}

impl FirebaseSink {
    pub fn new(feed_url: &str, request_timeout: std::time::Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("Universe Feed Ingest")
            .timeout(request_timeout)
            .build()
            .expect("failed to construct reqwest client for the feed sink");

        Self {
            client,
            events_url: format!("{}/events.json", feed_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl FeedSink for FirebaseSink {
    async fn send(&self, event: CanonicalEvent) -> Result<(), NormalizeError> {
        let response = self
            .client
            .post(&self.events_url)
            .json(&event)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("failed to reach the feed store: {}", e);
                NormalizeError::RetryableSinkError
            })?;

        if !response.status().is_success() {
            tracing::error!("feed store refused event: {}", response.status());
            counter!("universe_events_dropped_total", "cause" => "sink_refused").increment(1);
            return Err(NormalizeError::RetryableSinkError);
        }

        counter!("universe_events_ingested_total").increment(1);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::Router;

    use super::{FeedSink, FirebaseSink};
    use crate::api::NormalizeError;
    use crate::event::CanonicalEvent;

    const TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

    fn event() -> CanonicalEvent {
        CanonicalEvent {
            event: String::from("github-star"),
            author: String::from("mottosso"),
            avatar: String::from("https://avatars.githubusercontent.com/u/2152766"),
            message: String::from("starred"),
            body: None,
            target: String::from("https://github.com/pyblish/pyblish"),
            action_url: None,
            time: String::from("2015-03-11T00:00:00Z"),
            labels: None,
        }
    }

    async fn stub_feed(status: StatusCode) -> SocketAddr {
        let app = Router::new().route("/events.json", post(move || async move { status }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind stub feed");
        let addr = listener.local_addr().expect("failed to read stub addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("stub feed died");
        });

        addr
    }

    #[tokio::test]
    async fn delivers_event_to_feed_store() {
        let addr = stub_feed(StatusCode::OK).await;
        let sink = FirebaseSink::new(&format!("http://{addr}"), TIMEOUT);

        assert!(sink.send(event()).await.is_ok());
    }

    #[tokio::test]
    async fn feed_store_failure_is_retryable() {
        let addr = stub_feed(StatusCode::INTERNAL_SERVER_ERROR).await;
        let sink = FirebaseSink::new(&format!("http://{addr}"), TIMEOUT);

        let err = sink.send(event()).await.unwrap_err();
        assert!(matches!(err, NormalizeError::RetryableSinkError));
    }
}
