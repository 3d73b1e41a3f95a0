use std::future::ready;
use std::sync::Arc;

use axum::response::Html;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::config::SourceSettings;
use crate::ingest;
use crate::prometheus::{setup_metrics_recorder, track_metrics};
use crate::sink::FeedSink;
use crate::time::Clock;
use crate::topics::TopicResolver;

#[derive(Clone)]
pub struct State {
    pub sink: Arc<dyn FeedSink + Send + Sync>,
    pub clock: Arc<dyn Clock + Send + Sync>,
    pub resolver: Arc<dyn TopicResolver + Send + Sync>,
    pub settings: SourceSettings,
}

async fn index() -> Html<&'static str> {
    Html("<h3>Pyblish Universe</h3>")
}

async fn handler_index() -> &'static str {
    "This is where you'll point events."
}

pub fn router<
    C: Clock + Send + Sync + 'static,
    S: FeedSink + Send + Sync + 'static,
    R: TopicResolver + Send + Sync + 'static,
>(
    clock: C,
    sink: S,
    resolver: R,
    settings: SourceSettings,
    metrics: bool,
) -> Router {
    let state = State {
        sink: Arc::new(sink),
        clock: Arc::new(clock),
        resolver: Arc::new(resolver),
        settings,
    };

    let router = Router::new()
        .route("/", get(index))
        .route("/handler", get(handler_index).post(ingest::notification))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(track_metrics))
        .with_state(state);

    // Don't install metrics unless asked to
    // Installing a global recorder when universe is used as a library (during tests etc)
    // does not work well.
    if metrics {
        let recorder_handle = setup_metrics_recorder();

        router.route("/metrics", get(move || ready(recorder_handle.render())))
    } else {
        router
    }
}
