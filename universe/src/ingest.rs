use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use bytes::Bytes;
use metrics::counter;
use serde_json::Value;
use tracing::instrument;

use crate::api::{IngestResponse, IngestResponseCode, NormalizeError};
use crate::classify::classify;
use crate::event::Parsed;
use crate::parsers::parse_event;
use crate::prometheus::report_dropped_events;
use crate::router;

/// Normalize one inbound webhook notification and hand it to the feed sink.
/// A notification we choose not to surface (unclassifiable, suppressed, or
/// private) still answers success; only real failures produce error codes.
#[instrument(skip_all, fields(kind))]
pub async fn notification(
    state: State<router::State>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<IngestResponse>, NormalizeError> {
    let payload: Value = serde_json::from_slice(&body)?;

    counter!("universe_notifications_received_total").increment(1);

    let Some(kind) = classify(&headers, &payload, &state.settings) else {
        tracing::debug!("ignoring: {}", NormalizeError::UnclassifiedEvent);
        report_dropped_events("unclassified", 1);
        return Ok(Json(IngestResponse {
            status: IngestResponseCode::Ignored,
        }));
    };

    tracing::Span::current().record("kind", kind.as_str());

    let parsed = parse_event(
        kind,
        &payload,
        &state.settings,
        state.resolver.as_ref(),
        state.clock.as_ref(),
    )
    .await;

    match parsed {
        Ok(Parsed::Event(event)) => {
            event.validate()?;
            state.sink.send(event).await?;

            counter!("universe_events_normalized_total", "kind" => kind.as_str()).increment(1);

            Ok(Json(IngestResponse {
                status: IngestResponseCode::Ok,
            }))
        }
        Ok(Parsed::Skip(reason)) => {
            tracing::debug!(reason, "event suppressed");
            report_dropped_events("suppressed", 1);

            Ok(Json(IngestResponse {
                status: IngestResponseCode::Ignored,
            }))
        }
        // Locked topic: drop without a trace in the feed, and without alerting.
        Err(NormalizeError::PrivateSource) => {
            tracing::debug!("dropping post from a private topic");
            report_dropped_events("private_topic", 1);

            Ok(Json(IngestResponse {
                status: IngestResponseCode::Ignored,
            }))
        }
        Err(err) => {
            tracing::warn!("rejected notification: {}", err);
            report_dropped_events("parse_error", 1);

            Err(err)
        }
    }
}
